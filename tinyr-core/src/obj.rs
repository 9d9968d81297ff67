/// Wavefront OBJ parser (positions, texture coordinates and faces)
use log::trace;
use nom::{
    character::complete::{char, i64 as index, space0, space1},
    combinator::{all_consuming, opt},
    multi::{many0, many1},
    number::complete::float,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::{ModelError, ModelResult};
use crate::geometry::{Vec2, Vec3};
use crate::model::Corner;

/// Geometry read from an OBJ file. Polygons are fan-triangulated.
#[derive(Debug, Clone, Default)]
pub struct ObjGeometry {
    pub vertices: Vec<Vec3<f32>>,
    pub uvs: Vec<Vec2<f32>>,
    pub faces: Vec<[Corner; 3]>,
}

/// Parse OBJ source text.
///
/// `v`, `vt` and `f` statements are read; everything else (normals, groups,
/// materials, smoothing) is skipped. Face indices may be 1-based or negative
/// (relative to the end of the list so far) and must refer to an element
/// defined earlier in the file.
pub fn parse_obj(input: &str) -> ModelResult<ObjGeometry> {
    let mut geometry = ObjGeometry::default();

    for (n, raw) in input.lines().enumerate() {
        let line_no = n + 1;
        let line = raw.split('#').next().unwrap_or("").trim_end();
        let line = line.trim_start();
        if line.is_empty() {
            continue;
        }
        let keyword = line.split_whitespace().next().unwrap_or("");
        let rest = &line[keyword.len()..];

        match keyword {
            "v" => {
                let v = finish(line_no, keyword, parse_vertex(rest))?;
                geometry.vertices.push(v);
            }
            "vt" => {
                let uv = finish(line_no, keyword, parse_texcoord(rest))?;
                geometry.uvs.push(uv);
            }
            "f" => {
                let corners = finish(line_no, keyword, parse_face(rest))?;
                push_face(&mut geometry, line_no, &corners)?;
            }
            other => trace!("line {line_no}: skipping `{other}` statement"),
        }
    }

    Ok(geometry)
}

fn finish<T>(line: usize, keyword: &str, result: IResult<&str, T>) -> ModelResult<T> {
    result.map(|(_, value)| value).map_err(|e| ModelError::Parse {
        line,
        message: format!("malformed `{keyword}` statement ({e})"),
    })
}

fn push_face(
    geometry: &mut ObjGeometry,
    line: usize,
    corners: &[(i64, Option<i64>)],
) -> ModelResult<()> {
    if corners.len() < 3 {
        return Err(ModelError::Parse {
            line,
            message: format!("face needs at least 3 corners, got {}", corners.len()),
        });
    }

    let mut resolved = Vec::with_capacity(corners.len());
    for &(vertex, uv) in corners {
        let vertex = resolve(vertex, geometry.vertices.len(), line, "vertex")?;
        let uv = uv
            .map(|i| resolve(i, geometry.uvs.len(), line, "texcoord"))
            .transpose()?;
        resolved.push(Corner::new(vertex, uv));
    }

    for k in 1..resolved.len() - 1 {
        geometry
            .faces
            .push([resolved[0], resolved[k], resolved[k + 1]]);
    }
    Ok(())
}

fn resolve(index: i64, count: usize, line: usize, kind: &'static str) -> ModelResult<usize> {
    let resolved = if index > 0 {
        index - 1
    } else {
        count as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(ModelError::IndexOutOfRange {
            line,
            kind,
            index,
            count,
        });
    }
    Ok(resolved as usize)
}

/// `v x y z [w]`, trailing per-vertex colors are ignored
fn parse_vertex(input: &str) -> IResult<&str, Vec3<f32>> {
    let (input, (x, y, z)) = parse_vector3(input)?;
    let (input, _) = all_consuming(terminated(many0(preceded(space1, float)), space0))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

/// `vt u [v [w]]`
fn parse_texcoord(input: &str) -> IResult<&str, Vec2<f32>> {
    let (input, u) = preceded(space1, float)(input)?;
    let (input, v) = opt(preceded(space1, float))(input)?;
    let (input, _) = opt(preceded(space1, float))(input)?;
    let (input, _) = all_consuming(space0)(input)?;
    Ok((input, Vec2::new(u, v.unwrap_or(0.0))))
}

/// `f v[/vt[/vn]] ...`
fn parse_face(input: &str) -> IResult<&str, Vec<(i64, Option<i64>)>> {
    all_consuming(terminated(many1(preceded(space1, parse_corner)), space0))(input)
}

fn parse_corner(input: &str) -> IResult<&str, (i64, Option<i64>)> {
    let (input, vertex) = index(input)?;
    let (input, uv) = opt(preceded(char('/'), opt(index)))(input)?;
    let (input, _normal) = opt(preceded(char('/'), opt(index)))(input)?;
    Ok((input, (vertex, uv.flatten())))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, x) = preceded(space1, float)(input)?;
    let (input, y) = preceded(space1, float)(input)?;
    let (input, z) = preceded(space1, float)(input)?;
    Ok((input, (x, y, z)))
}
