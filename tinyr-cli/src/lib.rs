/// Command-line front end: renders a textured OBJ model to an image file
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::io::stdout;
use std::path::{Path, PathBuf};
use tinyr_core::{Color, Framebuffer, Mesh, ProjectionMode, RenderConfig, RenderStats, Renderer, Vec3};

pub mod preview;

pub use preview::AsciiPreview;

#[derive(Parser, Debug)]
#[command(name = "tinyr", version, about = "Software rasterizer for textured OBJ models")]
pub struct Args {
    /// Wavefront OBJ model; the diffuse texture is read from <stem>_diffuse.tga
    #[arg(default_value = "obj/african_head/african_head.obj")]
    pub model: PathBuf,

    /// Output image, format chosen by extension (.tga, .png)
    #[arg(short, long, default_value = "output.tga")]
    pub output: PathBuf,

    /// RON file with a RenderConfig; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<usize>,

    #[arg(long)]
    pub height: Option<usize>,

    /// Light direction as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub light: Option<Vec3<f32>>,

    /// Model rotation in degrees as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub rotate: Option<Vec3<f32>>,

    /// Enable the perspective divide with the camera at this distance on +z
    #[arg(long)]
    pub camera_distance: Option<f32>,

    /// Keep row 0 at the bottom of the written image
    #[arg(long, default_value_t = false)]
    pub no_flip: bool,

    /// Draw face outlines instead of filled, lit triangles
    #[arg(long, default_value_t = false)]
    pub wireframe: bool,

    /// Print an ASCII preview of the frame to the terminal
    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

/// Parse `x,y,z` into a vector
pub fn parse_vec3(s: &str) -> std::result::Result<Vec3<f32>, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got `{s}`"));
    }
    let mut values = [0.0f32; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|e| format!("invalid component `{part}`: {e}"))?;
    }
    Ok(Vec3::new(values[0], values[1], values[2]))
}

/// Read a RenderConfig from a RON file
pub fn read_config_file(path: &Path) -> Result<RenderConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

/// Build the frame config: defaults, then the config file, then flags
pub fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => RenderConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(light) = args.light {
        config.light_dir = light;
    }
    if let Some(rotation) = args.rotate {
        config.rotation = rotation;
    }
    if let Some(camera_distance) = args.camera_distance {
        config.projection = ProjectionMode::Perspective { camera_distance };
    }

    config.validate()?;
    Ok(config)
}

/// Load the model, render one frame and write it to `args.output`
pub fn run(args: &Args) -> Result<RenderStats> {
    let config = load_config(args)?;
    let mesh = Mesh::load(&args.model)
        .with_context(|| format!("failed to load model {}", args.model.display()))?;

    let mut framebuffer = Framebuffer::new(config.width, config.height);
    let mut renderer = Renderer::new(config)?;
    let stats = if args.wireframe {
        renderer.render_wireframe(&mesh, Color::WHITE, &mut framebuffer)
    } else {
        renderer.render(&mesh, &mut framebuffer)
    }
    .context("failed to render frame")?;

    // Row 0 is the bottom scanline; image files expect it at the top
    if !args.no_flip {
        framebuffer.flip_vertically();
    }
    framebuffer
        .write_to_file(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    if args.preview {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let preview = AsciiPreview::from_framebuffer(
            &framebuffer,
            cols as usize,
            (rows as usize).saturating_sub(1),
        );
        preview
            .draw(&mut stdout())
            .context("failed to print preview")?;
    }

    Ok(stats)
}
