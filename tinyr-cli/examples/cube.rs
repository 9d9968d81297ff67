/// Example: render a checkerboard cube without any asset files
///
/// Usage: cargo run --example cube -- [output.tga]
use anyhow::{Context, Result};
use std::env;
use tinyr_core::{
    Color, Framebuffer, Mesh, ProjectionMode, RenderConfig, Renderer, Texture, Vec3,
};

fn main() -> Result<()> {
    env_logger::init();
    let output = env::args().nth(1).unwrap_or_else(|| "cube.tga".to_string());

    let texture = Texture::checkerboard(256, 256, 32, Color::WHITE, Color::new(200, 40, 40));
    let cube = Mesh::cube(1.0, texture);

    let config = RenderConfig {
        width: 600,
        height: 600,
        light_dir: Vec3::new(-0.3, -0.4, -1.0),
        rotation: Vec3::new(25.0, 35.0, 0.0),
        projection: ProjectionMode::Perspective {
            camera_distance: 3.0,
        },
    };
    let mut framebuffer = Framebuffer::new(config.width, config.height);
    let mut renderer = Renderer::new(config)?;
    let stats = renderer.render(&cube, &mut framebuffer)?;

    framebuffer.flip_vertically();
    framebuffer
        .write_to_file(&output)
        .with_context(|| format!("failed to write {output}"))?;

    println!(
        "Drew {} of {} faces ({} pixels) to {}",
        stats.drawn, stats.faces, stats.pixels, output
    );
    Ok(())
}
