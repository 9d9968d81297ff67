/// tinyr - render a textured OBJ model to an image
///
/// Usage:
///   tinyr [MODEL] [--output out.tga] [--width W] [--height H]
///         [--light x,y,z] [--rotate x,y,z] [--camera-distance C]
///         [--config frame.ron] [--no-flip] [--preview]
///
/// Set RUST_LOG=debug for per-frame statistics.
use anyhow::Result;
use clap::Parser;
use tinyr_cli::Args;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let stats = tinyr_cli::run(&args)?;
    println!(
        "Rendered {} of {} faces ({} culled, {} degenerate), {} pixels -> {}",
        stats.drawn,
        stats.faces,
        stats.culled,
        stats.degenerate,
        stats.pixels,
        args.output.display()
    );
    Ok(())
}
