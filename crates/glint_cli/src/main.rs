use std::fs::File;
use std::io::BufWriter;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glint_core::{obj, Scene};
use glint_renderer::{RenderSettings, Renderer, World};

/// Offline path tracer.
#[derive(Parser, Debug)]
#[command(name = "glint", version, about)]
struct Args {
    /// Path to the JSON scene description.
    scene_file: String,

    /// Scale applied to the scene's declared resolution, or `-` to dump the
    /// scene geometry to output.obj and exit.
    resolution_scale: Option<String>,

    /// Samples per pixel.
    #[arg(default_value_t = 1)]
    spp: u32,

    /// `a` renders the whole camera animation; anything else renders
    /// frame 0 only.
    animation: Option<String>,

    /// Worker thread count (defaults to the hardware concurrency).
    thread_count: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();

    // argument mistakes exit 1, same as scene failures
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            error.print().ok();
            std::process::exit(1);
        }
    };

    let scene = Scene::load(&args.scene_file)
        .with_context(|| format!("failed to load scene {}", args.scene_file))?;

    // `-` in the scale slot means "export geometry instead of rendering"
    if args.resolution_scale.as_deref() == Some("-") {
        let file = File::create("output.obj").context("failed to create output.obj")?;
        let mut writer = BufWriter::new(file);
        obj::write_obj(&scene, &mut writer).context("failed to write output.obj")?;
        log::info!("scene exported to output.obj");
        return Ok(());
    }

    let resolution_scale = match &args.resolution_scale {
        Some(text) => {
            let scale: f32 = text
                .parse()
                .with_context(|| format!("invalid resolution scale: {text}"))?;
            if scale <= 0.0 {
                bail!("resolution scale must be greater than 0");
            }
            scale
        }
        None => 1.0,
    };
    if args.spp == 0 {
        bail!("samples per pixel must be at least 1");
    }

    let settings = RenderSettings {
        resolution_scale,
        spp: args.spp,
        ..Default::default()
    };

    let world = World::build(scene);
    let mut renderer = Renderer::new(world, settings, args.thread_count.unwrap_or(0))?;

    let render_animation = args.animation.as_deref() == Some("a");
    if render_animation {
        let frames = renderer.frame_count();
        log::info!("rendering {frames} animation frames");
        for frame in 0..frames {
            let image = renderer.render_frame(frame as u32)?;
            let path = format!("output_{frame:03}.png");
            image.save(&path)?;
            log::info!("frame saved to {path}");
        }
    } else {
        let image = renderer.render_frame(0)?;
        image.save("output.ppm")?;
        log::info!("image saved to output.ppm");
    }

    Ok(())
}
