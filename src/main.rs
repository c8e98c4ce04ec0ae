use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use winit::{event_loop::EventLoop, window::WindowBuilder};

mod app;
mod args;
mod asset;
mod camera;
mod grid;
mod input;
mod model;
mod overlay;
mod performance;
mod renderer;
mod shaders;
mod view;

use app::App;
use args::Args;

fn main() -> Result<ExitCode> {
    // Paths are not required to be valid UTF-8.
    let mut argv = std::env::args_os();
    let program = argv
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "viewer".to_string());

    // Usage goes out before any window or context exists.
    let args = match Args::parse(argv) {
        Ok(args) => args,
        Err(_) => {
            for line in args::usage(&program) {
                println!("{line}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt::init();
    info!("Starting model viewer for {:?}", args.model_path);

    // Must be settled before the rendering context is created
    let context = args.context_config();

    let event_loop = EventLoop::new()?;

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(app::WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                app::WINDOW_WIDTH,
                app::WINDOW_HEIGHT,
            ))
            .with_resizable(true)
            .build(&event_loop)?,
    );

    let mut app = App::new(window, args.model_path);
    pollster::block_on(app.init_renderer(context))?;
    app.load_scene()?;

    event_loop.run(move |event, elwt| {
        if let Err(e) = app.handle_event(event, elwt) {
            error!("Error handling event: {}", e);
        }
    })?;

    Ok(ExitCode::SUCCESS)
}
