use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec3;
use tracing::{debug, error, info, warn};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoopWindowTarget},
    window::{Fullscreen, Window},
};

use crate::args::{display_name, raw_path, ContextConfig};
use crate::asset::{self, AssetError, SUPPORTED_FORMATS};
use crate::input::{FrameInput, InputState};
use crate::model::Model;
use crate::overlay::{self, SceneStatus};
use crate::performance::FpsCounter;
use crate::renderer::{Renderer, SceneFrame};
use crate::shaders::{ShaderBinding, ShaderError};
use crate::view::ViewState;

pub const WINDOW_TITLE: &str = "Model Viewer - AO Shader";
pub const WINDOW_WIDTH: f64 = 800.0;
pub const WINDOW_HEIGHT: f64 = 600.0;
pub const TARGET_FPS: u32 = 60;

/// A model together with the shader bound to its materials, if any.
pub struct LoadedScene<M, S> {
    // Declared first so it is dropped before the model it decorates.
    pub shader: Option<S>,
    pub model: M,
}

pub enum Scene<M, S> {
    Loaded(LoadedScene<M, S>),
    Failed { path: String },
}

impl<M, S> Scene<M, S> {
    /// Loads the model, then tries to bind the shader to it.
    ///
    /// Neither failure is fatal: a missing model yields [`Scene::Failed`] and
    /// the shader is only attempted once a model exists.
    pub fn acquire<E1, E2>(
        path: &Path,
        load_model: impl FnOnce(&Path) -> Result<M, E1>,
        bind_shader: impl FnOnce(&mut M) -> Result<S, E2>,
    ) -> Self
    where
        E1: Display,
        E2: Display,
    {
        let mut model = match load_model(path) {
            Ok(model) => model,
            Err(e) => {
                let path = raw_path(path);
                error!("Failed to load model: {} ({})", path, e);
                error!("{}", SUPPORTED_FORMATS);
                return Scene::Failed { path };
            }
        };

        let shader = match bind_shader(&mut model) {
            Ok(shader) => {
                info!("Ambient occlusion shader loaded successfully");
                Some(shader)
            }
            Err(e) => {
                warn!("Failed to load AO shader, using default rendering: {}", e);
                None
            }
        };

        Scene::Loaded(LoadedScene { shader, model })
    }

    pub fn loaded(&self) -> Option<&LoadedScene<M, S>> {
        match self {
            Scene::Loaded(loaded) => Some(loaded),
            Scene::Failed { .. } => None,
        }
    }

    /// Releases the shader, then the model. Nothing is released twice
    /// because the scene is consumed.
    pub fn release(self) {
        if let Scene::Loaded(LoadedScene { shader, model }) = self {
            if let Some(shader) = shader {
                drop(shader);
                debug!("Shader binding released");
            }
            drop(model);
            debug!("Model released");
        }
    }
}

impl<M, S> LoadedScene<M, S> {
    /// Per-frame update: discrete commands, camera orbit, then the shader's
    /// view position so lighting matches the camera drawn this frame.
    pub fn update(
        &self,
        view: &mut ViewState,
        input: &FrameInput,
        mut push_view_position: impl FnMut(&S, Vec3),
    ) {
        view.apply_all(|command| input.pressed(command));
        view.camera.orbit(input.drag, input.scroll);

        if let Some(shader) = &self.shader {
            push_view_position(shader, view.camera.position);
        }
    }
}

pub type ViewerScene = Scene<Model, ShaderBinding>;

pub struct App {
    window: Arc<Window>,
    model_path: PathBuf,
    display_name: String,
    view: ViewState,
    input: InputState,
    fps: FpsCounter,
    next_frame: Instant,
    frame_interval: Duration,
    // Released in this order on exit: scene first, then the renderer.
    scene: Option<ViewerScene>,
    renderer: Option<Renderer>,
}

impl App {
    pub fn new(window: Arc<Window>, model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();
        Self {
            window,
            display_name: display_name(&model_path),
            model_path,
            view: ViewState::default(),
            input: InputState::new(),
            fps: FpsCounter::new(),
            next_frame: Instant::now(),
            frame_interval: Duration::from_secs(1) / TARGET_FPS,
            scene: None,
            renderer: None,
        }
    }

    pub async fn init_renderer(&mut self, context: ContextConfig) -> Result<()> {
        info!("Initializing renderer...");
        let renderer = Renderer::new(self.window.clone(), context).await?;
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Acquires the model and shader. Must run after [`App::init_renderer`].
    pub fn load_scene(&mut self) -> Result<()> {
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("renderer is not initialized"))?;
        let device = renderer.device();
        let target = renderer.pipeline_target();

        let scene = Scene::acquire(
            &self.model_path,
            |path| -> Result<Model, AssetError> {
                let data = asset::load_model(path)?;
                let model = Model::upload(device, &data);
                if !model.is_loaded() {
                    return Err(AssetError::NoMeshes);
                }
                Ok(model)
            },
            |model: &mut Model| -> Result<ShaderBinding, ShaderError> {
                let binding = ShaderBinding::load(device, target)?;
                model.bind_shader();
                Ok(binding)
            },
        );

        self.scene = Some(scene);
        Ok(())
    }

    pub fn handle_event(
        &mut self,
        event: Event<()>,
        elwt: &EventLoopWindowTarget<()>,
    ) -> Result<()> {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    info!("Window close requested");
                    elwt.exit();
                }
                WindowEvent::Resized(physical_size) => {
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(physical_size);
                    }
                }
                WindowEvent::RedrawRequested => {
                    self.frame(elwt);
                }
                other => self.input.handle_window_event(&other),
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if now >= self.next_frame {
                    self.window.request_redraw();
                    self.next_frame += self.frame_interval;
                    if self.next_frame < now {
                        self.next_frame = now + self.frame_interval;
                    }
                }
                elwt.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
            }
            Event::LoopExiting => {
                info!("Event loop exiting");
                self.shutdown();
            }
            _ => {}
        }
        Ok(())
    }

    fn frame(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let input = self.input.take_frame();

        if let Some(loaded) = self.scene.as_ref().and_then(Scene::loaded) {
            self.view.fullscreen = self.window.fullscreen().is_some();
            let was_fullscreen = self.view.fullscreen;

            let queue = renderer.queue();
            loaded.update(&mut self.view, &input, |shader, position| {
                shader.set_view_position(queue, position)
            });

            if self.view.fullscreen != was_fullscreen {
                self.window
                    .set_fullscreen(self.view.fullscreen.then_some(Fullscreen::Borderless(None)));
            }
        }

        self.fps.tick();

        let status = match &self.scene {
            Some(Scene::Loaded(loaded)) => SceneStatus::Loaded {
                display_name: &self.display_name,
                shader_bound: loaded.shader.is_some(),
                scale: self.view.scale,
            },
            Some(Scene::Failed { path }) => SceneStatus::Failed { path },
            None => return,
        };
        let scale_factor = self.window.scale_factor() as f32;
        let screen_height = overlay::logical_size(renderer.size_in_pixels(), scale_factor).y;
        let texts = overlay::compose(status, self.fps.fps(), screen_height);

        let scene_frame = self
            .scene
            .as_ref()
            .and_then(Scene::loaded)
            .map(|loaded| SceneFrame {
                model: &loaded.model,
                shader: loaded.shader.as_ref(),
                view: &self.view,
            });

        match renderer.render(scene_frame, &texts, scale_factor) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                elwt.exit();
            }
            Err(e) => warn!("Dropped frame: {:?}", e),
        }

        if input.exit_requested {
            info!("Exit key pressed");
            elwt.exit();
        }
    }

    /// Releases resources in reverse order of acquisition.
    fn shutdown(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.release();
        }
        if self.renderer.take().is_some() {
            debug!("Renderer released");
        }
        info!("Rendered {} frames", self.fps.frame_count());
    }
}
