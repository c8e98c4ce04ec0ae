use std::sync::Arc;

use anyhow::Result;
use glam::{Mat4, Vec3, Vec4};
use tracing::info;
use wgpu::{Backends, Device, Instance, Queue, SurfaceConfiguration};
use winit::window::Window;

use crate::args::ContextConfig;
use crate::grid::Grid;
use crate::model::{MaterialShader, Model};
use crate::overlay::{Overlay, OverlayText};
use crate::shaders::{PipelineTarget, ShaderBinding, ShaderProgram, DEFAULT_SHADER, DEPTH_FORMAT};
use crate::view::ViewState;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 30.0 / 255.0,
    g: 35.0 / 255.0,
    b: 40.0 / 255.0,
    a: 1.0,
};

const TINT: Vec4 = Vec4::ONE;

/// What the 3D pass draws in loaded mode.
pub struct SceneFrame<'a> {
    pub model: &'a Model,
    pub shader: Option<&'a ShaderBinding>,
    pub view: &'a ViewState,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    context: ContextConfig,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    model_program: ShaderProgram,
    grid_program: ShaderProgram,
    grid: Grid,
    overlay: Overlay,
}

impl Renderer {
    /// Creates the GPU context. Multisampling is fixed from here on.
    pub async fn new(window: Arc<Window>, context: ContextConfig) -> Result<Self> {
        let size = window.inner_size();
        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find an appropriate adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        // Overlay colours are authored in gamma space, so skip sRGB targets.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let target = PipelineTarget {
            color_format: config.format,
            sample_count: context.msaa_samples,
        };
        let model_program = ShaderProgram::compile(
            &device,
            "Default",
            DEFAULT_SHADER,
            DEFAULT_SHADER,
            target,
            wgpu::PrimitiveTopology::TriangleList,
        )?;
        let grid_program = ShaderProgram::compile(
            &device,
            "Grid",
            DEFAULT_SHADER,
            DEFAULT_SHADER,
            target,
            wgpu::PrimitiveTopology::LineList,
        )?;
        let grid = Grid::new(&device);
        let overlay = Overlay::new(&device, config.format, DEPTH_FORMAT, context.msaa_samples);

        let depth_view = create_depth_view(&device, &config, context.msaa_samples);
        let msaa_view = create_msaa_view(&device, &config, context.msaa_samples);

        info!(
            "Renderer initialized: {:?}, {}x MSAA",
            config.format, context.msaa_samples
        );
        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            context,
            depth_view,
            msaa_view,
            model_program,
            grid_program,
            grid,
            overlay,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Surface size in physical pixels.
    pub fn size_in_pixels(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    pub fn pipeline_target(&self) -> PipelineTarget {
        PipelineTarget {
            color_format: self.config.format,
            sample_count: self.context.msaa_samples,
        }
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.reconfigure();
        }
    }

    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config, self.context.msaa_samples);
        self.msaa_view = create_msaa_view(&self.device, &self.config, self.context.msaa_samples);
    }

    /// Clears, draws the scene when there is one, then the overlay.
    pub fn render(
        &mut self,
        scene: Option<SceneFrame<'_>>,
        overlay: &[OverlayText],
        scale_factor: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(scene) = &scene {
            self.write_uniforms(scene);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let overlay_commands = self.overlay.prepare(
            &self.device,
            &self.queue,
            &mut encoder,
            overlay,
            self.size_in_pixels(),
            scale_factor,
        );

        {
            let (attachment, resolve_target, store) = match &self.msaa_view {
                Some(msaa_view) => (msaa_view, Some(&view), wgpu::StoreOp::Discard),
                None => (&view, None, wgpu::StoreOp::Store),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(scene) = &scene {
                for mesh in &scene.model.meshes {
                    let program = match (scene.model.material_shader(mesh), scene.shader) {
                        (MaterialShader::Bound, Some(binding)) => &binding.program,
                        _ => &self.model_program,
                    };
                    program.bind(&mut render_pass);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
                }

                if scene.view.show_grid {
                    self.grid_program.bind(&mut render_pass);
                    render_pass.set_vertex_buffer(0, self.grid.vertex_buffer.slice(..));
                    render_pass.draw(0..self.grid.num_vertices, 0..1);
                }
            }

            self.overlay.render(&mut render_pass);
        }

        self.queue
            .submit(overlay_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        Ok(())
    }

    fn write_uniforms(&self, scene: &SceneFrame<'_>) {
        let aspect = self.size.width as f32 / self.size.height as f32;
        let view_projection = scene.view.camera.view_projection(aspect);
        let model_matrix = Mat4::from_scale(Vec3::splat(scene.view.scale));

        let program = &self.model_program;
        program.set_frame(&self.queue, view_projection, TINT);
        program.set_mat4(&self.queue, program.locations.model, model_matrix);

        if let Some(binding) = scene.shader {
            binding.program.set_frame(&self.queue, view_projection, TINT);
            binding.set_model_matrix(&self.queue, model_matrix);
        }

        if scene.view.show_grid {
            let grid = &self.grid_program;
            grid.set_frame(&self.queue, view_projection, TINT);
            grid.set_mat4(&self.queue, grid.locations.model, Mat4::IDENTITY);
        }
    }
}

fn create_depth_view(
    device: &Device,
    config: &SurfaceConfiguration,
    sample_count: u32,
) -> wgpu::TextureView {
    create_target(device, config, sample_count, DEPTH_FORMAT, "Depth Texture")
}

fn create_msaa_view(
    device: &Device,
    config: &SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    (sample_count > 1)
        .then(|| create_target(device, config, sample_count, config.format, "MSAA Texture"))
}

fn create_target(
    device: &Device,
    config: &SurfaceConfiguration,
    sample_count: u32,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
