use egui::{Align2, Color32, FontId, Id, LayerId, Order, Pos2, Rect};

use crate::asset::SUPPORTED_FORMATS;

pub const ORANGE: Color32 = Color32::from_rgb(255, 161, 0);
pub const GREEN: Color32 = Color32::from_rgb(0, 228, 48);
pub const RED: Color32 = Color32::from_rgb(230, 41, 55);
pub const LIGHT_GRAY: Color32 = Color32::from_rgb(200, 200, 200);
pub const YELLOW: Color32 = Color32::from_rgb(253, 249, 0);
pub const LIME: Color32 = Color32::from_rgb(0, 158, 47);
pub const WHITE: Color32 = Color32::WHITE;

pub const SHADER_ON: &str = "AO Shader: ON";
pub const SHADER_FAILED: &str = "AO Shader: FAILED";
pub const LOAD_FAILED: &str = "Failed to load model!";

const LEGEND: [&str; 5] = [
    "  Scroll: Zoom",
    "  +/-: Scale model",
    "  R: Reset view",
    "  G: Toggle grid",
    "  F: Fullscreen",
];

/// Distance of the FPS counter from the bottom edge.
const FPS_BOTTOM_OFFSET: f32 = 25.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Color32,
}

impl OverlayText {
    fn new(text: impl Into<String>, x: f32, y: f32, size: f32, color: Color32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            color,
        }
    }
}

/// What the overlay reports about the current scene.
#[derive(Debug, Clone, Copy)]
pub enum SceneStatus<'a> {
    Loaded {
        display_name: &'a str,
        shader_bound: bool,
        scale: f32,
    },
    Failed {
        path: &'a str,
    },
}

/// Converts a physical surface size into egui points.
pub fn logical_size(size_in_pixels: [u32; 2], pixels_per_point: f32) -> egui::Vec2 {
    let ppp = if pixels_per_point > 0.0 { pixels_per_point } else { 1.0 };
    egui::vec2(size_in_pixels[0] as f32, size_in_pixels[1] as f32) / ppp
}

/// Lays out the overlay for one frame in logical window coordinates.
pub fn compose(status: SceneStatus<'_>, fps: u32, screen_height: f32) -> Vec<OverlayText> {
    let mut lines = Vec::new();

    match status {
        SceneStatus::Loaded {
            display_name,
            shader_bound,
            scale,
        } => {
            lines.push(OverlayText::new(display_name, 10.0, 10.0, 20.0, ORANGE));
            lines.push(if shader_bound {
                OverlayText::new(SHADER_ON, 10.0, 35.0, 12.0, GREEN)
            } else {
                OverlayText::new(SHADER_FAILED, 10.0, 35.0, 12.0, RED)
            });
            lines.push(OverlayText::new("Controls:", 10.0, 55.0, 12.0, LIGHT_GRAY));
            for (i, line) in LEGEND.iter().enumerate() {
                let y = 70.0 + 15.0 * i as f32;
                lines.push(OverlayText::new(*line, 10.0, y, 10.0, LIGHT_GRAY));
            }
            lines.push(OverlayText::new(
                format!("Scale: {scale:.1}"),
                10.0,
                155.0,
                10.0,
                YELLOW,
            ));
        }
        SceneStatus::Failed { path } => {
            lines.push(OverlayText::new(LOAD_FAILED, 10.0, 10.0, 24.0, RED));
            lines.push(OverlayText::new(path, 10.0, 40.0, 12.0, WHITE));
            lines.push(OverlayText::new(SUPPORTED_FORMATS, 10.0, 60.0, 12.0, LIGHT_GRAY));
        }
    }

    lines.push(OverlayText::new(
        format!("{fps} FPS"),
        10.0,
        screen_height - FPS_BOTTOM_OFFSET,
        20.0,
        LIME,
    ));

    lines
}

/// Paints overlay text with egui on top of the 3D pass.
pub struct Overlay {
    ctx: egui::Context,
    renderer: egui_wgpu::Renderer,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    screen: egui_wgpu::ScreenDescriptor,
    pending_free: Vec<egui::TextureId>,
}

impl Overlay {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        Self {
            ctx: egui::Context::default(),
            renderer: egui_wgpu::Renderer::new(device, color_format, Some(depth_format), sample_count),
            paint_jobs: Vec::new(),
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [1, 1],
                pixels_per_point: 1.0,
            },
            pending_free: Vec::new(),
        }
    }

    /// Tessellates `texts` and uploads everything the render pass will need.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        texts: &[OverlayText],
        size_in_pixels: [u32; 2],
        pixels_per_point: f32,
    ) -> Vec<wgpu::CommandBuffer> {
        for id in self.pending_free.drain(..) {
            self.renderer.free_texture(&id);
        }

        let mut raw_input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(
                Pos2::ZERO,
                logical_size(size_in_pixels, pixels_per_point),
            )),
            ..Default::default()
        };
        raw_input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(pixels_per_point);

        let full_output = self.ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("overlay")));
            for line in texts {
                painter.text(
                    Pos2::new(line.x, line.y),
                    Align2::LEFT_TOP,
                    &line.text,
                    FontId::proportional(line.size),
                    line.color,
                );
            }
        });

        self.paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        self.screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.pending_free = full_output.textures_delta.free;

        self.renderer
            .update_buffers(device, queue, encoder, &self.paint_jobs, &self.screen)
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        self.renderer.render(pass, &self.paint_jobs, &self.screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[OverlayText]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn loaded_overlay_lists_controls_and_scale() {
        let lines = compose(
            SceneStatus::Loaded {
                display_name: "teapot.obj",
                shader_bound: true,
                scale: 1.5,
            },
            60,
            600.0,
        );
        let texts = texts(&lines);

        assert_eq!(texts[0], "teapot.obj");
        assert_eq!(texts[1], SHADER_ON);
        assert_eq!(lines[1].color, GREEN);
        assert_eq!(texts[2], "Controls:");
        assert_eq!(&texts[3..8], &LEGEND);
        assert_eq!(texts[8], "Scale: 1.5");
        assert_eq!(*texts.last().unwrap(), "60 FPS");
    }

    #[test]
    fn failed_shader_is_reported_in_red() {
        let lines = compose(
            SceneStatus::Loaded {
                display_name: "a.obj",
                shader_bound: false,
                scale: 1.0,
            },
            0,
            600.0,
        );
        assert_eq!(lines[1].text, SHADER_FAILED);
        assert_eq!(lines[1].color, RED);
    }

    #[test]
    fn failed_load_shows_raw_path_and_hint_only() {
        let lines = compose(SceneStatus::Failed { path: "../models/x.fbx" }, 58, 600.0);
        assert_eq!(
            texts(&lines),
            vec![LOAD_FAILED, "../models/x.fbx", SUPPORTED_FORMATS, "58 FPS"]
        );
    }

    #[test]
    fn logical_size_divides_by_scale_factor() {
        assert_eq!(logical_size([800, 600], 1.0), egui::vec2(800.0, 600.0));
        assert_eq!(logical_size([1600, 1200], 2.0), egui::vec2(800.0, 600.0));
        assert_eq!(logical_size([1200, 900], 1.5), egui::vec2(800.0, 600.0));
        assert_eq!(logical_size([640, 480], 0.0), egui::vec2(640.0, 480.0));
    }

    #[test]
    fn fps_stays_on_screen_at_high_dpi() {
        let height = logical_size([1600, 1200], 2.0).y;
        let lines = compose(SceneStatus::Failed { path: "m.obj" }, 60, height);
        let fps = lines.last().unwrap();
        assert_eq!(fps.y, 600.0 - FPS_BOTTOM_OFFSET);
        assert!(fps.y + fps.size <= height);
    }

    #[test]
    fn fps_is_anchored_to_bottom_left() {
        for height in [600.0, 1080.0, 40.0] {
            let lines = compose(SceneStatus::Failed { path: "m.obj" }, 60, height);
            let fps = lines.last().unwrap();
            assert_eq!(fps.x, 10.0);
            assert_eq!(fps.y, height - FPS_BOTTOM_OFFSET);
        }
    }
}
