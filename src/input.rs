use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::view::ViewCommand;

/// Pixel scroll deltas are converted to "lines" with this factor.
const PIXELS_PER_LINE: f32 = 50.0;

pub fn command_for_key(key: KeyCode) -> Option<ViewCommand> {
    match key {
        KeyCode::KeyF => Some(ViewCommand::ToggleFullscreen),
        KeyCode::KeyR => Some(ViewCommand::Reset),
        KeyCode::KeyG => Some(ViewCommand::ToggleGrid),
        KeyCode::Equal | KeyCode::NumpadAdd => Some(ViewCommand::ScaleUp),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(ViewCommand::ScaleDown),
        _ => None,
    }
}

/// Everything the user did since the previous frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameInput {
    pub commands: HashSet<ViewCommand>,
    /// Cursor travel while the orbit button was held, in pixels.
    pub drag: Vec2,
    /// Wheel movement in lines, positive away from the user.
    pub scroll: f32,
    pub exit_requested: bool,
}

impl FrameInput {
    pub fn pressed(&self, command: ViewCommand) -> bool {
        self.commands.contains(&command)
    }
}

/// Accumulates winit events between frames.
#[derive(Debug, Default)]
pub struct InputState {
    pending: FrameInput,
    is_orbiting: bool,
    last_cursor: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_orbiting = *state == ElementState::Pressed;
                if !self.is_orbiting {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                if self.is_orbiting {
                    if let Some(last) = self.last_cursor {
                        self.pending.drag += cursor - last;
                    }
                    self.last_cursor = Some(cursor);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.pending.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
            }
            WindowEvent::Focused(false) => {
                self.is_orbiting = false;
                self.last_cursor = None;
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        if let PhysicalKey::Code(code) = event.physical_key {
            self.press(code);
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        if key == KeyCode::Escape {
            self.pending.exit_requested = true;
        } else if let Some(command) = command_for_key(key) {
            self.pending.commands.insert(command);
        }
    }

    /// Hands out the accumulated input and starts a fresh frame.
    pub fn take_frame(&mut self) -> FrameInput {
        std::mem::take(&mut self.pending)
    }
}
