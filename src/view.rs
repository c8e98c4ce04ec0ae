use glam::Vec3;

pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);
pub const DEFAULT_CAMERA_TARGET: Vec3 = Vec3::ZERO;
pub const DEFAULT_FOV_DEGREES: f32 = 45.0;

pub const SCALE_STEP: f32 = 0.1;
pub const MIN_SCALE: f32 = 0.1;

/// Discrete commands bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewCommand {
    ToggleFullscreen,
    Reset,
    ToggleGrid,
    ScaleUp,
    ScaleDown,
}

/// Order in which simultaneous commands are applied within one frame.
pub const COMMAND_ORDER: [ViewCommand; 5] = [
    ViewCommand::ToggleFullscreen,
    ViewCommand::Reset,
    ViewCommand::ToggleGrid,
    ViewCommand::ScaleUp,
    ViewCommand::ScaleDown,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: DEFAULT_CAMERA_POSITION,
            target: DEFAULT_CAMERA_TARGET,
            up: Vec3::Y,
            fov: DEFAULT_FOV_DEGREES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub camera: CameraPose,
    pub scale: f32,
    pub show_grid: bool,
    pub fullscreen: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            camera: CameraPose::default(),
            scale: 1.0,
            show_grid: true,
            fullscreen: false,
        }
    }
}

impl ViewState {
    pub fn apply(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::ToggleFullscreen => self.fullscreen = !self.fullscreen,
            ViewCommand::Reset => {
                self.camera.position = DEFAULT_CAMERA_POSITION;
                self.camera.target = DEFAULT_CAMERA_TARGET;
                self.scale = 1.0;
            }
            ViewCommand::ToggleGrid => self.show_grid = !self.show_grid,
            ViewCommand::ScaleUp => self.scale += SCALE_STEP,
            ViewCommand::ScaleDown => {
                self.scale = if self.scale > MIN_SCALE {
                    (self.scale - SCALE_STEP).max(MIN_SCALE)
                } else {
                    MIN_SCALE
                };
            }
        }
    }

    /// Applies every command that is present, in [`COMMAND_ORDER`].
    pub fn apply_all(&mut self, pressed: impl Fn(ViewCommand) -> bool) {
        for command in COMMAND_ORDER {
            if pressed(command) {
                self.apply(command);
            }
        }
    }
}
