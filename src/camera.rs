use glam::{Mat4, Vec2, Vec3};

use crate::view::CameraPose;

pub const NEAR_PLANE: f32 = 0.01;
pub const FAR_PLANE: f32 = 1000.0;

const ROTATE_SPEED: f32 = 0.01;
const ZOOM_SPEED: f32 = 0.5;
const MIN_DISTANCE: f32 = 0.1;
const MAX_DISTANCE: f32 = 100.0;
const PITCH_LIMIT: f32 = 1.5;

impl CameraPose {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect_ratio, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    /// Orbits around the target by a cursor drag and zooms by a wheel delta.
    ///
    /// Orbit angles are recovered from the current pose every call, so
    /// resetting the position needs no extra bookkeeping.
    pub fn orbit(&mut self, drag: Vec2, scroll: f32) {
        if drag == Vec2::ZERO && scroll == 0.0 {
            return;
        }

        let offset = self.position - self.target;
        let mut distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();

        yaw -= drag.x * ROTATE_SPEED;
        pitch = (pitch + drag.y * ROTATE_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        distance = (distance - scroll * ZOOM_SPEED).clamp(MIN_DISTANCE, MAX_DISTANCE);

        self.position = self.target
            + Vec3::new(
                distance * pitch.cos() * yaw.sin(),
                distance * pitch.sin(),
                distance * pitch.cos() * yaw.cos(),
            );
    }
}
