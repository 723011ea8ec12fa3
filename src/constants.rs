//! Default values for [`RenderConfig`](crate::config::RenderConfig) and the viewer.

/// Internal framebuffer width in pixels.
pub const SCREEN_W: usize = 1024;
/// Internal framebuffer height in pixels.
pub const SCREEN_H: usize = 768;

/// Number of wall rays cast per frame. Larger values (e.g. 1024) give smoother walls.
pub const NUM_RAYS: usize = 600;

/// Maximum number of DDA steps per ray.
pub const MAX_RAYCASTING_DEPTH: usize = 64;

/// Length of the camera plane relative to the forward vector (about 66 degrees of FOV).
pub const FOV_SCALE: f32 = 0.66;

/// Height of the eye above the floor plane, in screen pixels.
pub const CAMERA_Z: f32 = 0.5 * SCREEN_H as f32;

/// Sky scroll in pixels per degree of camera rotation.
pub const SKY_SCROLL: f32 = SCREEN_W as f32 / 100.0;

/// Darkening applied to walls hit on a vertical face.
pub const VERTICAL_FACE_SHADE: f32 = 0.7;

/// Movement speed of the viewer camera in cells per second.
pub const MOVE_SPEED: f32 = 2.5;
/// Turn speed of the viewer camera in degrees per second.
pub const TURN_SPEED: f32 = 120.0;
/// Collision radius of the viewer camera in cells.
pub const PLAYER_SIZE: f32 = 0.1;
