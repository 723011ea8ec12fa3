//! Grid raycasting engine: a layered tile map and a DDA renderer that turns it
//! into a first-person view with textured walls, floors, ceilings and sprites.

pub mod camera;
pub mod config;
pub mod constants;
pub mod demo;
pub mod framebuffer;
pub mod map;
pub mod present;
pub mod raycaster;
pub mod sprite;
pub mod texture;

pub use camera::Camera;
pub use config::{RenderConfig, RenderStages};
pub use framebuffer::Framebuffer;
pub use map::{GridMap, LAYER_COUNT, Layer};
pub use raycaster::{Frame, RayCast, RayHit, Raycaster, cast_ray};
pub use sprite::Sprite;
pub use texture::{Color, Texture, TextureAtlas, TextureSet};
