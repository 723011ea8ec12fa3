use anyhow::{Result, ensure};

use crate::constants::{
    CAMERA_Z, FOV_SCALE, MAX_RAYCASTING_DEPTH, NUM_RAYS, SCREEN_H, SCREEN_W, SKY_SCROLL,
};
use crate::texture::Color;

/// Optional raycaster passes. Walls are always cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStages {
    pub sky: bool,
    pub floor_ceiling: bool,
    pub sprites: bool,
}

impl RenderStages {
    pub const ALL: RenderStages = RenderStages {
        sky: true,
        floor_ceiling: true,
        sprites: true,
    };

    pub const WALLS_ONLY: RenderStages = RenderStages {
        sky: false,
        floor_ceiling: false,
        sprites: false,
    };
}

impl Default for RenderStages {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub screen_width: usize,
    pub screen_height: usize,
    /// Wall rays per frame; each covers `screen_width / num_rays` pixels.
    pub num_rays: usize,
    /// DDA steps before a ray gives up.
    pub max_depth: usize,
    /// Camera plane length; 0.66 gives about 66 degrees of horizontal FOV.
    pub fov_scale: f32,
    /// Eye height above the floor in screen pixels.
    pub camera_z: f32,
    /// Sky scroll in pixels per degree of camera angle.
    pub sky_scroll: f32,
    pub floor_color: Color,
    /// Ceiling cells with no ceiling tile. Transparent lets the sky through.
    pub ceiling_color: Color,
    pub sky_color: Color,
    pub stages: RenderStages,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_W,
            screen_height: SCREEN_H,
            num_rays: NUM_RAYS,
            max_depth: MAX_RAYCASTING_DEPTH,
            fov_scale: FOV_SCALE,
            camera_z: CAMERA_Z,
            sky_scroll: SKY_SCROLL,
            floor_color: Color::rgb(70, 70, 70),
            ceiling_color: Color::TRANSPARENT,
            sky_color: Color::rgb(30, 30, 70),
            stages: RenderStages::ALL,
        }
    }
}

impl RenderConfig {
    /// Config for a `width` x `height` screen with one ray per column.
    pub fn with_resolution(width: usize, height: usize) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            num_rays: width,
            camera_z: 0.5 * height as f32,
            sky_scroll: width as f32 / 100.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.screen_width > 0 && self.screen_height > 0,
            "screen size {}x{} is empty",
            self.screen_width,
            self.screen_height
        );
        ensure!(
            self.num_rays > 0 && self.num_rays <= self.screen_width,
            "ray count {} must be between 1 and the screen width {}",
            self.num_rays,
            self.screen_width
        );
        ensure!(self.max_depth > 0, "max raycasting depth must be positive");
        ensure!(
            self.fov_scale > 0.0 && self.fov_scale.is_finite(),
            "fov scale {} must be positive",
            self.fov_scale
        );
        Ok(())
    }

    pub fn column_width(&self) -> f32 {
        self.screen_width as f32 / self.num_rays as f32
    }

    /// Ray column covering screen column `x`.
    #[inline]
    pub fn ray_column(&self, x: usize) -> usize {
        (x * self.num_rays / self.screen_width).min(self.num_rays - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RenderConfig::default();
        config.validate().unwrap();
        assert_eq!(config.num_rays, 600);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn rejects_bad_values() {
        let base = RenderConfig::with_resolution(64, 48);
        base.validate().unwrap();

        let mut c = base.clone();
        c.num_rays = 65;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.max_depth = 0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.fov_scale = 0.0;
        assert!(c.validate().is_err());

        let mut c = base;
        c.screen_height = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn ray_column_covers_screen() {
        let mut config = RenderConfig::with_resolution(100, 50);
        config.num_rays = 30;
        assert_eq!(config.ray_column(0), 0);
        assert_eq!(config.ray_column(99), 29);
        assert_eq!(config.ray_column(50), 15);
    }
}
