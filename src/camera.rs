/// Camera pose on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub pos: [f32; 2], // (x, y) position in cell units
    pub angle: f32,    // degrees, 0 faces +X and 90 faces +Y
}

impl Camera {
    pub fn new(pos: [f32; 2], angle: f32) -> Self {
        Self { pos, angle }
    }

    /// Forward vector and camera plane for this pose.
    pub fn basis(&self, fov_scale: f32) -> CameraBasis {
        let (s, c) = self.angle.to_radians().sin_cos();
        CameraBasis {
            pos: self.pos,
            dir: [c, s],
            plane: [-s * fov_scale, c * fov_scale],
        }
    }

    /// Rotates by `degrees`, keeping the angle in [0, 360).
    pub fn turn(&mut self, degrees: f32) {
        self.angle = (self.angle + degrees).rem_euclid(360.0);
    }
}

/// Per-frame view vectors derived from a [`Camera`].
///
/// Ray directions are `dir + plane * camera_x` with `camera_x` in [-1, 1]
/// from the left to the right edge of the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBasis {
    pub pos: [f32; 2],
    pub dir: [f32; 2],
    pub plane: [f32; 2],
}

impl CameraBasis {
    #[inline]
    pub fn ray_dir(&self, camera_x: f32) -> [f32; 2] {
        [
            self.dir[0] + self.plane[0] * camera_x,
            self.dir[1] + self.plane[1] * camera_x,
        ]
    }

    /// Transforms a world point into camera space as `(lateral, depth)`.
    ///
    /// Inverse of the `[plane dir]` matrix:
    ///
    /// ```text
    /// [ plane.x dir.x ]^-1 = 1/det * [  dir.y   -dir.x  ]
    /// [ plane.y dir.y ]              [ -plane.y  plane.x ]
    /// det = plane.x * dir.y - dir.x * plane.y
    /// ```
    #[inline]
    pub fn world_to_camera(&self, p: [f32; 2]) -> [f32; 2] {
        // Translate
        let dx = p[0] - self.pos[0];
        let dy = p[1] - self.pos[1];
        let inv_det = 1.0 / (self.plane[0] * self.dir[1] - self.dir[0] * self.plane[1]);
        [
            inv_det * (self.dir[1] * dx - self.dir[0] * dy),
            inv_det * (-self.plane[1] * dx + self.plane[0] * dy),
        ]
    }

    /// Screen column of a camera-space point.
    #[inline]
    pub fn project_x(&self, cx: f32, cy: f32, screen_width: f32) -> f32 {
        0.5 * screen_width * (1.0 + cx / cy)
    }
}
