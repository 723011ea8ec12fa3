//! DDA raycaster: wall, floor/ceiling and sprite passes.
//!
//! [`Raycaster::render`] turns a camera pose, a [`GridMap`] and a sprite list
//! into a [`Frame`] of screen-space draw primitives. The frame buffers are
//! allocated once and reused for every frame.

use anyhow::Result;
use log::debug;

use crate::camera::{Camera, CameraBasis};
use crate::config::RenderConfig;
use crate::constants::VERTICAL_FACE_SHADE;
use crate::framebuffer::Framebuffer;
use crate::map::{GridMap, Layer};
use crate::sprite::{self, Sprite};
use crate::texture::{Color, TextureSet};

/// Stand-in for an infinite delta distance when a ray is parallel to an axis.
const PARALLEL_DELTA: f32 = 1e30;

/// Smallest distance used for projection, so a wall touching the camera
/// still has a finite height.
const MIN_PROJECTION_DISTANCE: f32 = 1e-4;

/// Grid-line family of the face a ray hit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HitFace {
    Horizontal,
    Vertical,
}

/// Wall cell found by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub map: [i32; 2],
    pub tile: i32,
    pub face: HitFace,
    /// Distance along the camera's forward axis.
    pub distance: f32,
    /// Fractional hit position along the face, in [0, 1).
    pub wall_x: f32,
}

/// Outcome of [`cast_ray`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCast {
    pub hit: Option<RayHit>,
    pub steps: usize,
}

/// Walks the grid from `origin` along `dir` until a nonzero walls tile or
/// `max_depth` steps.
///
/// The returned distance is the perpendicular distance for the camera whose
/// forward vector produced `dir`, so walls project without fisheye.
pub fn cast_ray(map: &GridMap, origin: [f32; 2], dir: [f32; 2], max_depth: usize) -> RayCast {
    // Which box of the map we're in
    let mut map_x = origin[0].floor() as i32;
    let mut map_y = origin[1].floor() as i32;

    // Length of ray from one x or y-side to next x or y-side
    let delta_x = if dir[0] == 0.0 {
        PARALLEL_DELTA
    } else {
        (1.0 / dir[0]).abs()
    };
    let delta_y = if dir[1] == 0.0 {
        PARALLEL_DELTA
    } else {
        (1.0 / dir[1]).abs()
    };

    let (step_x, mut side_x) = if dir[0] < 0.0 {
        (-1, (origin[0] - map_x as f32) * delta_x)
    } else {
        (1, (map_x as f32 + 1.0 - origin[0]) * delta_x)
    };
    let (step_y, mut side_y) = if dir[1] < 0.0 {
        (-1, (origin[1] - map_y as f32) * delta_y)
    } else {
        (1, (map_y as f32 + 1.0 - origin[1]) * delta_y)
    };

    let mut face = HitFace::Horizontal;
    let mut steps = 0;
    while steps < max_depth {
        if side_x < side_y {
            side_x += delta_x;
            map_x += step_x;
            face = HitFace::Horizontal;
        } else {
            side_y += delta_y;
            map_y += step_y;
            face = HitFace::Vertical;
        }
        steps += 1;

        let tile = map.cell(map_x, map_y, Layer::Walls);
        if tile != 0 {
            let (distance, along) = match face {
                HitFace::Horizontal => {
                    let d = side_x - delta_x;
                    (d, origin[1] + d * dir[1])
                }
                HitFace::Vertical => {
                    let d = side_y - delta_y;
                    (d, origin[0] + d * dir[0])
                }
            };
            return RayCast {
                hit: Some(RayHit {
                    map: [map_x, map_y],
                    tile,
                    face,
                    distance,
                    wall_x: along - along.floor(),
                }),
                steps,
            };
        }
    }

    RayCast { hit: None, steps }
}

/// Screen height of a wall at perpendicular `distance`.
#[inline]
pub fn projected_height(screen_height: f32, distance: f32) -> f32 {
    screen_height / distance.max(MIN_PROJECTION_DISTANCE)
}

/// Distance falloff plus the fixed darkening of vertical faces.
#[inline]
pub fn wall_brightness(distance: f32, face: HitFace, max_depth: usize) -> f32 {
    let brightness = 1.0 - distance / max_depth as f32;
    match face {
        HitFace::Horizontal => brightness,
        HitFace::Vertical => brightness * VERTICAL_FACE_SHADE,
    }
}

/// Vertical wall slice for one ray column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallStrip {
    pub hit: RayHit,
    pub height: f32,
    pub top: f32,
    pub bottom: f32,
    /// Texture column inside the tile's atlas cell.
    pub tex_u: u32,
    pub brightness: f32,
}

/// One screen column of a sprite that passed the wall depth test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteColumn {
    /// Index of the sprite in the depth-sorted slice.
    pub order: usize,
    pub texture: usize,
    pub x: usize,
    /// Horizontal texture coordinate in [0, 1).
    pub u: f32,
    pub top: f32,
    pub bottom: f32,
    pub depth: f32,
}

/// Draw primitives for one frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub camera: Camera,
    /// One entry per ray column; `None` where no wall was hit.
    pub walls: Vec<Option<WallStrip>>,
    /// Floor and ceiling colors, `screen_width * screen_height`, row by row.
    pub floor_ceiling: Vec<Color>,
    /// Sprite columns in draw order, farthest sprite first.
    pub sprites: Vec<SpriteColumn>,
    /// Nearest wall distance per ray column, `+inf` where no wall was hit.
    pub z_buffer: Vec<f32>,
}

impl Frame {
    fn new(config: &RenderConfig) -> Self {
        Self {
            camera: Camera::new([0.0, 0.0], 0.0),
            walls: vec![None; config.num_rays],
            floor_ceiling: vec![Color::TRANSPARENT; config.screen_width * config.screen_height],
            sprites: Vec::new(),
            z_buffer: vec![f32::INFINITY; config.num_rays],
        }
    }
}

/// Software raycasting renderer.
pub struct Raycaster {
    config: RenderConfig,
    textures: TextureSet,
    frame: Frame,
}

impl Raycaster {
    pub fn new(config: RenderConfig, textures: TextureSet) -> Result<Self> {
        config.validate()?;
        debug!(
            "raycaster {}x{} with {} rays, depth {}",
            config.screen_width, config.screen_height, config.num_rays, config.max_depth
        );
        let frame = Frame::new(&config);
        Ok(Self {
            config,
            textures,
            frame,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Renders one frame. `sprites` is reordered farthest first.
    pub fn render(&mut self, camera: &Camera, map: &GridMap, sprites: &mut [Sprite]) -> &Frame {
        let basis = camera.basis(self.config.fov_scale);
        self.frame.camera = *camera;

        self.cast_walls(&basis, map);
        if self.config.stages.floor_ceiling {
            self.cast_floor_ceiling(&basis, map);
        }
        self.frame.sprites.clear();
        if self.config.stages.sprites {
            self.cast_sprites(&basis, sprites);
        }
        &self.frame
    }

    /// Renders a frame and paints it into `target`.
    pub fn render_into(
        &mut self,
        target: &mut Framebuffer,
        camera: &Camera,
        map: &GridMap,
        sprites: &mut [Sprite],
    ) {
        self.render(camera, map, sprites);
        target.composite(&self.frame, &self.textures, &self.config);
    }

    fn cast_walls(&mut self, basis: &CameraBasis, map: &GridMap) {
        let config = &self.config;
        let screen_h = config.screen_height as f32;
        let cell_size = self.textures.walls.as_ref().map_or(1, |a| a.cell_size());
        self.frame.z_buffer.fill(f32::INFINITY);

        for (column, slot) in self.frame.walls.iter_mut().enumerate() {
            // -1 at the left edge, 1 at the right edge
            let camera_x = 2.0 * column as f32 / config.num_rays as f32 - 1.0;
            let dir = basis.ray_dir(camera_x);

            let Some(hit) = cast_ray(map, basis.pos, dir, config.max_depth).hit else {
                *slot = None;
                continue;
            };

            let height = projected_height(screen_h, hit.distance);
            *slot = Some(WallStrip {
                hit,
                height,
                top: (screen_h - height) / 2.0,
                bottom: (screen_h + height) / 2.0,
                tex_u: (hit.wall_x * cell_size as f32) as u32,
                brightness: wall_brightness(hit.distance, hit.face, config.max_depth),
            });
            self.frame.z_buffer[column] = hit.distance;
        }
    }

    fn cast_floor_ceiling(&mut self, basis: &CameraBasis, map: &GridMap) {
        let config = &self.config;
        let (w, h) = (config.screen_width, config.screen_height);
        let half = h / 2;
        let atlas = self.textures.floor_ceiling.as_ref();
        let size = atlas.map_or(1, |a| a.cell_size());
        let mask = size as i32 - 1;

        let left = basis.ray_dir(-1.0);
        let right = basis.ray_dir(1.0);

        let sample = |tile: i32, tex: [i32; 2], flat: Color| -> Color {
            if tile == 0 {
                return flat;
            }
            match atlas {
                Some(atlas) if tile > 0 && atlas.has_cell(tile as usize - 1) => {
                    atlas.sample(tile as usize - 1, tex[0] as u32, tex[1] as u32)
                }
                _ => flat,
            }
        };

        for y in half..h {
            // the horizon row reuses the distance of the row below it
            let p = (y - half).max(1) as f32;
            let row_distance = config.camera_z / p;

            let step = [
                row_distance * (right[0] - left[0]) / w as f32,
                row_distance * (right[1] - left[1]) / w as f32,
            ];
            let mut floor = [
                basis.pos[0] + row_distance * left[0],
                basis.pos[1] + row_distance * left[1],
            ];

            let floor_row = y * w;
            let ceiling_row = (h - y - 1) * w;
            for x in 0..w {
                let cell = [floor[0].floor() as i32, floor[1].floor() as i32];
                let tex = [
                    (size as f32 * (floor[0] - cell[0] as f32)) as i32 & mask,
                    (size as f32 * (floor[1] - cell[1] as f32)) as i32 & mask,
                ];

                let floor_tile = map.cell(cell[0], cell[1], Layer::Floor);
                let ceiling_tile = map.cell(cell[0], cell[1], Layer::Ceiling);
                self.frame.floor_ceiling[floor_row + x] = sample(floor_tile, tex, config.floor_color);
                // with an odd height the middle row is its own mirror and stays floor
                if ceiling_row != floor_row {
                    self.frame.floor_ceiling[ceiling_row + x] =
                        sample(ceiling_tile, tex, config.ceiling_color);
                }

                floor[0] += step[0];
                floor[1] += step[1];
            }
        }
    }

    fn cast_sprites(&mut self, basis: &CameraBasis, sprites: &mut [Sprite]) {
        let config = &self.config;
        let (w, h) = (config.screen_width, config.screen_height);
        let mid = h as f32 / 2.0;

        sprite::sort_far_to_near(sprites, basis.pos);

        for (order, sprite) in sprites.iter().enumerate() {
            let Some(proj) = sprite::project(basis, sprite, w, h) else {
                continue;
            };
            if proj.size <= 0 {
                continue;
            }

            let half_size = proj.size as f32 / 2.0;
            let start = proj.draw_start.max(0) as usize;
            let end = proj.draw_end.clamp(0, w as i32) as usize;
            for x in start..end {
                if proj.depth >= self.frame.z_buffer[config.ray_column(x)] {
                    continue;
                }
                self.frame.sprites.push(SpriteColumn {
                    order,
                    texture: sprite.texture,
                    x,
                    u: (x as i32 - proj.draw_start) as f32 / proj.size as f32,
                    top: mid - half_size,
                    bottom: mid + half_size,
                    depth: proj.depth,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RenderConfig, RenderStages};
    use crate::texture::{Texture, TextureAtlas};

    fn single_wall_map() -> GridMap {
        let mut map = GridMap::new(10, 10);
        map.set_cell(5, 5, Layer::Walls, 1);
        map
    }

    #[test]
    fn exact_hit_on_center_ray() {
        let cast = cast_ray(&single_wall_map(), [2.0, 5.0], [1.0, 0.0], 64);
        let hit = cast.hit.unwrap();
        assert_eq!(hit.map, [5, 5]);
        assert_eq!(hit.tile, 1);
        assert!((hit.distance - 3.0).abs() < 1e-5);
        assert_eq!(cast.steps, 3);
    }

    #[test]
    fn empty_grid_uses_every_step() {
        let map = GridMap::new(8, 8);
        for &dir in &[[1.0, 0.0], [-0.3, 0.7], [0.0, -1.0], [0.5, 0.5]] {
            let cast = cast_ray(&map, [4.5, 4.5], dir, 64);
            assert!(cast.hit.is_none());
            assert_eq!(cast.steps, 64);
        }
    }

    #[test]
    fn negative_direction_hits_face() {
        let mut map = GridMap::new(10, 10);
        map.set_cell(5, 1, Layer::Walls, 2);
        let cast = cast_ray(&map, [5.5, 6.5], [0.0, -1.0], 64);
        let hit = cast.hit.unwrap();
        assert_eq!(hit.face, HitFace::Vertical);
        assert_eq!(hit.map, [5, 1]);
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!((hit.wall_x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn height_shrinks_with_distance() {
        let mut last = f32::INFINITY;
        for d in [0.5, 1.0, 2.0, 3.5, 10.0, 40.0] {
            let h = projected_height(480.0, d);
            assert!(h < last);
            last = h;
        }
    }

    #[test]
    fn vertical_faces_are_darker() {
        let h = wall_brightness(8.0, HitFace::Horizontal, 64);
        let v = wall_brightness(8.0, HitFace::Vertical, 64);
        assert!((h - 0.875).abs() < 1e-6);
        assert!((v - h * 0.7).abs() < 1e-6);
    }

    fn small_config() -> RenderConfig {
        RenderConfig::with_resolution(64, 48)
    }

    #[test]
    fn wall_pass_fills_z_buffer() {
        let mut raycaster = Raycaster::new(small_config(), TextureSet::new()).unwrap();
        let frame = raycaster.render(&Camera::new([2.0, 5.0], 0.0), &single_wall_map(), &mut []);

        let center = frame.walls[32].unwrap();
        assert_eq!(center.hit.map, [5, 5]);
        assert!((frame.z_buffer[32] - 3.0).abs() < 1e-5);
        assert!((center.height - 16.0).abs() < 1e-3);
        assert!((center.top - 16.0).abs() < 1e-3);
        // edge columns look past the single wall
        assert!(frame.walls[0].is_none());
        assert!(frame.z_buffer[0].is_infinite());
    }

    #[test]
    fn z_buffer_resets_between_frames() {
        let mut raycaster = Raycaster::new(small_config(), TextureSet::new()).unwrap();
        let map = single_wall_map();
        raycaster.render(&Camera::new([2.0, 5.0], 0.0), &map, &mut []);
        let frame = raycaster.render(&Camera::new([2.0, 5.0], 180.0), &map, &mut []);
        assert!(frame.z_buffer.iter().all(|d| d.is_infinite()));
        assert!(frame.walls.iter().all(Option::is_none));
    }

    #[test]
    fn wall_texture_column_uses_cell_size() {
        let atlas = TextureAtlas::new(Texture::from_fn(16, 16, |_, _| Color::WHITE));
        let textures = TextureSet::new().with_walls(atlas);
        let mut raycaster = Raycaster::new(small_config(), textures).unwrap();
        let frame = raycaster.render(&Camera::new([2.0, 5.5], 0.0), &single_wall_map(), &mut []);
        let center = frame.walls[32].unwrap();
        assert!((center.hit.wall_x - 0.5).abs() < 1e-5);
        assert_eq!(center.tex_u, 8);
    }

    #[test]
    fn floor_and_ceiling_fall_back_to_flat_colors() {
        let mut map = GridMap::new(32, 32);
        map.fill(Layer::Ceiling, 1);
        let mut config = small_config();
        config.floor_color = Color::rgb(1, 2, 3);
        let mut raycaster = Raycaster::new(config, TextureSet::new()).unwrap();
        let frame = raycaster.render(&Camera::new([16.0, 16.0], 45.0), &map, &mut []);

        // bottom row is floor, top row is the mirrored ceiling
        assert_eq!(frame.floor_ceiling[47 * 64 + 10], Color::rgb(1, 2, 3));
        // ceiling tile set but no atlas loaded
        assert_eq!(frame.floor_ceiling[10], Color::TRANSPARENT);
    }

    #[test]
    fn floor_samples_atlas() {
        let red = Texture::from_fn(8, 8, |_, _| Color::rgb(200, 0, 0));
        let green = Texture::from_fn(8, 8, |_, _| Color::rgb(0, 200, 0));
        let textures =
            TextureSet::new().with_floor_ceiling(TextureAtlas::from_cells(&[red, green]));
        let mut map = GridMap::new(64, 64);
        map.fill(Layer::Floor, 1);
        map.fill(Layer::Ceiling, 2);
        let mut raycaster = Raycaster::new(small_config(), textures).unwrap();
        let frame = raycaster.render(&Camera::new([32.0, 32.0], 0.0), &map, &mut []);
        assert_eq!(frame.floor_ceiling[40 * 64 + 32], Color::rgb(200, 0, 0));
        assert_eq!(frame.floor_ceiling[7 * 64 + 32], Color::rgb(0, 200, 0));
    }

    #[test]
    fn sprite_columns_respect_walls() {
        let mut map = GridMap::new(20, 20);
        map.set_cell(6, 10, Layer::Walls, 1);
        let mut raycaster = Raycaster::new(small_config(), TextureSet::new()).unwrap();

        // in front of the wall
        let mut near = [Sprite::new([4.0, 10.5], 0)];
        let frame = raycaster.render(&Camera::new([2.0, 10.5], 0.0), &map, &mut near);
        assert!(frame.sprites.iter().any(|c| c.x == 32));

        // behind the wall
        let mut far = [Sprite::new([9.0, 10.5], 0)];
        let frame = raycaster.render(&Camera::new([2.0, 10.5], 0.0), &map, &mut far);
        assert!(frame.sprites.iter().all(|c| c.x != 32));
    }

    #[test]
    fn sprites_drawn_far_to_near() {
        let map = GridMap::new(30, 30);
        let mut sprites = [
            Sprite::new([5.0, 10.0], 0),
            Sprite::new([15.0, 10.0], 2),
            Sprite::new([10.0, 10.0], 1),
        ];
        let mut raycaster = Raycaster::new(small_config(), TextureSet::new()).unwrap();
        let frame = raycaster.render(&Camera::new([2.0, 10.0], 0.0), &map, &mut sprites);

        let mut seen = Vec::new();
        for column in &frame.sprites {
            if seen.last() != Some(&column.texture) {
                seen.push(column.texture);
            }
        }
        assert_eq!(seen, vec![2, 1, 0]);
        assert_eq!(sprites.map(|s| s.texture), [2, 1, 0]);
    }

    #[test]
    fn disabled_stages_are_skipped() {
        let mut config = small_config();
        config.stages = RenderStages::WALLS_ONLY;
        let mut raycaster = Raycaster::new(config, TextureSet::new()).unwrap();
        let mut sprites = [Sprite::new([4.0, 5.0], 0)];
        let map = GridMap::new(10, 10);
        let frame = raycaster.render(&Camera::new([2.0, 5.0], 0.0), &map, &mut sprites);
        assert!(frame.sprites.is_empty());
        assert!(frame.floor_ceiling.iter().all(|c| *c == Color::TRANSPARENT));
    }
}
