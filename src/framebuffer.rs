use crate::config::RenderConfig;
use crate::raycaster::{Frame, SpriteColumn, WallStrip};
use crate::texture::{Color, Texture, TextureAtlas, TextureSet};

/// Packed 0RGB pixel surface, row by row.
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn for_config(config: &RenderConfig) -> Self {
        Self::new(config.screen_width, config.screen_height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.pack());
    }

    /// Paints `frame` back to front: sky, floor and ceiling, walls, sprites.
    ///
    /// The framebuffer must match the configured screen size.
    pub fn composite(&mut self, frame: &Frame, textures: &TextureSet, config: &RenderConfig) {
        debug_assert_eq!(self.width, config.screen_width);
        debug_assert_eq!(self.height, config.screen_height);

        match (&textures.sky, config.stages.sky) {
            (Some(sky), true) if !sky.is_empty() => {
                self.draw_sky(sky, frame.camera.angle * config.sky_scroll)
            }
            _ => self.clear(config.sky_color),
        }

        if config.stages.floor_ceiling {
            for (dst, color) in self.pixels.iter_mut().zip(&frame.floor_ceiling) {
                *dst = color.blend_over(*dst);
            }
        }

        let column_width = config.column_width();
        for (column, strip) in frame.walls.iter().enumerate() {
            if let Some(strip) = strip {
                let x0 = (column as f32 * column_width) as usize;
                let x1 = (((column + 1) as f32 * column_width) as usize).min(self.width);
                self.draw_wall(strip, x0..x1.max(x0 + 1), textures.walls.as_ref());
            }
        }

        for column in &frame.sprites {
            self.draw_sprite_column(column, textures.sprites.as_ref());
        }
    }

    /// Stretches `sky` to the screen height and tiles it horizontally,
    /// starting `offset` pixels into the texture.
    fn draw_sky(&mut self, sky: &Texture, offset: f32) {
        let (w, h) = (self.width, self.height);
        let offset = offset as i64;
        let scale_x = sky.width() as f32 / w as f32;
        let scale_y = sky.height() as f32 / h as f32;
        for y in 0..h {
            let ty = (y as f32 * scale_y) as i64;
            let row = &mut self.pixels[y * w..(y + 1) * w];
            for (x, dst) in row.iter_mut().enumerate() {
                let tx = offset + (x as f32 * scale_x) as i64;
                *dst = sky.sample_wrapped(tx, ty).pack();
            }
        }
    }

    fn draw_wall(
        &mut self,
        strip: &WallStrip,
        columns: std::ops::Range<usize>,
        atlas: Option<&TextureAtlas>,
    ) {
        let y0 = strip.top.max(0.0) as usize;
        let y1 = (strip.bottom.max(0.0) as usize).min(self.height);
        let cell = usize::try_from(strip.hit.tile)
            .ok()
            .and_then(|tile| tile.checked_sub(1))
            .zip(atlas)
            .filter(|(cell, atlas)| atlas.has_cell(*cell));

        for y in y0..y1 {
            let color = match cell {
                Some((cell, atlas)) => {
                    let v = (y as f32 - strip.top) / strip.height * atlas.cell_size() as f32;
                    atlas.sample(cell, strip.tex_u, v as u32)
                }
                None => Color::WHITE,
            };
            let packed = color.shade(strip.brightness).pack();
            let row = y * self.width;
            for x in columns.clone() {
                self.pixels[row + x] = packed;
            }
        }
    }

    fn draw_sprite_column(&mut self, column: &SpriteColumn, atlas: Option<&TextureAtlas>) {
        let Some(atlas) = atlas.filter(|a| a.has_cell(column.texture)) else {
            return;
        };
        let size = atlas.cell_size() as f32;
        let height = column.bottom - column.top;
        let u = (column.u * size) as u32;
        let y0 = column.top.max(0.0) as usize;
        let y1 = (column.bottom.max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            let v = ((y as f32 - column.top) / height * size) as u32;
            let idx = y * self.width + column.x;
            self.pixels[idx] = atlas.sample(column.texture, u, v).blend_over(self.pixels[idx]);
        }
    }
}
