//! Colors, textures and the texture bundle handed to the raycaster.

use anyhow::{Result, bail, ensure};
use log::warn;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Packs into the 0RGB layout used by the framebuffer.
    #[inline]
    pub fn pack(self) -> u32 {
        // BGRA8 in little-endian memory, alpha at 0
        (self.b as u32) | ((self.g as u32) << 8) | ((self.r as u32) << 16)
    }

    #[inline]
    pub fn unpack(packed: u32) -> Self {
        Self::rgb((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }

    /// Multiplies the color channels by `factor`, clamped to [0, 1].
    #[inline]
    pub fn shade(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self::rgba(
            (self.r as f32 * f) as u8,
            (self.g as f32 * f) as u8,
            (self.b as f32 * f) as u8,
            self.a,
        )
    }

    /// Blends this color over a packed framebuffer pixel.
    #[inline]
    pub fn blend_over(self, dst: u32) -> u32 {
        match self.a {
            0 => dst,
            255 => self.pack(),
            a => {
                let a = a as u32;
                let inv = 255 - a;
                let d = Color::unpack(dst);
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv) / 255) as u8;
                Color::rgb(mix(self.r, d.r), mix(self.g, d.g), mix(self.b, d.b)).pack()
            }
        }
    }
}

/// An RGBA image stored row by row.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Texture {
    pub fn new(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "texture has zero size");
        ensure!(
            pixels.len() == width * height,
            "texture is {width}x{height} but has {} pixels",
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a texture by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> Color) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at `(x, y)`, wrapping around both axes.
    #[inline]
    pub fn sample_wrapped(&self, x: i64, y: i64) -> Color {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.pixels[y * self.width + x]
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }
}

/// Square tiles of equal size stacked vertically in one texture.
///
/// The cell size is the texture width and must be a power of two.
/// Cell `i` occupies rows `i * size .. (i + 1) * size`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureAtlas {
    texture: Texture,
    cell_size: usize,
}

impl TextureAtlas {
    pub fn new(texture: Texture) -> Result<Self> {
        let cell_size = texture.width();
        if !cell_size.is_power_of_two() {
            bail!("atlas cell size {cell_size} is not a power of two");
        }
        if texture.height() % cell_size != 0 {
            bail!(
                "atlas height {} is not a multiple of the cell size {cell_size}",
                texture.height()
            );
        }
        Ok(Self { texture, cell_size })
    }

    /// Stacks equally sized square textures into an atlas.
    pub fn from_cells(cells: &[Texture]) -> Result<Self> {
        let Some(first) = cells.first() else {
            bail!("atlas needs at least one cell");
        };
        let size = first.width();
        let mut pixels = Vec::with_capacity(size * size * cells.len());
        for (i, cell) in cells.iter().enumerate() {
            ensure!(
                cell.width() == size && cell.height() == size,
                "atlas cell {i} is {}x{}, expected {size}x{size}",
                cell.width(),
                cell.height()
            );
            pixels.extend_from_slice(&cell.pixels);
        }
        Self::new(Texture::new(size, size * cells.len(), pixels)?)
    }

    #[inline]
    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.texture.height() / self.cell_size
    }

    pub fn has_cell(&self, cell: usize) -> bool {
        cell < self.cell_count()
    }

    /// Texel `(u, v)` of `cell`, with `u` and `v` wrapped into the cell.
    #[inline]
    pub fn sample(&self, cell: usize, u: u32, v: u32) -> Color {
        let mask = self.cell_size - 1;
        let x = u as usize & mask;
        let y = v as usize & mask;
        self.texture.pixel(x, cell * self.cell_size + y)
    }
}

/// Texture resources shared by every frame. Any slot may be missing, in which
/// case that stage draws flat colors.
#[derive(Clone, Debug, Default)]
pub struct TextureSet {
    pub walls: Option<TextureAtlas>,
    pub floor_ceiling: Option<TextureAtlas>,
    pub sprites: Option<TextureAtlas>,
    pub sky: Option<Texture>,
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_walls(mut self, atlas: Result<TextureAtlas>) -> Self {
        self.walls = keep_loaded("wall", atlas);
        self
    }

    pub fn with_floor_ceiling(mut self, atlas: Result<TextureAtlas>) -> Self {
        self.floor_ceiling = keep_loaded("floor/ceiling", atlas);
        self
    }

    pub fn with_sprites(mut self, atlas: Result<TextureAtlas>) -> Self {
        self.sprites = keep_loaded("sprite", atlas);
        self
    }

    pub fn with_sky(mut self, sky: Result<Texture>) -> Self {
        self.sky = keep_loaded("sky", sky);
        self
    }
}

fn keep_loaded<T>(what: &str, resource: Result<T>) -> Option<T> {
    resource
        .inspect_err(|e| warn!("{what} textures unavailable, drawing flat colors: {e:#}"))
        .ok()
}

/// Procedural textures for maps without image assets.
pub mod procedural {
    use super::{Color, Texture};

    /// Brick pattern with dark mortar lines.
    pub fn bricks(size: usize, brick: Color, mortar: Color) -> Texture {
        let row_h = (size / 4).max(1);
        let brick_w = (size / 2).max(1);
        Texture::from_fn(size, size, |x, y| {
            let row = y / row_h;
            let offset = if row % 2 == 0 { 0 } else { brick_w / 2 };
            if y % row_h == 0 || (x + offset) % brick_w == 0 {
                mortar
            } else {
                brick
            }
        })
    }

    /// Two-color checkerboard with `squares` squares per side.
    pub fn checker(size: usize, squares: usize, a: Color, b: Color) -> Texture {
        let square = (size / squares.max(1)).max(1);
        Texture::from_fn(size, size, |x, y| {
            if (x / square + y / square) % 2 == 0 { a } else { b }
        })
    }

    /// Filled disc on a transparent background.
    pub fn disc(size: usize, color: Color) -> Texture {
        let r = size as f32 / 2.0;
        Texture::from_fn(size, size, |x, y| {
            let dx = x as f32 + 0.5 - r;
            let dy = y as f32 + 0.5 - r;
            if dx * dx + dy * dy <= r * r {
                color
            } else {
                Color::TRANSPARENT
            }
        })
    }

    /// Vertical gradient from `top` to `bottom`, with a few light spots for stars.
    pub fn sky(width: usize, height: usize, top: Color, bottom: Color) -> Texture {
        let h = height.max(2) as f32 - 1.0;
        Texture::from_fn(width, height, |x, y| {
            if (x * 7919 + y * 104_729) % 997 == 0 && y < height / 2 {
                return Color::WHITE;
            }
            let t = y as f32 / h;
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
            Color::rgb(lerp(top.r, bottom.r), lerp(top.g, bottom.g), lerp(top.b, bottom.b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_roundtrip_drops_alpha() {
        let c = Color::rgba(10, 20, 30, 40);
        assert_eq!(c.pack(), 0x000A141E);
        assert_eq!(Color::unpack(c.pack()), Color::rgb(10, 20, 30));
    }

    #[test]
    fn shade_clamps() {
        let c = Color::rgb(200, 100, 50);
        assert_eq!(c.shade(2.0), c);
        assert_eq!(c.shade(-1.0), Color::rgb(0, 0, 0));
        assert_eq!(c.shade(0.5), Color::rgb(100, 50, 25));
    }

    #[test]
    fn blend_extremes() {
        let dst = Color::rgb(1, 2, 3).pack();
        assert_eq!(Color::TRANSPARENT.blend_over(dst), dst);
        assert_eq!(Color::rgb(9, 9, 9).blend_over(dst), Color::rgb(9, 9, 9).pack());
    }

    #[test]
    fn atlas_rejects_bad_shapes() {
        let odd = Texture::from_fn(3, 3, |_, _| Color::WHITE);
        assert!(TextureAtlas::new(odd).is_err());

        let ragged = Texture::from_fn(4, 6, |_, _| Color::WHITE);
        assert!(TextureAtlas::new(ragged).is_err());

        let a = Texture::from_fn(4, 4, |_, _| Color::WHITE);
        let b = Texture::from_fn(8, 8, |_, _| Color::WHITE);
        assert!(TextureAtlas::from_cells(&[a, b]).is_err());
        assert!(TextureAtlas::from_cells(&[]).is_err());
        assert!(Texture::new(2, 2, vec![Color::WHITE; 3]).is_err());
    }

    #[test]
    fn atlas_cells_are_stacked_vertically() {
        let red = Texture::from_fn(4, 4, |_, _| Color::rgb(255, 0, 0));
        let blue = Texture::from_fn(4, 4, |_, _| Color::rgb(0, 0, 255));
        let atlas = TextureAtlas::from_cells(&[red, blue]).unwrap();
        assert_eq!(atlas.cell_size(), 4);
        assert_eq!(atlas.cell_count(), 2);
        assert!(atlas.has_cell(1));
        assert!(!atlas.has_cell(2));
        assert_eq!(atlas.sample(1, 2, 3), Color::rgb(0, 0, 255));
        // u and v wrap inside the cell
        assert_eq!(atlas.sample(0, 6, 7), Color::rgb(255, 0, 0));
    }

    #[test]
    fn texture_set_keeps_only_valid_atlases() {
        let bad = TextureAtlas::new(Texture::from_fn(3, 3, |_, _| Color::WHITE));
        let good = TextureAtlas::new(Texture::from_fn(4, 4, |_, _| Color::WHITE));
        let set = TextureSet::new().with_walls(bad).with_sprites(good);
        assert!(set.walls.is_none());
        assert!(set.sprites.is_some());
        assert!(set.floor_ceiling.is_none());
    }
}
