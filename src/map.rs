//! Multi-layer tile grid and its binary file format.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{debug, error};

/// Number of tile layers stored per cell.
pub const LAYER_COUNT: usize = 3;

const HEADER_LEN: usize = 2 * size_of::<u64>();
const CELL_LEN: usize = LAYER_COUNT * size_of::<i32>();

/// Tile layers of a [`GridMap`] cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Layer {
    Walls = 0,
    Floor = 1,
    Ceiling = 2,
}

impl Layer {
    pub const ALL: [Layer; LAYER_COUNT] = [Layer::Walls, Layer::Floor, Layer::Ceiling];

    /// Returns the layer with the given index, or `None` for an invalid index.
    pub fn from_index(index: i32) -> Option<Layer> {
        match index {
            0 => Some(Layer::Walls),
            1 => Some(Layer::Floor),
            2 => Some(Layer::Ceiling),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A grid of cells, each holding one tile id per [`Layer`]. Tile id 0 is empty.
///
/// The grid is indexed by `grid[y][x]`. All rows have the same length.
///
/// Cell access never fails: coordinates outside the grid read as 0 and writes
/// to them are ignored. The raycaster relies on this when it steps rays past
/// the map edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridMap {
    grid: Vec<Vec<[i32; LAYER_COUNT]>>,
}

impl GridMap {
    /// Creates a `width` x `height` map with every tile empty.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid: vec![vec![[0; LAYER_COUNT]; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    fn slot(&self, x: i32, y: i32) -> Option<&[i32; LAYER_COUNT]> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize)
    }

    #[inline]
    fn slot_mut(&mut self, x: i32, y: i32) -> Option<&mut [i32; LAYER_COUNT]> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get_mut(y as usize)?.get_mut(x as usize)
    }

    /// Tile id at `(x, y)` on `layer`, or 0 outside the grid.
    #[inline]
    pub fn cell(&self, x: i32, y: i32, layer: Layer) -> i32 {
        self.slot(x, y).map_or(0, |cell| cell[layer.index()])
    }

    /// Like [`GridMap::cell`] with an untyped layer index. Invalid layers read as 0.
    pub fn cell_raw(&self, x: i32, y: i32, layer: i32) -> i32 {
        Layer::from_index(layer).map_or(0, |layer| self.cell(x, y, layer))
    }

    /// Overwrites the tile at `(x, y)` on `layer`. Does nothing outside the grid.
    pub fn set_cell(&mut self, x: i32, y: i32, layer: Layer, value: i32) {
        if let Some(cell) = self.slot_mut(x, y) {
            cell[layer.index()] = value;
        }
    }

    pub fn set_cell_raw(&mut self, x: i32, y: i32, layer: i32, value: i32) {
        if let Some(layer) = Layer::from_index(layer) {
            self.set_cell(x, y, layer, value);
        }
    }

    pub fn fill(&mut self, layer: Layer, value: i32) {
        for cell in self.grid.iter_mut().flatten() {
            cell[layer.index()] = value;
        }
    }

    pub fn fill_raw(&mut self, layer: i32, value: i32) {
        if let Some(layer) = Layer::from_index(layer) {
            self.fill(layer, value);
        }
    }

    /// Resizes the grid, keeping the cells inside the overlapping area.
    /// New cells are empty; cells past the new bounds are dropped.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.grid.resize_with(height, Vec::new);
        for row in &mut self.grid {
            row.resize(width, [0; LAYER_COUNT]);
        }
    }

    /// Encodes the map: `[width: u64][height: u64]` followed by the cells in
    /// row-major order, each as `LAYER_COUNT` `i32`s. Host byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (width, height) = if self.is_empty() {
            (0, 0)
        } else {
            (self.width(), self.height())
        };
        let mut out = Vec::with_capacity(HEADER_LEN + width * height * CELL_LEN);
        out.extend_from_slice(&(width as u64).to_ne_bytes());
        out.extend_from_slice(&(height as u64).to_ne_bytes());
        for cell in self.grid.iter().flatten() {
            for value in cell {
                out.extend_from_slice(&value.to_ne_bytes());
            }
        }
        out
    }

    /// Decodes a map written by [`GridMap::to_bytes`].
    ///
    /// The payload length must match the header exactly.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            bail!("map data is {} bytes, shorter than the header", bytes.len());
        }
        let (header, body) = bytes.split_at(HEADER_LEN);
        let width = read_u64(&header[..8]);
        let height = read_u64(&header[8..]);

        let expected = width
            .checked_mul(height)
            .and_then(|cells| cells.checked_mul(CELL_LEN as u64))
            .context("map dimensions overflow")?;
        if expected != body.len() as u64 {
            bail!(
                "map is {width}x{height} but carries {} bytes of cell data, expected {expected}",
                body.len()
            );
        }

        if width == 0 || height == 0 {
            return Ok(Self::default());
        }

        let (width, height) = (width as usize, height as usize);
        let mut cells = body.chunks_exact(CELL_LEN).map(|chunk| {
            let mut cell = [0; LAYER_COUNT];
            for (value, raw) in cell.iter_mut().zip(chunk.chunks_exact(4)) {
                *value = i32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]);
            }
            cell
        });
        let grid = (0..height)
            .map(|_| cells.by_ref().take(width).collect())
            .collect();
        Ok(Self { grid })
    }

    /// Writes the map to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let result = fs::write(path, self.to_bytes())
            .with_context(|| format!("failed to write map to {}", path.display()));
        match &result {
            Ok(()) => debug!(
                "saved {}x{} map to {}",
                self.width(),
                self.height(),
                path.display()
            ),
            Err(e) => error!("{e:#}"),
        }
        result
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let result = fs::read(path)
            .with_context(|| format!("failed to open map {}", path.display()))
            .and_then(|bytes| {
                Self::from_bytes(&bytes)
                    .with_context(|| format!("failed to decode map {}", path.display()))
            });
        match &result {
            Ok(map) => debug!(
                "loaded {}x{} map from {}",
                map.width(),
                map.height(),
                path.display()
            ),
            Err(e) => error!("{e:#}"),
        }
        result
    }

    /// Replaces this map with the one stored at `path`.
    /// On error the current contents are kept.
    pub fn load_into(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0; 8];
    raw.copy_from_slice(bytes);
    u64::from_ne_bytes(raw)
}

/// Draws the walls layer, `#` for walls and `.` for empty cells.
impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            for cell in row {
                let c = if cell[Layer::Walls.index()] != 0 { '#' } else { '.' };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_has_zero_width() {
        let map = GridMap::default();
        assert_eq!(map.width(), 0);
        assert_eq!(map.height(), 0);
        assert!(map.is_empty());
        assert_eq!(map.cell(0, 0, Layer::Walls), 0);
    }

    #[test]
    fn cell_bounds_are_safe() {
        let mut map = GridMap::new(4, 3);
        map.fill(Layer::Walls, 9);
        for &(x, y) in &[
            (-1, 0),
            (0, -1),
            (4, 0),
            (0, 3),
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MAX),
        ] {
            assert_eq!(map.cell(x, y, Layer::Walls), 0, "({x}, {y})");
            map.set_cell(x, y, Layer::Walls, 5);
        }
        assert_eq!(map.cell_raw(1, 1, 3), 0);
        assert_eq!(map.cell_raw(1, 1, -1), 0);
        map.set_cell_raw(1, 1, 7, 5);
        assert!(map.to_string().lines().all(|row| row == "####"));
    }

    #[test]
    fn set_then_get() {
        let mut map = GridMap::new(3, 3);
        map.set_cell(2, 1, Layer::Ceiling, 4);
        assert_eq!(map.cell(2, 1, Layer::Ceiling), 4);
        assert_eq!(map.cell(2, 1, Layer::Floor), 0);
        assert_eq!(map.cell_raw(2, 1, 2), 4);
    }

    #[test]
    fn display_marks_walls() {
        let mut map = GridMap::new(3, 2);
        map.set_cell(1, 0, Layer::Walls, 1);
        map.set_cell(0, 1, Layer::Floor, 1);
        assert_eq!(map.to_string(), ".#.\n...\n");
    }

    #[test]
    fn from_bytes_rejects_truncated_data() {
        let mut map = GridMap::new(2, 2);
        map.set_cell(1, 1, Layer::Walls, 3);
        let bytes = map.to_bytes();
        assert!(GridMap::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(GridMap::from_bytes(&bytes[..10]).is_err());
        assert_eq!(GridMap::from_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn from_bytes_rejects_huge_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u64::MAX.to_ne_bytes());
        bytes.extend_from_slice(&u64::MAX.to_ne_bytes());
        assert!(GridMap::from_bytes(&bytes).is_err());
    }

    #[test]
    fn zero_width_header_is_empty_map() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u64.to_ne_bytes());
        bytes.extend_from_slice(&u64::MAX.to_ne_bytes());
        let map = GridMap::from_bytes(&bytes).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.height(), 0);

        bytes.push(0);
        assert!(GridMap::from_bytes(&bytes).is_err());
    }

    #[test]
    fn degenerate_map_encodes_as_empty() {
        let mut map = GridMap::default();
        map.resize(0, 5);
        assert_eq!(GridMap::from_bytes(&map.to_bytes()).unwrap(), GridMap::default());
    }
}
