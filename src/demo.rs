//! Built-in scene for the viewer when no map file is given.

use crate::camera::Camera;
use crate::map::{GridMap, Layer};
use crate::sprite::Sprite;
use crate::texture::{Color, TextureAtlas, TextureSet, procedural};

const TEXTURE_SIZE: usize = 64;

/// A 24x24 walled arena with a few rooms and a partly roofed area.
pub fn demo_map() -> GridMap {
    let (width, height) = (24, 24);
    let mut map = GridMap::new(width, height);
    map.fill(Layer::Floor, 1);

    // Border
    for x in 0..width as i32 {
        map.set_cell(x, 0, Layer::Walls, 1);
        map.set_cell(x, height as i32 - 1, Layer::Walls, 1);
    }
    for y in 0..height as i32 {
        map.set_cell(0, y, Layer::Walls, 1);
        map.set_cell(width as i32 - 1, y, Layer::Walls, 1);
    }

    // Vertical wall
    for y in 5..15 {
        map.set_cell(8, y, Layer::Walls, 2);
    }
    // Horizontal wall
    for x in 10..16 {
        map.set_cell(x, 12, Layer::Walls, 3);
    }

    // Roofed room in the corner with a door
    for i in 15..21 {
        map.set_cell(i, 15, Layer::Walls, 4);
        map.set_cell(i, 20, Layer::Walls, 4);
        map.set_cell(15, i, Layer::Walls, 4);
        map.set_cell(20, i, Layer::Walls, 4);
    }
    map.set_cell(17, 15, Layer::Walls, 0);
    for y in 16..20 {
        for x in 16..20 {
            map.set_cell(x, y, Layer::Floor, 2);
            map.set_cell(x, y, Layer::Ceiling, 3);
        }
    }

    map
}

pub fn demo_sprites() -> Vec<Sprite> {
    vec![
        Sprite::new([4.5, 4.5], 0),
        Sprite::new([12.5, 6.5], 1),
        Sprite::new([17.5, 17.5], 0),
        Sprite::new([5.5, 18.5], 1),
    ]
}

pub fn demo_camera() -> Camera {
    Camera::new([3.5, 3.5], 45.0)
}

/// Procedural stand-ins for wall, floor/ceiling, sprite and sky images.
pub fn demo_textures() -> TextureSet {
    let s = TEXTURE_SIZE;
    let mortar = Color::rgb(60, 60, 60);
    let walls = TextureAtlas::from_cells(&[
        procedural::bricks(s, Color::rgb(150, 150, 150), mortar),
        procedural::bricks(s, Color::rgb(170, 60, 50), mortar),
        procedural::bricks(s, Color::rgb(60, 140, 70), mortar),
        procedural::checker(s, 4, Color::rgb(60, 70, 170), Color::rgb(40, 50, 130)),
    ]);
    let floor_ceiling = TextureAtlas::from_cells(&[
        procedural::checker(s, 2, Color::rgb(90, 90, 90), Color::rgb(110, 110, 110)),
        procedural::checker(s, 8, Color::rgb(120, 90, 60), Color::rgb(100, 70, 45)),
        procedural::checker(s, 1, Color::rgb(80, 80, 100), Color::rgb(80, 80, 100)),
    ]);
    let sprites = TextureAtlas::from_cells(&[
        procedural::disc(s, Color::rgb(230, 200, 40)),
        procedural::disc(s, Color::rgb(200, 60, 200)),
    ]);
    let sky = procedural::sky(512, 128, Color::rgb(10, 10, 40), Color::rgb(80, 110, 170));

    TextureSet::new()
        .with_walls(walls)
        .with_floor_ceiling(floor_ceiling)
        .with_sprites(sprites)
        .with_sky(Ok(sky))
}
