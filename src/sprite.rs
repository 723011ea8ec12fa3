use crate::camera::CameraBasis;

/// Largest projected sprite, in multiples of the screen height.
const MAX_SIZE_SCREENS: f32 = 4.0;

/// A billboard placed on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub pos: [f32; 2],
    /// Cell in the sprite atlas, counted from 0.
    pub texture: usize,
}

impl Sprite {
    pub fn new(pos: [f32; 2], texture: usize) -> Self {
        Self { pos, texture }
    }

    #[inline]
    pub fn distance_sq(&self, from: [f32; 2]) -> f32 {
        let dx = from[0] - self.pos[0];
        let dy = from[1] - self.pos[1];
        dx * dx + dy * dy
    }
}

/// Orders sprites farthest first so nearer ones paint over them.
pub fn sort_far_to_near(sprites: &mut [Sprite], from: [f32; 2]) {
    sprites.sort_by(|a, b| b.distance_sq(from).total_cmp(&a.distance_sq(from)));
}

/// Screen placement of a sprite in front of the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteProjection {
    pub depth: f32,
    pub screen_x: i32,
    pub size: i32,
    /// First covered column, may be off screen.
    pub draw_start: i32,
    /// One past the last covered column, may be off screen.
    pub draw_end: i32,
}

/// Projects `sprite` onto a `screen_width` x `screen_height` screen.
/// Returns `None` when the sprite is at or behind the camera.
pub fn project(
    basis: &CameraBasis,
    sprite: &Sprite,
    screen_width: usize,
    screen_height: usize,
) -> Option<SpriteProjection> {
    let [tx, ty] = basis.world_to_camera(sprite.pos);
    if ty <= 0.0 || !ty.is_finite() {
        return None;
    }

    // A sprite almost on the camera plane projects to a huge size; clamp
    // before converting so the column range stays in i32.
    let max_size = MAX_SIZE_SCREENS * screen_height as f32;
    let size = (screen_height as f32 / ty).abs().min(max_size);
    let reach = screen_width as f32 + max_size;
    let screen_x = basis
        .project_x(tx, ty, screen_width as f32)
        .clamp(-reach, reach) as i32;
    let size = size as i32;
    Some(SpriteProjection {
        depth: ty,
        screen_x,
        size,
        draw_start: screen_x - size / 2,
        draw_end: screen_x + size / 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    #[test]
    fn sorts_descending_by_distance() {
        let mut sprites = vec![
            Sprite::new([1.0, 0.0], 0),
            Sprite::new([5.0, 0.0], 1),
            Sprite::new([3.0, 0.0], 2),
        ];
        sort_far_to_near(&mut sprites, [0.0, 0.0]);
        let order: Vec<_> = sprites.iter().map(|s| s.texture).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn behind_camera_is_culled() {
        let basis = Camera::new([5.0, 5.0], 0.0).basis(0.66);
        assert!(project(&basis, &Sprite::new([3.0, 5.0], 0), 320, 200).is_none());
        assert!(project(&basis, &Sprite::new([5.0, 5.0], 0), 320, 200).is_none());
    }

    #[test]
    fn centered_sprite_projection() {
        let basis = Camera::new([0.0, 0.0], 0.0).basis(0.66);
        let p = project(&basis, &Sprite::new([4.0, 0.0], 0), 320, 200).unwrap();
        assert!((p.depth - 4.0).abs() < 1e-5);
        assert_eq!(p.screen_x, 160);
        assert_eq!(p.size, 50);
        assert_eq!(p.draw_start, 135);
        assert_eq!(p.draw_end, 185);
    }

    #[test]
    fn sprite_touching_camera_plane_is_clamped() {
        let basis = Camera::new([1.0, 1.0], 0.0).basis(0.66);
        let p = project(&basis, &Sprite::new([1.0 + 1.2e-7, 1.5], 0), 320, 200).unwrap();
        assert!(p.depth > 0.0);
        assert_eq!(p.size, 800);
        assert!(p.screen_x.abs() <= 320 + 800);
        assert!(p.draw_start <= p.draw_end);
    }
}
