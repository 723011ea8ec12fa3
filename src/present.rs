//! Scaling of the fixed-size framebuffer onto the window surface.

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Source row/column for every destination pixel, letterboxed to keep the
/// source aspect ratio. `None` marks the border bars.
pub struct ScaleLut {
    src_x: Vec<Option<usize>>,
    src_y: Vec<Option<usize>>,
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self {
            src_x: Vec::new(),
            src_y: Vec::new(),
        }
    }

    pub fn dst_size(&self) -> (usize, usize) {
        (self.src_x.len(), self.src_y.len())
    }
}

/// Maps `src_len` source pixels onto `span` destination pixels starting at
/// `start`, inside a destination of `dst_len` pixels.
fn axis_lut(dst_len: usize, start: usize, span: usize, src_len: usize) -> Vec<Option<usize>> {
    (0..dst_len)
        .map(|d| {
            let rel = d.checked_sub(start).filter(|&rel| rel < span)?;
            Some((rel * src_len / span).min(src_len - 1))
        })
        .collect()
}

pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    if dst_w == 0 || dst_h == 0 || src_w == 0 || src_h == 0 {
        return ScaleLut::empty();
    }

    // Largest scale that fits both axes
    let scale = (dst_w as f32 / src_w as f32).min(dst_h as f32 / src_h as f32);
    let span_w = ((src_w as f32 * scale) as usize).clamp(1, dst_w);
    let span_h = ((src_h as f32 * scale) as usize).clamp(1, dst_h);
    let start_x = (dst_w - span_w) / 2;
    let start_y = (dst_h - span_h) / 2;

    ScaleLut {
        src_x: axis_lut(dst_w, start_x, span_w, src_w),
        src_y: axis_lut(dst_h, start_y, span_h, src_h),
    }
}

/// Parallel nearest-neighbour blit. Rows are processed in parallel; bars are
/// filled with `border`.
pub fn blit_nearest(dst: &mut [u32], src: &[u32], src_w: usize, lut: &ScaleLut, border: u32) {
    let dw = lut.src_x.len();
    if dw == 0 {
        return;
    }
    dst.par_chunks_mut(dw).enumerate().for_each(|(y, dst_row)| {
        let Some(Some(sy)) = lut.src_y.get(y) else {
            dst_row.fill(border);
            return;
        };
        let src_row = &src[sy * src_w..(sy + 1) * src_w];
        for (dst_px, sx) in dst_row.iter_mut().zip(&lut.src_x) {
            *dst_px = match sx {
                Some(sx) => src_row[*sx],
                None => border,
            };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_window_gets_side_bars() {
        let lut = build_scale_lut(8, 2, 2, 2);
        assert_eq!(lut.dst_size(), (8, 2));
        let src = [1, 2, 3, 4];
        let mut dst = [0; 16];
        blit_nearest(&mut dst, &src, 2, &lut, 9);
        assert_eq!(dst, [9, 9, 9, 1, 2, 9, 9, 9, 9, 9, 9, 3, 4, 9, 9, 9]);
    }

    #[test]
    fn exact_double() {
        let lut = build_scale_lut(4, 2, 2, 1);
        let src = [5, 6];
        let mut dst = [0; 8];
        blit_nearest(&mut dst, &src, 2, &lut, 0);
        assert_eq!(dst, [5, 5, 6, 6, 5, 5, 6, 6]);
    }

    #[test]
    fn empty_lut_is_noop() {
        let lut = build_scale_lut(0, 10, 4, 4);
        let mut dst = [7; 4];
        blit_nearest(&mut dst, &[1; 16], 4, &lut, 0);
        assert_eq!(dst, [7; 4]);
    }
}
