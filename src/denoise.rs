//! Non-local-means denoising over luma/chroma planes.
//!
//! Each output sample is a weighted average of samples inside a bounded
//! search window, where the weight of a candidate falls off with the mean
//! squared difference between the 7x7 patch around the candidate and the
//! patch around the sample being filtered. The luma plane is filtered at
//! full strength, the chroma planes at half strength.
//!
//! A strength of zero degenerates to exact-match averaging: only candidates
//! with a byte-identical patch contribute, so the plane is returned
//! unchanged sample for sample.

use rayon::prelude::*;

use crate::{
    color::{merge_ycbcr, split_ycbcr},
    error::RelumeResult,
    frame::FrameBgr,
};

/// Filter one plane with non-local means. `template_radius` and
/// `search_radius` are half-window sizes (radius 3 = 7x7 patch, radius 10 =
/// 21x21 search window).
pub fn nlm_plane(
    plane: &[u8],
    width: u32,
    height: u32,
    strength: f32,
    template_radius: usize,
    search_radius: usize,
) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(plane.len(), w * h);

    let tr = template_radius as isize;
    let sr = search_radius as isize;
    let patch_len = ((2 * tr + 1) * (2 * tr + 1)) as f32;
    let h2 = strength * strength;

    let mut out = vec![0u8; plane.len()];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let y = y as isize;
        for (x, slot) in row.iter_mut().enumerate() {
            let x = x as isize;
            let mut acc = 0.0f32;
            let mut weight_sum = 0.0f32;

            for sy in (y - sr)..=(y + sr) {
                for sx in (x - sr)..=(x + sr) {
                    let d2 = patch_distance_sq(plane, w, h, x, y, sx, sy, tr) / patch_len;
                    let weight = if h2 > 0.0 {
                        (-d2 / h2).exp()
                    } else if d2 == 0.0 {
                        1.0
                    } else {
                        0.0
                    };
                    acc += weight * sample_clamped(plane, w, h, sx, sy) as f32;
                    weight_sum += weight;
                }
            }

            // The center candidate always matches itself, so weight_sum >= 1.
            *slot = (acc / weight_sum).round().clamp(0.0, 255.0) as u8;
        }
    });
    out
}

/// Sum of squared differences between the patches centered at (ax, ay) and
/// (bx, by), with border replication.
fn patch_distance_sq(
    plane: &[u8],
    w: usize,
    h: usize,
    ax: isize,
    ay: isize,
    bx: isize,
    by: isize,
    tr: isize,
) -> f32 {
    let mut sum = 0.0f32;
    for dy in -tr..=tr {
        for dx in -tr..=tr {
            let a = sample_clamped(plane, w, h, ax + dx, ay + dy) as f32;
            let b = sample_clamped(plane, w, h, bx + dx, by + dy) as f32;
            let d = a - b;
            sum += d * d;
        }
    }
    sum
}

#[inline]
fn sample_clamped(plane: &[u8], w: usize, h: usize, x: isize, y: isize) -> u8 {
    let x = x.clamp(0, w as isize - 1) as usize;
    let y = y.clamp(0, h as isize - 1) as usize;
    plane[y * w + x]
}

/// Noise-reduction stage: split into luma/chroma, filter the luma plane at
/// `strength` and each chroma plane at `strength / 2`, recombine.
pub fn denoise_frame(
    frame: FrameBgr,
    strength: f32,
    template_radius: usize,
    search_radius: usize,
) -> RelumeResult<FrameBgr> {
    let (width, height) = (frame.width(), frame.height());
    let (y, cb, cr) = split_ycbcr(&frame);

    let y = nlm_plane(&y, width, height, strength, template_radius, search_radius);
    let chroma_strength = strength / 2.0;
    let cb = nlm_plane(
        &cb,
        width,
        height,
        chroma_strength,
        template_radius,
        search_radius,
    );
    let cr = nlm_plane(
        &cr,
        width,
        height,
        chroma_strength,
        template_radius,
        search_radius,
    );

    merge_ycbcr(width, height, &y, &cb, &cr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_strength_is_identity() {
        let plane: Vec<u8> = (0..16u32 * 16).map(|i| (i % 251) as u8).collect();
        let out = nlm_plane(&plane, 16, 16, 0.0, 3, 10);
        assert_eq!(out, plane);
    }

    #[test]
    fn constant_plane_is_preserved_at_any_strength() {
        let plane = vec![42u8; 12 * 9];
        for strength in [0.0f32, 5.0, 20.0] {
            let out = nlm_plane(&plane, 12, 9, strength, 3, 10);
            assert_eq!(out, plane, "strength {strength} altered a flat plane");
        }
    }

    #[test]
    fn filtering_is_deterministic() {
        let plane: Vec<u8> = (0..12u32 * 12)
            .map(|i| (100 + (i * 13 % 17)) as u8)
            .collect();
        let a = nlm_plane(&plane, 12, 12, 8.0, 3, 10);
        let b = nlm_plane(&plane, 12, 12, 8.0, 3, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn strong_filtering_reduces_local_variation() {
        // Alternating small ripple around a flat level.
        let plane: Vec<u8> = (0..16u32 * 16)
            .map(|i| if (i + i / 16) % 2 == 0 { 98 } else { 102 })
            .collect();
        let out = nlm_plane(&plane, 16, 16, 20.0, 3, 10);

        let spread = |p: &[u8]| {
            let mean = p.iter().map(|&v| v as f32).sum::<f32>() / p.len() as f32;
            p.iter()
                .map(|&v| (v as f32 - mean).abs())
                .sum::<f32>()
                / p.len() as f32
        };
        assert!(spread(&out) < spread(&plane));
    }

    #[test]
    fn frame_denoise_preserves_dimensions() {
        let frame = FrameBgr::filled(10, 7, [30, 40, 50]).unwrap();
        let out = denoise_frame(frame, 15.0, 3, 10).unwrap();
        assert_eq!(out.width(), 10);
        assert_eq!(out.height(), 7);
    }
}
