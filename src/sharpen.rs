//! Sharpening stage: 3x3 convolution with a kernel interpolated between
//! identity and a fixed Laplacian-style sharpening kernel.

use crate::{error::RelumeResult, frame::FrameBgr};

/// Kernel type for the 3x3 convolution.
pub type Kernel3 = [[f32; 3]; 3];

/// The identity kernel (center weight 1).
pub const IDENTITY_KERNEL: Kernel3 = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];

/// Interpolate the applied kernel: `base * factor + identity * (1 - factor)`.
///
/// Factor 0 yields the identity kernel exactly, factor 1 yields `base`
/// exactly, and factors above 1 extrapolate past it.
pub fn interpolate_kernel(base: &Kernel3, factor: f32) -> Kernel3 {
    let mut out = [[0.0f32; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = base[r][c] * factor + IDENTITY_KERNEL[r][c] * (1.0 - factor);
        }
    }
    out
}

/// Convolve every channel independently with `kernel`, replicating border
/// samples.
pub fn convolve3x3(frame: &FrameBgr, kernel: &Kernel3) -> RelumeResult<FrameBgr> {
    let w = frame.width() as isize;
    let h = frame.height() as isize;
    let src = frame.data();
    let mut out = vec![0u8; src.len()];

    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for ky in 0..3isize {
                for kx in 0..3isize {
                    let sy = (y + ky - 1).clamp(0, h - 1);
                    let sx = (x + kx - 1).clamp(0, w - 1);
                    let idx = ((sy * w + sx) * 3) as usize;
                    let kw = kernel[ky as usize][kx as usize];
                    for c in 0..3 {
                        acc[c] += kw * src[idx + c] as f32;
                    }
                }
            }
            let idx = ((y * w + x) * 3) as usize;
            for c in 0..3 {
                out[idx + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    FrameBgr::from_raw(frame.width(), frame.height(), out)
}

/// Sharpening stage entry point.
pub fn sharpen(frame: &FrameBgr, base: &Kernel3, factor: f32) -> RelumeResult<FrameBgr> {
    convolve3x3(frame, &interpolate_kernel(base, factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Kernel3 = [[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]];

    fn gradient_frame(w: u32, h: u32) -> FrameBgr {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = (x * 17 + y * 31) as u8;
                data.extend_from_slice(&[v, v.wrapping_add(10), v.wrapping_add(20)]);
            }
        }
        FrameBgr::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn factor_zero_is_exact_identity() {
        let frame = gradient_frame(9, 7);
        let out = sharpen(&frame, &BASE, 0.0).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn factor_one_applies_base_kernel_exactly() {
        assert_eq!(interpolate_kernel(&BASE, 1.0), BASE);

        // 3x3 frame with a bright center: the Laplacian-style kernel must
        // amplify the center against its neighbors.
        let mut data = vec![100u8; 27];
        for c in 0..3 {
            data[(1 * 3 + 1) * 3 + c] = 120;
        }
        let frame = FrameBgr::from_raw(3, 3, data).unwrap();
        let out = sharpen(&frame, &BASE, 1.0).unwrap();
        // center: 5*120 - 4*100 = 200
        assert_eq!(out.pixel(1, 1), [200, 200, 200]);
        // edge neighbor (replicated border): 5*100 - (100 + 100 + 100 + 120) = 80
        assert_eq!(out.pixel(1, 0), [80, 80, 80]);
    }

    #[test]
    fn interpolation_blends_halfway() {
        let k = interpolate_kernel(&BASE, 0.5);
        assert_eq!(k[1][1], 3.0);
        assert_eq!(k[0][1], -0.5);
        assert_eq!(k[0][0], 0.0);
    }

    #[test]
    fn extrapolation_past_one_oversharpens() {
        let k = interpolate_kernel(&BASE, 3.0);
        assert_eq!(k[1][1], 13.0);
        assert_eq!(k[0][1], -3.0);
    }

    #[test]
    fn constant_frame_is_unchanged_for_any_factor() {
        let frame = FrameBgr::filled(5, 4, [60, 61, 62]).unwrap();
        for factor in [0.0f32, 1.0, 2.5] {
            let out = sharpen(&frame, &BASE, factor).unwrap();
            assert_eq!(out, frame, "factor {factor} altered a flat frame");
        }
    }
}
