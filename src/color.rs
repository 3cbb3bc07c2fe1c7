//! Color-space conversions used by the pipeline stages.
//!
//! Luma/chroma work (local contrast, denoising) runs in full-range BT.601
//! YCbCr so brightness-only adjustments do not shift hue. The saturation
//! stage runs in HSV so color intensity can be scaled without touching hue
//! or value.

use crate::{
    error::RelumeResult,
    frame::FrameBgr,
};

// Full-range BT.601 luma coefficients.
const KR: f32 = 0.299;
const KB: f32 = 0.114;

fn kg() -> f32 {
    1.0 - KR - KB
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Convert one BGR sample to full-range YCbCr (128 = neutral chroma).
#[inline]
pub fn bgr8_to_ycbcr8(bgr: [u8; 3]) -> [u8; 3] {
    let b = bgr[0] as f32;
    let g = bgr[1] as f32;
    let r = bgr[2] as f32;

    let y = KR * r + kg() * g + KB * b;
    let cb = (b - y) / (2.0 * (1.0 - KB)) + 128.0;
    let cr = (r - y) / (2.0 * (1.0 - KR)) + 128.0;

    [to_u8(y), to_u8(cb), to_u8(cr)]
}

/// Convert one full-range YCbCr sample back to BGR.
#[inline]
pub fn ycbcr8_to_bgr8(ycbcr: [u8; 3]) -> [u8; 3] {
    let y = ycbcr[0] as f32;
    let cb = ycbcr[1] as f32 - 128.0;
    let cr = ycbcr[2] as f32 - 128.0;

    let r = y + cr * 2.0 * (1.0 - KR);
    let b = y + cb * 2.0 * (1.0 - KB);
    let g = (y - KR * r - KB * b) / kg();

    [to_u8(b), to_u8(g), to_u8(r)]
}

/// Split a frame into separate Y, Cb, Cr planes.
pub fn split_ycbcr(frame: &FrameBgr) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let px = frame.pixel_count() as usize;
    let mut y = Vec::with_capacity(px);
    let mut cb = Vec::with_capacity(px);
    let mut cr = Vec::with_capacity(px);
    for p in frame.data().chunks_exact(3) {
        let [yy, cbb, crr] = bgr8_to_ycbcr8([p[0], p[1], p[2]]);
        y.push(yy);
        cb.push(cbb);
        cr.push(crr);
    }
    (y, cb, cr)
}

/// Recombine Y, Cb, Cr planes into a BGR frame. Plane lengths must equal
/// `width * height`.
pub fn merge_ycbcr(
    width: u32,
    height: u32,
    y: &[u8],
    cb: &[u8],
    cr: &[u8],
) -> RelumeResult<FrameBgr> {
    let px = (width as usize) * (height as usize);
    if y.len() != px || cb.len() != px || cr.len() != px {
        return Err(crate::RelumeError::unsupported_frame(
            "ycbcr plane length does not match width*height",
        ));
    }
    let mut data = Vec::with_capacity(px * 3);
    for i in 0..px {
        data.extend_from_slice(&ycbcr8_to_bgr8([y[i], cb[i], cr[i]]));
    }
    FrameBgr::from_raw(width, height, data)
}

/// Convert one BGR sample to HSV: hue in degrees `[0, 360)`, saturation and
/// value in `[0, 1]`.
#[inline]
pub fn bgr8_to_hsv(bgr: [u8; 3]) -> (f32, f32, f32) {
    let b = bgr[0] as f32 / 255.0;
    let g = bgr[1] as f32 / 255.0;
    let r = bgr[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}

/// Convert an HSV sample back to BGR.
#[inline]
pub fn hsv_to_bgr8(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let hp = (h / 60.0).rem_euclid(6.0);
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        to_u8((b1 + m) * 255.0),
        to_u8((g1 + m) * 255.0),
        to_u8((r1 + m) * 255.0),
    ]
}

/// Saturation stage: scale the saturation channel by `factor`, clamping the
/// result into the channel range; hue and value pass through untouched.
pub fn boost_saturation(mut frame: FrameBgr, factor: f32) -> FrameBgr {
    for px in frame.data_mut().chunks_exact_mut(3) {
        let (h, s, v) = bgr8_to_hsv([px[0], px[1], px[2]]);
        let boosted = (s * factor).clamp(0.0, 1.0);
        let out = hsv_to_bgr8(h, boosted, v);
        px.copy_from_slice(&out);
    }
    frame
}
