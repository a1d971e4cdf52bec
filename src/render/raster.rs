//! Pixel-level helpers on premultiplied RGBA8 buffers.

use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8};
use crate::scene::color::Color;

/// Rainbow gradient stops, left to right.
pub(crate) const RAINBOW_STOPS: [Color; 6] = [
    Color::rgb(0xFF, 0x3B, 0x30),
    Color::rgb(0xFF, 0x95, 0x00),
    Color::rgb(0xFF, 0xCC, 0x00),
    Color::rgb(0x34, 0xC7, 0x59),
    Color::rgb(0x00, 0x7A, 0xFF),
    Color::rgb(0xAF, 0x52, 0xDE),
];

/// Fill `dst` with one premultiplied color.
pub(crate) fn fill_rgba8(dst: &mut [u8], premul: [u8; 4]) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&premul);
    }
}

/// Normalized gaussian weights in Q16 fixed point, `2 * radius + 1` taps summing to `1 << 16`.
pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> KinetypeResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(KinetypeError::render("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Push the rounding remainder into the center tap.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

/// Separable gaussian blur with edge clamping. `tmp` must be as large as `src`.
pub(crate) fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    tmp: &mut [u8],
    width: u32,
    height: u32,
    kernel_q16: &[u32],
) {
    if kernel_q16.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    blur_pass(src, tmp, width, height, kernel_q16, Axis::X);
    blur_pass(tmp, dst, width, height, kernel_q16, Axis::Y);
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = q16_to_u8(*a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

/// Source-over composite of `src` onto `dst`, with `src` scaled by `opacity`.
pub(crate) fn premul_over_in_place_opacity(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
) -> KinetypeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(KinetypeError::render(
            "premul_over_in_place_opacity expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
    Ok(())
}

/// Color of the rainbow gradient at `t` in `[0, 1]`.
pub(crate) fn rainbow_at(t: f64) -> Color {
    let segments = (RAINBOW_STOPS.len() - 1) as f64;
    let pos = t.clamp(0.0, 1.0) * segments;
    let i = (pos.floor() as usize).min(RAINBOW_STOPS.len() - 2);
    RAINBOW_STOPS[i].lerp(RAINBOW_STOPS[i + 1], pos - i as f64)
}

/// Replace the color of a coverage layer with a horizontal rainbow spanning `x0..x1`, rotated by
/// `hue_shift_deg`. Alpha (coverage) is preserved.
pub(crate) fn colorize_rainbow(
    layer: &mut [u8],
    width: u32,
    x0: f64,
    x1: f64,
    hue_shift_deg: f64,
) {
    let w = width as usize;
    if w == 0 {
        return;
    }
    let span = (x1 - x0).max(1.0);
    // One gradient lookup per column.
    let column: Vec<[u8; 3]> = (0..w)
        .map(|x| {
            let t = ((x as f64 + 0.5) - x0) / span;
            let c = rainbow_at(t).hue_rotated(hue_shift_deg);
            [c.r, c.g, c.b]
        })
        .collect();

    for (i, px) in layer.chunks_exact_mut(4).enumerate() {
        let a = u16::from(px[3]);
        if a == 0 {
            continue;
        }
        let rgb = column[i % w];
        for c in 0..3 {
            px[c] = mul_div255_u8(u16::from(rgb[c]), a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
