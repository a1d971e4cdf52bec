use super::*;

#[test]
fn gaussian_kernel_sums_to_one_in_q16() {
    for (r, s) in [(1u32, 0.5f32), (3, 1.5), (13, 6.5)] {
        let k = gaussian_kernel_q16(r, s).unwrap();
        assert_eq!(k.len(), (2 * r + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
        assert_eq!(k.first(), k.last());
    }
    assert_eq!(gaussian_kernel_q16(0, 0.0).unwrap(), vec![65536]);
    assert!(gaussian_kernel_q16(2, f32::NAN).is_err());
}

#[test]
fn blur_spreads_a_single_pixel() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; 100];
    let center = (2 * 5 + 2) * 4;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
    let mut dst = vec![0u8; 100];
    let mut tmp = vec![0u8; 100];
    let k = gaussian_kernel_q16(2, 1.0).unwrap();
    blur_rgba8_premul_q16(&src, &mut dst, &mut tmp, w, h, &k);
    assert!(dst[center + 3] < 255);
    assert!(dst[(2 * 5 + 1) * 4 + 3] > 0);
    assert!(dst[(1 * 5 + 2) * 4 + 3] > 0);
}

#[test]
fn over_with_opacity() {
    let mut dst = vec![0, 0, 255, 255];
    premul_over_in_place_opacity(&mut dst, &[255, 0, 0, 255], 1.0).unwrap();
    assert_eq!(dst, vec![255, 0, 0, 255]);

    let mut dst = vec![0, 0, 255, 255];
    premul_over_in_place_opacity(&mut dst, &[255, 0, 0, 255], 0.0).unwrap();
    assert_eq!(dst, vec![0, 0, 255, 255]);

    let mut dst = vec![0, 0, 0, 0];
    premul_over_in_place_opacity(&mut dst, &[255, 255, 255, 255], 0.5).unwrap();
    assert_eq!(dst[3], 128);

    assert!(premul_over_in_place_opacity(&mut [0u8; 4], &[0u8; 8], 1.0).is_err());
}

#[test]
fn rainbow_endpoints_match_stops() {
    assert_eq!(rainbow_at(0.0), RAINBOW_STOPS[0]);
    assert_eq!(rainbow_at(1.0), RAINBOW_STOPS[5]);
    assert_eq!(rainbow_at(-3.0), RAINBOW_STOPS[0]);
}

#[test]
fn colorize_keeps_coverage() {
    let mut layer = vec![255, 255, 255, 255, 0, 0, 0, 0, 128, 128, 128, 128];
    colorize_rainbow(&mut layer, 3, 0.0, 3.0, 0.0);
    assert_eq!(layer[3], 255);
    assert_eq!(&layer[4..8], &[0, 0, 0, 0]);
    assert_eq!(layer[11], 128);
    assert!(layer[8] <= 128 && layer[9] <= 128 && layer[10] <= 128);
    // Left edge is red-dominant.
    assert!(layer[0] > layer[2]);
}
