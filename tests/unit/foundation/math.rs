use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
    assert_eq!(mul_div255_u16(255, 77), 77);
}

#[test]
fn add_saturates() {
    assert_eq!(add_sat_u8(200, 100), 255);
    assert_eq!(add_sat_u8(1, 2), 3);
}

#[test]
fn unpremultiply_handles_edges() {
    let src = [0u8, 0, 0, 0, 10, 20, 30, 255, 64, 32, 0, 128];
    let mut dst = [9u8; 12];
    unpremultiply_rgba8(&mut dst, &src);
    assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
    assert_eq!(&dst[4..8], &[10, 20, 30, 255]);
    assert_eq!(&dst[8..12], &[128, 64, 0, 128]);
}
