use crate::foundation::core::FrameIndex;
use crate::render::frame::{FrameRGBA, RenderedFrame};
use std::path::PathBuf;

pub(crate) fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "kinetype_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Frame filled with one premultiplied color.
pub(crate) fn solid_frame(seq: u64, w: u32, h: u32, premul: [u8; 4]) -> RenderedFrame {
    let data = premul.repeat((w * h) as usize);
    RenderedFrame {
        sequence: FrameIndex(seq),
        presentation_time: seq as f64 * 0.1,
        bitmap: FrameRGBA::from_premul(w, h, data).unwrap(),
    }
}

/// DejaVu Sans, which ligates "ffi" and composes combining accents.
pub(crate) fn fixture_font() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf")
}
