use crate::foundation::error::{KinetypeError, KinetypeResult};
use std::path::Path;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Container detected by [`probe_artifact`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// GIF, animated or not.
    Gif,
    /// PNG carrying an `acTL` animation control chunk.
    Apng,
    /// Single-image PNG.
    Png,
}

/// What a finished artifact contains.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArtifactInfo {
    /// Detected container.
    pub kind: ArtifactKind,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of decodable frames.
    pub frame_count: u64,
    /// Loop count, `Some(0)` meaning forever. `None` when the file does not loop.
    pub loop_count: Option<u32>,
    /// File size in bytes.
    pub byte_len: u64,
}

/// Inspect a GIF, APNG or PNG file.
#[tracing::instrument]
pub fn probe_artifact(path: &Path) -> KinetypeResult<ArtifactInfo> {
    let bytes = std::fs::read(path)
        .map_err(|e| KinetypeError::validation(format!("read '{}': {e}", path.display())))?;
    probe_bytes(&bytes)
}

/// Inspect an in-memory GIF, APNG or PNG.
pub fn probe_bytes(bytes: &[u8]) -> KinetypeResult<ArtifactInfo> {
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        probe_gif(bytes)
    } else if bytes.starts_with(&PNG_SIGNATURE) {
        probe_png(bytes)
    } else {
        Err(KinetypeError::unsupported_format(
            "probe supports GIF and PNG/APNG files only",
        ))
    }
}

fn probe_gif(bytes: &[u8]) -> KinetypeResult<ArtifactInfo> {
    let mut opts = ::gif::DecodeOptions::new();
    opts.set_color_output(::gif::ColorOutput::Indexed);
    let mut decoder = opts
        .read_info(bytes)
        .map_err(|e| KinetypeError::validation(format!("decode gif header: {e}")))?;
    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());

    let mut frame_count = 0u64;
    while decoder
        .read_next_frame()
        .map_err(|e| KinetypeError::validation(format!("decode gif frame {frame_count}: {e}")))?
        .is_some()
    {
        frame_count += 1;
    }

    Ok(ArtifactInfo {
        kind: ArtifactKind::Gif,
        width,
        height,
        frame_count,
        loop_count: gif_loop_count(decoder.repeat()),
        byte_len: bytes.len() as u64,
    })
}

/// Loop count parsed from the NETSCAPE2.0 extension. `None` when the GIF plays once.
fn gif_loop_count(repeat: ::gif::Repeat) -> Option<u32> {
    match repeat {
        ::gif::Repeat::Infinite => Some(0),
        ::gif::Repeat::Finite(0) => None,
        ::gif::Repeat::Finite(n) => Some(u32::from(n)),
    }
}

fn probe_png(bytes: &[u8]) -> KinetypeResult<ArtifactInfo> {
    let decoder = ::png::Decoder::new(std::io::Cursor::new(bytes));
    let mut reader = decoder
        .read_info()
        .map_err(|e| KinetypeError::validation(format!("decode png header: {e}")))?;
    let info = reader.info();
    let (width, height) = (info.width, info.height);
    let actl = info.animation_control;

    let Some(actl) = actl else {
        return Ok(ArtifactInfo {
            kind: ArtifactKind::Png,
            width,
            height,
            frame_count: 1,
            loop_count: None,
            byte_len: bytes.len() as u64,
        });
    };

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let mut frame_count = 0u64;
    for _ in 0..actl.num_frames {
        reader
            .next_frame(&mut buf)
            .map_err(|e| KinetypeError::validation(format!("decode apng frame {frame_count}: {e}")))?;
        frame_count += 1;
    }

    Ok(ArtifactInfo {
        kind: ArtifactKind::Apng,
        width,
        height,
        frame_count,
        loop_count: Some(actl.num_plays),
        byte_len: bytes.len() as u64,
    })
}
