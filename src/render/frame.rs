use crate::foundation::core::FrameIndex;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::foundation::math::unpremultiply_rgba8;

/// A rendered frame as RGBA8 pixels.
///
/// Frames produced by the renderer are **premultiplied alpha**. The `premultiplied` flag makes
/// this explicit at API boundaries so encoders know whether to unpremultiply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Wrap premultiplied pixels, checking that the buffer matches the dimensions.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> KinetypeResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(KinetypeError::render(format!(
                "frame buffer is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// RGBA bytes of pixel `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Return `true` if any pixel has non-zero alpha.
    pub fn has_coverage(&self) -> bool {
        self.data.chunks_exact(4).any(|px| px[3] != 0)
    }

    /// Straight-alpha copy of the pixel data, as GIF/APNG/PNG expect.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = vec![0u8; self.data.len()];
        unpremultiply_rgba8(&mut out, &self.data);
        out
    }

    /// Straight-alpha [`image::RgbaImage`] view of this frame.
    pub fn to_rgba_image(&self) -> KinetypeResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba())
            .ok_or_else(|| KinetypeError::render("frame buffer does not match its dimensions"))
    }
}

/// A request to render one frame at a given animation time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRequest {
    /// Presentation time in seconds since the animation started.
    pub timestamp: f64,
    /// 0-based position in the output sequence.
    pub sequence: FrameIndex,
}

impl FrameRequest {
    /// Request for frame `sequence` of a fixed-rate timeline.
    pub fn for_sequence(sequence: FrameIndex, fps: crate::foundation::core::Fps) -> Self {
        Self {
            timestamp: fps.frames_to_secs(sequence.0),
            sequence,
        }
    }
}

/// One rendered frame tagged with its position and presentation time.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFrame {
    /// 0-based position in the output sequence.
    pub sequence: FrameIndex,
    /// Presentation time in seconds.
    pub presentation_time: f64,
    /// The pixels.
    pub bitmap: FrameRGBA,
}
