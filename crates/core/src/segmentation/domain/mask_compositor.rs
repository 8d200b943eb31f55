use thiserror::Error;

use crate::segmentation::domain::inference_engine::OutputMask;
use crate::shared::frame::{CompositeImage, PixelFormat, RawFrame};

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("frame has {frame_pixels} pixels but mask has {mask_pixels}")]
    MaskSizeMismatch {
        frame_pixels: usize,
        mask_pixels: usize,
    },
    #[error("frame buffer is {len} bytes, expected {expected} for {width}x{height}x4")]
    InvalidFrameShape {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },
}

/// Blends a soft mask over the original frame into a premultiplied-alpha
/// BGRA composite.
///
/// Per pixel: `alpha = clamp(mask, 0, 1)`. Pixels strictly above the cutoff
/// get their color bytes scaled by alpha; pixels at or below it become fully
/// transparent black. Pure: no state beyond the cutoff parameter.
pub struct MaskCompositor {
    cutoff: f32,
}

impl MaskCompositor {
    pub fn new(cutoff: f32) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn composite(
        &self,
        frame: &RawFrame,
        mask: &OutputMask,
    ) -> Result<CompositeImage, CompositeError> {
        let pixels = frame.pixel_count();
        let expected = pixels * PixelFormat::BYTES_PER_PIXEL;
        if frame.data().len() != expected {
            return Err(CompositeError::InvalidFrameShape {
                width: frame.width(),
                height: frame.height(),
                len: frame.data().len(),
                expected,
            });
        }
        if mask.pixel_count() != pixels {
            return Err(CompositeError::MaskSizeMismatch {
                frame_pixels: pixels,
                mask_pixels: mask.pixel_count(),
            });
        }

        let (r_off, g_off, b_off) = frame.format().rgb_offsets();
        let src = frame.data();
        let mut out = Vec::with_capacity(expected);

        for (i, &confidence) in mask.data().iter().enumerate() {
            let alpha = confidence.clamp(0.0, 1.0);
            if alpha > self.cutoff {
                let px = i * PixelFormat::BYTES_PER_PIXEL;
                out.push(scale(src[px + b_off], alpha));
                out.push(scale(src[px + g_off], alpha));
                out.push(scale(src[px + r_off], alpha));
                out.push((alpha * 255.0).round() as u8);
            } else {
                out.extend_from_slice(&[0, 0, 0, 0]);
            }
        }

        Ok(CompositeImage::new(out, frame.width(), frame.height()))
    }
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self::new(crate::shared::constants::DEFAULT_MASK_CUTOFF)
    }
}

fn scale(channel: u8, alpha: f32) -> u8 {
    (channel as f32 * alpha).round() as u8
}
