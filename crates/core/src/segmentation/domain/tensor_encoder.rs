use ndarray::Array4;
use thiserror::Error;

use crate::shared::frame::{PixelFormat, RawFrame};

/// Model input: `[1, 3, H, W]` float32, planar, channel-major.
pub type InputTensor = Array4<f32>;

/// Per-channel normalization: `(value/255 - mean) / scale`.
///
/// The constants are the segmentation model's training statistics, keyed by
/// the B, R, G plane order it expects.
const B_MEAN: f32 = 0.406;
const B_SCALE: f32 = 0.225;
const R_MEAN: f32 = 0.485;
const R_SCALE: f32 = 0.229;
const G_MEAN: f32 = 0.456;
const G_SCALE: f32 = 0.224;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("frame is {actual_width}x{actual_height} with {len} bytes, expected {width}x{height}x4")]
    InvalidFrameShape {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
        len: usize,
    },
}

/// Deterministic transform from a [`RawFrame`] to a normalized planar tensor.
///
/// The source is consumed as interleaved 4-byte pixels at the offsets the
/// frame's [`PixelFormat`] declares; the output is plane-major in B, R, G
/// order, matching the `[1, 3, H, W]` channel-major layout the model binds.
/// Pure: re-encoding the same frame yields bit-identical tensors.
pub struct TensorEncoder {
    width: u32,
    height: u32,
}

impl TensorEncoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn encode(&self, frame: &RawFrame) -> Result<InputTensor, EncodeError> {
        let w = self.width as usize;
        let h = self.height as usize;
        let expected_len = w * h * PixelFormat::BYTES_PER_PIXEL;

        if frame.width() != self.width
            || frame.height() != self.height
            || frame.data().len() != expected_len
        {
            return Err(EncodeError::InvalidFrameShape {
                width: self.width,
                height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
                len: frame.data().len(),
            });
        }

        let (r_off, g_off, b_off) = frame.format().rgb_offsets();
        let data = frame.data();
        let mut tensor = Array4::<f32>::zeros((1, 3, h, w));

        for y in 0..h {
            for x in 0..w {
                let px = (y * w + x) * PixelFormat::BYTES_PER_PIXEL;
                tensor[[0, 0, y, x]] = normalize(data[px + b_off], B_MEAN, B_SCALE);
                tensor[[0, 1, y, x]] = normalize(data[px + r_off], R_MEAN, R_SCALE);
                tensor[[0, 2, y, x]] = normalize(data[px + g_off], G_MEAN, G_SCALE);
            }
        }

        Ok(tensor)
    }
}

fn normalize(value: u8, mean: f32, scale: f32) -> f32 {
    (value as f32 / 255.0 - mean) / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid_frame(w: u32, h: u32, rgba: [u8; 4]) -> RawFrame {
        let data: Vec<u8> = rgba
            .iter()
            .copied()
            .cycle()
            .take((w * h * 4) as usize)
            .collect();
        RawFrame::new(data, w, h, PixelFormat::Rgba8)
    }

    #[test]
    fn test_output_length_is_three_planes() {
        let encoder = TensorEncoder::new(4, 2);
        let tensor = encoder.encode(&solid_frame(4, 2, [0, 0, 0, 255])).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor.len(), 3 * 4 * 2);
    }

    #[test]
    fn test_all_red_frame_produces_exact_constants() {
        let encoder = TensorEncoder::new(2, 2);
        let tensor = encoder.encode(&solid_frame(2, 2, [255, 0, 0, 255])).unwrap();

        // Plane 0 is B, plane 1 is R, plane 2 is G.
        let b = (0.0 / 255.0 - 0.406) / 0.225;
        let r = (1.0 - 0.485) / 0.229;
        let g = (0.0 / 255.0 - 0.456) / 0.224;

        for y in 0..2 {
            for x in 0..2 {
                assert_relative_eq!(tensor[[0, 0, y, x]], b);
                assert_relative_eq!(tensor[[0, 1, y, x]], r);
                assert_relative_eq!(tensor[[0, 2, y, x]], g);
            }
        }
    }

    #[test]
    fn test_plane_order_is_b_r_g() {
        // One pixel with distinct channel values: R=10, G=20, B=30.
        let frame = RawFrame::new(vec![10, 20, 30, 255], 1, 1, PixelFormat::Rgba8);
        let tensor = TensorEncoder::new(1, 1).encode(&frame).unwrap();

        assert_relative_eq!(tensor[[0, 0, 0, 0]], (30.0 / 255.0 - 0.406) / 0.225);
        assert_relative_eq!(tensor[[0, 1, 0, 0]], (10.0 / 255.0 - 0.485) / 0.229);
        assert_relative_eq!(tensor[[0, 2, 0, 0]], (20.0 / 255.0 - 0.456) / 0.224);
    }

    #[test]
    fn test_bgra_source_reads_channels_at_declared_offsets() {
        // Same logical pixel as above, stored as BGRA bytes.
        let rgba_frame = RawFrame::new(vec![10, 20, 30, 255], 1, 1, PixelFormat::Rgba8);
        let bgra_frame = RawFrame::new(vec![30, 20, 10, 255], 1, 1, PixelFormat::Bgra8);
        let encoder = TensorEncoder::new(1, 1);

        assert_eq!(
            encoder.encode(&rgba_frame).unwrap(),
            encoder.encode(&bgra_frame).unwrap()
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = TensorEncoder::new(3, 3);
        let data: Vec<u8> = (0..3 * 3 * 4).map(|i| (i * 7 % 256) as u8).collect();
        let frame = RawFrame::new(data, 3, 3, PixelFormat::Rgba8);

        let a = encoder.encode(&frame).unwrap();
        let b = encoder.encode(&frame).unwrap();
        // Bit-identical, not merely close.
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let encoder = TensorEncoder::new(4, 4);
        let err = encoder.encode(&solid_frame(2, 2, [0, 0, 0, 0])).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidFrameShape { .. }));
    }

    #[test]
    fn test_plane_is_row_major_over_the_image() {
        // 2x1 image: left pixel red, right pixel blue.
        let data = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let frame = RawFrame::new(data, 2, 1, PixelFormat::Rgba8);
        let tensor = TensorEncoder::new(2, 1).encode(&frame).unwrap();

        // B plane: left pixel has B=0, right pixel has B=255.
        assert_relative_eq!(tensor[[0, 0, 0, 0]], (0.0 - 0.406) / 0.225);
        assert_relative_eq!(tensor[[0, 0, 0, 1]], (1.0 - 0.406) / 0.225);
    }
}
