/// Interleaved 4-bytes-per-pixel formats with a known channel order.
///
/// The pipeline only ever works with 32-bit formats; the variants differ in
/// where red and blue sit within each pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// R, G, B, A byte order.
    Rgba8,
    /// B, G, R, A byte order.
    Bgra8,
}

impl PixelFormat {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Byte offsets of (R, G, B) within one pixel.
    pub fn rgb_offsets(&self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Rgba8 => (0, 1, 2),
            PixelFormat::Bgra8 => (2, 1, 0),
        }
    }
}

/// A single captured frame: contiguous interleaved bytes in row-major order.
///
/// Immutable snapshot owned by exactly one analysis cycle. Format conversion
/// happens at io boundaries only; the domain layer treats pixel data as
/// opaque bytes at declared offsets.
#[derive(Clone, Debug)]
pub struct RawFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * PixelFormat::BYTES_PER_PIXEL,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
            format,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A finished composite: premultiplied-alpha BGRA8 bytes in row-major order.
///
/// Color channels are already scaled by the alpha value, so consumers must
/// not re-multiply alpha. Produced fresh each cycle; ownership transfers to
/// the presenter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl CompositeImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * PixelFormat::BYTES_PER_PIXEL,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
