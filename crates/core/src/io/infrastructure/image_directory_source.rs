use std::path::{Path, PathBuf};

use crate::io::domain::frame_source::{FrameSource, SourceError};
use crate::io::infrastructure::image_file_source::decode_frame_file;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::{PixelFormat, RawFrame};

/// Adapts a directory of frame images to the [`FrameSource`] interface,
/// standing in for a live camera: each acquisition yields the next file in
/// lexicographic order.
///
/// When the files run out the source reports `FrameUnavailable`, or starts
/// over if `looping` was requested.
pub struct ImageDirectorySource {
    files: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageDirectorySource {
    pub fn new(dir: &Path, looping: bool) -> Result<Self, std::io::Error> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_image(path))
            .collect();
        files.sort();

        Ok(Self {
            files,
            next: 0,
            looping,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirectorySource {
    fn acquire_frame(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, SourceError> {
        if self.files.is_empty() {
            return Err(SourceError::FrameUnavailable);
        }
        if self.next >= self.files.len() {
            if !self.looping {
                return Err(SourceError::FrameUnavailable);
            }
            self.next = 0;
        }

        let path = self.files[self.next].clone();
        self.next += 1;
        decode_frame_file(&path, format, width, height)
    }
}
