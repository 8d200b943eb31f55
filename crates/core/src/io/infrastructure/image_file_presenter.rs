use std::path::PathBuf;

use crate::io::domain::presenter::Presenter;
use crate::shared::frame::{CompositeImage, PixelFormat};

enum OutputMode {
    /// One fixed path, overwritten on every present.
    Single(PathBuf),
    /// Numbered files under a directory, one per presented composite.
    Sequence { dir: PathBuf, next: u64 },
}

/// Writes composites to disk as RGBA PNGs using the `image` crate.
///
/// The alpha channel is stored as-is: the pixels stay premultiplied, which is
/// what downstream compositing surfaces expect.
pub struct ImageFilePresenter {
    mode: OutputMode,
}

impl ImageFilePresenter {
    /// Presenter for one-shot runs: every composite lands at `path`.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: OutputMode::Single(path.into()),
        }
    }

    /// Presenter for streamed runs: composites become `composite_000001.png`,
    /// `composite_000002.png`, … under `dir`.
    pub fn sequence(dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: OutputMode::Sequence {
                dir: dir.into(),
                next: 1,
            },
        }
    }
}

impl Presenter for ImageFilePresenter {
    fn present(&mut self, image: CompositeImage) -> Result<(), Box<dyn std::error::Error>> {
        let path = match &mut self.mode {
            OutputMode::Single(path) => path.clone(),
            OutputMode::Sequence { dir, next } => {
                let path = dir.join(format!("composite_{next:06}.png"));
                *next += 1;
                path
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let width = image.width();
        let height = image.height();
        let mut data = image.into_data();
        // Stored BGRA, PNG wants RGBA.
        for px in data.chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL) {
            px.swap(0, 2);
        }

        let png = image::RgbaImage::from_raw(width, height, data)
            .ok_or("Composite buffer does not match its dimensions")?;
        png.save(&path)?;
        Ok(())
    }
}
