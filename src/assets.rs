//! Header graphic asset and its on-disk cache.
//!
//! Every report carries the same 125×70 banner in the top-left corner of its
//! first surface. The banner is rendered in memory with the `image` crate and
//! kept at `<cache_dir>/header.png` so external tools (and the next run) can
//! pick it up.
//!
//! ## Cache check
//!
//! The cache is content-addressed like the rest of the pipeline's caching:
//! the freshly rendered PNG is hashed with SHA-256 and compared with the hash
//! of the file on disk.
//!
//! - File missing → written ([`CacheOutcome::Written`]).
//! - Hash differs (stale or corrupted) → rewritten ([`CacheOutcome::Rewritten`]).
//! - Hash matches → left alone ([`CacheOutcome::Hit`]).
//!
//! Each check opens, writes and closes the file within the call.

use image::{ImageFormat, Rgba, RgbaImage};
use log::debug;
use sha2::{Digest, Sha256};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HEADER_WIDTH: u32 = 125;
pub const HEADER_HEIGHT: u32 = 70;
pub const HEADER_FILENAME: &str = "header.png";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Written,
    Rewritten,
}

/// A PNG ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderGraphic {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn header_path(&self) -> PathBuf {
        self.dir.join(HEADER_FILENAME)
    }

    /// Render the header graphic and make sure the cached copy matches it.
    pub fn header_graphic(&self) -> Result<(HeaderGraphic, CacheOutcome), AssetError> {
        let png = render_header_png()?;
        let expected = hash_bytes(&png);
        let path = self.header_path();

        let outcome = match hash_file(&path) {
            Ok(actual) if actual == expected => CacheOutcome::Hit,
            Ok(_) => {
                std::fs::write(&path, &png)?;
                CacheOutcome::Rewritten
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                std::fs::create_dir_all(&self.dir)?;
                std::fs::write(&path, &png)?;
                CacheOutcome::Written
            }
            Err(e) => return Err(e.into()),
        };
        debug!("header graphic {}: {:?}", path.display(), outcome);

        Ok((
            HeaderGraphic {
                png,
                width: HEADER_WIDTH,
                height: HEADER_HEIGHT,
            },
            outcome,
        ))
    }
}

/// Encode the banner: a navy field with a lighter band and a thin rule.
pub fn render_header_png() -> Result<Vec<u8>, AssetError> {
    let navy = Rgba([23, 64, 109, 255]);
    let band = Rgba([70, 110, 160, 255]);
    let rule = Rgba([255, 255, 255, 255]);

    let img = RgbaImage::from_fn(HEADER_WIDTH, HEADER_HEIGHT, |x, y| {
        if y == HEADER_HEIGHT - 6 && (8..HEADER_WIDTH - 8).contains(&x) {
            rule
        } else if (18..42).contains(&y) {
            band
        } else {
            navy
        }
    });

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// SHA-256 of a byte slice, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of a file's contents, as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}
