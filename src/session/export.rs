//! Getting the finished photo out: download or share.

use std::path::PathBuf;

pub const JPEG_MIME: &str = "image/jpeg";

/// File name for an exported `size × size` photo.
pub fn output_file_name(size: u32) -> String {
    format!("hajj-photo-{size}x{size}.jpg")
}

/// What happened when the user tried to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// Sharing is not supported here. Not an error: fall back to download.
    Unavailable,
    Cancelled,
}

pub trait FileExport {
    /// Save `bytes` under `filename`, returning where they went.
    fn download(&mut self, bytes: &[u8], filename: &str) -> std::io::Result<PathBuf>;

    fn share(&mut self, bytes: &[u8], filename: &str, mime: &str) -> std::io::Result<ShareOutcome>;
}

/// Writes downloads into a directory. Has no share target.
#[derive(Debug, Clone)]
pub struct DirectoryExport {
    dir: PathBuf,
}

impl DirectoryExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileExport for DirectoryExport {
    fn download(&mut self, bytes: &[u8], filename: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn share(&mut self, _bytes: &[u8], _filename: &str, _mime: &str) -> std::io::Result<ShareOutcome> {
        Ok(ShareOutcome::Unavailable)
    }
}
