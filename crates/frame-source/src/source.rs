//! Sequential frame sources

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{CaptureError, VideoFrame};

/// Sequential access to one decoded video
///
/// Implementations keep a cursor; `next_frame` decodes the frame under the
/// cursor and advances it, `skip` advances without decoding.
pub trait FrameSource: Send {
    /// Total number of frames in the source
    fn frame_count(&self) -> usize;

    /// Index of the next frame `next_frame` would return
    fn position(&self) -> usize;

    /// Decode the frame at the cursor and advance. `Ok(None)` once exhausted.
    ///
    /// The cursor advances even when decoding fails so that offsets stay
    /// aligned with the other cameras.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError>;

    /// Advance the cursor by up to `n` frames, returning how many were skipped
    fn skip(&mut self, n: usize) -> usize;
}

/// Frame source backed by a directory of extracted image frames
///
/// Frames are ordered by file name, so zero-padded names
/// (`frame_00001.png`) give chronological order.
pub struct ImageSequenceSource {
    /// Frame file paths in playback order
    paths: Vec<PathBuf>,
    /// Cursor
    position: usize,
}

impl ImageSequenceSource {
    /// Open a directory of frames, keeping files with one of `extensions`
    pub fn open(dir: impl AsRef<Path>, extensions: &[String]) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CaptureError::Open(format!("{}: no frames found", dir.display())));
        }

        info!("Opened image sequence {} ({} frames)", dir.display(), paths.len());

        Ok(Self { paths, position: 0 })
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn position(&self) -> usize {
        self.position
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        let index = self.position;
        let Some(path) = self.paths.get(index) else {
            return Ok(None);
        };
        self.position += 1;

        debug!("Decoding frame {} from {}", index, path.display());
        let img = image::open(path).map_err(|e| CaptureError::Decode {
            index,
            reason: e.to_string(),
        })?;

        Ok(Some(VideoFrame::from_image(img, index)))
    }

    fn skip(&mut self, n: usize) -> usize {
        let skipped = n.min(self.paths.len().saturating_sub(self.position));
        self.position += skipped;
        skipped
    }
}

/// In-memory frame source
pub struct MemorySource {
    frames: Vec<VideoFrame>,
    position: usize,
}

impl MemorySource {
    /// Create a source from pre-built frames; frame indices are rewritten to
    /// match their position
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(i, mut f)| {
                f.frame_index = i;
                f
            })
            .collect();
        Self { frames, position: 0 }
    }

    /// Create a source of `count` black frames
    pub fn blank(count: usize, width: u32, height: u32) -> Self {
        Self::new((0..count).map(|i| VideoFrame::blank(width, height, i)).collect())
    }
}

impl FrameSource for MemorySource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn position(&self) -> usize {
        self.position
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CaptureError> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn skip(&mut self, n: usize) -> usize {
        let skipped = n.min(self.frames.len().saturating_sub(self.position));
        self.position += skipped;
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([shade, shade, shade]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_memory_source_sequential() {
        let mut source = MemorySource::blank(3, 2, 2);
        assert_eq!(source.frame_count(), 3);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.frame_index, 0);
        assert_eq!(source.skip(1), 1);

        let third = source.next_frame().unwrap().unwrap();
        assert_eq!(third.frame_index, 2);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_skip_saturates() {
        let mut source = MemorySource::blank(2, 2, 2);
        assert_eq!(source.skip(10), 2);
        assert_eq!(source.position(), 2);
    }

    #[test]
    fn test_image_sequence_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_002.png", 200);
        write_frame(dir.path(), "frame_001.png", 100);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exts = vec!["png".to_string()];
        let mut source = ImageSequenceSource::open(dir.path(), &exts).unwrap();
        assert_eq!(source.frame_count(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.width, 4);
        assert_eq!(first.height, 3);
        assert_eq!(first.get_pixel(0, 0), Some([100, 100, 100]));
    }

    #[test]
    fn test_image_sequence_decode_failure_advances() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("frame_001.png"), b"not a png").unwrap();
        write_frame(dir.path(), "frame_002.png", 50);

        let exts = vec!["png".to_string()];
        let mut source = ImageSequenceSource::open(dir.path(), &exts).unwrap();

        assert!(matches!(source.next_frame(), Err(CaptureError::Decode { index: 0, .. })));
        assert_eq!(source.position(), 1);
        assert!(source.next_frame().unwrap().is_some());
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let exts = vec!["png".to_string()];
        assert!(matches!(
            ImageSequenceSource::open(dir.path(), &exts),
            Err(CaptureError::Open(_))
        ));
    }
}
