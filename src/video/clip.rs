use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::types::Frame;

/// A clip stored as a directory of still frames, ordered by file name
#[derive(Debug, Clone)]
pub struct FrameDirectory {
    pub path: PathBuf,
    pub name: String,
    pub frame_paths: Vec<PathBuf>,
}

impl FrameDirectory {
    /// Scan `path` for frame images. Fails when it holds none.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(VideoError::LoadFailed { path: path.display().to_string() }.into());
        }

        let mut frame_paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();
            if file.is_file() && !is_hidden_file(&file) && is_frame_image(&file) {
                frame_paths.push(file);
            }
        }

        if frame_paths.is_empty() {
            return Err(VideoError::LoadFailed {
                path: format!("No frame images found in {}", path.display()),
            }.into());
        }
        frame_paths.sort();

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("clip")
            .to_string();

        debug!("Found {} frames in {}", frame_paths.len(), name);
        Ok(Self { path: path.to_path_buf(), name, frame_paths })
    }

    pub fn len(&self) -> usize {
        self.frame_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_paths.is_empty()
    }

    /// Decode every frame, optionally resized so the larger side equals
    /// `max_dimension`.
    pub fn load_frames(&self, max_dimension: Option<u32>) -> Result<Vec<Frame>> {
        self.frame_paths
            .iter()
            .map(|path| -> Result<Frame> {
                let frame = Frame::new(image::open(path)?.to_rgb8());
                Ok(match max_dimension {
                    Some(max) => frame.fit_to_max_dimension(max),
                    None => frame,
                })
            })
            .collect()
    }
}

/// Every sub-directory of `root` that holds at least one frame image.
/// A `root` that itself holds frames is returned as the only clip.
pub fn find_frame_directories<P: AsRef<Path>>(root: P) -> Result<Vec<FrameDirectory>> {
    let root = root.as_ref();
    if let Ok(clip) = FrameDirectory::open(root) {
        return Ok(vec![clip]);
    }

    if !root.is_dir() {
        return Err(VideoError::LoadFailed { path: root.display().to_string() }.into());
    }

    let mut clips = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() || is_hidden_file(&path) {
            continue;
        }
        match FrameDirectory::open(&path) {
            Ok(clip) => clips.push(clip),
            Err(e) => warn!("Skipping {:?}: {}", path, e),
        }
    }

    if clips.is_empty() {
        return Err(VideoError::LoadFailed {
            path: format!("No clip directories found in {}", root.display()),
        }.into());
    }

    clips.sort_by(|a, b| a.path.cmp(&b.path));
    info!("Found {} clips in {}", clips.len(), root.display());
    Ok(clips)
}

fn is_frame_image(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"),
        None => false,
    }
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
