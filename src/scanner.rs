use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::tree::{AlbumNode, AlbumTree, NodeKind};
use indextree::NodeId;

/// File extensions recognized as images, matched case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

const PROGRESS_EMIT_INTERVAL_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("album root does not exist: {0}")]
    NotFound(PathBuf),
    #[error("album root is not a folder: {0}")]
    NotADirectory(PathBuf),
    #[error("permission denied while reading {path}")]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("scan aborted while reading {path}")]
    Aborted {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ScanStats {
    pub folders: u64,
    pub images: u64,
    /// Non-image files and symlinks left out of the tree.
    pub skipped: u64,
    pub duration_ms: u128,
}

#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub folders: u64,
    pub images: u64,
    pub current_dir: PathBuf,
}

/// Recursive album scanner: turns a directory on disk into an [`AlbumTree`].
///
/// The scan completes fully before returning; there is no partial result. Any
/// filesystem error below the root aborts the whole scan with the offending
/// path. Sub-folders are scanned on the rayon pool; the output order is still
/// deterministic because every folder's children are sorted, subfolders
/// before images.
pub struct AlbumScanner {
    folder_count: Arc<AtomicU64>,
    image_count: Arc<AtomicU64>,
    skipped_count: Arc<AtomicU64>,
    last_emit_ms: Arc<AtomicU64>,
    started: Instant,
}

/// Intermediate per-folder result, assembled into the arena once the
/// traversal is done.
struct ScannedFolder {
    name: String,
    path: PathBuf,
    folders: Vec<ScannedFolder>,
    images: Vec<ScannedImage>,
}

struct ScannedImage {
    name: String,
    path: PathBuf,
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

impl AlbumScanner {
    pub fn new() -> Self {
        Self {
            folder_count: Arc::new(AtomicU64::new(0)),
            image_count: Arc::new(AtomicU64::new(0)),
            skipped_count: Arc::new(AtomicU64::new(0)),
            last_emit_ms: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
        }
    }

    /// Scan `root` into an album tree.
    pub fn scan<P: AsRef<Path>>(&mut self, root: P) -> Result<(AlbumTree, ScanStats), ScanError> {
        self.scan_with_progress(root, None)
    }

    /// Scan `root`, reporting throttled progress through `reporter`. A final
    /// report with the complete counts is always emitted on success.
    pub fn scan_with_progress<P: AsRef<Path>>(
        &mut self,
        root: P,
        reporter: Option<Arc<dyn Fn(ScanProgress) + Send + Sync>>,
    ) -> Result<(AlbumTree, ScanStats), ScanError> {
        let root = root.as_ref();
        self.folder_count.store(0, Ordering::Relaxed);
        self.image_count.store(0, Ordering::Relaxed);
        self.skipped_count.store(0, Ordering::Relaxed);
        self.last_emit_ms.store(0, Ordering::Relaxed);
        self.started = Instant::now();

        // The root check follows symlinks, like the picker that produced the
        // path; entries below the root are classified by their own file type.
        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
            _ => classify_io(root, e),
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let scanned = self.scan_folder(root, &reporter)?;

        let mut tree = AlbumTree::new(root.to_path_buf());
        let tree_root = tree.root();
        attach_scanned(&mut tree, tree_root, scanned);

        let stats = ScanStats {
            folders: self.folder_count.load(Ordering::Relaxed),
            images: self.image_count.load(Ordering::Relaxed),
            skipped: self.skipped_count.load(Ordering::Relaxed),
            duration_ms: self.started.elapsed().as_millis(),
        };

        if let Some(reporter) = &reporter {
            reporter(ScanProgress {
                folders: stats.folders,
                images: stats.images,
                current_dir: root.to_path_buf(),
            });
        }

        info!(
            root = %root.display(),
            folders = stats.folders,
            images = stats.images,
            skipped = stats.skipped,
            duration_ms = stats.duration_ms as u64,
            "album scan complete"
        );

        Ok((tree, stats))
    }

    fn scan_folder(
        &self,
        dir: &Path,
        reporter: &Option<Arc<dyn Fn(ScanProgress) + Send + Sync>>,
    ) -> Result<ScannedFolder, ScanError> {
        self.folder_count.fetch_add(1, Ordering::Relaxed);
        self.emit_progress(dir, reporter);

        let read_dir = fs::read_dir(dir).map_err(|e| classify_io(dir, e))?;

        let mut subdirs: Vec<(String, PathBuf)> = Vec::new();
        let mut images: Vec<ScannedImage> = Vec::new();

        for entry in read_dir {
            let entry = entry.map_err(|e| classify_io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| classify_io(&entry.path(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                subdirs.push((name, entry.path()));
            } else if file_type.is_file() && is_image(&entry.path()) {
                self.image_count.fetch_add(1, Ordering::Relaxed);
                images.push(ScannedImage {
                    name,
                    path: entry.path(),
                });
            } else {
                // Non-image files and symlinks are not part of the album.
                self.skipped_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        subdirs.sort_by(|a, b| a.0.cmp(&b.0));
        images.sort_by(|a, b| a.name.cmp(&b.name));

        let folders = subdirs
            .par_iter()
            .map(|(name, path)| {
                self.scan_folder(path, reporter).map(|mut folder| {
                    folder.name = name.clone();
                    folder
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScannedFolder {
            name: String::new(), // overwritten by the parent; unused for the root
            path: dir.to_path_buf(),
            folders,
            images,
        })
    }

    fn emit_progress(
        &self,
        dir: &Path,
        reporter: &Option<Arc<dyn Fn(ScanProgress) + Send + Sync>>,
    ) {
        let Some(reporter) = reporter else { return };

        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        if !Self::should_emit(&self.last_emit_ms, elapsed_ms) {
            return;
        }

        reporter(ScanProgress {
            folders: self.folder_count.load(Ordering::Relaxed),
            images: self.image_count.load(Ordering::Relaxed),
            current_dir: dir.to_path_buf(),
        });
    }

    fn should_emit(last_emit_ms: &AtomicU64, elapsed_ms: u64) -> bool {
        let previous = last_emit_ms.load(Ordering::Relaxed);
        if elapsed_ms.saturating_sub(previous) < PROGRESS_EMIT_INTERVAL_MS {
            return false;
        }

        last_emit_ms
            .compare_exchange(previous, elapsed_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for AlbumScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_io(path: &Path, source: io::Error) -> ScanError {
    match source.kind() {
        io::ErrorKind::PermissionDenied => ScanError::AccessDenied {
            path: path.to_path_buf(),
            source,
        },
        _ => ScanError::Aborted {
            path: path.to_path_buf(),
            source,
        },
    }
}

fn attach_scanned(tree: &mut AlbumTree, parent: NodeId, folder: ScannedFolder) {
    for sub in folder.folders {
        let id = tree.attach(
            parent,
            AlbumNode {
                name: sub.name.clone(),
                path: sub.path.clone(),
                kind: NodeKind::Folder,
            },
        );
        attach_scanned(tree, id, sub);
    }

    for image in folder.images {
        tree.attach(
            parent,
            AlbumNode {
                name: image.name,
                path: image.path,
                kind: NodeKind::Image,
            },
        );
    }
}
