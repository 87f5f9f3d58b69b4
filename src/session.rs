use std::path::Path;
use std::sync::Arc;

use crate::navigator::Navigator;
use crate::scanner::{AlbumScanner, ScanError, ScanStats};
use crate::tree::AlbumTree;

/// One browsing session: one scanned tree, one navigator.
///
/// Selecting a new root builds a new Session and drops this one wholesale,
/// tree and navigation stack together; there is no per-node lifetime.
pub struct Session {
    tree: Arc<AlbumTree>,
    navigator: Navigator,
    stats: ScanStats,
}

impl Session {
    /// Wrap an already-scanned tree. The navigator starts unseeded so the
    /// caller can subscribe before the first `reset` and still observe the
    /// root level event.
    pub fn new(tree: AlbumTree, stats: ScanStats) -> Self {
        let tree = Arc::new(tree);
        let navigator = Navigator::new(tree.clone());
        Self {
            tree,
            navigator,
            stats,
        }
    }

    /// Scan `root` synchronously and wrap the result.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, ScanError> {
        let mut scanner = AlbumScanner::new();
        let (tree, stats) = scanner.scan(root)?;
        Ok(Self::new(tree, stats))
    }

    pub fn tree(&self) -> &Arc<AlbumTree> {
        &self.tree
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}
