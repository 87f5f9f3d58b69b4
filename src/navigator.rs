use indextree::NodeId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::tree::{AlbumNode, AlbumTree};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("navigation used before a scan seeded it")]
    EmptyNavigation,
    #[error("descend target is not a folder child of the current level: {path}")]
    InvalidDescend { path: PathBuf },
}

/// Payload delivered to subscribers whenever the current level changes.
#[derive(Debug, Clone)]
pub struct LevelChange {
    pub node_id: NodeId,
    pub node: AlbumNode,
    /// Stack depth after the transition; 1 means "at root".
    pub depth: usize,
}

pub type LevelSubscriber = Arc<dyn Fn(&LevelChange) + Send + Sync>;

/// Tracks where the user currently is inside a scanned album.
///
/// The stack is always a root-to-node folder path in the tree it was built
/// over. Every successful `reset`/`descend`/`ascend` notifies subscribers
/// exactly once, after the stack mutation, so a presentation layer can scope
/// per-level resources between two consecutive events. All calls are expected
/// from a single input-handling thread; the navigator does not serialize
/// concurrent movement itself.
pub struct Navigator {
    tree: Arc<AlbumTree>,
    stack: Vec<NodeId>,
    subscribers: Vec<LevelSubscriber>,
}

impl Navigator {
    /// A navigator over `tree`, unseeded. Subscribe before the first
    /// [`reset`](Self::reset) to observe the root level event.
    pub fn new(tree: Arc<AlbumTree>) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn tree(&self) -> &AlbumTree {
        &self.tree
    }

    pub fn subscribe(&mut self, subscriber: LevelSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Depth of the stack; 0 before the first reset, 1 at root.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Seed (or re-seed) the stack with the root level. Always succeeds.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(self.tree.root());
        self.notify();
    }

    pub fn current(&self) -> Result<NodeId, NavError> {
        self.stack.last().copied().ok_or(NavError::EmptyNavigation)
    }

    pub fn current_node(&self) -> Result<&AlbumNode, NavError> {
        let id = self.current()?;
        self.tree.node(id).ok_or(NavError::EmptyNavigation)
    }

    /// Move into `child`, which must be a folder directly under the current
    /// node. A stale id (say, a click captured against an already replaced
    /// level) fails with `InvalidDescend` and leaves the stack untouched.
    pub fn descend(&mut self, child: NodeId) -> Result<(), NavError> {
        let current = self.current()?;

        let is_valid_target = self.tree.is_child_of(child, current)
            && self.tree.node(child).map(|n| n.is_folder()).unwrap_or(false);
        if !is_valid_target {
            return Err(NavError::InvalidDescend {
                path: self
                    .tree
                    .node(child)
                    .map(|n| n.path.clone())
                    .unwrap_or_default(),
            });
        }

        self.stack.push(child);
        self.notify();
        Ok(())
    }

    /// Path-based variant of [`descend`](Self::descend), for callers that
    /// hold paths rather than node ids.
    pub fn descend_path(&mut self, path: &Path) -> Result<(), NavError> {
        let child = self
            .tree
            .node_at(path)
            .ok_or_else(|| NavError::InvalidDescend {
                path: path.to_path_buf(),
            })?;
        self.descend(child)
    }

    /// Pop back to the parent level. At root this is a no-op returning
    /// `None`: the "back button disabled" state, not an error.
    pub fn ascend(&mut self) -> Option<NodeId> {
        if self.stack.len() <= 1 {
            return None;
        }

        self.stack.pop();
        self.notify();
        self.stack.last().copied()
    }

    /// Names along the stack, root first. Display only.
    pub fn breadcrumb(&self) -> Vec<String> {
        self.stack
            .iter()
            .filter_map(|id| self.tree.node(*id))
            .map(|n| n.name.clone())
            .collect()
    }

    fn notify(&self) {
        let Some(&top) = self.stack.last() else { return };
        let Some(node) = self.tree.node(top) else { return };

        let change = LevelChange {
            node_id: top,
            node: node.clone(),
            depth: self.stack.len(),
        };
        debug!(level = %change.node.path.display(), depth = change.depth, "level changed");

        for subscriber in &self.subscribers {
            subscriber(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn node(name: &str, path: &str, kind: NodeKind) -> AlbumNode {
        AlbumNode {
            name: name.to_string(),
            path: PathBuf::from(path),
            kind,
        }
    }

    /// /album ── a ── deep
    ///        ├─ b
    ///        └─ photo.png
    fn sample_album() -> (Arc<AlbumTree>, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = AlbumTree::new(PathBuf::from("/album"));
        let root = tree.root();
        let a = tree.attach(root, node("a", "/album/a", NodeKind::Folder));
        let b = tree.attach(root, node("b", "/album/b", NodeKind::Folder));
        let photo = tree.attach(root, node("photo.png", "/album/photo.png", NodeKind::Image));
        let deep = tree.attach(a, node("deep", "/album/a/deep", NodeKind::Folder));
        (Arc::new(tree), a, b, photo, deep)
    }

    #[test]
    fn test_current_before_reset_fails() {
        let (tree, ..) = sample_album();
        let nav = Navigator::new(tree);

        assert_eq!(nav.current(), Err(NavError::EmptyNavigation));
        assert_eq!(nav.depth(), 0);
    }

    #[test]
    fn test_reset_seeds_root() {
        let (tree, ..) = sample_album();
        let root = tree.root();
        let mut nav = Navigator::new(tree);

        nav.reset();
        assert_eq!(nav.current(), Ok(root));
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn test_descend_and_ascend_round_trip() {
        let (tree, a, ..) = sample_album();
        let root = tree.root();
        let mut nav = Navigator::new(tree);
        nav.reset();

        nav.descend(a).unwrap();
        assert_eq!(nav.current(), Ok(a));
        assert_eq!(nav.depth(), 2);

        assert_eq!(nav.ascend(), Some(root));
        assert_eq!(nav.current(), Ok(root));
    }

    #[test]
    fn test_ascend_at_root_is_a_noop() {
        let (tree, ..) = sample_album();
        let root = tree.root();
        let mut nav = Navigator::new(tree);
        nav.reset();

        assert_eq!(nav.ascend(), None);
        assert_eq!(nav.current(), Ok(root));
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn test_descend_rejects_non_child_folder() {
        let (tree, _a, _b, _photo, deep) = sample_album();
        let mut nav = Navigator::new(tree);
        nav.reset();

        // `deep` is a grandchild of the root, not an immediate child.
        let err = nav.descend(deep).unwrap_err();
        assert_eq!(
            err,
            NavError::InvalidDescend {
                path: PathBuf::from("/album/a/deep")
            }
        );
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn test_descend_rejects_image_child() {
        let (tree, _a, _b, photo, _deep) = sample_album();
        let root = tree.root();
        let mut nav = Navigator::new(tree);
        nav.reset();

        assert!(nav.descend(photo).is_err());
        assert_eq!(nav.current(), Ok(root));
    }

    #[test]
    fn test_descend_by_path() {
        let (tree, a, ..) = sample_album();
        let mut nav = Navigator::new(tree);
        nav.reset();

        nav.descend_path(Path::new("/album/a")).unwrap();
        assert_eq!(nav.current(), Ok(a));

        let err = nav.descend_path(Path::new("/album/gone")).unwrap_err();
        assert_eq!(
            err,
            NavError::InvalidDescend {
                path: PathBuf::from("/album/gone")
            }
        );
    }

    #[test]
    fn test_breadcrumb_is_root_first() {
        let (tree, a, _b, _photo, deep) = sample_album();
        let mut nav = Navigator::new(tree);
        nav.reset();
        nav.descend(a).unwrap();
        nav.descend(deep).unwrap();

        assert_eq!(nav.breadcrumb(), ["album", "a", "deep"]);
    }

    #[test]
    fn test_each_transition_emits_exactly_one_event_in_order() {
        let (tree, a, ..) = sample_album();
        let root = tree.root();
        let mut nav = Navigator::new(tree);

        let seen: Arc<Mutex<Vec<(NodeId, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        nav.subscribe(Arc::new(move |change: &LevelChange| {
            sink.lock().unwrap().push((change.node_id, change.depth));
        }));

        nav.reset();
        nav.descend(a).unwrap();
        nav.descend(a).unwrap_err(); // failed descend must not emit
        nav.ascend();
        nav.ascend(); // no-op at root must not emit

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, [(root, 1), (a, 2), (root, 1)]);
    }

    #[test]
    fn test_subscribers_observe_consistent_current() {
        let (tree, a, ..) = sample_album();
        let mut nav = Navigator::new(tree.clone());

        // The payload must match what current() would say after the call.
        let payloads: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = payloads.clone();
        nav.subscribe(Arc::new(move |change: &LevelChange| {
            sink.lock().unwrap().push(change.node.path.clone());
        }));

        nav.reset();
        nav.descend(a).unwrap();

        let current = nav.current_node().unwrap().path.clone();
        assert_eq!(payloads.lock().unwrap().last(), Some(&current));
    }
}
