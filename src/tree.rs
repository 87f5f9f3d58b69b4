use indextree::{Arena, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Classification of an entry in the scanned album hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Image,
}

/// A single entry in the album hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
}

impl AlbumNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Immutable album hierarchy backed by an arena allocator.
///
/// Children of a folder are kept in display order: subfolders sorted by name
/// first, then images sorted by name. The order is a contract; level layout
/// assigns sphere positions by child index, so it must be stable across the
/// lifetime of the tree. A new root selection builds a new tree; nothing
/// mutates an existing one.
pub struct AlbumTree {
    arena: Arena<AlbumNode>,
    root: NodeId,
    path_to_node: HashMap<PathBuf, NodeId>,
}

impl AlbumTree {
    /// Create a tree containing only the root folder node.
    pub(crate) fn new(root_path: PathBuf) -> Self {
        let root_name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.display().to_string());

        let mut arena = Arena::new();
        let root = arena.new_node(AlbumNode {
            name: root_name,
            path: root_path.clone(),
            kind: NodeKind::Folder,
        });

        let mut path_to_node = HashMap::new();
        path_to_node.insert(root_path, root);

        Self {
            arena,
            root,
            path_to_node,
        }
    }

    /// Append a child under `parent`. The scanner inserts children in display
    /// order; the arena preserves insertion order.
    pub(crate) fn attach(&mut self, parent: NodeId, node: AlbumNode) -> NodeId {
        let path = node.path.clone();
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        self.path_to_node.insert(path, id);
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&AlbumNode> {
        self.arena.get(id).map(|n| n.get())
    }

    /// Look a node up by its absolute path.
    pub fn node_at(&self, path: &Path) -> Option<NodeId> {
        self.path_to_node.get(path).copied()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        id.children(&self.arena).count()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent())
    }

    /// Whether `child` is an immediate child of `parent`.
    pub fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.parent(child) == Some(parent)
    }

    /// Total number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.arena.count()
    }

    /// Serializable mirror of the whole tree, rooted at the root folder.
    pub fn to_wire(&self) -> WireNode {
        self.wire_subtree(self.root)
    }

    fn wire_subtree(&self, id: NodeId) -> WireNode {
        let node = self.arena[id].get();
        let children = match node.kind {
            NodeKind::Folder => Some(
                id.children(&self.arena)
                    .map(|child| self.wire_subtree(child))
                    .collect(),
            ),
            NodeKind::Image => None,
        };

        WireNode {
            name: node.name.clone(),
            path: node.path.display().to_string(),
            kind: node.kind,
            children,
        }
    }

    /// Rebuild a tree from its wire form, preserving child order. The top
    /// node is taken as the root folder; image nodes are leaves regardless of
    /// any stray `children` field.
    pub fn from_wire(wire: &WireNode) -> Self {
        let mut tree = Self::new(PathBuf::from(&wire.path));
        if let Some(children) = &wire.children {
            let root = tree.root;
            for child in children {
                tree.attach_wire(root, child);
            }
        }
        tree
    }

    fn attach_wire(&mut self, parent: NodeId, wire: &WireNode) {
        let id = self.attach(
            parent,
            AlbumNode {
                name: wire.name.clone(),
                path: PathBuf::from(&wire.path),
                kind: wire.kind,
            },
        );

        if wire.kind == NodeKind::Folder {
            if let Some(children) = &wire.children {
                for child in children {
                    self.attach_wire(id, child);
                }
            }
        }
    }
}

/// Wire schema for one node, as exchanged with a companion presentation
/// process: `children` is present (possibly empty) for folders and omitted
/// for images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<WireNode>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str, path: &str) -> AlbumNode {
        AlbumNode {
            name: name.to_string(),
            path: PathBuf::from(path),
            kind: NodeKind::Folder,
        }
    }

    fn image(name: &str, path: &str) -> AlbumNode {
        AlbumNode {
            name: name.to_string(),
            path: PathBuf::from(path),
            kind: NodeKind::Image,
        }
    }

    fn sample_tree() -> AlbumTree {
        let mut tree = AlbumTree::new(PathBuf::from("/album"));
        let root = tree.root();
        let a = tree.attach(root, folder("a", "/album/a"));
        tree.attach(root, folder("b", "/album/b"));
        tree.attach(root, image("photo.png", "/album/photo.png"));
        tree.attach(a, image("cat.jpg", "/album/a/cat.jpg"));
        tree
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let tree = sample_tree();
        let names: Vec<&str> = tree
            .children(tree.root())
            .filter_map(|id| tree.node(id))
            .map(|n| n.name.as_str())
            .collect();

        assert_eq!(names, ["a", "b", "photo.png"]);
    }

    #[test]
    fn test_lookup_by_path() {
        let tree = sample_tree();

        let a = tree.node_at(Path::new("/album/a")).unwrap();
        assert_eq!(tree.node(a).unwrap().name, "a");
        assert!(tree.is_child_of(a, tree.root()));

        assert!(tree.node_at(Path::new("/album/missing")).is_none());
    }

    #[test]
    fn test_wire_schema_shape() {
        let tree = sample_tree();
        let json = serde_json::to_value(tree.to_wire()).unwrap();

        assert_eq!(json["kind"], "folder");
        assert_eq!(json["children"][0]["name"], "a");

        // Images never carry a children key, folders always do.
        let photo = &json["children"][2];
        assert_eq!(photo["kind"], "image");
        assert!(photo.get("children").is_none());
        let b = &json["children"][1];
        assert_eq!(b["children"], serde_json::json!([]));
    }

    #[test]
    fn test_wire_roundtrip() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree.to_wire()).unwrap();
        let parsed: WireNode = serde_json::from_str(&json).unwrap();
        let rebuilt = AlbumTree::from_wire(&parsed);

        assert_eq!(rebuilt.len(), tree.len());

        let names: Vec<&str> = rebuilt
            .children(rebuilt.root())
            .filter_map(|id| rebuilt.node(id))
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "photo.png"]);

        let cat = rebuilt.node_at(Path::new("/album/a/cat.jpg")).unwrap();
        assert_eq!(rebuilt.node(cat).unwrap().kind, NodeKind::Image);
    }
}
