//! Hierarchical index built from a flat list of archive member paths.
//!
//! Nodes live in an arena and refer to their children by [`NodeId`]. The
//! index maps every normalized member path (segments joined by `/`, no
//! leading `./`) to its node; the root is keyed by `"."`.

use std::collections::HashMap;

pub type NodeId = usize;

pub const ROOT_KEY: &str = ".";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
    /// Links, devices and other members that are neither files nor dirs.
    Other,
}

#[derive(Clone, Debug)]
pub struct Node<M> {
    path: String,
    kind: NodeKind,
    children: Vec<NodeId>,
    meta: Option<M>,
}

impl<M> Node<M> {
    /// Last path segment; empty for the root.
    pub fn name(&self) -> &str {
        if self.path == ROOT_KEY {
            return "";
        }
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Normalized path from the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Member metadata; `None` for synthesized directories.
    pub fn meta(&self) -> Option<&M> {
        self.meta.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Tree<M> {
    nodes: Vec<Node<M>>,
    index: HashMap<String, NodeId>,
}

impl<M> Tree<M> {
    pub const ROOT: NodeId = 0;

    pub fn root(&self) -> &Node<M> {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> &Node<M> {
        &self.nodes[id]
    }

    /// Look up a normalized path; `""` and `"."` both denote the root.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() || path == ROOT_KEY {
            return Some(Self::ROOT);
        }
        self.index.get(path).copied()
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&id| self.nodes[id].name() == name)
    }

    /// Number of indexed members, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All nodes except the root, in the order they entered the index.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<M>)> {
        self.nodes.iter().enumerate().skip(1)
    }

    /// Directory and file names directly under `id`, each sorted by name.
    pub fn listing(&self, id: NodeId) -> (Vec<String>, Vec<String>) {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for &child in &self.nodes[id].children {
            let node = &self.nodes[child];
            if node.is_dir() {
                dirs.push(node.name().to_owned());
            } else {
                files.push(node.name().to_owned());
            }
        }
        dirs.sort();
        files.sort();
        (dirs, files)
    }
}

/// Builds a [`Tree`] from member paths in any order.
#[derive(Debug)]
pub struct TreeBuilder<M> {
    tree: Tree<M>,
}

impl<M> Default for TreeBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> TreeBuilder<M> {
    pub fn new() -> Self {
        let root = Node {
            path: ROOT_KEY.to_owned(),
            kind: NodeKind::Dir,
            children: Vec::new(),
            meta: None,
        };
        let mut index = HashMap::new();
        index.insert(ROOT_KEY.to_owned(), Tree::<M>::ROOT);
        Self {
            tree: Tree {
                nodes: vec![root],
                index,
            },
        }
    }

    /// Add a member whose kind is given by a trailing `/` (directory) or
    /// its absence (file).
    pub fn push(&mut self, member: &str, meta: M) -> Option<NodeId> {
        let kind = if member.ends_with('/') {
            NodeKind::Dir
        } else {
            NodeKind::File
        };
        self.push_entry(member, kind, Some(meta))
    }

    /// Add a member with an explicit kind.
    ///
    /// Returns `None` for self-references (`.`, `./`) which are skipped. A
    /// member seen before keeps its position and children; kind and
    /// metadata are replaced.
    pub fn push_entry(&mut self, member: &str, kind: NodeKind, meta: Option<M>) -> Option<NodeId> {
        let key = normalize(member)?;
        let id = self.get_or_create(&key, kind);
        let node = &mut self.tree.nodes[id];
        node.kind = kind;
        if meta.is_some() {
            node.meta = meta;
        }
        Some(id)
    }

    fn get_or_create(&mut self, key: &str, kind: NodeKind) -> NodeId {
        if let Some(&id) = self.tree.index.get(key) {
            return id;
        }
        let parent = match key.rsplit_once('/') {
            Some((parent, _)) => self.get_or_create(parent, NodeKind::Dir),
            None => Tree::<M>::ROOT,
        };
        let id = self.tree.nodes.len();
        self.tree.nodes.push(Node {
            path: key.to_owned(),
            kind,
            children: Vec::new(),
            meta: None,
        });
        self.tree.index.insert(key.to_owned(), id);
        self.tree.nodes[parent].children.push(id);
        id
    }

    pub fn build(self) -> Tree<M> {
        self.tree
    }
}

impl TreeBuilder<()> {
    /// Build a metadata-free tree from `/`-terminated directory names and
    /// plain file names.
    pub fn from_paths<I, S>(paths: I) -> Tree<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Self::new();
        for path in paths {
            builder.push(path.as_ref(), ());
        }
        builder.build()
    }
}

/// Drop `.` and empty segments, matching how `RelPath` splits a path;
/// `None` for the root itself.
fn normalize(member: &str) -> Option<String> {
    let segments: Vec<&str> = member
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ROOT_KEY)
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<M>(tree: &Tree<M>, id: NodeId) -> Vec<&str> {
        tree.node(id)
            .children()
            .iter()
            .map(|&c| tree.node(c).name())
            .collect()
    }

    #[test]
    fn empty_tree_has_root() {
        let tree = TreeBuilder::from_paths(Vec::<&str>::new());
        assert!(tree.is_empty());
        assert_eq!(tree.root().name(), "");
        assert!(tree.root().is_dir());
        assert_eq!(tree.lookup("."), Some(Tree::<()>::ROOT));
        assert_eq!(tree.lookup(""), Some(Tree::<()>::ROOT));
    }

    #[test]
    fn implicit_directories_are_synthesized() {
        let tree = TreeBuilder::from_paths(["a/b/c/file.txt", "x"]);
        for dir in ["a", "a/b", "a/b/c"] {
            let id = tree.lookup(dir).unwrap();
            assert!(tree.node(id).is_dir(), "{dir}");
            assert!(tree.node(id).meta().is_none());
        }
        let file = tree.lookup("a/b/c/file.txt").unwrap();
        assert!(tree.node(file).is_file());
        assert_eq!(tree.node(file).name(), "file.txt");
        assert_eq!(names(&tree, Tree::<()>::ROOT), ["a", "x"]);
    }

    #[test]
    fn every_file_parent_chain_reaches_root() {
        let members = ["z/y/x", "b/", "b/c/d", "q", "z/w/"];
        let tree = TreeBuilder::from_paths(members);
        for (_, node) in tree.iter() {
            let mut path = node.path();
            while let Some((parent, _)) = path.rsplit_once('/') {
                let id = tree.lookup(parent).unwrap();
                assert!(tree.node(id).is_dir());
                assert!(tree.node(id).children().len() > 0);
                path = parent;
            }
        }
    }

    #[test]
    fn unsorted_input_keeps_member_order() {
        let tree = TreeBuilder::from_paths(["b", "a/", "c", "a/z", "a/y"]);
        assert_eq!(names(&tree, Tree::<()>::ROOT), ["b", "a", "c"]);
        let a = tree.lookup("a").unwrap();
        assert_eq!(names(&tree, a), ["z", "y"]);
        let (dirs, files) = tree.listing(Tree::<()>::ROOT);
        assert_eq!(dirs, ["a"]);
        assert_eq!(files, ["b", "c"]);
    }

    #[test]
    fn leading_dot_entries() {
        let tree = TreeBuilder::from_paths([".", "./", "./a/", "./a/b.txt", "./c"]);
        assert_eq!(tree.len(), 3);
        assert!(tree.lookup("a/b.txt").is_some());
        assert!(tree.lookup("./a").is_none());
        assert_eq!(names(&tree, Tree::<()>::ROOT), ["a", "c"]);
    }

    #[test]
    fn explicit_dir_after_implicit_keeps_children() {
        let mut builder = TreeBuilder::new();
        builder.push("d/f", 1);
        builder.push("d/", 2);
        let tree = builder.build();
        let d = tree.lookup("d").unwrap();
        assert_eq!(tree.node(d).meta(), Some(&2));
        assert_eq!(names(&tree, d), ["f"]);
        assert_eq!(names(&tree, Tree::<i32>::ROOT), ["d"]);
    }

    #[test]
    fn inner_dot_and_empty_segments() {
        let tree = TreeBuilder::from_paths(["a/./b.txt", "a//c/", "/d", "e/."]);
        assert_eq!(tree.len(), 5);
        assert!(tree.lookup("a/b.txt").is_some());
        assert!(tree.lookup("a/c").is_some());
        assert!(tree.lookup("a/./b.txt").is_none());
        assert_eq!(names(&tree, Tree::<()>::ROOT), ["a", "d", "e"]);
        let a = tree.lookup("a").unwrap();
        assert_eq!(names(&tree, a), ["b.txt", "c"]);
    }

    #[test]
    fn len_counts_members_only() {
        let tree = TreeBuilder::from_paths(["x/y"]);
        assert_eq!(tree.len(), 2);
        assert!(!tree.is_empty());
        assert_eq!(tree.iter().count(), tree.len());
    }

    #[test]
    fn child_lookup_by_name() {
        let tree = TreeBuilder::from_paths(["a/b", "a/c/"]);
        let a = tree.lookup("a").unwrap();
        let c = tree.child(a, "c").unwrap();
        assert_eq!(tree.node(c).path(), "a/c");
        assert!(tree.child(a, "missing").is_none());
    }
}
