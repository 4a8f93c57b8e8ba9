//! Resumable directory walk with consumer-side pruning.
//!
//! ```no_run
//! # use pulith_vfs::ZipPath;
//! # fn demo(zp: &ZipPath) -> pulith_vfs::Result<()> {
//! let mut walk = zp.walk()?;
//! while let Some(level) = walk.next_level() {
//!     // Subtrees removed here are never visited.
//!     level.dirs.retain(|d| d != "node_modules");
//!     println!("{} {:?}", level.root, level.files);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::path::VirtualPath;
use crate::tree::{NodeId, Tree};

/// One directory visited by a [`Walk`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkLevel<P> {
    pub root: P,
    /// Child directory names, sorted. Removing an entry before the next
    /// call to [`Walk::next_level`] prunes that subtree.
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

/// Depth-first, parent-before-children walk over a tree.
///
/// `dirs` of the level returned last is re-read when the walk resumes, so
/// descent follows whatever the consumer left in it.
pub struct Walk<P, M> {
    base: P,
    tree: Arc<Tree<M>>,
    start: NodeId,
    stack: Vec<NodeId>,
    current: Option<(NodeId, WalkLevel<P>)>,
}

impl<P: VirtualPath, M> Walk<P, M> {
    pub(crate) fn new(base: P, tree: Arc<Tree<M>>, start: NodeId) -> Self {
        Self {
            base,
            tree,
            start,
            stack: vec![start],
            current: None,
        }
    }

    pub fn next_level(&mut self) -> Option<&mut WalkLevel<P>> {
        if let Some((id, level)) = self.current.take() {
            for name in level.dirs.iter().rev() {
                match self.tree.child(id, name) {
                    Some(child) if self.tree.node(child).is_dir() => self.stack.push(child),
                    _ => {}
                }
            }
        }

        let id = self.stack.pop()?;
        let (dirs, files) = self.tree.listing(id);
        let root = self.path_for(id);
        self.current = Some((id, WalkLevel { root, dirs, files }));
        self.current.as_mut().map(|(_, level)| level)
    }

    fn path_for(&self, id: NodeId) -> P {
        if id == self.start {
            return self.base.clone();
        }
        let path = self.tree.node(id).path();
        if self.start == Tree::<M>::ROOT {
            return self.base.join(path);
        }
        let start = self.tree.node(self.start).path();
        let rel = path
            .strip_prefix(start)
            .map_or(path, |rest| rest.trim_start_matches('/'));
        self.base.join(rel)
    }
}

/// Owned levels without pruning.
impl<P: VirtualPath, M> Iterator for Walk<P, M> {
    type Item = (P, Vec<String>, Vec<String>);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_level()
            .map(|level| (level.root.clone(), level.dirs.clone(), level.files.clone()))
    }
}
