//! The in-memory tree.
//!
//! Nodes live in an arena keyed by inode number; directories hold a sorted
//! name → inode map. There are no parent pointers, so "is this inside that"
//! questions are answered by walking down from the candidate ancestor.
//!
//! All public operations take absolute paths. Relative input is normalized
//! against `/`; callers with a working directory resolve first with
//! [`path::resolve`](super::path::resolve).

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::trace;

use super::error::{VfsError, VfsResult};
use super::node::{
    Credentials, DeviceClass, DirEntry, DiskUsage, Metadata, Node, NodeId, NodeKind,
};
use super::path;

/// Symlink hops allowed during one lookup before it is treated as not found.
pub const MAX_SYMLINK_DEPTH: usize = 10;

/// Why a walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkError {
    NotFound,
    NotADirectory,
}

/// In-memory POSIX-like filesystem.
#[derive(Debug, Clone)]
pub struct Vfs {
    pub(super) nodes: HashMap<NodeId, Node>,
    pub(super) root: NodeId,
    pub(super) next_ino: NodeId,
    creds: Credentials,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    /// Create a filesystem containing only `/`.
    pub fn new() -> Self {
        let creds = Credentials::root();
        let root = Node::new(
            1,
            "",
            NodeKind::Directory {
                children: BTreeMap::new(),
            },
            0o755,
            &creds,
        );
        let mut nodes = HashMap::new();
        nodes.insert(1, root);
        Self {
            nodes,
            root: 1,
            next_ino: 2,
            creds,
        }
    }

    /// Owner and group applied to nodes created from now on.
    pub fn set_credentials(&mut self, creds: Credentials) {
        self.creds = creds;
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    /// Number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- queries -------------------------------------------------------

    /// True if `path` resolves (following symlinks) to any node.
    pub fn exists(&self, path: &str) -> bool {
        self.lookup(&path::normalize(path), true).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.stat(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.stat(path).map(|m| m.is_file()).unwrap_or(false)
    }

    pub fn is_symlink(&self, path: &str) -> bool {
        self.lstat(path).map(|m| m.is_symlink()).unwrap_or(false)
    }

    /// Metadata, following a final symlink.
    pub fn stat(&self, path: &str) -> VfsResult<Metadata> {
        let path = path::normalize(path);
        let id = self.lookup(&path, true)?;
        self.metadata(id, &path)
    }

    /// Metadata of the entry itself, without following a final symlink.
    pub fn lstat(&self, path: &str) -> VfsResult<Metadata> {
        let path = path::normalize(path);
        let id = self.lookup(&path, false)?;
        self.metadata(id, &path)
    }

    /// Entries of a directory, ordered by name.
    pub fn list(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        let path = path::normalize(path);
        let id = self.lookup(&path, true)?;
        let children = self
            .get(id)
            .and_then(Node::children)
            .ok_or_else(|| VfsError::NotADirectory(path.clone()))?;

        children
            .iter()
            .map(|(name, &child)| -> VfsResult<DirEntry> {
                Ok(DirEntry {
                    name: name.clone(),
                    meta: self.metadata(child, &path::join(&path, name))?,
                })
            })
            .collect()
    }

    /// Target text of a symlink.
    pub fn readlink(&self, path: &str) -> VfsResult<String> {
        let path = path::normalize(path);
        let id = self.lookup(&path, false)?;
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Symlink { target }) => Ok(target.clone()),
            _ => Err(VfsError::InvalidArgument(path)),
        }
    }

    /// Physical path of `path` with every symlink resolved.
    pub fn canonicalize(&self, path: &str) -> VfsResult<String> {
        let path = path::normalize(path);
        let stack = self.walk(&path, true).map_err(|e| walk_error(e, &path))?;
        let names: Vec<&str> = stack
            .iter()
            .skip(1)
            .filter_map(|id| self.get(*id).map(|n| n.name.as_str()))
            .collect();
        Ok(format!("/{}", names.join("/")))
    }

    /// Total size of the subtree at `path`.
    pub fn usage(&self, path: &str) -> VfsResult<DiskUsage> {
        let path = path::normalize(path);
        let id = self.lookup(&path, true)?;
        let mut usage = DiskUsage::default();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            usage.bytes += node.size();
            match &node.kind {
                NodeKind::Directory { children } => {
                    usage.directories += 1;
                    stack.extend(children.values().copied());
                }
                _ => usage.files += 1,
            }
        }
        Ok(usage)
    }

    // --- content -------------------------------------------------------

    /// Read file content. Devices read as empty. Updates the access time.
    pub fn read(&mut self, path: &str) -> VfsResult<Vec<u8>> {
        let path = path::normalize(path);
        let id = self.lookup(&path, true)?;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| VfsError::NotFound(path.clone()))?;
        let data = match &node.kind {
            NodeKind::File { content } => content.clone(),
            NodeKind::Device { .. } => Vec::new(),
            NodeKind::Directory { .. } => return Err(VfsError::IsADirectory(path)),
            NodeKind::Symlink { .. } => return Err(VfsError::NotFound(path)),
        };
        node.accessed = Utc::now();
        Ok(data)
    }

    /// Read file content as text, replacing invalid UTF-8.
    pub fn read_to_string(&mut self, path: &str) -> VfsResult<String> {
        self.read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write (or append to) a file, creating it if missing.
    ///
    /// The parent directory must already exist.
    pub fn write(&mut self, path: &str, data: &[u8], append: bool) -> VfsResult<()> {
        let path = path::normalize(path);
        match self.walk(&path, true) {
            Ok(stack) => {
                let id = stack.last().copied().unwrap_or(self.root);
                let node = self
                    .nodes
                    .get_mut(&id)
                    .ok_or_else(|| VfsError::NotFound(path.clone()))?;
                match &mut node.kind {
                    NodeKind::File { content } => {
                        if append {
                            content.extend_from_slice(data);
                        } else {
                            *content = data.to_vec();
                        }
                    }
                    NodeKind::Device { major: 1, minor: 7, .. } => {
                        return Err(VfsError::invalid(path, "No space left on device"));
                    }
                    NodeKind::Device { .. } => {}
                    NodeKind::Directory { .. } => return Err(VfsError::IsADirectory(path)),
                    NodeKind::Symlink { .. } => return Err(VfsError::NotFound(path)),
                }
                node.touch_modified();
                trace!(path = %path, bytes = data.len(), append, "vfs write");
                Ok(())
            }
            Err(WalkError::NotADirectory) => Err(VfsError::NotADirectory(path)),
            Err(WalkError::NotFound) => {
                // A dangling symlink sits here; don't replace it
                if self.walk(&path, false).is_ok() {
                    return Err(VfsError::NotFound(path));
                }
                let (parent, name) = self.parent_of(&path)?;
                let id = self.alloc(
                    &name,
                    NodeKind::File {
                        content: data.to_vec(),
                    },
                    0o644,
                );
                self.attach(parent, name, id);
                trace!(path = %path, bytes = data.len(), "vfs create");
                Ok(())
            }
        }
    }

    // --- structure -----------------------------------------------------

    /// Create a directory. With `recursive`, missing ancestors are created
    /// and an existing directory is not an error.
    pub fn mkdir(&mut self, path: &str, recursive: bool) -> VfsResult<()> {
        let path = path::normalize(path);

        if !recursive {
            if self.walk(&path, false).is_ok() {
                return Err(VfsError::AlreadyExists(path));
            }
            let (parent, name) = self.parent_of(&path)?;
            let id = self.alloc(&name, empty_dir(), 0o755);
            self.attach(parent, name, id);
            trace!(path = %path, "vfs mkdir");
            return Ok(());
        }

        let mut current = self.root;
        let mut so_far = String::new();
        for component in path::components(&path) {
            so_far.push('/');
            so_far.push_str(component);

            let existing = self
                .get(current)
                .and_then(Node::children)
                .and_then(|c| c.get(component))
                .copied();

            current = match existing {
                Some(_) => {
                    let id = self.lookup(&so_far, true)?;
                    if !self.get(id).is_some_and(Node::is_dir) {
                        return Err(if so_far == path {
                            VfsError::AlreadyExists(so_far)
                        } else {
                            VfsError::NotADirectory(so_far)
                        });
                    }
                    id
                }
                None => {
                    let id = self.alloc(component, empty_dir(), 0o755);
                    self.attach(current, component.to_string(), id);
                    trace!(path = %so_far, "vfs mkdir");
                    id
                }
            };
        }
        Ok(())
    }

    /// Remove a node. A non-empty directory needs `recursive`. The root
    /// can never be removed.
    pub fn delete(&mut self, path: &str, recursive: bool) -> VfsResult<()> {
        let path = path::normalize(path);
        if path == "/" {
            return Err(VfsError::RootProtected(path));
        }
        let (parent, name) = self.parent_of(&path)?;
        let id = self
            .child(parent, &name)
            .ok_or_else(|| VfsError::NotFound(path.clone()))?;

        let non_empty = self
            .get(id)
            .and_then(Node::children)
            .is_some_and(|c| !c.is_empty());
        if non_empty && !recursive {
            return Err(VfsError::NotEmpty(path));
        }

        self.detach(parent, &name);
        let removed = self.drop_subtree(id);
        trace!(path = %path, removed, "vfs delete");
        Ok(())
    }

    /// Copy a file or directory tree.
    ///
    /// If `dst` is an existing directory the source is copied inside it.
    /// Copying a directory onto an existing directory merges the trees.
    /// Every conflict is detected before anything is written, so a failed
    /// copy leaves the destination untouched.
    pub fn copy(&mut self, src: &str, dst: &str, recursive: bool) -> VfsResult<()> {
        let src = path::normalize(src);
        let dst = path::normalize(dst);
        let src_id = self.lookup(&src, true)?;
        let src_is_dir = self.get(src_id).is_some_and(Node::is_dir);
        if src_is_dir && !recursive {
            return Err(VfsError::IsADirectory(src));
        }

        let dest = if self.is_dir(&dst) {
            path::join(&dst, path::basename(&src))
        } else {
            dst
        };
        let (parent, name) = self.parent_of(&dest)?;
        if src_is_dir && (parent == src_id || self.is_within(parent, src_id)) {
            return Err(VfsError::invalid(
                dest,
                "cannot copy a directory into itself",
            ));
        }

        let existing = self.lookup(&dest, true).ok();
        self.check_copy(src_id, existing, &dest)?;
        self.copy_node(src_id, parent, &name, existing);
        trace!(src = %src, dest = %dest, "vfs copy");
        Ok(())
    }

    /// Move (rename) a node. The node keeps its inode; observably this is
    /// the same as a copy followed by a delete of the source.
    ///
    /// If `dst` is an existing directory the source moves inside it. An
    /// existing file at the destination is replaced, as is an empty
    /// directory when moving a directory. On any error nothing changes.
    pub fn rename(&mut self, src: &str, dst: &str) -> VfsResult<()> {
        let src = path::normalize(src);
        let dst = path::normalize(dst);
        if src == "/" {
            return Err(VfsError::RootProtected(src));
        }

        let (src_parent, src_name) = self.parent_of(&src)?;
        let src_id = self
            .child(src_parent, &src_name)
            .ok_or_else(|| VfsError::NotFound(src.clone()))?;
        let src_is_dir = self.get(src_id).is_some_and(Node::is_dir);

        let dest = if self.is_dir(&dst) {
            path::join(&dst, &src_name)
        } else {
            dst
        };
        let (dest_parent, dest_name) = self.parent_of(&dest)?;
        if dest_parent == src_parent && dest_name == src_name {
            return Ok(());
        }
        if src_is_dir && (dest_parent == src_id || self.is_within(dest_parent, src_id)) {
            return Err(VfsError::invalid(
                dest,
                "cannot move a directory into a subdirectory of itself",
            ));
        }

        if let Some(existing) = self.child(dest_parent, &dest_name) {
            let node = self
                .get(existing)
                .ok_or_else(|| VfsError::NotFound(dest.clone()))?;
            match (src_is_dir, node.children()) {
                (true, Some(children)) if !children.is_empty() => {
                    return Err(VfsError::NotEmpty(dest));
                }
                (true, None) => return Err(VfsError::NotADirectory(dest)),
                (false, Some(_)) => return Err(VfsError::IsADirectory(dest)),
                _ => {}
            }
            self.detach(dest_parent, &dest_name);
            self.drop_subtree(existing);
        }

        self.detach(src_parent, &src_name);
        if let Some(node) = self.nodes.get_mut(&src_id) {
            node.name = dest_name.clone();
        }
        self.attach(dest_parent, dest_name, src_id);
        trace!(src = %src, dest = %dest, "vfs rename");
        Ok(())
    }

    /// Create a symlink at `link` pointing to `target`. The target is stored
    /// as given and need not exist.
    pub fn symlink(&mut self, target: &str, link: &str) -> VfsResult<()> {
        let link = path::normalize(link);
        if self.walk(&link, false).is_ok() {
            return Err(VfsError::AlreadyExists(link));
        }
        let (parent, name) = self.parent_of(&link)?;
        let id = self.alloc(
            &name,
            NodeKind::Symlink {
                target: target.to_string(),
            },
            0o777,
        );
        self.attach(parent, name, id);
        Ok(())
    }

    /// Create a device node.
    pub fn create_device(
        &mut self,
        path: &str,
        class: DeviceClass,
        major: u32,
        minor: u32,
        mode: u32,
    ) -> VfsResult<()> {
        let path = path::normalize(path);
        if self.walk(&path, false).is_ok() {
            return Err(VfsError::AlreadyExists(path));
        }
        let (parent, name) = self.parent_of(&path)?;
        let id = self.alloc(&name, NodeKind::Device { class, major, minor }, mode);
        self.attach(parent, name, id);
        Ok(())
    }

    // --- attributes ----------------------------------------------------

    /// Replace the permission bits.
    pub fn chmod(&mut self, path: &str, mode: u32) -> VfsResult<()> {
        let node = self.node_mut(path, true)?;
        node.mode = mode & 0o7777;
        Ok(())
    }

    /// Change owner and/or group.
    pub fn chown(&mut self, path: &str, owner: Option<&str>, group: Option<&str>) -> VfsResult<()> {
        let node = self.node_mut(path, true)?;
        if let Some(owner) = owner {
            node.owner = owner.to_string();
        }
        if let Some(group) = group {
            node.group = group.to_string();
        }
        Ok(())
    }

    /// Update timestamps, creating an empty file if nothing exists.
    pub fn touch(&mut self, path: &str) -> VfsResult<()> {
        let normalized = path::normalize(path);
        if self.lookup(&normalized, true).is_err() {
            return self.write(&normalized, &[], false);
        }
        let node = self.node_mut(&normalized, true)?;
        node.touch_modified();
        Ok(())
    }

    // --- internals -----------------------------------------------------

    pub(super) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, path: &str, follow: bool) -> VfsResult<&mut Node> {
        let path = path::normalize(path);
        let id = self.lookup(&path, follow)?;
        self.nodes.get_mut(&id).ok_or(VfsError::NotFound(path))
    }

    fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)
            .and_then(Node::children)
            .and_then(|c| c.get(name))
            .copied()
    }

    pub(super) fn alloc(&mut self, name: &str, kind: NodeKind, mode: u32) -> NodeId {
        let ino = self.next_ino;
        self.next_ino += 1;
        self.nodes
            .insert(ino, Node::new(ino, name, kind, mode, &self.creds));
        ino
    }

    fn attach(&mut self, parent: NodeId, name: String, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            if let Some(children) = node.children_mut() {
                children.insert(name, id);
            }
            node.touch_modified();
        }
    }

    fn detach(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.nodes.get_mut(&parent)?;
        let removed = node.children_mut()?.remove(name);
        node.touch_modified();
        removed
    }

    /// Remove a subtree from the arena. Returns the number of nodes dropped.
    fn drop_subtree(&mut self, id: NodeId) -> usize {
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                removed += 1;
                if let NodeKind::Directory { children } = node.kind {
                    stack.extend(children.into_values());
                }
            }
        }
        removed
    }

    /// True if `candidate` is somewhere below `ancestor`.
    fn is_within(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut stack = vec![ancestor];
        while let Some(id) = stack.pop() {
            if let Some(children) = self.get(id).and_then(Node::children) {
                for &child in children.values() {
                    if child == candidate {
                        return true;
                    }
                    stack.push(child);
                }
            }
        }
        false
    }

    /// Parent directory id and final name for a path that is about to be
    /// created or removed.
    fn parent_of(&self, path: &str) -> VfsResult<(NodeId, String)> {
        let (parent, name) =
            path::split_parent(path).ok_or_else(|| VfsError::RootProtected(path.to_string()))?;
        let id = self
            .lookup(parent, true)
            .map_err(|e| match e {
                VfsError::NotADirectory(_) => VfsError::NotADirectory(path.to_string()),
                _ => VfsError::NotFound(path.to_string()),
            })?;
        if !self.get(id).is_some_and(Node::is_dir) {
            return Err(VfsError::NotADirectory(path.to_string()));
        }
        Ok((id, name.to_string()))
    }

    fn lookup(&self, path: &str, follow_last: bool) -> VfsResult<NodeId> {
        self.walk(path, follow_last)
            .map_err(|e| walk_error(e, path))
            .and_then(|stack| {
                stack
                    .last()
                    .copied()
                    .ok_or_else(|| VfsError::NotFound(path.to_string()))
            })
    }

    /// Resolve a normalized path to the chain of inodes from the root.
    ///
    /// Symlink targets are spliced into the remaining components, so `..`
    /// inside a target is physical: it climbs from the link's directory.
    fn walk(&self, path: &str, follow_last: bool) -> Result<Vec<NodeId>, WalkError> {
        let mut pending: Vec<String> = path::components(path).rev().map(String::from).collect();
        let mut stack = vec![self.root];
        let mut hops = 0;

        while let Some(name) = pending.pop() {
            match name.as_str() {
                "." => continue,
                ".." => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                    continue;
                }
                _ => {}
            }

            let current = *stack.last().ok_or(WalkError::NotFound)?;
            let children = self
                .get(current)
                .ok_or(WalkError::NotFound)?
                .children()
                .ok_or(WalkError::NotADirectory)?;
            let child_id = *children.get(&name).ok_or(WalkError::NotFound)?;
            let child = self.get(child_id).ok_or(WalkError::NotFound)?;

            if let NodeKind::Symlink { target } = &child.kind {
                if follow_last || !pending.is_empty() {
                    hops += 1;
                    if hops > MAX_SYMLINK_DEPTH {
                        return Err(WalkError::NotFound);
                    }
                    if target.starts_with('/') {
                        stack.truncate(1);
                    }
                    pending.extend(path::components(target).rev().map(String::from));
                    continue;
                }
            }
            stack.push(child_id);
        }
        Ok(stack)
    }

    fn metadata(&self, id: NodeId, path: &str) -> VfsResult<Metadata> {
        let node = self
            .get(id)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
        let nlink = match &node.kind {
            NodeKind::Directory { children } => {
                let subdirs = children
                    .values()
                    .filter(|c| self.get(**c).is_some_and(Node::is_dir))
                    .count();
                2 + subdirs as u32
            }
            _ => 1,
        };
        let (target, device) = match &node.kind {
            NodeKind::Symlink { target } => (Some(target.clone()), None),
            NodeKind::Device { class, major, minor } => (None, Some((*class, *major, *minor))),
            _ => (None, None),
        };
        Ok(Metadata {
            ino: node.ino,
            kind: node.kind.file_kind(),
            mode: node.mode,
            owner: node.owner.clone(),
            group: node.group.clone(),
            size: node.size(),
            nlink,
            created: node.created,
            modified: node.modified,
            accessed: node.accessed,
            target,
            device,
        })
    }

    fn check_copy(&self, src: NodeId, existing: Option<NodeId>, dest: &str) -> VfsResult<()> {
        let Some(existing) = existing else {
            return Ok(());
        };
        if existing == src {
            return Err(VfsError::invalid(
                dest,
                "source and destination are the same file",
            ));
        }
        let src_children = self.get(src).and_then(Node::children);
        let dest_children = self.get(existing).and_then(Node::children);
        match (src_children, dest_children) {
            (Some(_), None) => Err(VfsError::NotADirectory(dest.to_string())),
            (None, Some(_)) => Err(VfsError::IsADirectory(dest.to_string())),
            (None, None) => match self.get(existing).map(|n| &n.kind) {
                Some(NodeKind::Device { major: 1, minor: 7, .. }) => {
                    Err(VfsError::invalid(dest, "No space left on device"))
                }
                _ => Ok(()),
            },
            (Some(src_children), Some(dest_children)) => {
                for (name, &child) in src_children {
                    let existing_child = dest_children.get(name).copied();
                    self.check_copy(child, existing_child, &path::join(dest, name))?;
                }
                Ok(())
            }
        }
    }

    /// Copy `src` as `name` under `parent`, merging into `existing` when set.
    /// Conflicts must have been ruled out by `check_copy`.
    fn copy_node(&mut self, src: NodeId, parent: NodeId, name: &str, existing: Option<NodeId>) {
        let Some(node) = self.get(src).cloned() else {
            return;
        };
        match (node.kind, existing) {
            (NodeKind::Directory { children }, Some(target)) => {
                for (child_name, child) in children {
                    let existing_child = self.child(target, &child_name);
                    self.copy_node(child, target, &child_name, existing_child);
                }
            }
            (NodeKind::Directory { children }, None) => {
                let id = self.alloc(name, empty_dir(), node.mode);
                self.attach(parent, name.to_string(), id);
                for (child_name, child) in children {
                    self.copy_node(child, id, &child_name, None);
                }
            }
            (kind, Some(target)) => {
                let data = match kind {
                    NodeKind::File { content } => content,
                    _ => Vec::new(),
                };
                if let Some(target) = self.nodes.get_mut(&target) {
                    if let NodeKind::File { content } = &mut target.kind {
                        *content = data;
                    }
                    target.touch_modified();
                }
            }
            // A device copies as what it reads: an empty regular file
            (NodeKind::Device { .. }, None) => {
                let id = self.alloc(name, NodeKind::File { content: Vec::new() }, 0o644);
                self.attach(parent, name.to_string(), id);
            }
            (kind, None) => {
                let id = self.alloc(name, kind, node.mode);
                self.attach(parent, name.to_string(), id);
            }
        }
    }
}

fn empty_dir() -> NodeKind {
    NodeKind::Directory {
        children: BTreeMap::new(),
    }
}

fn walk_error(err: WalkError, path: &str) -> VfsError {
    match err {
        WalkError::NotFound => VfsError::NotFound(path.to_string()),
        WalkError::NotADirectory => VfsError::NotADirectory(path.to_string()),
    }
}
