//! Node types stored in the VFS arena.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inode number. Unique within one [`Vfs`](super::Vfs) for its lifetime.
pub type NodeId = u64;

/// Apparent size reported for directories.
pub const DIR_SIZE: u64 = 4096;

/// Character or block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Char,
    Block,
}

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Directory,
    Symlink,
    Device,
}

impl FileKind {
    /// The leading character of an `ls -l` mode column.
    pub fn type_char(self, device: Option<DeviceClass>) -> char {
        match self {
            FileKind::File => '-',
            FileKind::Directory => 'd',
            FileKind::Symlink => 'l',
            FileKind::Device => match device {
                Some(DeviceClass::Block) => 'b',
                _ => 'c',
            },
        }
    }

    /// Wording used by `stat`.
    pub fn describe(self, device: Option<DeviceClass>) -> &'static str {
        match self {
            FileKind::File => "regular file",
            FileKind::Directory => "directory",
            FileKind::Symlink => "symbolic link",
            FileKind::Device => match device {
                Some(DeviceClass::Block) => "block special file",
                _ => "character special file",
            },
        }
    }
}

/// Type-specific payload of a node.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    File { content: Vec<u8> },
    Directory { children: BTreeMap<String, NodeId> },
    Symlink { target: String },
    Device { class: DeviceClass, major: u32, minor: u32 },
}

impl NodeKind {
    pub(crate) fn file_kind(&self) -> FileKind {
        match self {
            NodeKind::File { .. } => FileKind::File,
            NodeKind::Directory { .. } => FileKind::Directory,
            NodeKind::Symlink { .. } => FileKind::Symlink,
            NodeKind::Device { .. } => FileKind::Device,
        }
    }
}

/// One entry in the arena.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub ino: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Permission bits only (`0o7777` range); the type comes from `kind`.
    pub mode: u32,
    pub owner: String,
    pub group: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub accessed: DateTime<Utc>,
}

impl Node {
    pub(crate) fn new(ino: NodeId, name: &str, kind: NodeKind, mode: u32, creds: &Credentials) -> Self {
        let now = Utc::now();
        Self {
            ino,
            name: name.to_string(),
            kind,
            mode: mode & 0o7777,
            owner: creds.owner.clone(),
            group: creds.group.clone(),
            created: now,
            modified: now,
            accessed: now,
        }
    }

    pub(crate) fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub(crate) fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeMap<String, NodeId>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    pub(crate) fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::File { content } => content.len() as u64,
            NodeKind::Directory { .. } => DIR_SIZE,
            NodeKind::Symlink { target } => target.len() as u64,
            NodeKind::Device { .. } => 0,
        }
    }

    pub(crate) fn touch_modified(&mut self) {
        let now = Utc::now();
        self.modified = now;
        self.accessed = now;
    }
}

/// Owner and group stamped onto newly created nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub owner: String,
    pub group: String,
}

impl Credentials {
    pub fn new(owner: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
        }
    }

    pub fn root() -> Self {
        Self::new("root", "root")
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::root()
    }
}

/// Metadata about a filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub ino: NodeId,
    pub kind: FileKind,
    pub mode: u32,
    pub owner: String,
    pub group: String,
    pub size: u64,
    pub nlink: u32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub accessed: DateTime<Utc>,
    /// Symlink target, for symlinks.
    pub target: Option<String>,
    /// Device class and numbers, for devices.
    pub device: Option<(DeviceClass, u32, u32)>,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Ten-character mode string, e.g. `drwxr-xr-x` or `drwxrwxrwt`.
    pub fn mode_string(&self) -> String {
        mode_string(self.kind.type_char(self.device.map(|d| d.0)), self.mode)
    }
}

/// Render permission bits the way `ls -l` does.
pub fn mode_string(type_char: char, mode: u32) -> String {
    let mut out = String::with_capacity(10);
    out.push(type_char);

    let specials = [(0o4000, 's', 'S'), (0o2000, 's', 'S'), (0o1000, 't', 'T')];
    for (i, shift) in [6u32, 3, 0].into_iter().enumerate() {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        let exec = bits & 0o1 != 0;
        let (flag, set_exec, set_noexec) = specials[i];
        out.push(match (mode & flag != 0, exec) {
            (true, true) => set_exec,
            (true, false) => set_noexec,
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}

/// One entry from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub meta: Metadata,
}

/// Aggregate size of a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskUsage {
    pub bytes: u64,
    pub files: u64,
    pub directories: u64,
}
