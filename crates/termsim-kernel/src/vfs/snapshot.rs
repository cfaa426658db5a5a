//! Whole-tree export and import.
//!
//! A [`Snapshot`] is a plain serde tree: file content is base64 so the JSON
//! form survives binary data. Inode numbers are not part of a snapshot;
//! importing assigns fresh ones.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::{DeviceClass, FileKind, Node, NodeId, NodeKind};
use super::path;
use super::tree::Vfs;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors while decoding or importing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot root must be a directory")]
    RootNotDirectory,

    #[error("{0}: invalid entry name")]
    InvalidName(String),

    #[error("{0}: only directories can have children")]
    ChildrenOnNonDirectory(String),

    #[error("{path}: invalid base64 content: {source}")]
    Content {
        path: String,
        source: base64::DecodeError,
    },

    #[error("{0}: symlink without a target")]
    MissingTarget(String),

    #[error("{0}: device without class and numbers")]
    MissingDevice(String),
}

/// Device numbers as stored in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub class: DeviceClass,
    pub major: u32,
    pub minor: u32,
}

/// One node of an exported tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub kind: FileKind,
    pub mode: u32,
    pub owner: String,
    pub group: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub accessed: DateTime<Utc>,
    /// Base64 file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, SnapshotNode>,
}

/// A complete, serializable copy of a [`Vfs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub root: SnapshotNode,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}

impl Vfs {
    /// Serialize the whole tree.
    pub fn export(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            root: self.export_node(self.root),
        }
    }

    fn export_node(&self, id: NodeId) -> SnapshotNode {
        let Some(node) = self.get(id) else {
            return empty_directory();
        };

        let mut out = SnapshotNode {
            kind: node.kind.file_kind(),
            mode: node.mode,
            owner: node.owner.clone(),
            group: node.group.clone(),
            created: node.created,
            modified: node.modified,
            accessed: node.accessed,
            content: None,
            target: None,
            device: None,
            children: BTreeMap::new(),
        };
        match &node.kind {
            NodeKind::File { content } => out.content = Some(STANDARD.encode(content)),
            NodeKind::Symlink { target } => out.target = Some(target.clone()),
            NodeKind::Device { class, major, minor } => {
                out.device = Some(DeviceSpec {
                    class: *class,
                    major: *major,
                    minor: *minor,
                })
            }
            NodeKind::Directory { children } => {
                out.children = children
                    .iter()
                    .map(|(name, &child)| (name.clone(), self.export_node(child)))
                    .collect();
            }
        }
        out
    }

    /// Replace the whole tree with a snapshot.
    ///
    /// The new tree is built on the side and swapped in only when the
    /// snapshot is entirely valid; on error the current tree is unchanged.
    /// Creation credentials are kept.
    pub fn import(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        if snapshot.root.kind != FileKind::Directory {
            return Err(SnapshotError::RootNotDirectory);
        }

        let mut fresh = Vfs::new();
        fresh.set_credentials(self.credentials().clone());
        let placeholder = fresh.root;
        let root = build(&mut fresh, &snapshot.root, "", "/")?;
        fresh.nodes.remove(&placeholder);
        fresh.root = root;

        *self = fresh;
        tracing::debug!(nodes = self.node_count(), "vfs imported snapshot");
        Ok(())
    }
}

fn build(vfs: &mut Vfs, snap: &SnapshotNode, name: &str, at: &str) -> Result<NodeId, SnapshotError> {
    if snap.kind != FileKind::Directory && !snap.children.is_empty() {
        return Err(SnapshotError::ChildrenOnNonDirectory(at.to_string()));
    }

    let kind = match snap.kind {
        FileKind::File => {
            let content = match &snap.content {
                Some(encoded) => STANDARD.decode(encoded).map_err(|source| SnapshotError::Content {
                    path: at.to_string(),
                    source,
                })?,
                None => Vec::new(),
            };
            NodeKind::File { content }
        }
        FileKind::Symlink => NodeKind::Symlink {
            target: snap
                .target
                .clone()
                .ok_or_else(|| SnapshotError::MissingTarget(at.to_string()))?,
        },
        FileKind::Device => {
            let spec = snap
                .device
                .ok_or_else(|| SnapshotError::MissingDevice(at.to_string()))?;
            NodeKind::Device {
                class: spec.class,
                major: spec.major,
                minor: spec.minor,
            }
        }
        FileKind::Directory => {
            let mut children = BTreeMap::new();
            for (child_name, child) in &snap.children {
                let child_path = path::join(at, child_name);
                if !path::is_valid_name(child_name) {
                    return Err(SnapshotError::InvalidName(child_path));
                }
                let id = build(vfs, child, child_name, &child_path)?;
                children.insert(child_name.clone(), id);
            }
            NodeKind::Directory { children }
        }
    };

    let id = vfs.alloc(name, kind, snap.mode);
    if let Some(node) = vfs.nodes.get_mut(&id) {
        restore_attributes(node, snap);
    }
    Ok(id)
}

fn restore_attributes(node: &mut Node, snap: &SnapshotNode) {
    node.owner = snap.owner.clone();
    node.group = snap.group.clone();
    node.created = snap.created;
    node.modified = snap.modified;
    node.accessed = snap.accessed;
}

fn empty_directory() -> SnapshotNode {
    let now = Utc::now();
    SnapshotNode {
        kind: FileKind::Directory,
        mode: 0o755,
        owner: "root".into(),
        group: "root".into(),
        created: now,
        modified: now,
        accessed: now,
        content: None,
        target: None,
        device: None,
        children: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vfs {
        let mut vfs = Vfs::new();
        vfs.mkdir("/etc", false).unwrap();
        vfs.write("/etc/hosts", b"127.0.0.1 localhost\n", false).unwrap();
        vfs.write("/etc/blob", &[0, 159, 255, 10], false).unwrap();
        vfs.symlink("/etc/hosts", "/hosts").unwrap();
        vfs.mkdir("/dev", false).unwrap();
        vfs.create_device("/dev/sda", DeviceClass::Block, 8, 0, 0o660).unwrap();
        vfs.chown("/etc/hosts", Some("user"), Some("user")).unwrap();
        vfs.chmod("/etc/hosts", 0o600).unwrap();
        vfs
    }

    #[test]
    fn import_reproduces_the_tree() {
        let original = sample();
        let snapshot = original.export();

        let mut restored = Vfs::new();
        restored.import(&snapshot).unwrap();
        assert_eq!(restored.export(), snapshot);

        assert_eq!(restored.read("/etc/blob").unwrap(), vec![0, 159, 255, 10]);
        assert_eq!(restored.readlink("/hosts").unwrap(), "/etc/hosts");
        let meta = restored.stat("/etc/hosts").unwrap();
        assert_eq!((meta.owner.as_str(), meta.mode), ("user", 0o600));
        assert_eq!(
            restored.stat("/dev/sda").unwrap().device,
            Some((DeviceClass::Block, 8, 0))
        );
    }

    #[test]
    fn json_round_trip_preserves_timestamps() {
        let snapshot = sample().export();
        let json = snapshot.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn invalid_snapshot_leaves_tree_alone() {
        let mut vfs = sample();
        let before = vfs.export();

        let mut broken = before.clone();
        if let Some(etc) = broken.root.children.get_mut("etc") {
            if let Some(hosts) = etc.children.get_mut("hosts") {
                hosts.content = Some("%%% not base64".into());
            }
        }

        assert!(matches!(vfs.import(&broken), Err(SnapshotError::Content { .. })));
        assert_eq!(vfs.export(), before);
    }

    #[test]
    fn rejects_children_on_files() {
        let mut snapshot = sample().export();
        let file = snapshot.root.children["etc"].children["hosts"].clone();
        if let Some(etc) = snapshot.root.children.get_mut("etc") {
            if let Some(blob) = etc.children.get_mut("blob") {
                blob.children.insert("nested".into(), file);
            }
        }
        let err = Vfs::new().import(&snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::ChildrenOnNonDirectory(p) if p == "/etc/blob"));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut snapshot = sample().export();
        snapshot.version = 99;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion(99))
        ));
    }
}
