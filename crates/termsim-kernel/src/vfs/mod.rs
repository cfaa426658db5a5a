//! Virtual filesystem.
//!
//! A single in-memory tree of directories, files, symlinks and device
//! stubs. It never touches the host filesystem.
//!
//! # Structure
//!
//! - [`Vfs`]: the tree and every operation on it
//! - [`path`]: lexical resolution (`.`, `..`, `~`, relative to a cwd)
//! - [`Snapshot`]: serde export/import of the whole tree
//! - [`seed_standard_tree`]: the Linux-like layout a session starts with

mod error;
mod node;
pub mod path;
mod seed;
mod snapshot;
mod tree;

pub use error::{VfsError, VfsResult};
pub use node::{
    mode_string, Credentials, DeviceClass, DirEntry, DiskUsage, FileKind, Metadata, NodeId,
    DIR_SIZE,
};
pub use seed::{seed_standard_tree, SeedProfile, KERNEL_RELEASE};
pub use snapshot::{DeviceSpec, Snapshot, SnapshotError, SnapshotNode, SNAPSHOT_VERSION};
pub use tree::{Vfs, MAX_SYMLINK_DEPTH};
