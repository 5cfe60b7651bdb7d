//! # Berry lockfile
//!
//! Decode a yarn berry `yarn.lock`, resolve packages against it, cut it down
//! to the packages a set of workspaces needs and write it back out in the
//! exact layout yarn expects.
//!
//! ```
//! use berry_lockfile::{BerryLockfile, transitive_closure};
//!
//! let contents = br#"
//! "app@workspace:.":
//!   version: 0.0.0-use.local
//!   dependencies:
//!     ms: ^2.1.0
//!
//! "ms@npm:^2.1.0":
//!   version: 2.1.3
//! "#;
//! let lockfile = BerryLockfile::decode(contents).unwrap();
//! let keys: Vec<String> = transitive_closure(&lockfile, ["app@workspace:."])
//!   .into_iter()
//!   .collect();
//!
//! let mut pruned = Vec::new();
//! lockfile.subgraph(&keys).encode(&mut pruned).unwrap();
//! ```
#![deny(clippy::all)]
pub mod berry;
pub mod closure;
pub mod decode;
pub mod encode;
pub mod entry;
pub mod error;
pub mod ident;
pub mod lockfile;
pub mod metadata;
pub mod parse;
pub mod resolve;

pub use berry::BerryLockfile;
pub use closure::transitive_closure;
pub use entry::Entry;
pub use error::{DecodeError, EncodeError};
pub use ident::{Descriptor, Ident};
pub use lockfile::Lockfile;
pub use metadata::Metadata;
pub use resolve::{BerryKeyPolicy, KeyPolicy, ResolvedPackage};
