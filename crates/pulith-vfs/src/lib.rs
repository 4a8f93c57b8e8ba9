//! Path-like, read-only access to tar and zip containers and to
//! single-stream compressed files.
//!
//! ```no_run
//! use pulith_vfs::{CPath, VirtualPath};
//!
//! # fn main() -> pulith_vfs::Result<()> {
//! let root = CPath::new("export.tar.gz")?;
//! for entry in (&root / "gdpr_export").iterdir()? {
//!     println!("{entry}");
//! }
//! let text = (&root / "gdpr_export/messages/index.csv").read_text()?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `format.rs` - Suffix classification and codec decoders
//! - `decompress.rs` - Opening single-stream compressed files
//! - `tree.rs` - Member index built from flat archive names
//! - `path/` - The `VirtualPath` protocol and its plain/zip/tar implementations
//! - `cpath.rs` - Suffix-routed facade over the path kinds
//! - `walk.rs` - Resumable walk with pruning
//! - `fnmatch.rs` - Shell-style matching for `glob`/`rglob`

pub use cpath::CPath;
pub use error::{Error, Result};
pub use format::{Codec, Decoder, PathKind, TarCompress, classify, is_compressed};
pub use options::{Encoding, Mode, OpenOptions};
pub use path::plain::PlainPath;
pub use path::tar::{TarContainer, TarEntry, TarPath};
pub use path::zip::{ZipContainer, ZipPath};
pub use path::{RelPath, Stat, VirtualPath};
pub use stream::{Stream, TextStream};
pub use walk::{Walk, WalkLevel};

pub mod decompress;
pub mod fnmatch;
pub mod options;
pub mod path;
pub mod tree;
mod cpath;
mod error;
mod format;
mod stream;
mod walk;
