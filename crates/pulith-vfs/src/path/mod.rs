//! The path protocol shared by plain, zip-backed and tar-backed paths.

use std::fmt;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::OpenOptions;
use crate::stream::Stream;

pub mod plain;
pub mod tar;
pub mod zip;

/// Location inside a container as `/`-free segments; empty is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a host or archive path; both `/` and the host separator split
    /// segments, `.` and empty segments are dropped.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut rel = Self::root();
        rel.extend(path.as_ref());
        rel
    }

    fn extend(&mut self, path: &Path) {
        for component in path.components() {
            match component {
                Component::Normal(s) => {
                    let s = s.to_string_lossy();
                    self.segments.extend(
                        s.split('/')
                            .filter(|seg| !seg.is_empty() && *seg != ".")
                            .map(str::to_owned),
                    );
                }
                Component::ParentDir => self.segments.push("..".to_owned()),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn join(&self, path: impl AsRef<Path>) -> Self {
        let mut rel = self.clone();
        rel.extend(path.as_ref());
        rel
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Last segment; empty for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Segments joined with `/`, the form archives use for member names.
    pub fn key(&self) -> String {
        self.segments.join("/")
    }

    /// `key()` plus a trailing `/`, or empty for the root.
    pub(crate) fn dir_prefix(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{}/", self.key())
        }
    }

    pub fn starts_with(&self, base: &RelPath) -> bool {
        self.segments.starts_with(&base.segments)
    }

    pub fn strip_prefix(&self, base: &RelPath) -> Option<RelPath> {
        self.segments
            .strip_prefix(base.segments.as_slice())
            .map(|rest| Self {
                segments: rest.to_vec(),
            })
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.key())
        }
    }
}

impl From<&str> for RelPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for RelPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Stat-like metadata. Container formats fill what they record and use
/// placeholders for the rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stat {
    pub mode: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
    pub uid: u64,
    pub gid: u64,
    pub size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

/// A path that may point into a container.
///
/// Implemented by [`plain::PlainPath`], [`zip::ZipPath`], [`tar::TarPath`]
/// and [`crate::CPath`], so callers can depend on this trait instead of a
/// concrete path type.
pub trait VirtualPath: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display {
    /// Real path of the container file, or of the file itself.
    fn filepath(&self) -> &Path;

    /// Location inside the container; the root for plain paths.
    fn subpath(&self) -> &RelPath;

    fn join(&self, path: impl AsRef<Path>) -> Self;

    /// `None` at the container root. [`CPath`](crate::CPath) steps out to
    /// the directory holding the container instead.
    fn parent(&self) -> Option<Self>;

    fn exists(&self) -> bool;

    /// Fails with [`Error::NotFound`] when the path does not exist.
    fn is_file(&self) -> Result<bool>;

    /// Fails with [`Error::NotFound`] when the path does not exist.
    fn is_dir(&self) -> Result<bool>;

    fn iterdir(&self) -> Result<impl Iterator<Item = Self>>;

    /// Shell-style match of `pattern` against paths below this one.
    fn glob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>>;

    /// Right-anchored match of `pattern` against every descendant.
    fn rglob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>>;

    fn open(&self, options: &OpenOptions) -> Result<Stream>;

    fn stat(&self) -> Result<Stat>;

    /// Container path followed by the segments inside it.
    fn as_path(&self) -> PathBuf {
        let mut path = self.filepath().to_path_buf();
        path.extend(self.subpath().segments());
        path
    }

    fn name(&self) -> String {
        if self.subpath().is_root() {
            self.filepath()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            self.subpath().name().to_owned()
        }
    }

    fn stem(&self) -> String {
        let name = self.name();
        match suffix_start(&name) {
            Some(i) => name[..i].to_owned(),
            None => name,
        }
    }

    fn suffix(&self) -> String {
        let name = self.name();
        suffix_start(&name).map_or_else(String::new, |i| name[i..].to_owned())
    }

    fn suffixes(&self) -> Vec<String> {
        let name = self.name();
        if name.ends_with('.') {
            return Vec::new();
        }
        name.trim_start_matches('.')
            .split('.')
            .skip(1)
            .map(|s| format!(".{s}"))
            .collect()
    }

    fn parts(&self) -> Vec<String> {
        self.as_path()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    }

    fn relative_to(&self, base: &Self) -> Result<RelPath> {
        let not_relative = || Error::NotRelative {
            path: self.as_path(),
            base: base.as_path(),
        };
        if self.filepath() != base.filepath() {
            return Err(not_relative());
        }
        self.subpath()
            .strip_prefix(base.subpath())
            .ok_or_else(not_relative)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.open(&OpenOptions::binary())?.read_bytes()?)
    }

    fn read_text(&self) -> Result<String> {
        Ok(self.open(&OpenOptions::text())?.read_text()?)
    }
}

fn suffix_start(name: &str) -> Option<usize> {
    let i = name.rfind('.')?;
    (i > 0 && i < name.len() - 1).then_some(i)
}

/// Equality, ordering, hashing and formatting for container-backed paths,
/// which compare by `(filepath, rpath)` and never by the shared handle.
macro_rules! container_path_identity {
    ($ty:ident) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.filepath == other.filepath && self.rpath == other.rpath
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                (&self.filepath, &self.rpath).cmp(&(&other.filepath, &other.rpath))
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.filepath.hash(state);
                self.rpath.hash(state);
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", $crate::path::VirtualPath::as_path(self).display())
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("filepath", &self.filepath)
                    .field("rpath", &self.rpath)
                    .finish()
            }
        }
    };
}

/// `path / "segment"` for any path type.
macro_rules! path_division {
    ($ty:ty) => {
        impl<P: AsRef<std::path::Path>> std::ops::Div<P> for &$ty {
            type Output = $ty;

            fn div(self, rhs: P) -> $ty {
                $crate::path::VirtualPath::join(self, rhs)
            }
        }

        impl<P: AsRef<std::path::Path>> std::ops::Div<P> for $ty {
            type Output = $ty;

            fn div(self, rhs: P) -> $ty {
                $crate::path::VirtualPath::join(&self, rhs)
            }
        }
    };
}

pub(crate) use container_path_identity;
pub(crate) use path_division;
