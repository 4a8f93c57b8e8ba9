use std::fmt;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::format::{PathKind, classify_path};
use crate::options::OpenOptions;
use crate::path::plain::PlainPath;
use crate::path::tar::TarPath;
use crate::path::zip::ZipPath;
use crate::path::{RelPath, Stat, VirtualPath, path_division};
use crate::stream::Stream;

/// A path that is routed to a container by its suffix.
///
/// Existing `.zip` and tar files become [`ZipPath`] / [`TarPath`] roots;
/// everything else, including container names that do not exist yet, is a
/// [`PlainPath`]. Paths derived from a plain path (`/`, `parent`, `iterdir`,
/// `glob`, `rglob`) are routed the same way, so walking a real directory
/// steps into the archives found there.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CPath {
    Plain(PlainPath),
    Zip(ZipPath),
    Tar(TarPath),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            CPath::Plain($p) => $body,
            CPath::Zip($p) => $body,
            CPath::Tar($p) => $body,
        }
    };
}

impl CPath {
    /// Classify `path` and open the container it names, if any.
    ///
    /// A path below an existing container file (`export.zip/a/b`) resolves
    /// to that location inside the container. Fails only when an existing
    /// container cannot be read.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::resolve(path)?.unwrap_or_else(|| Self::Plain(PlainPath::new(path))))
    }

    /// Route a plain path the way [`CPath::new`] would.
    ///
    /// A container that cannot be read stays plain; the failure surfaces
    /// again when the path is opened.
    pub fn from_plain(path: PlainPath) -> Self {
        match Self::resolve(path.as_std_path()) {
            Ok(Some(routed)) => routed,
            Ok(None) => Self::Plain(path),
            Err(err) => {
                warn!(
                    path = %path,
                    error = %err,
                    "container could not be opened, keeping plain path"
                );
                Self::Plain(path)
            }
        }
    }

    fn resolve(path: &Path) -> Result<Option<Self>> {
        if let Some(root) = Self::open_container(path)? {
            return Ok(Some(root));
        }
        if path.exists() {
            return Ok(None);
        }
        for ancestor in path.ancestors().skip(1) {
            if let Some(root) = Self::open_container(ancestor)? {
                let inner = path.strip_prefix(ancestor).unwrap_or(path);
                return Ok(Some(root.join(inner)));
            }
        }
        Ok(None)
    }

    fn open_container(path: &Path) -> Result<Option<Self>> {
        Ok(match classify_path(path) {
            PathKind::Zip if path.is_file() => Some(Self::Zip(ZipPath::new(path)?)),
            PathKind::Tar(compression) if path.is_file() => {
                Some(Self::Tar(TarPath::with_compression(path, compression)?))
            }
            _ => None,
        })
    }

    pub fn kind(&self) -> PathKind {
        match self {
            Self::Plain(p) => p.kind(),
            Self::Zip(_) => PathKind::Zip,
            Self::Tar(p) => PathKind::Tar(p.container().compression()),
        }
    }

    pub fn as_zip(&self) -> Option<&ZipPath> {
        match self {
            Self::Zip(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_tar(&self) -> Option<&TarPath> {
        match self {
            Self::Tar(p) => Some(p),
            _ => None,
        }
    }
}

fn routed<P: Into<CPath>>(iter: impl Iterator<Item = P>) -> std::vec::IntoIter<CPath> {
    iter.map(|p| match p.into() {
        CPath::Plain(plain) => CPath::from_plain(plain),
        other => other,
    })
    .collect::<Vec<_>>()
    .into_iter()
}

impl VirtualPath for CPath {
    fn filepath(&self) -> &Path {
        dispatch!(self, p => p.filepath())
    }

    fn subpath(&self) -> &RelPath {
        dispatch!(self, p => p.subpath())
    }

    fn join(&self, path: impl AsRef<Path>) -> Self {
        match self {
            Self::Plain(p) => Self::from_plain(p.join(path)),
            Self::Zip(p) => Self::Zip(p.join(path)),
            Self::Tar(p) => Self::Tar(p.join(path)),
        }
    }

    /// At a container root this is the directory holding the container.
    fn parent(&self) -> Option<Self> {
        let outside =
            |file: &Path| file.parent().map(|dir| Self::from_plain(PlainPath::new(dir)));
        match self {
            Self::Plain(p) => p.parent().map(Self::from_plain),
            Self::Zip(p) => p.parent().map(Self::Zip).or_else(|| outside(p.filepath())),
            Self::Tar(p) => p.parent().map(Self::Tar).or_else(|| outside(p.filepath())),
        }
    }

    fn exists(&self) -> bool {
        dispatch!(self, p => p.exists())
    }

    fn is_file(&self) -> Result<bool> {
        dispatch!(self, p => p.is_file())
    }

    fn is_dir(&self) -> Result<bool> {
        dispatch!(self, p => p.is_dir())
    }

    fn iterdir(&self) -> Result<impl Iterator<Item = Self>> {
        Ok(dispatch!(self, p => routed(p.iterdir()?)))
    }

    fn glob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        Ok(dispatch!(self, p => routed(p.glob(pattern)?)))
    }

    fn rglob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        Ok(dispatch!(self, p => routed(p.rglob(pattern)?)))
    }

    fn open(&self, options: &OpenOptions) -> Result<Stream> {
        dispatch!(self, p => p.open(options))
    }

    fn stat(&self) -> Result<Stat> {
        dispatch!(self, p => p.stat())
    }
}

impl fmt::Display for CPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, p => fmt::Display::fmt(p, f))
    }
}

impl From<PlainPath> for CPath {
    fn from(p: PlainPath) -> Self {
        Self::Plain(p)
    }
}

impl From<ZipPath> for CPath {
    fn from(p: ZipPath) -> Self {
        Self::Zip(p)
    }
}

impl From<TarPath> for CPath {
    fn from(p: TarPath) -> Self {
        Self::Tar(p)
    }
}

path_division!(CPath);
