use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::decompress;
use crate::error::{Error, Result};
use crate::fnmatch::{fnmatch, match_path};
use crate::format::{PathKind, classify_path};
use crate::options::OpenOptions;
use crate::path::{RelPath, Stat, VirtualPath, path_division};
use crate::stream::Stream;

static ROOT: RelPath = RelPath::root();

/// An ordinary filesystem path whose `open` decompresses by suffix.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlainPath {
    path: PathBuf,
}

impl PlainPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn kind(&self) -> PathKind {
        classify_path(&self.path)
    }

    pub fn as_std_path(&self) -> &Path {
        &self.path
    }

    fn require_exists(&self) -> Result<()> {
        if self.path.exists() {
            Ok(())
        } else {
            Err(Error::NotFound {
                path: self.path.clone(),
            })
        }
    }

    /// Every path below this directory with its `/`-joined relative form,
    /// directory by directory, names sorted. Symlinked directories are not
    /// followed.
    fn descendants(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut out = Vec::new();
        let mut stack = vec![(String::new(), self.path.clone())];
        while let Some((prefix, dir)) = stack.pop() {
            let mut entries = fs::read_dir(&dir)?.collect::<io::Result<Vec<_>>>()?;
            entries.sort_by_key(|e| e.file_name());
            let mut subdirs = Vec::new();
            for entry in entries {
                let name = entry.file_name().to_string_lossy().into_owned();
                let rel = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}/{name}")
                };
                if entry.file_type()?.is_dir() {
                    subdirs.push((rel.clone(), entry.path()));
                }
                out.push((rel, entry.path()));
            }
            stack.extend(subdirs.into_iter().rev());
        }
        Ok(out)
    }
}

impl VirtualPath for PlainPath {
    fn filepath(&self) -> &Path {
        &self.path
    }

    fn subpath(&self) -> &RelPath {
        &ROOT
    }

    fn join(&self, path: impl AsRef<Path>) -> Self {
        Self::new(self.path.join(path))
    }

    fn parent(&self) -> Option<Self> {
        self.path.parent().map(Self::new)
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_file(&self) -> Result<bool> {
        self.require_exists()?;
        Ok(self.path.is_file())
    }

    fn is_dir(&self) -> Result<bool> {
        self.require_exists()?;
        Ok(self.path.is_dir())
    }

    fn iterdir(&self) -> Result<impl Iterator<Item = Self>> {
        if !self.is_dir()? {
            return Err(Error::NotADirectory {
                path: self.path.clone(),
            });
        }
        let mut children = fs::read_dir(&self.path)?
            .map(|entry| entry.map(|e| Self::new(e.path())))
            .collect::<io::Result<Vec<_>>>()?;
        children.sort();
        Ok(children.into_iter())
    }

    fn glob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        let matched = self
            .descendants()?
            .into_iter()
            .filter(|(rel, _)| fnmatch(pattern, rel))
            .map(|(_, path)| Self::new(path));
        Ok(matched.collect::<Vec<_>>().into_iter())
    }

    fn rglob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        let matched = self
            .descendants()?
            .into_iter()
            .filter(|(rel, _)| match_path(rel, pattern))
            .map(|(_, path)| Self::new(path));
        Ok(matched.collect::<Vec<_>>().into_iter())
    }

    fn open(&self, options: &OpenOptions) -> Result<Stream> {
        if self.kind().is_container() {
            // Only reachable when the container file is missing; an existing
            // one would have been routed to its container path.
            self.require_exists()?;
        }
        if let Some(size) = options.buffering {
            tracing::warn!(
                path = %self.path.display(),
                buffering = size,
                "buffering is not supported for compressed paths, ignoring"
            );
            let options = OpenOptions {
                buffering: None,
                ..options.clone()
            };
            return decompress::open(&self.path, &options);
        }
        decompress::open(&self.path, options)
    }

    fn stat(&self) -> Result<Stat> {
        let meta = fs::metadata(&self.path)?;
        Ok(stat_from_metadata(&meta))
    }
}

#[cfg(unix)]
fn stat_from_metadata(meta: &fs::Metadata) -> Stat {
    use std::os::unix::fs::MetadataExt;
    Stat {
        mode: meta.mode(),
        ino: meta.ino(),
        dev: meta.dev(),
        nlink: meta.nlink(),
        uid: u64::from(meta.uid()),
        gid: u64::from(meta.gid()),
        size: meta.size(),
        atime: meta.atime(),
        mtime: meta.mtime(),
        ctime: meta.ctime(),
    }
}

#[cfg(not(unix))]
fn stat_from_metadata(meta: &fs::Metadata) -> Stat {
    let secs = |t: io::Result<std::time::SystemTime>| {
        t.ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64)
    };
    let mtime = secs(meta.modified());
    Stat {
        nlink: 1,
        size: meta.len(),
        atime: secs(meta.accessed()),
        mtime,
        ctime: secs(meta.created()),
        ..Stat::default()
    }
}

impl fmt::Display for PlainPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<PathBuf> for PlainPath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

path_division!(PlainPath);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_protocol() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.json"), "{}").unwrap();
        fs::write(dir.path().join("b.txt"), "bee").unwrap();

        let root = PlainPath::new(dir.path());
        assert!(root.exists());
        assert!(root.is_dir().unwrap());

        let b = &root / "b.txt";
        assert!(b.is_file().unwrap());
        assert_eq!(b.read_text().unwrap(), "bee");
        assert_eq!(b.stat().unwrap().size, 3);
        assert_eq!(b.parent().unwrap(), root);

        let children: Vec<String> = root.iterdir().unwrap().map(|p| p.name()).collect();
        assert_eq!(children, ["b.txt", "sub"]);

        let jsons: Vec<PlainPath> = root.rglob("*.json").unwrap().collect();
        assert_eq!(jsons, [&root / "sub" / "a.json"]);

        let globbed: Vec<PlainPath> = root.glob("sub/*").unwrap().collect();
        assert_eq!(globbed, [&root / "sub/a.json"]);
    }

    #[test]
    fn missing_plain_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = PlainPath::new(dir.path().join("nope.zip"));
        assert!(!missing.exists());
        assert!(matches!(missing.is_dir(), Err(Error::NotFound { .. })));
        assert!(matches!(
            missing.open(&OpenOptions::new()),
            Err(Error::NotFound { .. })
        ));
        assert!(!(&missing / "path/in/archive").exists());
    }

    #[test]
    fn buffering_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = PlainPath::new(dir.path().join("file"));
        fs::write(path.as_std_path(), "text").unwrap();
        let mut stream = path.open(&OpenOptions::new().buffering(1)).unwrap();
        assert_eq!(stream.read_text().unwrap(), "text");
    }

    #[test]
    fn name_accessors() {
        let p = PlainPath::new("/data/comments.json.gz");
        assert_eq!(p.name(), "comments.json.gz");
        assert_eq!(p.stem(), "comments.json");
        assert_eq!(p.suffix(), ".gz");
        assert_eq!(p.suffixes(), [".json", ".gz"]);
    }
}
