use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, trace};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::fnmatch::{fnmatch, match_path};
use crate::options::OpenOptions;
use crate::path::{RelPath, Stat, VirtualPath, container_path_identity, path_division};
use crate::stream::Stream;
use crate::tree::{Tree, TreeBuilder};
use crate::walk::Walk;

/// Owner and group reported for every zip member.
const PLACEHOLDER_ID: u64 = 1000;

/// An opened zip file and its flat member list.
pub struct ZipContainer {
    path: PathBuf,
    archive: Mutex<ZipArchive<File>>,
    /// Central-directory order, then directories only implied by members.
    names: Vec<String>,
    members: HashSet<String>,
}

impl ZipContainer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let archive = ZipArchive::new(File::open(&path)?)?;
        let mut names: Vec<String> = (0..archive.len())
            .filter_map(|i| archive.name_for_index(i))
            .map(str::to_owned)
            .collect();
        let explicit = names.len();
        let implied = implied_dirs(&names);
        names.extend(implied);
        debug!(
            path = %path.display(),
            members = explicit,
            implied = names.len() - explicit,
            "indexed zip container"
        );
        Ok(Self {
            path,
            archive: Mutex::new(archive),
            members: names.iter().cloned().collect(),
            names,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }
}

/// Every `a/`, `a/b/` ancestor of a member that is not itself listed.
fn implied_dirs(names: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut implied = Vec::new();
    for name in names {
        let trimmed = name.trim_end_matches('/');
        for (i, _) in trimmed.match_indices('/') {
            let dir = &name[..=i];
            if seen.insert(dir) {
                implied.push(dir.to_owned());
            }
        }
    }
    implied
}

/// A location inside a zip file.
///
/// Membership is answered from the container's name list on each call; no
/// tree is kept between calls.
#[derive(Clone)]
pub struct ZipPath {
    container: Arc<ZipContainer>,
    filepath: PathBuf,
    rpath: RelPath,
}

container_path_identity!(ZipPath);
path_division!(ZipPath);

impl ZipPath {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let container = Arc::new(ZipContainer::open(path)?);
        Ok(Self {
            filepath: container.path.clone(),
            container,
            rpath: RelPath::root(),
        })
    }

    pub fn container(&self) -> &Arc<ZipContainer> {
        &self.container
    }

    /// The same location with an absolute container path.
    pub fn absolute(&self) -> Result<Self> {
        Ok(Self {
            filepath: std::path::absolute(&self.filepath)?,
            ..self.clone()
        })
    }

    /// Depth-first walk below this directory, names sorted at each level.
    pub fn walk(&self) -> Result<Walk<ZipPath, ()>> {
        if !self.is_dir()? {
            return Err(Error::NotADirectory {
                path: self.as_path(),
            });
        }
        let prefix = self.rpath.dir_prefix();
        let mut below: Vec<&str> = self
            .container
            .names
            .iter()
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty())
            .collect();
        below.sort_unstable();
        let tree = TreeBuilder::from_paths(below);
        Ok(Walk::new(self.clone(), Arc::new(tree), Tree::<()>::ROOT))
    }

    fn at(&self, rpath: RelPath) -> Self {
        Self {
            container: Arc::clone(&self.container),
            filepath: self.filepath.clone(),
            rpath,
        }
    }

    fn require_exists(&self) -> Result<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(Error::NotFound {
                path: self.as_path(),
            })
        }
    }

    /// Names strictly below this path, each with its remainder after the
    /// prefix and without a trailing `/`.
    fn descendants(&self) -> impl Iterator<Item = (&str, &str)> {
        let prefix = self.rpath.dir_prefix();
        self.container.names.iter().filter_map(move |name| {
            let rest = name.strip_prefix(prefix.as_str())?.trim_end_matches('/');
            (!rest.is_empty()).then_some((name.trim_end_matches('/'), rest))
        })
    }
}

impl VirtualPath for ZipPath {
    fn filepath(&self) -> &Path {
        &self.filepath
    }

    fn subpath(&self) -> &RelPath {
        &self.rpath
    }

    fn join(&self, path: impl AsRef<Path>) -> Self {
        self.at(self.rpath.join(path))
    }

    fn parent(&self) -> Option<Self> {
        self.rpath.parent().map(|rpath| self.at(rpath))
    }

    fn exists(&self) -> bool {
        if self.rpath.is_root() {
            return self.filepath.exists();
        }
        self.container.contains(&self.rpath.key()) || self.container.contains(&self.rpath.dir_prefix())
    }

    fn is_file(&self) -> Result<bool> {
        self.require_exists()?;
        Ok(!self.rpath.is_root() && self.container.contains(&self.rpath.key()))
    }

    fn is_dir(&self) -> Result<bool> {
        self.require_exists()?;
        Ok(self.rpath.is_root() || self.container.contains(&self.rpath.dir_prefix()))
    }

    fn iterdir(&self) -> Result<impl Iterator<Item = Self>> {
        if !self.is_dir()? {
            return Err(Error::NotADirectory {
                path: self.as_path(),
            });
        }
        Ok(self
            .descendants()
            .filter(|(_, rest)| !rest.contains('/'))
            .map(|(name, _)| self.at(RelPath::new(name))))
    }

    fn glob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        let pattern = format!("{}{pattern}", self.rpath.dir_prefix());
        let matched: Vec<Self> = self
            .container
            .names
            .iter()
            .map(|name| name.trim_end_matches('/'))
            .filter(|name| fnmatch(&pattern, name))
            .map(|name| self.at(RelPath::new(name)))
            .collect();
        Ok(matched.into_iter())
    }

    fn rglob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        let matched: Vec<Self> = self
            .descendants()
            .filter(|(_, rest)| match_path(rest, pattern))
            .map(|(name, _)| self.at(RelPath::new(name)))
            .collect();
        Ok(matched.into_iter())
    }

    fn open(&self, options: &OpenOptions) -> Result<Stream> {
        options.check_read_only()?;
        if !self.is_file()? {
            return Err(Error::NotAFile {
                path: self.as_path(),
            });
        }
        let name = self.rpath.key();
        let mut archive = self
            .container
            .archive
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut member = archive.by_name(&name)?;
        let mut data = Vec::with_capacity(usize::try_from(member.size()).unwrap_or(0));
        member.read_to_end(&mut data)?;
        trace!(member = %name, size = data.len(), "extracted zip member");
        Ok(Stream::new(Cursor::new(data), options))
    }

    fn stat(&self) -> Result<Stat> {
        let not_found = || Error::NotFound {
            path: self.as_path(),
        };
        let mut archive = self
            .container
            .archive
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let index = [self.rpath.key(), self.rpath.dir_prefix()]
            .iter()
            .filter(|name| !name.is_empty())
            .find_map(|name| archive.index_for_name(name))
            .ok_or_else(not_found)?;
        let member = archive.by_index(index).map_err(|e| match e {
            ZipError::FileNotFound => not_found(),
            e => e.into(),
        })?;
        let mtime = member
            .last_modified()
            .and_then(|dt| {
                NaiveDate::from_ymd_opt(
                    i32::from(dt.year()),
                    u32::from(dt.month()),
                    u32::from(dt.day()),
                )?
                .and_hms_opt(
                    u32::from(dt.hour()),
                    u32::from(dt.minute()),
                    u32::from(dt.second()),
                )
            })
            .map_or(0, |naive| naive.and_utc().timestamp());
        Ok(Stat {
            nlink: 1,
            uid: PLACEHOLDER_ID,
            gid: PLACEHOLDER_ID,
            atime: mtime,
            mtime,
            ctime: mtime,
            ..Stat::default()
        })
    }
}
