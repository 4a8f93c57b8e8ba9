use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::fnmatch::{fnmatch, match_path};
use crate::format::{PathKind, TarCompress, classify_path};
use crate::options::OpenOptions;
use crate::path::{RelPath, Stat, VirtualPath, container_path_identity, path_division};
use crate::stream::Stream;
use crate::tree::{NodeId, NodeKind, Tree, TreeBuilder};
use crate::walk::Walk;

/// Header fields recorded for each tar member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TarEntry {
    /// Offset of the member data in the decompressed stream.
    pub offset: u64,
    pub size: u64,
    pub mtime: u64,
    pub mode: u32,
    pub uid: u64,
    pub gid: u64,
}

/// An opened tar file and its member index, shared by every derived path.
pub struct TarContainer {
    path: PathBuf,
    compression: TarCompress,
    file: Mutex<File>,
    tree: Arc<Tree<TarEntry>>,
}

impl TarContainer {
    pub fn open(path: impl AsRef<Path>, compression: TarCompress) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let tree = index(&mut file, compression)?;
        debug!(
            path = %path.display(),
            ?compression,
            members = tree.len(),
            "indexed tar container"
        );
        Ok(Self {
            path,
            compression,
            file: Mutex::new(file),
            tree: Arc::new(tree),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> TarCompress {
        self.compression
    }

    pub fn tree(&self) -> &Tree<TarEntry> {
        &self.tree
    }

    /// Read one member's data into memory.
    ///
    /// Uncompressed tars seek straight to the data; compressed ones are
    /// decoded from the start and the preceding bytes discarded.
    fn read_member(&self, entry: &TarEntry) -> Result<Vec<u8>> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        match self.compression {
            TarCompress::None => {
                file.seek(SeekFrom::Start(entry.offset))?;
                read_exact_len(&mut *file, entry.size)
            }
            compression => {
                file.seek(SeekFrom::Start(0))?;
                let mut decoder = compression.decoder(&mut *file)?;
                let skipped = io::copy(&mut (&mut decoder).take(entry.offset), &mut io::sink())?;
                if skipped < entry.offset {
                    return Err(truncated().into());
                }
                read_exact_len(&mut decoder, entry.size)
            }
        }
    }
}

fn index(file: &mut File, compression: TarCompress) -> Result<Tree<TarEntry>> {
    let mut archive = tar::Archive::new(compression.decoder(file)?);
    let mut builder = TreeBuilder::new();
    for entry in archive.entries()? {
        let entry = entry?;
        let header = entry.header();
        let entry_type = header.entry_type();
        if entry_type.is_pax_global_extensions()
            || entry_type.is_pax_local_extensions()
            || entry_type.is_gnu_longname()
            || entry_type.is_gnu_longlink()
        {
            continue;
        }
        let kind = if entry_type.is_dir() {
            NodeKind::Dir
        } else if entry_type.is_file() || entry_type.is_contiguous() || entry_type.is_gnu_sparse()
        {
            NodeKind::File
        } else {
            NodeKind::Other
        };
        let meta = TarEntry {
            offset: entry.raw_file_position(),
            size: entry.size(),
            mtime: header.mtime().unwrap_or(0),
            mode: header.mode().unwrap_or(0),
            uid: header.uid().unwrap_or(0),
            gid: header.gid().unwrap_or(0),
        };
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        builder.push_entry(&name, kind, Some(meta));
    }
    Ok(builder.build())
}

fn read_exact_len(reader: &mut impl Read, size: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
    reader.take(size).read_to_end(&mut buf)?;
    if buf.len() as u64 != size {
        return Err(truncated().into());
    }
    Ok(buf)
}

fn truncated() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "tar member data is truncated")
}

/// A location inside a tar file.
///
/// All paths derived from one [`TarPath::new`] share the opened file and
/// its index; `join` and `parent` never re-read the container.
#[derive(Clone)]
pub struct TarPath {
    container: Arc<TarContainer>,
    filepath: PathBuf,
    rpath: RelPath,
    node: Option<NodeId>,
}

container_path_identity!(TarPath);
path_division!(TarPath);

impl TarPath {
    /// Open a tar file, taking the compression from its suffix.
    ///
    /// Names without a tar suffix are read as uncompressed tar.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let compression = match classify_path(path.as_ref()) {
            PathKind::Tar(compression) => compression,
            _ => TarCompress::None,
        };
        Self::with_compression(path, compression)
    }

    pub fn with_compression(path: impl AsRef<Path>, compression: TarCompress) -> Result<Self> {
        let container = Arc::new(TarContainer::open(path, compression)?);
        Ok(Self {
            filepath: container.path.clone(),
            container,
            rpath: RelPath::root(),
            node: Some(Tree::<TarEntry>::ROOT),
        })
    }

    pub fn container(&self) -> &Arc<TarContainer> {
        &self.container
    }

    /// The same location with an absolute container path.
    pub fn absolute(&self) -> Result<Self> {
        Ok(Self {
            filepath: std::path::absolute(&self.filepath)?,
            ..self.clone()
        })
    }

    pub fn walk(&self) -> Result<Walk<TarPath, TarEntry>> {
        let node = self.dir_node()?;
        Ok(Walk::new(self.clone(), Arc::clone(&self.container.tree), node))
    }

    fn at(&self, rpath: RelPath) -> Self {
        let node = self.container.tree.lookup(&rpath.key());
        Self {
            container: Arc::clone(&self.container),
            filepath: self.filepath.clone(),
            rpath,
            node,
        }
    }

    fn found(&self) -> Result<NodeId> {
        self.node.ok_or_else(|| Error::NotFound {
            path: self.as_path(),
        })
    }

    fn dir_node(&self) -> Result<NodeId> {
        let id = self.found()?;
        if self.container.tree.node(id).is_dir() {
            Ok(id)
        } else {
            Err(Error::NotADirectory {
                path: self.as_path(),
            })
        }
    }

    /// Every indexed node below this path, with its key relative to it.
    fn descendants(&self) -> impl Iterator<Item = (&str, &str)> {
        let prefix = self.rpath.dir_prefix();
        self.container.tree.iter().filter_map(move |(_, node)| {
            let rest = node.path().strip_prefix(prefix.as_str())?;
            (!rest.is_empty()).then_some((node.path(), rest))
        })
    }
}

impl VirtualPath for TarPath {
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
        self.node.is_some()
    }

    fn is_file(&self) -> Result<bool> {
        Ok(self.container.tree.node(self.found()?).is_file())
    }

    fn is_dir(&self) -> Result<bool> {
        Ok(self.container.tree.node(self.found()?).is_dir())
    }

    fn iterdir(&self) -> Result<impl Iterator<Item = Self>> {
        let id = self.dir_node()?;
        let tree = &self.container.tree;
        Ok(tree
            .node(id)
            .children()
            .iter()
            .map(move |&child| self.at(RelPath::new(tree.node(child).path()))))
    }

    fn glob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        let pattern = format!("{}{pattern}", self.rpath.dir_prefix());
        let matched: Vec<Self> = self
            .container
            .tree
            .iter()
            .filter(|(_, node)| fnmatch(&pattern, node.path()))
            .map(|(_, node)| self.at(RelPath::new(node.path())))
            .collect();
        Ok(matched.into_iter())
    }

    fn rglob(&self, pattern: &str) -> Result<impl Iterator<Item = Self>> {
        let matched: Vec<Self> = self
            .descendants()
            .filter(|(_, rest)| match_path(rest, pattern))
            .map(|(key, _)| self.at(RelPath::new(key)))
            .collect();
        Ok(matched.into_iter())
    }

    fn open(&self, options: &OpenOptions) -> Result<Stream> {
        options.check_read_only()?;
        let id = self.found()?;
        let node = self.container.tree.node(id);
        let entry = match node.meta() {
            Some(entry) if node.is_file() => entry,
            _ => {
                return Err(Error::NotAFile {
                    path: self.as_path(),
                });
            }
        };
        let data = self.container.read_member(entry)?;
        trace!(member = node.path(), size = data.len(), "extracted tar member");
        Ok(Stream::new(Cursor::new(data), options))
    }

    fn stat(&self) -> Result<Stat> {
        let id = self.found()?;
        let Some(entry) = self.container.tree.node(id).meta() else {
            return Ok(Stat::default());
        };
        let mtime = i64::try_from(entry.mtime).unwrap_or(i64::MAX);
        Ok(Stat {
            mode: entry.mode,
            uid: entry.uid,
            gid: entry.gid,
            size: entry.size,
            atime: mtime,
            mtime,
            ctime: mtime,
            ..Stat::default()
        })
    }
}
