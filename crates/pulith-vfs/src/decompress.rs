//! Single-stream decompression dispatch.

use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::{PathKind, classify_path};
use crate::options::OpenOptions;
use crate::stream::Stream;

/// Open `path` for reading, decompressing it according to its suffix.
///
/// Unknown suffixes open the file as-is. Zip and tar suffixes are rejected
/// with [`Error::Misrouted`]: those are containers and must be opened through
/// [`crate::ZipPath`] / [`crate::TarPath`].
pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Stream> {
    let path = path.as_ref();
    options.check_read_only()?;

    match classify_path(path) {
        PathKind::Zip => Err(misrouted(path, "zip")),
        PathKind::Tar(_) => Err(misrouted(path, "tar")),
        PathKind::Compressed(codec) => {
            let decoder = codec.decoder(File::open(path)?)?;
            tracing::trace!(path = %path.display(), ?codec, "opened compressed stream");
            Ok(Stream::new(decoder, options))
        }
        PathKind::Plain => Ok(Stream::new(File::open(path)?, options)),
    }
}

fn misrouted(path: &Path, suffix: &'static str) -> Error {
    Error::Misrouted {
        path: path.to_path_buf(),
        suffix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Mode;
    use std::io::Write;

    fn write_gz(path: &Path, data: &[u8]) {
        let file = File::create(path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn gzip_text_and_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.gz");
        write_gz(&path, b"compressed text");

        let mut text = open(&path, &OpenOptions::text()).unwrap();
        assert!(text.is_text());
        assert_eq!(text.read_text().unwrap(), "compressed text");

        let mut binary = open(&path, &OpenOptions::binary()).unwrap();
        assert!(!binary.is_text());
        assert_eq!(binary.read_bytes().unwrap(), b"compressed text");
    }

    #[test]
    fn plain_file_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "just plaintext").unwrap();
        let mut stream = open(&path, &OpenOptions::new()).unwrap();
        assert_eq!(stream.read_text().unwrap(), "just plaintext");
    }

    #[test]
    fn containers_are_misrouted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.zip", "a.tar.gz", "a.tar"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"").unwrap();
            assert!(matches!(
                open(&path, &OpenOptions::new()),
                Err(Error::Misrouted { .. })
            ));
        }
    }

    #[test]
    fn write_modes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.gz");
        write_gz(&path, b"x");
        let options = OpenOptions::new().mode("w".parse::<Mode>().unwrap());
        assert!(matches!(open(&path, &options), Err(Error::ReadOnly { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = open(dir.path().join("nope.gz"), &OpenOptions::new());
        assert!(matches!(result, Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
