use std::io::{self, Read};
use std::path::Path;

use crate::error::Result;

/// Compression codec of a single-stream file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    Gzip,
    Xz,
    Zstd,
    Lz4,
}

/// Compression codec wrapped around a tar container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TarCompress {
    None,
    Gzip,
    Xz,
    Zstd,
}

/// What a path denotes, judged by its name alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    Zip,
    Tar(TarCompress),
    Compressed(Codec),
    Plain,
}

// Checked in order, so double extensions must precede their last component.
const SUFFIXES: &[(&str, PathKind)] = &[
    (".tar.gz", PathKind::Tar(TarCompress::Gzip)),
    (".tar.xz", PathKind::Tar(TarCompress::Xz)),
    (".tar.zstd", PathKind::Tar(TarCompress::Zstd)),
    (".tar.zst", PathKind::Tar(TarCompress::Zstd)),
    (".tgz", PathKind::Tar(TarCompress::Gzip)),
    (".txz", PathKind::Tar(TarCompress::Xz)),
    (".tar", PathKind::Tar(TarCompress::None)),
    (".zip", PathKind::Zip),
    (".xz", PathKind::Compressed(Codec::Xz)),
    (".lz4", PathKind::Compressed(Codec::Lz4)),
    (".zstd", PathKind::Compressed(Codec::Zstd)),
    (".zst", PathKind::Compressed(Codec::Zstd)),
    (".gz", PathKind::Compressed(Codec::Gzip)),
];

/// Classify a file name by its longest known suffix.
///
/// Matching is literal and case-sensitive.
pub fn classify(name: &str) -> PathKind {
    SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map_or(PathKind::Plain, |&(_, kind)| kind)
}

/// Classify a path by the suffix of its final component.
pub fn classify_path(path: &Path) -> PathKind {
    match path.file_name() {
        Some(name) => classify(&name.to_string_lossy()),
        None => PathKind::Plain,
    }
}

/// Whether the path carries any recognized archive or compression suffix.
pub fn is_compressed(path: impl AsRef<Path>) -> bool {
    classify_path(path.as_ref()) != PathKind::Plain
}

impl PathKind {
    pub fn is_container(self) -> bool {
        matches!(self, Self::Zip | Self::Tar(_))
    }
}

impl Codec {
    /// Wrap a compressed reader in the decoder for this codec.
    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>> {
        match self {
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::MultiGzDecoder::new(
                reader,
            )))),
            #[cfg(feature = "xz")]
            Self::Xz => Ok(Decoder::Xz(Box::new(
                xz2::read::XzDecoder::new_multi_decoder(reader),
            ))),
            #[cfg(not(feature = "xz"))]
            Self::Xz => Err(crate::Error::UnsupportedFormat("xz")),
            #[cfg(feature = "zstd")]
            Self::Zstd => Ok(Decoder::Zstd(Box::new(zstd::stream::read::Decoder::new(
                reader,
            )?))),
            #[cfg(not(feature = "zstd"))]
            Self::Zstd => Err(crate::Error::UnsupportedFormat("zstd")),
            #[cfg(feature = "lz4")]
            Self::Lz4 => Ok(Decoder::Lz4(Box::new(lz4_flex::frame::FrameDecoder::new(
                reader,
            )))),
            #[cfg(not(feature = "lz4"))]
            Self::Lz4 => Err(crate::Error::UnsupportedFormat("lz4")),
        }
    }
}

impl TarCompress {
    pub fn codec(self) -> Option<Codec> {
        match self {
            Self::None => None,
            Self::Gzip => Some(Codec::Gzip),
            Self::Xz => Some(Codec::Xz),
            Self::Zstd => Some(Codec::Zstd),
        }
    }

    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>> {
        match self.codec() {
            Some(codec) => codec.decoder(reader),
            None => Ok(Decoder::Passthrough(reader)),
        }
    }
}

/// Decompressing reader for any supported codec.
pub enum Decoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::MultiGzDecoder<R>>),
    #[cfg(feature = "xz")]
    Xz(Box<xz2::read::XzDecoder<R>>),
    #[cfg(feature = "zstd")]
    Zstd(Box<zstd::stream::read::Decoder<'static, io::BufReader<R>>>),
    #[cfg(feature = "lz4")]
    Lz4(Box<lz4_flex::frame::FrameDecoder<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "xz")]
            Self::Xz(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(d) => d.read(buf),
            #[cfg(feature = "lz4")]
            Self::Lz4(d) => d.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn classify_prefers_double_extensions() {
        assert_eq!(classify("export.tar.gz"), PathKind::Tar(TarCompress::Gzip));
        assert_eq!(classify("export.gz"), PathKind::Compressed(Codec::Gzip));
        assert_eq!(classify("export.tar.zst"), PathKind::Tar(TarCompress::Zstd));
        assert_eq!(classify("export.zst"), PathKind::Compressed(Codec::Zstd));
        assert_eq!(classify("export.tar"), PathKind::Tar(TarCompress::None));
    }

    #[test]
    fn classify_single_stream_suffixes() {
        assert_eq!(classify("a.xz"), PathKind::Compressed(Codec::Xz));
        assert_eq!(classify("a.lz4"), PathKind::Compressed(Codec::Lz4));
        assert_eq!(classify("a.zstd"), PathKind::Compressed(Codec::Zstd));
        assert_eq!(classify("a.zip"), PathKind::Zip);
    }

    #[test]
    fn classify_is_case_sensitive() {
        assert_eq!(classify("A.ZIP"), PathKind::Plain);
        assert_eq!(classify("notes.txt"), PathKind::Plain);
        assert_eq!(classify("gz"), PathKind::Plain);
    }

    #[test]
    fn is_compressed_checks_file_name_only() {
        assert!(is_compressed("/data/file.json.gz"));
        assert!(!is_compressed("/data.zip/file.json"));
        assert!(!is_compressed("/"));
    }

    #[test]
    fn container_kinds() {
        assert!(PathKind::Zip.is_container());
        assert!(PathKind::Tar(TarCompress::Xz).is_container());
        assert!(!PathKind::Compressed(Codec::Gzip).is_container());
        assert!(!PathKind::Plain.is_container());
    }

    #[test]
    fn passthrough_decoder() {
        let mut decoder = TarCompress::None.decoder(Cursor::new(b"hello")).unwrap();
        assert!(matches!(decoder, Decoder::Passthrough(_)));
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn gzip_decoder_roundtrip() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"compressed text").unwrap();
        let data = encoder.finish().unwrap();

        let mut decoder = Codec::Gzip.decoder(Cursor::new(data)).unwrap();
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"compressed text");
    }

    #[test]
    #[cfg(not(feature = "xz"))]
    fn xz_unsupported_without_feature() {
        let result = Codec::Xz.decoder(Cursor::new(Vec::new()));
        assert!(matches!(result, Err(crate::Error::UnsupportedFormat("xz"))));
    }
}
