use std::fmt;
use std::io::{self, BufRead, BufReader, Read};

use crate::options::{Encoding, OpenOptions};

/// A readable stream returned by `open`.
///
/// Both variants implement [`Read`] and [`BufRead`]; the text variant yields
/// UTF-8 regardless of the source encoding.
pub enum Stream {
    Binary(Box<dyn BufRead>),
    Text(TextStream),
}

impl Stream {
    pub(crate) fn new<R: Read + 'static>(reader: R, options: &OpenOptions) -> Self {
        let reader: Box<dyn BufRead> = Box::new(BufReader::new(reader));
        if options.mode.is_binary() {
            Self::Binary(reader)
        } else {
            Self::Text(TextStream::new(reader, options.effective_encoding()))
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn read_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn read_text(&mut self) -> io::Result<String> {
        let mut buf = String::new();
        self.read_to_string(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(_) => f.write_str("Stream::Binary"),
            Self::Text(t) => write!(f, "Stream::Text({:?})", t.encoding),
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Binary(r) => r.read(buf),
            Self::Text(t) => t.read(buf),
        }
    }
}

impl BufRead for Stream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            Self::Binary(r) => r.fill_buf(),
            Self::Text(t) => t.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            Self::Binary(r) => r.consume(amt),
            Self::Text(t) => t.consume(amt),
        }
    }
}

/// Decodes an underlying byte stream into UTF-8 text.
///
/// UTF-8 input is passed through and validated by the string-reading
/// methods (`read_to_string`, `read_line`, `lines`). Latin-1 and ASCII input
/// is transcoded chunk by chunk.
pub struct TextStream {
    inner: Box<dyn BufRead>,
    encoding: Encoding,
    pending: Vec<u8>,
    pos: usize,
}

impl TextStream {
    pub fn new(inner: Box<dyn BufRead>, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::new(),
            pos: 0,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

fn transcode(raw: &[u8], encoding: Encoding, out: &mut Vec<u8>) -> io::Result<()> {
    out.reserve(raw.len());
    for &byte in raw {
        if encoding == Encoding::Ascii && !byte.is_ascii() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("byte 0x{byte:02x} is not valid ascii"),
            ));
        }
        let mut utf8 = [0u8; 2];
        out.extend_from_slice(char::from(byte).encode_utf8(&mut utf8).as_bytes());
    }
    Ok(())
}

impl Read for TextStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for TextStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let encoding = self.encoding;
        if encoding == Encoding::Utf8 {
            return self.inner.fill_buf();
        }
        if self.pos >= self.pending.len() {
            self.pending.clear();
            self.pos = 0;
            let raw = self.inner.fill_buf()?;
            let n = raw.len();
            transcode(raw, encoding, &mut self.pending)?;
            self.inner.consume(n);
        }
        Ok(&self.pending[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        if self.encoding == Encoding::Utf8 {
            self.inner.consume(amt);
        } else {
            self.pos = (self.pos + amt).min(self.pending.len());
        }
    }
}
