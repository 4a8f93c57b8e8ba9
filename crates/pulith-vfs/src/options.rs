use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// How an opened stream presents its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Decoded text (`r`, `rt`).
    #[default]
    Text,
    /// Raw bytes (`rb`).
    Binary,
    /// Any mode that would modify the file (`w`, `a`, `x`, `+`).
    ///
    /// Parsed so callers get a precise rejection from `open` instead of a
    /// parse failure.
    Write { binary: bool },
}

impl Mode {
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Binary | Self::Write { binary: true })
    }

    pub fn is_read(self) -> bool {
        !matches!(self, Self::Write { .. })
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut read = false;
        let mut write = false;
        let mut binary = false;
        let mut text = false;
        for c in s.chars() {
            match c {
                'r' => read = true,
                'w' | 'a' | 'x' | '+' => write = true,
                'b' => binary = true,
                't' => text = true,
                _ => return Err(Error::InvalidMode(s.to_owned())),
            }
        }
        if (binary && text) || !(read || write) {
            return Err(Error::InvalidMode(s.to_owned()));
        }
        Ok(match (write, binary) {
            (true, binary) => Self::Write { binary },
            (false, true) => Self::Binary,
            (false, false) => Self::Text,
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("rt"),
            Self::Binary => f.write_str("rb"),
            Self::Write { binary: false } => f.write_str("w"),
            Self::Write { binary: true } => f.write_str("wb"),
        }
    }
}

/// Text encodings understood by text-mode streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase().replace('_', "-");
        match label.as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            _ => Err(Error::UnknownEncoding(s.to_owned())),
        }
    }
}

/// Options for opening a path as a stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub mode: Mode,
    pub encoding: Option<Encoding>,
    /// Accepted for parity with plain file APIs; not every codec honours it,
    /// so it is ignored with a warning.
    pub buffering: Option<usize>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn binary() -> Self {
        Self::default().mode(Mode::Binary)
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn buffering(mut self, size: usize) -> Self {
        self.buffering = Some(size);
        self
    }

    pub(crate) fn effective_encoding(&self) -> Encoding {
        self.encoding.unwrap_or_default()
    }

    pub(crate) fn check_read_only(&self) -> crate::Result<()> {
        if self.mode.is_read() {
            Ok(())
        } else {
            Err(Error::ReadOnly {
                mode: self.mode.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_read_modes() {
        assert_eq!("r".parse::<Mode>().unwrap(), Mode::Text);
        assert_eq!("rt".parse::<Mode>().unwrap(), Mode::Text);
        assert_eq!("rb".parse::<Mode>().unwrap(), Mode::Binary);
        assert_eq!("br".parse::<Mode>().unwrap(), Mode::Binary);
    }

    #[test]
    fn parse_write_modes() {
        assert_eq!("w".parse::<Mode>().unwrap(), Mode::Write { binary: false });
        assert_eq!("ab".parse::<Mode>().unwrap(), Mode::Write { binary: true });
        assert_eq!("r+".parse::<Mode>().unwrap(), Mode::Write { binary: false });
        assert!(!"x".parse::<Mode>().unwrap().is_read());
    }

    #[test]
    fn parse_invalid_modes() {
        assert!(matches!("".parse::<Mode>(), Err(Error::InvalidMode(_))));
        assert!(matches!("rbt".parse::<Mode>(), Err(Error::InvalidMode(_))));
        assert!(matches!("q".parse::<Mode>(), Err(Error::InvalidMode(_))));
    }

    #[test]
    fn parse_encodings() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf_8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("iso-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert!(matches!(
            "koi8-r".parse::<Encoding>(),
            Err(Error::UnknownEncoding(_))
        ));
    }

    #[test]
    fn builder_defaults_to_text_utf8() {
        let options = OpenOptions::new();
        assert_eq!(options.mode, Mode::Text);
        assert_eq!(options.effective_encoding(), Encoding::Utf8);
        assert!(options.buffering.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let options = OpenOptions::binary()
            .encoding(Encoding::Latin1)
            .buffering(4096);
        assert!(options.mode.is_binary());
        assert_eq!(options.encoding, Some(Encoding::Latin1));
        assert_eq!(options.buffering, Some(4096));
    }

    #[test]
    fn write_mode_is_rejected() {
        let options = OpenOptions::new().mode(Mode::Write { binary: true });
        match options.check_read_only() {
            Err(Error::ReadOnly { mode }) => assert_eq!(mode, "wb"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
