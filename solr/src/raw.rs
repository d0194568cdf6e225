use std::borrow::Cow;
use std::fmt::{self, Display};

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use serde::{Serialize, Serializer};

/// Single line of a solution file as it was read.
///
/// `text` is written back as is, `trimmed` is used for matching only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    text: String,
    trimmed: String,
    encoding: &'static Encoding,
}

impl RawLine {
    /// Creates UTF-8 line
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_encoding(text, UTF_8)
    }

    #[must_use]
    pub fn with_encoding(text: impl Into<String>, encoding: &'static Encoding) -> Self {
        let text = text.into();
        let trimmed = text.trim().to_owned();
        Self {
            text,
            trimmed,
            encoding,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Line without leading and trailing whitespaces
    #[must_use]
    pub fn trimmed(&self) -> &str {
        &self.trimmed
    }

    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

impl Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for RawLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Line terminator that followed a line in the source
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum LineEnd {
    #[default]
    CrLf,
    Lf,
    Cr,
    /// Last line of a file without trailing line break
    None,
}

impl LineEnd {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnd::CrLf => "\r\n",
            LineEnd::Lf => "\n",
            LineEnd::Cr => "\r",
            LineEnd::None => "",
        }
    }
}

/// Decoded solution content with the encoding it was read with
#[derive(Debug)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
    pub bom: bool,
}

/// Decodes raw bytes. Byte order mark wins over the fallback encoding.
#[must_use]
pub fn decode(bytes: &[u8], fallback: &'static Encoding) -> Decoded {
    let (encoding, bom_len) = match Encoding::for_bom(bytes) {
        Some((enc, len)) => (enc, len),
        None => (fallback, 0),
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if had_errors {
        tracing::warn!(
            encoding = encoding.name(),
            "Solution content contains malformed sequences, output will not be byte identical"
        );
    }
    Decoded {
        text: text.into_owned(),
        encoding,
        bom: bom_len > 0,
    }
}

/// Encodes text back. UTF-16 is handled here because `encoding_rs`
/// only decodes it.
#[must_use]
pub fn encode<'a>(text: &'a str, encoding: &'static Encoding) -> Cow<'a, [u8]> {
    if encoding == UTF_16LE {
        Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
    } else if encoding == UTF_16BE {
        Cow::Owned(text.encode_utf16().flat_map(u16::to_be_bytes).collect())
    } else {
        let (bytes, _, _) = encoding.encode(text);
        bytes
    }
}

#[must_use]
pub fn bom_of(encoding: &'static Encoding) -> &'static [u8] {
    if encoding == UTF_16LE {
        b"\xFF\xFE"
    } else if encoding == UTF_16BE {
        b"\xFE\xFF"
    } else if encoding == UTF_8 {
        b"\xEF\xBB\xBF"
    } else {
        b""
    }
}

/// Splits text into lines keeping the knowledge of each line's terminator
#[derive(Debug, Default)]
pub(crate) struct LineReader {
    text: String,
    pos: usize,
}

impl LineReader {
    pub(crate) fn new(text: String) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) fn reset(&mut self) {
        self.pos = 0;
    }

    pub(crate) fn next_line(&mut self) -> Option<(&str, LineEnd)> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.text[start..];
        match rest.find(|c: char| c == '\r' || c == '\n') {
            None => {
                self.pos = self.text.len();
                Some((&self.text[start..], LineEnd::None))
            }
            Some(i) => {
                let bytes = rest.as_bytes();
                let (eol, len) = match (bytes[i], bytes.get(i + 1)) {
                    (b'\r', Some(b'\n')) => (LineEnd::CrLf, 2),
                    (b'\r', _) => (LineEnd::Cr, 1),
                    _ => (LineEnd::Lf, 1),
                };
                self.pos = start + i + len;
                Some((&self.text[start..start + i], eol))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn raw_line_trimmed() {
        // Arrange

        // Act
        let line = RawLine::new("\t\tDebug|Any CPU = Debug|Any CPU  ");

        // Assert
        assert_eq!("Debug|Any CPU = Debug|Any CPU", line.trimmed());
        assert_eq!("\t\tDebug|Any CPU = Debug|Any CPU  ", line.text());
        assert_eq!(UTF_8, line.encoding());
    }

    #[test]
    fn raw_line_equality_includes_encoding() {
        // Arrange
        let utf8 = RawLine::new("Global");
        let utf16 = RawLine::with_encoding("Global", UTF_16LE);

        // Act

        // Assert
        assert_eq!(utf8, RawLine::new("Global"));
        assert_ne!(utf8, utf16);
        assert_ne!(utf8, RawLine::new(" Global"));
    }

    #[rstest]
    #[case("", vec![])]
    #[case("a", vec![("a", LineEnd::None)])]
    #[case("a\r\n", vec![("a", LineEnd::CrLf)])]
    #[case("a\r\nb", vec![("a", LineEnd::CrLf), ("b", LineEnd::None)])]
    #[case("a\nb\n", vec![("a", LineEnd::Lf), ("b", LineEnd::Lf)])]
    #[case("a\rb", vec![("a", LineEnd::Cr), ("b", LineEnd::None)])]
    #[case("\r\n\r\n", vec![("", LineEnd::CrLf), ("", LineEnd::CrLf)])]
    #[case("a\n\r\nb", vec![("a", LineEnd::Lf), ("", LineEnd::CrLf), ("b", LineEnd::None)])]
    #[trace]
    fn line_reader_tests(#[case] content: &str, #[case] expected: Vec<(&str, LineEnd)>) {
        // Arrange
        let mut reader = LineReader::new(content.to_owned());

        // Act
        let mut actual = Vec::new();
        while let Some((line, eol)) = reader.next_line() {
            actual.push((line.to_owned(), eol));
        }

        // Assert
        let expected: Vec<(String, LineEnd)> = expected
            .into_iter()
            .map(|(l, e)| (l.to_owned(), e))
            .collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn line_reader_reset() {
        // Arrange
        let mut reader = LineReader::new("a\nb".to_owned());
        while reader.next_line().is_some() {}

        // Act
        reader.reset();

        // Assert
        assert_eq!(Some(("a", LineEnd::Lf)), reader.next_line());
    }

    #[rstest]
    #[case(&b"\xEF\xBB\xBFGlobal"[..], UTF_8, true)]
    #[case(&b"Global"[..], UTF_8, false)]
    #[case(&b"\xFF\xFEG\x00l\x00o\x00b\x00a\x00l\x00"[..], UTF_16LE, true)]
    #[case(&b"\xFE\xFF\x00G\x00l\x00o\x00b\x00a\x00l"[..], UTF_16BE, true)]
    #[trace]
    fn decode_tests(
        #[case] bytes: &[u8],
        #[case] encoding: &'static Encoding,
        #[case] bom: bool,
    ) {
        // Arrange

        // Act
        let decoded = decode(bytes, UTF_8);

        // Assert
        assert_eq!("Global", decoded.text);
        assert_eq!(encoding, decoded.encoding);
        assert_eq!(bom, decoded.bom);
    }

    #[rstest]
    #[case(UTF_8)]
    #[case(UTF_16LE)]
    #[case(UTF_16BE)]
    #[trace]
    fn encode_restores_decoded_bytes(#[case] encoding: &'static Encoding) {
        // Arrange
        let text = "Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"Папка\"";
        let mut bytes = bom_of(encoding).to_vec();
        bytes.extend_from_slice(&encode(text, encoding));

        // Act
        let decoded = decode(&bytes, UTF_8);

        // Assert
        assert_eq!(text, decoded.text);
        assert_eq!(encoding, decoded.encoding);
    }
}
