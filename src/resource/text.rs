//! Decoded file content with line lookup

use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Failure to turn raw bytes into text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed {charset} input at byte {offset}")]
    Malformed { charset: String, offset: usize },

    #[error("unsupported charset '{0}'")]
    UnsupportedCharset(String),
}

/// Source text handed to an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    content: String,
    line_starts: Vec<usize>,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        Self {
            content,
            line_starts,
        }
    }

    /// Decode `bytes` using the declared `charset`.
    ///
    /// Supported charsets are UTF-8, US-ASCII and ISO-8859-1 (names are
    /// matched case-insensitively, ignoring `-` and `_`). A leading UTF-8
    /// byte order mark is dropped.
    pub fn decode(bytes: &[u8], charset: &str) -> Result<Self, DecodeError> {
        let normalized: String = charset
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "utf8" => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(bytes)
                    .map(Self::new)
                    .map_err(|e| DecodeError::Malformed {
                        charset: charset.to_string(),
                        offset: e.valid_up_to(),
                    })
            }
            "usascii" | "ascii" => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(DecodeError::Malformed {
                    charset: charset.to_string(),
                    offset,
                }),
                None => Ok(Self::new(bytes.iter().map(|&b| b as char).collect::<String>())),
            },
            "iso88591" | "latin1" => Ok(Self::new(
                bytes.iter().map(|&b| b as char).collect::<String>(),
            )),
            _ => Err(DecodeError::UnsupportedCharset(charset.to_string())),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of lines; an empty text has one (empty) line
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line `number` (1-based) without its terminator
    pub fn line(&self, number: usize) -> Option<&str> {
        let start = *self.line_starts.get(number.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(number)
            .map_or(self.content.len(), |next| next - 1);
        let line = &self.content[start..end];
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Iterate over all lines in order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        (1..=self.line_count()).filter_map(|number| self.line(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup() {
        let text = Text::new("first\r\nsecond\n\nfourth");
        assert_eq!(text.line_count(), 4);
        assert_eq!(text.line(1), Some("first"));
        assert_eq!(text.line(2), Some("second"));
        assert_eq!(text.line(3), Some(""));
        assert_eq!(text.line(4), Some("fourth"));
        assert_eq!(text.line(0), None);
        assert_eq!(text.line(5), None);
    }

    #[test]
    fn test_empty_text_has_one_line() {
        let text = Text::new("");
        assert_eq!(text.line_count(), 1);
        assert_eq!(text.lines().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let text = Text::decode(b"\xEF\xBB\xBFvar a = 1;", "UTF-8").unwrap();
        assert_eq!(text.content(), "var a = 1;");
    }

    #[test]
    fn test_decode_malformed_utf8() {
        let err = Text::decode(b"ok\xFF\xFE", "utf-8").unwrap_err();
        assert_eq!(
            err,
            DecodeError::Malformed {
                charset: "utf-8".to_string(),
                offset: 2
            }
        );
    }

    #[test]
    fn test_decode_latin1_and_ascii() {
        let text = Text::decode(b"caf\xE9", "ISO-8859-1").unwrap();
        assert_eq!(text.content(), "café");

        assert!(Text::decode(b"plain", "US-ASCII").is_ok());
        assert!(matches!(
            Text::decode(b"caf\xE9", "us-ascii"),
            Err(DecodeError::Malformed { offset: 3, .. })
        ));
    }

    #[test]
    fn test_decode_unsupported_charset() {
        assert_eq!(
            Text::decode(b"x", "EBCDIC").unwrap_err(),
            DecodeError::UnsupportedCharset("EBCDIC".to_string())
        );
    }
}
