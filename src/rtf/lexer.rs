//! RTF tokenizer.
//!
//! Splits a byte stream into group delimiters, control words, control
//! symbols, hex escapes and literal text. Line breaks in the stream carry no
//! meaning in RTF and are dropped.

use crate::rtf::{RtfError, RtfErrorKind};

/// Control words longer than this are rejected.
const MAX_WORD_LEN: usize = 32;

/// One lexical element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    GroupOpen,
    GroupClose,
    /// `\word` or `\wordN`.
    Control { word: &'a str, param: Option<i32> },
    /// `\` followed by a single non-letter, e.g. `\~` or `\{`.
    Symbol(u8),
    /// `\'hh`.
    Hex(u8),
    /// Literal bytes, never containing braces, backslashes or line breaks.
    Text(&'a [u8]),
}

#[derive(Clone, Debug)]
pub(crate) struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the next unread byte.
    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    fn error(&self, kind: RtfErrorKind) -> RtfError {
        RtfError::new(kind, self.pos)
    }

    /// Next token, or `None` at the end of input.
    pub(crate) fn next_token(&mut self) -> Result<Option<Token<'a>>, RtfError> {
        loop {
            let Some(&byte) = self.input.get(self.pos) else {
                return Ok(None);
            };
            match byte {
                b'\r' | b'\n' => self.pos += 1,
                b'{' => {
                    self.pos += 1;
                    return Ok(Some(Token::GroupOpen));
                }
                b'}' => {
                    self.pos += 1;
                    return Ok(Some(Token::GroupClose));
                }
                b'\\' => return self.parse_control().map(Some),
                _ => {
                    let start = self.pos;
                    while self
                        .input
                        .get(self.pos)
                        .is_some_and(|b| !matches!(b, b'{' | b'}' | b'\\' | b'\r' | b'\n'))
                    {
                        self.pos += 1;
                    }
                    return Ok(Some(Token::Text(&self.input[start..self.pos])));
                }
            }
        }
    }

    /// Parse what follows a backslash.
    fn parse_control(&mut self) -> Result<Token<'a>, RtfError> {
        self.pos += 1;
        let Some(&first) = self.input.get(self.pos) else {
            return Err(self.error(RtfErrorKind::UnexpectedEof));
        };

        if first == b'\'' {
            self.pos += 1;
            let hex = self
                .input
                .get(self.pos..self.pos + 2)
                .ok_or_else(|| self.error(RtfErrorKind::UnexpectedEof))?;
            let value = hex_pair(hex[0], hex[1]).ok_or_else(|| self.error(RtfErrorKind::InvalidHex))?;
            self.pos += 2;
            return Ok(Token::Hex(value));
        }

        if !first.is_ascii_alphabetic() {
            self.pos += 1;
            // `\` before a line break is an old spelling of `\par`.
            if matches!(first, b'\r' | b'\n') {
                return Ok(Token::Control {
                    word: "par",
                    param: None,
                });
            }
            return Ok(Token::Symbol(first));
        }

        let start = self.pos;
        while self.input.get(self.pos).is_some_and(u8::is_ascii_alphabetic) {
            self.pos += 1;
        }
        if self.pos - start > MAX_WORD_LEN {
            return Err(RtfError::new(RtfErrorKind::WordTooLong, start));
        }
        // Only ASCII letters were consumed.
        let word = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or_default();

        let param = self.parse_param()?;
        // A single space delimits the control word and is not text.
        if self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
        Ok(Token::Control { word, param })
    }

    fn parse_param(&mut self) -> Result<Option<i32>, RtfError> {
        let start = self.pos;
        let negative = self.input.get(self.pos) == Some(&b'-');
        if negative {
            self.pos += 1;
        }
        let digits = self.pos;
        let mut value: i32 = 0;
        while let Some(&d) = self.input.get(self.pos).filter(|b| b.is_ascii_digit()) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i32::from(d - b'0')))
                .ok_or_else(|| RtfError::new(RtfErrorKind::ParameterOverflow, start))?;
            self.pos += 1;
        }
        if self.pos == digits {
            // A lone '-' is text, not part of the word.
            self.pos = start;
            return Ok(None);
        }
        Ok(Some(if negative { -value } else { value }))
    }

    /// Skip to just past the `}` closing the current group. Running out of
    /// input first is tolerated.
    pub(crate) fn skip_group(&mut self) {
        let mut depth = 1usize;
        while let Some(&byte) = self.input.get(self.pos) {
            self.pos += 1;
            match byte {
                b'\\' => self.pos += 1,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

pub(crate) fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    Some((hex_digit(hi)? << 4) | hex_digit(lo)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input.as_bytes());
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token().unwrap() {
            out.push(tok);
        }
        out
    }

    #[test]
    fn test_control_words_and_text() {
        assert_eq!(
            tokens("{\\rtf1\\b bold\\b0 x}"),
            vec![
                Token::GroupOpen,
                Token::Control {
                    word: "rtf",
                    param: Some(1)
                },
                Token::Control {
                    word: "b",
                    param: None
                },
                Token::Text(b"bold"),
                Token::Control {
                    word: "b",
                    param: Some(0)
                },
                Token::Text(b"x"),
                Token::GroupClose,
            ]
        );
    }

    #[test]
    fn test_negative_param_and_symbols() {
        assert_eq!(
            tokens("\\u-3913?\\{\\'e9"),
            vec![
                Token::Control {
                    word: "u",
                    param: Some(-3913)
                },
                Token::Text(b"?"),
                Token::Symbol(b'{'),
                Token::Hex(0xe9),
            ]
        );
    }

    #[test]
    fn test_line_breaks_are_dropped() {
        assert_eq!(tokens("ab\r\ncd"), vec![Token::Text(b"ab"), Token::Text(b"cd")]);
        assert_eq!(
            tokens("\\\nx"),
            vec![
                Token::Control {
                    word: "par",
                    param: None
                },
                Token::Text(b"x")
            ]
        );
    }

    #[test]
    fn test_errors_carry_offset() {
        let mut lexer = Lexer::new(b"ab\\'zz");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind(), RtfErrorKind::InvalidHex);

        let mut lexer = Lexer::new(b"\\fs99999999999");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind(), RtfErrorKind::ParameterOverflow);
        assert_eq!(err.offset(), 3);

        let mut lexer = Lexer::new(b"\\");
        assert_eq!(
            lexer.next_token().unwrap_err().kind(),
            RtfErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_skip_group() {
        let mut lexer = Lexer::new(b"{\\*\\gen {nested \\} } x} tail");
        assert_eq!(lexer.next_token().unwrap(), Some(Token::GroupOpen));
        lexer.skip_group();
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Text(b" tail")));
    }
}
