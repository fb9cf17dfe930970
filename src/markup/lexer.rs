// src/markup/lexer.rs

//! Tokenizer for the markup language.
//!
//! Splits the input into text runs and tags, decoding entities in text and
//! attribute values. Offsets are byte offsets into the original input.

use log::trace;

use super::{MarkupError, MarkupErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub offset: usize,
    pub name: &'a str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text {
        offset: usize,
        text: String,
    },
    StartTag {
        offset: usize,
        name: &'a str,
        attrs: Vec<Attribute<'a>>,
        self_closing: bool,
    },
    EndTag {
        offset: usize,
        name: &'a str,
    },
}

/// Streaming tokenizer over a markup string.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Decodes the entity starting at `input[at]` (which is `&`). Returns the
/// character and the number of bytes consumed.
fn decode_entity(input: &str, at: usize) -> Result<(char, usize), MarkupError> {
    let rest = &input[at + 1..];
    let end = match rest.find(';') {
        Some(end) if end <= 10 => end,
        _ => {
            let shown: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '#').collect();
            return Err(MarkupError::new(at, MarkupErrorKind::UnknownEntity(shown)));
        }
    };
    let name = &rest[..end];
    let unknown = || MarkupError::new(at, MarkupErrorKind::UnknownEntity(name.to_string()));
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).map_err(|_| unknown())?
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().map_err(|_| unknown())?
            } else {
                return Err(unknown());
            };
            char::from_u32(code).filter(|c| *c != '\0').ok_or_else(unknown)?
        }
    };
    Ok((ch, end + 2))
}

/// Decodes entities in `input[start..end]`.
fn decode_span(input: &str, start: usize, end: usize) -> Result<String, MarkupError> {
    let mut out = String::with_capacity(end - start);
    let mut pos = start;
    while pos < end {
        match input[pos..end].find('&') {
            Some(rel) => {
                out.push_str(&input[pos..pos + rel]);
                let (ch, len) = decode_entity(input, pos + rel)?;
                out.push(ch);
                pos += rel + len;
            }
            None => {
                out.push_str(&input[pos..end]);
                pos = end;
            }
        }
    }
    Ok(out)
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eof_error(&self) -> MarkupError {
        MarkupError::new(self.input.len(), MarkupErrorKind::UnterminatedTag)
    }

    fn name(&mut self) -> Result<&'a str, MarkupError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if is_name_byte(b)) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                None => self.eof_error(),
                Some(_) => MarkupError::new(start, MarkupErrorKind::MalformedTag),
            });
        }
        Ok(&self.input[start..self.pos])
    }

    fn attribute(&mut self) -> Result<Attribute<'a>, MarkupError> {
        let offset = self.pos;
        let name = self.name()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b'=') => self.pos += 1,
            None => return Err(self.eof_error()),
            Some(_) => return Err(MarkupError::new(self.pos, MarkupErrorKind::MalformedTag)),
        }
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            None => return Err(self.eof_error()),
            Some(_) => {
                return Err(MarkupError::new(
                    self.pos,
                    MarkupErrorKind::UnquotedAttribute(name.to_string()),
                ))
            }
        };
        self.pos += 1;
        let start = self.pos;
        let len = self.input[start..]
            .bytes()
            .position(|b| b == quote)
            .ok_or_else(|| self.eof_error())?;
        let value = decode_span(self.input, start, start + len)?;
        self.pos = start + len + 1;
        Ok(Attribute {
            offset,
            name,
            value,
        })
    }

    fn end_tag(&mut self, offset: usize) -> Result<Token<'a>, MarkupError> {
        // Past "</".
        self.pos += 2;
        let name = self.name()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b'>') => {
                self.pos += 1;
                Ok(Token::EndTag { offset, name })
            }
            None => Err(self.eof_error()),
            Some(_) => Err(MarkupError::new(self.pos, MarkupErrorKind::MalformedTag)),
        }
    }

    fn start_tag(&mut self, offset: usize) -> Result<Token<'a>, MarkupError> {
        self.pos += 1;
        let name = self.name()?;
        let mut attrs = Vec::new();
        loop {
            let before = self.pos;
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.eof_error()),
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(Token::StartTag {
                        offset,
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some(b'/') => {
                    self.pos += 1;
                    return match self.peek() {
                        Some(b'>') => {
                            self.pos += 1;
                            Ok(Token::StartTag {
                                offset,
                                name,
                                attrs,
                                self_closing: true,
                            })
                        }
                        None => Err(self.eof_error()),
                        Some(_) => Err(MarkupError::new(self.pos, MarkupErrorKind::MalformedTag)),
                    };
                }
                Some(_) if before == self.pos => {
                    // Attributes must be separated from the name and each other.
                    return Err(MarkupError::new(self.pos, MarkupErrorKind::MalformedTag));
                }
                Some(_) => attrs.push(self.attribute()?),
            }
        }
    }

    fn text(&mut self) -> Result<Token<'a>, MarkupError> {
        let offset = self.pos;
        let end = self.input[offset..]
            .find('<')
            .map_or(self.input.len(), |rel| offset + rel);
        let text = decode_span(self.input, offset, end)?;
        self.pos = end;
        Ok(Token::Text { offset, text })
    }

    /// Returns the next token, `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Result<Token<'a>, MarkupError>> {
        if self.pos >= self.input.len() {
            return None;
        }
        let offset = self.pos;
        let token = if self.input[offset..].starts_with("</") {
            self.end_tag(offset)
        } else if self.input[offset..].starts_with('<') {
            self.start_tag(offset)
        } else {
            self.text()
        };
        if let Ok(token) = &token {
            trace!("markup token: {:?}", token);
        }
        Some(token)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, MarkupError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            // Stop after the first error.
            self.pos = self.input.len();
        }
        item
    }
}
