//! Parsing edited text back into a tree.
//!
//! A word-based scanner feeds a recursive-descent parser. Tokens are
//! whitespace separated; string literals are the only token that may
//! contain spaces, and they may not span lines (newlines inside values
//! are always escaped by the renderer). Errors carry the 1-based line
//! they were detected on.

use std::collections::HashSet;

use crate::error::ParseError;
use crate::graph::{GraphNode, Handle, PrimitiveValue};
use crate::wire::PrimitiveKind;

/// Nesting bound for hostile or accidental deeply nested text.
const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    FieldName(String),
    Label(u32),
    Str(Vec<u8>),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(word) => format!("'{word}'"),
            Token::FieldName(name) => format!("field '{name}:'"),
            Token::Label(label) => format!("label &{label}"),
            Token::Str(_) => "string literal".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.bytes.get(self.pos) {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<(Token, usize), ParseError> {
        self.skip_whitespace();
        let line = self.line;
        let Some(&first) = self.bytes.get(self.pos) else {
            return Ok((Token::Eof, line));
        };

        if first == b'"' {
            self.pos += 1;
            return Ok((Token::Str(self.scan_string()?), line));
        }

        let start = self.pos;
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte.is_ascii_whitespace() || byte == b'"' {
                break;
            }
            self.pos += 1;
        }
        // The input is a &str, and words break on ASCII boundaries only,
        // so the slice is always valid UTF-8.
        let word = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();

        let token = match word.as_str() {
            "{" => Token::LBrace,
            "}" => Token::RBrace,
            "[" => Token::LBracket,
            "]" => Token::RBracket,
            _ => {
                if let Some(raw) = word.strip_prefix('&') {
                    let label = raw.parse::<u32>().map_err(|_| {
                        ParseError::new(line, format!("malformed handle label '{word}'"))
                    })?;
                    Token::Label(label)
                } else if word.len() > 1 && word.ends_with(':') {
                    Token::FieldName(word[..word.len() - 1].to_string())
                } else {
                    Token::Ident(word)
                }
            }
        };
        Ok((token, line))
    }

    fn scan_string(&mut self) -> Result<Vec<u8>, ParseError> {
        let mut bytes = Vec::new();
        loop {
            let Some(&byte) = self.bytes.get(self.pos) else {
                return Err(ParseError::new(self.line, "unterminated string literal"));
            };
            self.pos += 1;
            match byte {
                b'"' => return Ok(bytes),
                b'\n' => {
                    return Err(ParseError::new(
                        self.line,
                        "string literal runs past end of line, escape newlines as \\n",
                    ));
                }
                b'\\' => bytes.push(self.scan_escape()?),
                other => bytes.push(other),
            }
        }
    }

    fn scan_escape(&mut self) -> Result<u8, ParseError> {
        let Some(&kind) = self.bytes.get(self.pos) else {
            return Err(ParseError::new(self.line, "unterminated escape sequence"));
        };
        self.pos += 1;
        match kind {
            b'n' => Ok(b'\n'),
            b'r' => Ok(b'\r'),
            b't' => Ok(b'\t'),
            b'"' => Ok(b'"'),
            b'\\' => Ok(b'\\'),
            b'x' => {
                let digits = self
                    .bytes
                    .get(self.pos..self.pos + 2)
                    .ok_or_else(|| ParseError::new(self.line, "truncated \\x escape"))?;
                self.pos += 2;
                let text = std::str::from_utf8(digits)
                    .map_err(|_| ParseError::new(self.line, "malformed \\x escape"))?;
                u8::from_str_radix(text, 16)
                    .map_err(|_| ParseError::new(self.line, format!("malformed \\x escape '{text}'")))
            }
            other => Err(ParseError::new(
                self.line,
                format!("unknown escape '\\{}'", other as char),
            )),
        }
    }
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    peeked: Option<(Token, usize)>,
    defined: HashSet<u32>,
    referenced: Vec<(u32, usize)>,
}

/// Parses a complete text form into its root node.
pub(super) fn parse_tree(text: &str) -> Result<GraphNode, ParseError> {
    let mut parser = Parser {
        scanner: Scanner::new(text),
        peeked: None,
        defined: HashSet::new(),
        referenced: Vec::new(),
    };

    let root = parser.parse_value(0)?;

    let (token, line) = parser.next()?;
    if token != Token::Eof {
        return Err(ParseError::new(
            line,
            format!("unexpected {} after the root value", token.describe()),
        ));
    }
    for (label, line) in &parser.referenced {
        if !parser.defined.contains(label) {
            return Err(ParseError::new(
                *line,
                format!("reference to undefined label &{label}"),
            ));
        }
    }
    Ok(root)
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Result<(Token, usize), ParseError> {
        match self.peeked.take() {
            Some(entry) => Ok(entry),
            None => self.scanner.next_token(),
        }
    }

    fn peek(&mut self) -> Result<&(Token, usize), ParseError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scanner.next_token()?);
        }
        self.peeked
            .as_ref()
            .ok_or_else(|| ParseError::new(0, "scanner exhausted"))
    }

    fn define_label(&mut self, label: Option<u32>, line: usize) -> Result<Option<Handle>, ParseError> {
        let Some(label) = label else {
            return Ok(None);
        };
        if !self.defined.insert(label) {
            return Err(ParseError::new(line, format!("duplicate label &{label}")));
        }
        Ok(Some(Handle::new(label)))
    }

    fn optional_label(&mut self) -> Result<Option<u32>, ParseError> {
        if let (Token::Label(label), _) = self.peek()? {
            let label = *label;
            self.next()?;
            return Ok(Some(label));
        }
        Ok(None)
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, usize), ParseError> {
        match self.next()? {
            (Token::Ident(word), line) => Ok((word, line)),
            (other, line) => Err(ParseError::new(
                line,
                format!("expected {what}, found {}", other.describe()),
            )),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<GraphNode, ParseError> {
        let (token, line) = self.next()?;
        if depth > MAX_NESTING {
            return Err(ParseError::new(line, "nesting too deep"));
        }
        match token {
            Token::Ident(word) => self.parse_keyword(&word, line, depth),
            other => Err(ParseError::new(
                line,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }

    fn parse_keyword(
        &mut self,
        word: &str,
        line: usize,
        depth: usize,
    ) -> Result<GraphNode, ParseError> {
        match word {
            "null" => Ok(GraphNode::Null),

            "ref" => match self.next()? {
                (Token::Label(label), ref_line) => {
                    self.referenced.push((label, ref_line));
                    Ok(GraphNode::BackRef(Handle::new(label)))
                }
                (other, ref_line) => Err(ParseError::new(
                    ref_line,
                    format!("expected a handle label after 'ref', found {}", other.describe()),
                )),
            },

            "string" => match self.next()? {
                (Token::Str(bytes), _) => Ok(GraphNode::Str(bytes)),
                (other, str_line) => Err(ParseError::new(
                    str_line,
                    format!("expected a string literal, found {}", other.describe()),
                )),
            },

            "array" => {
                let (element_type, _) = self.expect_ident("an element type name")?;
                let label = self.optional_label()?;
                let handle = self.define_label(label, line)?;
                match self.next()? {
                    (Token::LBracket, _) => {}
                    (other, open_line) => {
                        return Err(ParseError::new(
                            open_line,
                            format!("expected '[', found {}", other.describe()),
                        ));
                    }
                }
                let mut elements = Vec::new();
                loop {
                    if let (Token::RBracket, _) = self.peek()? {
                        self.next()?;
                        break;
                    }
                    if let (Token::Eof, eof_line) = self.peek()? {
                        return Err(ParseError::new(*eof_line, "unterminated array, expected ']'"));
                    }
                    elements.push(self.parse_value(depth + 1)?);
                }
                Ok(GraphNode::Array {
                    element_type,
                    handle,
                    elements,
                })
            }

            "object" => {
                let (type_name, _) = self.expect_ident("a type name")?;
                let label = self.optional_label()?;
                let handle = self.define_label(label, line)?;
                match self.next()? {
                    (Token::LBrace, _) => {}
                    (other, open_line) => {
                        return Err(ParseError::new(
                            open_line,
                            format!("expected '{{', found {}", other.describe()),
                        ));
                    }
                }
                let mut fields = Vec::new();
                loop {
                    match self.next()? {
                        (Token::RBrace, _) => break,
                        (Token::FieldName(name), _) => {
                            let value = self.parse_value(depth + 1)?;
                            fields.push((name, value));
                        }
                        (other, field_line) => {
                            return Err(ParseError::new(
                                field_line,
                                format!(
                                    "expected a field name or '}}', found {}",
                                    other.describe()
                                ),
                            ));
                        }
                    }
                }
                Ok(GraphNode::Object {
                    type_name,
                    handle,
                    fields,
                })
            }

            keyword => match PrimitiveKind::from_keyword(keyword) {
                Some(kind) => {
                    let (literal, lit_line) = self.expect_ident("a literal value")?;
                    parse_primitive(kind, &literal, lit_line).map(GraphNode::Primitive)
                }
                None => Err(ParseError::new(
                    line,
                    format!("unknown value keyword '{keyword}'"),
                )),
            },
        }
    }
}

fn parse_primitive(
    kind: PrimitiveKind,
    literal: &str,
    line: usize,
) -> Result<PrimitiveValue, ParseError> {
    let bad = |what: &str| ParseError::new(line, format!("invalid {what} literal '{literal}'"));
    match kind {
        PrimitiveKind::Boolean => match literal {
            "true" => Ok(PrimitiveValue::Boolean(true)),
            "false" => Ok(PrimitiveValue::Boolean(false)),
            _ => Err(bad("boolean")),
        },
        PrimitiveKind::Byte => literal
            .parse()
            .map(PrimitiveValue::Byte)
            .map_err(|_| bad("byte")),
        PrimitiveKind::Short => literal
            .parse()
            .map(PrimitiveValue::Short)
            .map_err(|_| bad("short")),
        PrimitiveKind::Char => literal
            .parse()
            .map(PrimitiveValue::Char)
            .map_err(|_| bad("char")),
        PrimitiveKind::Int => literal
            .parse()
            .map(PrimitiveValue::Int)
            .map_err(|_| bad("int")),
        PrimitiveKind::Long => literal
            .parse()
            .map(PrimitiveValue::Long)
            .map_err(|_| bad("long")),
        PrimitiveKind::Float => literal
            .parse()
            .map(PrimitiveValue::Float)
            .map_err(|_| bad("float")),
        PrimitiveKind::Double => literal
            .parse()
            .map(PrimitiveValue::Double)
            .map_err(|_| bad("double")),
    }
}
