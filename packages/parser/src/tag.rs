//! Scanning of JSX-style tags and `{...}` regions inside markdown text

use crate::ast::{Attribute, AttributeValue, Span};
use crate::error::{ParseError, ParseResult};

/// An opening tag `<Name a="b" c={d}>` or `<Name />`
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub span: Span,
    /// Local index just past the closing `>`
    pub end: usize,
}

/// Byte cursor over a slice of the document. `base` is the document offset of
/// `src[0]`, so spans produced here point back into the full source.
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str, pos: usize, base: usize) -> Self {
        Self { src, pos, base }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn doc(&self, local: usize) -> usize {
        self.base + local
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if pred(b)) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Scan an opening tag at the cursor. Returns `Ok(None)` when the `<` does
    /// not start a tag (`a < b`, `<3`), leaving the cursor untouched.
    pub fn open_tag(&mut self) -> ParseResult<Option<OpenTag>> {
        let start = self.pos;
        if self.peek() != Some(b'<') || !matches!(self.peek_at(1), Some(b) if b.is_ascii_alphabetic()) {
            return Ok(None);
        }
        self.pos += 1;

        let name = self.take_while(is_tag_name_byte).to_string();
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(ParseError::UnterminatedTag {
                        span: Span::new(self.doc(start), self.doc(self.pos)),
                        name,
                    })
                }
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(Some(OpenTag {
                        name,
                        attributes,
                        self_closing: false,
                        span: Span::new(self.doc(start), self.doc(self.pos)),
                        end: self.pos,
                    }));
                }
                Some(b'/') if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    return Ok(Some(OpenTag {
                        name,
                        attributes,
                        self_closing: true,
                        span: Span::new(self.doc(start), self.doc(self.pos)),
                        end: self.pos,
                    }));
                }
                Some(b) if is_attribute_start(b) => {
                    attributes.push(self.attribute()?);
                }
                Some(b'{') => {
                    let (_, end) = self.expression()?;
                    return Err(ParseError::invalid_syntax(
                        Span::new(self.doc(self.pos), self.doc(end)),
                        "Spread attributes are not supported",
                    ));
                }
                Some(_) => {
                    let ch = self.src[self.pos..].chars().next().unwrap_or('?');
                    return Err(ParseError::unexpected_token(
                        Span::new(self.doc(self.pos), self.doc(self.pos + ch.len_utf8())),
                        format!("an attribute, `>` or `/>` in `<{}>`", name),
                        format!("`{}`", ch),
                    ));
                }
            }
        }
    }

    fn attribute(&mut self) -> ParseResult<Attribute> {
        let start = self.pos;
        let name = self.take_while(is_attribute_byte).to_string();

        let save = self.pos;
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            self.pos = save;
            return Ok(Attribute {
                name,
                value: AttributeValue::Flag,
                span: Span::new(self.doc(start), self.doc(self.pos)),
            });
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let open = self.pos;
                self.pos += 1;
                let body_start = self.pos;
                while matches!(self.peek(), Some(b) if b != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(ParseError::UnterminatedString {
                        span: Span::new(self.doc(open), self.doc(self.pos)),
                        quote: quote as char,
                    });
                }
                let value = self.src[body_start..self.pos].to_string();
                self.pos += 1;
                AttributeValue::Literal { value }
            }
            Some(b'{') => {
                let offset = self.doc(self.pos + 1);
                let (source, end) = self.expression()?;
                self.pos = end;
                AttributeValue::Expression { source, offset }
            }
            _ => {
                return Err(ParseError::unexpected_token(
                    Span::empty(self.doc(self.pos)),
                    format!("a quoted value or `{{...}}` for attribute `{}`", name),
                    "something else",
                ))
            }
        };

        Ok(Attribute {
            name,
            value,
            span: Span::new(self.doc(start), self.doc(self.pos)),
        })
    }

    /// Scan a balanced `{...}` starting at the cursor. Returns the inner source
    /// and the local index just past the closing brace. The cursor is not moved.
    pub fn expression(&self) -> ParseResult<(String, usize)> {
        let bytes = self.src.as_bytes();
        let open = self.pos;
        let mut depth = 0usize;
        let mut i = self.pos;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((self.src[open + 1..i].to_string(), i + 1));
                    }
                }
                quote @ (b'"' | b'\'' | b'`') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i += 2;
                    while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                        i += 1;
                    }
                    i += 1;
                }
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        Err(ParseError::UnterminatedExpression {
            span: Span::new(self.doc(open), self.doc(self.src.len())),
        })
    }

    /// Match `</Name>` at the cursor, returning the name and the local end index
    pub fn closing_tag(&self) -> Option<(String, usize)> {
        let rest = &self.src[self.pos..];
        let inner = rest.strip_prefix("</")?;
        let trimmed = inner.trim_start();
        let name_len = trimmed
            .bytes()
            .take_while(|b| is_tag_name_byte(*b))
            .count();
        if name_len == 0 {
            return None;
        }
        let name = &trimmed[..name_len];
        let after = trimmed[name_len..].trim_start();
        if !after.starts_with('>') {
            return None;
        }
        let consumed = rest.len() - after.len() + 1;
        Some((name.to_string(), self.pos + consumed))
    }
}

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')
}

fn is_attribute_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b':')
}

fn is_attribute_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'-')
}

/// Whether `line` is a whole-line closing tag such as `</Callout>`
pub fn closing_tag_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let (name, end) = Scanner::new(trimmed, 0, 0).closing_tag()?;
    (end == trimmed.len()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(src: &str) -> OpenTag {
        Scanner::new(src, 0, 0).open_tag().unwrap().unwrap()
    }

    #[test]
    fn test_open_tag_with_attributes() {
        let tag = open(r#"<Callout type="warning" cols={2} defaultOpen>"#);
        assert_eq!(tag.name, "Callout");
        assert!(!tag.self_closing);
        assert_eq!(tag.attributes.len(), 3);
        assert_eq!(
            tag.attributes[0].value,
            AttributeValue::Literal {
                value: "warning".to_string()
            }
        );
        assert_eq!(
            tag.attributes[1].value,
            AttributeValue::Expression {
                source: "2".to_string(),
                offset: 30
            }
        );
        assert_eq!(tag.attributes[2].value, AttributeValue::Flag);
    }

    #[test]
    fn test_self_closing_tag() {
        let tag = open(r#"<Icon name="star" />"#);
        assert!(tag.self_closing);
        assert_eq!(tag.end, 20);
    }

    #[test]
    fn test_multiline_tag() {
        let tag = open("<Card\n  title=\"A\"\n  href=\"/a\"\n>");
        assert_eq!(tag.attributes.len(), 2);
    }

    #[test]
    fn test_not_a_tag() {
        assert_eq!(Scanner::new("< b", 0, 0).open_tag().unwrap(), None);
        assert_eq!(Scanner::new("<3", 0, 0).open_tag().unwrap(), None);
    }

    #[test]
    fn test_unterminated_tag() {
        let err = Scanner::new("<Callout type=\"x\"", 0, 4).open_tag().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedTag { ref name, .. } if name == "Callout"));
        assert_eq!(err.span().start, 4);
    }

    #[test]
    fn test_expression_braces_and_strings() {
        let scanner = Scanner::new(r#"{ {a: "}"} } tail"#, 0, 0);
        let (inner, end) = scanner.expression().unwrap();
        assert_eq!(inner, r#" {a: "}"} "#);
        assert_eq!(end, 12);
    }

    #[test]
    fn test_unterminated_expression() {
        let err = Scanner::new("{1 + ", 0, 0).expression().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedExpression { .. }));
    }

    #[test]
    fn test_closing_tag() {
        let scanner = Scanner::new("</Tabs > rest", 0, 0);
        assert_eq!(scanner.closing_tag(), Some(("Tabs".to_string(), 8)));
        assert_eq!(closing_tag_line("  </Callout>  "), Some("Callout".to_string()));
        assert_eq!(closing_tag_line("</Callout> text"), None);
    }
}
