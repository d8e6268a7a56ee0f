//! Inline (phrasing) content parser
//!
//! Runs over the text of a single paragraph, heading or table cell. Spans are
//! document offsets: `base` is the offset of `src[0]`.

use crate::ast::{ComponentNode, Inline, Span};
use crate::error::{ParseError, ParseResult};
use crate::parser::MAX_NESTING_DEPTH;
use crate::tag::Scanner;

/// Result of parsing a run of inline content
#[derive(Debug)]
pub struct InlineOutput {
    pub children: Vec<Inline>,
    /// Local index of a closing tag belonging to the enclosing block
    /// component. Parsing stopped there and the caller owns the tag.
    pub stopped_at: Option<usize>,
}

/// Parse `src` as inline content. `enclosing` names the innermost open block
/// component, whose closing tag may end the run early.
pub fn parse_inline(
    src: &str,
    base: usize,
    context: &'static str,
    enclosing: Option<&str>,
) -> ParseResult<InlineOutput> {
    parse_inline_nested(src, base, context, enclosing, 0)
}

/// `parse_inline` inside `depth` enclosing blocks, which count toward
/// `MAX_NESTING_DEPTH`
pub(crate) fn parse_inline_nested(
    src: &str,
    base: usize,
    context: &'static str,
    enclosing: Option<&str>,
    depth: usize,
) -> ParseResult<InlineOutput> {
    let mut parser = InlineParser {
        src,
        pos: 0,
        base,
        context,
        enclosing,
        depth,
    };
    let (children, stop) = parser.parse_until(None)?;
    Ok(InlineOutput {
        children,
        stopped_at: match stop {
            Stop::Enclosing(at) => Some(at),
            Stop::End | Stop::Closed => None,
        },
    })
}

enum Stop {
    End,
    Closed,
    Enclosing(usize),
}

struct InlineParser<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
    context: &'static str,
    enclosing: Option<&'a str>,
    depth: usize,
}

/// Accumulates text and flushes it into `Text` nodes around other inlines
struct Collector {
    nodes: Vec<Inline>,
    text: String,
    text_start: usize,
}

impl Collector {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            text: String::new(),
            text_start: 0,
        }
    }

    fn push_str(&mut self, s: &str, at: usize) {
        if self.text.is_empty() {
            self.text_start = at;
        }
        self.text.push_str(s);
    }

    fn push_char(&mut self, c: char, at: usize) {
        if self.text.is_empty() {
            self.text_start = at;
        }
        self.text.push(c);
    }

    fn flush(&mut self, end: usize) {
        if !self.text.is_empty() {
            self.nodes.push(Inline::Text {
                value: std::mem::take(&mut self.text),
                span: Span::new(self.text_start, end),
            });
        }
    }

    fn push_node(&mut self, node: Inline) {
        self.flush(node.span().start);
        self.nodes.push(node);
    }

    fn finish(mut self, end: usize) -> Vec<Inline> {
        self.flush(end);
        self.nodes
    }
}

impl<'a> InlineParser<'a> {
    fn doc(&self, local: usize) -> usize {
        self.base + local
    }

    fn deeper(&self, at: usize) -> ParseResult<usize> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                span: Span::new(self.doc(at), self.doc(at + 1)),
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(self.depth + 1)
    }

    fn sub_parse(&self, start: usize, end: usize) -> ParseResult<Vec<Inline>> {
        let mut parser = InlineParser {
            src: &self.src[start..end],
            pos: 0,
            base: self.base + start,
            context: self.context,
            enclosing: None,
            depth: self.deeper(start)?,
        };
        parser.parse_until(None).map(|(children, _)| children)
    }

    fn parse_until(&mut self, close: Option<&str>) -> ParseResult<(Vec<Inline>, Stop)> {
        let src = self.src;
        let mut out = Collector::new();

        while self.pos < src.len() {
            let rest = &src[self.pos..];
            match rest.as_bytes()[0] {
                b'\\' => self.escape(&mut out),
                b'`' => self.code_span(&mut out),
                b @ (b'*' | b'_') => self.emphasis(&mut out, b)?,
                b'~' if rest.starts_with("~~") => self.strikethrough(&mut out)?,
                b'!' if rest.starts_with("![") => self.image(&mut out)?,
                b'[' => self.link(&mut out)?,
                b'{' => self.expression(&mut out)?,
                b'<' => {
                    let scanner = Scanner::new(src, self.pos, self.base);
                    if let Some((name, end)) = scanner.closing_tag() {
                        if close == Some(name.as_str()) {
                            let nodes = out.finish(self.doc(self.pos));
                            self.pos = end;
                            return Ok((nodes, Stop::Closed));
                        }
                        if self.enclosing == Some(name.as_str()) {
                            return Ok((out.finish(self.doc(self.pos)), Stop::Enclosing(self.pos)));
                        }
                        let span = Span::new(self.doc(self.pos), self.doc(end));
                        return Err(match close {
                            Some(expected) => ParseError::MismatchedClosingTag {
                                span,
                                expected: expected.to_string(),
                                found: name,
                            },
                            None => ParseError::UnexpectedClosingTag { span, name },
                        });
                    }
                    self.component(&mut out)?;
                }
                b'\n' => self.line_break(&mut out),
                _ => {
                    let ch = rest.chars().next().unwrap_or('\u{FFFD}');
                    out.push_char(ch, self.doc(self.pos));
                    self.pos += ch.len_utf8();
                }
            }
        }

        Ok((out.finish(self.doc(self.pos)), Stop::End))
    }

    fn escape(&mut self, out: &mut Collector) {
        let at = self.doc(self.pos);
        match self.src[self.pos + 1..].chars().next() {
            Some('\n') => {
                out.push_node(Inline::Break {
                    span: Span::new(at, at + 2),
                });
                self.pos += 2;
                self.skip_indent();
            }
            Some(c) if c.is_ascii_punctuation() => {
                out.push_char(c, at);
                self.pos += 2;
            }
            _ => {
                out.push_char('\\', at);
                self.pos += 1;
            }
        }
    }

    /// Soft break, or a hard break after two or more trailing spaces
    fn line_break(&mut self, out: &mut Collector) {
        let trimmed_len = out.text.trim_end_matches(' ').len();
        let trailing = out.text.len() - trimmed_len;
        out.text.truncate(trimmed_len);

        let at = self.doc(self.pos);
        if trailing >= 2 {
            out.push_node(Inline::Break {
                span: Span::new(at - trailing, at + 1),
            });
        } else {
            out.push_char('\n', at);
        }
        self.pos += 1;
        self.skip_indent();
    }

    fn skip_indent(&mut self) {
        while matches!(self.src.as_bytes().get(self.pos), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn run_length(&self, at: usize, b: u8) -> usize {
        self.src.as_bytes()[at..].iter().take_while(|c| **c == b).count()
    }

    /// End index (exclusive) of the code span opening at `at`, if it closes
    fn code_span_end(&self, at: usize) -> Option<(usize, usize)> {
        let n = self.run_length(at, b'`');
        let bytes = self.src.as_bytes();
        let mut i = at + n;
        while i < bytes.len() {
            if bytes[i] == b'`' {
                let run = self.run_length(i, b'`');
                if run == n {
                    return Some((i, i + n));
                }
                i += run;
            } else {
                i += 1;
            }
        }
        None
    }

    fn code_span(&mut self, out: &mut Collector) {
        let n = self.run_length(self.pos, b'`');
        match self.code_span_end(self.pos) {
            Some((close, end)) => {
                let raw = self.src[self.pos + n..close].replace('\n', " ");
                let value = if raw.len() >= 2
                    && raw.starts_with(' ')
                    && raw.ends_with(' ')
                    && !raw.trim().is_empty()
                {
                    raw[1..raw.len() - 1].to_string()
                } else {
                    raw
                };
                out.push_node(Inline::Code {
                    value,
                    span: Span::new(self.doc(self.pos), self.doc(end)),
                });
                self.pos = end;
            }
            None => {
                out.push_str(&self.src[self.pos..self.pos + n], self.doc(self.pos));
                self.pos += n;
            }
        }
    }

    fn emphasis(&mut self, out: &mut Collector, b: u8) -> ParseResult<()> {
        let start = self.pos;
        let run = self.run_length(start, b);
        let prev = self.src[..start].chars().next_back();
        let intraword = b == b'_' && prev.map_or(false, char::is_alphanumeric);
        let delim = if run >= 2 { 2 } else { 1 };
        let opens = self.src[start + delim..]
            .chars()
            .next()
            .map_or(false, |c| !c.is_whitespace());

        if !intraword && opens {
            if let Some(close) = self.find_closing(b, delim, start + delim) {
                let children = self.sub_parse(start + delim, close)?;
                let span = Span::new(self.doc(start), self.doc(close + delim));
                out.push_node(if delim == 2 {
                    Inline::Strong { children, span }
                } else {
                    Inline::Emphasis { children, span }
                });
                self.pos = close + delim;
                return Ok(());
            }
        }

        // Not a delimiter here; one char of literal text, the rest retried
        out.push_char(b as char, self.doc(start));
        self.pos += 1;
        Ok(())
    }

    fn strikethrough(&mut self, out: &mut Collector) -> ParseResult<()> {
        let start = self.pos;
        let opens = self.src[start + 2..]
            .chars()
            .next()
            .map_or(false, |c| !c.is_whitespace());

        if opens {
            if let Some(close) = self.find_closing(b'~', 2, start + 2) {
                let children = self.sub_parse(start + 2, close)?;
                out.push_node(Inline::Delete {
                    children,
                    span: Span::new(self.doc(start), self.doc(close + 2)),
                });
                self.pos = close + 2;
                return Ok(());
            }
        }

        out.push_str("~~", self.doc(start));
        self.pos += 2;
        Ok(())
    }

    /// Find the closing delimiter run for an emphasis opened at `from`.
    /// Returns the local index of the closing delimiter.
    fn find_closing(&self, b: u8, delim: usize, from: usize) -> Option<usize> {
        let bytes = self.src.as_bytes();
        let mut i = from;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'`' => {
                    match self.code_span_end(i) {
                        Some((_, end)) => i = end,
                        None => i += self.run_length(i, b'`'),
                    }
                    continue;
                }
                c if c == b => {
                    let run = self.run_length(i, b);
                    let prev_closes = i > from
                        && self.src[..i]
                            .chars()
                            .next_back()
                            .map_or(false, |c| !c.is_whitespace());
                    let next = self.src[i + run..].chars().next();
                    let intraword = b == b'_' && next.map_or(false, char::is_alphanumeric);

                    if prev_closes && !intraword {
                        if delim == 2 && run >= 2 {
                            return Some(i + run - 2);
                        }
                        // A run of two inside single emphasis is nested strong
                        if delim == 1 && run != 2 {
                            return Some(i + run - 1);
                        }
                    }
                    i += run;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        None
    }

    /// Local index of the `]` matching the `[` at `open`
    fn find_bracket_close(&self, open: usize) -> Option<usize> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut i = open;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'`' => {
                    if let Some((_, end)) = self.code_span_end(i) {
                        i = end;
                        continue;
                    }
                }
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }

        None
    }

    /// `(destination "title")` following a label; returns the raw inner text and end
    fn destination(&self, label_end: usize) -> Option<(&'a str, usize)> {
        let src = self.src;
        let bytes = src.as_bytes();
        if bytes.get(label_end + 1) != Some(&b'(') {
            return None;
        }
        let mut depth = 0usize;
        let mut i = label_end + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((&src[label_end + 2..i], i + 1));
                    }
                }
                b'\n' if depth > 0 && src[label_end + 2..i].trim().is_empty() => return None,
                _ => {}
            }
            i += 1;
        }
        None
    }

    fn link(&mut self, out: &mut Collector) -> ParseResult<()> {
        let start = self.pos;
        if let Some(label_end) = self.find_bracket_close(start) {
            if let Some((raw, end)) = self.destination(label_end) {
                let (href, title) = split_destination(raw);
                let children = self.sub_parse(start + 1, label_end)?;
                out.push_node(Inline::Link {
                    href,
                    title,
                    children,
                    span: Span::new(self.doc(start), self.doc(end)),
                });
                self.pos = end;
                return Ok(());
            }
        }

        out.push_char('[', self.doc(start));
        self.pos += 1;
        Ok(())
    }

    fn image(&mut self, out: &mut Collector) -> ParseResult<()> {
        let start = self.pos;
        if let Some(label_end) = self.find_bracket_close(start + 1) {
            if let Some((raw, end)) = self.destination(label_end) {
                let (src, title) = split_destination(raw);
                let alt = Inline::plain_text(&self.sub_parse(start + 2, label_end)?);
                out.push_node(Inline::Image {
                    src,
                    alt,
                    title,
                    span: Span::new(self.doc(start), self.doc(end)),
                });
                self.pos = end;
                return Ok(());
            }
        }

        out.push_char('!', self.doc(start));
        self.pos += 1;
        Ok(())
    }

    fn expression(&mut self, out: &mut Collector) -> ParseResult<()> {
        let (source, end) = Scanner::new(self.src, self.pos, self.base).expression()?;
        out.push_node(Inline::Expression {
            source,
            span: Span::new(self.doc(self.pos), self.doc(end)),
        });
        self.pos = end;
        Ok(())
    }

    fn component(&mut self, out: &mut Collector) -> ParseResult<()> {
        let start = self.pos;
        let mut scanner = Scanner::new(self.src, start, self.base);
        let tag = match scanner.open_tag()? {
            Some(tag) => tag,
            None => {
                out.push_char('<', self.doc(self.pos));
                self.pos += 1;
                return Ok(());
            }
        };

        self.pos = tag.end;
        let (children, span) = if tag.self_closing {
            (Vec::new(), tag.span)
        } else {
            let depth = self.deeper(start)?;
            let outer = std::mem::replace(&mut self.depth, depth);
            let parsed = self.parse_until(Some(tag.name.as_str()));
            self.depth = outer;
            match parsed? {
                (children, Stop::Closed) => (children, Span::new(tag.span.start, self.doc(self.pos))),
                _ => {
                    return Err(ParseError::unterminated_component(
                        tag.span,
                        tag.name,
                        self.context,
                    ))
                }
            }
        };

        out.push_node(Inline::Component(ComponentNode {
            name: tag.name,
            attributes: tag.attributes,
            children,
            self_closing: tag.self_closing,
            span,
        }));
        Ok(())
    }
}

/// Split `url "title"` into its parts; `<url with spaces>` is supported
fn split_destination(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();
    let (href, rest) = match raw.strip_prefix('<') {
        Some(inner) => match inner.find('>') {
            Some(end) => (&inner[..end], &inner[end + 1..]),
            None => (raw, ""),
        },
        None => match raw.find(char::is_whitespace) {
            Some(end) => (&raw[..end], &raw[end..]),
            None => (raw, ""),
        },
    };

    let rest = rest.trim();
    let title = if rest.len() >= 2 {
        let first = rest.as_bytes()[0];
        let last = rest.as_bytes()[rest.len() - 1];
        let quoted = matches!((first, last), (b'"', b'"') | (b'\'', b'\'') | (b'(', b')'));
        quoted.then(|| rest[1..rest.len() - 1].to_string())
    } else {
        None
    };

    (href.to_string(), title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(src: &str) -> Vec<Inline> {
        parse_inline(src, 0, "paragraph", None).unwrap().children
    }

    fn text(value: &str, start: usize, end: usize) -> Inline {
        Inline::Text {
            value: value.to_string(),
            span: Span::new(start, end),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(inline("hello"), vec![text("hello", 0, 5)]);
    }

    #[test]
    fn test_emphasis_and_strong() {
        let nodes = inline("a *b* **c**");
        assert_eq!(nodes.len(), 4);
        assert!(matches!(nodes[1], Inline::Emphasis { .. }));
        assert!(matches!(nodes[3], Inline::Strong { span, .. } if span == Span::new(6, 11)));
    }

    #[test]
    fn test_nested_strong_in_emphasis() {
        let nodes = inline("*a **b** c*");
        match &nodes[0] {
            Inline::Emphasis { children, .. } => {
                assert!(children.iter().any(|c| matches!(c, Inline::Strong { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_intraword_underscore_is_text() {
        assert_eq!(inline("snake_case_name"), vec![text("snake_case_name", 0, 15)]);
    }

    #[test]
    fn test_unclosed_emphasis_is_text() {
        assert_eq!(inline("2 * 3"), vec![text("2 * 3", 0, 5)]);
    }

    #[test]
    fn test_code_span() {
        let nodes = inline("use `a*b` here");
        assert_eq!(
            nodes[1],
            Inline::Code {
                value: "a*b".to_string(),
                span: Span::new(4, 9)
            }
        );
    }

    #[test]
    fn test_link_with_title() {
        let nodes = inline(r#"[docs](https://example.com "Docs")"#);
        match &nodes[0] {
            Inline::Link { href, title, .. } => {
                assert_eq!(href, "https://example.com");
                assert_eq!(title.as_deref(), Some("Docs"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_image() {
        let nodes = inline("![a *cat*](cat.png)");
        assert!(matches!(&nodes[0], Inline::Image { alt, src, .. } if alt == "a cat" && src == "cat.png"));
    }

    #[test]
    fn test_bracket_without_destination_is_text() {
        assert_eq!(inline("[x]"), vec![text("[x]", 0, 3)]);
    }

    #[test]
    fn test_expression() {
        let nodes = inline("Year {2024 + 1}!");
        assert_eq!(
            nodes[1],
            Inline::Expression {
                source: "2024 + 1".to_string(),
                span: Span::new(5, 15)
            }
        );
    }

    #[test]
    fn test_inline_component() {
        let nodes = inline(r#"New <Badge color="green">beta</Badge> feature"#);
        match &nodes[1] {
            Inline::Component(node) => {
                assert_eq!(node.name, "Badge");
                assert_eq!(node.children.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_inline_component() {
        let err = parse_inline("<Callout>unterminated", 3, "paragraph", None).unwrap_err();
        assert_eq!(
            err,
            ParseError::unterminated_component(Span::new(3, 12), "Callout", "paragraph")
        );
    }

    #[test]
    fn test_stops_at_enclosing_close() {
        let output = parse_inline("text</Callout>", 0, "paragraph", Some("Callout")).unwrap();
        assert_eq!(output.stopped_at, Some(4));
        assert_eq!(output.children, vec![text("text", 0, 4)]);
    }

    #[test]
    fn test_hard_and_soft_breaks() {
        let nodes = inline("a  \nb\nc");
        assert!(matches!(nodes[1], Inline::Break { .. }));
        assert_eq!(nodes[2], text("b\nc", 4, 7));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(inline(r"\*not\*"), vec![text("*not*", 0, 7)]);
    }

    #[test]
    fn test_strikethrough() {
        assert!(matches!(inline("~~old~~")[0], Inline::Delete { .. }));
    }
}
