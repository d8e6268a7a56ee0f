use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::inline::parse_inline_nested;
use crate::tag::{closing_tag_line, Scanner};

/// Deepest nesting of containers, components, inline spans or expression
/// groups accepted before parsing fails with `ParseError::NestingTooDeep`
pub const MAX_NESTING_DEPTH: usize = 128;

/// Block-level parser for Livemark documents
///
/// Works line by line over `src`. Nested containers (block quotes, list
/// items) are parsed from de-indented copies with their own `base`, so spans
/// inside them point at the first line and may drift on continuation lines.
pub struct Parser<'src> {
    src: &'src str,
    pos: usize,
    base: usize,
    /// Name of the container, used in unterminated component errors
    context: &'static str,
    /// Enclosing containers and block components
    depth: usize,
}

/// List marker at the start of a line
#[derive(Debug, Clone, Copy, PartialEq)]
struct ListMarker {
    ordered: bool,
    /// Bullet char (`-`, `*`, `+`) or ordered delimiter (`.`, `)`)
    symbol: u8,
    number: Option<u64>,
    /// Marker length plus the spaces after it
    width: usize,
}

impl ListMarker {
    fn continues(&self, other: &ListMarker) -> bool {
        self.ordered == other.ordered && self.symbol == other.symbol
    }
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> Self {
        Self::nested(src, 0, "document", 0)
    }

    fn nested(src: &'src str, base: usize, context: &'static str, depth: usize) -> Self {
        Self {
            src,
            pos: 0,
            base,
            context,
            depth,
        }
    }

    /// Depth of a container opened at `at`
    fn deeper(&self, at: usize) -> ParseResult<usize> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                span: Span::new(self.doc(at), self.doc(self.line_end(at))),
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(self.depth + 1)
    }

    /// Parse a complete document
    pub fn parse_document(&mut self) -> ParseResult<Document> {
        let (children, _) = self.parse_blocks(None)?;
        Ok(Document { children })
    }

    fn doc(&self, local: usize) -> usize {
        self.base + local
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn line_end(&self, from: usize) -> usize {
        self.src[from..]
            .find('\n')
            .map_or(self.src.len(), |i| from + i)
    }

    /// Remainder of the current line, without the newline
    fn line(&self) -> &'src str {
        &self.src[self.pos..self.line_end(self.pos)]
    }

    fn next_line(&mut self) {
        let end = self.line_end(self.pos);
        self.pos = (end + 1).min(self.src.len());
    }

    fn rest_is_blank(&self, from: usize) -> bool {
        self.src[from..self.line_end(from)].trim().is_empty()
    }

    /// Parse blocks until the end of input or until the closing tag of
    /// `enclosing`. Returns the blocks and, when closed, the document offset
    /// just past the closing tag.
    fn parse_blocks(&mut self, enclosing: Option<&str>) -> ParseResult<(Vec<Block>, Option<usize>)> {
        let mut blocks = Vec::new();

        while !self.is_at_end() {
            let line = self.line();
            let trimmed = line.trim_start();
            if trimmed.trim().is_empty() {
                self.next_line();
                continue;
            }
            let indent = line.len() - trimmed.len();
            let at = self.pos + indent;

            if let Some((name, end)) = Scanner::new(self.src, at, self.base).closing_tag() {
                let span = Span::new(self.doc(at), self.doc(end));
                if enclosing == Some(name.as_str()) {
                    self.pos = end;
                    if self.rest_is_blank(end) {
                        self.next_line();
                    }
                    return Ok((blocks, Some(span.end)));
                }
                return Err(match enclosing {
                    Some(expected) => ParseError::MismatchedClosingTag {
                        span,
                        expected: expected.to_string(),
                        found: name,
                    },
                    None => ParseError::UnexpectedClosingTag { span, name },
                });
            }

            blocks.push(self.parse_block(at, indent, enclosing)?);
        }

        Ok((blocks, None))
    }

    fn parse_block(&mut self, at: usize, indent: usize, enclosing: Option<&str>) -> ParseResult<Block> {
        let trimmed = self.src[at..self.line_end(at)].trim_end();

        if fence_open(trimmed).is_some() {
            return self.parse_fenced_code(at, indent);
        }
        if let Some((depth, content)) = atx_heading(trimmed) {
            return self.parse_atx_heading(at, depth, content, enclosing);
        }
        if is_thematic_break(trimmed) {
            self.next_line();
            return Ok(Block::ThematicBreak {
                span: Span::new(self.doc(at), self.doc(at + trimmed.len())),
            });
        }
        if trimmed.starts_with('>') {
            return self.parse_blockquote(at);
        }
        if let Some(marker) = list_marker(trimmed) {
            return self.parse_list(at, marker);
        }
        if indent == 0 && trimmed.starts_with("export ") {
            return Ok(self.parse_export(at));
        }
        if trimmed.starts_with('{') {
            if let Some(block) = self.parse_block_expression(at)? {
                return Ok(block);
            }
        }
        if trimmed.starts_with('<') {
            if let Some(block) = self.parse_block_component(at)? {
                return Ok(block);
            }
        }
        if self.is_table_start(at) {
            return self.parse_table(at);
        }

        self.parse_paragraph(at, enclosing)
    }

    fn parse_fenced_code(&mut self, at: usize, indent: usize) -> ParseResult<Block> {
        let opening = self.src[at..self.line_end(at)].trim_end();
        let (fence_char, fence_len) = fence_open(opening).unwrap_or((b'`', 3));
        let info = opening[fence_len..].trim();
        let (lang, meta) = match info.split_once(char::is_whitespace) {
            Some((lang, meta)) => (Some(lang.to_string()), Some(meta.trim().to_string())),
            None if !info.is_empty() => (Some(info.to_string()), None),
            None => (None, None),
        };

        self.next_line();
        let mut lines = Vec::new();

        while !self.is_at_end() {
            let line = self.line();
            let trimmed = line.trim();
            if trimmed.len() >= fence_len && trimmed.bytes().all(|b| b == fence_char) {
                let end = self.pos + line.trim_end().len();
                self.next_line();
                return Ok(Block::Code {
                    lang,
                    meta,
                    value: lines.join("\n"),
                    span: Span::new(self.doc(at), self.doc(end)),
                });
            }
            lines.push(strip_indent(line.trim_end_matches('\r'), indent));
            self.next_line();
        }

        Err(ParseError::UnterminatedFence {
            span: Span::new(self.doc(at), self.doc(at + opening.len())),
            fence: (fence_char as char).to_string().repeat(fence_len),
        })
    }

    fn parse_atx_heading(
        &mut self,
        at: usize,
        depth: u8,
        (content_start, content_end): (usize, usize),
        enclosing: Option<&str>,
    ) -> ParseResult<Block> {
        let start = at + content_start;
        let text = &self.src[start..at + content_end];
        let output = parse_inline_nested(text, self.doc(start), "heading", enclosing, self.depth)?;

        let end = match output.stopped_at {
            Some(stop) => {
                self.pos = start + stop;
                start + stop
            }
            None => {
                self.next_line();
                at + content_end
            }
        };

        Ok(Block::Heading {
            depth,
            children: output.children,
            span: Span::new(self.doc(at), self.doc(end)),
        })
    }

    fn parse_blockquote(&mut self, at: usize) -> ParseResult<Block> {
        let mut content = String::new();
        let mut end = at;
        let mut content_base = None;
        let mut previous_blank = false;

        while !self.is_at_end() {
            let line = self.line();
            let trimmed = line.trim_start();
            if trimmed.trim().is_empty() {
                break;
            }

            match trimmed.strip_prefix('>') {
                Some(rest) => {
                    let rest = rest.strip_prefix(' ').unwrap_or(rest);
                    if content_base.is_none() {
                        content_base = Some(self.pos + (line.len() - rest.len()));
                    }
                    previous_blank = rest.trim().is_empty();
                    content.push_str(rest);
                }
                None if !previous_blank && !interrupts_paragraph(trimmed) => {
                    // Lazy continuation line
                    content.push_str(trimmed);
                }
                None => break,
            }
            content.push('\n');
            end = self.pos + line.trim_end().len();
            self.next_line();
        }

        let base = self.doc(content_base.unwrap_or(at));
        let depth = self.deeper(at)?;
        let (children, _) = Parser::nested(&content, base, "block quote", depth).parse_blocks(None)?;

        Ok(Block::BlockQuote {
            children,
            span: Span::new(self.doc(at), self.doc(end)),
        })
    }

    fn parse_list(&mut self, at: usize, first: ListMarker) -> ParseResult<Block> {
        let mut items = Vec::new();
        let mut spread = false;
        let mut list_end = at;

        loop {
            let line = self.line();
            let indent = leading_whitespace(line);
            let marker = match list_marker(&line[indent..]) {
                Some(marker) if marker.continues(&first) => marker,
                _ => break,
            };

            let content_col = (indent + marker.width).min(line.len());
            let item_start = self.pos + indent;
            let content_base = self.doc(self.pos + content_col);
            let mut content = line[content_col..].to_string();
            let mut item_end = self.pos + line.trim_end().len();
            let mut pending_blanks = 0;
            self.next_line();

            while !self.is_at_end() {
                let line = self.line();
                if line.trim().is_empty() {
                    pending_blanks += 1;
                    self.next_line();
                    continue;
                }

                let line_indent = leading_whitespace(line);
                if line_indent >= content_col {
                    if pending_blanks > 0 {
                        spread = true;
                    }
                    for _ in 0..=pending_blanks {
                        content.push('\n');
                    }
                    content.push_str(&line[content_col..]);
                } else if pending_blanks == 0
                    && list_marker(line.trim_start()).is_none()
                    && !interrupts_paragraph(line.trim_start())
                {
                    // Lazy continuation line
                    content.push('\n');
                    content.push_str(line.trim_start());
                } else {
                    break;
                }

                pending_blanks = 0;
                item_end = self.pos + line.trim_end().len();
                self.next_line();
            }

            let depth = self.deeper(item_start)?;
            let (children, _) =
                Parser::nested(&content, content_base, "list item", depth).parse_blocks(None)?;
            items.push(ListItem {
                children,
                span: Span::new(self.doc(item_start), self.doc(item_end)),
            });
            list_end = item_end;

            let next_is_item = !self.is_at_end() && {
                let next = self.line();
                let next_indent = leading_whitespace(next);
                next_indent < content_col
                    && list_marker(&next[next_indent..]).map_or(false, |m| m.continues(&first))
            };
            if !next_is_item {
                break;
            }
            if pending_blanks > 0 {
                spread = true;
            }
        }

        Ok(Block::List {
            ordered: first.ordered,
            start: first.number,
            spread,
            items,
            span: Span::new(self.doc(at), self.doc(list_end)),
        })
    }

    /// `export` statements run until the next blank line
    fn parse_export(&mut self, at: usize) -> Block {
        let mut end = at;
        while !self.is_at_end() {
            let line = self.line();
            if line.trim().is_empty() {
                break;
            }
            end = self.pos + line.trim_end().len();
            self.next_line();
        }

        Block::Export {
            source: self.src[at..end].to_string(),
            span: Span::new(self.doc(at), self.doc(end)),
        }
    }

    /// `{...}` alone on its line(s); otherwise it is part of a paragraph
    fn parse_block_expression(&mut self, at: usize) -> ParseResult<Option<Block>> {
        let (source, end) = Scanner::new(self.src, at, self.base).expression()?;
        if !self.rest_is_blank(end) {
            return Ok(None);
        }

        self.pos = end;
        self.next_line();
        Ok(Some(Block::Expression {
            source,
            span: Span::new(self.doc(at), self.doc(end)),
        }))
    }

    /// A tag alone on its line(s) opens a block component whose children are
    /// blocks; a tag followed by text on the same line is inline content.
    fn parse_block_component(&mut self, at: usize) -> ParseResult<Option<Block>> {
        let tag = match Scanner::new(self.src, at, self.base).open_tag()? {
            Some(tag) => tag,
            None => return Ok(None),
        };
        if !self.rest_is_blank(tag.end) {
            return Ok(None);
        }

        self.pos = tag.end;
        self.next_line();

        if tag.self_closing {
            return Ok(Some(Block::Component(ComponentNode {
                name: tag.name,
                attributes: tag.attributes,
                children: Vec::new(),
                self_closing: true,
                span: tag.span,
            })));
        }

        let depth = self.deeper(at)?;
        let outer = std::mem::replace(&mut self.depth, depth);
        let parsed = self.parse_blocks(Some(tag.name.as_str()));
        self.depth = outer;
        let (children, closed) = parsed?;
        let end = match closed {
            Some(end) => end,
            None => {
                return Err(ParseError::unterminated_component(
                    tag.span,
                    tag.name,
                    self.context,
                ))
            }
        };

        Ok(Some(Block::Component(ComponentNode {
            name: tag.name,
            attributes: tag.attributes,
            children,
            self_closing: false,
            span: Span::new(tag.span.start, end),
        })))
    }

    fn parse_paragraph(&mut self, at: usize, enclosing: Option<&str>) -> ParseResult<Block> {
        let mut end = self.line_end(at);
        self.next_line();

        while !self.is_at_end() {
            let line = self.line();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some(depth) = setext_depth(trimmed) {
                let text = self.src[at..end].trim_end();
                let output = parse_inline_nested(text, self.doc(at), "heading", None, self.depth)?;
                let heading_end = self.pos + line.trim_end().len();
                self.next_line();
                return Ok(Block::Heading {
                    depth,
                    children: output.children,
                    span: Span::new(self.doc(at), self.doc(heading_end)),
                });
            }

            if interrupts_paragraph(line.trim_start()) {
                break;
            }
            end = self.line_end(self.pos);
            self.next_line();
        }

        let text = self.src[at..end].trim_end();
        let output = parse_inline_nested(text, self.doc(at), "paragraph", enclosing, self.depth)?;
        let end = match output.stopped_at {
            Some(stop) => {
                self.pos = at + stop;
                at + stop
            }
            None => at + text.len(),
        };

        Ok(Block::Paragraph {
            children: output.children,
            span: Span::new(self.doc(at), self.doc(end)),
        })
    }

    fn is_table_start(&self, at: usize) -> bool {
        let header_end = self.line_end(at);
        let header = &self.src[at..header_end];
        if !header.contains('|') || header_end >= self.src.len() {
            return false;
        }
        let delimiter_line = &self.src[header_end + 1..self.line_end(header_end + 1)];
        match parse_delimiter_row(delimiter_line) {
            Some(align) => align.len() == split_row(header).len(),
            None => false,
        }
    }

    fn parse_table(&mut self, at: usize) -> ParseResult<Block> {
        let header_end = self.line_end(at);
        let header = &self.src[at..header_end];
        let head = self.parse_row(header, at)?;
        let width = head.len();

        self.next_line();
        let align = parse_delimiter_row(self.line()).unwrap_or_default();
        let mut end = self.pos + self.line().trim_end().len();
        self.next_line();

        let mut rows = Vec::new();
        while !self.is_at_end() {
            let line = self.line();
            let trimmed = line.trim_start();
            if trimmed.trim().is_empty() || interrupts_paragraph(trimmed) {
                break;
            }
            let mut row = self.parse_row(line, self.pos)?;
            row.resize_with(width, Vec::new);
            rows.push(row);
            end = self.pos + line.trim_end().len();
            self.next_line();
        }

        Ok(Block::Table {
            align,
            head,
            rows,
            span: Span::new(self.doc(at), self.doc(end)),
        })
    }

    fn parse_row(&self, line: &str, line_start: usize) -> ParseResult<Vec<TableCell>> {
        split_row(line)
            .into_iter()
            .map(|(start, end)| {
                let text = &line[start..end];
                parse_inline_nested(text, self.doc(line_start + start), "table cell", None, self.depth)
                    .map(|o| o.children)
            })
            .collect()
    }
}

/// Parse a Livemark document
pub fn parse(source: &str) -> ParseResult<Document> {
    Parser::new(source).parse_document()
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches(is_blank_char).len()
}

fn strip_indent(line: &str, indent: usize) -> String {
    let strip = leading_whitespace(line).min(indent);
    line[strip..].to_string()
}

/// Opening code fence: char and run length
fn fence_open(trimmed: &str) -> Option<(u8, usize)> {
    let first = *trimmed.as_bytes().first()?;
    if first != b'`' && first != b'~' {
        return None;
    }
    let run = trimmed.bytes().take_while(|b| *b == first).count();
    if run < 3 {
        return None;
    }
    // Backtick fences may not carry backticks in the info string
    if first == b'`' && trimmed[run..].contains('`') {
        return None;
    }
    Some((first, run))
}

/// ATX heading depth and the content range relative to the line start
fn atx_heading(trimmed: &str) -> Option<(u8, (usize, usize))> {
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let after = &trimmed[hashes..];
    if !after.is_empty() && !after.starts_with(is_blank_char) {
        return None;
    }

    let content_start = hashes + (after.len() - after.trim_start().len());
    let mut content = trimmed[content_start..].trim_end();
    // Optional closing sequence: `## Title ##`
    let without_hashes = content.trim_end_matches('#');
    if without_hashes.is_empty() || without_hashes.ends_with(is_blank_char) {
        content = without_hashes.trim_end();
    }

    Some((hashes as u8, (content_start, content_start + content.len())))
}

fn is_thematic_break(trimmed: &str) -> bool {
    let mut chars = trimmed.chars().filter(|c| !c.is_whitespace());
    let first = match chars.next() {
        Some(c @ ('-' | '*' | '_')) => c,
        _ => return false,
    };
    let mut count = 1;
    for c in chars {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

fn setext_depth(trimmed: &str) -> Option<u8> {
    if trimmed.bytes().all(|b| b == b'=') {
        Some(1)
    } else if trimmed.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

fn list_marker(trimmed: &str) -> Option<ListMarker> {
    let bytes = trimmed.as_bytes();
    let (ordered, symbol, number, marker_len) = match bytes.first()? {
        b @ (b'-' | b'*' | b'+') => (false, *b, None, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let delimiter = *bytes.get(digits)?;
            if digits > 9 || !matches!(delimiter, b'.' | b')') {
                return None;
            }
            (true, delimiter, trimmed[..digits].parse().ok(), digits + 1)
        }
        _ => return None,
    };

    let rest = &trimmed[marker_len..];
    if !rest.is_empty() && !rest.starts_with(is_blank_char) {
        return None;
    }
    let spaces = leading_whitespace(rest);
    let width = if spaces == 0 || spaces > 4 || rest.trim().is_empty() {
        marker_len + 1
    } else {
        marker_len + spaces
    };

    Some(ListMarker {
        ordered,
        symbol,
        number,
        width,
    })
}

/// Whether a line can start a new block in the middle of a paragraph
fn interrupts_paragraph(trimmed: &str) -> bool {
    if fence_open(trimmed.trim_end()).is_some()
        || atx_heading(trimmed.trim_end()).is_some()
        || is_thematic_break(trimmed)
        || trimmed.starts_with('>')
        || closing_tag_line(trimmed).is_some()
    {
        return true;
    }

    if let Some(marker) = list_marker(trimmed) {
        let has_content = !trimmed[marker.width.min(trimmed.len())..].trim().is_empty();
        return has_content && (!marker.ordered || marker.number == Some(1));
    }

    is_whole_line_tag(trimmed)
}

/// A line holding only an opening tag, such as `<Callout type="info">`
fn is_whole_line_tag(trimmed: &str) -> bool {
    let line = trimmed.trim_end();
    match Scanner::new(line, 0, 0).open_tag() {
        Ok(Some(tag)) => tag.end == line.len(),
        _ => false,
    }
}

/// Cell ranges (local to `line`, trimmed) of a table row
fn split_row(line: &str) -> Vec<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut bounds = Vec::new();
    let mut cell_start = 0;
    let mut in_code = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'`' => in_code = !in_code,
            b'|' if !in_code => {
                bounds.push((cell_start, i));
                cell_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    bounds.push((cell_start, bytes.len()));

    // Leading and trailing pipes produce empty outer cells
    if bounds.len() > 1 && line[bounds[0].0..bounds[0].1].trim().is_empty() {
        bounds.remove(0);
    }
    if bounds.len() > 1 {
        if let Some(&(start, end)) = bounds.last() {
            if line[start..end].trim().is_empty() {
                bounds.pop();
            }
        }
    }

    bounds
        .into_iter()
        .map(|(start, end)| {
            let cell = &line[start..end];
            let lead = cell.len() - cell.trim_start().len();
            (start + lead, start + lead + cell.trim().len())
        })
        .collect()
}

fn parse_delimiter_row(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('-') {
        return None;
    }
    split_row(line)
        .into_iter()
        .map(|(start, end)| {
            let cell = &line[start..end];
            let dashes = cell.trim_start_matches(':').trim_end_matches(':');
            if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
                return None;
            }
            Some(match (cell.starts_with(':'), cell.ends_with(':')) {
                (true, true) => Alignment::Center,
                (true, false) => Alignment::Left,
                (false, true) => Alignment::Right,
                (false, false) => Alignment::None,
            })
        })
        .collect()
}

fn is_blank_char(c: char) -> bool {
    c == ' ' || c == '\t'
}
