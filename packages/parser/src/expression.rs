//! Recursive descent parser for the `{...}` expression language
//!
//! A JavaScript subset: literals, arrays, objects, member access, calls,
//! unary and binary operators and the ternary. Precedence climbs from
//! `parse_conditional` (lowest) to `parse_primary` (highest).

use crate::ast::{BinaryOp, ExportDecl, Expression, Span, TemplatePart, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, SpannedToken, Token};
use crate::parser::MAX_NESTING_DEPTH;

pub struct ExpressionParser<'src> {
    tokens: Vec<SpannedToken<'src>>,
    pos: usize,
    /// Document offset just past the source, used for end-of-input spans
    end: usize,
    /// Open groups and prefix operators, bounded by `MAX_NESTING_DEPTH`
    depth: usize,
}

impl<'src> ExpressionParser<'src> {
    pub fn new(source: &'src str, offset: usize) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source, offset)?,
            pos: 0,
            end: offset + source.len(),
            depth: 0,
        })
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parse a complete expression, rejecting trailing tokens
    pub fn parse_complete(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_expression()?;
        if let Some((token, span)) = self.peek() {
            return Err(ParseError::unexpected_token(
                *span,
                "end of expression",
                token.describe(),
            ));
        }
        Ok(expr)
    }

    /// Parse one or more `export const name = value` statements
    pub fn parse_exports(&mut self) -> ParseResult<Vec<ExportDecl>> {
        let mut exports = Vec::new();

        while !self.is_at_end() {
            let start = self.peek_span().start;
            self.expect(Token::Export, "`export`")?;
            match self.peek() {
                Some((Token::Const, _)) | Some((Token::Let, _)) | Some((Token::Var, _)) => {
                    self.advance();
                }
                Some((Token::Ident("function"), span)) | Some((Token::Ident("default"), span)) => {
                    return Err(ParseError::invalid_syntax(
                        *span,
                        "Only `export const name = value` is supported",
                    ));
                }
                _ => {
                    return Err(ParseError::unexpected_token(
                        self.peek_span(),
                        "`const`",
                        self.describe_peek(),
                    ));
                }
            }

            let name = self.expect_ident()?;
            self.expect(Token::Assign, "`=`")?;
            let value = self.parse_expression()?;
            let end = self.previous_end();
            self.match_token(&Token::Semicolon);

            exports.push(ExportDecl {
                name,
                value,
                span: Span::new(start, end),
            });
        }

        Ok(exports)
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.nested(Self::parse_conditional)
    }

    /// Run `parse` one nesting level deeper
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<Expression>) -> ParseResult<Expression> {
        self.deepen()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Count one more level of nesting. Operator and postfix chains nest to
    /// the left, so each link counts as a level too.
    fn deepen(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                span: self.peek_span(),
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Parse ternary (lowest precedence)
    fn parse_conditional(&mut self) -> ParseResult<Expression> {
        let test = self.parse_or_expression()?;

        if self.match_token(&Token::Question) {
            let consequent = self.parse_expression()?;
            self.expect(Token::Colon, "`:`")?;
            let alternate = self.parse_expression()?;
            let span = test.span().merge(alternate.span());
            return Ok(Expression::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
                span,
            });
        }

        Ok(test)
    }

    /// Parse OR / nullish coalescing
    fn parse_or_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_and_expression()?;

        loop {
            let operator = if self.match_token(&Token::OrOr) {
                BinaryOp::Or
            } else if self.match_token(&Token::Coalesce) {
                BinaryOp::Coalesce
            } else {
                break;
            };
            self.deepen()?;
            let right = self.parse_and_expression()?;
            left = binary(left, operator, right);
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_equality_expression()?;

        while self.match_token(&Token::AndAnd) {
            self.deepen()?;
            let right = self.parse_equality_expression()?;
            left = binary(left, BinaryOp::And, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse equality expression (== != === !==)
    fn parse_equality_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_comparison_expression()?;

        while let Some(op) = self.match_operator(|t| match t {
            Token::EqEq => Some(BinaryOp::Equals),
            Token::NotEq => Some(BinaryOp::NotEquals),
            Token::EqEqEq => Some(BinaryOp::StrictEquals),
            Token::NotEqEq => Some(BinaryOp::StrictNotEquals),
            _ => None,
        }) {
            self.deepen()?;
            let right = self.parse_comparison_expression()?;
            left = binary(left, op, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse comparison expression (< > <= >=)
    fn parse_comparison_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_additive_expression()?;

        while let Some(op) = self.match_operator(|t| match t {
            Token::Lt => Some(BinaryOp::LessThan),
            Token::Le => Some(BinaryOp::LessThanOrEqual),
            Token::Gt => Some(BinaryOp::GreaterThan),
            Token::Ge => Some(BinaryOp::GreaterThanOrEqual),
            _ => None,
        }) {
            self.deepen()?;
            let right = self.parse_additive_expression()?;
            left = binary(left, op, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse additive expression (+ -)
    fn parse_additive_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_multiplicative_expression()?;

        while let Some(op) = self.match_operator(|t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }) {
            self.deepen()?;
            let right = self.parse_multiplicative_expression()?;
            left = binary(left, op, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse multiplicative expression (* / %)
    fn parse_multiplicative_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_unary_expression()?;

        while let Some(op) = self.match_operator(|t| match t {
            Token::Star => Some(BinaryOp::Multiply),
            Token::Slash => Some(BinaryOp::Divide),
            Token::Percent => Some(BinaryOp::Remainder),
            _ => None,
        }) {
            self.deepen()?;
            let right = self.parse_unary_expression()?;
            left = binary(left, op, right);
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> ParseResult<Expression> {
        let operator = match self.peek() {
            Some((Token::Bang, _)) => Some(UnaryOp::Not),
            Some((Token::Minus, _)) => Some(UnaryOp::Negate),
            Some((Token::Plus, _)) => Some(UnaryOp::Plus),
            Some((Token::TypeOf, _)) => Some(UnaryOp::TypeOf),
            _ => None,
        };

        match operator {
            Some(operator) => {
                let start = self.peek_span().start;
                self.advance();
                let operand = self.nested(Self::parse_unary_expression)?;
                let span = Span::new(start, operand.span().end);
                Ok(Expression::Unary {
                    operator,
                    operand: Box::new(operand),
                    span,
                })
            }
            None => self.parse_postfix_expression(),
        }
    }

    /// Member access, indexing and calls: `a.b[0](c)`
    fn parse_postfix_expression(&mut self) -> ParseResult<Expression> {
        let base = self.depth;
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.peek() {
                Some((Token::Dot, _)) => {
                    self.deepen()?;
                    self.advance();
                    let property = self.expect_property_name()?;
                    let span = Span::new(expr.span().start, self.previous_end());
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property,
                        span,
                    };
                }
                Some((Token::LBracket, _)) => {
                    self.deepen()?;
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket, "`]`")?;
                    let span = Span::new(expr.span().start, self.previous_end());
                    expr = Expression::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                Some((Token::LParen, _)) => {
                    self.deepen()?;
                    self.advance();
                    let arguments = self.parse_list(Token::RParen, "`)`")?;
                    let span = Span::new(expr.span().start, self.previous_end());
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        arguments,
                        span,
                    };
                }
                Some((Token::QuestionDot, span)) => {
                    return Err(ParseError::invalid_syntax(
                        *span,
                        "Optional chaining (`?.`) is not supported",
                    ));
                }
                _ => break,
            }
        }

        self.depth = base;
        Ok(expr)
    }

    /// Parse primary expression (literals, variables, groups, arrays, objects)
    fn parse_primary_expression(&mut self) -> ParseResult<Expression> {
        let (token, span) = match self.peek() {
            Some((token, span)) => (token.clone(), *span),
            None => {
                return Err(ParseError::unexpected_eof(
                    Span::empty(self.end),
                    "an expression",
                ))
            }
        };

        match token {
            Token::Number(raw) => {
                self.advance();
                let value = raw.parse::<f64>().map_err(|_| {
                    ParseError::invalid_syntax(span, format!("Invalid number `{}`", raw))
                })?;
                Ok(Expression::Number { value, span })
            }
            Token::String(raw) => {
                self.advance();
                Ok(Expression::Literal {
                    value: unescape(&raw[1..raw.len() - 1]),
                    span,
                })
            }
            Token::Template(raw) => {
                self.advance();
                parse_template(raw, span)
            }
            Token::True | Token::False => {
                self.advance();
                Ok(Expression::Boolean {
                    value: matches!(token, Token::True),
                    span,
                })
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Null { span })
            }
            Token::Undefined => {
                self.advance();
                Ok(Expression::Undefined { span })
            }
            Token::Ident(name) => {
                self.advance();
                if self.check(&Token::Arrow) {
                    return Err(ParseError::invalid_syntax(
                        self.peek_span(),
                        "Arrow functions are not supported in expressions",
                    ));
                }
                Ok(Expression::Variable {
                    name: name.to_string(),
                    span,
                })
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let elements = self.parse_list(Token::RBracket, "`]`")?;
                Ok(Expression::Array {
                    elements,
                    span: Span::new(span.start, self.previous_end()),
                })
            }
            Token::LBrace => {
                self.advance();
                self.parse_object(span.start)
            }
            other => Err(ParseError::unexpected_token(
                span,
                "an expression",
                other.describe(),
            )),
        }
    }

    /// Comma separated expressions up to `close` (trailing comma allowed)
    fn parse_list(&mut self, close: Token<'src>, close_label: &str) -> ParseResult<Vec<Expression>> {
        let mut items = Vec::new();

        while !self.check(&close) && !self.is_at_end() {
            if let Some((Token::Spread, span)) = self.peek() {
                return Err(ParseError::invalid_syntax(
                    *span,
                    "Spread syntax is not supported",
                ));
            }
            items.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect(close, close_label)?;
        Ok(items)
    }

    fn parse_object(&mut self, start: usize) -> ParseResult<Expression> {
        let mut properties = Vec::new();

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let (key, key_span) = match self.peek() {
                Some((Token::Ident(name), span)) => (name.to_string(), *span),
                Some((Token::String(raw), span)) => (unescape(&raw[1..raw.len() - 1]), *span),
                Some((Token::Number(raw), span)) => (raw.to_string(), *span),
                _ => {
                    return Err(ParseError::unexpected_token(
                        self.peek_span(),
                        "a property name",
                        self.describe_peek(),
                    ))
                }
            };
            self.advance();

            let value = if self.match_token(&Token::Colon) {
                self.parse_expression()?
            } else {
                // Shorthand `{ title }`
                Expression::Variable {
                    name: key.clone(),
                    span: key_span,
                }
            };
            properties.push((key, value));

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        self.expect(Token::RBrace, "`}`")?;
        Ok(Expression::Object {
            properties,
            span: Span::new(start, self.previous_end()),
        })
    }

    fn peek(&self) -> Option<&SpannedToken<'src>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        matches!(self.peek(), Some((t, _)) if t == token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_operator(&mut self, map: impl Fn(&Token) -> Option<BinaryOp>) -> Option<BinaryOp> {
        let op = self.peek().and_then(|(token, _)| map(token))?;
        self.advance();
        Some(op)
    }

    fn expect(&mut self, token: Token, label: &str) -> ParseResult<()> {
        if self.match_token(&token) {
            Ok(())
        } else if self.is_at_end() {
            Err(ParseError::unexpected_eof(self.peek_span(), label))
        } else {
            Err(ParseError::unexpected_token(
                self.peek_span(),
                label,
                self.describe_peek(),
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::unexpected_token(
                self.peek_span(),
                "an identifier",
                self.describe_peek(),
            )),
        }
    }

    /// Property names may be keywords (`obj.default`, `obj.null`)
    fn expect_property_name(&mut self) -> ParseResult<String> {
        let name = match self.peek() {
            Some((Token::Ident(name), _)) => name.to_string(),
            Some((Token::True, _)) => "true".to_string(),
            Some((Token::False, _)) => "false".to_string(),
            Some((Token::Null, _)) => "null".to_string(),
            Some((Token::Undefined, _)) => "undefined".to_string(),
            Some((Token::TypeOf, _)) => "typeof".to_string(),
            Some((Token::Export, _)) => "export".to_string(),
            Some((Token::Const, _)) => "const".to_string(),
            Some((Token::Let, _)) => "let".to_string(),
            Some((Token::Var, _)) => "var".to_string(),
            _ => {
                return Err(ParseError::unexpected_token(
                    self.peek_span(),
                    "a property name",
                    self.describe_peek(),
                ))
            }
        };
        self.advance();
        Ok(name)
    }

    fn describe_peek(&self) -> String {
        match self.peek() {
            Some((token, _)) => token.describe(),
            None => "end of expression".to_string(),
        }
    }

    /// Span of the next token, or an empty span at the end of input
    fn peek_span(&self) -> Span {
        self.peek()
            .map(|(_, span)| *span)
            .unwrap_or_else(|| Span::empty(self.end))
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, span)| span.end)
            .unwrap_or(self.end)
    }
}

fn binary(left: Expression, operator: BinaryOp, right: Expression) -> Expression {
    let span = left.span().merge(right.span());
    Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}

/// Parse the text between `{` and `}`. `Ok(None)` means the region holds only
/// whitespace or comments (`{/* note */}`).
pub fn parse_expression(source: &str, offset: usize) -> ParseResult<Option<Expression>> {
    let mut parser = ExpressionParser::new(source, offset)?;
    if parser.is_at_end() {
        return Ok(None);
    }
    parser.parse_complete().map(Some)
}

/// Parse the raw text of an export block
pub fn parse_exports(source: &str, offset: usize) -> ParseResult<Vec<ExportDecl>> {
    ExpressionParser::new(source, offset)?.parse_exports()
}

/// Split a template literal (with backticks) into literal and `${}` parts
fn parse_template(raw: &str, span: Span) -> ParseResult<Expression> {
    let inner = &raw[1..raw.len() - 1];
    let inner_offset = span.start + 1;
    let bytes = inner.as_bytes();

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            // Keep the escape for `unescape` below, but never treat `\${` as interpolation
            let next_len = inner[i + 1..].chars().next().map(char::len_utf8).unwrap_or(1);
            literal.push_str(&inner[i..i + 1 + next_len]);
            i += 1 + next_len;
            continue;
        }

        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let expr_start = i + 2;
            let mut depth = 1;
            let mut j = expr_start;
            while j < bytes.len() {
                match bytes[j] {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            if depth != 0 {
                return Err(ParseError::UnterminatedExpression {
                    span: Span::new(inner_offset + i, span.end),
                });
            }

            if !literal.is_empty() {
                parts.push(TemplatePart::Literal(unescape(&literal)));
                literal.clear();
            }
            let expr = parse_expression(&inner[expr_start..j], inner_offset + expr_start)?
                .ok_or_else(|| {
                    ParseError::invalid_syntax(
                        Span::new(inner_offset + i, inner_offset + j + 1),
                        "Empty `${}` in template literal",
                    )
                })?;
            parts.push(TemplatePart::Expression(expr));
            i = j + 1;
            continue;
        }

        let ch_len = inner[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        literal.push_str(&inner[i..i + ch_len]);
        i += ch_len;
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(unescape(&literal)));
    }

    Ok(Expression::Template { parts, span })
}

/// Resolve backslash escapes in a string literal body
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let mut hex = String::new();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    while let Some(&h) = chars.peek() {
                        chars.next();
                        if h == '}' {
                            break;
                        }
                        hex.push(h);
                    }
                } else {
                    for _ in 0..4 {
                        if let Some(h) = chars.next() {
                            hex.push(h);
                        }
                    }
                }
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
