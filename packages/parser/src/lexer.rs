//! Lexer for `{...}` expressions using logos
//!
//! Markdown itself is context sensitive and is scanned by hand in `parser`
//! and `inline`; only the embedded expression language goes through logos.

use crate::ast::Span;
use crate::error::{ParseError, ParseResult};
use logos::{FilterResult, Lexer, Logos};

/// Token types for the expression language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token<'src> {
    /// `/* ... */`, skipped; only emitted as an error when never closed
    #[token("/*", block_comment)]
    BlockComment,

    // Keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,
    #[token("typeof")]
    TypeOf,
    #[token("export")]
    Export,
    #[token("const")]
    Const,
    #[token("let")]
    Let,
    #[token("var")]
    Var,

    // Identifiers
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    // Literals (quotes are kept, the parser unescapes)
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| lex.slice())]
    String(&'src str),
    #[regex(r"`([^`\\]|\\.)*`", |lex| lex.slice())]
    Template(&'src str),

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("?.")]
    QuestionDot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("?")]
    Question,
    #[token("=")]
    Assign,

    // Operators
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("??")]
    Coalesce,
    #[token("=>")]
    Arrow,
    #[token("...")]
    Spread,
}

impl Token<'_> {
    /// Human readable token description for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier `{}`", name),
            Token::Number(n) => format!("number `{}`", n),
            Token::String(s) => format!("string {}", s),
            Token::Template(_) => "template literal".to_string(),
            Token::True => "`true`".to_string(),
            Token::False => "`false`".to_string(),
            Token::Null => "`null`".to_string(),
            Token::Undefined => "`undefined`".to_string(),
            Token::TypeOf => "keyword `typeof`".to_string(),
            Token::Export => "keyword `export`".to_string(),
            Token::Const => "keyword `const`".to_string(),
            Token::Let => "keyword `let`".to_string(),
            Token::Var => "keyword `var`".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::QuestionDot => "?.",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Question => "?",
            Token::Assign => "=",
            Token::Bang => "!",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::EqEqEq => "===",
            Token::NotEqEq => "!==",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Coalesce => "??",
            Token::Arrow => "=>",
            Token::Spread => "...",
            _ => "token",
        }
    }
}

/// Consume a block comment body up to and including `*/`
fn block_comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

pub type SpannedToken<'src> = (Token<'src>, Span);

/// Tokenize `source`; spans are shifted by `offset` so they point into the document
pub fn tokenize(source: &str, offset: usize) -> ParseResult<Vec<SpannedToken<'_>>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start + offset, range.end + offset);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) if lexer.slice().starts_with("/*") => {
                return Err(ParseError::UnterminatedComment { span })
            }
            Err(()) => return Err(ParseError::lexer_error(span, lexer.slice())),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("cols + 2", 0).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].0, Token::Ident("cols"));
        assert_eq!(tokens[1].0, Token::Plus);
        assert_eq!(tokens[2].0, Token::Number("2"));
    }

    #[test]
    fn test_tokenize_offsets_spans() {
        let tokens = tokenize("a", 10).unwrap();
        assert_eq!(tokens[0].1, Span::new(10, 11));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("/* a comment */", 0).unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_comments_between_tokens() {
        let tokens = tokenize("a /* first */ + /**/ b /* a * b / c **/", 0).unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|(token, _)| token).collect();
        assert_eq!(kinds, vec![Token::Ident("a"), Token::Plus, Token::Ident("b")]);

        let tokens = tokenize("/* one */ x // rest of line", 0).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].1, Span::new(10, 11));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("a /* never closed", 4).unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment { .. }));
        assert_eq!(err.span(), Span::new(6, 21));
    }

    #[test]
    fn test_longest_operator_wins() {
        let tokens = tokenize("a === b", 0).unwrap();
        assert_eq!(tokens[1].0, Token::EqEqEq);
    }

    #[test]
    fn test_unknown_character_is_error() {
        let err = tokenize("a # b", 0).unwrap_err();
        assert!(matches!(err, ParseError::LexerError { .. }));
    }
}
