use serde::{Deserialize, Serialize};

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Root document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    pub children: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Block-level (flow) content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    /// ATX heading (`#` .. `######`)
    Heading {
        depth: u8,
        children: Vec<Inline>,
        span: Span,
    },

    Paragraph { children: Vec<Inline>, span: Span },

    /// Bullet or ordered list
    List {
        ordered: bool,
        start: Option<u64>,
        /// Loose list: items are separated by blank lines
        spread: bool,
        items: Vec<ListItem>,
        span: Span,
    },

    BlockQuote { children: Vec<Block>, span: Span },

    /// Fenced code block
    Code {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
        span: Span,
    },

    /// GFM table
    Table {
        align: Vec<Alignment>,
        head: Vec<TableCell>,
        rows: Vec<Vec<TableCell>>,
        span: Span,
    },

    ThematicBreak { span: Span },

    /// `export const name = ...` statement, kept as raw source
    Export { source: String, span: Span },

    /// `{...}` on its own line; `source` is the text between the braces
    Expression { source: String, span: Span },

    /// Component invocation whose children are blocks
    Component(ComponentNode<Block>),
}

impl Block {
    pub fn span(&self) -> Span {
        match self {
            Block::Heading { span, .. }
            | Block::Paragraph { span, .. }
            | Block::List { span, .. }
            | Block::BlockQuote { span, .. }
            | Block::Code { span, .. }
            | Block::Table { span, .. }
            | Block::ThematicBreak { span }
            | Block::Export { span, .. }
            | Block::Expression { span, .. } => *span,
            Block::Component(node) => node.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub children: Vec<Block>,
    pub span: Span,
}

pub type TableCell = Vec<Inline>;

/// Column alignment from the table delimiter row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Alignment::None => None,
            Alignment::Left => Some("left"),
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
        }
    }
}

/// Inline (phrasing) content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Inline {
    Text { value: String, span: Span },

    Emphasis { children: Vec<Inline>, span: Span },

    Strong { children: Vec<Inline>, span: Span },

    /// `~~strikethrough~~`
    Delete { children: Vec<Inline>, span: Span },

    /// Code span
    Code { value: String, span: Span },

    Link {
        href: String,
        title: Option<String>,
        children: Vec<Inline>,
        span: Span,
    },

    Image {
        src: String,
        alt: String,
        title: Option<String>,
        span: Span,
    },

    /// Hard line break
    Break { span: Span },

    /// `{...}` inside text; `source` is the text between the braces
    Expression { source: String, span: Span },

    /// Component invocation whose children are inline
    Component(ComponentNode<Inline>),
}

impl Inline {
    pub fn span(&self) -> Span {
        match self {
            Inline::Text { span, .. }
            | Inline::Emphasis { span, .. }
            | Inline::Strong { span, .. }
            | Inline::Delete { span, .. }
            | Inline::Code { span, .. }
            | Inline::Link { span, .. }
            | Inline::Image { span, .. }
            | Inline::Break { span }
            | Inline::Expression { span, .. } => *span,
            Inline::Component(node) => node.span,
        }
    }

    /// Concatenated text content, ignoring markup
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            match inline {
                Inline::Text { value, .. } | Inline::Code { value, .. } => out.push_str(value),
                Inline::Emphasis { children, .. }
                | Inline::Strong { children, .. }
                | Inline::Delete { children, .. }
                | Inline::Link { children, .. } => out.push_str(&Inline::plain_text(children)),
                Inline::Component(node) => out.push_str(&Inline::plain_text(&node.children)),
                Inline::Image { alt, .. } => out.push_str(alt),
                Inline::Break { .. } => out.push(' '),
                Inline::Expression { .. } => {}
            }
        }
        out
    }
}

/// `<Name attr=...>children</Name>` or `<Name ... />`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode<C> {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<C>,
    pub self_closing: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttributeValue {
    /// Bare attribute (`<Accordion defaultOpen>`), equivalent to `={true}`
    Flag,

    /// Quoted string value
    Literal { value: String },

    /// `{...}` value; `offset` is where `source` starts in the document
    Expression { source: String, offset: usize },
}

/// Expression (attribute values, `{...}` in text, export initialisers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    /// String literal
    Literal { value: String, span: Span },

    /// Number literal
    Number { value: f64, span: Span },

    /// Boolean literal
    Boolean { value: bool, span: Span },

    Null { span: Span },

    Undefined { span: Span },

    /// Variable reference
    Variable { name: String, span: Span },

    /// Member access (obj.prop)
    Member {
        object: Box<Expression>,
        property: String,
        span: Span,
    },

    /// Computed member access (obj[expr])
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },

    /// Function or method call
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },

    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },

    /// Binary operation (a + b)
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
        span: Span,
    },

    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
        span: Span,
    },

    Array { elements: Vec<Expression>, span: Span },

    Object {
        properties: Vec<(String, Expression)>,
        span: Span,
    },

    /// Template literal with `${...}` interpolation
    Template { parts: Vec<TemplatePart>, span: Span },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal { span, .. }
            | Expression::Number { span, .. }
            | Expression::Boolean { span, .. }
            | Expression::Null { span }
            | Expression::Undefined { span }
            | Expression::Variable { span, .. }
            | Expression::Member { span, .. }
            | Expression::Index { span, .. }
            | Expression::Call { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Conditional { span, .. }
            | Expression::Array { span, .. }
            | Expression::Object { span, .. }
            | Expression::Template { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    TypeOf,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    StrictEquals,
    StrictNotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::StrictEquals => "===",
            BinaryOp::StrictNotEquals => "!==",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}

/// Template string parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    Literal(String),
    Expression(Expression),
}

/// Parsed `export const name = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDecl {
    pub name: String,
    pub value: Expression,
    pub span: Span,
}
