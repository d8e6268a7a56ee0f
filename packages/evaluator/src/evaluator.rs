use crate::module::{CompiledModule, Op, PropOp, PropValue};
use crate::registry::{RegistrySnapshot, RenderError};
use crate::value::{format_number, Value};
use crate::vdom::{DocumentTree, Props, UnknownTagFallback, VNode};
use livemark_parser::{BinaryOp, Expression, Span, TemplatePart, UnaryOp};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Evaluation error. Messages follow what a browser would report for the same
/// expression, since authors recognise those.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{name} is not defined")]
    UndefinedVariable { name: String, span: Span },

    #[error("Cannot read properties of {target} (reading '{property}')")]
    NullishAccess {
        target: String,
        property: String,
        span: Span,
    },

    #[error("{callee} is not a function")]
    NotAFunction { callee: String, span: Span },

    #[error("Objects are not valid as a child (found: object with keys {{{keys}}})")]
    InvalidChild { keys: String, span: Span },

    #[error("{message}")]
    Range { message: String, span: Span },

    #[error("{error}")]
    Component { error: RenderError, span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::UndefinedVariable { span, .. }
            | EvalError::NullishAccess { span, .. }
            | EvalError::NotAFunction { span, .. }
            | EvalError::InvalidChild { span, .. }
            | EvalError::Range { span, .. }
            | EvalError::Component { span, .. } => *span,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Longest string, in bytes, an expression may build. Longer results fail
/// with a `RangeError`-style message instead of exhausting memory.
pub const MAX_STRING_LENGTH: usize = 1 << 20;

fn checked_string(value: String, span: Span) -> EvalResult<Value> {
    if value.len() > MAX_STRING_LENGTH {
        return Err(invalid_string_length(span));
    }
    Ok(Value::String(value))
}

fn invalid_string_length(span: Span) -> EvalError {
    EvalError::Range {
        message: "Invalid string length".to_string(),
        span,
    }
}

/// Variables in scope: the module's exports
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    variables: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, name: String, value: Value) {
        self.variables.insert(name, value);
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }
}

/// Check if a name is a standard HTML element
fn is_html_tag(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr" | "address" | "area" | "article" | "aside" | "audio" |
        "b" | "bdi" | "bdo" | "blockquote" | "br" | "button" |
        "canvas" | "caption" | "cite" | "code" | "col" | "colgroup" |
        "data" | "datalist" | "dd" | "del" | "details" | "dfn" | "dialog" | "div" | "dl" | "dt" |
        "em" | "embed" |
        "fieldset" | "figcaption" | "figure" | "footer" | "form" |
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header" | "hgroup" | "hr" |
        "i" | "iframe" | "img" | "input" | "ins" |
        "kbd" |
        "label" | "legend" | "li" |
        "main" | "map" | "mark" | "menu" | "meter" |
        "nav" |
        "object" | "ol" | "optgroup" | "option" | "output" |
        "p" | "picture" | "pre" | "progress" |
        "q" |
        "rp" | "rt" | "ruby" |
        "s" | "samp" | "search" | "section" | "select" | "small" | "source" | "span" | "strong" | "sub" | "summary" | "sup" | "svg" |
        "table" | "tbody" | "td" | "template" | "textarea" | "tfoot" | "th" | "thead" | "time" | "tr" | "track" |
        "u" | "ul" |
        "var" | "video" |
        "wbr"
    )
}

/// Instantiates compiled modules against a registry snapshot
pub struct Evaluator {
    pub context: EvalContext,
    registry: RegistrySnapshot,
    fallback: UnknownTagFallback,
}

impl Evaluator {
    pub fn new(registry: RegistrySnapshot) -> Self {
        Self {
            context: EvalContext::new(),
            registry,
            fallback: UnknownTagFallback::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: UnknownTagFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Bind the exports in order, then render the body
    #[instrument(skip(self, module), fields(exports = module.exports.len(), ops = module.body.len()))]
    pub fn evaluate(&mut self, module: &CompiledModule) -> EvalResult<DocumentTree> {
        for export in &module.exports {
            let value = self.evaluate_expression(&export.value)?;
            debug!(name = %export.name, "Bound export");
            self.context.set_variable(export.name.clone(), value);
        }

        let nodes = self.evaluate_ops(&module.body)?;
        info!(nodes = nodes.len(), "Instantiated document");
        Ok(DocumentTree::new(nodes))
    }

    fn evaluate_ops(&self, ops: &[Op]) -> EvalResult<Vec<VNode>> {
        let mut nodes = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                Op::Text { value } => nodes.push(VNode::text(value.clone())),
                Op::Expression { expression } => {
                    let value = self.evaluate_expression(expression)?;
                    push_value(&mut nodes, value, expression.span())?;
                }
                Op::Element {
                    tag,
                    props,
                    children,
                    span,
                } => nodes.push(self.evaluate_element(tag, props, children, *span)?),
            }
        }
        Ok(nodes)
    }

    fn evaluate_element(
        &self,
        tag: &str,
        prop_ops: &[PropOp],
        child_ops: &[Op],
        span: Span,
    ) -> EvalResult<VNode> {
        let mut props = Props::new();
        for prop in prop_ops {
            let value = match &prop.value {
                PropValue::Static(value) => value.clone(),
                PropValue::Dynamic(expression) => self.evaluate_expression(expression)?,
            };
            props.insert(prop.name.clone(), value);
        }
        let children = self.evaluate_ops(child_ops)?;

        if let Some(descriptor) = self.registry.get(tag) {
            let output = descriptor
                .render(&props, children)
                .map_err(|error| EvalError::Component { error, span })?;
            return Ok(VNode::Component {
                name: tag.to_string(),
                props,
                output: Box::new(output),
            });
        }

        if is_html_tag(tag) {
            return Ok(VNode::element_with_props(tag, &props).with_children(children));
        }

        debug!(tag, fallback = ?self.fallback, "No component registered for tag");
        Ok(VNode::Unknown {
            name: tag.to_string(),
            props,
            children,
            fallback: self.fallback,
        })
    }

    /// Evaluate an expression
    pub fn evaluate_expression(&self, expr: &Expression) -> EvalResult<Value> {
        match expr {
            Expression::Literal { value, .. } => Ok(Value::String(value.clone())),
            Expression::Number { value, .. } => Ok(Value::Number(*value)),
            Expression::Boolean { value, .. } => Ok(Value::Boolean(*value)),
            Expression::Null { .. } => Ok(Value::Null),
            Expression::Undefined { .. } => Ok(Value::Undefined),

            Expression::Variable { name, span } => match self.context.get_variable(name) {
                Some(value) => Ok(value.clone()),
                None => Err(EvalError::UndefinedVariable {
                    name: name.clone(),
                    span: *span,
                }),
            },

            Expression::Member {
                object,
                property,
                span,
            } => {
                if let Some(value) = self.global_constant(object, property) {
                    return Ok(value);
                }
                let target = self.evaluate_expression(object)?;
                get_property(&target, property, *span)
            }

            Expression::Index {
                object,
                index,
                span,
            } => {
                let target = self.evaluate_expression(object)?;
                let key = self.evaluate_expression(index)?;
                get_property(&target, &key.to_string(), *span)
            }

            Expression::Call {
                callee,
                arguments,
                span,
            } => self.evaluate_call(callee, arguments, *span),

            Expression::Unary {
                operator, operand, ..
            } => {
                if *operator == UnaryOp::TypeOf {
                    if let Expression::Variable { name, .. } = operand.as_ref() {
                        if !self.context.has_variable(name) {
                            return Ok(Value::from("undefined"));
                        }
                    }
                }
                let value = self.evaluate_expression(operand)?;
                Ok(match operator {
                    UnaryOp::Not => Value::Boolean(!value.is_truthy()),
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::TypeOf => Value::from(value.type_name()),
                })
            }

            Expression::Binary {
                left,
                operator,
                right,
                span,
            } => self.evaluate_binary(left, *operator, right, *span),

            Expression::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.evaluate_expression(test)?.is_truthy() {
                    self.evaluate_expression(consequent)
                } else {
                    self.evaluate_expression(alternate)
                }
            }

            Expression::Array { elements, .. } => {
                let values = elements
                    .iter()
                    .map(|element| self.evaluate_expression(element))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::Array(values))
            }

            Expression::Object { properties, .. } => {
                let mut map = BTreeMap::new();
                for (key, value) in properties {
                    map.insert(key.clone(), self.evaluate_expression(value)?);
                }
                Ok(Value::Object(map))
            }

            Expression::Template { parts, span } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        TemplatePart::Expression(expr) => {
                            out.push_str(&self.evaluate_expression(expr)?.to_string())
                        }
                    }
                }
                checked_string(out, *span)
            }
        }
    }

    fn evaluate_binary(
        &self,
        left: &Expression,
        op: BinaryOp,
        right: &Expression,
        span: Span,
    ) -> EvalResult<Value> {
        let lhs = self.evaluate_expression(left)?;

        // Short-circuit operators return one of their operands
        let short_circuit = match op {
            BinaryOp::And => Some(!lhs.is_truthy()),
            BinaryOp::Or => Some(lhs.is_truthy()),
            BinaryOp::Coalesce => Some(!lhs.is_nullish()),
            _ => None,
        };
        match short_circuit {
            Some(true) => return Ok(lhs),
            Some(false) => return self.evaluate_expression(right),
            None => {}
        }

        let rhs = self.evaluate_expression(right)?;
        Ok(match op {
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(_) | Value::Array(_) | Value::Object(_), _)
                | (_, Value::String(_) | Value::Array(_) | Value::Object(_)) => {
                    checked_string(format!("{}{}", lhs, rhs), span)?
                }
                _ => Value::Number(lhs.to_number() + rhs.to_number()),
            },
            BinaryOp::Subtract => Value::Number(lhs.to_number() - rhs.to_number()),
            BinaryOp::Multiply => Value::Number(lhs.to_number() * rhs.to_number()),
            BinaryOp::Divide => Value::Number(lhs.to_number() / rhs.to_number()),
            BinaryOp::Remainder => Value::Number(lhs.to_number() % rhs.to_number()),
            BinaryOp::StrictEquals => Value::Boolean(strict_equals(&lhs, &rhs)),
            BinaryOp::StrictNotEquals => Value::Boolean(!strict_equals(&lhs, &rhs)),
            BinaryOp::Equals => Value::Boolean(loose_equals(&lhs, &rhs)),
            BinaryOp::NotEquals => Value::Boolean(!loose_equals(&lhs, &rhs)),
            BinaryOp::LessThan => Value::Boolean(compare(&lhs, &rhs, |o| o.is_lt())),
            BinaryOp::LessThanOrEqual => Value::Boolean(compare(&lhs, &rhs, |o| o.is_le())),
            BinaryOp::GreaterThan => Value::Boolean(compare(&lhs, &rhs, |o| o.is_gt())),
            BinaryOp::GreaterThanOrEqual => Value::Boolean(compare(&lhs, &rhs, |o| o.is_ge())),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => rhs,
        })
    }

    /// `Math.PI` and friends, unless the name is shadowed by an export
    fn global_constant(&self, object: &Expression, property: &str) -> Option<Value> {
        let Expression::Variable { name, .. } = object else {
            return None;
        };
        if self.context.has_variable(name) {
            return None;
        }
        match (name.as_str(), property) {
            ("Math", "PI") => Some(Value::Number(std::f64::consts::PI)),
            ("Math", "E") => Some(Value::Number(std::f64::consts::E)),
            ("Number", "MAX_SAFE_INTEGER") => Some(Value::Number(9007199254740991.0)),
            _ => None,
        }
    }

    fn evaluate_call(&self, callee: &Expression, arguments: &[Expression], span: Span) -> EvalResult<Value> {
        let args = arguments
            .iter()
            .map(|arg| self.evaluate_expression(arg))
            .collect::<EvalResult<Vec<_>>>()?;

        match callee {
            Expression::Variable { name, span: name_span } => {
                if !self.context.has_variable(name) {
                    if let Some(result) = call_global_function(name, &args) {
                        return Ok(result);
                    }
                    return Err(EvalError::UndefinedVariable {
                        name: name.clone(),
                        span: *name_span,
                    });
                }
                Err(EvalError::NotAFunction {
                    callee: name.clone(),
                    span,
                })
            }

            Expression::Member {
                object, property, ..
            } => {
                if let Expression::Variable { name, .. } = object.as_ref() {
                    if !self.context.has_variable(name) {
                        if let Some(result) = call_static_method(name, property, &args) {
                            return Ok(result);
                        }
                    }
                }

                let target = self.evaluate_expression(object)?;
                if target.is_nullish() {
                    return Err(EvalError::NullishAccess {
                        target: target.to_string(),
                        property: property.clone(),
                        span,
                    });
                }

                match call_method(&target, property, &args, span)? {
                    Some(result) => Ok(result),
                    None => Err(EvalError::NotAFunction {
                        callee: describe_callee(callee),
                        span,
                    }),
                }
            }

            other => {
                self.evaluate_expression(other)?;
                Err(EvalError::NotAFunction {
                    callee: describe_callee(other),
                    span,
                })
            }
        }
    }
}

/// Evaluate `module` against `registry` in a fresh scope
pub fn instantiate(
    module: &CompiledModule,
    registry: &RegistrySnapshot,
    fallback: UnknownTagFallback,
) -> EvalResult<DocumentTree> {
    Evaluator::new(registry.clone())
        .with_fallback(fallback)
        .evaluate(module)
}

/// Append the nodes a value renders as. Booleans and nullish values render
/// nothing; plain objects cannot be rendered.
fn push_value(nodes: &mut Vec<VNode>, value: Value, span: Span) -> EvalResult<()> {
    match value {
        Value::String(s) if s.is_empty() => {}
        Value::String(s) => nodes.push(VNode::text(s)),
        Value::Number(n) => nodes.push(VNode::text(format_number(n))),
        Value::Boolean(_) | Value::Null | Value::Undefined => {}
        Value::Array(items) => {
            for item in items {
                push_value(nodes, item, span)?;
            }
        }
        Value::Object(map) => {
            return Err(EvalError::InvalidChild {
                keys: map.keys().cloned().collect::<Vec<_>>().join(", "),
                span,
            })
        }
    }
    Ok(())
}

fn get_property(target: &Value, property: &str, span: Span) -> EvalResult<Value> {
    match target {
        Value::Null | Value::Undefined => Err(EvalError::NullishAccess {
            target: target.to_string(),
            property: property.to_string(),
            span,
        }),
        Value::String(s) => Ok(match property {
            "length" => Value::Number(s.encode_utf16().count() as f64),
            _ => match property.parse::<usize>() {
                Ok(index) => s
                    .chars()
                    .nth(index)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Undefined),
                Err(_) => Value::Undefined,
            },
        }),
        Value::Array(items) => Ok(match property {
            "length" => Value::Number(items.len() as f64),
            _ => match property.parse::<usize>() {
                Ok(index) => items.get(index).cloned().unwrap_or(Value::Undefined),
                Err(_) => Value::Undefined,
            },
        }),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Undefined)),
        Value::Number(_) | Value::Boolean(_) => Ok(Value::Undefined),
    }
}

fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => a == b,
    }
}

fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_nullish() || y.is_nullish() => x.is_nullish() && y.is_nullish(),
        (Value::Number(_), Value::String(_) | Value::Boolean(_))
        | (Value::String(_) | Value::Boolean(_), Value::Number(_))
        | (Value::Boolean(_), Value::String(_))
        | (Value::String(_), Value::Boolean(_)) => a.to_number() == b.to_number(),
        _ => strict_equals(a, b),
    }
}

fn compare(a: &Value, b: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return test(x.cmp(y));
    }
    a.to_number()
        .partial_cmp(&b.to_number())
        .map(test)
        .unwrap_or(false)
}

fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Variable { name, .. } => name.clone(),
        Expression::Member {
            object, property, ..
        } => format!("{}.{}", describe_callee(object), property),
        Expression::Index { object, .. } => format!("{}[...]", describe_callee(object)),
        Expression::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        Expression::Literal { value, .. } => format!("\"{}\"", value),
        Expression::Number { value, .. } => format_number(*value),
        _ => "expression".to_string(),
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn call_global_function(name: &str, args: &[Value]) -> Option<Value> {
    let first = arg(args, 0);
    Some(match name {
        "String" => Value::String(if args.is_empty() { String::new() } else { first.to_string() }),
        "Number" => Value::Number(if args.is_empty() { 0.0 } else { first.to_number() }),
        "Boolean" => Value::Boolean(first.is_truthy()),
        "parseInt" => {
            let text = first.to_string();
            let trimmed = text.trim();
            let digits: String = trimmed
                .char_indices()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect();
            Value::Number(digits.parse::<f64>().unwrap_or(f64::NAN))
        }
        "parseFloat" => Value::Number(first.to_string().trim().parse().unwrap_or(f64::NAN)),
        "isNaN" => Value::Boolean(first.to_number().is_nan()),
        _ => return None,
    })
}

fn call_static_method(object: &str, method: &str, args: &[Value]) -> Option<Value> {
    let numbers = || args.iter().map(Value::to_number);
    let first = || arg(args, 0).to_number();

    Some(match (object, method) {
        ("Math", "max") => Value::Number(numbers().fold(f64::NEG_INFINITY, f64::max)),
        ("Math", "min") => Value::Number(numbers().fold(f64::INFINITY, f64::min)),
        ("Math", "round") => Value::Number((first() + 0.5).floor()),
        ("Math", "floor") => Value::Number(first().floor()),
        ("Math", "ceil") => Value::Number(first().ceil()),
        ("Math", "abs") => Value::Number(first().abs()),
        ("Math", "sqrt") => Value::Number(first().sqrt()),
        ("Math", "pow") => Value::Number(first().powf(arg(args, 1).to_number())),
        ("JSON", "stringify") => Value::String(arg(args, 0).to_json()),
        ("Array", "isArray") => Value::Boolean(matches!(arg(args, 0), Value::Array(_))),
        ("Object", "keys") => match arg(args, 0) {
            Value::Object(map) => Value::Array(map.keys().cloned().map(Value::String).collect()),
            _ => Value::Array(Vec::new()),
        },
        ("Object", "values") => match arg(args, 0) {
            Value::Object(map) => Value::Array(map.into_values().collect()),
            _ => Value::Array(Vec::new()),
        },
        _ => return None,
    })
}

/// Call a built-in method. `Ok(None)` when `target` has no such method.
fn call_method(target: &Value, method: &str, args: &[Value], span: Span) -> EvalResult<Option<Value>> {
    if method == "toString" {
        return Ok(Some(Value::String(target.to_string())));
    }

    let result = match target {
        Value::String(s) => {
            check_string_growth(s, method, args, span)?;
            string_method(s, method, args)
        }
        Value::Array(items) => {
            if method == "join" {
                let separator = match arg(args, 0) {
                    Value::Undefined => 1,
                    other => other.to_string().len(),
                };
                let joined: usize = items.iter().map(|item| item.to_string().len() + separator).sum();
                if joined > MAX_STRING_LENGTH {
                    return Err(invalid_string_length(span));
                }
            }
            array_method(items, method, args)
        }
        Value::Number(n) => match method {
            "toFixed" => {
                let digits = arg(args, 0).to_number();
                let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
                if !(0.0..=100.0).contains(&digits) {
                    return Err(EvalError::Range {
                        message: "toFixed() digits argument must be between 0 and 100".to_string(),
                        span,
                    });
                }
                Some(Value::String(format!("{:.*}", digits as usize, n)))
            }
            _ => None,
        },
        _ => None,
    };
    Ok(result)
}

/// Reject `repeat`/`padStart`/`padEnd` calls whose result would exceed
/// `MAX_STRING_LENGTH`, before anything is allocated
fn check_string_growth(s: &str, method: &str, args: &[Value], span: Span) -> EvalResult<()> {
    let requested = match method {
        "repeat" => {
            let count = arg(args, 0).to_number();
            let count = if count.is_nan() { 0.0 } else { count.trunc() };
            if count < 0.0 || count.is_infinite() {
                return Err(EvalError::Range {
                    message: format!("Invalid count value: {}", format_number(count)),
                    span,
                });
            }
            s.len() as f64 * count
        }
        "padStart" | "padEnd" => arg(args, 0).to_number(),
        _ => return Ok(()),
    };
    if requested > MAX_STRING_LENGTH as f64 {
        return Err(invalid_string_length(span));
    }
    Ok(())
}

/// Resolve a possibly negative `slice` bound against `len`
fn slice_bound(value: Value, len: usize, default: usize) -> usize {
    if value == Value::Undefined {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    if n < 0.0 {
        len.saturating_sub((-n) as usize)
    } else {
        (n as usize).min(len)
    }
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Option<Value> {
    let text_arg = |index: usize| arg(args, index).to_string();
    let chars: Vec<char> = s.chars().collect();

    Some(match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "trimStart" => Value::String(s.trim_start().to_string()),
        "trimEnd" => Value::String(s.trim_end().to_string()),
        "includes" => Value::Boolean(s.contains(&text_arg(0))),
        "startsWith" => Value::Boolean(s.starts_with(&text_arg(0))),
        "endsWith" => Value::Boolean(s.ends_with(&text_arg(0))),
        "indexOf" => Value::Number(match s.find(&text_arg(0)) {
            Some(byte) => s[..byte].chars().count() as f64,
            None => -1.0,
        }),
        "charAt" => Value::String(
            chars
                .get(arg(args, 0).to_number() as usize)
                .map(|c| c.to_string())
                .unwrap_or_default(),
        ),
        "slice" => {
            let start = slice_bound(arg(args, 0), chars.len(), 0);
            let end = slice_bound(arg(args, 1), chars.len(), chars.len());
            Value::String(if start < end { chars[start..end].iter().collect() } else { String::new() })
        }
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::String(s.to_string())],
                separator => {
                    let separator = separator.to_string();
                    if separator.is_empty() {
                        chars.iter().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::Array(parts)
        }
        "repeat" => Value::String(s.repeat(arg(args, 0).to_number().max(0.0) as usize)),
        "replace" => Value::String(s.replacen(&text_arg(0), &text_arg(1), 1)),
        "replaceAll" => Value::String(s.replace(&text_arg(0), &text_arg(1))),
        "padStart" | "padEnd" => {
            let width = arg(args, 0).to_number().max(0.0) as usize;
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_string(),
            };
            let missing = width.saturating_sub(chars.len());
            let padding: String = fill.chars().cycle().take(if fill.is_empty() { 0 } else { missing }).collect();
            Value::String(if method == "padStart" {
                format!("{}{}", padding, s)
            } else {
                format!("{}{}", s, padding)
            })
        }
        "concat" => Value::String(
            std::iter::once(s.to_string())
                .chain(args.iter().map(Value::to_string))
                .collect(),
        ),
        _ => return None,
    })
}

fn array_method(items: &[Value], method: &str, args: &[Value]) -> Option<Value> {
    Some(match method {
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
                    .collect::<Vec<_>>()
                    .join(separator.as_str()),
            )
        }
        "includes" => {
            let needle = arg(args, 0);
            Value::Boolean(items.iter().any(|item| strict_equals(item, &needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            Value::Number(
                items
                    .iter()
                    .position(|item| strict_equals(item, &needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            )
        }
        "slice" => {
            let start = slice_bound(arg(args, 0), items.len(), 0);
            let end = slice_bound(arg(args, 1), items.len(), items.len());
            Value::Array(if start < end { items[start..end].to_vec() } else { Vec::new() })
        }
        "concat" => {
            let mut out = items.to_vec();
            for extra in args {
                match extra {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::Array(out)
        }
        "reverse" => Value::Array(items.iter().rev().cloned().collect()),
        "at" => {
            let index = arg(args, 0).to_number();
            let index = if index < 0.0 { items.len() as f64 + index } else { index };
            if index >= 0.0 {
                items.get(index as usize).cloned().unwrap_or(Value::Undefined)
            } else {
                Value::Undefined
            }
        }
        _ => return None,
    })
}
