//! Template bodies: element trees with `{{expression}}` interpolation.
//!
//! A body is a list of [`Node`]s built with the [`Element`] builder. Text and
//! attribute values may contain `{{...}}` expressions:
//!
//! - `{{title}}`: a helper called with no arguments, or else a data-context
//!   field.
//! - `{{state.count}}`: further segments index into the resulting value
//!   (object keys or array indices).
//! - `{{format price "EUR" 2}}`: a helper called with arguments; arguments
//!   are paths or literals (numbers, quoted strings, `true`, `false`, `null`).
//! - `{{this}}`: the whole data context.
//!
//! Evaluation produces a [`Rendered`] tree, which can be serialised to markup
//! or mounted into a [`Dom`].

use indexmap::IndexMap;
use serde_json::Value;

use crate::dom::node::{NodeData, NodeId};
use crate::dom::tree::Dom;

/// Elements that never have a closing tag.
const VOID_TAGS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr"];

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Name resolution for expressions.
pub trait Scope {
    /// Call the helper `name`, or return `None` if there is no such helper.
    fn call_helper(&self, name: &str, args: &[Value]) -> Option<Value>;

    /// The data context.
    fn data(&self) -> Value;
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Path(Vec<String>),
    Literal(Value),
}

/// A parsed `{{...}}` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    path: Vec<String>,
    args: Vec<Arg>,
}

impl Expr {
    /// Parse the inside of a `{{...}}`. Returns `None` for an empty expression.
    pub fn parse(source: &str) -> Option<Expr> {
        let mut tokens = tokenize(source).into_iter();
        let head = tokens.next()?;
        let path = split_path(&head);
        let args = tokens.map(|t| parse_arg(&t)).collect();
        Some(Expr { path, args })
    }

    /// Evaluate against a scope. Anything unresolvable is `Null`.
    pub fn eval(&self, scope: &dyn Scope) -> Value {
        let args: Vec<Value> = self
            .args
            .iter()
            .map(|arg| match arg {
                Arg::Literal(v) => v.clone(),
                Arg::Path(path) => resolve(path, &[], scope),
            })
            .collect();
        resolve(&self.path, &args, scope)
    }
}

fn resolve(path: &[String], args: &[Value], scope: &dyn Scope) -> Value {
    let Some((head, rest)) = path.split_first() else {
        return Value::Null;
    };
    let base = if head == "this" {
        scope.data()
    } else if let Some(v) = scope.call_helper(head, args) {
        v
    } else {
        scope.data().get(head.as_str()).cloned().unwrap_or(Value::Null)
    };
    rest.iter().fold(base, |value, segment| index(&value, segment))
}

fn index(value: &Value, segment: &str) -> Value {
    match value {
        Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn split_path(token: &str) -> Vec<String> {
    token.split('.').filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

fn parse_arg(token: &str) -> Arg {
    if let Some(inner) = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
    {
        return Arg::Literal(Value::String(inner.to_owned()));
    }
    match token {
        "true" => return Arg::Literal(Value::Bool(true)),
        "false" => return Arg::Literal(Value::Bool(false)),
        "null" | "undefined" => return Arg::Literal(Value::Null),
        _ => {}
    }
    if token.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        if let Ok(number) = serde_json::from_str::<serde_json::Number>(token) {
            return Arg::Literal(Value::Number(number));
        }
    }
    Arg::Path(split_path(token))
}

/// Split on whitespace, keeping quoted strings (with their quotes) whole.
fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in source.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => {
                current.push(ch);
                quote = Some(ch);
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Text form of a value: `Null` is empty, strings are unquoted, everything
/// else is JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Expr(Expr),
}

/// A string with interpolated expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    segments: Vec<Segment>,
}

impl Text {
    /// Parse `{{...}}` expressions out of `source`. An unterminated `{{` is
    /// kept literally.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_owned()));
            }
            if let Some(expr) = Expr::parse(&rest[start + 2..start + 2 + len]) {
                segments.push(Segment::Expr(expr));
            }
            rest = &rest[start + 2 + len + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_owned()));
        }
        Self { segments }
    }

    /// Evaluate every expression and concatenate.
    pub fn eval(&self, scope: &dyn Scope) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Expr(e) => out.push_str(&display_value(&e.eval(scope))),
            }
        }
        out
    }
}

impl From<&str> for Text {
    fn from(source: &str) -> Self {
        Text::parse(source)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One node of a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    /// Evaluate the node against `scope`.
    pub fn evaluate(&self, scope: &dyn Scope) -> Rendered {
        match self {
            Node::Text(text) => Rendered {
                data: NodeData::text(text.eval(scope)),
                children: Vec::new(),
            },
            Node::Element(element) => element.evaluate(scope),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element with interpolated attributes and child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    id: Option<Text>,
    classes: Vec<Text>,
    attributes: IndexMap<String, Text>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set the id (builder). May contain expressions.
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(Text::parse(id));
        self
    }

    /// Add a class (builder). May contain expressions; an empty result is
    /// dropped.
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(Text::parse(class));
        self
    }

    /// Set an attribute (builder).
    pub fn attr(mut self, name: impl Into<String>, value: &str) -> Self {
        self.attributes.insert(name.into(), Text::parse(value));
        self
    }

    /// Append a child element (builder).
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child (builder).
    pub fn text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(Text::parse(text)));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn evaluate(&self, scope: &dyn Scope) -> Rendered {
        let mut data = NodeData::new(self.tag.clone());
        if let Some(id) = &self.id {
            let id = id.eval(scope);
            if !id.is_empty() {
                data.id = Some(id);
            }
        }
        for class in &self.classes {
            // One template class may expand to several.
            for name in class.eval(scope).split_whitespace() {
                if !data.has_class(name) {
                    data.classes.push(name.to_owned());
                }
            }
        }
        for (name, value) in &self.attributes {
            data.attributes.insert(name.clone(), value.eval(scope));
        }
        Rendered {
            data,
            children: self.children.iter().map(|c| c.evaluate(scope)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendered
// ---------------------------------------------------------------------------

/// An evaluated node tree, detached from any DOM.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub data: NodeData,
    pub children: Vec<Rendered>,
}

impl Rendered {
    /// Append HTML markup for this tree to `out`.
    pub fn write_html(&self, out: &mut String) {
        let data = &self.data;
        if data.is_text() {
            escape_into(data.text.as_deref().unwrap_or_default(), out);
            return;
        }
        out.push('<');
        out.push_str(&data.tag);
        if let Some(id) = &data.id {
            write_attr(out, "id", id);
        }
        if !data.classes.is_empty() {
            write_attr(out, "class", &data.classes.join(" "));
        }
        for (name, value) in &data.attributes {
            write_attr(out, name, value);
        }
        out.push('>');
        if VOID_TAGS.contains(&data.tag.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&data.tag);
        out.push('>');
    }

    /// Insert this tree into `dom` (under `parent`, or top-level) and return
    /// the new node's id.
    pub fn mount(&self, dom: &mut Dom, parent: Option<NodeId>) -> NodeId {
        let id = match parent {
            Some(parent) => dom.insert_child(parent, self.data.clone()),
            None => dom.insert(self.data.clone()),
        };
        for child in &self.children {
            child.mount(dom, Some(id));
        }
        id
    }
}

/// Serialise a list of rendered roots.
pub fn to_html(roots: &[Rendered]) -> String {
    let mut out = String::new();
    for root in roots {
        root.write_html(&mut out);
    }
    out
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, out);
    out.push('"');
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
