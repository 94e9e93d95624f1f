//! Selector matching for event maps.
//!
//! Supports compound simple selectors (`button`, `.primary`, `#save`,
//! `button.primary#save`, `*`) and comma-separated alternatives. There are no
//! combinators; scoping to an instance is done by the caller.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

/// Errors from selector parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector component in {0:?}")]
    Empty(String),
    #[error("unsupported character {ch:?} in selector {selector:?}")]
    Unsupported { selector: String, ch: char },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, node: &NodeData) -> bool {
        if node.is_text() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| node.has_class(c))
    }
}

/// A parsed selector. An empty selector string matches every element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
    source: String,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim().to_owned();
        if source.is_empty() {
            return Ok(Self::any());
        }
        let alternatives = source
            .split(',')
            .map(|part| parse_compound(part.trim(), &source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            alternatives,
            source,
        })
    }

    /// A selector matching every element.
    pub fn any() -> Self {
        Self {
            alternatives: vec![Compound::default()],
            source: String::new(),
        }
    }

    /// The selector text as written (trimmed).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the selector matches a single node. Text nodes never match.
    pub fn matches(&self, node: &NodeData) -> bool {
        self.alternatives.iter().any(|c| c.matches(node))
    }
}

fn parse_compound(part: &str, whole: &str) -> Result<Compound, SelectorError> {
    if part.is_empty() {
        return Err(SelectorError::Empty(whole.to_owned()));
    }
    let mut compound = Compound::default();
    // (sigil, name) pairs; sigil '\0' is the leading tag.
    let mut pending: Option<(char, String)> = None;

    let flush = |pending: Option<(char, String)>, compound: &mut Compound| {
        let Some((sigil, name)) = pending else {
            return Ok(());
        };
        if name.is_empty() {
            return Err(SelectorError::Empty(whole.to_owned()));
        }
        match sigil {
            '.' => compound.classes.push(name),
            '#' => compound.id = Some(name),
            _ if name == "*" => {}
            _ => compound.tag = Some(name),
        }
        Ok(())
    };

    for ch in part.chars() {
        match ch {
            '.' | '#' => {
                flush(pending.take(), &mut compound)?;
                pending = Some((ch, String::new()));
            }
            c if c.is_alphanumeric() || c == '-' || c == '_' || (c == '*' && pending.is_none()) => {
                pending.get_or_insert_with(|| ('\0', String::new())).1.push(c);
            }
            other => {
                return Err(SelectorError::Unsupported {
                    selector: whole.to_owned(),
                    ch: other,
                })
            }
        }
    }
    flush(pending, &mut compound)?;
    Ok(compound)
}

impl Dom {
    /// All nodes in the subtree of `start` (inclusive) matching `selector`,
    /// in document order.
    pub fn query(&self, start: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.walk_depth_first(start)
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|n| selector.matches(n)))
            .collect()
    }

    /// Nearest node matching `selector`, walking from `node` up through its
    /// ancestors but not past `boundary`.
    pub fn closest(&self, node: NodeId, selector: &Selector, boundary: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.get(id).is_some_and(|n| selector.matches(n)) {
                return Some(id);
            }
            if id == boundary {
                break;
            }
            current = self.parent(id);
        }
        None
    }
}
