//! CSS selectors
//!
//! Parsing and matching for the selector subset the runtime needs:
//! compound selectors, the four combinators, attribute operators and a
//! handful of structural/state pseudo-classes. Matching runs right to left
//! from the candidate element.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::{DomTree, NodeId, SelectorError};

/// Parsed selector group list (`a, b > c`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    groups: Vec<Vec<Part>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    step: Compound,
    // Relation to the previous (left) part
    combinator: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists(String),
    Eq(String, String),
    Includes(String, String),
    DashMatch(String, String),
    Prefix(String, String),
    Suffix(String, String),
    Substring(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Root,
    Disabled,
    Enabled,
    Focus,
    FocusWithin,
    Not(Vec<Vec<Part>>),
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            source: selector.trim().to_string(),
            groups: parse_groups(selector)?,
        })
    }

    /// Original selector text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check whether `node` matches any group.
    ///
    /// `focused` is the document's focused element (NONE when nothing has
    /// focus) and only matters for `:focus` / `:focus-within`.
    pub fn matches(&self, tree: &DomTree, focused: NodeId, node: NodeId) -> bool {
        let cx = MatchContext { tree, focused };
        self.groups.iter().any(|parts| cx.matches_chain(node, parts))
    }
}

impl std::fmt::Display for SelectorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

struct MatchContext<'a> {
    tree: &'a DomTree,
    focused: NodeId,
}

impl MatchContext<'_> {
    fn matches_chain(&self, node: NodeId, parts: &[Part]) -> bool {
        let Some(last) = parts.last() else {
            return false;
        };
        if !self.matches_step(node, &last.step) {
            return false;
        }

        let mut current = node;
        for idx in (1..parts.len()).rev() {
            let prev_step = &parts[idx - 1].step;
            let combinator = parts[idx].combinator.unwrap_or(Combinator::Descendant);

            let matched = match combinator {
                Combinator::Child => self
                    .tree
                    .parent(current)
                    .filter(|p| self.matches_step(*p, prev_step)),
                Combinator::Descendant => self
                    .tree
                    .ancestors(current)
                    .find(|a| self.matches_step(*a, prev_step)),
                Combinator::AdjacentSibling => self
                    .tree
                    .previous_element_sibling(current)
                    .filter(|s| self.matches_step(*s, prev_step)),
                Combinator::GeneralSibling => {
                    let mut cursor = self.tree.previous_element_sibling(current);
                    let mut found = None;
                    while let Some(sibling) = cursor {
                        if self.matches_step(sibling, prev_step) {
                            found = Some(sibling);
                            break;
                        }
                        cursor = self.tree.previous_element_sibling(sibling);
                    }
                    found
                }
            };

            let Some(matched) = matched else {
                return false;
            };
            current = matched;
        }
        true
    }

    fn matches_step(&self, node: NodeId, step: &Compound) -> bool {
        let Some(element) = self.tree.element(node) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if step.classes.iter().any(|c| !element.has_class(c)) {
            return false;
        }

        for cond in &step.attrs {
            let matched = match cond {
                AttrCondition::Exists(name) => element.has_attr(name),
                AttrCondition::Eq(name, value) => element.get_attr(name) == Some(value.as_str()),
                AttrCondition::Includes(name, value) => element
                    .get_attr(name)
                    .is_some_and(|v| v.split_ascii_whitespace().any(|t| t == value)),
                AttrCondition::DashMatch(name, value) => element
                    .get_attr(name)
                    .is_some_and(|v| v == value || v.starts_with(&format!("{value}-"))),
                AttrCondition::Prefix(name, value) => element
                    .get_attr(name)
                    .is_some_and(|v| !value.is_empty() && v.starts_with(value.as_str())),
                AttrCondition::Suffix(name, value) => element
                    .get_attr(name)
                    .is_some_and(|v| !value.is_empty() && v.ends_with(value.as_str())),
                AttrCondition::Substring(name, value) => element
                    .get_attr(name)
                    .is_some_and(|v| !value.is_empty() && v.contains(value.as_str())),
            };
            if !matched {
                return false;
            }
        }

        step.pseudos.iter().all(|p| self.matches_pseudo(node, p))
    }

    fn matches_pseudo(&self, node: NodeId, pseudo: &Pseudo) -> bool {
        let tree = self.tree;
        match pseudo {
            Pseudo::FirstChild => tree.parent(node).is_some() && tree.previous_element_sibling(node).is_none(),
            Pseudo::LastChild => tree.parent(node).is_some() && tree.next_element_sibling(node).is_none(),
            Pseudo::OnlyChild => {
                tree.parent(node).is_some()
                    && tree.previous_element_sibling(node).is_none()
                    && tree.next_element_sibling(node).is_none()
            }
            Pseudo::Empty => tree.children(node).all(|c| {
                tree.get(c)
                    .is_some_and(|n| !n.is_element() && n.as_text().is_none_or(|t| t.is_empty()))
            }),
            Pseudo::Root => tree.parent(node) == Some(tree.root()),
            Pseudo::Disabled => is_disabled(tree, node),
            Pseudo::Enabled => is_form_control(tree, node) && !is_disabled(tree, node),
            Pseudo::Focus => self.focused.is_valid() && self.focused == node,
            Pseudo::FocusWithin => self.focused.is_valid() && tree.contains(node, self.focused),
            Pseudo::Not(groups) => !groups.iter().any(|parts| self.matches_chain(node, parts)),
        }
    }
}

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "optgroup", "option", "fieldset"];

fn is_form_control(tree: &DomTree, node: NodeId) -> bool {
    tree.element(node).is_some_and(|e| FORM_CONTROLS.contains(&e.tag.as_str()))
}

/// Disabled form control, directly or through a disabled `<fieldset>`
pub(crate) fn is_disabled(tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.element(node) else {
        return false;
    };
    if !FORM_CONTROLS.contains(&element.tag.as_str()) {
        return false;
    }
    if element.has_attr("disabled") {
        return true;
    }
    tree.ancestors(node).any(|a| {
        tree.element(a)
            .is_some_and(|e| e.tag == "fieldset" && e.has_attr("disabled"))
    })
}

/// Parsed-selector cache keyed by selector text
///
/// Parse failures are not cached; callers log them once per attempt.
#[derive(Debug)]
pub struct SelectorCache {
    entries: RefCell<HashMap<String, Rc<SelectorList>>>,
    order: RefCell<VecDeque<String>>,
    max_entries: usize,
}

impl SelectorCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            order: RefCell::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Parse through the cache
    pub fn get(&self, selector: &str) -> Result<Rc<SelectorList>, SelectorError> {
        if let Some(hit) = self.entries.borrow().get(selector) {
            return Ok(Rc::clone(hit));
        }
        let parsed = Rc::new(SelectorList::parse(selector)?);

        let mut entries = self.entries.borrow_mut();
        let mut order = self.order.borrow_mut();
        if entries.len() >= self.max_entries {
            if let Some(oldest) = order.pop_front() {
                entries.remove(&oldest);
            }
        }
        entries.insert(selector.to_string(), Rc::clone(&parsed));
        order.push_back(selector.to_string());
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new(256)
    }
}

// ============================================================================
// PARSING
// ============================================================================

fn parse_groups(selector: &str) -> Result<Vec<Vec<Part>>, SelectorError> {
    split_top_level(selector, |c| c == ',', false)
        .map_err(|reason| SelectorError::new(selector, reason))?
        .iter()
        .map(|group| parse_chain(group, selector))
        .collect()
}

fn parse_chain(group: &str, source: &str) -> Result<Vec<Part>, SelectorError> {
    let group = group.trim();
    if group.is_empty() {
        return Err(SelectorError::new(source, "empty selector"));
    }

    let tokens = tokenize(group).map_err(|reason| SelectorError::new(source, reason))?;
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokens {
        let combinator = match token.as_str() {
            ">" => Some(Combinator::Child),
            "+" => Some(Combinator::AdjacentSibling),
            "~" => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if let Some(c) = combinator {
            if pending.is_some() || parts.is_empty() {
                return Err(SelectorError::new(source, "dangling combinator"));
            }
            pending = Some(c);
            continue;
        }

        let step = parse_compound(&token, source)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(SelectorError::new(source, "dangling combinator"));
    }
    Ok(parts)
}

/// Split on a top-level delimiter, honoring brackets, parens and quotes
fn split_top_level(
    input: &str,
    is_delim: impl Fn(char) -> bool,
    keep_delims: bool,
) -> Result<Vec<String>, &'static str> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut bracket = 0usize;
    let mut paren = 0usize;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket += 1;
                current.push(ch);
            }
            ']' => {
                bracket = bracket.checked_sub(1).ok_or("unbalanced brackets")?;
                current.push(ch);
            }
            '(' => {
                paren += 1;
                current.push(ch);
            }
            ')' => {
                paren = paren.checked_sub(1).ok_or("unbalanced parentheses")?;
                current.push(ch);
            }
            c if bracket == 0 && paren == 0 && is_delim(c) => {
                out.push(std::mem::take(&mut current));
                if keep_delims {
                    out.push(c.to_string());
                }
            }
            _ => current.push(ch),
        }
    }

    if quote.is_some() {
        return Err("unterminated string");
    }
    if bracket != 0 {
        return Err("unbalanced brackets");
    }
    if paren != 0 {
        return Err("unbalanced parentheses");
    }
    out.push(current);
    Ok(out)
}

fn tokenize(group: &str) -> Result<Vec<String>, &'static str> {
    let pieces = split_top_level(
        group,
        |c| c == '>' || c == '+' || c == '~' || c.is_ascii_whitespace(),
        true,
    )?;
    Ok(pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect())
}

fn parse_compound(part: &str, source: &str) -> Result<Compound, SelectorError> {
    let err = |reason| SelectorError::new(source, reason);
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = Compound::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if i != 0 {
                    return Err(err("misplaced universal selector"));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(part, i + 1).ok_or_else(|| err("expected id"))?;
                if step.id.replace(id).is_some() {
                    return Err(err("duplicate id"));
                }
                i = next;
            }
            b'.' => {
                let (class, next) = parse_ident(part, i + 1).ok_or_else(|| err("expected class name"))?;
                step.classes.push(class);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr(part, i).ok_or_else(|| err("malformed attribute selector"))?;
                step.attrs.push(cond);
                i = next;
            }
            b':' => {
                let (pseudo, next) = parse_pseudo(part, i, source)?;
                step.pseudos.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(err("misplaced type selector"));
                }
                let (tag, next) = parse_ident(part, i).ok_or_else(|| err("unexpected character"))?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }
    Ok(step)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn parse_ident(part: &str, start: usize) -> Option<(String, usize)> {
    let tail = part.get(start..)?;
    let len: usize = tail
        .chars()
        .take_while(|c| is_ident_char(*c))
        .map(char::len_utf8)
        .sum();
    if len == 0 {
        return None;
    }
    Some((tail[..len].to_string(), start + len))
}

fn parse_attr(part: &str, start: usize) -> Option<(AttrCondition, usize)> {
    // Find the closing bracket outside quotes
    let mut quote: Option<char> = None;
    let mut end = None;
    for (offset, ch) in part[start + 1..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, ']') => {
                end = Some(start + 1 + offset);
                break;
            }
            _ => {}
        }
    }
    let end = end?;
    let inner = part[start + 1..end].trim();

    let op_pos = inner.find(['=', '~', '|', '^', '$', '*']);
    let Some(op_pos) = op_pos else {
        let (name, next) = parse_ident(inner, 0)?;
        if next != inner.len() {
            return None;
        }
        return Some((AttrCondition::Exists(name.to_ascii_lowercase()), end + 1));
    };

    let name = inner[..op_pos].trim().to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    let rest = &inner[op_pos..];
    let (op, value) = if let Some(v) = rest.strip_prefix('=') {
        ('=', v)
    } else {
        let op = rest.chars().next()?;
        (op, rest[1..].strip_prefix('=')?)
    };
    let value = unquote(value.trim())?;

    let cond = match op {
        '=' => AttrCondition::Eq(name, value),
        '~' => AttrCondition::Includes(name, value),
        '|' => AttrCondition::DashMatch(name, value),
        '^' => AttrCondition::Prefix(name, value),
        '$' => AttrCondition::Suffix(name, value),
        '*' => AttrCondition::Substring(name, value),
        _ => return None,
    };
    Some((cond, end + 1))
}

fn unquote(value: &str) -> Option<String> {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q) {
            return inner.strip_suffix(q).map(|s| s.to_string());
        }
    }
    if value.is_empty() || !value.chars().all(is_ident_char) {
        return None;
    }
    Some(value.to_string())
}

fn parse_pseudo(part: &str, start: usize, source: &str) -> Result<(Pseudo, usize), SelectorError> {
    let err = |reason| SelectorError::new(source, reason);
    let (name, next) = parse_ident(part, start + 1).ok_or_else(|| err("expected pseudo-class"))?;

    let simple = match name.to_ascii_lowercase().as_str() {
        "first-child" => Some(Pseudo::FirstChild),
        "last-child" => Some(Pseudo::LastChild),
        "only-child" => Some(Pseudo::OnlyChild),
        "empty" => Some(Pseudo::Empty),
        "root" => Some(Pseudo::Root),
        "disabled" => Some(Pseudo::Disabled),
        "enabled" => Some(Pseudo::Enabled),
        "focus" => Some(Pseudo::Focus),
        "focus-within" => Some(Pseudo::FocusWithin),
        "not" => None,
        _ => return Err(err("unsupported pseudo-class")),
    };
    if let Some(pseudo) = simple {
        return Ok((pseudo, next));
    }

    // :not(<selector list>)
    if part.as_bytes().get(next) != Some(&b'(') {
        return Err(err(":not requires an argument"));
    }
    let mut depth = 0usize;
    let mut close = None;
    for (offset, ch) in part[next..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(next + offset);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close.ok_or_else(|| err("unbalanced parentheses"))?;
    let inner = &part[next + 1..close];
    let groups = parse_groups(inner).map_err(|_| err("invalid :not argument"))?;
    Ok((Pseudo::Not(groups), close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let list = tree.create_element("ul");
        let first = tree.create_element("li");
        let second = tree.create_element("li");
        tree.append_child(tree.root(), list).unwrap();
        tree.append_child(list, first).unwrap();
        tree.append_child(list, second).unwrap();
        tree.element_mut(list).unwrap().set_attr("id", "menu");
        tree.element_mut(first).unwrap().set_attr("class", "item active");
        tree.element_mut(second).unwrap().set_attr("class", "item");
        tree.element_mut(second).unwrap().set_attr("data-md-dialog", "target: #d");
        (tree, list, first, second)
    }

    fn matches(tree: &DomTree, node: NodeId, sel: &str) -> bool {
        SelectorList::parse(sel).unwrap().matches(tree, NodeId::NONE, node)
    }

    #[test]
    fn test_compound_and_combinators() {
        let (tree, list, first, second) = build();
        assert!(matches(&tree, first, "li.item.active"));
        assert!(matches(&tree, second, "#menu > .item"));
        assert!(matches(&tree, second, "ul li + li"));
        assert!(matches(&tree, second, ".active ~ li"));
        assert!(!matches(&tree, first, ".active ~ li"));
        assert!(matches(&tree, list, "*"));
    }

    #[test]
    fn test_attribute_operators() {
        let (tree, _, first, second) = build();
        assert!(matches(&tree, second, "[data-md-dialog]"));
        assert!(matches(&tree, second, "[data-md-dialog^='target']"));
        assert!(matches(&tree, first, "[class~=active]"));
        assert!(matches(&tree, second, "[data-md-dialog*=\"#d\"]"));
        assert!(!matches(&tree, first, "[data-md-dialog]"));
    }

    #[test]
    fn test_pseudo_classes() {
        let (tree, _, first, second) = build();
        assert!(matches(&tree, first, "li:first-child"));
        assert!(matches(&tree, second, "li:last-child:not(.active)"));
        assert!(!matches(&tree, first, ":not(.item, .x)"));
        let list = SelectorList::parse("li:focus").unwrap();
        assert!(list.matches(&tree, first, first));
        assert!(!list.matches(&tree, first, second));
    }

    #[test]
    fn test_groups() {
        let (tree, list, _, second) = build();
        let sel = SelectorList::parse("ol, #menu").unwrap();
        assert!(sel.matches(&tree, NodeId::NONE, list));
        assert!(!sel.matches(&tree, NodeId::NONE, second));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "a >", "> a", "a,,b", "[x", ".", "a:hover", "div#a#b", "a:not(", "[x='y]"] {
            assert!(SelectorList::parse(bad).is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_cache_reuses_parse() {
        let cache = SelectorCache::new(2);
        let a = cache.get(".a").unwrap();
        let again = cache.get(".a").unwrap();
        assert!(Rc::ptr_eq(&a, &again));
        cache.get(".b").unwrap();
        cache.get(".c").unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get("[").is_err());
    }
}
