//! Selector Matching
//!
//! The document answers every selector question through a
//! [`SelectorMatcher`], so callers can plug in another engine. The bundled
//! [`CssMatcher`] covers the subset the convenience layer needs:
//!
//! - selector lists (`a, .b`)
//! - combinators: descendant (` `), child (`>`), adjacent (`+`), general sibling (`~`)
//! - type, universal, `#id`, `.class`
//! - attributes: `[a]`, `[a=v]`, `[a~=v]`, `[a|=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`, with an `i` flag
//! - `:first-child`, `:last-child`, `:only-child`

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::{DomError, DomResult, DomTree, NodeId};

/// Native selector-matching capability
pub trait SelectorMatcher {
    /// Test whether `node` matches `selector`.
    ///
    /// Non-element nodes never match. Syntax errors are reported as
    /// [`DomError::InvalidSelector`].
    fn matches(&self, tree: &DomTree, node: NodeId, selector: &str) -> DomResult<bool>;

    /// Check `selector` for syntax errors without matching anything
    fn validate(&self, selector: &str) -> DomResult<()> {
        self.matches(&DomTree::new(), NodeId::ROOT, selector).map(|_| ())
    }
}

/// Parsed selectors kept per matcher before the least recently used is evicted
pub const DEFAULT_CACHE_ENTRIES: usize = 256;

/// Default matcher with a bounded per-instance parse cache
#[derive(Debug)]
pub struct CssMatcher {
    cache: RefCell<ParseCache>,
}

#[derive(Debug)]
struct ParseCache {
    entries: HashMap<String, CachedSelector>,
    /// Maximum cache entries
    max_entries: usize,
    /// Bumped on every lookup; orders entries by last use
    clock: u64,
}

#[derive(Debug)]
struct CachedSelector {
    last_used: u64,
    list: Rc<SelectorList>,
}

impl ParseCache {
    fn get(&mut self, selector: &str) -> Option<Rc<SelectorList>> {
        self.clock += 1;
        let entry = self.entries.get_mut(selector)?;
        entry.last_used = self.clock;
        Some(Rc::clone(&entry.list))
    }

    fn set(&mut self, selector: &str, list: Rc<SelectorList>) {
        if self.max_entries == 0 {
            return;
        }
        // Evict if at capacity
        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            selector.to_string(),
            CachedSelector { last_used: self.clock, list },
        );
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl CssMatcher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_ENTRIES)
    }

    /// Matcher that keeps at most `max_entries` parsed selectors
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            cache: RefCell::new(ParseCache {
                entries: HashMap::new(),
                max_entries,
                clock: 0,
            }),
        }
    }

    /// Parse (or fetch from cache) a selector list
    pub fn compile(&self, selector: &str) -> DomResult<Rc<SelectorList>> {
        if let Some(list) = self.cache.borrow_mut().get(selector) {
            return Ok(list);
        }
        let list = Rc::new(SelectorList::parse(selector)?);
        self.cache.borrow_mut().set(selector, Rc::clone(&list));
        Ok(list)
    }

    /// Number of cached selectors
    pub fn cached(&self) -> usize {
        self.cache.borrow().entries.len()
    }
}

impl Default for CssMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorMatcher for CssMatcher {
    fn matches(&self, tree: &DomTree, node: NodeId, selector: &str) -> DomResult<bool> {
        Ok(self.compile(selector)?.matches(tree, node))
    }

    fn validate(&self, selector: &str) -> DomResult<()> {
        self.compile(selector).map(|_| ())
    }
}

/// Comma-separated list of complex selectors
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, left to right
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub parts: Vec<SelectorPart>,
}

/// One compound selector and its relation to the part on its left
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorPart {
    pub compound: CompoundSelector,
    /// `None` for the leftmost part
    pub combinator: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// Simple selectors that all have to hold for one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundSelector {
    pub universal: bool,
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<PseudoClass>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

/// Structural pseudo-classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (Some(matcher), Some(val)) = (&self.matcher, value) else {
            return self.matcher.is_none() && value.is_some();
        };

        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_ascii_lowercase()
            } else {
                s.to_string()
            }
        };
        let val = fold(val);

        match matcher {
            AttributeMatcher::Exact(expected) => val == fold(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = fold(expected);
                val.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                val == expected || val.starts_with(&format!("{expected}-"))
            }
            // Empty values never match the substring forms
            AttributeMatcher::Prefix(expected) => {
                !expected.is_empty() && val.starts_with(&fold(expected))
            }
            AttributeMatcher::Suffix(expected) => {
                !expected.is_empty() && val.ends_with(&fold(expected))
            }
            AttributeMatcher::Substring(expected) => {
                !expected.is_empty() && val.contains(&fold(expected))
            }
        }
    }
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(text: &str) -> DomResult<Self> {
        let selectors = split_groups(text)?
            .into_iter()
            .map(|group| parse_complex(text, group))
            .collect::<DomResult<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Whether any selector in the list matches `node`
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        tree.is_element(node)
            && self
                .selectors
                .iter()
                .any(|complex| match_parts(tree, &complex.parts, node, &mut HashSet::new()))
    }
}

fn split_groups(text: &str) -> DomResult<Vec<&str>> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => bracket_depth += 1,
            (None, ']') => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| DomError::invalid_selector(text, "unbalanced ']'"))?;
            }
            (None, ',') if bracket_depth == 0 => {
                groups.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(DomError::invalid_selector(text, "unterminated string"));
    }
    if bracket_depth != 0 {
        return Err(DomError::invalid_selector(text, "unbalanced '['"));
    }
    groups.push(text[start..].trim());

    if groups.iter().any(|g| g.is_empty()) {
        return Err(DomError::invalid_selector(text, "empty selector"));
    }
    Ok(groups)
}

enum Token<'a> {
    Compound(&'a str),
    Combinator(Combinator),
}

fn flush<'a>(group: &'a str, tokens: &mut Vec<Token<'a>>, start: &mut Option<usize>, end: usize) {
    if let Some(s) = start.take() {
        tokens.push(Token::Compound(&group[s..end]));
    }
}

fn tokenize(group: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, ch) in group.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if bracket_depth > 0 => quote = Some(ch),
            '[' => {
                bracket_depth += 1;
                start.get_or_insert(i);
            }
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '>' | '+' | '~' if bracket_depth == 0 => {
                flush(group, &mut tokens, &mut start, i);
                tokens.push(Token::Combinator(match ch {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                }));
            }
            c if c.is_ascii_whitespace() && bracket_depth == 0 => {
                flush(group, &mut tokens, &mut start, i);
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    flush(group, &mut tokens, &mut start, group.len());
    tokens
}

fn parse_complex(text: &str, group: &str) -> DomResult<ComplexSelector> {
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(group) {
        match token {
            Token::Combinator(c) => {
                if pending.is_some() || parts.is_empty() {
                    return Err(DomError::invalid_selector(text, "misplaced combinator"));
                }
                pending = Some(c);
            }
            Token::Compound(s) => {
                let combinator = if parts.is_empty() {
                    None
                } else {
                    Some(pending.take().unwrap_or(Combinator::Descendant))
                };
                parts.push(SelectorPart {
                    compound: parse_compound(text, s)?,
                    combinator,
                });
            }
        }
    }

    if parts.is_empty() || pending.is_some() {
        return Err(DomError::invalid_selector(text, "dangling combinator"));
    }
    Ok(ComplexSelector { parts })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Read an identifier starting at byte `start`
fn parse_ident(s: &str, start: usize) -> Option<(String, usize)> {
    let rest = s.get(start..)?;
    let len = rest
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(rest.len(), |(i, _)| i);
    (len > 0).then(|| (rest[..len].to_string(), start + len))
}

fn parse_compound(text: &str, part: &str) -> DomResult<CompoundSelector> {
    let bytes = part.as_bytes();
    let mut step = CompoundSelector::default();
    let mut i = 0;
    let err = |reason: &str| DomError::invalid_selector(text, reason);

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if i != 0 {
                    return Err(err("'*' must start a compound selector"));
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
                let (class, next) =
                    parse_ident(part, i + 1).ok_or_else(|| err("expected class name"))?;
                step.classes.push(class);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_attribute(text, part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            b':' => {
                let (name, next) =
                    parse_ident(part, i + 1).ok_or_else(|| err("expected pseudo-class"))?;
                let pseudo = match name.to_ascii_lowercase().as_str() {
                    "first-child" => PseudoClass::FirstChild,
                    "last-child" => PseudoClass::LastChild,
                    "only-child" => PseudoClass::OnlyChild,
                    _ => return Err(err(&format!("unsupported pseudo-class ':{name}'"))),
                };
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(err("type selector must start a compound selector"));
                }
                let (tag, next) =
                    parse_ident(part, i).ok_or_else(|| err("unexpected character"))?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() {
        return Err(err("empty compound selector"));
    }
    Ok(step)
}

/// Parse `[name op value flag]` starting at the `[` at byte `start`
fn parse_attribute(text: &str, part: &str, start: usize) -> DomResult<(AttributeSelector, usize)> {
    let err = |reason: &str| DomError::invalid_selector(text, reason);
    let skip_ws = |mut i: usize| {
        while part.as_bytes().get(i).is_some_and(u8::is_ascii_whitespace) {
            i += 1;
        }
        i
    };

    let i = skip_ws(start + 1);
    let (name, i) = parse_ident(part, i).ok_or_else(|| err("expected attribute name"))?;
    let mut i = skip_ws(i);

    let rest = part.get(i..).unwrap_or_default();
    if let Some(after) = rest.strip_prefix(']') {
        let next = part.len() - after.len();
        let attr = AttributeSelector { name, matcher: None, case_insensitive: false };
        return Ok((attr, next));
    }

    let (op, op_len) = match rest.as_bytes() {
        [b'=', ..] => ("=", 1),
        [b'~', b'=', ..] => ("~=", 2),
        [b'|', b'=', ..] => ("|=", 2),
        [b'^', b'=', ..] => ("^=", 2),
        [b'$', b'=', ..] => ("$=", 2),
        [b'*', b'=', ..] => ("*=", 2),
        _ => return Err(err("expected attribute operator")),
    };
    i = skip_ws(i + op_len);

    let value = match part.as_bytes().get(i) {
        Some(&q @ (b'"' | b'\'')) => {
            let body = &part[i + 1..];
            let end = body.find(q as char).ok_or_else(|| err("unterminated string"))?;
            i += end + 2;
            body[..end].to_string()
        }
        _ => {
            let (value, next) = parse_ident(part, i).ok_or_else(|| err("expected attribute value"))?;
            i = next;
            value
        }
    };
    i = skip_ws(i);

    let mut case_insensitive = false;
    match part.as_bytes().get(i) {
        Some(b'i' | b'I') => {
            case_insensitive = true;
            i = skip_ws(i + 1);
        }
        Some(b's' | b'S') => i = skip_ws(i + 1),
        _ => {}
    }
    if part.as_bytes().get(i) != Some(&b']') {
        return Err(err("expected ']'"));
    }

    let matcher = match op {
        "=" => AttributeMatcher::Exact(value),
        "~=" => AttributeMatcher::Contains(value),
        "|=" => AttributeMatcher::DashMatch(value),
        "^=" => AttributeMatcher::Prefix(value),
        "$=" => AttributeMatcher::Suffix(value),
        _ => AttributeMatcher::Substring(value),
    };
    let attr = AttributeSelector { name, matcher: Some(matcher), case_insensitive };
    Ok((attr, i + 1))
}

fn parent_element(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    tree.parent(node).filter(|&p| tree.is_element(p))
}

fn prev_element_sibling(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.get(node)?.prev_sibling;
    while current.is_valid() {
        if tree.is_element(current) {
            return Some(current);
        }
        current = tree.get(current)?.prev_sibling;
    }
    None
}

fn next_element_sibling(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.get(node)?.next_sibling;
    while current.is_valid() {
        if tree.is_element(current) {
            return Some(current);
        }
        current = tree.get(current)?.next_sibling;
    }
    None
}

/// Match right to left, backtracking over ancestors and siblings.
///
/// `failed` records (remaining parts, node) pairs already known not to
/// match, so each pair is tried at most once and deep trees stay
/// polynomial.
fn match_parts(
    tree: &DomTree,
    parts: &[SelectorPart],
    node: NodeId,
    failed: &mut HashSet<(usize, NodeId)>,
) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return true;
    };
    let key = (parts.len(), node);
    if failed.contains(&key) {
        return false;
    }
    if !match_compound(tree, &last.compound, node) {
        failed.insert(key);
        return false;
    }

    let matched = match last.combinator {
        None => true,
        Some(Combinator::Child) => {
            parent_element(tree, node).is_some_and(|p| match_parts(tree, rest, p, failed))
        }
        Some(Combinator::Descendant) => tree
            .ancestors(node)
            .filter(|&a| tree.is_element(a))
            .any(|a| match_parts(tree, rest, a, failed)),
        Some(Combinator::AdjacentSibling) => {
            prev_element_sibling(tree, node).is_some_and(|s| match_parts(tree, rest, s, failed))
        }
        Some(Combinator::GeneralSibling) => {
            let mut sibling = prev_element_sibling(tree, node);
            let mut found = false;
            while let Some(s) = sibling {
                if match_parts(tree, rest, s, failed) {
                    found = true;
                    break;
                }
                sibling = prev_element_sibling(tree, s);
            }
            found
        }
    };
    if !matched {
        failed.insert(key);
    }
    matched
}

fn match_compound(tree: &DomTree, compound: &CompoundSelector, node: NodeId) -> bool {
    let Some(element) = tree.get(node).and_then(|n| n.as_element()) else {
        return false;
    };

    if let Some(tag) = &compound.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if element.id() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|c| element.has_class(c)) {
        return false;
    }
    if !compound.attrs.iter().all(|a| a.matches(element.get_attr(&a.name))) {
        return false;
    }

    compound.pseudo_classes.iter().all(|pseudo| match pseudo {
        PseudoClass::FirstChild => prev_element_sibling(tree, node).is_none(),
        PseudoClass::LastChild => next_element_sibling(tree, node).is_none(),
        PseudoClass::OnlyChild => {
            prev_element_sibling(tree, node).is_none() && next_element_sibling(tree, node).is_none()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tree: DomTree,
        section: NodeId,
        div: NodeId,
        first: NodeId,
        second: NodeId,
    }

    // <section id="fixtures"><div class="delegater box"><a lang="en-US">..</a><a href="/x">..</a></div></section>
    fn fixture() -> Fixture {
        let mut tree = DomTree::new();
        let section = tree.create_element("section");
        tree.set_attribute(section, "id", "fixtures").unwrap();
        let div = tree.create_element("div");
        tree.set_attribute(div, "class", "delegater box").unwrap();
        let first = tree.create_element("a");
        tree.set_attribute(first, "lang", "en-US").unwrap();
        let second = tree.create_element("a");
        tree.set_attribute(second, "href", "/x").unwrap();

        tree.append_child(tree.root(), section).unwrap();
        tree.append_child(section, div).unwrap();
        tree.append_child(div, first).unwrap();
        tree.append_child(div, second).unwrap();
        Fixture { tree, section, div, first, second }
    }

    fn matches(f: &Fixture, node: NodeId, selector: &str) -> bool {
        SelectorList::parse(selector).unwrap().matches(&f.tree, node)
    }

    #[test]
    fn test_simple_selectors() {
        let f = fixture();
        assert!(matches(&f, f.section, "#fixtures"));
        assert!(matches(&f, f.section, "SECTION"));
        assert!(matches(&f, f.div, ".delegater"));
        assert!(matches(&f, f.div, "div.box.delegater"));
        assert!(!matches(&f, f.div, "div.missing"));
        assert!(matches(&f, f.first, "*"));
        assert!(!matches(&f, f.tree.root(), "*"));
    }

    #[test]
    fn test_combinators() {
        let f = fixture();
        assert!(matches(&f, f.first, "#fixtures a"));
        assert!(matches(&f, f.first, "section > div > a"));
        assert!(!matches(&f, f.first, "section > a"));
        assert!(matches(&f, f.second, "a + a"));
        assert!(matches(&f, f.second, "[lang] ~ a"));
        assert!(!matches(&f, f.first, "a + a"));
    }

    #[test]
    fn test_selector_list() {
        let f = fixture();
        assert!(matches(&f, f.div, "span, .box"));
        assert!(!matches(&f, f.div, "span, em"));
    }

    #[test]
    fn test_attribute_selectors() {
        let f = fixture();
        assert!(matches(&f, f.second, "[href]"));
        assert!(matches(&f, f.second, "a[href='/x']"));
        assert!(matches(&f, f.first, "[lang|=en]"));
        assert!(matches(&f, f.first, "[lang^=\"en\"]"));
        assert!(matches(&f, f.first, "[lang$=us i]"));
        assert!(!matches(&f, f.first, "[lang$=us]"));
        assert!(matches(&f, f.div, "[class~=box]"));
        assert!(matches(&f, f.div, "[class*=\"gater b\"]"));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let f = fixture();
        assert!(matches(&f, f.first, "a:first-child"));
        assert!(matches(&f, f.second, "a:last-child"));
        assert!(matches(&f, f.div, ":only-child"));
        assert!(!matches(&f, f.first, ":only-child"));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "a,", "> a", "a >", "a > > b", "[href", "a[=x]", "#", "a:hover", "div*", "[a='x]"] {
            let err = SelectorList::parse(bad).unwrap_err();
            assert!(
                matches!(err, DomError::InvalidSelector { .. }),
                "expected syntax error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_matcher_caches_parsed_selectors() {
        let f = fixture();
        let matcher = CssMatcher::new();
        assert!(matcher.matches(&f.tree, f.first, "a").unwrap());
        assert!(matcher.matches(&f.tree, f.second, "a").unwrap());
        assert_eq!(matcher.cached(), 1);
        assert!(matcher.matches(&f.tree, f.first, "a[").is_err());
        assert_eq!(matcher.cached(), 1);
    }

    #[test]
    fn test_parse_cache_is_bounded() {
        let f = fixture();
        let matcher = CssMatcher::with_capacity(8);
        for i in 0..1000 {
            matcher.matches(&f.tree, f.first, &format!(".c{i}")).unwrap();
            assert!(matcher.cached() <= 8);
        }
        assert_eq!(matcher.cached(), 8);
    }

    #[test]
    fn test_parse_cache_keeps_recently_used() {
        let f = fixture();
        let matcher = CssMatcher::with_capacity(2);
        let a = matcher.compile("a").unwrap();
        matcher.compile("div").unwrap();
        // Touch "a" so "div" is the oldest
        matcher.compile("a").unwrap();
        matcher.compile("section").unwrap();

        assert_eq!(matcher.cached(), 2);
        assert!(Rc::ptr_eq(&a, &matcher.compile("a").unwrap()));
        assert!(matcher.matches(&f.tree, f.div, "div").unwrap());
    }

    #[test]
    fn test_descendant_chain_on_deep_tree() {
        let mut tree = DomTree::new();
        let mut parent = tree.root();
        for _ in 0..200 {
            let div = tree.create_element("div");
            tree.append_child(parent, div).unwrap();
            parent = div;
        }
        let leaf = parent;

        // No span anywhere: every ancestor combination fails
        let list = SelectorList::parse("span div div div div div div div div").unwrap();
        let start = std::time::Instant::now();
        assert!(!list.matches(&tree, leaf));
        assert!(start.elapsed() < std::time::Duration::from_secs(5));

        let list = SelectorList::parse("div div div div div div div div").unwrap();
        assert!(list.matches(&tree, leaf));
    }

    #[test]
    fn test_general_sibling_after_failed_attempt() {
        let f = fixture();
        assert!(matches(&f, f.second, "div > a ~ a"));
        assert!(!matches(&f, f.second, "section > a ~ a"));
    }
}
