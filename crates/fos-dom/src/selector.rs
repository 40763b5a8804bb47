//! CSS Selectors
//!
//! Parsing and right-to-left matching of the selector subset used for
//! `matches`, `closest` and event delegation: type, universal, id, class and
//! attribute selectors, a handful of structural and form pseudo-classes,
//! `:not()`, all four combinators and selector lists.

use std::fmt;
use std::str::FromStr;

use crate::{DomTree, ElementData, NodeId};

/// Selector parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("expected identifier at offset {0}")]
    ExpectedIdent(usize),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unsupported pseudo-class :{0}")]
    UnsupportedPseudoClass(String),
}

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, stored left to right
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// The combinator of the first entry is unused
    parts: Vec<(Combinator, CompoundSelector)>,
}

/// Relationship between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

/// Simple selectors that must all match one element
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

/// A component of a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal,
    /// Type selector (tag name)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
    /// Pseudo-class
    PseudoClass(PseudoClass),
}

/// Supported pseudo-classes
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    Disabled,
    Enabled,
    Checked,
    Not(Box<SelectorList>),
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
        let (matcher, value) = match (&self.matcher, value) {
            (_, None) => return false,
            (None, Some(_)) => return true,
            (Some(m), Some(v)) => (m, v),
        };
        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let val = fold(value);
        match matcher {
            AttributeMatcher::Exact(e) => val == fold(e),
            AttributeMatcher::Contains(e) => {
                let e = fold(e);
                !e.is_empty() && val.split_whitespace().any(|w| w == e)
            }
            AttributeMatcher::DashMatch(e) => {
                let e = fold(e);
                val == e || val.starts_with(&format!("{e}-"))
            }
            AttributeMatcher::Prefix(e) => !e.is_empty() && val.starts_with(&fold(e)),
            AttributeMatcher::Suffix(e) => !e.is_empty() && val.ends_with(&fold(e)),
            AttributeMatcher::Substring(e) => !e.is_empty() && val.contains(&fold(e)),
        }
    }
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser { src: source, pos: 0 };
        let selectors = parser.parse_list(false)?;
        Ok(Self {
            source: source.trim().to_string(),
            selectors,
        })
    }

    /// The trimmed source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of comma-separated selectors
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Check whether an element matches any selector of the list
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        tree.element(element).is_some()
            && self
                .selectors
                .iter()
                .any(|s| s.matches_at(tree, element, s.parts.len() - 1))
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches_at(&self, tree: &DomTree, element: NodeId, index: usize) -> bool {
        let (_, compound) = &self.parts[index];
        if !compound.matches(tree, element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.parts[index].0 {
            Combinator::Child => tree
                .parent(element)
                .is_some_and(|p| self.matches_at(tree, p, index - 1)),
            Combinator::Descendant => tree
                .ancestors(element)
                .skip(1)
                .any(|a| self.matches_at(tree, a, index - 1)),
            Combinator::NextSibling => prev_element_sibling(tree, element)
                .is_some_and(|s| self.matches_at(tree, s, index - 1)),
            Combinator::SubsequentSibling => {
                let mut cursor = prev_element_sibling(tree, element);
                while let Some(sibling) = cursor {
                    if self.matches_at(tree, sibling, index - 1) {
                        return true;
                    }
                    cursor = prev_element_sibling(tree, sibling);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let Some(elem) = tree.element(id) else {
            return false;
        };
        self.components
            .iter()
            .all(|c| match_component(c, tree, id, elem))
    }
}

fn match_component(component: &SelectorComponent, tree: &DomTree, id: NodeId, elem: &ElementData) -> bool {
    match component {
        SelectorComponent::Universal => true,
        SelectorComponent::Type(tag) => elem.tag_name == *tag,
        SelectorComponent::Id(wanted) => elem.id.as_deref() == Some(wanted.as_str()),
        SelectorComponent::Class(class) => elem.has_class(class),
        SelectorComponent::Attribute(attr) => attr.matches(elem.get_attr(&attr.name)),
        SelectorComponent::PseudoClass(pseudo) => match_pseudo_class(pseudo, tree, id, elem),
    }
}

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "option", "optgroup", "fieldset"];

fn match_pseudo_class(pseudo: &PseudoClass, tree: &DomTree, id: NodeId, elem: &ElementData) -> bool {
    match pseudo {
        PseudoClass::Root => tree.parent(id) == Some(NodeId::ROOT),
        PseudoClass::Empty => tree.children(id).next().is_none(),
        PseudoClass::FirstChild => prev_element_sibling(tree, id).is_none(),
        PseudoClass::LastChild => next_element_sibling(tree, id).is_none(),
        PseudoClass::OnlyChild => {
            prev_element_sibling(tree, id).is_none() && next_element_sibling(tree, id).is_none()
        }
        PseudoClass::Disabled => {
            FORM_CONTROLS.contains(&elem.tag_name.as_str()) && elem.attrs.has_attribute("disabled")
        }
        PseudoClass::Enabled => {
            FORM_CONTROLS.contains(&elem.tag_name.as_str()) && !elem.attrs.has_attribute("disabled")
        }
        PseudoClass::Checked => match elem.tag_name.as_str() {
            "input" => elem.attrs.has_attribute("checked"),
            "option" => elem.attrs.has_attribute("selected"),
            _ => false,
        },
        PseudoClass::Not(list) => !list.matches(tree, id),
    }
}

fn prev_element_sibling(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    let mut cursor = tree.get(id)?.prev_sibling;
    while let Some(node) = tree.get(cursor) {
        if node.is_element() {
            return Some(cursor);
        }
        cursor = node.prev_sibling;
    }
    None
}

fn next_element_sibling(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    let mut cursor = tree.get(id)?.next_sibling;
    while let Some(node) = tree.get(cursor) {
        if node.is_element() {
            return Some(cursor);
        }
        cursor = node.next_sibling;
    }
    None
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar { ch, pos: self.pos },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), SelectorError> {
        if self.eat(ch) { Ok(()) } else { Err(self.unexpected()) }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(SelectorError::ExpectedIdent(start));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_list(&mut self, nested: bool) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') if nested => return Ok(list),
                None if !nested => return Ok(list),
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut parts = vec![(Combinator::Descendant, self.parse_compound()?)];
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(',' | ')') | None => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
            }
            parts.push((combinator, self.parse_compound()?));
        }
        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut components = Vec::new();
        match self.peek() {
            Some('*') => {
                self.bump();
                components.push(SelectorComponent::Universal);
            }
            Some(c) if is_ident_start(c) => {
                components.push(SelectorComponent::Type(self.ident()?.to_ascii_lowercase()));
            }
            _ => {}
        }
        loop {
            let component = match self.peek() {
                Some('#') => {
                    self.bump();
                    SelectorComponent::Id(self.ident()?)
                }
                Some('.') => {
                    self.bump();
                    SelectorComponent::Class(self.ident()?)
                }
                Some('[') => {
                    self.bump();
                    SelectorComponent::Attribute(self.parse_attribute()?)
                }
                Some(':') => {
                    self.bump();
                    SelectorComponent::PseudoClass(self.parse_pseudo_class()?)
                }
                _ => break,
            };
            components.push(component);
        }
        if components.is_empty() {
            return Err(self.unexpected());
        }
        Ok(CompoundSelector { components })
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        if self.eat(']') {
            return Ok(AttributeSelector { name, matcher: None, case_insensitive: false });
        }

        let op = match self.bump() {
            Some('=') => '=',
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                c
            }
            _ => return Err(self.unexpected()),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => self.quoted(q)?,
            _ => self.ident()?,
        };
        self.skip_ws();
        let case_insensitive = matches!(self.peek(), Some('i' | 'I'));
        if case_insensitive {
            self.bump();
            self.skip_ws();
        }
        self.expect(']')?;

        let matcher = match op {
            '=' => AttributeMatcher::Exact(value),
            '~' => AttributeMatcher::Contains(value),
            '|' => AttributeMatcher::DashMatch(value),
            '^' => AttributeMatcher::Prefix(value),
            '$' => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector { name, matcher: Some(matcher), case_insensitive })
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SelectorError::UnterminatedString(start)),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(SelectorError::UnterminatedString(start)),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_pseudo_class(&mut self) -> Result<PseudoClass, SelectorError> {
        let name = self.ident()?.to_ascii_lowercase();
        let pseudo = match name.as_str() {
            "root" => PseudoClass::Root,
            "empty" => PseudoClass::Empty,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "checked" => PseudoClass::Checked,
            "not" => {
                self.expect('(')?;
                let start = self.pos;
                let selectors = self.parse_list(true)?;
                let source = self.src[start..self.pos].trim().to_string();
                self.expect(')')?;
                PseudoClass::Not(Box::new(SelectorList { source, selectors }))
            }
            _ => return Err(SelectorError::UnsupportedPseudoClass(name)),
        };
        Ok(pseudo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(markup: &[(&str, &[(&str, &str)], Option<usize>)]) -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let mut ids = Vec::new();
        for (tag, attrs, parent) in markup {
            let id = tree.create_element(tag);
            for (name, value) in *attrs {
                tree.set_attribute(id, name, value).unwrap();
            }
            let parent = parent.map_or(tree.root(), |p| ids[p]);
            tree.append_child(parent, id).unwrap();
            ids.push(id);
        }
        (tree, ids)
    }

    #[test]
    fn test_parse_compound() {
        let list = SelectorList::parse("div#main.a.b[data-x='1' i]:not(.c)").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.source(), "div#main.a.b[data-x='1' i]:not(.c)");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorList::parse("  "), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("div,"), Err(SelectorError::UnexpectedEnd));
        assert!(matches!(SelectorList::parse("div > "), Err(SelectorError::UnexpectedEnd)));
        assert!(matches!(SelectorList::parse("[a=\"x]"), Err(SelectorError::UnterminatedString(_))));
        assert_eq!(
            SelectorList::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudoClass("hover".into()))
        );
        assert!(matches!(SelectorList::parse("a!"), Err(SelectorError::UnexpectedChar { ch: '!', .. })));
    }

    #[test]
    fn test_attribute_selector_exact() {
        let sel = AttributeSelector {
            name: "type".into(),
            matcher: Some(AttributeMatcher::Exact("text".into())),
            case_insensitive: true,
        };
        assert!(sel.matches(Some("TEXT")));
        assert!(!sel.matches(Some("password")));
        assert!(!sel.matches(None));
    }

    #[test]
    fn test_attribute_selector_variants() {
        let make = |m| AttributeSelector { name: "x".into(), matcher: Some(m), case_insensitive: false };
        assert!(make(AttributeMatcher::Contains("b".into())).matches(Some("a b c")));
        assert!(make(AttributeMatcher::DashMatch("en".into())).matches(Some("en-US")));
        assert!(make(AttributeMatcher::Prefix("http".into())).matches(Some("https://x")));
        assert!(make(AttributeMatcher::Suffix(".png".into())).matches(Some("a.png")));
        assert!(make(AttributeMatcher::Substring("mid".into())).matches(Some("amidst")));
        assert!(!make(AttributeMatcher::Prefix(String::new())).matches(Some("x")));
    }

    #[test]
    fn test_combinators() {
        // ul > li.first + li ~ li
        let (tree, ids) = tree_with(&[
            ("ul", &[("class", "menu")], None),
            ("li", &[("class", "first")], Some(0)),
            ("li", &[], Some(0)),
            ("li", &[("class", "last")], Some(0)),
            ("span", &[], Some(3)),
        ]);
        let check = |sel: &str, id: NodeId| SelectorList::parse(sel).unwrap().matches(&tree, id);

        assert!(check(".menu > li", ids[1]));
        assert!(check(".menu span", ids[4]));
        assert!(!check(".menu > span", ids[4]));
        assert!(check("li.first + li", ids[2]));
        assert!(!check("li.first + li", ids[3]));
        assert!(check("li.first ~ li", ids[3]));
        assert!(check("li:first-child", ids[1]));
        assert!(check("li:last-child", ids[3]));
        assert!(check("span:only-child", ids[4]));
        assert!(check("ul:root", ids[0]));
    }

    #[test]
    fn test_selector_list_and_not() {
        let (tree, ids) = tree_with(&[
            ("a", &[("class", "item disabled")], None),
            ("button", &[("disabled", "")], None),
            ("input", &[("type", "checkbox"), ("checked", "")], None),
        ]);
        let check = |sel: &str, id: NodeId| SelectorList::parse(sel).unwrap().matches(&tree, id);

        assert!(!check(".item:not(.disabled)", ids[0]));
        assert!(check("span, a", ids[0]));
        assert!(check("button:disabled", ids[1]));
        assert!(!check("button:enabled", ids[1]));
        assert!(check("[type=checkbox]:checked", ids[2]));
        assert!(check("*", ids[2]));
    }

    #[test]
    fn test_non_elements_never_match() {
        let mut tree = DomTree::new();
        let text = tree.create_text("x");
        tree.append_child(tree.root(), text).unwrap();
        let list = SelectorList::parse("*").unwrap();
        assert!(!list.matches(&tree, text));
        assert!(!list.matches(&tree, NodeId::ROOT));
    }
}
