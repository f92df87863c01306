use ego_tree::NodeRef;
use scraper::{CaseSensitivity, ElementRef, Html};
use thiserror::Error;

use crate::selector::CssSelector;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("the document is not valid UTF-8 (at byte {valid_up_to})")]
    NotUtf8 { valid_up_to: usize },

    #[error("the document is empty")]
    Empty,
}

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let s = std::str::from_utf8(bytes).map_err(|e| ParseError::NotUtf8 {
            valid_up_to: e.valid_up_to(),
        })?;

        Self::parse_str(s)
    }

    pub fn parse_str(s: &str) -> Result<Self, ParseError> {
        if s.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        Ok(Self {
            html: Html::parse_document(s),
        })
    }

    pub fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }

    pub fn find(&self, selector: &CssSelector) -> Option<Node<'_>> {
        self.root().find(selector)
    }

    pub fn select<'a>(&'a self, selector: &'a CssSelector) -> impl Iterator<Item = Node<'a>> + 'a {
        self.html.select(selector).map(Node)
    }
}

/// Read-only view of an element in a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    pub fn tag(&self) -> &'a str {
        self.0.value().name()
    }

    pub fn id(&self) -> Option<&'a str> {
        self.0.value().id()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.0.value().attrs()
    }

    pub fn classes(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.0.value().classes()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0
            .value()
            .has_class(class, CaseSensitivity::AsciiCaseInsensitive)
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.0.parent().and_then(ElementRef::wrap).map(Node)
    }

    /// The next sibling that is an element, skipping text and comments.
    pub fn next_sibling(&self) -> Option<Node<'a>> {
        self.0.next_siblings().find_map(ElementRef::wrap).map(Node)
    }

    /// The previous sibling that is an element.
    pub fn prev_sibling(&self) -> Option<Node<'a>> {
        self.0.prev_siblings().find_map(ElementRef::wrap).map(Node)
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        self.0.children().filter_map(ElementRef::wrap).map(Node)
    }

    /// Descendants matching `selector`, in document order. The node itself is excluded.
    pub fn select<'s>(&self, selector: &'s CssSelector) -> impl Iterator<Item = Node<'a>> + 's
    where
        'a: 's,
    {
        self.0.select(selector).map(Node)
    }

    pub fn find(&self, selector: &CssSelector) -> Option<Node<'a>> {
        self.0.select(selector).next().map(Node)
    }

    /// `find`, but the node itself is considered first.
    pub fn find_inclusive(&self, selector: &CssSelector) -> Option<Node<'a>> {
        if self.matches(selector) {
            Some(*self)
        } else {
            self.find(selector)
        }
    }

    pub fn matches(&self, selector: &CssSelector) -> bool {
        selector.matches(&self.0)
    }

    pub fn contains(&self, selector: &CssSelector) -> bool {
        self.find_inclusive(selector).is_some()
    }

    /// Descendant elements accepted by `pred`, in document order. The node itself is excluded.
    pub fn descendants_matching<'f, F>(&self, mut pred: F) -> impl Iterator<Item = Node<'a>> + 'f
    where
        'a: 'f,
        F: FnMut(&Node<'a>) -> bool + 'f,
    {
        self.0
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(Node)
            .filter(move |node| pred(node))
    }

    /// Text nodes under this element with the element that directly holds them.
    pub fn text_nodes(&self) -> impl Iterator<Item = (Node<'a>, &'a str)> + 'a {
        self.0.descendants().filter_map(|node: NodeRef<'a, scraper::Node>| {
            let text = node.value().as_text()?;
            let holder = node.parent().and_then(ElementRef::wrap)?;

            Some((Node(holder), &**text))
        })
    }

    /// Descendant text pieces, trimmed, with empty ones dropped, joined by `sep`.
    pub fn joined_text(&self, sep: &str) -> String {
        self.0
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// Trimmed text with inner whitespace runs collapsed to a single space.
    pub fn clean_text(&self) -> String {
        self.joined_text(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
