use crate::document::Node;
use crate::selector::CssSelector;

use super::pattern::TextPattern;

/// Where a candidate value for a field is read from, relative to the candidate node.
#[derive(Debug, Clone)]
pub enum Source {
    /// An attribute of the first element matching the selector (the node itself included).
    Attr(CssSelector, &'static str),
    /// Trimmed, whitespace-collapsed text of the first element matching the selector.
    Text(CssSelector),
    /// A labeled pattern searched in the text of the first element matching the selector.
    PatternIn(CssSelector, TextPattern),
    /// A labeled pattern searched in the node's joined text.
    Pattern(TextPattern),
    /// A fixed value.
    Const(&'static str),
}

impl Source {
    fn read(&self, node: Node<'_>) -> Option<String> {
        match self {
            Self::Attr(sel, name) => node.find_inclusive(sel)?.attr(name).map(Into::into),
            Self::Text(sel) => Some(node.find_inclusive(sel)?.clean_text()),
            Self::PatternIn(sel, pattern) => pattern.find(&node.find_inclusive(sel)?.clean_text()),
            Self::Pattern(pattern) => pattern.find(&node.clean_text()),
            Self::Const(value) => Some((*value).into()),
        }
    }
}

/// Validates and normalizes a raw value. `None` rejects it.
pub type Transform = fn(String) -> Option<String>;

/// Accepts any non-blank value, trimmed.
pub fn non_empty(value: String) -> Option<String> {
    let value = value.trim();

    (!value.is_empty()).then(|| value.into())
}

/// An ordered fallback chain for one logical field.
///
/// Sources are tried in order; the first one producing a value its transform accepts wins.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRule {
    steps: Vec<(Source, Transform)>,
}

impl ExtractionRule {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn then(mut self, source: Source, transform: Transform) -> Self {
        self.steps.push((source, transform));
        self
    }

    pub fn or(self, source: Source) -> Self {
        self.then(source, non_empty)
    }

    pub fn resolve(&self, node: Node<'_>) -> Option<String> {
        self.steps
            .iter()
            .find_map(|(source, transform)| source.read(node).and_then(transform))
    }

    /// Like [`Self::resolve`], falling back to `default` when every source fails.
    pub fn resolve_or(&self, node: Node<'_>, default: &str) -> String {
        self.resolve(node).unwrap_or_else(|| default.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn sel(s: &str) -> CssSelector {
        CssSelector::new(s).unwrap()
    }

    fn long_enough(value: String) -> Option<String> {
        non_empty(value).filter(|v| v.chars().count() >= 3)
    }

    #[test]
    fn first_accepted_source_wins() {
        let doc = Document::parse_str(
            r#"<div id=n><a href="/x" title="">ab</a><span class=t>  Long  title </span></div>"#,
        )
        .unwrap();
        let node = doc.find(&sel("#n")).unwrap();

        let rule = ExtractionRule::new()
            .then(Source::Attr(sel("a"), "title"), long_enough)
            .then(Source::Text(sel("a")), long_enough)
            .then(Source::Text(sel(".t")), long_enough)
            .or(Source::Const("fallback"));

        assert_eq!(rule.resolve(node).as_deref(), Some("Long title"));
    }

    #[test]
    fn constant_and_default() {
        let doc = Document::parse_str("<p id=n>nothing</p>").unwrap();
        let node = doc.find(&sel("#n")).unwrap();

        let empty = ExtractionRule::new().or(Source::Text(sel(".missing")));
        assert_eq!(empty.resolve(node), None);
        assert_eq!(empty.resolve_or(node, "?"), "?");

        let with_const = empty.or(Source::Const("TV"));
        assert_eq!(with_const.resolve(node).as_deref(), Some("TV"));
    }

    #[test]
    fn attr_source_considers_the_node_itself() {
        let doc = Document::parse_str(r#"<a id=n href=" /anime/x/ ">x</a>"#).unwrap();
        let node = doc.find(&sel("#n")).unwrap();
        let rule = ExtractionRule::new().or(Source::Attr(sel("a[href]"), "href"));

        assert_eq!(rule.resolve(node).as_deref(), Some("/anime/x/"));
    }

    #[test]
    fn pattern_source_reads_joined_text() {
        let doc = Document::parse_str("<li id=n><b>Pukul</b> <i>20.45</i></li>").unwrap();
        let node = doc.find(&sel("#n")).unwrap();
        let rule = ExtractionRule::new()
            .or(Source::Text(sel(".time")))
            .or(Source::Pattern(TextPattern::TimeOfDay));

        assert_eq!(rule.resolve(node).as_deref(), Some("20:45"));
    }

    #[test]
    fn scoped_pattern_ignores_the_rest_of_the_node() {
        let doc = Document::parse_str(
            r#"<li id=n>Score: 9.1 <div class=tip>Score: 7,25</div></li>"#,
        )
        .unwrap();
        let node = doc.find(&sel("#n")).unwrap();
        let rule = ExtractionRule::new()
            .or(Source::PatternIn(sel(".tip"), TextPattern::Score))
            .or(Source::Pattern(TextPattern::Score));

        assert_eq!(rule.resolve(node).as_deref(), Some("7.25"));

        let doc = Document::parse_str("<li id=n>Score: 9.1</li>").unwrap();
        let node = doc.find(&sel("#n")).unwrap();
        assert_eq!(rule.resolve(node).as_deref(), Some("9.1"));
    }
}
