use std::iter;

use tracing::trace;

use crate::document::Node;
use crate::selector::CssSelector;

use super::label::Label;

/// Headings longer than this are prose, not labels.
pub const MAX_HEADING_LEN: usize = 20;

/// How many siblings after a heading are inspected before giving up.
pub const MAX_SIBLING_WALK: usize = 5;

const HEADING_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "strong", "b", "dt", "th", "header",
];

fn is_heading(node: &Node<'_>) -> bool {
    HEADING_TAGS.contains(&node.tag())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// An element whose id or class token is the label.
    DirectId,
    /// A short heading naming the label, followed closely by the content.
    HeadingProximity,
    /// A `data-*` attribute naming the label.
    AttributeContent,
    /// The label anywhere in the text.
    TextScan,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::DirectId,
        Strategy::HeadingProximity,
        Strategy::AttributeContent,
        Strategy::TextScan,
    ];
}

/// Outcome of the heading strategy.
enum Headed<'a> {
    Content(Node<'a>),
    /// A heading names the label but no content follows it.
    Empty,
    NoHeading,
}

/// Finds the container of a labeled section (e.g. one weekday of a release schedule).
#[derive(Debug, Clone)]
pub struct SectionLocator {
    /// Marks a node as holding at least one candidate entity.
    marker: CssSelector,
}

impl SectionLocator {
    pub fn new(marker: CssSelector) -> Self {
        Self { marker }
    }

    pub fn locate<'a>(&self, root: Node<'a>, label: &Label) -> Option<Node<'a>> {
        self.locate_with_strategy(root, label).map(|(node, _)| node)
    }

    /// Tries each strategy in priority order; the first one to find a container wins.
    ///
    /// A heading naming the label that has no content before the next heading settles the
    /// lookup: the section exists and is empty, so the later strategies are not consulted.
    pub fn locate_with_strategy<'a>(
        &self,
        root: Node<'a>,
        label: &Label,
    ) -> Option<(Node<'a>, Strategy)> {
        for strategy in Strategy::ALL {
            let node = match strategy {
                Strategy::DirectId => self.direct_id(root, label),

                Strategy::HeadingProximity => match self.heading_proximity(root, label) {
                    Headed::Content(node) => Some(node),

                    Headed::Empty => {
                        trace!(%label, "Found a heading with no content after it");

                        return None;
                    }

                    Headed::NoHeading => None,
                },

                Strategy::AttributeContent => self.attribute_content(root, label),
                Strategy::TextScan => self.text_scan(root, label),
            };

            if let Some(node) = node {
                trace!(%label, ?strategy, tag = node.tag(), "Located a section");

                return Some((node, strategy));
            }
        }

        None
    }

    fn direct_id<'a>(&self, root: Node<'a>, label: &Label) -> Option<Node<'a>> {
        root.descendants_matching(|node| node.id().is_some_and(|id| label.matches(id)))
            .next()
            .or_else(|| {
                root.descendants_matching(|node| node.classes().any(|class| label.matches(class)))
                    .next()
            })
    }

    fn heading_proximity<'a>(&self, root: Node<'a>, label: &Label) -> Headed<'a> {
        let mut headings = root
            .descendants_matching(|node| {
                if !is_heading(node) {
                    return false;
                }

                let text = node.clean_text();

                text.chars().count() <= MAX_HEADING_LEN && label.matches(&text)
            })
            .peekable();

        if headings.peek().is_none() {
            return Headed::NoHeading;
        }

        headings
            .find_map(|heading| self.walk_siblings(root, heading))
            .map_or(Headed::Empty, Headed::Content)
    }

    /// Looks for content among the siblings following `heading`, stopping at the next heading.
    ///
    /// A heading wrapped in its own element (`<div><h4>Senin</h4></div>`) walks from the wrapper,
    /// and a wrapped heading ends the walk like a bare one.
    fn walk_siblings<'a>(&self, root: Node<'a>, heading: Node<'a>) -> Option<Node<'a>> {
        let start = match heading.next_sibling() {
            Some(_) => heading,
            None => heading.parent().filter(|parent| *parent != root)?,
        };

        iter::successors(start.next_sibling(), Node::next_sibling)
            .take(MAX_SIBLING_WALK)
            .take_while(|node| !self.ends_section(node))
            .find(|node| node.contains(&self.marker))
    }

    /// A heading, or an element without content that wraps one.
    fn ends_section(&self, node: &Node<'_>) -> bool {
        if is_heading(node) {
            return true;
        }

        !node.contains(&self.marker) && node.descendants_matching(is_heading).next().is_some()
    }

    fn attribute_content<'a>(&self, root: Node<'a>, label: &Label) -> Option<Node<'a>> {
        root.descendants_matching(|node| {
            node.attrs().any(|(name, value)| {
                name.starts_with("data-")
                    && !name.ends_with("src")
                    && !name.ends_with("srcset")
                    && label.matches_word(value)
            }) && node.contains(&self.marker)
        })
        .next()
    }

    fn text_scan<'a>(&self, root: Node<'a>, label: &Label) -> Option<Node<'a>> {
        let (holder, _) = root
            .text_nodes()
            .filter(|(holder, _)| !matches!(holder.tag(), "script" | "style"))
            .find(|(_, text)| label.matches_word(text))?;

        iter::successors(Some(holder), Node::parent)
            .take_while(|node| *node != root)
            .find(|node| node.contains(&self.marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::extractor::label::Weekday;

    fn locator() -> SectionLocator {
        SectionLocator::new(CssSelector::new(r#"a[href*="/anime/"]"#).unwrap())
    }

    fn locate(html: &str, day: &str) -> Option<(String, Strategy)> {
        let doc = Document::parse_str(html).unwrap();
        let label = Weekday::from_name(day).unwrap().label();

        locator()
            .locate_with_strategy(doc.root(), &label)
            .map(|(node, strategy)| (node.attr("data-t").unwrap_or("?").to_owned(), strategy))
    }

    #[test]
    fn alias_heading_followed_by_list() {
        let doc = Document::parse_str(
            r#"
            <div class="schedule">
              <h4>Kamis</h4>
              <ul data-t="thu"><li><a href="/anime/t/">T</a></li></ul>
              <h4>Jumaat</h4>
              <p>Jadwal dapat berubah</p>
              <ul data-t="fri">
                <li><a href="/anime/a/">A</a></li>
                <li><a href="/anime/b/">B</a></li>
                <li><a href="/anime/c/">C</a></li>
              </ul>
            </div>
            "#,
        )
        .unwrap();
        let label = Weekday::from_name("jumat").unwrap().label();
        let (node, strategy) = locator()
            .locate_with_strategy(doc.root(), &label)
            .unwrap();

        assert_eq!(strategy, Strategy::HeadingProximity);
        assert_eq!(node.attr("data-t"), Some("fri"));
        assert_eq!(node.children().count(), 3);
    }

    #[test]
    fn direct_id_beats_heading() {
        let html = r#"
            <h3>Senin</h3>
            <ul data-t="heading"><li><a href="/anime/x/">x</a></li></ul>
            <div id="Senin" data-t="direct"><a href="/anime/y/">y</a></div>
        "#;

        assert_eq!(
            locate(html, "monday"),
            Some(("direct".into(), Strategy::DirectId))
        );
    }

    #[test]
    fn class_token_counts_as_direct() {
        let html = r#"<div class="tab monday" data-t="cls"></div>"#;

        assert_eq!(locate(html, "senin"), Some(("cls".into(), Strategy::DirectId)));
    }

    #[test]
    fn heading_walk_stops_at_the_next_heading() {
        let html = r#"
            <div data-t="all">
              <h4>Senin</h4>
              <p>Libur</p>
              <h4>Selasa</h4>
              <ul data-t="tue"><li><a href="/anime/x/">x</a></li></ul>
            </div>
        "#;

        assert_eq!(
            locate(html, "selasa"),
            Some(("tue".into(), Strategy::HeadingProximity))
        );
        assert_eq!(locate(html, "senin"), None);
    }

    #[test]
    fn wrapped_next_heading_ends_the_walk() {
        let html = r#"
            <section data-t="all">
              <div class="day-title"><h4>Senin</h4></div>
              <div class="day-title"><h4>Selasa</h4></div>
              <div data-t="tue"><a href="/anime/t1/">t1</a></div>
            </section>
        "#;

        assert_eq!(locate(html, "monday"), None);
        assert_eq!(
            locate(html, "tuesday"),
            Some(("tue".into(), Strategy::HeadingProximity))
        );
    }

    #[test]
    fn cards_with_bold_text_are_content() {
        let html = r#"
            <div>
              <h4>Kamis</h4>
              <ul data-t="thu"><li><b>Baru</b> <a href="/anime/x/">x</a></li></ul>
            </div>
        "#;

        assert_eq!(
            locate(html, "thursday"),
            Some(("thu".into(), Strategy::HeadingProximity))
        );
    }

    #[test]
    fn heading_walk_is_bounded() {
        let html = r#"
            <div data-t="all">
              <h4>Rabu</h4>
              <p>1</p><p>2</p><p>3</p><p>4</p><p>5</p>
              <ul data-t="far"><li><a href="/anime/x/">x</a></li></ul>
            </div>
        "#;

        assert_eq!(locate(html, "wednesday"), None);
    }

    #[test]
    fn long_headings_are_prose() {
        let html = r#"
            <h2>Anime yang tayang hari Kamis</h2>
            <ul data-t="x"><li><a href="/anime/x/">x</a></li></ul>
        "#;

        assert_ne!(
            locate(html, "kamis").map(|(_, s)| s),
            Some(Strategy::HeadingProximity)
        );
    }

    #[test]
    fn wrapped_heading_walks_from_the_wrapper() {
        let html = r#"
            <section>
              <div class="day-title"><h4>Sabtu</h4></div>
              <div data-t="sat"><a href="/anime/x/">x</a></div>
            </section>
        "#;

        assert_eq!(
            locate(html, "saturday"),
            Some(("sat".into(), Strategy::HeadingProximity))
        );
    }

    #[test]
    fn data_attribute() {
        let html = r#"
            <div data-day="minggu" data-t="sun"><a href="/anime/x/">x</a></div>
            <div data-src="minggu.jpg"><a href="/anime/y/">y</a></div>
        "#;

        assert_eq!(
            locate(html, "sunday"),
            Some(("sun".into(), Strategy::AttributeContent))
        );
    }

    #[test]
    fn text_scan_ascends_to_content() {
        let html = r#"
            <script>var day = "kamis";</script>
            <div data-t="thu">
              <p>Rilis hari <span>Kamis</span> malam</p>
              <a href="/anime/x/">x</a>
            </div>
        "#;

        assert_eq!(
            locate(html, "thursday"),
            Some(("thu".into(), Strategy::TextScan))
        );
    }

    #[test]
    fn nothing_found() {
        let html = r#"<p>Senin</p><div><a href="/genre/x/">x</a></div>"#;

        assert_eq!(locate(html, "friday"), None);
        assert_eq!(locate(html, "monday"), None);
    }
}
