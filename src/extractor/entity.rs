use reqwest::Url;

use crate::config::Schema;
use crate::document::Node;
use crate::selector::CssSelector;

use super::pattern::TextPattern;
use super::rule::{non_empty, ExtractionRule, Source};
use super::{identity, Context, EntityRecord, Genre};

/// Shown when a card carries no usable image.
pub const PLACEHOLDER_POSTER: &str = "https://dummyimage.com/300x400/000/fff&text=No+Image";

pub const DEFAULT_SCORE: &str = "?";
pub const DEFAULT_KIND: &str = "TV";
pub const DEFAULT_STATUS: &str = "Unknown";
pub const DEFAULT_EPISODE: &str = "?";
pub const DEFAULT_RELEASED_ON: &str = "?";
pub const DEFAULT_ESTIMATION: &str = "Update";

/// Which optional fields a task wants on top of the common ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Catalogue cards.
    Library,
    /// Latest-release cards: episode number and release date.
    Latest,
    /// Schedule entries: estimated release time.
    Scheduled,
}

/// What a task knows about its cards regardless of their markup.
#[derive(Debug, Clone, Copy)]
pub struct Hints<'s> {
    pub flavor: Flavor,
    /// Used when the card has no status element.
    pub status: Option<&'s str>,
    /// Overrides the card's own type.
    pub kind: Option<&'s str>,
}

impl Hints<'_> {
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            status: None,
            kind: None,
        }
    }
}

fn title_text(value: String) -> Option<String> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");

    (value.chars().count() >= 2).then_some(value)
}

/// First URL of a `src`/`srcset` value with the query string dropped. Inline `data:` URIs are rejected.
fn poster_url(value: String) -> Option<String> {
    let url = value.split_whitespace().next()?.trim_end_matches(',');

    if url.is_empty() || url.starts_with("data:") {
        return None;
    }

    url.split('?').next().map(Into::into)
}

fn first_number(value: String) -> Option<String> {
    TextPattern::Number.find(&value)
}

fn time_of_day(value: String) -> Option<String> {
    TextPattern::TimeOfDay.find(&value)
}

pub struct EntityExtractor {
    anchor: CssSelector,
    genre_link: CssSelector,
    title: ExtractionRule,
    poster: ExtractionRule,
    score: ExtractionRule,
    kind: ExtractionRule,
    status: ExtractionRule,
    episode: ExtractionRule,
    released_on: ExtractionRule,
    estimation: ExtractionRule,
}

impl EntityExtractor {
    pub fn from_schema(schema: &Schema) -> Self {
        let img = &schema.image;
        let tip = &schema.tooltip;

        Self {
            anchor: schema.anchor.clone(),
            genre_link: schema.genre_link.clone(),

            title: ExtractionRule::new()
                .then(Source::Attr(schema.anchor.clone(), "title"), title_text)
                .then(Source::Text(schema.title.clone()), title_text)
                .then(Source::Text(schema.anchor.clone()), title_text)
                .then(Source::Attr(img.clone(), "alt"), title_text),

            poster: ExtractionRule::new()
                .then(Source::Attr(img.clone(), "src"), poster_url)
                .then(Source::Attr(img.clone(), "data-src"), poster_url)
                .then(Source::Attr(img.clone(), "data-lazy-src"), poster_url)
                .then(Source::Attr(img.clone(), "srcset"), poster_url)
                .or(Source::Const(PLACEHOLDER_POSTER)),

            score: ExtractionRule::new()
                .or(Source::Text(schema.score.clone()))
                .or(Source::PatternIn(tip.clone(), TextPattern::Score))
                .or(Source::Pattern(TextPattern::Score)),

            kind: ExtractionRule::new()
                .or(Source::Text(schema.kind.clone()))
                .or(Source::PatternIn(tip.clone(), TextPattern::Type))
                .or(Source::Pattern(TextPattern::Type)),

            status: ExtractionRule::new().or(Source::Text(schema.status.clone())),

            episode: ExtractionRule::new()
                .then(Source::Text(schema.episode.clone()), first_number)
                .or(Source::Pattern(TextPattern::Episode)),

            released_on: ExtractionRule::new()
                .or(Source::Text(schema.date.clone()))
                .or(Source::Pattern(TextPattern::RelativeDate)),

            estimation: ExtractionRule::new()
                .then(Source::Text(schema.release_time.clone()), time_of_day)
                .or(Source::Text(schema.release_time.clone()))
                .or(Source::Pattern(TextPattern::TimeOfDay)),
        }
    }

    /// The href of the first real link on or under `node`.
    fn canonical_href<'a>(&self, node: Node<'a>) -> Option<&'a str> {
        let is_link = |href: &&str| {
            let href = href.trim();
            !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:")
        };

        node.attr("href")
            .filter(|_| node.matches(&self.anchor))
            .filter(is_link)
            .or_else(|| {
                node.select(&self.anchor)
                    .filter_map(|a| a.attr("href"))
                    .find(is_link)
            })
    }

    /// Builds a record from a candidate node. `None` when the node carries no link.
    pub fn extract(&self, node: Node<'_>, ctx: &Context<'_>, hints: Hints<'_>) -> Option<EntityRecord> {
        let href = self.canonical_href(node)?;
        let source_url = ctx.resolve(href);
        let id = source_url.as_ref().map(identity).unwrap_or_default();

        let status = self
            .status
            .resolve(node)
            .or_else(|| hints.status.map(Into::into))
            .unwrap_or_else(|| DEFAULT_STATUS.into());
        let kind = match hints.kind {
            Some(kind) => kind.into(),
            None => self.kind.resolve_or(node, DEFAULT_KIND),
        };

        let (episodes, released_on, estimation) = match hints.flavor {
            Flavor::Library => (None, None, None),

            Flavor::Latest => (
                Some(self.episode.resolve_or(node, DEFAULT_EPISODE)),
                Some(self.released_on.resolve_or(node, DEFAULT_RELEASED_ON)),
                None,
            ),

            Flavor::Scheduled => (
                None,
                None,
                Some(self.estimation.resolve_or(node, DEFAULT_ESTIMATION)),
            ),
        };

        Some(EntityRecord {
            title: self.title.resolve_or(node, "Unknown"),
            poster: self.poster(node, ctx),
            href: ctx.route("anime", &id),
            source_url: source_url
                .map(String::from)
                .unwrap_or_else(|| href.trim().into()),
            id,
            score: self.score.resolve_or(node, DEFAULT_SCORE),
            kind,
            status,
            episodes,
            released_on,
            estimation,
            genre_list: self.genres(node, ctx),
        })
    }

    /// Poster of the first image under `node`, or the placeholder.
    pub fn poster(&self, node: Node<'_>, ctx: &Context<'_>) -> String {
        let poster = self.poster.resolve_or(node, PLACEHOLDER_POSTER);

        match Url::parse(&poster) {
            Ok(_) => poster,
            Err(_) => ctx.resolve(&poster).map(Into::into).unwrap_or(poster),
        }
    }

    /// Genre links under `node`, in document order.
    pub fn genres(&self, node: Node<'_>, ctx: &Context<'_>) -> Vec<Genre> {
        node.select(&self.genre_link)
            .filter_map(|a| Genre::from_link(a, ctx))
            .collect()
    }
}
