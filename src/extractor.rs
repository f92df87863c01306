mod assemble;
mod detail;
mod entity;
mod label;
mod locate;
mod pages;
mod pagination;
mod pattern;
mod rule;
mod schedule;

use reqwest::Url;
use serde::Serialize;

use crate::config::Schema;
use crate::document::Node;

pub use self::detail::{AnimeDetail, EpisodeDetail};
pub use self::pages::{ListKind, Page, RankedEntity};
pub use self::pagination::PaginationInfo;
pub use self::schedule::ScheduleGroup;

use self::assemble::Identified;
use self::entity::EntityExtractor;
use self::locate::SectionLocator;
use self::pagination::PaginationReader;

/// Where a document came from and how local links are spelled.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    page_url: &'a Url,
    route_prefix: &'a str,
}

impl<'a> Context<'a> {
    pub fn new(page_url: &'a Url, route_prefix: &'a str) -> Self {
        Self {
            page_url,
            route_prefix,
        }
    }

    /// Resolves an href against the page URL. Fragment-only and `javascript:` links resolve to nothing.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }

        self.page_url.join(href).ok()
    }

    /// A link into this service, e.g. `{prefix}/anime/{id}`.
    pub fn route(&self, kind: &str, id: &str) -> String {
        format!("{}/{kind}/{id}", self.route_prefix)
    }
}

/// The last non-empty path segment of `url`. Query and fragment do not take part.
pub fn identity(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(Into::into)
        .unwrap_or_default()
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub title: String,
    #[serde(rename = "genreId")]
    pub id: String,
    pub href: String,
    pub source_url: String,
}

impl Genre {
    pub(crate) fn from_link(link: Node<'_>, ctx: &Context<'_>) -> Option<Self> {
        let url = ctx.resolve(link.attr("href")?)?;
        let id = identity(&url);

        if id.is_empty() {
            return None;
        }

        Some(Self {
            title: link.clean_text(),
            href: ctx.route("genres", &id),
            source_url: url.into(),
            id,
        })
    }
}

/// One title as it appears on a listing, schedule or home page.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub title: String,
    pub poster: String,
    #[serde(rename = "animeId")]
    pub id: String,
    pub href: String,
    pub source_url: String,
    pub score: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimation: Option<String>,
    pub genre_list: Vec<Genre>,
}

impl Identified for EntityRecord {
    fn identity(&self) -> &str {
        &self.id
    }
}

impl Identified for Genre {
    fn identity(&self) -> &str {
        &self.source_url
    }
}

/// The extraction engine for one site schema.
///
/// Every task is a pure function of an already parsed document; the engine holds no per-request state.
pub struct Engine {
    schema: Schema,
    entities: EntityExtractor,
    locator: SectionLocator,
    pagination: PaginationReader,
}

impl Engine {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
            entities: EntityExtractor::from_schema(schema),
            locator: SectionLocator::new(schema.item_link.clone()),
            pagination: PaginationReader::from_schema(schema),
        }
    }
}
