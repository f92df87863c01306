use std::collections::HashSet;

use serde::Serialize;

use crate::document::Document;

use super::assemble::assemble;
use super::entity::{Flavor, Hints};
use super::pagination::PaginationInfo;
use super::{Context, Engine, EntityRecord, Genre};

/// Cards shown in the home page's "recent" section.
pub const HOME_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Latest,
    Ongoing,
    Completed,
    Popular,
    Search,
    Genre,
    Batch,
    Movie,
}

impl ListKind {
    pub fn hints(self) -> Hints<'static> {
        let mut hints = Hints::new(match self {
            Self::Latest => Flavor::Latest,
            _ => Flavor::Library,
        });

        hints.status = match self {
            Self::Latest => None,
            Self::Ongoing => Some("Ongoing"),
            Self::Completed => Some("Completed"),
            Self::Popular => Some("Popular"),
            Self::Search => Some("Search"),
            Self::Genre => Some("Genre"),
            Self::Batch => Some("Batch"),
            Self::Movie => Some("Movie"),
        };

        if self == Self::Movie {
            hints.kind = Some("Movie");
        }

        hints
    }
}

/// A task result with the pagination of the page it came from.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: T,
    pub pagination: Option<PaginationInfo>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RankedEntity {
    pub rank: usize,
    #[serde(flatten)]
    pub entity: EntityRecord,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Home {
    pub recent: Vec<EntityRecord>,
    pub top10: Vec<RankedEntity>,
}

impl Engine {
    pub fn home(&self, doc: &Document, ctx: &Context<'_>) -> Home {
        let schema = &self.schema;

        let recent = assemble(
            "recent releases",
            doc.select(&schema.list_item).take(HOME_RECENT_LIMIT),
            |node| {
                self.entities
                    .extract(node, ctx, ListKind::Latest.hints())
            },
        );

        let top10 = assemble("top titles", doc.select(&schema.top_item), |node| {
            self.entities.extract(node, ctx, Hints::new(Flavor::Library))
        })
        .into_iter()
        .enumerate()
        .map(|(idx, entity)| RankedEntity {
            rank: idx + 1,
            entity,
        })
        .collect();

        Home { recent, top10 }
    }

    /// Cards of a catalogue listing page.
    pub fn listing(
        &self,
        doc: &Document,
        ctx: &Context<'_>,
        kind: ListKind,
        page: u32,
    ) -> Page<Vec<EntityRecord>> {
        let hints = kind.hints();
        let data = assemble(
            &format!("{kind:?} listing"),
            doc.select(&self.schema.list_item),
            |node| self.entities.extract(node, ctx, hints),
        );

        Page {
            data,
            pagination: self.pagination.read(doc.root(), page),
        }
    }

    /// Every genre linked from the page, sorted by title.
    pub fn genres(&self, doc: &Document, ctx: &Context<'_>) -> Vec<Genre> {
        let mut seen = HashSet::new();
        let mut genres = doc
            .select(&self.schema.genre_link)
            .filter(|link| link.attr("href").is_some_and(|href| seen.insert(href.trim())))
            .filter_map(|link| Genre::from_link(link, ctx))
            .map(|mut genre| {
                if let Some((title, _)) = genre.title.split_once('(') {
                    genre.title = title.trim_end().to_owned();
                }

                genre
            })
            .collect::<Vec<_>>();

        genres.sort_by_cached_key(|genre| genre.title.to_lowercase());

        genres
    }
}
