use std::collections::HashMap;

use serde::Serialize;

use crate::document::{Document, Node};
use crate::selector::CssSelector;

use super::assemble::{assemble, Identified};
use super::entity::{DEFAULT_KIND, DEFAULT_SCORE, DEFAULT_STATUS, PLACEHOLDER_POSTER};
use super::pattern::TextPattern;
use super::{identity, Context, Engine, Genre};

/// Canonical info keys and the spellings the site uses for them.
const INFO_KEYS: &[(&str, &[&str])] = &[
    ("japanese", &["japanese", "judul jepang"]),
    ("synonyms", &["synonyms", "sinonim"]),
    ("english", &["english", "judul inggris"]),
    ("status", &["status"]),
    ("type", &["type", "tipe"]),
    ("source", &["source", "sumber"]),
    ("duration", &["duration", "durasi"]),
    ("episodes", &["total episode", "total episodes", "episodes", "episode"]),
    ("season", &["season", "musim"]),
    ("studios", &["studio", "studios"]),
    ("producers", &["producers", "producer", "produser"]),
    ("aired", &["released", "aired", "dirilis", "tanggal rilis"]),
    ("score", &["score", "skor"]),
];

const NO_VALUE: &str = "-";

/// Parses `Key: Value` lines into a map keyed by canonical key. The first occurrence of a key wins.
fn parse_info<'a>(lines: impl Iterator<Item = Node<'a>>) -> HashMap<&'static str, String> {
    let mut info = HashMap::new();

    for line in lines {
        let text = line.clean_text();

        let Some((key, value)) = text.split_once(':') else {
            continue;
        };

        let key = key.trim().to_lowercase();
        let value = value.trim();

        if value.is_empty() {
            continue;
        }

        if let Some((canonical, _)) = INFO_KEYS
            .iter()
            .find(|(_, spellings)| spellings.contains(&key.as_str()))
        {
            info.entry(*canonical).or_insert_with(|| value.to_owned());
        }
    }

    info
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub value: String,
    pub users: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Synopsis {
    pub paragraphs: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeLink {
    pub title: String,
    pub number: Option<u32>,
    pub episode_id: String,
    pub href: String,
    pub source_url: String,
}

impl Identified for EpisodeLink {
    fn identity(&self) -> &str {
        &self.episode_id
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetail {
    pub title: String,
    pub poster: String,
    pub score: Score,
    pub japanese: String,
    pub synonyms: String,
    pub english: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub duration: String,
    pub episodes: Option<u32>,
    pub season: String,
    pub studios: String,
    pub producers: String,
    pub aired: String,
    pub trailer: String,
    pub synopsis: Synopsis,
    pub genre_list: Vec<Genre>,
    pub episode_list: Vec<EpisodeLink>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub title: String,
    pub url: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Quality {
    pub title: String,
    pub urls: Vec<DownloadLink>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DownloadFormat {
    pub title: String,
    pub qualities: Vec<Quality>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDetail {
    pub title: String,
    pub navigation: Navigation,
    pub downloads: Vec<DownloadFormat>,
}

/// Collapses a download heading like `Download MKV 480p` to its container format.
fn download_format(heading: &str) -> String {
    let lower = heading.to_lowercase();

    if lower.contains("mkv") {
        "MKV".into()
    } else if lower.contains("mp4") {
        "MP4".into()
    } else if lower.contains("x265") {
        "x265".into()
    } else if heading.is_empty() {
        "Unknown".into()
    } else {
        heading.into()
    }
}

impl Engine {
    fn page_title(&self, doc: &Document) -> Option<String> {
        doc.find(&self.schema.detail_title)
            .map(|node| node.clean_text())
            .filter(|title| !title.is_empty())
    }

    /// A title's detail page. `None` when the page has no title.
    pub fn detail(&self, doc: &Document, ctx: &Context<'_>) -> Option<AnimeDetail> {
        let schema = &self.schema;
        let title = self.page_title(doc)?;
        let root = doc.root();
        let mut info = parse_info(doc.select(&schema.detail_info));
        let mut field = |key: &str| info.remove(key);

        let poster = doc
            .find(&schema.detail_poster)
            .map(|node| self.entities.poster(node, ctx))
            .unwrap_or_else(|| PLACEHOLDER_POSTER.into());

        let score = Score {
            value: field("score")
                .or_else(|| {
                    doc.find(&schema.rating_value)
                        .map(|node| node.clean_text())
                        .filter(|value| !value.is_empty())
                })
                .unwrap_or_else(|| DEFAULT_SCORE.into()),
            users: doc
                .find(&schema.rating_count)
                .map(|node| node.clean_text())
                .filter(|count| !count.is_empty())
                .map(|count| format!("{count} users"))
                .unwrap_or_else(|| "N/A".into()),
        };

        let genre_root = doc.find(&schema.detail_genres).unwrap_or(root);
        let genre_list = assemble(
            "detail genres",
            self.entities.genres(genre_root, ctx),
            Some,
        );

        let episode_list = assemble(
            "episode list",
            doc.select(&schema.episode_item),
            |node| self.episode_link(node, ctx),
        );

        let trailer = doc
            .find(&schema.trailer)
            .and_then(|node| node.attr("src").or_else(|| node.attr("data-src")))
            .map(|src| src.trim().to_owned())
            .unwrap_or_default();

        let paragraphs = doc
            .select(&schema.synopsis)
            .map(|p| p.clean_text())
            .filter(|p| !p.is_empty())
            .collect();

        let episodes = field("episodes").and_then(|v| TextPattern::Number.find(&v)?.parse().ok());
        let mut text = |key: &str, default: &str| field(key).unwrap_or_else(|| default.into());

        Some(AnimeDetail {
            title,
            poster,
            score,
            japanese: text("japanese", NO_VALUE),
            synonyms: text("synonyms", NO_VALUE),
            english: text("english", NO_VALUE),
            status: text("status", DEFAULT_STATUS),
            kind: text("type", DEFAULT_KIND),
            source: text("source", NO_VALUE),
            duration: text("duration", NO_VALUE),
            episodes,
            season: text("season", NO_VALUE),
            studios: text("studios", NO_VALUE),
            producers: text("producers", NO_VALUE),
            aired: text("aired", NO_VALUE),
            trailer,
            synopsis: Synopsis { paragraphs },
            genre_list,
            episode_list,
        })
    }

    fn episode_link(&self, node: Node<'_>, ctx: &Context<'_>) -> Option<EpisodeLink> {
        let schema = &self.schema;
        let link = node.find_inclusive(&schema.anchor)?;
        let url = ctx.resolve(link.attr("href")?)?;
        let episode_id = identity(&url);

        let title = node
            .find(&schema.episode_item_title)
            .map(|n| n.clean_text())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| link.clean_text());

        let number = node
            .find(&schema.episode_item_number)
            .and_then(|n| TextPattern::Number.find(&n.clean_text()))
            .or_else(|| TextPattern::Episode.find(&title))
            .or_else(|| TextPattern::Number.find(&title))
            .and_then(|n| n.parse().ok());

        Some(EpisodeLink {
            title,
            number,
            href: ctx.route("episode", &episode_id),
            source_url: url.into(),
            episode_id,
        })
    }

    /// An episode page: navigation and download links.
    ///
    /// `None` when the page has no title.
    pub fn episode(&self, doc: &Document, ctx: &Context<'_>) -> Option<EpisodeDetail> {
        let schema = &self.schema;
        let title = self.page_title(doc)?;

        let nav = |selector: &CssSelector| {
            let href = doc.find(selector)?.find_inclusive(&schema.anchor)?.attr("href")?;

            if href.contains("/anime/") {
                return None;
            }

            let id = identity(&ctx.resolve(href)?);

            (!id.is_empty()).then(|| ctx.route("episode", &id))
        };

        let navigation = Navigation {
            prev: nav(&schema.nav_prev),
            next: nav(&schema.nav_next),
        };

        let downloads = doc
            .select(&schema.downloads)
            .filter_map(|list| self.download_format(list, ctx))
            .collect();

        Some(EpisodeDetail {
            title,
            navigation,
            downloads,
        })
    }

    fn download_format(&self, list: Node<'_>, ctx: &Context<'_>) -> Option<DownloadFormat> {
        let schema = &self.schema;
        let heading = list
            .prev_sibling()
            .map(|node| node.clean_text())
            .unwrap_or_default();

        let qualities = list
            .children()
            .filter(|item| item.tag() == "li")
            .filter_map(|item| {
                let urls = item
                    .select(&schema.anchor)
                    .filter_map(|a| {
                        Some(DownloadLink {
                            title: a.clean_text(),
                            url: ctx.resolve(a.attr("href")?)?.into(),
                        })
                    })
                    .collect::<Vec<_>>();

                if urls.is_empty() {
                    return None;
                }

                let title = item
                    .find(&schema.quality_label)
                    .map(|n| n.clean_text())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Unknown".into());

                Some(Quality { title, urls })
            })
            .collect::<Vec<_>>();

        (!qualities.is_empty()).then(|| DownloadFormat {
            title: download_format(&heading),
            qualities,
        })
    }
}
