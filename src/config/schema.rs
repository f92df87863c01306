use serde::Deserialize;

use crate::selector::CssSelector;

/// Site schema: every selector the engine consults to find things on a page.
///
/// The defaults describe the reference catalogue site; a config file may override any of them.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Schema {
    /// Cards on catalogue listing pages.
    pub list_item: CssSelector,
    /// Cards in the "top 10" widget on the home page.
    pub top_item: CssSelector,
    /// A link to a title's detail page. Its presence marks a node as a candidate entity.
    pub item_link: CssSelector,
    pub anchor: CssSelector,
    pub genre_link: CssSelector,
    pub image: CssSelector,

    pub title: CssSelector,
    pub score: CssSelector,
    #[serde(rename = "type")]
    pub kind: CssSelector,
    pub status: CssSelector,
    pub episode: CssSelector,
    pub date: CssSelector,
    pub release_time: CssSelector,
    /// Hidden hover cards that repeat score and type as `Key: Value` text.
    pub tooltip: CssSelector,

    pub schedule_root: CssSelector,
    pub schedule_item: CssSelector,

    pub pagination: CssSelector,
    pub page_number: CssSelector,
    pub next_page: CssSelector,
    pub prev_page: CssSelector,

    pub detail_title: CssSelector,
    pub detail_poster: CssSelector,
    pub detail_info: CssSelector,
    pub rating_value: CssSelector,
    pub rating_count: CssSelector,
    pub synopsis: CssSelector,
    pub detail_genres: CssSelector,
    pub trailer: CssSelector,
    pub episode_item: CssSelector,
    pub episode_item_title: CssSelector,
    pub episode_item_number: CssSelector,

    pub downloads: CssSelector,
    pub quality_label: CssSelector,
    pub nav_prev: CssSelector,
    pub nav_next: CssSelector,
}

impl Default for Schema {
    fn default() -> Self {
        let sel = CssSelector::builtin;

        Schema {
            list_item: sel(".post-show li, .animepost"),
            top_item: sel(".widget_senction.popular .serieslist li, .serieslist.pop li"),
            item_link: sel(r#"a[href*="/anime/"]"#),
            anchor: sel("a[href]"),
            genre_link: sel(r#"a[href*="/genre/"]"#),
            image: sel("img"),

            title: sel(".title"),
            score: sel(".score"),
            kind: sel(".type"),
            status: sel(".status"),
            episode: sel(".episode, .eps, .dtla"),
            date: sel(".date, .year, time"),
            release_time: sel(".time, .btime"),
            tooltip: sel(".ttls, .tooltip, .stooltip"),

            schedule_root: sel(".entry-content, main"),
            schedule_item: sel(".animepost, li"),

            pagination: sel(".pagination"),
            page_number: sel(".page-numbers, a"),
            next_page: sel(r#".next, a[rel="next"]"#),
            prev_page: sel(r#".prev, a[rel="prev"]"#),

            detail_title: sel("h1.entry-title"),
            detail_poster: sel(".thumb, article"),
            detail_info: sel(".infox .spe span"),
            rating_value: sel(r#".ratingValue, [itemprop="ratingValue"]"#),
            rating_count: sel(r#"[itemprop="ratingCount"]"#),
            synopsis: sel(".desc p, .entry-content p"),
            detail_genres: sel(".genre-info"),
            trailer: sel(".trailer-anime iframe"),
            episode_item: sel(".lstepsiode li, .eplister li"),
            episode_item_title: sel(".epl-title"),
            episode_item_number: sel(".epl-num"),

            downloads: sel(".download-eps ul, #server ul"),
            quality_label: sel("strong, b"),
            nav_prev: sel(".prev"),
            nav_next: sel(".next"),
        }
    }
}
