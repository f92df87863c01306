use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::extractor::{
    AnimeDetail, Context, Engine, EntityRecord, EpisodeDetail, Genre, ListKind, RankedEntity,
    ScheduleGroup,
};
use crate::state::State as AppState;

use super::responses::{ApiError, Envelope};

type ApiResult<T> = Result<Envelope<T>, ApiError>;

/// Reads a page number from its leading digits, like `"3"` or `"3abc"`.
/// Anything without a leading number, or below 1, is the first page.
fn page_number(raw: Option<&str>) -> u32 {
    let raw = raw.unwrap_or_default().trim();
    let digits = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());

    raw[..digits].parse::<u32>().unwrap_or(1).max(1)
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        page_number(self.page.as_deref())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SearchQuery {
    query: Option<String>,
    s: Option<String>,
    page: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnimeList {
    anime_list: Vec<EntityRecord>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenreList {
    genre_list: Vec<Genre>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Section<T> {
    href: String,
    anime_list: Vec<T>,
}

#[derive(Serialize, Debug)]
pub struct HomeData {
    recent: Section<EntityRecord>,
    top10: Section<RankedEntity>,
}

#[derive(Serialize, Debug)]
pub struct Message {
    message: &'static str,
}

/// Upstream path for page `page` of a paginated listing rooted at `path`.
fn paged(path: &str, page: u32) -> String {
    if page > 1 {
        format!("{path}page/{page}/")
    } else {
        path.into()
    }
}

/// Fetches and parses `target`, then runs `task` on the document.
///
/// The document never lives across an await point.
async fn scrape<T, F>(state: &AppState, target: &str, task: F) -> Result<T, ApiError>
where
    F: FnOnce(&Engine, &Document, &Context<'_>) -> T,
{
    let fetched = state.fetcher.fetch(target).await?;
    let doc = Document::parse(&fetched.body)?;
    let ctx = Context::new(&fetched.url, &state.cfg.route_prefix);

    debug!("Extracting data from {}", fetched.url);

    Ok(task(&state.engine, &doc, &ctx))
}

async fn listing(state: &AppState, kind: ListKind, page: u32, target: &str) -> ApiResult<AnimeList> {
    let page = scrape(state, target, |engine, doc, ctx| {
        engine.listing(doc, ctx, kind, page)
    })
    .await?;

    Ok(Envelope::paginated(page, |anime_list| AnimeList {
        anime_list,
    }))
}

pub async fn index() -> Json<Message> {
    Json(Message {
        message: "animedex is running",
    })
}

pub async fn home(State(state): State<AppState>) -> ApiResult<HomeData> {
    let home = scrape(&state, "/", |engine, doc, ctx| engine.home(doc, ctx)).await?;
    let prefix = &state.cfg.route_prefix;

    Ok(Envelope::new(HomeData {
        recent: Section {
            href: format!("{prefix}/latest"),
            anime_list: home.recent,
        },
        top10: Section {
            href: format!("{prefix}/popular"),
            anime_list: home.top10,
        },
    }))
}

pub async fn schedule(State(state): State<AppState>) -> ApiResult<ScheduleGroup> {
    let group = scrape(&state, "/jadwal-rilis/", |engine, doc, ctx| {
        engine.schedule(doc, ctx)
    })
    .await?;

    Ok(Envelope::new(group))
}

pub async fn latest(State(state): State<AppState>, Query(q): Query<PageQuery>) -> ApiResult<AnimeList> {
    let target = paged("/anime-terbaru/", q.page());

    listing(&state, ListKind::Latest, q.page(), &target).await
}

pub async fn ongoing(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<AnimeList> {
    let target = format!(
        "{}?status=Currently+Airing&order=update",
        paged("/daftar-anime-2/", q.page())
    );

    listing(&state, ListKind::Ongoing, q.page(), &target).await
}

pub async fn completed(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<AnimeList> {
    let target = format!(
        "{}?status=Finished+Airing&order=latest",
        paged("/daftar-anime-2/", q.page())
    );

    listing(&state, ListKind::Completed, q.page(), &target).await
}

pub async fn popular(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<AnimeList> {
    let target = format!("{}?order=popular", paged("/daftar-anime-2/", q.page()));

    listing(&state, ListKind::Popular, q.page(), &target).await
}

pub async fn batch(State(state): State<AppState>, Query(q): Query<PageQuery>) -> ApiResult<AnimeList> {
    let target = paged("/daftar-batch/", q.page());

    listing(&state, ListKind::Batch, q.page(), &target).await
}

pub async fn movies(State(state): State<AppState>, Query(q): Query<PageQuery>) -> ApiResult<AnimeList> {
    let target = paged("/anime-movie/", q.page());

    listing(&state, ListKind::Movie, q.page(), &target).await
}

pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<AnimeList> {
    let query = q
        .query
        .or(q.s)
        .map(|query| query.trim().to_owned())
        .filter(|query| !query.is_empty())
        .ok_or_else(|| ApiError::BadRequest("the `query` parameter is required".into()))?;
    let page = page_number(q.page.as_deref());
    let target = format!("{}?s={}", paged("/", page), urlencoding::encode(&query));

    listing(&state, ListKind::Search, page, &target).await
}

pub async fn genres(State(state): State<AppState>) -> ApiResult<GenreList> {
    let genre_list = scrape(&state, "/", |engine, doc, ctx| engine.genres(doc, ctx)).await?;

    Ok(Envelope::new(GenreList { genre_list }))
}

pub async fn genre(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<PageQuery>,
) -> ApiResult<AnimeList> {
    let target = paged(&format!("/genre/{}/", urlencoding::encode(&id)), q.page());

    listing(&state, ListKind::Genre, q.page(), &target).await
}

pub async fn anime(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<AnimeDetail> {
    let target = format!("/anime/{}/", urlencoding::encode(&id));

    scrape(&state, &target, |engine, doc, ctx| engine.detail(doc, ctx))
        .await?
        .map(Envelope::new)
        .ok_or_else(|| ApiError::NotFound(format!("no anime found with the id `{id}`")))
}

pub async fn episode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EpisodeDetail> {
    let target = format!("/{}/", urlencoding::encode(&id));

    scrape(&state, &target, |engine, doc, ctx| engine.episode(doc, ctx))
        .await?
        .map(Envelope::new)
        .ok_or_else(|| ApiError::NotFound(format!("no episode found with the id `{id}`")))
}
