mod responses;
mod routes;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, TraceLayer};
use tracing::{info, Level};

use crate::state::State;

/// Builds the API router, mounted under the configured route prefix.
pub fn router(state: State) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/", get(routes::index))
        .route("/home", get(routes::home))
        .route("/schedule", get(routes::schedule))
        .route("/latest", get(routes::latest))
        .route("/ongoing", get(routes::ongoing))
        .route("/completed", get(routes::completed))
        .route("/popular", get(routes::popular))
        .route("/batch", get(routes::batch))
        .route("/movies", get(routes::movies))
        .route("/search", get(routes::search))
        .route("/genres", get(routes::genres))
        .route("/genres/:id", get(routes::genre))
        .route("/anime/:id", get(routes::anime))
        .route("/episode/:id", get(routes::episode));

    let prefix = state.cfg.route_prefix.clone();
    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    app.layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO)),
        ),
    )
    .with_state(state)
}

pub struct Server {
    socket: TcpListener,
    app: Router,
}

impl Server {
    pub async fn new(state: State) -> Result<Self> {
        let bind_addr = &state.cfg.bind_addr;
        let socket = TcpListener::bind(bind_addr)
            .await
            .with_context(|| anyhow!("could not bind to `{bind_addr}`"))?;

        info!(
            "Listening on {} under `{}`",
            bind_addr,
            if state.cfg.route_prefix.is_empty() {
                "/"
            } else {
                state.cfg.route_prefix.as_str()
            }
        );

        let app = router(state);

        Ok(Self { socket, app })
    }

    pub async fn serve(self, cancel: CancellationToken) -> Result<()> {
        axum::serve(self.socket, self.app)
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await
            .context("the HTTP server encountered a failure")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bytes::Bytes;
    use reqwest::Url;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::fetch::{DocumentFetcher, FetchError, Fetched};

    struct StubFetcher {
        pages: HashMap<&'static str, &'static str>,
    }

    #[async_trait]
    impl DocumentFetcher for StubFetcher {
        async fn fetch(&self, target: &str) -> Result<Fetched, FetchError> {
            let url = Url::parse("https://site.example/").unwrap().join(target).unwrap();

            match self.pages.get(target) {
                Some(body) => Ok(Fetched {
                    url,
                    body: Bytes::from_static(body.as_bytes()),
                }),

                None => Err(FetchError::Blocked { url }),
            }
        }
    }

    fn app(prefix: &str, pages: &[(&'static str, &'static str)]) -> Router {
        let cfg = Config {
            route_prefix: prefix.into(),
            ..Default::default()
        };
        let fetcher = Arc::new(StubFetcher {
            pages: pages.iter().copied().collect(),
        });

        router(State::with_fetcher(cfg, fetcher))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    const LISTING: &str = r#"
        <div class="post-show"><ul>
          <li><a href="https://site.example/anime/kusuriya/" title="Kusuriya no Hitorigoto"></a>
            <span class="episode">Episode 24</span><span class="date">1 hari yang lalu</span></li>
          <li><a href="https://site.example/anime/frieren/" title="Sousou no Frieren"></a></li>
        </ul></div>
        <div class="pagination">
          <span class="page-numbers current">1</span>
          <a class="page-numbers" href="/anime-terbaru/page/2/">2</a>
          <a class="next page-numbers" href="/anime-terbaru/page/2/">Next</a>
        </div>
    "#;

    #[tokio::test]
    async fn latest_listing() {
        let (status, json) = get(
            app("/anime/samehadaku", &[("/anime-terbaru/", LISTING)]),
            "/anime/samehadaku/latest",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");

        let list = json["data"]["animeList"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["animeId"], "kusuriya");
        assert_eq!(list[0]["episodes"], "24");
        assert_eq!(list[0]["releasedOn"], "1 hari yang lalu");
        assert_eq!(list[0]["href"], "/anime/samehadaku/anime/kusuriya");
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["pagination"]["hasNextPage"], true);
    }

    #[tokio::test]
    async fn upstream_failure_is_not_an_empty_list() {
        let pages = [("/daftar-batch/", "<main><p>Belum ada batch</p></main>")];

        let (status, json) = get(app("", &pages), "/batch").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["animeList"], serde_json::json!([]));
        assert_eq!(json["pagination"], Value::Null);

        let (status, json) = get(app("", &pages), "/batch?page=2").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["status"], "failed");
    }

    #[tokio::test]
    async fn malformed_page_falls_back_to_the_first() {
        let pages = [("/anime-terbaru/", LISTING), ("/?s=frieren", LISTING)];

        let (status, json) = get(app("", &pages), "/latest?page=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["pagination"]["currentPage"], 1);

        let (status, json) = get(app("", &pages), "/search?query=frieren&page=x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["animeList"][0]["animeId"], "kusuriya");
    }

    #[tokio::test]
    async fn empty_upstream_body_is_a_failure() {
        let (status, json) = get(app("", &[("/jadwal-rilis/", "  ")]), "/schedule").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["status"], "failed");
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let pages = [("/?s=one%20piece", LISTING)];

        let (status, _) = get(app("", &pages), "/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = get(app("", &pages), "/search?query=one%20piece").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["animeList"][1]["status"], "Search");
    }

    #[tokio::test]
    async fn missing_detail_is_not_found() {
        let pages = [("/anime/gone/", "<main><h2>Halaman tidak ditemukan</h2></main>")];

        let (status, json) = get(app("", &pages), "/anime/gone").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "failed");
    }

    #[tokio::test]
    async fn schedule_always_has_seven_days() {
        let pages = [(
            "/jadwal-rilis/",
            r#"<div class="entry-content"><h3>Senin</h3>
               <ul><li><a href="/anime/a/">Alpha</a></li></ul></div>"#,
        )];

        let (status, json) = get(app("/api", &pages), "/api/schedule").await;
        let days = json["data"]["days"].as_array().unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0]["animeList"][0]["animeId"], "a");
        assert_eq!(days[0]["animeList"][0]["estimation"], "Update");
        assert_eq!(days[1]["animeList"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn index_without_prefix() {
        let (status, json) = get(app("", &[]), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["message"].is_string());
    }
}
