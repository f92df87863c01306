use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::extractor::Engine;
use crate::fetch::{DocumentFetcher, HttpFetcher};

#[derive(Clone)]
pub struct State {
    pub cfg: Arc<Config>,
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub engine: Arc<Engine>,
}

impl State {
    pub fn new(cfg: Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&cfg.upstream, cfg.cache_dir.clone())?);

        Ok(Self::with_fetcher(cfg, fetcher))
    }

    pub fn with_fetcher(cfg: Config, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        let engine = Arc::new(Engine::from_schema(&cfg.schema));

        State {
            cfg: Arc::new(cfg),
            fetcher,
            engine,
        }
    }
}
