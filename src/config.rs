mod schema;
mod types;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use take_mut::take;
use tracing::{debug, info};

pub use self::schema::Schema;
pub use self::types::*;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Config {
    pub bind_addr: String,
    pub cache_dir: Option<PathBuf>,
    /// Path under which the API routes are mounted. Also used for the `href` fields in responses.
    pub route_prefix: String,
    pub upstream: Upstream,
    pub schema: Schema,
}

impl Config {
    pub fn update(&mut self, args: crate::cli::Args) {
        fn set_if_some<T>(dst: &mut T, v: Option<T>) {
            if let Some(v) = v {
                *dst = v;
            }
        }

        set_if_some(&mut self.bind_addr, args.bind_addr);
        set_if_some(&mut self.cache_dir, args.cache_dir.map(Some));
        set_if_some(&mut self.route_prefix, args.route_prefix);
    }

    pub fn resolve_relative_paths(&mut self, config_dir: impl AsRef<Path>) {
        let config_dir = config_dir.as_ref();

        // do the dance for safety (so that I don't forget to update this after adding new fields).
        take(self, |this| Self {
            bind_addr: this.bind_addr,
            cache_dir: this.cache_dir.map(|cache_dir| config_dir.join(cache_dir)),
            route_prefix: this.route_prefix,
            upstream: this.upstream,
            schema: this.schema,
        })
    }

    /// Normalizes the route prefix and checks the upstream settings.
    pub fn validate(&mut self) -> Result<()> {
        let prefix = self.route_prefix.trim().trim_end_matches('/').to_owned();

        if !prefix.is_empty() && !prefix.starts_with('/') {
            bail!("the route prefix `{}` must start with `/`", self.route_prefix);
        }

        self.route_prefix = prefix;
        self.upstream.base_urls()?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:3000".into(),
            cache_dir: None,
            route_prefix: "/anime/samehadaku".into(),
            upstream: Default::default(),
            schema: Default::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Upstream {
    /// Origins tried in order for site-relative paths.
    pub bases: Vec<String>,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
}

impl Upstream {
    pub fn base_urls(&self) -> Result<Vec<Url>> {
        if self.bases.is_empty() {
            bail!("at least one upstream base URL is required");
        }

        self.bases
            .iter()
            .map(|base| {
                Url::parse(base).with_context(|| anyhow!("invalid upstream base URL `{base}`"))
            })
            .collect()
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Upstream {
            bases: vec![
                "https://v1.samehadaku.how".into(),
                "https://samehadaku.how".into(),
                "https://www.samehadaku.how".into(),
            ],
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .into(),
            accept_language: "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7".into(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 5,
        }
    }
}

pub fn load(search_paths: &[PathBuf]) -> Result<Config> {
    for path in search_paths {
        debug!("Trying to load {}", path.display());
        let mut contents = String::new();

        {
            let mut f = match File::open(path) {
                Ok(f) => f,

                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(file = %path.display(), "File not found, skipping");
                    continue;
                }

                Err(e) => {
                    return Err(e)
                        .context(anyhow!("could not load a config file `{}`", path.display()));
                }
            };

            f.read_to_string(&mut contents).with_context(|| {
                anyhow!(
                    "could not read the contents of a config file `{}`",
                    path.display()
                )
            })?;
        }

        let mut cfg: Config = toml::from_str(&contents)
            .with_context(|| anyhow!("could not load the config file `{}`", path.display()))?;

        if let Some(parent) = path.parent() {
            cfg.resolve_relative_paths(parent);
        }

        info!("Loaded a config file `{}`", path.display());

        return Ok(cfg);
    }

    info!("Using the default config");

    Ok(Default::default())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(&[dir.path().join("missing.toml")]).unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:3000");
        assert_eq!(cfg.upstream.bases.len(), 3);
        assert_eq!(cfg.upstream.timeout, Duration::from_secs(15));
    }

    #[test]
    fn loads_the_first_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animedex.toml");
        fs::write(
            &path,
            r#"
            bind-addr = "0.0.0.0:8080"
            cache-dir = "cache"
            route-prefix = "/api/"

            [upstream]
            bases = ["https://mirror.example"]
            timeout = "30s"

            [schema]
            list-item = "article.bs"
            "#,
        )
        .unwrap();

        let mut cfg = load(&[dir.path().join("nope.toml"), path]).unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.cache_dir, Some(dir.path().join("cache")));
        assert_eq!(cfg.route_prefix, "/api");
        assert_eq!(cfg.upstream.timeout, Duration::from_secs(30));
        assert_eq!(cfg.upstream.max_redirects, 5);
        assert_eq!(cfg.schema.list_item.as_str(), "article.bs");
        assert_eq!(cfg.schema.title.as_str(), ".title");
    }

    #[test]
    fn malformed_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animedex.toml");
        fs::write(&path, "bind-adr = 1").unwrap();

        assert!(load(&[path]).is_err());
    }

    #[test]
    fn validation() {
        let mut cfg = Config {
            route_prefix: "api".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.upstream.bases = vec!["not a url".into()];
        assert!(cfg.validate().is_err());

        let mut cfg = Config {
            route_prefix: "/".into(),
            ..Default::default()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.route_prefix, "");
    }
}
