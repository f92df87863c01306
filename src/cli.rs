use clap::ValueHint;

use std::path::PathBuf;

#[derive(clap::Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Path to the config file.
    ///
    /// By default, animedex looks for a file named `animedex.toml` in the following directories
    /// (in order):
    ///
    /// - `./` (the current directory)
    /// - `/etc`
    #[arg(
        short,
        env = "ANIMEDEX_CONFIG",
        value_hint(ValueHint::FilePath)
    )]
    pub config_path: Option<PathBuf>,

    /// API server address to bind to.
    #[arg(long, env = "ANIMEDEX_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Path to the HTTP cache directory. Responses are cached in memory if unset.
    #[arg(long, env = "ANIMEDEX_CACHE_DIR", value_hint(ValueHint::DirPath))]
    pub cache_dir: Option<PathBuf>,

    /// Path prefix all routes are mounted under, e.g. `/anime/samehadaku`.
    #[arg(long, env = "ANIMEDEX_ROUTE_PREFIX")]
    pub route_prefix: Option<String>,
}

impl Args {
    pub fn parse() -> Self {
        clap::Parser::parse()
    }
}
