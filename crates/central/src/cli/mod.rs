mod count;
mod download;
mod search;

use std::path::PathBuf;

use central_fetch::{CatalogClient, Query, ReqwestClient};
use clap::{Parser, Subcommand};

pub use count::Count;
pub use download::Download;
pub use search::Search;

pub type Client = CatalogClient<ReqwestClient>;

#[derive(Debug, Parser)]
#[command(
    name = "central",
    version,
    about = "Search and download from a Maven Central style catalog"
)]
pub struct Cli {
    /// TOML file layered over the built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print cache and rate limiter statistics to stderr on exit.
    #[arg(long, global = true)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Search(Search),
    Count(Count),
    Download(Download),
}

/// Query selection shared by `search` and `count`.
#[derive(Debug, Clone, clap::Args)]
pub struct QueryArgs {
    /// Raw Solr expression; overrides the field flags.
    pub query: Option<String>,

    #[arg(short, long)]
    pub group: Option<String>,

    #[arg(short, long)]
    pub artifact: Option<String>,

    #[arg(short = 'v', long)]
    pub artifact_version: Option<String>,

    #[arg(short, long)]
    pub packaging: Option<String>,
}

impl QueryArgs {
    pub fn to_query(&self) -> Query {
        let fields = [
            ("g", &self.group),
            ("a", &self.artifact),
            ("v", &self.artifact_version),
            ("p", &self.packaging),
        ];
        fields
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key, v)))
            .fold(Query::new(), |q, (key, value)| q.field(key, value))
            .with_raw(self.query.clone())
    }
}
