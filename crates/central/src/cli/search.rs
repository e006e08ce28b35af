use std::io::{self, Write};

use central_fetch::{ArtifactDoc, DEFAULT_ROWS, FetchRequest, Sort};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Client, QueryArgs};

/// List matching artifacts, one per line.
#[derive(Debug, clap::Args)]
pub struct Search {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Page size requested from the server.
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub rows: u32,

    /// Stop after this many results.
    #[arg(long)]
    pub limit: Option<u64>,

    /// Collection to search, e.g. `gav` to list every version.
    #[arg(long)]
    pub core: Option<String>,

    #[arg(long, value_name = "FIELD")]
    pub sort: Option<String>,

    /// Sort descending instead of ascending.
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Print each hit as a JSON object.
    #[arg(long)]
    pub json: bool,
}

impl Search {
    fn request(&self) -> FetchRequest {
        let mut request = FetchRequest::new(self.query.to_query()).rows(self.rows);
        if let Some(core) = &self.core {
            request = request.core(core);
        }
        if let Some(field) = &self.sort {
            request = request.sort(if self.desc { Sort::desc(field) } else { Sort::asc(field) });
        }
        request
    }

    pub async fn run(self, client: &Client, cancel: &CancellationToken) -> anyhow::Result<()> {
        let mut hits = client.iterate::<ArtifactDoc>(self.request());
        let mut out = io::stdout().lock();
        let mut shown = 0u64;

        while self.limit.is_none_or(|limit| shown < limit) && hits.has_next(cancel).await? {
            let doc = hits.next(cancel).await?;
            if self.json {
                writeln!(out, "{}", serde_json::to_string(&doc)?)?;
            } else {
                writeln!(
                    out,
                    "{}:{}:{}\t{}",
                    doc.group,
                    doc.artifact,
                    doc.effective_version().unwrap_or("-"),
                    doc.packaging
                )?;
            }
            shown += 1;
        }
        out.flush()?;

        info!(
            shown,
            total = hits.total().unwrap_or(0),
            pages = hits.pages_fetched(),
            "search finished"
        );
        Ok(())
    }
}
