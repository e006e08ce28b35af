use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use central_fetch::Coordinate;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::Client;

/// Fetch artifact files by coordinate.
///
/// A single coordinate is written to `--output`, or to stdout when neither
/// `--output` nor `--dir` is given. Several coordinates are fetched
/// concurrently into `--dir` (default: the current directory).
#[derive(Debug, clap::Args)]
pub struct Download {
    /// `group:artifact:version[:classifier][@extension]`
    #[arg(required = true, value_name = "COORDINATE")]
    pub coordinates: Vec<String>,

    #[arg(short, long, value_name = "PATH", conflicts_with = "dir")]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

impl Download {
    fn parse_coordinates(&self) -> anyhow::Result<Vec<Coordinate>> {
        self.coordinates
            .iter()
            .map(|raw| raw.parse().with_context(|| format!("bad coordinate `{raw}`")))
            .collect()
    }

    pub async fn run(self, client: &Client, cancel: &CancellationToken) -> anyhow::Result<()> {
        let coordinates = self.parse_coordinates()?;

        if let [coordinate] = coordinates.as_slice()
            && self.dir.is_none()
        {
            let bytes = client.download(coordinate, cancel).await?;
            match &self.output {
                Some(path) => write_file(path, &bytes)?,
                None => {
                    let mut out = io::stdout().lock();
                    out.write_all(&bytes)?;
                    out.flush()?;
                }
            }
            return Ok(());
        }

        if self.output.is_some() {
            bail!("--output takes a single coordinate; use --dir for several");
        }
        let dir = self.dir.unwrap_or_else(|| PathBuf::from("."));

        let keyed = coordinates.iter().cloned().map(|c| (c.clone(), c));
        let mut results = client.download_batch(keyed, cancel).await;

        let mut failed = 0usize;
        for coordinate in &coordinates {
            let Some(result) = results.remove(coordinate) else {
                continue;
            };
            match result {
                Ok(bytes) => {
                    let path = dir.join(coordinate.file_name());
                    write_file(&path, &bytes)?;
                    info!(%coordinate, path = %path.display(), bytes = bytes.len(), "saved");
                }
                Err(e) => {
                    error!(%coordinate, error = %e, "download failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {} downloads failed", coordinates.len());
        }
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
