use tokio_util::sync::CancellationToken;

use super::{Client, QueryArgs};

/// Print the number of matching documents.
#[derive(Debug, clap::Args)]
pub struct Count {
    #[command(flatten)]
    pub query: QueryArgs,
}

impl Count {
    pub async fn run(self, client: &Client, cancel: &CancellationToken) -> anyhow::Result<()> {
        let total = client.count(&self.query.to_query(), cancel).await?;
        println!("{total}");
        Ok(())
    }
}
