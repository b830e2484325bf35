use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::types::{AggregateStats, QueuePage};
use crate::error::Result;

/// Pull side of the admin API boundary.
///
/// The session only ever needs these two snapshots; everything else the
/// admin surface offers (queue/job/worker CRUD) is out of scope here.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn stats(&self) -> Result<AggregateStats>;
    async fn queues(&self, page: u64, per_page: u64) -> Result<QueuePage>;
}

pub struct AdminClient {
    client: Client,
    base_url: Url,
}

impl AdminClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn stats(&self) -> Result<AggregateStats> {
        let url = self.endpoint("/ojs/v1/admin/stats")?;
        let stats: AggregateStats = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(
            workers = stats.workers,
            queues = stats.queues,
            "Fetched aggregate stats"
        );
        Ok(stats)
    }

    async fn queues(&self, page: u64, per_page: u64) -> Result<QueuePage> {
        let mut url = self.endpoint("/ojs/v1/admin/queues")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        let listing: QueuePage = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(count = listing.items.len(), "Fetched queue listing");
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_against_base() {
        let client = AdminClient::new("https://queue.example.com").unwrap();
        let url = client.endpoint("/ojs/v1/admin/stats").unwrap();
        assert_eq!(url.as_str(), "https://queue.example.com/ojs/v1/admin/stats");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(AdminClient::new("not a url").is_err());
    }
}
