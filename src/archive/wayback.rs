use crate::archive::{ArchiveError, Archiver};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Requests a Wayback Machine snapshot of every processed page
#[derive(Debug, Clone)]
pub struct WaybackArchiver {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl WaybackArchiver {
    pub fn new(client: Client, endpoint: &str, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    /// Save URL for a page: the endpoint with the page URL appended
    pub fn save_url(&self, url: &str) -> String {
        format!("{}{}", self.endpoint, url)
    }
}

#[async_trait]
impl Archiver for WaybackArchiver {
    fn name(&self) -> &str {
        "wayback"
    }

    async fn archive(&self, url: &str, _body: &str) -> Result<(), ArchiveError> {
        let save_url = self.save_url(url);
        let response = self
            .client
            .get(&save_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| ArchiveError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        // The save endpoint answers with a redirect to the snapshot
        if !(status.is_success() || status.is_redirection()) {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!("Requested Wayback snapshot of {}", url);
        Ok(())
    }
}
