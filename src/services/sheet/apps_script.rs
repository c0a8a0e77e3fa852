use anyhow::Context;
use async_trait::async_trait;

use super::{SheetClient, SheetEnvelope, SheetQuery, SheetWrite};

/// Talks to the deployed spreadsheet web app over plain HTTP.
pub struct AppsScriptClient {
    url: String,
    client: reqwest::Client,
}

impl AppsScriptClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SheetClient for AppsScriptClient {
    async fn write(&self, write: &SheetWrite) -> anyhow::Result<()> {
        let method = write.method();
        tracing::debug!(method, "posting sheet write");

        self.client
            .post(&self.url)
            .form(&write.to_form())
            .send()
            .await
            .with_context(|| format!("failed to send sheet {method}"))?
            .error_for_status()
            .with_context(|| format!("sheet script rejected {method}"))?;

        Ok(())
    }

    async fn read(&self, query: &SheetQuery) -> anyhow::Result<SheetEnvelope> {
        let resp = self
            .client
            .get(&self.url)
            .query(&query.to_query())
            .send()
            .await
            .context("failed to query sheet script")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("sheet script returned {status}");
        }

        let envelope: SheetEnvelope = resp
            .json()
            .await
            .context("failed to parse sheet response")?;

        if let Some(err) = &envelope.error {
            tracing::warn!(error = %err, "sheet script reported an error");
        }

        Ok(envelope)
    }
}
