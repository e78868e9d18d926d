use anyhow::{Context, Result};
use reqwest::blocking::{Client, multipart};
use std::path::Path;
use std::time::Duration;

use super::{BulkPayload, DataSource, IncidentUploader, UploadReport};

/// Dashboard backend reached over HTTP.
pub struct HttpSource {
    client: Client,
    data_url: String,
    upload_url: Option<String>,
}

impl HttpSource {
    pub fn new(data_url: impl Into<String>, upload_url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hydromap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .context("Source: Failed to build HTTP client")?;

        Ok(Self {
            client,
            data_url: data_url.into(),
            upload_url,
        })
    }
}

impl DataSource for HttpSource {
    fn fetch(&self) -> Result<BulkPayload> {
        let bytes = self
            .client
            .get(&self.data_url)
            .send()
            .with_context(|| format!("GET {}", self.data_url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned error status", self.data_url))?
            .bytes()
            .with_context(|| format!("GET {}: failed to read body", self.data_url))?;

        BulkPayload::from_slice(&bytes)
    }

    fn describe(&self) -> String {
        self.data_url.clone()
    }
}

impl IncidentUploader for HttpSource {
    fn upload(&self, path: &Path) -> Result<UploadReport> {
        let url = self
            .upload_url
            .as_deref()
            .context("Source: No upload endpoint configured")?;

        let form = multipart::Form::new()
            .file("file", path)
            .with_context(|| format!("Source: Failed to attach {:?}", path))?;

        self.client
            .post(url)
            .multipart(form)
            .send()
            .with_context(|| format!("POST {url}"))?
            .json::<UploadReport>()
            .with_context(|| format!("POST {url}: response is not an upload report"))
    }
}
