//! Collaborator interfaces: the bulk read endpoint and the incident upload endpoint.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use self::http::HttpSource;

/// The three raw collections, each defaulting to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkPayload {
    #[serde(default, deserialize_with = "features")]
    pub municipalities: Vec<Value>,
    #[serde(default, deserialize_with = "features")]
    pub incidents: Vec<Value>,
    #[serde(default, deserialize_with = "features")]
    pub parks: Vec<Value>,
}

impl BulkPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Source: Payload is not valid dashboard JSON")
    }
}

/// A collection may arrive as a bare array or wrapped in a FeatureCollection.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCollection {
    Features(Vec<Value>),
    Collection {
        #[serde(default)]
        features: Option<Vec<Value>>,
    },
}

fn features<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawCollection>::deserialize(deserializer)? {
        Some(RawCollection::Features(features)) => features,
        Some(RawCollection::Collection { features }) => features.unwrap_or_default(),
        None => Vec::new(),
    })
}

pub trait DataSource {
    fn fetch(&self) -> Result<BulkPayload>;
    fn describe(&self) -> String;
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<BulkPayload> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Source: Failed to read {:?}", self.path))?;
        BulkPayload::from_slice(&bytes)
    }

    fn describe(&self) -> String {
        format!("{}", self.path.display())
    }
}

/// What the backend answers to an incident upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadReport {
    pub success: bool,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub duplicates: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub message: Option<String>,
}

pub trait IncidentUploader {
    fn upload(&self, path: &Path) -> Result<UploadReport>;
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read upload file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse JSON file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid GeoJSON format: expected a FeatureCollection with a features array")]
    NotFeatureCollection,
}

/// Local check of an upload before it is sent. Returns the number of features.
pub fn validate_upload(path: &Path) -> Result<usize, UploadError> {
    let bytes = std::fs::read(path)?;
    let document: Value = serde_json::from_slice(&bytes)?;

    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(UploadError::NotFeatureCollection);
    }
    document
        .get("features")
        .and_then(Value::as_array)
        .map(Vec::len)
        .ok_or(UploadError::NotFeatureCollection)
}
