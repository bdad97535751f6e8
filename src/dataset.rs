//! Dataset loading - file text through ingestion and normalization
//!
//! The only place a data file is read. Everything after the read is a pure
//! transform of the text.

use serde::Serialize;
use std::path::Path;

use crate::ingest::{self, IngestError, MalformedRows, RowIssue};
use crate::normalize::{self, Bounds, NormalizedPoint};

/// A fully normalized point set, ready to render
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub points: Vec<NormalizedPoint>,
    pub issues: Vec<RowIssue>,
    pub bounds: Option<Bounds>,
}

impl Dataset {
    pub fn from_text(text: &str, policy: MalformedRows) -> Result<Self, IngestError> {
        let parsed = ingest::parse_records(text, policy)?;
        let (points, bounds) = normalize::normalize(parsed.records);
        Ok(Dataset {
            points,
            issues: parsed.issues,
            bounds,
        })
    }

    pub fn from_path(path: &Path, policy: MalformedRows) -> Result<Self, IngestError> {
        tracing::info!("Loading dataset from {:?}", path);
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Read {} bytes", bytes.len());

        // Invalid UTF-8 becomes U+FFFD instead of failing the load
        let text = String::from_utf8_lossy(&bytes);
        if matches!(text, std::borrow::Cow::Owned(_)) {
            tracing::warn!("{:?} is not valid UTF-8, replaced undecodable bytes", path);
        }

        let dataset = Self::from_text(&text, policy)?;
        tracing::info!(
            "Loaded {} points ({} rows rejected) from {:?}",
            dataset.points.len(),
            dataset.issues.len(),
            path
        );
        Ok(dataset)
    }
}
