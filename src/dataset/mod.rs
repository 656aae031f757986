//! Survey dataset loading.
//!
//! The dataset is read once at startup, normalized, and then shared as an
//! immutable [`Dataset`] handle by the aggregator and the tool executor.

pub mod normalizer;

pub use normalizer::{normalize, normalize_lenient};

use crate::error::InsightError;
use crate::models::{DatasetSource, NormalizedResponse, RawResponse};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Survey responses compiled into the binary.
const EMBEDDED_RESPONSES: &str = include_str!("../../data/responses.json");

/// Immutable, cheaply clonable view of the normalized survey records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[NormalizedResponse]>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Dataset {
    /// Wrap already-normalized records.
    pub fn new(records: Vec<NormalizedResponse>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[NormalizedResponse] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A dataset together with where it came from and what was rejected.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub source: DatasetSource,
    pub rejected: Vec<InsightError>,
}

/// Parse raw records from JSON text.
pub fn parse_raw(json: &str) -> Result<Vec<RawResponse>> {
    serde_json::from_str(json).context("Dataset is not a JSON array of survey responses")
}

/// Read raw records from a JSON file.
pub fn read_raw(path: &Path) -> Result<Vec<RawResponse>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    parse_raw(&content).with_context(|| format!("Failed to parse dataset: {}", path.display()))
}

/// Raw records of the embedded dataset.
pub fn embedded_raw() -> Result<Vec<RawResponse>> {
    parse_raw(EMBEDDED_RESPONSES)
}

/// Load and normalize the dataset.
///
/// With `skip_invalid` the invalid records are dropped and reported in
/// [`LoadedDataset::rejected`]; otherwise the first invalid record fails the
/// load.
pub fn load(path: Option<&Path>, skip_invalid: bool) -> Result<LoadedDataset> {
    let (raw, source) = match path {
        Some(path) => {
            info!("Loading dataset from: {}", path.display());
            (read_raw(path)?, DatasetSource::File(path.display().to_string()))
        }
        None => {
            debug!("Using embedded dataset");
            (embedded_raw()?, DatasetSource::Embedded)
        }
    };

    debug!("Read {} raw responses", raw.len());

    let (records, rejected) = if skip_invalid {
        let outcome = normalize_lenient(&raw);
        for error in &outcome.rejected {
            warn!("Skipping invalid response: {}", error);
        }
        (outcome.records, outcome.rejected)
    } else {
        let records = normalize(&raw).context("Survey data failed validation")?;
        (records, Vec::new())
    };

    info!(
        "Loaded {} responses from {} ({} rejected)",
        records.len(),
        source,
        rejected.len()
    );

    Ok(LoadedDataset {
        dataset: Dataset::new(records),
        source,
        rejected,
    })
}
