//! Release-inventory ingestion
//!
//! ## Table of Contents
//! - **IngestSummary**: Row and facility counts for a run
//! - **read_csv / read_csv_path**: CSV to facility records
//!
//! Input is one row per facility-chemical-pathway tuple. A malformed row
//! (missing required field, non-numeric or negative amount, unknown
//! pathway) is skipped with a warning and never aborts the run; only an
//! input that cannot be read as a release inventory at all is fatal.

use crate::error::{PipelineError, Result};
use crate::types::{ChemicalRelease, Facility, FacilityId, Pathway};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Columns that must be present in the input header
const REQUIRED_COLUMNS: &[&str] = &[
    "facility_id",
    "facility_name",
    "industry",
    "latitude",
    "longitude",
    "chemical_name",
    "amount_kg",
    "pathway",
];

/// One raw input row
#[derive(Debug, Deserialize)]
struct RawRow {
    facility_id: String,
    facility_name: String,
    industry: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    employee_count: Option<u32>,
    chemical_name: String,
    amount_kg: f64,
    pathway: String,
}

/// Counters describing one ingestion run
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestSummary {
    /// Data rows read from the input
    pub rows_read: usize,
    /// Rows skipped as malformed
    pub rows_skipped: usize,
    /// Distinct facilities produced
    pub facilities: usize,
}

/// Read a release inventory from a CSV file path
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<(Vec<Facility>, IngestSummary)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        PipelineError::ingest(format!("cannot open {}: {e}", path.display()))
    })?;
    let result = read_csv(file)?;
    info!(
        path = %path.display(),
        facilities = result.1.facilities,
        rows = result.1.rows_read,
        skipped = result.1.rows_skipped,
        "ingest complete"
    );
    Ok(result)
}

/// Read a release inventory from any CSV reader
///
/// An empty input (headers only, or nothing at all once headers are
/// validated) produces an empty facility list and succeeds.
pub fn read_csv<R: Read>(reader: R) -> Result<(Vec<Facility>, IngestSummary)> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::ingest(format!("unreadable header: {e}")))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(PipelineError::ingest(format!(
                "input is missing required column `{column}`"
            )));
        }
    }

    let mut facilities: BTreeMap<FacilityId, Facility> = BTreeMap::new();
    let mut summary = IngestSummary::default();

    for (index, row) in rdr.deserialize::<RawRow>().enumerate() {
        // Header occupies line 1.
        let line = index + 2;
        summary.rows_read += 1;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(line, error = %e, "skipping malformed row");
                summary.rows_skipped += 1;
                continue;
            }
        };

        if row.facility_id.is_empty() || row.chemical_name.is_empty() {
            warn!(line, "skipping row with empty facility id or chemical name");
            summary.rows_skipped += 1;
            continue;
        }
        if !row.amount_kg.is_finite() || row.amount_kg < 0.0 {
            warn!(
                line,
                facility = %row.facility_id,
                amount = row.amount_kg,
                "skipping row with invalid release amount"
            );
            summary.rows_skipped += 1;
            continue;
        }
        let pathway = match row.pathway.parse::<Pathway>() {
            Ok(p) => p,
            Err(()) => {
                warn!(
                    line,
                    facility = %row.facility_id,
                    pathway = %row.pathway,
                    "skipping row with unknown pathway"
                );
                summary.rows_skipped += 1;
                continue;
            }
        };

        let id = FacilityId::new(row.facility_id);
        let facility = facilities.entry(id.clone()).or_insert_with(|| {
            let mut f = Facility::new(id, row.facility_name, row.industry);
            // First row wins for facility-level metadata.
            f.latitude = row.latitude;
            f.longitude = row.longitude;
            f.employee_count = row.employee_count;
            f
        });
        facility
            .releases
            .push(ChemicalRelease::new(row.chemical_name, row.amount_kg, pathway));
    }

    summary.facilities = facilities.len();
    Ok((facilities.into_values().collect(), summary))
}
