//! Ingestion-side validation of sensor batches

use crate::error::{DetectError, DetectResult};
use vibewatch_types::{Sample, Sanitize, SensorBatch, AXIS_COUNT};

/// Validate a batch and return its rows as sanitized `[x, y, z]` triples.
///
/// Rejects empty batches and rows with fewer than three values. Extra
/// columns are ignored.
pub fn validate_batch(batch: &SensorBatch) -> DetectResult<Vec<[f64; AXIS_COUNT]>> {
    if batch.data.is_empty() {
        return Err(DetectError::Validation(format!(
            "batch from sensor '{}' contains no samples",
            batch.sensor_id
        )));
    }

    batch
        .data
        .iter()
        .enumerate()
        .map(|(i, row)| match row.as_slice() {
            [x, y, z, ..] => Ok([*x, *y, *z].sanitized()),
            _ => Err(DetectError::Validation(format!(
                "row {} has {} values, expected at least {}",
                i,
                row.len(),
                AXIS_COUNT
            ))),
        })
        .collect()
}

/// Stamp rows with strictly increasing timestamps ending at `now_ms`.
pub fn timestamp_rows(rows: &[[f64; AXIS_COUNT]], now_ms: i64) -> Vec<Sample> {
    let last = rows.len() as i64 - 1;
    rows.iter()
        .enumerate()
        .map(|(i, axes)| Sample::new(now_ms - (last - i as i64), *axes))
        .collect()
}
