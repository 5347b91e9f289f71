//! Wire format for captured gesture paths
//!
//! Each point travels as `{"location":{"x":..,"y":..},"timestamp":..}` with
//! the timestamp in seconds, which is what the recognition backend expects.

use crate::capture::types::SampledPoint;
use crate::dispatch::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

/// One element of the JSON array sent to the backend or written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchRecord {
    pub location: Location,
    /// Seconds
    pub timestamp: f64,
}

impl From<&SampledPoint> for TouchRecord {
    fn from(p: &SampledPoint) -> Self {
        Self {
            location: Location { x: p.x, y: p.y },
            timestamp: p.captured_at_ms / 1000.0,
        }
    }
}

impl From<TouchRecord> for SampledPoint {
    fn from(r: TouchRecord) -> Self {
        SampledPoint::new(r.location.x, r.location.y, r.timestamp * 1000.0)
    }
}

/// Encode points as a JSON array of touch records.
///
/// serde_json writes non-finite floats as `null`, which the backend cannot
/// read back, so they are rejected here instead.
pub fn encode_points(points: &[SampledPoint]) -> Result<Vec<u8>> {
    if let Some((i, p)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.x.is_finite() && p.y.is_finite() && p.captured_at_ms.is_finite()))
    {
        return Err(DispatchError::Serialization(format!(
            "point {} is not finite ({}, {} @ {})",
            i, p.x, p.y, p.captured_at_ms
        )));
    }

    let records: Vec<TouchRecord> = points.iter().map(TouchRecord::from).collect();
    Ok(serde_json::to_vec(&records)?)
}

/// Parse a JSON array of touch records back into points.
pub fn decode_points(data: &[u8]) -> Result<Vec<SampledPoint>> {
    let records: Vec<TouchRecord> = serde_json::from_slice(data)?;
    Ok(records.into_iter().map(SampledPoint::from).collect())
}
