//! Empty-channel convergence over a sampled frame range
//!
//! **Why**: Decoding every frame of a 4K EXR sequence just to learn which
//! layers carry data is wasteful. Most live layers show data on the first
//! sampled frame, so the working set usually drains almost immediately.
//!
//! # Algorithm
//!
//! 1. Every layer starts as "confirmed empty so far"
//! 2. Walk the sequence at a fixed stride; for each sampled frame, evaluate
//!    pixel statistics for every still-unconfirmed layer
//! 3. A layer with non-zero extrema is marked valid, its first-seen frame is
//!    recorded, and it is permanently removed from the working set
//! 4. Stop when the working set drains or the frames run out
//!
//! Missing frame files are skipped with a notice; evaluation failures abort
//! the analysis.

use indexmap::IndexMap;
use log::{info, warn};
use serde::Serialize;

use crate::sequence::{Sequence, SweepError};
use crate::stats::PixelStats;

/// Valid/empty layer partition with first-seen frames
///
/// Layer order follows the discovery order of the input set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub valid: Vec<String>,
    pub empty: Vec<String>,
    pub first_seen: IndexMap<String, i64>,
}

/// Run the convergence loop over `seq` for the given layer set.
///
/// Samples every `step`-th file of the sequence (by position). Once a layer
/// is proven non-empty it is never evaluated again.
pub fn analyze(
    seq: &Sequence,
    layers: &[String],
    step: usize,
    stats: &mut dyn PixelStats,
) -> Result<Analysis, SweepError> {
    if layers.is_empty() {
        return Ok(Analysis::default());
    }

    // true = confirmed empty so far
    let mut status: IndexMap<String, bool> =
        layers.iter().map(|l| (l.clone(), true)).collect();
    let mut remaining: Vec<String> = layers.to_vec();
    let mut first_seen: IndexMap<String, i64> = IndexMap::new();

    for frame in seq.sampled(step) {
        if !frame.path.exists() {
            warn!("File not found, skipping: {}", frame.path.display());
            continue;
        }

        let mut confirmed = Vec::new();
        for layer in &remaining {
            let range = stats.evaluate(&frame.path, frame.number, layer)?;
            if !range.is_zero() {
                confirmed.push(layer.clone());
            }
        }

        if !confirmed.is_empty() {
            info!("Frame {}: data found in {:?}", frame.number, confirmed);
        }
        for layer in confirmed {
            first_seen.entry(layer.clone()).or_insert(frame.number);
            if let Some(empty) = status.get_mut(&layer) {
                *empty = false;
            }
        }

        remaining.retain(|layer| status[layer]);
        if remaining.is_empty() {
            info!("All layers confirmed, stopping early");
            break;
        }
    }

    let valid = status
        .iter()
        .filter(|(_, empty)| !**empty)
        .map(|(layer, _)| layer.clone())
        .collect();
    let empty = status
        .iter()
        .filter(|(_, empty)| **empty)
        .map(|(layer, _)| layer.clone())
        .collect();

    Ok(Analysis {
        valid,
        empty,
        first_seen,
    })
}
