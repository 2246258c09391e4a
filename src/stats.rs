//! Per-layer pixel statistics with a pluggable evaluation backend
//!
//! **Why**: Emptiness detection needs one number pair per layer per frame:
//! the largest and smallest luma sample. The convergence loop stays agnostic
//! of where those numbers come from.
//!
//! # Architecture
//!
//! - `PixelStats` trait: evaluation seam consumed by the convergence loop
//! - `ExrStats`: exrs-backed implementation (default). Decodes a frame once
//!   and memoizes per-channel extrema for every layer of that frame, so
//!   evaluating several layers of the same frame costs one decode.

use exr::prelude::{FlatSamples, read_all_flat_layers_from_file};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::channels::layer_of;
use crate::sequence::SweepError;

/// Extreme luma samples of one layer in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaRange {
    pub max: f32,
    pub min: f32,
}

impl LumaRange {
    /// A layer is empty in a frame when both extremes are exactly zero
    pub fn is_zero(&self) -> bool {
        self.max == 0.0 && self.min == 0.0
    }
}

/// Evaluation seam for per-layer pixel statistics
pub trait PixelStats {
    /// Evaluate extreme luma samples for `layer` in the given frame
    fn evaluate(
        &mut self,
        path: &Path,
        frame: i64,
        layer: &str,
    ) -> Result<LumaRange, SweepError>;
}

/// Per-channel extrema of one decoded frame
#[derive(Debug)]
struct FrameStats {
    path: PathBuf,
    // full channel name -> (min, max) over all samples
    extrema: HashMap<String, (f32, f32)>,
}

/// exrs-backed statistics: one full decode per frame, all channels at once
#[derive(Debug, Default)]
pub struct ExrStats {
    loaded: Option<FrameStats>,
}

impl ExrStats {
    pub fn new() -> Self {
        Self { loaded: None }
    }

    fn ensure_loaded(&mut self, path: &Path) -> Result<(), SweepError> {
        if let Some(stats) = &self.loaded
            && stats.path.as_path() == path
        {
            return Ok(());
        }

        debug!("Decoding {}", path.display());
        let image =
            read_all_flat_layers_from_file(path).map_err(|e| SweepError::Exr(e.to_string()))?;

        let mut extrema = HashMap::new();
        for layer in &image.layer_data {
            let prefix = layer
                .attributes
                .layer_name
                .as_ref()
                .map(|n| n.to_string());

            for channel in &layer.channel_data.list {
                let name = match &prefix {
                    Some(p) => format!("{}.{}", p, channel.name),
                    None => channel.name.to_string(),
                };
                extrema.insert(name, sample_extrema(&channel.sample_data));
            }
        }

        self.loaded = Some(FrameStats {
            path: path.to_path_buf(),
            extrema,
        });
        Ok(())
    }
}

impl PixelStats for ExrStats {
    fn evaluate(
        &mut self,
        path: &Path,
        frame: i64,
        layer: &str,
    ) -> Result<LumaRange, SweepError> {
        self.ensure_loaded(path)?;
        let stats = match &self.loaded {
            Some(stats) => stats,
            None => return Err(SweepError::Exr("no frame loaded".to_string())),
        };

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for (name, &(ch_min, ch_max)) in &stats.extrema {
            if layer_of(name) != layer {
                continue;
            }
            min = min.min(ch_min);
            max = max.max(ch_max);
        }

        // A layer absent from this frame evaluates as all-zero
        if min > max {
            debug!("Layer '{}' not present in frame {}", layer, frame);
            return Ok(LumaRange { max: 0.0, min: 0.0 });
        }

        Ok(LumaRange { max, min })
    }
}

/// (min, max) over every sample of one channel
fn sample_extrema(samples: &FlatSamples) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut fold = |v: f32| {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    };

    match samples {
        FlatSamples::F16(values) => values.iter().for_each(|v| fold(v.to_f32())),
        FlatSamples::F32(values) => values.iter().for_each(|&v| fold(v)),
        FlatSamples::U32(values) => values.iter().for_each(|&v| fold(v as f32)),
    }

    if min > max { (0.0, 0.0) } else { (min, max) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{self, ChannelFilter};
    use exr::prelude::{AnyChannel, AnyChannels, Image, WritableImage};
    use half::f16;
    use std::fs;

    fn write_test_exr(path: &Path) {
        let ramp: Vec<f32> = (0..16).map(|i| i as f32 / 15.0).collect();
        let zeros = vec![0.0f32; 16];

        let channels = AnyChannels::sort(
            vec![
                AnyChannel::new("beauty.R", FlatSamples::F32(ramp.clone())),
                AnyChannel::new("beauty.G", FlatSamples::F32(ramp)),
                AnyChannel::new("mask.A", FlatSamples::F32(zeros)),
                AnyChannel::new("depth.Z", FlatSamples::F16(vec![f16::ZERO; 16])),
                AnyChannel::new("id", FlatSamples::U32(vec![0u32; 16])),
            ]
            .into(),
        );

        let image = Image::from_channels((4, 4), channels);
        image.write().to_file(path).unwrap();
    }

    fn temp_exr(name: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.0001.exr");
        write_test_exr(&path);
        (dir, path)
    }

    #[test]
    fn test_sample_extrema_variants() {
        let (min, max) = sample_extrema(&FlatSamples::F32(vec![-1.0, 0.5, 2.0]));
        assert_eq!((min, max), (-1.0, 2.0));

        let (min, max) = sample_extrema(&FlatSamples::F16(vec![f16::ZERO; 4]));
        assert_eq!((min, max), (0.0, 0.0));

        let (min, max) = sample_extrema(&FlatSamples::U32(vec![0, 7]));
        assert_eq!((min, max), (0.0, 7.0));
    }

    #[test]
    fn test_evaluate_layers() {
        let (dir, path) = temp_exr("chansweep_stats_eval");

        let mut stats = ExrStats::new();
        let beauty = stats.evaluate(&path, 1, "beauty").unwrap();
        assert!(!beauty.is_zero());
        assert_eq!(beauty.max, 1.0);
        assert_eq!(beauty.min, 0.0);

        let mask = stats.evaluate(&path, 1, "mask").unwrap();
        assert!(mask.is_zero());

        let depth = stats.evaluate(&path, 1, "depth").unwrap();
        assert!(depth.is_zero());

        // Bare channel name forms its own layer
        let id = stats.evaluate(&path, 1, "id").unwrap();
        assert!(id.is_zero());

        // A layer the file does not contain reads as black
        let missing = stats.evaluate(&path, 1, "specular").unwrap();
        assert!(missing.is_zero());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_discovery_from_written_header() {
        let (dir, path) = temp_exr("chansweep_stats_discover");

        let names = channels::read_channel_names(&path).unwrap();
        assert!(names.contains(&"beauty.R".to_string()));
        assert!(names.contains(&"id".to_string()));

        // Channel names in EXR headers are stored sorted
        let layers = channels::group_layers(&names, &ChannelFilter::new(vec![]));
        assert_eq!(layers, vec!["beauty", "depth", "id", "mask"]);

        let _ = fs::remove_dir_all(&dir);
    }
}
