//! Channel discovery and layer grouping
//!
//! Reads the channel list from an EXR header (metadata only, no pixel
//! decode) and groups sub-channels ("diffuse.R", "diffuse.G") into layers
//! ("diffuse"). Utility layers that never carry beauty data can be excluded
//! by prefix before grouping.

use std::path::Path;

use crate::sequence::SweepError;

/// Layer prefixes excluded from analysis unless overridden
pub const DEFAULT_EXCLUDED: &[&str] = &["N", "albedo", "normal"];

/// Layer-prefix filter for channels that should never be analyzed
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    excluded: Vec<String>,
}

impl ChannelFilter {
    pub fn new(excluded: Vec<String>) -> Self {
        Self { excluded }
    }

    /// Filter with the stock utility-layer exclusions
    pub fn default_excluded() -> Self {
        Self::new(DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect())
    }

    /// True when the full channel name belongs to an excluded layer
    pub fn matches(&self, channel: &str) -> bool {
        self.excluded
            .iter()
            .any(|layer| layer_of(channel) == layer.as_str())
    }
}

/// Layer prefix of a full channel name ("diffuse.R" -> "diffuse").
///
/// A name without a separator stands as its own layer.
pub fn layer_of(channel: &str) -> &str {
    match channel.split_once('.') {
        Some((layer, _)) => layer,
        None => channel,
    }
}

/// Read full channel names from an EXR header without decoding pixels.
///
/// Multi-part files prefix each part's channels with its layer name, so the
/// returned names are always fully qualified.
pub fn read_channel_names(path: &Path) -> Result<Vec<String>, SweepError> {
    let meta = exr::meta::MetaData::read_from_file(path, false)
        .map_err(|e| SweepError::Exr(e.to_string()))?;

    let mut names = Vec::new();
    for header in &meta.headers {
        let prefix = header
            .own_attributes
            .layer_name
            .as_ref()
            .map(|n| n.to_string());

        for channel in &header.channels.list {
            let name = channel.name.to_string();
            names.push(match &prefix {
                Some(layer) => format!("{}.{}", layer, name),
                None => name,
            });
        }
    }
    Ok(names)
}

/// Group filtered channel names into layers, preserving discovery order
pub fn group_layers(channels: &[String], filter: &ChannelFilter) -> Vec<String> {
    let mut layers: Vec<String> = Vec::new();
    for channel in channels {
        if filter.matches(channel) {
            continue;
        }
        let layer = layer_of(channel);
        if !layers.iter().any(|l| l == layer) {
            layers.push(layer.to_string());
        }
    }
    layers
}

/// Discover the layer set of a sequence from its first frame
pub fn discover(first_frame: &Path, filter: &ChannelFilter) -> Result<Vec<String>, SweepError> {
    let channels = read_channel_names(first_frame)?;
    let layers = group_layers(&channels, filter);
    if layers.is_empty() {
        return Err(SweepError::NoChannels(first_frame.display().to_string()));
    }
    Ok(layers)
}
