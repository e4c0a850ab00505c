use std::path::Path;

use anyhow::{bail, Context, Result};
use facts_core::features::{freeze, thaw_value};
use facts_core::store::{LoadedFeatures, Scope, StoredFeature};
use facts_core::value::parse_address;
use serde::{Deserialize, Serialize};

use crate::commands::util::{display_address, open_archive_at, read_input, resolve_input};

/// One entry of a feature batch file.
///
/// `feature` is a wire record exactly as the codec writes it. `address` may
/// be a number or a `0x` hex string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBatchEntry {
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressInput>,
    pub feature: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressInput {
    Number(u64),
    Text(String),
}

impl AddressInput {
    fn resolve(&self) -> Result<u64> {
        match self {
            AddressInput::Number(n) => Ok(*n),
            AddressInput::Text(text) => Ok(parse_address(text.as_str())?),
        }
    }
}

impl FeatureBatchEntry {
    /// Thaw the wire record. Unknown types are rejected here; an import must
    /// not silently drop input.
    pub fn into_stored(self) -> Result<StoredFeature> {
        let address = self.address.as_ref().map(AddressInput::resolve).transpose()?;
        let feature = thaw_value(self.feature)?;
        Ok(StoredFeature::new(self.scope, address, feature))
    }

    pub fn from_stored(stored: &StoredFeature) -> Result<Self> {
        let feature = freeze(&stored.feature).to_value()?;
        Ok(Self {
            scope: stored.scope,
            address: stored.address.map(|address| AddressInput::Text(format!("{address:#x}"))),
            feature,
        })
    }
}

/// Read a batch file; `.yaml`/`.yml` are YAML, everything else JSON.
pub fn load_feature_batch(path: &Path) -> Result<Vec<StoredFeature>> {
    let buf = read_input(path, "feature batch")?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    let entries: Vec<FeatureBatchEntry> = if is_yaml {
        serde_yaml::from_slice(&buf)
            .with_context(|| format!("Failed to parse YAML batch {}", path.display()))?
    } else {
        serde_json::from_slice(&buf)
            .with_context(|| format!("Failed to parse JSON batch {}", path.display()))?
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .into_stored()
                .with_context(|| format!("Invalid feature at index {index} in {}", path.display()))
        })
        .collect()
}

/// Store a batch of features for a registered sample.
pub fn import_features_command(root: &str, sample: &str, path: &str) -> Result<()> {
    let ctx = open_archive_at(root)?;
    if ctx.store.find_sample(sample)?.is_none() {
        bail!("Sample {} is not registered; run add-sample first", sample);
    }

    let batch_path = resolve_input(path)?;
    let features = load_feature_batch(&batch_path)?;
    let count = ctx
        .store
        .insert_features(sample, &features)
        .with_context(|| format!("Failed to store features for {}", sample))?;

    println!("Imported {} feature(s) for {}", count, sample);
    Ok(())
}

/// Load a sample's features using the archive's unknown-feature policy.
pub fn load_sample_features(root: &str, sample: &str) -> Result<LoadedFeatures> {
    let ctx = open_archive_at(root)?;
    let policy = ctx.unknown_features();
    ctx.store
        .load_features(sample, policy)
        .with_context(|| format!("Failed to load features for {}", sample))
}

/// Print a sample's features as text or as a re-importable batch.
pub fn list_features_command(root: &str, sample: &str, json: bool) -> Result<()> {
    let loaded = load_sample_features(root, sample)?;

    if json {
        let entries = loaded
            .features
            .iter()
            .map(FeatureBatchEntry::from_stored)
            .collect::<Result<Vec<_>>>()?;
        let serialized = serde_json::to_string_pretty(&entries)
            .context("Failed to serialize features to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Features for {} ({}):", sample, loaded.features.len());
    if loaded.features.is_empty() {
        println!("  (none)");
    }
    for stored in &loaded.features {
        println!("  - [{}] {} {}", stored.scope, display_address(stored.address), stored.feature);
    }
    if !loaded.skipped.is_empty() {
        println!("Skipped {} record(s) with unknown feature types", loaded.skipped.len());
    }

    Ok(())
}
