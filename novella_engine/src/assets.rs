use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Lookup the overlay consults before applying an `image_ref` change.
/// A missing image downgrades the directive to position/active only.
pub trait AssetCatalog {
    fn has_image(&self, image_ref: &str) -> bool;
}

/// Catalog used when no manifest is configured: every image resolves.
#[derive(Debug, Default)]
pub struct PermissiveAssets;

impl AssetCatalog for PermissiveAssets {
    fn has_image(&self, _image_ref: &str) -> bool {
        true
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ManifestFile {
    images: Vec<String>,
}

/// Catalog backed by a JSON manifest listing the shipped image names.
#[derive(Debug, Default)]
pub struct ManifestAssets {
    images: BTreeSet<String>,
}

impl ManifestAssets {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read asset manifest: {}", path.display()))?;
        let manifest: ManifestFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse asset manifest: {}", path.display()))?;
        Ok(Self::from_names(manifest.images))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ManifestAssets {
            images: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl AssetCatalog for ManifestAssets {
    fn has_image(&self, image_ref: &str) -> bool {
        self.images.contains(image_ref)
    }
}
