//! Resource fetching
//!
//! Resources are JSON documents of the form `{"data": ...}` addressed by
//! slash paths such as `workbook/7` or `scenario/3`. An absent resource is
//! `Ok(None)`; callers turn that into [`CoreError::NotFound`].

use crate::error::{CoreError, CoreResult};
use crate::types::VariationPatch;
use async_trait::async_trait;
use dd_catalog::FlatOverrides;
use dd_params::{tree_from_json, Branch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fetched resource envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub data: Value,
}

/// Source of workbooks, variations and base parameter trees
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the resource at `path`
    async fn fetch(&self, path: &str) -> CoreResult<Option<Resource>>;
}

/// Fetch a resource's data, failing when absent
///
/// A null `data` counts as absent.
///
/// # Errors
/// Returns [`CoreError::NotFound`] naming `what` and `path`
pub async fn fetch_data(
    fetcher: &dyn ResourceFetcher,
    what: &'static str,
    path: &str,
) -> CoreResult<Value> {
    match fetcher.fetch(path).await? {
        Some(Resource { data }) if !data.is_null() => Ok(data),
        _ => Err(CoreError::not_found(what, path)),
    }
}

/// Fetch and decode a typed resource
///
/// # Errors
/// Returns [`CoreError::NotFound`] when absent, or
/// [`CoreError::InvalidResource`] when the data does not decode
pub async fn fetch_as<T: DeserializeOwned>(
    fetcher: &dyn ResourceFetcher,
    what: &'static str,
    path: &str,
) -> CoreResult<T> {
    let data = fetch_data(fetcher, what, path).await?;
    serde_json::from_value(data).map_err(|e| CoreError::invalid_resource(what, path, e.to_string()))
}

/// Fetch a base parameter tree
///
/// # Errors
/// Returns [`CoreError::NotFound`] when absent, or
/// [`CoreError::InvalidResource`] when the data is not a parameter tree
pub async fn fetch_tree(
    fetcher: &dyn ResourceFetcher,
    what: &'static str,
    path: &str,
) -> CoreResult<Branch> {
    let data = fetch_data(fetcher, what, path).await?;
    tree_from_json(data).map_err(|e| CoreError::invalid_resource(what, path, e.to_string()))
}

/// Variation with both parent trees loaded
#[derive(Debug, Clone)]
pub struct ResolvedVariation {
    pub patch: VariationPatch,
    pub scenario: Branch,
    pub reference: Branch,
    pub overrides: FlatOverrides,
}

/// Fetch a variation and its scenario and reference parents
///
/// # Errors
/// Returns [`CoreError::NotFound`] if the variation or a parent is absent
pub async fn resolve_variation(
    fetcher: &dyn ResourceFetcher,
    path: &str,
) -> CoreResult<ResolvedVariation> {
    let patch: VariationPatch = fetch_as(fetcher, "Variation", path).await?;
    let scenario = fetch_tree(fetcher, "Scenario", &patch.scenario_parent_path).await?;
    let reference = fetch_tree(fetcher, "Reference", &patch.reference_parent_path).await?;
    let overrides = FlatOverrides::new(&patch.scenario_vars, &patch.reference_vars);
    Ok(ResolvedVariation {
        patch,
        scenario,
        reference,
        overrides,
    })
}

/// Fetcher over a directory of `<path>.json` files
///
/// `scenario/3` is read from `<root>/scenario/3.json`.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, path: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return None;
        }
        let (last, dirs) = segments.split_last()?;
        let mut file = self.root.clone();
        file.extend(dirs);
        file.push(format!("{last}.json"));
        Some(file)
    }
}

#[async_trait]
impl ResourceFetcher for DirectoryFetcher {
    async fn fetch(&self, path: &str) -> CoreResult<Option<Resource>> {
        let Some(file) = self.file_for(path) else {
            debug!(path, "rejected resource path");
            return Ok(None);
        };
        let text = match tokio::fs::read_to_string(&file).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::Fetch {
                    path: path.to_string(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| CoreError::Fetch {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(root: &Path, path: &str, value: &Value) {
        let file = root.join(format!("{path}.json"));
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, value.to_string()).unwrap();
    }

    #[tokio::test]
    async fn directory_fetcher_reads_envelope() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scenario/3", &json!({"data": {"technologies": {}}}));
        let fetcher = DirectoryFetcher::new(dir.path());

        let resource = fetcher.fetch("scenario/3").await.unwrap().unwrap();
        assert_eq!(resource.data, json!({"technologies": {}}));
        assert!(fetcher.fetch("scenario/4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn directory_fetcher_refuses_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DirectoryFetcher::new(dir.path().join("inner"));
        assert!(fetcher.fetch("../secret").await.unwrap().is_none());
        assert!(fetcher.fetch("a//b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let fetcher = DirectoryFetcher::new(dir.path());
        assert!(matches!(
            fetcher.fetch("broken").await,
            Err(CoreError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn null_data_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "workbook/1", &json!({"data": null}));
        let fetcher = DirectoryFetcher::new(dir.path());
        let err = fetch_data(&fetcher, "Workbook", "workbook/1").await.unwrap_err();
        assert_eq!(err.to_string(), "Workbook not found: workbook/1");
    }

    #[tokio::test]
    async fn resolve_variation_names_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "variation/1",
            &json!({"data": {
                "scenario_parent_path": "scenario/1",
                "reference_parent_path": "reference/1"
            }}),
        );
        write(dir.path(), "scenario/1", &json!({"data": {"technologies": {}}}));
        let fetcher = DirectoryFetcher::new(dir.path());
        let err = resolve_variation(&fetcher, "variation/1").await.unwrap_err();
        assert_eq!(err.to_string(), "Reference not found: reference/1");
    }

    #[tokio::test]
    async fn fetch_tree_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scenario/1", &json!({"data": [1, 2]}));
        let fetcher = DirectoryFetcher::new(dir.path());
        assert!(matches!(
            fetch_tree(&fetcher, "Scenario", "scenario/1").await,
            Err(CoreError::InvalidResource { .. })
        ));
    }
}
