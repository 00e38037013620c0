use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::CatalogError;

/// One item-offer file as shipped with the game data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemOfferDocument {
    #[serde(default, alias = "offerLine")]
    pub offer_line: Vec<OfferLineDocument>,
}

/// Offers sharing one scheduled duration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OfferLineDocument {
    #[serde(default, alias = "duration")]
    pub duration: Option<u32>,
    #[serde(default, alias = "offers")]
    pub offers: Vec<OfferDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OfferDocument {
    #[serde(alias = "offerId")]
    pub offer_id: String,
    #[serde(alias = "price")]
    pub price: u32,
}

/// A parsed document alongside the raw JSON it came from
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub raw: serde_json::Value,
    pub document: ItemOfferDocument,
}

/// Read every `*.json` under `dir`, recursively, in sorted path order.
///
/// Files that cannot be read or parsed are skipped. A missing or unreadable
/// directory is an error.
pub fn read_documents(dir: &Path) -> Result<Vec<LoadedDocument>, CatalogError> {
    if !dir.is_dir() {
        return Err(CatalogError::Unavailable(format!(
            "offers directory {} does not exist",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    collect_json_files(dir, &mut paths)?;
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match parse_file(&path) {
            Ok((raw, document)) => {
                debug!("Loaded offer document {}", path.display());
                documents.push(LoadedDocument { path, raw, document });
            }
            Err(e) => warn!("Skipping offer document {}: {}", path.display(), e),
        }
    }

    Ok(documents)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CatalogError::Unavailable(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }

    Ok(())
}

fn parse_file(path: &Path) -> Result<(serde_json::Value, ItemOfferDocument), CatalogError> {
    let content = fs::read_to_string(path)?;
    let raw: serde_json::Value = serde_json::from_str(&content)?;
    let document = ItemOfferDocument::deserialize(&raw)?;
    Ok((raw, document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_accepts_both_casings() {
        let pascal: ItemOfferDocument = serde_json::from_str(
            r#"{"ItemId": "boost", "OfferLine": [{"Duration": 3600, "Offers": [{"OfferId": "boost_1h", "Price": 10}]}]}"#,
        )
        .unwrap();
        assert_eq!(pascal.offer_line[0].duration, Some(3600));
        assert_eq!(pascal.offer_line[0].offers[0].offer_id, "boost_1h");

        let camel: ItemOfferDocument = serde_json::from_str(
            r#"{"offerLine": [{"offers": [{"offerId": "weapon_loadout_ak", "price": 120}]}]}"#,
        )
        .unwrap();
        assert_eq!(camel.offer_line[0].duration, None);
        assert_eq!(camel.offer_line[0].offers[0].price, 120);
    }

    #[test]
    fn test_read_documents_recurses_and_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("season1");
        fs::create_dir(&nested).unwrap();

        fs::write(
            dir.path().join("a.json"),
            r#"{"OfferLine": [{"Duration": 60, "Offers": [{"OfferId": "a", "Price": 1}]}]}"#,
        )
        .unwrap();
        fs::write(
            nested.join("b.json"),
            r#"{"OfferLine": [{"Offers": [{"OfferId": "b", "Price": 2}]}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = read_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].path.ends_with("a.json"));
        assert!(docs[1].path.ends_with("season1/b.json"));
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_documents(&dir.path().join("missing"));
        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
    }
}
