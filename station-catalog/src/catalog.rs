use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::offer::OfferDefinition;
use crate::source::{self, ItemOfferDocument};

/// Immutable offer index, built once and shared by every request
#[derive(Debug, Default)]
pub struct OfferCatalog {
    offers: HashMap<String, OfferDefinition>,
    documents: Vec<serde_json::Value>,
}

impl OfferCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and index every offer document under `dir`
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let loaded = source::read_documents(dir)?;
        let mut catalog = Self::empty();

        for doc in loaded {
            catalog.index_document(&doc.document);
            catalog.documents.push(doc.raw);
        }

        info!(
            "Indexed {} offers from {} documents in {}",
            catalog.offers.len(),
            catalog.documents.len(),
            dir.display()
        );
        Ok(catalog)
    }

    /// Build directly from parsed documents
    pub fn from_documents(documents: Vec<ItemOfferDocument>) -> Self {
        let mut catalog = Self::empty();
        for doc in &documents {
            catalog.index_document(doc);
        }
        catalog.documents = documents
            .iter()
            .filter_map(|doc| serde_json::to_value(doc).ok())
            .collect();
        catalog
    }

    fn index_document(&mut self, doc: &ItemOfferDocument) {
        for line in &doc.offer_line {
            let duration = i64::from(line.duration.unwrap_or(0));
            for offer in &line.offers {
                if self.offers.contains_key(&offer.offer_id) {
                    warn!("Duplicate offer id {} ignored", offer.offer_id);
                    continue;
                }
                self.offers.insert(
                    offer.offer_id.clone(),
                    OfferDefinition::new(offer.offer_id.clone(), i64::from(offer.price), duration),
                );
            }
        }
    }

    pub fn resolve(&self, offer_id: &str) -> Option<&OfferDefinition> {
        self.offers.get(offer_id)
    }

    /// Duration of the offer's line, 0 when unscheduled or unknown
    pub fn duration_of(&self, offer_id: &str) -> i64 {
        self.resolve(offer_id).map(|o| o.duration).unwrap_or(0)
    }

    /// Raw item-offer documents, as served to clients
    pub fn documents(&self) -> &[serde_json::Value] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Process-wide catalog with explicit reload.
///
/// Readers take an `Arc` snapshot; a reload swaps the snapshot and never
/// mutates one that is already handed out.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    dir: PathBuf,
    current: Arc<RwLock<Arc<OfferCatalog>>>,
}

impl CatalogHandle {
    /// Load from `dir`, falling back to an empty catalog if it is unavailable.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let catalog = OfferCatalog::load(&dir).unwrap_or_else(|e| {
            warn!("Offer catalog unavailable, serving empty catalog: {}", e);
            OfferCatalog::empty()
        });
        Self::with_catalog(dir, catalog)
    }

    pub fn with_catalog(dir: impl Into<PathBuf>, catalog: OfferCatalog) -> Self {
        Self {
            dir: dir.into(),
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    pub fn current(&self) -> Arc<OfferCatalog> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Re-read the offers directory. On failure the previous catalog stays live.
    pub fn reload(&self) -> Result<usize, CatalogError> {
        let catalog = OfferCatalog::load(&self.dir)?;
        let count = catalog.len();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(catalog);
        info!("Offer catalog reloaded: {} offers", count);
        Ok(count)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Offer catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read offer document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed offer document: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::OfferCategory;
    use crate::source::{OfferDocument, OfferLineDocument};
    use station_core::CurrencyKind;
    use std::fs;

    fn line(duration: Option<u32>, offers: &[(&str, u32)]) -> OfferLineDocument {
        OfferLineDocument {
            duration,
            offers: offers
                .iter()
                .map(|(id, price)| OfferDocument { offer_id: id.to_string(), price: *price })
                .collect(),
        }
    }

    #[test]
    fn test_resolve_and_duration_grouping() {
        let catalog = OfferCatalog::from_documents(vec![ItemOfferDocument {
            offer_line: vec![
                line(Some(86400), &[("xp_boost_1d", 40), ("xp_boost_1d_cr", 5)]),
                line(None, &[("weapon_loadout_ak", 120)]),
            ],
        }]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.duration_of("xp_boost_1d"), 86400);
        assert_eq!(catalog.duration_of("xp_boost_1d_cr"), 86400);
        assert_eq!(catalog.duration_of("weapon_loadout_ak"), 0);
        assert_eq!(catalog.duration_of("missing"), 0);

        let credits = catalog.resolve("xp_boost_1d_cr").unwrap();
        assert_eq!(credits.currency, CurrencyKind::Credits);
        assert_eq!(credits.category, OfferCategory::TimeLimited);
        assert!(catalog.resolve("missing").is_none());
    }

    #[test]
    fn test_duplicate_offer_first_wins() {
        let catalog = OfferCatalog::from_documents(vec![
            ItemOfferDocument { offer_line: vec![line(Some(60), &[("boost", 10)])] },
            ItemOfferDocument { offer_line: vec![line(Some(120), &[("boost", 99)])] },
        ]);
        let offer = catalog.resolve("boost").unwrap();
        assert_eq!(offer.price, 10);
        assert_eq!(offer.duration, 60);
        assert_eq!(catalog.documents().len(), 2);
    }

    #[test]
    fn test_open_missing_dir_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let handle = CatalogHandle::open(dir.path().join("nope"));
        assert!(handle.current().is_empty());
        assert!(matches!(handle.reload(), Err(CatalogError::Unavailable(_))));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("one.json"),
            r#"{"OfferLine": [{"Offers": [{"OfferId": "first", "Price": 1}]}]}"#,
        )
        .unwrap();

        let handle = CatalogHandle::open(dir.path());
        let before = handle.current();
        assert!(before.resolve("first").is_some());

        fs::write(
            dir.path().join("two.json"),
            r#"{"OfferLine": [{"Offers": [{"OfferId": "second", "Price": 2}]}]}"#,
        )
        .unwrap();
        assert_eq!(handle.reload().unwrap(), 2);

        assert!(handle.current().resolve("second").is_some());
        assert!(before.resolve("second").is_none());
    }

    #[test]
    fn test_failed_reload_keeps_previous_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let offers = dir.path().join("offers");
        fs::create_dir(&offers).unwrap();
        fs::write(
            offers.join("one.json"),
            r#"{"OfferLine": [{"Offers": [{"OfferId": "first", "Price": 1}]}]}"#,
        )
        .unwrap();

        let handle = CatalogHandle::open(&offers);
        fs::remove_dir_all(&offers).unwrap();

        assert!(handle.reload().is_err());
        assert!(handle.current().resolve("first").is_some());
    }
}
