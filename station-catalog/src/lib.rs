pub mod offer;
pub mod source;
pub mod catalog;

pub use offer::{OfferCategory, OfferDefinition};
pub use catalog::{CatalogError, CatalogHandle, OfferCatalog};
pub use source::{ItemOfferDocument, OfferDocument, OfferLineDocument};
