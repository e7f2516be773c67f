//! Embedded game data.
//!
//! The card catalog ships inside the binary via `include_str!`, so no
//! file I/O is needed at runtime. The JSON is parsed once on first
//! access; a catalog that fails to parse is a build defect and panics
//! immediately rather than limping along.

use once_cell::sync::Lazy;

use super::cards::CardCatalog;

/// Card catalog JSON (~6KB), embedded at compile time.
pub const CARDS_JSON: &str = include_str!("../../../../data/cards.json");

static CATALOG: Lazy<CardCatalog> =
    Lazy::new(|| CardCatalog::from_json(CARDS_JSON).expect("embedded card catalog must parse"));

/// The process-wide card catalog.
pub fn catalog() -> &'static CardCatalog {
    &CATALOG
}
