//! Products domain module.
//!
//! This crate contains the business rules for catalog products: validated
//! construction, the stock/activation lifecycle, promotion-aware pricing and
//! purchasing. Implemented purely as deterministic domain logic (no IO, no
//! storage).

pub mod product;

pub use product::{Product, ProductCommand, ProductEvent, ProductId, ProductKind};
