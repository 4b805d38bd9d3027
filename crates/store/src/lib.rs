//! Store domain module.
//!
//! A store is an ordered catalog of shared product handles. It answers
//! catalog questions (totals, active listing, membership) and forwards
//! order lines to each product's pricing and purchase operations.

pub mod order;
pub mod store;

pub use order::{OrderFailure, OrderLine, OrderReceipt, ReceiptLine, SharedProduct, shared};
pub use store::Store;
