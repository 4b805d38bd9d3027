//! Promotions domain module.
//!
//! Pure pricing strategies: given a unit price and a quantity, a promotion
//! returns the total charge for that many units. Promotions never hold state
//! beyond their construction parameters.

pub mod promotion;

pub use promotion::{Promotion, PromotionRule, best_total};
