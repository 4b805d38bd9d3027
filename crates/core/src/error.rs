//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every violated precondition of a catalog, pricing or ordering operation
/// surfaces as exactly one of these kinds; nothing is swallowed or retried.
/// Wrong-kind arguments (a non-product where a product is expected) cannot be
/// expressed at all and therefore have no variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A constructor or setter argument failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A purchase asked for more units than are in stock.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// A purchase exceeded the per-order cap of a capped product.
    #[error("quantity limit exceeded: requested {requested}, max per order {max_per_order}")]
    QuantityLimitExceeded { requested: i64, max_per_order: i64 },

    /// The product is deactivated and cannot be quoted or sold.
    #[error("product is inactive: {0}")]
    InactiveProduct(String),

    /// A requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn quantity_limit(requested: i64, max_per_order: i64) -> Self {
        Self::QuantityLimitExceeded {
            requested,
            max_per_order,
        }
    }

    pub fn inactive(product: impl Into<String>) -> Self {
        Self::InactiveProduct(product.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
