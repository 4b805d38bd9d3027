use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use storefront_core::{DomainError, round_cents};
use storefront_products::{Product, ProductId};

/// A product handle shared between stores, orders and callers.
///
/// Single-threaded: no internal synchronization.
pub type SharedProduct = Rc<RefCell<Product>>;

/// Wrap a product into a shareable handle.
pub fn shared(product: Product) -> SharedProduct {
    Rc::new(RefCell::new(product))
}

/// Order line: product and requested quantity.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product: SharedProduct,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product: &SharedProduct, quantity: i64) -> Self {
        Self {
            product: Rc::clone(product),
            quantity,
        }
    }
}

impl From<(SharedProduct, i64)> for OrderLine {
    fn from((product, quantity): (SharedProduct, i64)) -> Self {
        Self { product, quantity }
    }
}

/// One committed purchase within an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub total: f64,
}

/// Purchases committed by an order, in line order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderReceipt {
    lines: Vec<ReceiptLine>,
    total: f64,
}

impl OrderReceipt {
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Sum of all committed line totals, rounded to cents.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn push(&mut self, line: ReceiptLine) {
        self.total = round_cents(self.total + line.total);
        self.lines.push(line);
    }
}

/// A line of an order failed. Lines before it stay committed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("order line {line_no} failed: {source}")]
pub struct OrderFailure {
    line_no: u32,
    committed: OrderReceipt,
    #[source]
    source: DomainError,
}

impl OrderFailure {
    pub(crate) fn new(line_no: u32, committed: OrderReceipt, source: DomainError) -> Self {
        Self {
            line_no,
            committed,
            source,
        }
    }

    /// 1-based number of the line that failed.
    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    /// Purchases that went through before the failure.
    pub fn committed(&self) -> &OrderReceipt {
        &self.committed
    }

    pub fn error(&self) -> &DomainError {
        &self.source
    }

    pub fn into_error(self) -> DomainError {
        self.source
    }
}
