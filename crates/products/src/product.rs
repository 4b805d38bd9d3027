use core::cmp::Ordering;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use storefront_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, round_cents,
};
use storefront_events::{Event, EventEnvelope};
use storefront_promotions::{Promotion, best_total};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// How a product tracks stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductKind {
    /// Stock is tracked and depleted by purchases.
    Standard,
    /// Non-stocked (digital) product. Quantity is pinned at 0 and only
    /// explicit activation calls change its availability.
    Unlimited,
    /// Stocked product with a per-order purchase cap.
    Capped { max_per_order: i64 },
}

impl ProductKind {
    pub fn tracks_stock(&self) -> bool {
        !matches!(self, ProductKind::Unlimited)
    }

    pub fn max_per_order(&self) -> Option<i64> {
        match self {
            ProductKind::Capped { max_per_order } => Some(*max_per_order),
            _ => None,
        }
    }
}

/// Aggregate root: Product.
///
/// Equality compares identity and current state; `version` and `history`
/// are bookkeeping and do not take part.
#[derive(Debug, Clone)]
pub struct Product {
    id: ProductId,
    name: String,
    kind: ProductKind,
    unit_price: f64,
    quantity: i64,
    active: bool,
    promotions: Vec<Promotion>,
    version: u64,
    history: Vec<EventEnvelope<ProductEvent>>,
}

impl Product {
    /// Create a product of the given kind.
    ///
    /// A stocked product created with zero quantity starts inactive. Unlimited
    /// products ignore `quantity` (it must still be a valid stock level).
    pub fn new(
        name: impl Into<String>,
        unit_price: f64,
        quantity: i64,
        kind: ProductKind,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_price(unit_price)?;
        ensure_stock_level(quantity)?;
        if let ProductKind::Capped { max_per_order } = kind {
            if max_per_order <= 0 {
                return Err(DomainError::validation(format!(
                    "max per order must be positive, got {max_per_order}"
                )));
            }
        }

        let quantity = if kind.tracks_stock() { quantity } else { 0 };
        Ok(Self {
            id: ProductId::new(AggregateId::new()),
            name,
            kind,
            unit_price,
            quantity,
            active: !kind.tracks_stock() || quantity > 0,
            promotions: Vec::new(),
            version: 0,
            history: Vec::new(),
        })
    }

    pub fn standard(name: impl Into<String>, unit_price: f64, quantity: i64) -> DomainResult<Self> {
        Self::new(name, unit_price, quantity, ProductKind::Standard)
    }

    pub fn unlimited(name: impl Into<String>, unit_price: f64) -> DomainResult<Self> {
        Self::new(name, unit_price, 0, ProductKind::Unlimited)
    }

    pub fn capped(
        name: impl Into<String>,
        unit_price: f64,
        quantity: i64,
        max_per_order: i64,
    ) -> DomainResult<Self> {
        Self::new(name, unit_price, quantity, ProductKind::Capped { max_per_order })
    }

    /// Start out deactivated.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Start out with `promotion` attached (ignored if already attached).
    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        if !self.promotions.contains(&promotion) {
            self.promotions.push(promotion);
        }
        self
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn max_per_order(&self) -> Option<i64> {
        self.kind.max_per_order()
    }

    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    /// Every event applied since construction, oldest first.
    pub fn history(&self) -> &[EventEnvelope<ProductEvent>] {
        &self.history
    }

    pub fn set_price(&mut self, unit_price: f64) -> DomainResult<()> {
        self.execute(&ProductCommand::ChangePrice { unit_price })
    }

    /// Replace the stock level. Setting it to 0 deactivates a stocked product.
    pub fn set_quantity(&mut self, quantity: i64) -> DomainResult<()> {
        self.execute(&ProductCommand::SetQuantity { quantity })
    }

    /// Take `amount` units out of stock. A no-op for unlimited products.
    pub fn reduce_quantity_after_purchase(&mut self, amount: i64) -> DomainResult<()> {
        self.execute(&ProductCommand::ReduceStock { amount })
    }

    pub fn activate(&mut self) {
        self.commit(vec![ProductEvent::Activated]);
    }

    pub fn deactivate(&mut self) {
        self.commit(vec![ProductEvent::Deactivated]);
    }

    pub fn add_promotion(&mut self, promotion: Promotion) {
        self.add_promotions([promotion]);
    }

    /// Attach promotions; ones already attached are skipped.
    pub fn add_promotions(&mut self, promotions: impl IntoIterator<Item = Promotion>) {
        let events = self.handle_add_promotions(&promotions.into_iter().collect::<Vec<_>>());
        self.commit(events);
    }

    pub fn remove_promotion(&mut self, promotion: &Promotion) {
        self.remove_promotions([promotion.clone()]);
    }

    /// Detach promotions; ones not attached are skipped.
    pub fn remove_promotions(&mut self, promotions: impl IntoIterator<Item = Promotion>) {
        let events = self.handle_remove_promotions(&promotions.into_iter().collect::<Vec<_>>());
        self.commit(events);
    }

    /// Price `quantity` units without touching stock.
    pub fn quote_price(&self, quantity: i64) -> DomainResult<f64> {
        ensure_order_quantity(quantity)?;
        if !self.active {
            return Err(DomainError::inactive(&self.name));
        }
        Ok(self.charge_for(quantity))
    }

    /// Buy `quantity` units and return the charged total.
    ///
    /// Checks run in a fixed order and the first failure wins: quantity must
    /// be positive, then the per-order cap, then available stock, then the
    /// active flag.
    pub fn purchase(&mut self, quantity: i64) -> DomainResult<f64> {
        let events = self.handle(&ProductCommand::Purchase { quantity })?;
        let total = self.charge_for(quantity);
        self.commit(events);
        Ok(total)
    }

    /// Human-readable one-line description.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Total order by unit price alone.
    pub fn cmp_price(&self, other: &Product) -> Ordering {
        self.unit_price.total_cmp(&other.unit_price)
    }

    pub fn is_cheaper_than(&self, other: &Product) -> bool {
        self.cmp_price(other) == Ordering::Less
    }

    pub fn is_pricier_than(&self, other: &Product) -> bool {
        self.cmp_price(other) == Ordering::Greater
    }

    fn charge_for(&self, quantity: i64) -> f64 {
        round_cents(best_total(&self.promotions, self.unit_price, quantity))
    }

    fn execute(&mut self, command: &ProductCommand) -> DomainResult<()> {
        let events = self.handle(command)?;
        self.commit(events);
        Ok(())
    }

    fn commit(&mut self, events: Vec<ProductEvent>) {
        let occurred_at = Utc::now();
        for event in events {
            self.apply(&event);
            self.history.push(EventEnvelope::record(
                self.id.0,
                "product",
                self.version,
                occurred_at,
                event,
            ));
        }
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, Price: {:.2}, ", self.name, self.unit_price)?;
        match self.kind {
            ProductKind::Unlimited => f.write_str("Quantity: virtual product")?,
            _ => write!(f, "Quantity: {}", self.quantity)?,
        }
        if let ProductKind::Capped { max_per_order } = self.kind {
            write!(f, ", Max per order: {max_per_order}")?;
        }
        if !self.promotions.is_empty() {
            let names: Vec<&str> = self.promotions.iter().map(Promotion::name).collect();
            write!(f, " | Promotions: {}", names.join(", "))?;
        }
        Ok(())
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.unit_price == other.unit_price
            && self.quantity == other.quantity
            && self.active == other.active
            && self.promotions == other.promotions
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductCommand {
    ChangePrice { unit_price: f64 },
    SetQuantity { quantity: i64 },
    ReduceStock { amount: i64 },
    Activate,
    Deactivate,
    AddPromotions(Vec<Promotion>),
    RemovePromotions(Vec<Promotion>),
    Purchase { quantity: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductEvent {
    PriceChanged { unit_price: f64 },
    QuantitySet { quantity: i64 },
    StockReduced { amount: i64 },
    Activated,
    Deactivated,
    PromotionAdded(Promotion),
    PromotionRemoved(Promotion),
    /// A purchase was charged. Stock movement, if any, follows as `StockReduced`.
    Purchased { quantity: i64, total: f64 },
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::PriceChanged { .. } => "product.price_changed",
            ProductEvent::QuantitySet { .. } => "product.quantity_set",
            ProductEvent::StockReduced { .. } => "product.stock_reduced",
            ProductEvent::Activated => "product.activated",
            ProductEvent::Deactivated => "product.deactivated",
            ProductEvent::PromotionAdded(_) => "product.promotion_added",
            ProductEvent::PromotionRemoved(_) => "product.promotion_removed",
            ProductEvent::Purchased { .. } => "product.purchased",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::PriceChanged { unit_price } => {
                self.unit_price = *unit_price;
            }
            ProductEvent::QuantitySet { quantity } => {
                self.quantity = *quantity;
            }
            ProductEvent::StockReduced { amount } => {
                self.quantity -= amount;
            }
            ProductEvent::Activated => {
                self.active = true;
            }
            ProductEvent::Deactivated => {
                self.active = false;
            }
            ProductEvent::PromotionAdded(promotion) => {
                self.promotions.push(promotion.clone());
            }
            ProductEvent::PromotionRemoved(promotion) => {
                self.promotions.retain(|p| p != promotion);
            }
            ProductEvent::Purchased { .. } => {}
        }

        // Sold out means unavailable, whichever way stock reached zero.
        if matches!(
            event,
            ProductEvent::QuantitySet { .. } | ProductEvent::StockReduced { .. }
        ) && self.kind.tracks_stock()
            && self.quantity == 0
        {
            self.active = false;
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::ChangePrice { unit_price } => self.handle_change_price(*unit_price),
            ProductCommand::SetQuantity { quantity } => self.handle_set_quantity(*quantity),
            ProductCommand::ReduceStock { amount } => self.handle_reduce_stock(*amount),
            ProductCommand::Activate => Ok(vec![ProductEvent::Activated]),
            ProductCommand::Deactivate => Ok(vec![ProductEvent::Deactivated]),
            ProductCommand::AddPromotions(promotions) => {
                Ok(self.handle_add_promotions(promotions))
            }
            ProductCommand::RemovePromotions(promotions) => {
                Ok(self.handle_remove_promotions(promotions))
            }
            ProductCommand::Purchase { quantity } => self.handle_purchase(*quantity),
        }
    }
}

impl Product {
    fn handle_change_price(&self, unit_price: f64) -> DomainResult<Vec<ProductEvent>> {
        ensure_price(unit_price)?;
        Ok(vec![ProductEvent::PriceChanged { unit_price }])
    }

    fn handle_set_quantity(&self, quantity: i64) -> DomainResult<Vec<ProductEvent>> {
        ensure_stock_level(quantity)?;
        if !self.kind.tracks_stock() {
            if quantity != 0 {
                return Err(DomainError::validation(
                    "unlimited products do not track quantity",
                ));
            }
            return Ok(Vec::new());
        }
        Ok(vec![ProductEvent::QuantitySet { quantity }])
    }

    fn handle_reduce_stock(&self, amount: i64) -> DomainResult<Vec<ProductEvent>> {
        ensure_order_quantity(amount)?;
        if !self.kind.tracks_stock() {
            return Ok(Vec::new());
        }
        if amount > self.quantity {
            return Err(DomainError::insufficient_stock(amount, self.quantity));
        }
        Ok(vec![ProductEvent::StockReduced { amount }])
    }

    fn handle_add_promotions(&self, promotions: &[Promotion]) -> Vec<ProductEvent> {
        let mut added: Vec<&Promotion> = Vec::new();
        for promotion in promotions {
            if !self.promotions.contains(promotion) && !added.contains(&promotion) {
                added.push(promotion);
            }
        }
        added
            .into_iter()
            .map(|p| ProductEvent::PromotionAdded(p.clone()))
            .collect()
    }

    fn handle_remove_promotions(&self, promotions: &[Promotion]) -> Vec<ProductEvent> {
        let mut removed: Vec<&Promotion> = Vec::new();
        for promotion in promotions {
            if self.promotions.contains(promotion) && !removed.contains(&promotion) {
                removed.push(promotion);
            }
        }
        removed
            .into_iter()
            .map(|p| ProductEvent::PromotionRemoved(p.clone()))
            .collect()
    }

    fn handle_purchase(&self, quantity: i64) -> DomainResult<Vec<ProductEvent>> {
        ensure_order_quantity(quantity)?;

        if let ProductKind::Capped { max_per_order } = self.kind {
            if quantity > max_per_order {
                return Err(DomainError::quantity_limit(quantity, max_per_order));
            }
        }

        if self.kind.tracks_stock() && quantity > self.quantity {
            return Err(DomainError::insufficient_stock(quantity, self.quantity));
        }

        if !self.active {
            return Err(DomainError::inactive(&self.name));
        }

        let mut events = vec![ProductEvent::Purchased {
            quantity,
            total: self.charge_for(quantity),
        }];
        if self.kind.tracks_stock() {
            events.push(ProductEvent::StockReduced { amount: quantity });
        }
        Ok(events)
    }
}

fn ensure_price(unit_price: f64) -> DomainResult<()> {
    if !(unit_price.is_finite() && unit_price > 0.0) {
        return Err(DomainError::validation(format!(
            "price must be greater than 0, got {unit_price}"
        )));
    }
    Ok(())
}

fn ensure_stock_level(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation(format!(
            "quantity cannot be negative, got {quantity}"
        )));
    }
    Ok(())
}

fn ensure_order_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation(format!(
            "quantity must be greater than 0, got {quantity}"
        )));
    }
    Ok(())
}
