use std::ops::Add;
use std::rc::Rc;

use storefront_core::{DomainError, DomainResult, round_cents};

use crate::order::{OrderFailure, OrderLine, OrderReceipt, ReceiptLine, SharedProduct};

/// An ordered catalog of products.
///
/// Products are held as shared handles, so the same product may appear in
/// several stores (or several times in one store) and a purchase through any
/// of them is visible through all.
#[derive(Debug, Clone)]
pub struct Store {
    products: Vec<SharedProduct>,
}

impl Store {
    /// Create a store from a non-empty product list.
    pub fn new(products: Vec<SharedProduct>) -> DomainResult<Self> {
        if products.is_empty() {
            return Err(DomainError::validation("a store needs at least one product"));
        }
        Ok(Self { products })
    }

    /// All products, in insertion order.
    pub fn products(&self) -> &[SharedProduct] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn add_product(&mut self, product: SharedProduct) {
        self.products.push(product);
    }

    /// Remove the first product matching `product` (see [`Store::contains`]).
    pub fn remove_product(&mut self, product: &SharedProduct) -> DomainResult<()> {
        let index = self
            .products
            .iter()
            .position(|p| same_product(p, product))
            .ok_or_else(|| DomainError::not_found(product.borrow().name().to_string()))?;
        self.products.remove(index);
        Ok(())
    }

    /// Membership by shared handle first, then by value.
    ///
    /// Value matches compare identity and current state, so a clone still
    /// matches after history-only changes but not after a stock or price change.
    pub fn contains(&self, product: &SharedProduct) -> bool {
        self.products.iter().any(|p| same_product(p, product))
    }

    /// Units in stock across the catalog. Unlimited products contribute 0.
    ///
    /// Saturates at `i64::MAX`.
    pub fn total_quantity(&self) -> i64 {
        self.products
            .iter()
            .fold(0i64, |total, p| total.saturating_add(p.borrow().quantity()))
    }

    /// Active products, in store order.
    pub fn list_active(&self) -> Vec<SharedProduct> {
        self.products
            .iter()
            .filter(|p| p.borrow().is_active())
            .cloned()
            .collect()
    }

    /// Price an order without buying anything.
    ///
    /// Lines need not belong to this store.
    pub fn quote_order(&self, lines: &[OrderLine]) -> DomainResult<f64> {
        let mut total = 0.0;
        for line in lines {
            total += line.product.borrow().quote_price(line.quantity)?;
        }
        Ok(round_cents(total))
    }

    /// Purchase each line in order.
    ///
    /// There is no rollback: when a line fails, the lines before it stay
    /// purchased and are reported on the returned [`OrderFailure`].
    pub fn place_order(&self, lines: &[OrderLine]) -> Result<OrderReceipt, OrderFailure> {
        tracing::info!("placing order with {} line(s)", lines.len());

        let mut receipt = OrderReceipt::default();
        for (index, line) in lines.iter().enumerate() {
            let line_no = index as u32 + 1;
            let mut product = line.product.borrow_mut();
            match product.purchase(line.quantity) {
                Ok(total) => {
                    tracing::debug!(
                        "order line {} committed: {} x {} = {:.2}",
                        line_no,
                        line.quantity,
                        product.name(),
                        total
                    );
                    receipt.push(ReceiptLine {
                        line_no,
                        product_id: product.id_typed(),
                        name: product.name().to_string(),
                        quantity: line.quantity,
                        total,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        "order line {} ({}) failed after {} committed line(s): {}",
                        line_no,
                        product.name(),
                        receipt.lines().len(),
                        err
                    );
                    return Err(OrderFailure::new(line_no, receipt, err));
                }
            }
        }

        tracing::info!("order placed, total {:.2}", receipt.total());
        Ok(receipt)
    }

    /// A new store holding this store's products followed by `other`'s.
    ///
    /// No deduplication; handles are shared, not copied.
    pub fn combine(&self, other: &Store) -> Store {
        let mut products = Vec::with_capacity(self.products.len() + other.products.len());
        products.extend(self.products.iter().cloned());
        products.extend(other.products.iter().cloned());
        Store { products }
    }
}

impl Add<&Store> for &Store {
    type Output = Store;

    fn add(self, other: &Store) -> Store {
        self.combine(other)
    }
}

fn same_product(a: &SharedProduct, b: &SharedProduct) -> bool {
    Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::shared;
    use storefront_products::Product;
    use storefront_promotions::Promotion;

    fn mac() -> SharedProduct {
        shared(Product::standard("MacBook Air M2", 1450.0, 100).unwrap())
    }

    fn bose() -> SharedProduct {
        shared(Product::standard("Bose QuietComfort Earbuds", 250.0, 500).unwrap())
    }

    fn pixel() -> SharedProduct {
        shared(Product::capped("Google Pixel 7", 500.0, 250, 1).unwrap())
    }

    fn license() -> SharedProduct {
        shared(Product::unlimited("Windows License", 125.0).unwrap())
    }

    #[test]
    fn store_requires_products() {
        let err = Store::new(Vec::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn add_and_remove_products() {
        let (a, b) = (mac(), bose());
        let mut store = Store::new(vec![Rc::clone(&a)]).unwrap();

        store.add_product(Rc::clone(&b));
        assert_eq!(store.len(), 2);
        assert!(store.contains(&b));

        store.remove_product(&a).unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&a));

        let err = store.remove_product(&a).unwrap_err();
        assert_eq!(err, DomainError::not_found("MacBook Air M2"));
    }

    #[test]
    fn remove_takes_only_the_first_duplicate() {
        let a = mac();
        let mut store = Store::new(vec![Rc::clone(&a), bose(), Rc::clone(&a)]).unwrap();
        store.remove_product(&a).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains(&a));
        assert!(Rc::ptr_eq(&store.products()[1], &a));
    }

    #[test]
    fn contains_matches_by_handle_or_value() {
        let a = mac();
        let store = Store::new(vec![Rc::clone(&a)]).unwrap();

        assert!(store.contains(&a));
        let copy = shared(a.borrow().clone());
        assert!(store.contains(&copy));
        assert!(!store.contains(&mac()));
        assert!(!store.contains(&pixel()));
    }

    #[test]
    fn total_quantity_ignores_unlimited_products() {
        let store = Store::new(vec![mac(), bose(), license()]).unwrap();
        assert_eq!(store.total_quantity(), 600);
    }

    #[test]
    fn total_quantity_saturates_instead_of_overflowing() {
        let (a, b) = (mac(), bose());
        a.borrow_mut().set_quantity(i64::MAX).unwrap();
        b.borrow_mut().set_quantity(i64::MAX - 1).unwrap();
        let store = Store::new(vec![a, b, license()]).unwrap();
        assert_eq!(store.total_quantity(), i64::MAX);
    }

    #[test]
    fn contains_by_value_survives_history_only_changes() {
        let a = mac();
        let store = Store::new(vec![Rc::clone(&a)]).unwrap();
        let earlier = shared(a.borrow().clone());

        a.borrow_mut().deactivate();
        a.borrow_mut().activate();
        assert!(store.contains(&earlier));

        a.borrow_mut().purchase(1).unwrap();
        assert!(!store.contains(&earlier));
    }

    #[test]
    fn list_active_keeps_store_order() {
        let (a, b, c) = (mac(), bose(), pixel());
        let store = Store::new(vec![Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)]).unwrap();
        b.borrow_mut().deactivate();

        let active = store.list_active();
        assert_eq!(active.len(), 2);
        assert!(Rc::ptr_eq(&active[0], &a));
        assert!(Rc::ptr_eq(&active[1], &c));
    }

    #[test]
    fn quote_order_applies_promotions_and_leaves_stock() {
        let a = mac();
        a.borrow_mut()
            .add_promotion(Promotion::second_half_price("Second Half price!").unwrap());
        let store = Store::new(vec![Rc::clone(&a)]).unwrap();
        let outsider = bose();

        let quote = store
            .quote_order(&[OrderLine::new(&a, 2), OrderLine::new(&outsider, 1)])
            .unwrap();
        assert_eq!(quote, 2175.0 + 250.0);
        assert_eq!(a.borrow().quantity(), 100);
        assert_eq!(outsider.borrow().quantity(), 500);
    }

    #[test]
    fn quote_order_surfaces_line_errors() {
        let a = mac();
        a.borrow_mut().deactivate();
        let store = Store::new(vec![Rc::clone(&a)]).unwrap();
        let err = store.quote_order(&[OrderLine::new(&a, 1)]).unwrap_err();
        assert_eq!(err, DomainError::inactive("MacBook Air M2"));
    }

    #[test]
    fn place_order_charges_like_quote_order() {
        let (a, b) = (mac(), bose());
        b.borrow_mut()
            .add_promotion(Promotion::third_one_free("Third One Free!").unwrap());
        let store = Store::new(vec![Rc::clone(&a), Rc::clone(&b)]).unwrap();
        let lines = [OrderLine::new(&a, 1), OrderLine::new(&b, 3)];

        let quote = store.quote_order(&lines).unwrap();
        let receipt = store.place_order(&lines).unwrap();

        assert_eq!(receipt.total(), quote);
        assert_eq!(receipt.total(), 1450.0 + 500.0);
        assert_eq!(receipt.lines().len(), 2);
        assert_eq!(a.borrow().quantity(), 99);
        assert_eq!(b.borrow().quantity(), 497);
    }

    #[test]
    fn place_order_keeps_earlier_lines_on_failure() {
        let (a, b) = (mac(), bose());
        let store = Store::new(vec![Rc::clone(&a), Rc::clone(&b)]).unwrap();

        let failure = store
            .place_order(&[OrderLine::new(&a, 2), OrderLine::new(&b, 999)])
            .unwrap_err();

        assert_eq!(failure.line_no(), 2);
        assert_eq!(failure.error(), &DomainError::insufficient_stock(999, 500));
        assert_eq!(failure.committed().total(), 2900.0);
        assert_eq!(a.borrow().quantity(), 98);
        assert_eq!(b.borrow().quantity(), 500);
    }

    #[test]
    fn place_order_can_buy_the_same_product_twice() {
        let a = mac();
        let store = Store::new(vec![Rc::clone(&a)]).unwrap();
        let receipt = store
            .place_order(&[OrderLine::new(&a, 1), OrderLine::new(&a, 1)])
            .unwrap();
        assert_eq!(receipt.total(), 2900.0);
        assert_eq!(a.borrow().quantity(), 98);
    }

    #[test]
    fn combine_concatenates_without_dedup() {
        let (a, b, c, d) = (mac(), bose(), pixel(), license());
        let left = Store::new(vec![Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)]).unwrap();
        let right = Store::new(vec![Rc::clone(&d)]).unwrap();

        let combined = left.combine(&right);
        assert_eq!(combined.len(), 4);
        for (p, expected) in combined.products().iter().zip([&a, &b, &c, &d]) {
            assert!(Rc::ptr_eq(p, expected));
        }

        let doubled = &left + &left;
        assert_eq!(doubled.len(), 6);
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn combined_stores_share_product_state() {
        let a = mac();
        let left = Store::new(vec![Rc::clone(&a)]).unwrap();
        let right = Store::new(vec![bose()]).unwrap();
        let combined = &left + &right;

        combined.place_order(&[OrderLine::new(&a, 5)]).unwrap();
        assert_eq!(left.total_quantity(), 95);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 200,
                ..ProptestConfig::default()
            })]

            /// Property: an order that succeeds is charged exactly its quote and
            /// takes exactly the ordered units out of the catalog.
            #[test]
            fn placed_order_matches_its_quote(
                quantities in proptest::collection::vec(1i64..20, 1..6),
            ) {
                let a = mac();
                a.borrow_mut()
                    .add_promotion(Promotion::second_half_price("Second Half price!").unwrap());
                let b = bose();
                b.borrow_mut()
                    .add_promotion(Promotion::third_one_free("Third One Free!").unwrap());
                let store = Store::new(vec![Rc::clone(&a), Rc::clone(&b), license()]).unwrap();

                let lines: Vec<OrderLine> = quantities
                    .iter()
                    .enumerate()
                    .map(|(i, q)| OrderLine::new(&store.products()[i % 3], *q))
                    .collect();
                let before = store.total_quantity();
                let stocked: i64 = lines
                    .iter()
                    .filter(|l| l.product.borrow().kind().tracks_stock())
                    .map(|l| l.quantity)
                    .sum();

                let quote = store.quote_order(&lines).unwrap();
                let receipt = store.place_order(&lines).unwrap();
                prop_assert_eq!(receipt.total(), quote);
                prop_assert_eq!(receipt.lines().len(), lines.len());
                prop_assert_eq!(store.total_quantity(), before - stocked);
            }
        }
    }
}
