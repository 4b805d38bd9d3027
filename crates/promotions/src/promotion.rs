use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, ValueObject};

/// The pricing strategy behind a promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionRule {
    /// Flat percentage off the whole line, `percent` in `(0, 100]`.
    PercentDiscount { percent: f64 },
    /// Within every pair of units, the second one is half price.
    SecondHalfPrice,
    /// Every third unit is free.
    ThirdOneFree,
}

impl PromotionRule {
    /// Total charge for `quantity` units at `unit_price` under this rule.
    ///
    /// Not rounded; rounding happens once the owning product finalizes a
    /// quote or purchase. Non-positive quantities charge nothing.
    pub fn apply(&self, unit_price: f64, quantity: i64) -> f64 {
        let quantity = quantity.max(0);
        match self {
            PromotionRule::PercentDiscount { percent } => {
                unit_price * quantity as f64 * (1.0 - percent / 100.0)
            }
            PromotionRule::SecondHalfPrice => {
                let pairs = (quantity / 2) as f64;
                let remainder = (quantity % 2) as f64;
                pairs * 1.5 * unit_price + remainder * unit_price
            }
            PromotionRule::ThirdOneFree => {
                let paid_units = (quantity / 3) * 2 + quantity % 3;
                paid_units as f64 * unit_price
            }
        }
    }
}

/// A named promotion that can be attached to any number of products.
///
/// Deserialization goes through [`Promotion::new`], so a decoded promotion is
/// as valid as a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPromotion")]
pub struct Promotion {
    name: String,
    rule: PromotionRule,
}

impl ValueObject for Promotion {}

#[derive(Deserialize)]
struct RawPromotion {
    name: String,
    rule: PromotionRule,
}

impl TryFrom<RawPromotion> for Promotion {
    type Error = DomainError;

    fn try_from(raw: RawPromotion) -> DomainResult<Self> {
        Promotion::new(raw.name, raw.rule)
    }
}

impl Promotion {
    pub fn new(name: impl Into<String>, rule: PromotionRule) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("promotion name cannot be empty"));
        }
        if let PromotionRule::PercentDiscount { percent } = &rule {
            if !(*percent > 0.0 && *percent <= 100.0) {
                return Err(DomainError::validation(format!(
                    "discount percent must be in (0, 100], got {percent}"
                )));
            }
        }
        Ok(Self { name, rule })
    }

    pub fn percent_discount(name: impl Into<String>, percent: f64) -> DomainResult<Self> {
        Self::new(name, PromotionRule::PercentDiscount { percent })
    }

    pub fn second_half_price(name: impl Into<String>) -> DomainResult<Self> {
        Self::new(name, PromotionRule::SecondHalfPrice)
    }

    pub fn third_one_free(name: impl Into<String>) -> DomainResult<Self> {
        Self::new(name, PromotionRule::ThirdOneFree)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &PromotionRule {
        &self.rule
    }

    /// Total charge for `quantity` units at `unit_price`.
    pub fn apply_promotion(&self, unit_price: f64, quantity: i64) -> f64 {
        self.rule.apply(unit_price, quantity)
    }
}

impl core::fmt::Display for Promotion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Best-for-buyer total across `promotions`: the minimum candidate, or the
/// undiscounted `unit_price * quantity` when there are none.
pub fn best_total<'a, I>(promotions: I, unit_price: f64, quantity: i64) -> f64
where
    I: IntoIterator<Item = &'a Promotion>,
{
    promotions
        .into_iter()
        .map(|promo| promo.apply_promotion(unit_price, quantity))
        .reduce(f64::min)
        .unwrap_or(unit_price * quantity as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializing_validates_like_construction() {
        let promo: Promotion = serde_json::from_str(
            r#"{"name":"30% off!","rule":{"type":"percent_discount","percent":30.0}}"#,
        )
        .unwrap();
        assert_eq!(promo, Promotion::percent_discount("30% off!", 30.0).unwrap());

        let err = serde_json::from_str::<Promotion>(
            r#"{"name":"bogus","rule":{"type":"percent_discount","percent":250.0}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("discount percent must be in (0, 100]"));

        assert!(
            serde_json::from_str::<Promotion>(r#"{"name":" ","rule":{"type":"third_one_free"}}"#)
                .is_err()
        );
    }

    #[test]
    fn third_one_free_charges_two_of_every_three() {
        let promo = Promotion::third_one_free("Third One Free!").unwrap();
        let totals: Vec<f64> = (0..10).map(|q| promo.apply_promotion(100.0, q)).collect();
        assert_eq!(
            totals,
            vec![0.0, 100.0, 200.0, 200.0, 300.0, 400.0, 400.0, 500.0, 600.0, 600.0]
        );
    }

    #[test]
    fn second_half_price_discounts_every_second_unit() {
        let promo = Promotion::second_half_price("Second Half price!").unwrap();
        assert_eq!(promo.apply_promotion(100.0, 1), 100.0);
        assert_eq!(promo.apply_promotion(100.0, 2), 150.0);
        assert_eq!(promo.apply_promotion(100.0, 3), 250.0);
        assert_eq!(promo.apply_promotion(100.0, 4), 300.0);
    }

    #[test]
    fn percent_discount_scales_the_line_total() {
        let promo = Promotion::percent_discount("30% off!", 30.0).unwrap();
        assert!((promo.apply_promotion(200.0, 3) - 420.0).abs() < 1e-9);
    }

    #[test]
    fn full_discount_is_free() {
        let promo = Promotion::percent_discount("On the house", 100.0).unwrap();
        assert_eq!(promo.apply_promotion(59.99, 4), 0.0);
    }

    #[test]
    fn percent_outside_range_is_rejected() {
        for percent in [0.0, -5.0, 100.5, f64::NAN] {
            let err = Promotion::percent_discount("bad", percent).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "percent {percent}");
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Promotion::third_one_free("  ").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn best_total_picks_the_cheapest_candidate() {
        let promos = vec![
            Promotion::second_half_price("Second Half price!").unwrap(),
            Promotion::third_one_free("Third One Free!").unwrap(),
        ];
        assert_eq!(best_total(&promos, 100.0, 3), 200.0);
        assert_eq!(best_total(&promos, 100.0, 2), 150.0);
    }

    #[test]
    fn best_total_without_promotions_is_undiscounted() {
        let none: Vec<Promotion> = Vec::new();
        assert_eq!(best_total(&none, 19.5, 4), 78.0);
    }

    #[test]
    fn displays_as_its_name() {
        let promo = Promotion::percent_discount("30% off!", 30.0).unwrap();
        assert_eq!(promo.to_string(), "30% off!");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_rule() -> impl Strategy<Value = PromotionRule> {
            prop_oneof![
                (0.01f64..=100.0).prop_map(|percent| PromotionRule::PercentDiscount { percent }),
                Just(PromotionRule::SecondHalfPrice),
                Just(PromotionRule::ThirdOneFree),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: a promotion never charges more than the undiscounted total, nor less than zero.
            #[test]
            fn never_exceeds_undiscounted_total(
                rule in any_rule(),
                unit_price in 0.01f64..10_000.0,
                quantity in 1i64..1_000,
            ) {
                let total = rule.apply(unit_price, quantity);
                prop_assert!(total >= 0.0);
                prop_assert!(total <= unit_price * quantity as f64 + 1e-6);
            }

            /// Property: best_total is never above any single candidate.
            #[test]
            fn best_total_is_a_lower_bound(
                rules in proptest::collection::vec(any_rule(), 1..4),
                unit_price in 0.01f64..10_000.0,
                quantity in 1i64..1_000,
            ) {
                let promos: Vec<Promotion> = rules
                    .into_iter()
                    .enumerate()
                    .map(|(i, rule)| Promotion::new(format!("promo {i}"), rule).unwrap())
                    .collect();
                let best = best_total(&promos, unit_price, quantity);
                for promo in &promos {
                    prop_assert!(best <= promo.apply_promotion(unit_price, quantity));
                }
            }
        }
    }
}
