//! Monetary rounding.
//!
//! Amounts are plain `f64` in a single implicit currency. They are kept at full
//! precision while promotions are evaluated and rounded once, to two decimal
//! places, when a quote or a purchase total is finalized.

/// Round an amount to two decimal places (half away from zero).
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_cents(87.5), 87.5);
        assert_eq!(round_cents(10.004), 10.0);
        assert_eq!(round_cents(10.005_1), 10.01);
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: rounding is idempotent.
            #[test]
            fn rounding_is_idempotent(amount in 0.0f64..1_000_000.0) {
                let once = round_cents(amount);
                prop_assert_eq!(round_cents(once), once);
            }

            /// Property: rounding moves an amount by at most half a cent.
            #[test]
            fn rounding_stays_within_half_a_cent(amount in 0.0f64..1_000_000.0) {
                prop_assert!((round_cents(amount) - amount).abs() <= 0.005 + 1e-9);
            }
        }
    }
}
