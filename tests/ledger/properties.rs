//! Property tests: money is conserved for arbitrary pledge sequences.

use proptest::prelude::*;
use pledge_ledger::{ErrorCode, Pledge};
use rust_decimal::Decimal;

use crate::support::{balance, count, raised, seeded, CAMPAIGN, INVESTOR};

/// Amounts in cents, so the decimals carry two places.
fn cents(raw: i64) -> Decimal {
    Decimal::new(raw, 2)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn balance_plus_raised_is_conserved(
        initial in 0i64..=200_000,
        amounts in prop::collection::vec(-5_000i64..=80_000, 1..12),
    ) {
        let start = cents(initial);
        let ledger = seeded(if start > Decimal::ZERO { start } else { Decimal::ONE });
        let start = balance(&ledger, INVESTOR);

        let mut committed = Decimal::ZERO;
        let mut accepted = 0usize;
        for raw in amounts {
            let amount = cents(raw);
            let before = balance(&ledger, INVESTOR);
            match ledger.submissions().submit_pledge(Some(INVESTOR), INVESTOR, CAMPAIGN, amount) {
                Ok(_) => {
                    prop_assert!(amount > Decimal::ZERO);
                    prop_assert!(amount <= before);
                    committed += amount;
                    accepted += 1;
                }
                Err(err) => {
                    prop_assert!(matches!(
                        err.code(),
                        ErrorCode::InvalidArgument | ErrorCode::FailedPrecondition
                    ));
                    prop_assert_eq!(balance(&ledger, INVESTOR), before);
                }
            }
            prop_assert!(balance(&ledger, INVESTOR) >= Decimal::ZERO);
        }

        ledger.outbox_worker().drain_until_idle(ledger.store()).unwrap();

        prop_assert_eq!(balance(&ledger, INVESTOR) + committed, start);
        prop_assert_eq!(raised(&ledger, CAMPAIGN), committed);
        prop_assert_eq!(count::<Pledge, _>(ledger.store()), accepted);
    }

    #[test]
    fn reconciling_any_number_of_times_applies_once(redeliveries in 1usize..6) {
        let ledger = seeded(Decimal::new(50_000, 2));
        let pledge_id = ledger
            .submissions()
            .submit_pledge(Some(INVESTOR), INVESTOR, CAMPAIGN, Decimal::new(30_000, 2))
            .unwrap();
        let event = crate::support::pledge(&ledger, &pledge_id);

        for _ in 0..redeliveries {
            ledger.reconciler().reconcile(&event).unwrap();
        }
        ledger.outbox_worker().drain_until_idle(ledger.store()).unwrap();

        prop_assert_eq!(raised(&ledger, CAMPAIGN), Decimal::new(30_000, 2));
    }
}
