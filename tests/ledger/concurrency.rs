//! Concurrent submissions against shared wallets and campaigns.

use std::sync::{Arc, Barrier};
use std::thread;

use pledge_ledger::{
    ErrorCode, InMemoryModelStore, Ledger, LedgerConfig, ModelStore, OutboxMessage, Pledge,
    Wallet, INSUFFICIENT_BALANCE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::support::{
    balance, count, ledger_with, raised, seed_campaign, seed_wallet, ConflictingStore, CAMPAIGN,
    INVESTOR,
};

fn submit_concurrently(
    ledger: &Ledger<InMemoryModelStore>,
    submissions: Vec<(&'static str, Decimal)>,
) -> Vec<Result<String, pledge_ledger::LedgerError>> {
    let barrier = Arc::new(Barrier::new(submissions.len()));
    let handles: Vec<_> = submissions
        .into_iter()
        .map(|(investor, amount)| {
            let ledger = ledger.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ledger
                    .submissions()
                    .submit_pledge(Some(investor), investor, CAMPAIGN, amount)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn contended() -> Ledger<InMemoryModelStore> {
    let ledger = ledger_with(
        LedgerConfig::default()
            .with_max_attempts(50)
            .with_backoff_ms(1, 5),
    );
    seed_campaign(&ledger, CAMPAIGN, dec!(100));
    ledger
}

#[test]
fn concurrent_pledges_on_one_campaign_sum_exactly() {
    let ledger = contended();
    seed_wallet(&ledger, "investor-a", dec!(500));
    seed_wallet(&ledger, "investor-b", dec!(500));

    let results = submit_concurrently(
        &ledger,
        vec![("investor-a", dec!(100)), ("investor-b", dec!(150))],
    );
    assert!(results.iter().all(Result::is_ok));

    ledger
        .outbox_worker()
        .drain_until_idle(ledger.store())
        .unwrap();

    assert_eq!(raised(&ledger, CAMPAIGN), dec!(250));
    assert_eq!(balance(&ledger, "investor-a"), dec!(400));
    assert_eq!(balance(&ledger, "investor-b"), dec!(350));
}

#[test]
fn same_wallet_cannot_be_overdrawn() {
    let ledger = contended();
    seed_wallet(&ledger, INVESTOR, dec!(500));

    let results = submit_concurrently(
        &ledger,
        vec![(INVESTOR, dec!(300)), (INVESTOR, dec!(300))],
    );

    let committed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1);
    let rejected = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(rejected.message(), INSUFFICIENT_BALANCE);

    assert_eq!(balance(&ledger, INVESTOR), dec!(200));
    assert_eq!(count::<Pledge, _>(ledger.store()), 1);
    assert_eq!(count::<OutboxMessage, _>(ledger.store()), 1);
}

#[test]
fn many_writers_keep_money_conserved() {
    let ledger = contended();
    let investors: Vec<&'static str> = vec!["i-0", "i-1", "i-2", "i-3", "i-4", "i-5", "i-6", "i-7"];
    for investor in &investors {
        seed_wallet(&ledger, investor, dec!(1000));
    }

    // Every investor submits three pledges: two from each thread share a wallet.
    let submissions: Vec<(&'static str, Decimal)> = investors
        .iter()
        .flat_map(|investor| [(*investor, dec!(200)), (*investor, dec!(300)), (*investor, dec!(400))])
        .collect();
    let results = submit_concurrently(&ledger, submissions);
    assert!(results.iter().all(Result::is_ok), "{results:?}");

    let worker_store = ledger.store().clone();
    let reconcilers: Vec<_> = (0..3)
        .map(|n| {
            let mut worker = ledger
                .outbox_worker()
                .with_worker_id(format!("worker-{n}"))
                .with_batch_size(2);
            let store = worker_store.clone();
            thread::spawn(move || worker.drain_until_idle(&store).unwrap())
        })
        .collect();
    let completed: usize = reconcilers
        .into_iter()
        .map(|h| h.join().unwrap().completed)
        .sum();
    assert_eq!(completed, investors.len() * 3);

    assert_eq!(raised(&ledger, CAMPAIGN), dec!(900) * Decimal::from(investors.len()));
    for investor in &investors {
        assert_eq!(balance(&ledger, investor), dec!(100));
    }
    let audit = ledger.audit().audit_campaign(CAMPAIGN).unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.unapplied, 0);
}

#[test]
fn exhausted_retries_surface_unavailable_without_writes() {
    let base = InMemoryModelStore::new();
    let seeding = Ledger::new(base.clone(), LedgerConfig::default());
    seed_campaign(&seeding, CAMPAIGN, dec!(100));
    seed_wallet(&seeding, INVESTOR, dec!(500));

    let store = ConflictingStore::new(base);
    let ledger = Ledger::new(
        store.clone(),
        LedgerConfig::default()
            .with_max_attempts(3)
            .with_backoff_ms(0, 0),
    );

    let err = ledger
        .submissions()
        .submit_pledge(Some(INVESTOR), INVESTOR, CAMPAIGN, dec!(300))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Unavailable);
    assert_eq!(store.commits(), 3);
    assert_eq!(
        store.inner().get_model::<Wallet>(INVESTOR).unwrap().unwrap().data.live_balance,
        dec!(500)
    );
    assert_eq!(count::<Pledge, _>(store.inner()), 0);
    assert_eq!(count::<OutboxMessage, _>(store.inner()), 0);
}
