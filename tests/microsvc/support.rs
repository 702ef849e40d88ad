//! Shared fixtures for the callable surface.

#![allow(dead_code)]

use pledge_ledger::microsvc::{self, Service};
use pledge_ledger::{InMemoryModelStore, Ledger, LedgerConfig, NewCampaign, RiskLevel};
use rust_decimal_macros::dec;

pub const INVESTOR: &str = "investor-1";
pub const CAMPAIGN: &str = "campaign-1";

/// A ledger service over a store holding one campaign (minimum 100) and one
/// investor with 500 of live funds.
pub fn seeded_service() -> Service<InMemoryModelStore> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
    ledger
        .campaigns()
        .create(
            "owner-1",
            NewCampaign {
                id: Some(CAMPAIGN.into()),
                title: "Corner bakery".into(),
                category: "commercial".into(),
                address: "3 Market St".into(),
                risk_level: RiskLevel::Low,
                apr: dec!(6),
                term_months: 12,
                goal: dec!(50000),
                min_investment: dec!(100),
            },
        )
        .unwrap();
    ledger.wallets().credit_live(INVESTOR, dec!(500)).unwrap();

    microsvc::ledger_service(ledger)
}
