//! Handler modules registered by convention.

use pledge_ledger::microsvc::{self, handlers, HandlerError, Service, Session};
use pledge_ledger::{InMemoryModelStore, Ledger, LedgerConfig};
use serde_json::json;

#[test]
fn ledger_service_registers_every_command() {
    let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
    let service = microsvc::ledger_service(ledger);
    assert_eq!(
        service.commands(),
        vec!["pledge.submit", "wallet.get", "wallet.provision"]
    );
}

#[test]
fn register_handlers_macro_builds_a_subset() {
    let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
    let service = pledge_ledger::register_handlers!(
        Service::new(ledger),
        handlers::wallet_get,
        handlers::wallet_provision,
    );

    assert_eq!(service.commands(), vec!["wallet.get", "wallet.provision"]);
    let err = service
        .dispatch("pledge.submit", json!({}), Session::for_user("investor-1"))
        .unwrap_err();
    assert!(matches!(err, HandlerError::UnknownCommand(_)));
}

#[test]
fn guard_rejects_missing_fields() {
    let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
    let service = microsvc::ledger_service(ledger);

    let err = service
        .dispatch(
            "pledge.submit",
            json!({ "campaignId": "c1" }),
            Session::for_user("investor-1"),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::GuardRejected(ref name) if name == "pledge.submit"));
}
