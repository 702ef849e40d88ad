//! The ledger commands dispatched through a service.

use pledge_ledger::microsvc::{CommandRequest, HandlerError, Session, USER_ID};
use pledge_ledger::ErrorCode;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;

use crate::support::{seeded_service, CAMPAIGN, INVESTOR};

#[test]
fn pledge_submit_debits_and_returns_id() {
    let service = seeded_service();

    let result = service
        .dispatch(
            "pledge.submit",
            json!({ "campaignId": CAMPAIGN, "amount": 300 }),
            Session::for_user(INVESTOR),
        )
        .unwrap();

    let pledge_id = result["pledgeId"].as_str().unwrap();
    assert!(!pledge_id.is_empty());

    let wallet = service
        .dispatch("wallet.get", json!({}), Session::for_user(INVESTOR))
        .unwrap();
    assert_eq!(wallet["liveBalance"], "200");

    let ledger = service.ledger();
    ledger
        .outbox_worker()
        .drain_until_idle(ledger.store())
        .unwrap();
    assert_eq!(ledger.campaigns().get(CAMPAIGN).unwrap().unwrap().raised, dec!(300));
}

#[test]
fn pledge_submit_maps_rejections_to_codes() {
    let service = seeded_service();
    let cases = [
        (json!({ "campaignId": CAMPAIGN, "amount": 600 }), ErrorCode::FailedPrecondition, 400),
        (json!({ "campaignId": CAMPAIGN, "amount": 50 }), ErrorCode::FailedPrecondition, 400),
        (json!({ "campaignId": CAMPAIGN, "amount": 0 }), ErrorCode::InvalidArgument, 400),
        (json!({ "campaignId": CAMPAIGN, "amount": "lots" }), ErrorCode::InvalidArgument, 400),
        (json!({ "campaignId": "missing", "amount": 300 }), ErrorCode::NotFound, 404),
        (json!({ "amount": 300 }), ErrorCode::InvalidArgument, 400),
    ];

    for (input, code, status) in cases {
        let err = service
            .dispatch("pledge.submit", input.clone(), Session::for_user(INVESTOR))
            .unwrap_err();
        assert_eq!(err.code(), code, "{input}");
        assert_eq!(err.status_code(), status, "{input}");
    }

    let wallet = service.ledger().wallets().get(INVESTOR).unwrap().unwrap();
    assert_eq!(wallet.live_balance, dec!(500));
}

#[test]
fn pledge_submit_requires_the_caller() {
    let service = seeded_service();

    let err = service
        .dispatch(
            "pledge.submit",
            json!({ "campaignId": CAMPAIGN, "amount": 300 }),
            Session::new(),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthenticated);

    let err = service
        .dispatch(
            "pledge.submit",
            json!({ "campaignId": CAMPAIGN, "amount": 300, "investorId": INVESTOR }),
            Session::for_user("someone-else"),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::Ledger(_)));
    assert_eq!(err.status_code(), 401);
}

#[test]
fn error_body_carries_code_and_message() {
    let service = seeded_service();
    let mut vars = HashMap::new();
    vars.insert(USER_ID.to_string(), INVESTOR.to_string());

    let response = service.dispatch_request(&CommandRequest {
        command: "pledge.submit".into(),
        input: json!({ "campaignId": CAMPAIGN, "amount": 900 }),
        session_variables: vars,
    });

    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({ "error": { "code": "failed-precondition", "message": "insufficient balance" } })
    );
}

#[test]
fn wallet_get_does_not_provision() {
    let service = seeded_service();

    let wallet = service
        .dispatch("wallet.get", json!({}), Session::for_user("newcomer"))
        .unwrap();
    assert_eq!(wallet["userId"], "newcomer");
    assert_eq!(wallet["liveBalance"], "0");
    assert!(service.ledger().wallets().get("newcomer").unwrap().is_none());

    let provisioned = service
        .dispatch("wallet.provision", json!({}), Session::for_user("newcomer"))
        .unwrap();
    assert_eq!(provisioned["userId"], "newcomer");
    assert!(service.ledger().wallets().get("newcomer").unwrap().is_some());
}

#[test]
fn wallet_provision_keeps_existing_balance() {
    let service = seeded_service();
    let wallet = service
        .dispatch("wallet.provision", json!({}), Session::for_user(INVESTOR))
        .unwrap();
    assert_eq!(wallet["liveBalance"], "500");
}
