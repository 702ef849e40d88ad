//! Campaign registry: status transitions, edits, deletion and history.

use pledge_ledger::{CampaignEdit, CampaignStatus, ErrorCode, HistoryChange, ModelsExt, Pledge};
use rust_decimal_macros::dec;

use crate::support::{ledger, new_campaign, seed_wallet, ADMIN, CAMPAIGN, INVESTOR, OWNER};

#[test]
fn created_campaigns_start_as_empty_drafts() {
    let ledger = ledger();
    let campaign = ledger
        .campaigns()
        .create(OWNER, new_campaign(CAMPAIGN, dec!(100)))
        .unwrap();

    assert_eq!(campaign.status, CampaignStatus::Draft);
    assert_eq!(campaign.raised, dec!(0));
    assert_eq!(campaign.owner_id, OWNER);

    let err = ledger
        .campaigns()
        .create(OWNER, new_campaign(CAMPAIGN, dec!(100)))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);
}

#[test]
fn generated_ids_when_none_given() {
    let ledger = ledger();
    let mut input = new_campaign(CAMPAIGN, dec!(0));
    input.id = None;

    let campaign = ledger.campaigns().create(OWNER, input).unwrap();
    assert!(!campaign.id.is_empty());
    assert!(ledger.campaigns().get(&campaign.id).unwrap().is_some());
}

#[test]
fn invalid_campaign_input_is_rejected() {
    let ledger = ledger();

    let mut blank = new_campaign(CAMPAIGN, dec!(100));
    blank.title = "  ".into();
    assert_eq!(
        ledger.campaigns().create(OWNER, blank).unwrap_err().code(),
        ErrorCode::InvalidArgument
    );

    let negative = new_campaign(CAMPAIGN, dec!(-1));
    assert_eq!(
        ledger.campaigns().create(OWNER, negative).unwrap_err().code(),
        ErrorCode::InvalidArgument
    );

    assert_eq!(
        ledger
            .campaigns()
            .create("", new_campaign(CAMPAIGN, dec!(100)))
            .unwrap_err()
            .code(),
        ErrorCode::Unauthenticated
    );
}

#[test]
fn status_lifecycle_is_recorded() {
    let ledger = ledger();
    let registry = ledger.campaigns();
    registry.create(OWNER, new_campaign(CAMPAIGN, dec!(100))).unwrap();

    registry
        .change_status(OWNER, CAMPAIGN, CampaignStatus::Pending, "ready for review")
        .unwrap();
    registry
        .change_status(ADMIN, CAMPAIGN, CampaignStatus::Active, "documents verified")
        .unwrap();
    let paused = registry
        .change_status(ADMIN, CAMPAIGN, CampaignStatus::Paused, "title dispute")
        .unwrap();
    assert_eq!(paused.status, CampaignStatus::Paused);

    let history = registry.history(CAMPAIGN).unwrap();
    let changes: Vec<_> = history.iter().map(|entry| entry.change.clone()).collect();
    assert_eq!(
        changes,
        vec![
            HistoryChange::Status {
                from: CampaignStatus::Draft,
                to: CampaignStatus::Pending
            },
            HistoryChange::Status {
                from: CampaignStatus::Pending,
                to: CampaignStatus::Active
            },
            HistoryChange::Status {
                from: CampaignStatus::Active,
                to: CampaignStatus::Paused
            },
        ]
    );
    assert_eq!(history[2].actor_id, ADMIN);
    assert_eq!(history[2].justification, "title dispute");
}

#[test]
fn illegal_transitions_and_missing_justification_write_nothing() {
    let ledger = ledger();
    let registry = ledger.campaigns();
    registry.create(OWNER, new_campaign(CAMPAIGN, dec!(100))).unwrap();

    let err = registry
        .change_status(ADMIN, CAMPAIGN, CampaignStatus::Archived, "skip ahead")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);

    let err = registry
        .change_status(ADMIN, CAMPAIGN, CampaignStatus::Pending, "   ")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let err = registry
        .change_status(ADMIN, "missing", CampaignStatus::Pending, "review")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    assert_eq!(
        registry.get(CAMPAIGN).unwrap().unwrap().status,
        CampaignStatus::Draft
    );
    assert!(registry.history(CAMPAIGN).unwrap().is_empty());
}

#[test]
fn field_edits_keep_before_and_after() {
    let ledger = ledger();
    let registry = ledger.campaigns();
    registry.create(OWNER, new_campaign(CAMPAIGN, dec!(100))).unwrap();

    let edited = registry
        .edit(ADMIN, CAMPAIGN, CampaignEdit::Goal(dec!(250000)), "appraisal came in higher")
        .unwrap();
    assert_eq!(edited.goal, dec!(250000));

    let err = registry
        .edit(ADMIN, CAMPAIGN, CampaignEdit::MinInvestment(dec!(-5)), "typo")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let history = registry.history(CAMPAIGN).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0].change,
        HistoryChange::Field {
            field: "goal".into(),
            from: "100000".into(),
            to: "250000".into(),
        }
    );
}

#[test]
fn edits_never_touch_raised() {
    let ledger = crate::support::seeded(dec!(500));
    ledger
        .submissions()
        .submit_pledge(Some(INVESTOR), INVESTOR, CAMPAIGN, dec!(300))
        .unwrap();
    ledger
        .outbox_worker()
        .drain_until_idle(ledger.store())
        .unwrap();

    let edited = ledger
        .campaigns()
        .edit(ADMIN, CAMPAIGN, CampaignEdit::Title("Riverside fourplex".into()), "rezoned")
        .unwrap();
    assert_eq!(edited.raised, dec!(300));
}

#[test]
fn delete_is_refused_while_pledges_are_unreconciled() {
    let ledger = crate::support::seeded(dec!(500));
    ledger
        .submissions()
        .submit_pledge(Some(INVESTOR), INVESTOR, CAMPAIGN, dec!(300))
        .unwrap();

    let err = ledger
        .campaigns()
        .delete(ADMIN, CAMPAIGN, "duplicate listing")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);
    assert!(ledger.campaigns().get(CAMPAIGN).unwrap().is_some());

    ledger
        .outbox_worker()
        .drain_until_idle(ledger.store())
        .unwrap();
    ledger
        .campaigns()
        .delete(ADMIN, CAMPAIGN, "duplicate listing")
        .unwrap();

    assert!(ledger.campaigns().get(CAMPAIGN).unwrap().is_none());
    let history = ledger.campaigns().history(CAMPAIGN).unwrap();
    assert_eq!(history.last().unwrap().change, HistoryChange::Deleted);
}

#[test]
fn pledge_landing_after_the_delete_check_is_refundable() {
    // The investor was already debited by a submission that committed after
    // the outstanding-pledge check ran.
    let ledger = crate::support::seeded(dec!(200));
    ledger
        .campaigns()
        .delete(ADMIN, CAMPAIGN, "duplicate listing")
        .unwrap();
    let late = Pledge::live("late", CAMPAIGN, INVESTOR, dec!(300));
    ledger.store().models::<Pledge>().insert(&late).unwrap();

    let orphans = ledger.audit().orphaned_pledges().unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, "late");

    let wallet = ledger
        .audit()
        .refund_orphaned_pledge(ADMIN, "late", "campaign deleted mid-submission")
        .unwrap();
    assert_eq!(wallet.live_balance, dec!(500));
    assert!(ledger.audit().orphaned_pledges().unwrap().is_empty());
}

#[test]
fn submission_does_not_depend_on_status() {
    let ledger = ledger();
    ledger
        .campaigns()
        .create(OWNER, new_campaign(CAMPAIGN, dec!(100)))
        .unwrap();
    seed_wallet(&ledger, INVESTOR, dec!(500));

    ledger
        .submissions()
        .submit_pledge(Some(INVESTOR), INVESTOR, CAMPAIGN, dec!(300))
        .unwrap();
}
