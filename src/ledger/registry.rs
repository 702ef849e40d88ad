use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::campaign::{
    Campaign, CampaignEdit, CampaignHistoryEntry, CampaignStatus, HistoryChange, NewCampaign,
};
use super::error::LedgerError;
use super::pledge::Pledge;
use crate::config::LedgerConfig;
use crate::model::{ModelStore, ModelsExt};
use crate::transaction::{run_transaction, Transaction, TransactionOptions};

/// Campaign creation and the audited admin edit path.
///
/// Every status change, field edit and deletion is committed together with a
/// [`CampaignHistoryEntry`] carrying the actor and their justification.
#[derive(Clone)]
pub struct CampaignRegistry<S> {
    store: S,
    options: TransactionOptions,
}

impl<S: ModelStore> CampaignRegistry<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            options: config.transaction_options(),
        }
    }

    pub fn get(&self, campaign_id: &str) -> Result<Option<Campaign>, LedgerError> {
        Ok(self.store.models::<Campaign>().load(campaign_id)?)
    }

    /// Create a draft campaign owned by `owner_id`.
    pub fn create(&self, owner_id: &str, input: NewCampaign) -> Result<Campaign, LedgerError> {
        require_actor(owner_id)?;
        input.validate()?;

        let id = input
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let campaign = input.into_campaign(id, owner_id);

        run_transaction(&self.store, &self.options, |tx| {
            if tx.get::<Campaign>(&campaign.id)?.is_some() {
                return Err(LedgerError::precondition(format!(
                    "campaign {} already exists",
                    campaign.id
                )));
            }
            tx.insert(&campaign)?;
            Ok(())
        })?;

        info!(campaign_id = %campaign.id, owner_id, "campaign created");
        Ok(campaign)
    }

    pub fn change_status(
        &self,
        actor_id: &str,
        campaign_id: &str,
        to: CampaignStatus,
        justification: &str,
    ) -> Result<Campaign, LedgerError> {
        require_actor(actor_id)?;
        require_justification(justification)?;

        let campaign = run_transaction(&self.store, &self.options, |tx| {
            let mut campaign = load(tx, campaign_id)?;
            let from = campaign.status;
            if !from.can_transition_to(to) {
                return Err(LedgerError::precondition(format!(
                    "cannot move campaign from {from:?} to {to:?}"
                )));
            }
            campaign.status = to;
            campaign.updated_at = Utc::now();

            let change = HistoryChange::Status { from, to };
            tx.set(&campaign)?;
            tx.insert(&entry(campaign_id, actor_id, change, justification))?;
            Ok(campaign)
        })?;

        info!(campaign_id, actor_id, status = ?to, "campaign status changed");
        Ok(campaign)
    }

    /// Edit one descriptive or financial field. `raised` cannot be edited.
    pub fn edit(
        &self,
        actor_id: &str,
        campaign_id: &str,
        edit: CampaignEdit,
        justification: &str,
    ) -> Result<Campaign, LedgerError> {
        require_actor(actor_id)?;
        require_justification(justification)?;
        let field = edit.field();

        let campaign = run_transaction(&self.store, &self.options, |tx| {
            let mut campaign = load(tx, campaign_id)?;
            let (from, to) = edit.clone().apply(&mut campaign)?;
            let change = HistoryChange::Field {
                field: field.to_string(),
                from,
                to,
            };

            tx.set(&campaign)?;
            tx.insert(&entry(campaign_id, actor_id, change, justification))?;
            Ok::<_, LedgerError>(campaign)
        })?;

        info!(campaign_id, actor_id, field, "campaign edited");
        Ok(campaign)
    }

    /// Delete a campaign that has no outstanding live pledges.
    ///
    /// The outstanding-pledge check is a query outside the delete's
    /// transaction, so it is best-effort against concurrent submissions: a
    /// pledge committed between the check and the delete is left orphaned.
    /// Orphans show up in [`LedgerAudit::orphaned_pledges`] and are settled
    /// with [`LedgerAudit::refund_orphaned_pledge`].
    ///
    /// [`LedgerAudit::orphaned_pledges`]: super::LedgerAudit::orphaned_pledges
    /// [`LedgerAudit::refund_orphaned_pledge`]: super::LedgerAudit::refund_orphaned_pledge
    pub fn delete(
        &self,
        actor_id: &str,
        campaign_id: &str,
        justification: &str,
    ) -> Result<(), LedgerError> {
        require_actor(actor_id)?;
        require_justification(justification)?;

        let outstanding = self.store.models::<Pledge>().find(&|pledge: &Pledge| {
            pledge.campaign_id == campaign_id && pledge.is_outstanding()
        })?;
        if !outstanding.is_empty() {
            return Err(LedgerError::precondition(format!(
                "campaign has {} unreconciled pledge(s)",
                outstanding.len()
            )));
        }

        run_transaction(&self.store, &self.options, |tx| {
            load(tx, campaign_id)?;
            tx.delete::<Campaign>(campaign_id)?;
            tx.insert(&entry(campaign_id, actor_id, HistoryChange::Deleted, justification))?;
            Ok::<_, LedgerError>(())
        })?;

        info!(campaign_id, actor_id, "campaign deleted");
        Ok(())
    }

    /// Admin history of a campaign, oldest first.
    pub fn history(&self, campaign_id: &str) -> Result<Vec<CampaignHistoryEntry>, LedgerError> {
        Ok(self.store.models::<CampaignHistoryEntry>().list_by(
            &|entry: &CampaignHistoryEntry| entry.campaign_id == campaign_id,
            |entry| (entry.at, entry.id.clone()),
        )?)
    }
}

fn load<S: ModelStore>(
    tx: &mut Transaction<'_, S>,
    campaign_id: &str,
) -> Result<Campaign, LedgerError> {
    tx.get::<Campaign>(campaign_id)?
        .ok_or_else(|| LedgerError::NotFound(format!("campaign {campaign_id}")))
}

fn entry(
    campaign_id: &str,
    actor_id: &str,
    change: HistoryChange,
    justification: &str,
) -> CampaignHistoryEntry {
    CampaignHistoryEntry {
        id: Uuid::new_v4().to_string(),
        campaign_id: campaign_id.to_string(),
        actor_id: actor_id.to_string(),
        change,
        justification: justification.trim().to_string(),
        at: Utc::now(),
    }
}

pub(crate) fn require_actor(actor_id: &str) -> Result<(), LedgerError> {
    if actor_id.trim().is_empty() {
        return Err(LedgerError::Unauthenticated("an acting user is required".into()));
    }
    Ok(())
}

pub(crate) fn require_justification(justification: &str) -> Result<(), LedgerError> {
    if justification.trim().is_empty() {
        return Err(LedgerError::invalid("a justification is required"));
    }
    Ok(())
}
