//! Campaign funding protocol.
//!
//! Given a funding request, decides how many of the requested recipients the
//! payer can afford and applies the whole funding — campaign row, ledger
//! debit and journal entry — as a single database transaction. A failure at
//! any point rolls everything back: there is no partial campaign, no partial
//! debit and no orphaned journal row.

use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Campaign, EngineError, EntryKind, FundCampaignCmd, FundingPolicy, JournalEntry, ResultEngine,
    accounts, campaigns, journal,
    util::{normalize_recipients, normalize_required_text},
};

use super::{Engine, with_tx};

/// What a funding request actually bought.
///
/// `funded_count < requested_count` is a partial success, not an error: the
/// campaign exists with the first `funded_count` recipients and the rest
/// were dropped. Only the count of dropped recipients is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingOutcome {
    pub campaign_id: Uuid,
    pub transaction_id: Uuid,
    pub requested_count: usize,
    pub funded_count: usize,
    pub excluded_count: usize,
    /// Points actually taken off the payer's balance (0 for unmetered payers).
    pub points_deducted: i64,
    pub remaining_balance: i64,
}

impl Engine {
    /// Fund and persist a campaign against the payer's balance.
    ///
    /// The funded recipients are always a prefix of the request: the first
    /// `funded_count` entries in the submitted order, never a sample. A
    /// metered payer with zero balance gets [`EngineError::InsufficientBalance`]
    /// and nothing is persisted. An unmetered payer is funded in full
    /// whatever its balance holds.
    ///
    /// Calling this twice with identical input funds two distinct campaigns
    /// and debits the balance twice; there is no idempotency key in this
    /// flow.
    pub async fn fund_campaign(&self, cmd: FundCampaignCmd) -> ResultEngine<FundingOutcome> {
        let name = normalize_required_text(&cmd.name, "campaign name")?;
        let message = normalize_required_text(&cmd.message, "message")?;
        let country_code = normalize_required_text(&cmd.country_code, "country code")?;
        let recipients = normalize_recipients(&cmd.recipients)?;
        let requested_count = recipients.len();

        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, &cmd.payer_id).await?;

            let policy = account.funding_policy();
            let funded_count = policy.fundable_count(requested_count);
            if funded_count == 0 {
                return Err(EngineError::InsufficientBalance(account.username.clone()));
            }

            let mut campaign = Campaign::new(
                name,
                message,
                country_code,
                recipients[..funded_count].to_vec(),
                account.username.clone(),
                cmd.created_at,
            )?;
            if let Some(button) = cmd.phone_button {
                campaign = campaign.phone_button(button);
            }
            if let Some(button) = cmd.link_button {
                campaign = campaign.link_button(button);
            }
            if let Some(media) = cmd.media {
                campaign = campaign.media(media);
            }
            campaigns::ActiveModel::try_from(&campaign)?
                .insert(&db_tx)
                .await?;

            let balance_before = account.balance;
            let balance_after = match policy {
                FundingPolicy::Unmetered => balance_before,
                FundingPolicy::Metered { .. } => balance_before - funded_count as i64,
            };

            let entry = JournalEntry::new(
                account.username.clone(),
                EntryKind::Debit,
                funded_count as i64,
                balance_before,
                balance_after,
                cmd.created_at,
            )?
            .campaign(campaign.id);
            journal::ActiveModel::from(&entry).insert(&db_tx).await?;

            // Guarded write: a concurrent debit that already moved the
            // balance makes this a no-op, and the whole unit of work aborts
            // instead of overspending the snapshot.
            let update = accounts::Entity::update_many()
                .col_expr(accounts::Column::Balance, Expr::value(balance_after))
                .col_expr(
                    accounts::Column::CampaignCount,
                    Expr::col(accounts::Column::CampaignCount).add(1),
                )
                .filter(accounts::Column::Username.eq(account.username.as_str()))
                .filter(accounts::Column::Balance.eq(balance_before))
                .exec(&db_tx)
                .await?;
            if update.rows_affected == 0 {
                return Err(EngineError::BalanceConflict(account.username));
            }

            Ok(FundingOutcome {
                campaign_id: campaign.id,
                transaction_id: entry.id,
                requested_count,
                funded_count,
                excluded_count: requested_count - funded_count,
                points_deducted: balance_before - balance_after,
                remaining_balance: balance_after,
            })
        })
    }
}
