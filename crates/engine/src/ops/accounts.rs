//! Account provisioning, point grants and account reads.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Account, AccountRole, EngineError, EntryKind, FundingPolicy, GrantPointsCmd, JournalEntry,
    NewAccountCmd, ResultEngine, accounts, journal, util::normalize_required_text,
};

use super::{Engine, with_tx};

/// Result of a point grant: both journal entries plus the final balances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantOutcome {
    pub debit_id: Uuid,
    pub credit_id: Uuid,
    pub grantor_balance: i64,
    pub receiver_balance: i64,
}

impl Engine {
    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// Decrement an account's balance with a stale-read guard.
    async fn debit_guarded(
        &self,
        db: &DatabaseTransaction,
        username: &str,
        balance_before: i64,
        balance_after: i64,
    ) -> ResultEngine<()> {
        let update = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance_after))
            .filter(accounts::Column::Username.eq(username))
            .filter(accounts::Column::Balance.eq(balance_before))
            .exec(db)
            .await?;
        if update.rows_affected == 0 {
            return Err(EngineError::BalanceConflict(username.to_string()));
        }
        Ok(())
    }

    /// Return an account by its username.
    pub async fn account(&self, username: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// Return an account matching the given credentials, if any.
    ///
    /// Used by the server's auth layer; not an engine-level authorization
    /// primitive.
    pub async fn account_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> ResultEngine<Option<Account>> {
        let model = accounts::Entity::find_by_id(username.to_string())
            .filter(accounts::Column::Password.eq(password))
            .one(&self.database)
            .await?;
        model.map(Account::try_from).transpose()
    }

    /// Provision a new account under an existing one.
    ///
    /// Admin creates anything, resellers create users, users create nothing.
    /// A non-zero starting balance is paid by the actor under the same rules
    /// as [`Engine::grant_points`] and is journaled on both sides.
    pub async fn create_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let username = normalize_required_text(&cmd.username, "username")?;
        if cmd.password.is_empty() {
            return Err(EngineError::InvalidArgument(
                "password must not be empty".to_string(),
            ));
        }

        if cmd.balance < 0 {
            return Err(EngineError::InvalidArgument(
                "balance must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let actor = self.require_account(&db_tx, &cmd.actor_id).await?;
            if !actor.role.can_create(cmd.role) {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot create {} accounts",
                    actor.role.as_str(),
                    cmd.role.as_str()
                )));
            }

            if accounts::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }

            // Inserted empty; the starting balance lands as a journaled
            // grant, never as a direct write.
            let mut account = Account::new(
                username,
                cmd.password,
                cmd.role,
                0,
                Some(actor.username.clone()),
                cmd.created_at,
            )?;
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;

            if cmd.balance > 0 {
                let grant = self
                    .journal_grant(&db_tx, &actor, &account.username, 0, cmd.balance, cmd.created_at)
                    .await?;
                account.balance = grant.receiver_balance;
            }

            Ok(account)
        })
    }

    /// Move points from the grantor to the receiver.
    ///
    /// The grantor must be admin or the receiver's creator. A metered grantor
    /// pays out of its own balance; an unmetered grantor mints the points but
    /// still leaves a debit entry with an unchanged balance snapshot, so the
    /// journal stays complete.
    pub async fn grant_points(&self, cmd: GrantPointsCmd) -> ResultEngine<GrantOutcome> {
        if cmd.amount <= 0 {
            return Err(EngineError::InvalidArgument(
                "amount must be > 0".to_string(),
            ));
        }
        if cmd.grantor_id == cmd.receiver_id {
            return Err(EngineError::InvalidArgument(
                "grantor and receiver must differ".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let grantor = self.require_account(&db_tx, &cmd.grantor_id).await?;
            let receiver = self.require_account(&db_tx, &cmd.receiver_id).await?;

            let authorized = grantor.role == AccountRole::Admin
                || receiver.created_by.as_deref() == Some(grantor.username.as_str());
            if !authorized {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot grant points to {}",
                    grantor.username, receiver.username
                )));
            }

            self.journal_grant(
                &db_tx,
                &grantor,
                &receiver.username,
                receiver.balance,
                cmd.amount,
                cmd.created_at,
            )
            .await
        })
    }

    /// Debit the grantor, credit the receiver and journal both sides.
    ///
    /// Expects fresh snapshots of both balances; the guarded updates abort
    /// on stale reads.
    async fn journal_grant(
        &self,
        db_tx: &DatabaseTransaction,
        grantor: &Account,
        receiver_id: &str,
        receiver_balance: i64,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<GrantOutcome> {
        let grantor_before = grantor.balance;
        let grantor_after = match grantor.funding_policy() {
            FundingPolicy::Unmetered => grantor_before,
            FundingPolicy::Metered { balance } => {
                if balance < amount {
                    return Err(EngineError::InsufficientBalance(grantor.username.clone()));
                }
                balance - amount
            }
        };

        if grantor_after != grantor_before {
            self.debit_guarded(db_tx, &grantor.username, grantor_before, grantor_after)
                .await?;
        }
        let debit = JournalEntry::new(
            grantor.username.clone(),
            EntryKind::Debit,
            amount,
            grantor_before,
            grantor_after,
            created_at,
        )?
        .counterparty(receiver_id);
        journal::ActiveModel::from(&debit).insert(db_tx).await?;

        let receiver_after = receiver_balance + amount;
        let update = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(receiver_after))
            .filter(accounts::Column::Username.eq(receiver_id))
            .filter(accounts::Column::Balance.eq(receiver_balance))
            .exec(db_tx)
            .await?;
        if update.rows_affected == 0 {
            return Err(EngineError::BalanceConflict(receiver_id.to_string()));
        }
        let credit = JournalEntry::new(
            receiver_id.to_string(),
            EntryKind::Credit,
            amount,
            receiver_balance,
            receiver_after,
            created_at,
        )?
        .counterparty(grantor.username.clone());
        journal::ActiveModel::from(&credit).insert(db_tx).await?;

        Ok(GrantOutcome {
            debit_id: debit.id,
            credit_id: credit.id,
            grantor_balance: grantor_after,
            receiver_balance: receiver_after,
        })
    }
}
