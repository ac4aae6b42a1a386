use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountRole, Engine, EngineError, EntryKind, FundCampaignCmd, GrantPointsCmd,
    JournalListFilter, NewAccountCmd, PhoneButton,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO accounts (username, password, role, balance, campaign_count, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            "root".into(),
            "password".into(),
            "admin".into(),
            0i64.into(),
            0i64.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn new_funded_user(engine: &Engine, username: &str, balance: i64) {
    engine
        .create_account(
            NewAccountCmd::new("root", username, "secret", AccountRole::User, Utc::now())
                .balance(balance),
        )
        .await
        .unwrap();
}

fn numbers(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|n| n.to_string()).collect()
}

async fn campaign_count(db: &DatabaseConnection, created_by: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS cnt FROM campaigns WHERE created_by = ?",
            vec![created_by.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "cnt").unwrap()
}

async fn debit_entries(engine: &Engine, account: &str) -> Vec<engine::JournalEntry> {
    let filter = JournalListFilter {
        kinds: Some(vec![EntryKind::Debit]),
        ..Default::default()
    };
    let (entries, _) = engine
        .list_journal_page(account, account, 50, None, &filter)
        .await
        .unwrap();
    entries
}

#[tokio::test]
async fn funding_within_balance_conserves_points() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 10).await;

    let outcome = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            numbers(1..=5),
            Utc::now(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.requested_count, 5);
    assert_eq!(outcome.funded_count, 5);
    assert_eq!(outcome.excluded_count, 0);
    assert_eq!(outcome.points_deducted, 5);
    assert_eq!(outcome.remaining_balance, 5);

    let account = engine.account("acme").await.unwrap();
    assert_eq!(account.balance, 5);
    assert_eq!(account.campaign_count, 1);
}

#[tokio::test]
async fn over_request_clamps_to_prefix_of_balance() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 7).await;

    let outcome = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            numbers(1..=10),
            Utc::now(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.funded_count, 7);
    assert_eq!(outcome.excluded_count, 3);
    assert_eq!(outcome.remaining_balance, 0);

    let campaign = engine.campaign(outcome.campaign_id, "acme").await.unwrap();
    assert_eq!(campaign.recipients, numbers(1..=7));

    let entries = debit_entries(&engine, "acme").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, outcome.transaction_id);
    assert_eq!(entries[0].amount, 7);
    assert_eq!(entries[0].balance_before, 7);
    assert_eq!(entries[0].balance_after, 0);
    assert_eq!(entries[0].campaign_id, Some(outcome.campaign_id));
}

#[tokio::test]
async fn duplicates_and_order_survive_clamping() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 3).await;

    let requested = vec![
        "7".to_string(),
        "7".to_string(),
        "8".to_string(),
        "9".to_string(),
    ];
    let outcome = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            requested.clone(),
            Utc::now(),
        ))
        .await
        .unwrap();

    let campaign = engine.campaign(outcome.campaign_id, "acme").await.unwrap();
    assert_eq!(campaign.recipients, requested[..3].to_vec());
}

#[tokio::test]
async fn zero_balance_payer_gets_nothing_persisted() {
    let (engine, db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 0).await;

    let err = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            numbers(1..=5),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientBalance("acme".to_string()));

    assert_eq!(campaign_count(&db, "acme").await, 0);
    assert!(debit_entries(&engine, "acme").await.is_empty());
    assert_eq!(engine.account("acme").await.unwrap().balance, 0);
}

#[tokio::test]
async fn admin_funds_everything_without_spending() {
    let (engine, _db) = engine_with_db().await;

    let outcome = engine
        .fund_campaign(FundCampaignCmd::new(
            "root",
            "Broadcast",
            "Service notice",
            "+39",
            numbers(1..=500),
            Utc::now(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.funded_count, 500);
    assert_eq!(outcome.excluded_count, 0);
    assert_eq!(outcome.points_deducted, 0);
    assert_eq!(outcome.remaining_balance, 0);

    let entries = debit_entries(&engine, "root").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, 500);
    assert_eq!(entries[0].balance_before, 0);
    assert_eq!(entries[0].balance_after, 0);

    assert_eq!(engine.account("root").await.unwrap().balance, 0);
}

#[tokio::test]
async fn failed_journal_append_rolls_back_campaign_and_balance() {
    let (engine, db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 10).await;
    let backend = db.get_database_backend();

    db.execute(Statement::from_string(
        backend,
        "CREATE TRIGGER force_journal_failure BEFORE INSERT ON transactions \
         BEGIN SELECT RAISE(ABORT, 'journal append failed'); END;",
    ))
    .await
    .unwrap();

    let err = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            numbers(1..=5),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    assert_eq!(campaign_count(&db, "acme").await, 0);
    let account = engine.account("acme").await.unwrap();
    assert_eq!(account.balance, 10);
    assert_eq!(account.campaign_count, 0);
}

#[tokio::test]
async fn funding_twice_debits_twice() {
    let (engine, db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 10).await;

    let cmd = FundCampaignCmd::new(
        "acme",
        "Spring sale",
        "50% off this week",
        "+39",
        numbers(1..=5),
        Utc::now(),
    );

    let first = engine.fund_campaign(cmd.clone()).await.unwrap();
    let second = engine.fund_campaign(cmd).await.unwrap();

    assert_ne!(first.campaign_id, second.campaign_id);
    assert_ne!(first.transaction_id, second.transaction_id);
    assert_eq!(campaign_count(&db, "acme").await, 2);
    assert_eq!(debit_entries(&engine, "acme").await.len(), 2);
    assert_eq!(engine.account("acme").await.unwrap().balance, 0);
}

#[tokio::test]
async fn worked_example_balance_seven_request_ten() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 7).await;

    let outcome = engine
        .fund_campaign(
            FundCampaignCmd::new(
                "acme",
                "Spring sale",
                "50% off this week",
                "+39",
                numbers(1..=10),
                Utc::now(),
            )
            .phone_button(PhoneButton {
                text: "Call us".to_string(),
                number: "+390001".to_string(),
            }),
        )
        .await
        .unwrap();

    assert_eq!(outcome.funded_count, 7);
    assert_eq!(outcome.excluded_count, 3);
    assert_eq!(outcome.remaining_balance, 0);

    let campaign = engine.campaign(outcome.campaign_id, "acme").await.unwrap();
    assert_eq!(campaign.recipients, numbers(1..=7));
    assert!(campaign.phone_button.is_some());

    let entries = debit_entries(&engine, "acme").await;
    assert_eq!(entries[0].amount, 7);
    assert_eq!(entries[0].balance_before, 7);
    assert_eq!(entries[0].balance_after, 0);
}

#[tokio::test]
async fn blank_recipients_are_rejected_before_any_mutation() {
    let (engine, db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 10).await;

    let err = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            vec!["  ".to_string(), "".to_string()],
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidArgument("at least one recipient required".to_string())
    );
    assert_eq!(campaign_count(&db, "acme").await, 0);
}

#[tokio::test]
async fn missing_payer_account_aborts() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .fund_campaign(FundCampaignCmd::new(
            "ghost",
            "Spring sale",
            "50% off this week",
            "+39",
            numbers(1..=5),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account not exists".to_string()));
}

#[tokio::test]
async fn grants_move_points_down_the_hierarchy() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_account(NewAccountCmd::new(
            "root",
            "rs1",
            "secret",
            AccountRole::Reseller,
            Utc::now(),
        ))
        .await
        .unwrap();
    engine
        .create_account(NewAccountCmd::new(
            "rs1",
            "acme",
            "secret",
            AccountRole::User,
            Utc::now(),
        ))
        .await
        .unwrap();

    // Admin grantor mints: its balance snapshot stays put.
    let grant = engine
        .grant_points(GrantPointsCmd::new("root", "rs1", 100, Utc::now()))
        .await
        .unwrap();
    assert_eq!(grant.grantor_balance, 0);
    assert_eq!(grant.receiver_balance, 100);

    // Reseller grantor pays out of its own balance.
    let grant = engine
        .grant_points(GrantPointsCmd::new("rs1", "acme", 40, Utc::now()))
        .await
        .unwrap();
    assert_eq!(grant.grantor_balance, 60);
    assert_eq!(grant.receiver_balance, 40);

    assert_eq!(engine.account("rs1").await.unwrap().balance, 60);
    assert_eq!(engine.account("acme").await.unwrap().balance, 40);

    let rs1_debits = debit_entries(&engine, "rs1").await;
    assert_eq!(rs1_debits.len(), 1);
    assert_eq!(rs1_debits[0].counterparty.as_deref(), Some("acme"));

    // An unrelated grantor is rejected outright.
    let err = engine
        .grant_points(GrantPointsCmd::new("acme", "rs1", 10, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn grantor_without_points_cannot_grant() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_account(NewAccountCmd::new(
            "root",
            "rs1",
            "secret",
            AccountRole::Reseller,
            Utc::now(),
        ))
        .await
        .unwrap();
    engine
        .create_account(NewAccountCmd::new(
            "rs1",
            "acme",
            "secret",
            AccountRole::User,
            Utc::now(),
        ))
        .await
        .unwrap();

    let err = engine
        .grant_points(GrantPointsCmd::new("rs1", "acme", 10, Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientBalance("rs1".to_string()));
    assert_eq!(engine.account("acme").await.unwrap().balance, 0);
}

#[tokio::test]
async fn concurrent_funding_never_overspends() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 5).await;
    let engine = Arc::new(engine);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..2 {
        let engine = engine.clone();
        tasks.spawn(async move {
            engine
                .fund_campaign(FundCampaignCmd::new(
                    "acme",
                    "Spring sale",
                    "50% off this week",
                    "+39",
                    vec!["1".to_string(), "2".to_string(), "3".to_string()],
                    Utc::now(),
                ))
                .await
        });
    }

    let mut total_funded = 0i64;
    while let Some(result) = tasks.join_next().await {
        if let Ok(outcome) = result.unwrap() {
            total_funded += outcome.funded_count as i64;
        }
    }

    let balance = engine.account("acme").await.unwrap().balance;
    assert!(balance >= 0);
    assert_eq!(balance, 5 - total_funded);
}

#[tokio::test]
async fn campaigns_are_hidden_from_unrelated_accounts() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 5).await;
    new_funded_user(&engine, "other", 5).await;

    let outcome = engine
        .fund_campaign(FundCampaignCmd::new(
            "acme",
            "Spring sale",
            "50% off this week",
            "+39",
            numbers(1..=3),
            Utc::now(),
        ))
        .await
        .unwrap();

    // Owner and admin see it, a sibling account does not.
    assert!(engine.campaign(outcome.campaign_id, "acme").await.is_ok());
    assert!(engine.campaign(outcome.campaign_id, "root").await.is_ok());
    let err = engine
        .campaign(outcome.campaign_id, "other")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("campaign not exists".to_string()));
}

#[tokio::test]
async fn journal_pages_walk_newest_to_oldest() {
    let (engine, _db) = engine_with_db().await;
    new_funded_user(&engine, "acme", 9).await;

    for _ in 0..3 {
        engine
            .fund_campaign(FundCampaignCmd::new(
                "acme",
                "Spring sale",
                "50% off this week",
                "+39",
                numbers(1..=3),
                Utc::now(),
            ))
            .await
            .unwrap();
    }

    let filter = JournalListFilter {
        kinds: Some(vec![EntryKind::Debit]),
        ..Default::default()
    };
    let (first_page, cursor) = engine
        .list_journal_page("acme", "acme", 2, None, &filter)
        .await
        .unwrap();
    assert_eq!(first_page.len(), 2);
    let cursor = cursor.expect("expected a second page");

    let (second_page, cursor) = engine
        .list_journal_page("acme", "acme", 2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(second_page.len(), 1);
    assert!(cursor.is_none());

    let seen: std::collections::HashSet<_> =
        first_page.iter().chain(&second_page).map(|e| e.id).collect();
    assert_eq!(seen.len(), 3);
}
