use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, GrantPointsCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

mod accounts {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "accounts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
        pub role: String,
        pub balance: i64,
        pub campaign_count: i64,
        pub created_by: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "bullhorn_admin")]
#[command(about = "Admin utilities for Bullhorn (bootstrap accounts/points)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bullhorn.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Credit(Credit),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    username: String,
    /// One of admin, reseller, user.
    #[arg(long, default_value = "admin")]
    role: String,
    /// Parent account recorded as the creator.
    #[arg(long)]
    created_by: Option<String>,
    /// Starting balance in points.
    #[arg(long, default_value_t = 0)]
    balance: i64,
}

#[derive(Args, Debug)]
struct Credit {
    #[command(subcommand)]
    command: CreditCommand,
}

#[derive(Subcommand, Debug)]
enum CreditCommand {
    Grant(CreditGrantArgs),
}

#[derive(Args, Debug)]
struct CreditGrantArgs {
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    amount: i64,
}

fn parse_role(raw: &str) -> Result<&str, String> {
    match raw {
        "admin" | "reseller" | "user" => Ok(raw),
        other => Err(format!("unsupported role: {other}")),
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let role = match parse_role(&args.role) {
                Ok(role) => role,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let password = prompt_password_twice()?;

            if accounts::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("account already exists: {}", args.username);
                std::process::exit(1);
            }

            let account = accounts::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
                role: Set(role.to_string()),
                balance: Set(args.balance),
                campaign_count: Set(0),
                created_by: Set(args.created_by),
                created_at: Set(chrono::Utc::now()),
            };
            accounts::Entity::insert(account).exec(&db).await?;

            println!("created account: {}", args.username);
        }
        Command::Credit(Credit {
            command: CreditCommand::Grant(args),
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            let outcome = engine
                .grant_points(GrantPointsCmd::new(
                    &args.from,
                    &args.to,
                    args.amount,
                    chrono::Utc::now(),
                ))
                .await?;
            println!(
                "granted {} points: {} ({}) -> {} ({})",
                args.amount, args.from, outcome.grantor_balance, args.to, outcome.receiver_balance
            );
        }
    }

    Ok(())
}
