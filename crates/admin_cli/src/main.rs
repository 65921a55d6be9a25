use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use engine::Engine;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "expense_admin")]
#[command(about = "Admin utilities for the expense add-on (users, spreadsheets, state)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./expenses.db?mode=rwc"
    )]
    database_url: String,

    /// Base URL spreadsheets are addressed under.
    #[arg(long, env = "EXPENSES__SHEETS__BASE_URL", default_value = engine::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Sheet(Sheet),
    State(State),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Sheet {
    #[command(subcommand)]
    command: SheetCommand,
}

#[derive(Subcommand, Debug)]
enum SheetCommand {
    /// Provision a spreadsheet ready to receive expenses.
    Create(SheetCreateArgs),
}

#[derive(Args, Debug)]
struct SheetCreateArgs {
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct State {
    #[command(subcommand)]
    command: StateCommand,
}

#[derive(Subcommand, Debug)]
enum StateCommand {
    /// Print the expense counter and the active spreadsheet of a user.
    Show(StateShowArgs),
}

#[derive(Args, Debug)]
struct StateShowArgs {
    #[arg(long)]
    user: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(out: &mut impl Write, message: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message)
    )?;
    out.flush()?;
    Ok(())
}

/// Read a line without echoing it back.
fn read_secret(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    notice(&mut out, prompt)?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        let control = modifiers.contains(KeyModifiers::CONTROL);

        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if control => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Backspace if secret.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char(ch) if !control => {
                secret.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    out.flush()?;
    Ok(secret)
}

fn prompt_new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let password = read_secret("Password: ")?;
        if password.is_empty() {
            notice(&mut out, "Password must not be empty.\r\n")?;
            continue;
        }
        if read_secret("Confirm password: ")? == password {
            return Ok(password);
        }
        notice(&mut out, "Passwords do not match. Try again.\r\n")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn user_exists(db: &DatabaseConnection, username: &str) -> CliResult<bool> {
    Ok(users::Entity::find_by_id(username.to_string())
        .one(db)
        .await?
        .is_some())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if user_exists(&db, &args.username).await? {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }
            let password = prompt_new_password()?;

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {}", args.username);
        }
        Command::Sheet(Sheet {
            command: SheetCommand::Create(args),
        }) => {
            let engine = Engine::builder()
                .database(db.clone())
                .base_url(&cli.base_url)
                .build()
                .await?;
            let (name, url) = engine.new_spreadsheet(args.name.as_deref()).await?;
            println!("created spreadsheet: {name} ({url})");
        }
        Command::State(State {
            command: StateCommand::Show(args),
        }) => {
            if !user_exists(&db, &args.user).await? {
                eprintln!("user not found: {}", args.user);
                std::process::exit(1);
            }

            let engine = Engine::builder()
                .database(db.clone())
                .base_url(&cli.base_url)
                .build()
                .await?;
            let next = engine
                .latest_expense(&args.user)
                .await?
                .map_or(0, |latest| latest + 1);
            let location = engine.active_location(&args.user).await?;

            println!("next expense id: {next}");
            println!(
                "active spreadsheet: {}",
                location.as_deref().unwrap_or("none")
            );
        }
    }

    Ok(())
}
