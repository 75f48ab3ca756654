use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, ValidationErrors};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "dispendio_admin")]
#[command(about = "Admin utilities for Dispendio (register users, report expenses)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./dispendio.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Expenses(Expenses),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Expenses {
    #[command(subcommand)]
    command: ExpensesCommand,
}

#[derive(Subcommand, Debug)]
enum ExpensesCommand {
    List(ExpensesListArgs),
    Summary(ExpensesSummaryArgs),
}

#[derive(Args, Debug)]
struct ExpensesListArgs {
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
}

#[derive(Args, Debug)]
struct ExpensesSummaryArgs {
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    month: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_validation(errors: &ValidationErrors) {
    for (field, failures) in errors.iter() {
        for failure in failures {
            eprintln!("{field}: {}", failure.message);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build();

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => match engine.create_user(&args.username, &args.email).await {
            Ok(user) => println!("created user: {} ({})", user.username, user.id),
            Err(EngineError::Validation(errors)) => {
                print_validation(&errors);
                std::process::exit(1);
            }
            Err(EngineError::IntegrityViolation(_)) => {
                eprintln!("username or email already taken: {}", args.username);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for user in engine.list_users().await? {
                println!("{}  {}  {}", user.id, user.username, user.email);
            }
        }
        Command::Expenses(Expenses {
            command: ExpensesCommand::List(args),
        }) => {
            let expenses = match engine
                .list_expenses_in_range(
                    &args.user_id,
                    args.start_date.as_deref(),
                    args.end_date.as_deref(),
                )
                .await
            {
                Ok(expenses) => expenses,
                Err(EngineError::Validation(errors)) => {
                    print_validation(&errors);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            for expense in &expenses {
                let amount = expense.amount.to_string();
                println!(
                    "{}  {}  {amount:>12}  {:<10} {}",
                    expense.id,
                    expense.date,
                    expense.category.as_str(),
                    expense.title
                );
            }
            println!("{} expense(s)", expenses.len());
        }
        Command::Expenses(Expenses {
            command: ExpensesCommand::Summary(args),
        }) => {
            let totals = match engine.category_summary(&args.user_id, &args.month).await {
                Ok(totals) => totals,
                Err(EngineError::Validation(errors)) => {
                    print_validation(&errors);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            for row in totals {
                let total = row.total.to_string();
                println!("{:<12} {total:>12}", row.category.as_str());
            }
        }
    }

    Ok(())
}
