use std::error::Error;
use std::path::Path;
use std::process::exit;

use axum::extract::FromRef;
use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::macros::date;

use fintrack_rs::{
    Amount, AppConfig, AppState, AuthService, CategoryName, LedgerService, NewCategory,
    NewTransaction, TransactionType,
};

/// A utility for creating a test database for the REST API server of fintrack_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;
    let state = AppState::new(conn, AppConfig::new("test-db-secret")?)?;

    println!("Creating test user...");
    let user = AuthService::from_ref(&state)
        .register_user("test", "test123")
        .await?;

    println!("Creating categories and transactions...");
    let ledger = LedgerService::from_ref(&state);

    let food = ledger
        .create_category(
            user.id,
            NewCategory {
                name: CategoryName::new("Food")?,
                parent_id: None,
            },
        )
        .await?;
    let groceries = ledger
        .create_category(
            user.id,
            NewCategory {
                name: CategoryName::new("Groceries")?,
                parent_id: Some(food.id),
            },
        )
        .await?;
    let salary = ledger
        .create_category(
            user.id,
            NewCategory {
                name: CategoryName::new("Salary")?,
                parent_id: None,
            },
        )
        .await?;

    let transactions = [
        (
            "Monthly pay",
            Decimal::new(4_250_00, 2),
            TransactionType::Income,
            date!(2025 - 01 - 01),
            salary.id,
        ),
        (
            "Supermarket",
            Decimal::new(87_45, 2),
            TransactionType::Expense,
            date!(2025 - 01 - 03),
            groceries.id,
        ),
        (
            "Takeaways",
            Decimal::new(32_50, 2),
            TransactionType::Expense,
            date!(2025 - 01 - 10),
            food.id,
        ),
    ];

    for (description, amount, kind, date, category_id) in transactions {
        let new_transaction = NewTransaction {
            description: None,
            amount: Amount::new(amount)?,
            kind,
            date,
            category_id,
        }
        .description(Some(description));

        ledger.create_transaction(user.id, new_transaction).await?;
    }

    println!("Success! Log in with the username \"test\" and the password \"test123\".");

    Ok(())
}
