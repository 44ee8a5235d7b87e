//! # Seed Data Generator
//!
//! Populates the database with development data: tax rates, expense
//! categories, and a batch of demo invoices with payments and expenses.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults (20 invoices)
//! cargo run -p minibooks-db --bin seed
//!
//! # Custom batch size
//! cargo run -p minibooks-db --bin seed -- --invoices 50
//!
//! # Specify database path
//! cargo run -p minibooks-db --bin seed -- --db ./data/minibooks.db
//! ```

use chrono::{Duration, Utc};
use std::env;

use minibooks_core::invoice::LineInput;
use minibooks_core::types::{PaymentMethod, Quantity};
use minibooks_core::{InvoiceStatus, Money};
use minibooks_db::repository::expense::NewExpense;
use minibooks_db::repository::invoice::NewInvoice;
use minibooks_db::repository::payment::NewPayment;
use minibooks_db::{Database, DbConfig};

/// Tax rates seeded on first run: (name, basis points).
const TAX_RATES: &[(&str, u32)] = &[
    ("VAT (14%)", 1400),
    ("Sales Tax (10%)", 1000),
    ("Withholding Tax (1%)", 100),
];

/// Expense categories seeded on first run: (name, chart color).
const CATEGORIES: &[(&str, &str)] = &[
    ("Office Supplies", "#3b82f6"),
    ("Marketing", "#8b5cf6"),
    ("Utilities", "#ec4899"),
    ("Travel", "#f59e0b"),
    ("Software", "#10b981"),
    ("Rent", "#ef4444"),
];

/// Line item names cycled through the demo invoices.
const SERVICES: &[(&str, i64)] = &[
    ("Consulting", 15_000),
    ("Web Development", 25_000),
    ("Graphic Design", 8_000),
    ("Content Writing", 5_000),
    ("SEO Audit", 12_000),
    ("Hosting (monthly)", 1_999),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut invoice_count: usize = 20;
    let mut db_path = String::from("./minibooks_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--invoices" | "-n" => {
                if i + 1 < args.len() {
                    invoice_count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Minibooks Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --invoices <N>  Number of demo invoices (default: 20)");
                println!("  -d, --db <PATH>     Database file path (default: ./minibooks_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Minibooks Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Invoices: {}", invoice_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Skip if already seeded
    let existing = db.taxes().all().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} tax rates", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut taxes = Vec::new();
    for (name, bps) in TAX_RATES {
        taxes.push(db.taxes().insert(name, *bps).await?);
    }
    println!("✓ Seeded {} tax rates", taxes.len());

    let mut categories = Vec::new();
    for (name, color) in CATEGORIES {
        categories.push(db.expenses().insert_category(name, Some(color)).await?);
    }
    println!("✓ Seeded {} expense categories", categories.len());

    let now = Utc::now();
    let mut paid = 0usize;

    for i in 0..invoice_count {
        let (service, price_cents) = SERVICES[i % SERVICES.len()];
        let tax_id = (i % 3 != 2).then(|| taxes[i % taxes.len()].id.clone());
        let invoice_date = now - Duration::days((i as i64 * 5) % 120);

        let invoice = db
            .invoices()
            .create(&NewInvoice {
                customer_id: format!("customer-{}", (i % 8) + 1),
                currency_code: "EGP".to_string(),
                invoice_date,
                due_date: invoice_date + Duration::days(30),
                lines: vec![
                    LineInput {
                        name: service.to_string(),
                        description: Some(format!("{service} engagement")),
                        quantity: Quantity::from_units((i as i64 % 4) + 1),
                        unit_price: Money::from_cents(price_cents),
                        tax_rate_id: tax_id,
                    },
                    LineInput {
                        name: "Project management".to_string(),
                        description: None,
                        quantity: Quantity::from_milli(2500),
                        unit_price: Money::from_cents(6_000),
                        tax_rate_id: None,
                    },
                ],
                discount: Money::from_cents(if i % 5 == 0 { 1_000 } else { 0 }),
                notes: None,
                terms: Some("Net 30".to_string()),
            })
            .await?;

        db.invoices().set_status(&invoice.id, InvoiceStatus::Sent).await?;

        // Pay every other invoice in full, every fourth in part
        if i % 2 == 0 {
            db.payments()
                .record(&NewPayment {
                    invoice_id: invoice.id.clone(),
                    amount: invoice.total(),
                    payment_date: invoice_date + Duration::days(10),
                    method: PaymentMethod::BankTransfer,
                    reference: Some(format!("TRX-{:06}", i + 1)),
                    notes: None,
                })
                .await?;
            paid += 1;
        } else if i % 4 == 1 {
            db.payments()
                .record(&NewPayment {
                    invoice_id: invoice.id.clone(),
                    amount: Money::from_cents(invoice.total_cents / 2),
                    payment_date: invoice_date + Duration::days(12),
                    method: PaymentMethod::Cash,
                    reference: None,
                    notes: Some("First installment".to_string()),
                })
                .await?;
        }
    }
    println!("✓ Seeded {} invoices ({} fully paid)", invoice_count, paid);

    let mut expense_count = 0usize;
    for (i, category) in categories.iter().cycle().take(18).enumerate() {
        db.expenses()
            .insert(&NewExpense {
                category_id: category.id.clone(),
                vendor_id: Some(format!("vendor-{}", (i % 5) + 1)),
                currency_code: "EGP".to_string(),
                description: format!("Expense #{} - {}", i + 1, category.name),
                reference: None,
                amount: Money::from_cents(((i as i64 % 9) + 1) * 2_500),
                expense_date: now - Duration::days((i as i64 * 7) % 120),
            })
            .await?;
        expense_count += 1;
    }
    println!("✓ Seeded {} expenses", expense_count);

    println!();
    println!("Done. Try the dashboard queries against {}", db_path);

    db.close().await;
    Ok(())
}
