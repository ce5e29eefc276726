//! Database seeder for Ledgerline development and testing.
//!
//! Seeds a demo chart of accounts and an open fiscal period for the current
//! month under a fixed organization ID. Running it twice is harmless.
//!
//! Usage: cargo run --bin seeder

use std::collections::HashMap;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use ledgerline_core::accounts::{AccountType, NewAccount};
use ledgerline_core::vat::VatCategory;
use ledgerline_db::repositories::{AccountFilter, FiscalRepoError};
use ledgerline_db::{AccountRepository, FiscalRepository};
use ledgerline_shared::AppConfig;
use ledgerline_shared::types::{AccountId, OrganizationId};
use uuid::Uuid;

/// Demo organization ID (consistent for all seeds)
const DEMO_ORG_ID: Uuid = Uuid::from_u128(1);

/// (code, name, type, parent code, VAT bucket)
const CHART: &[(&str, &str, AccountType, Option<&str>, Option<VatCategory>)] = &[
    ("1000", "Cash at Bank", AccountType::Asset, None, None),
    ("1100", "Accounts Receivable", AccountType::Asset, None, None),
    ("1200", "VAT Input", AccountType::Asset, None, Some(VatCategory::InputReclaimable)),
    ("2000", "Accounts Payable", AccountType::Liability, None, None),
    ("2100", "VAT Output", AccountType::Liability, None, Some(VatCategory::OutputSales)),
    ("2110", "VAT on Acquisitions", AccountType::Liability, Some("2100"), Some(VatCategory::OutputAcquisitions)),
    ("3000", "Owner's Equity", AccountType::Equity, None, None),
    ("4000", "Sales", AccountType::Revenue, None, None),
    ("5000", "Cost of Goods Sold", AccountType::Cogs, None, None),
    ("6000", "Operating Expenses", AccountType::Expense, None, None),
    ("6100", "Rent", AccountType::Expense, Some("6000"), None),
    ("6200", "Utilities", AccountType::Expense, Some("6000"), None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = ledgerline_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let org = OrganizationId::from_uuid(DEMO_ORG_ID);

    println!("Seeding chart of accounts...");
    seed_chart(&AccountRepository::new(db.clone()), org).await?;

    println!("Seeding fiscal period...");
    seed_period(&FiscalRepository::new(db), org).await?;

    println!("Seeding complete! Organization: {DEMO_ORG_ID}");
    Ok(())
}

/// Seeds the demo chart, parents before children.
async fn seed_chart(repo: &AccountRepository, org: OrganizationId) -> anyhow::Result<()> {
    if !repo
        .list_accounts(org, &AccountFilter::default())
        .await?
        .is_empty()
    {
        println!("  Chart already exists, skipping...");
        return Ok(());
    }

    let mut ids: HashMap<&str, AccountId> = HashMap::new();
    for &(code, name, account_type, parent, vat_category) in CHART {
        let parent_id = parent.and_then(|p| ids.get(p).copied());
        let account = repo
            .create_account(
                org,
                NewAccount {
                    id: None,
                    code: code.to_string(),
                    name: name.to_string(),
                    account_type,
                    normal_balance: None,
                    parent_id,
                    is_system: false,
                    is_active: true,
                    vat_category,
                },
            )
            .await?;
        ids.insert(code, account.id.into());
        println!("  Created {code} {name}");
    }
    Ok(())
}

/// Opens the current calendar month.
async fn seed_period(repo: &FiscalRepository, org: OrganizationId) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let start = today.with_day(1).context("first day of month")?;
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    }
    .context("first day of next month")?;
    let end = next.pred_opt().context("last day of month")?;
    let name = start.format("%B %Y").to_string();

    match repo.open_period(org, &name, start, end).await {
        Ok(period) => println!("  Opened {} ({start} to {end})", period.name),
        Err(FiscalRepoError::Fiscal(e)) => println!("  {e}, skipping..."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
