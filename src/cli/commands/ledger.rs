//! Read-only ledger commands

use crate::constants::NO_PAYER;
use crate::state::SharedState;

pub async fn cmd_prices(state: &SharedState) -> anyhow::Result<()> {
    let prices = state.fund_service.coffee_prices().await?;

    if prices.is_empty() {
        println!("No coffees listed.");
        println!();
        println!("Create a starter list with: coffeefund init");
        return Ok(());
    }

    println!("Coffee Prices ({} total)", prices.len());
    println!("{:-<40}", "");
    for (name, price) in prices.iter() {
        println!("{name:<30} ${price:.2}");
    }

    Ok(())
}

pub async fn cmd_totals(state: &SharedState) -> anyhow::Result<()> {
    let totals = state.fund_service.spend_totals().await?;

    if totals.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("Spend Totals");
    println!("{:-<40}", "");
    for (name, amount) in totals.iter() {
        println!("{name:<30} ${amount:.2}");
    }

    Ok(())
}

pub async fn cmd_next_payer(state: &SharedState) -> anyhow::Result<()> {
    let payer = state.fund_service.next_payer().await?;
    println!("Next payer: {}", payer.as_deref().unwrap_or(NO_PAYER));
    Ok(())
}

pub async fn cmd_reconcile(state: &SharedState) -> anyhow::Result<()> {
    let report = state.fund_service.reconcile().await?;

    println!("{:<20} {:>10} {:>10} {:>10}", "User", "Stored", "Derived", "Drift");
    println!("{:-<54}", "");
    for balance in &report.balances {
        let marker = if balance.is_consistent() { " " } else { "!" };
        println!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {}",
            balance.username,
            balance.stored,
            balance.derived,
            balance.drift(),
            marker
        );
    }

    if !report.orphans.is_empty() {
        println!();
        println!("History references unknown users: {}", report.orphans.join(", "));
    }

    println!();
    if report.is_consistent() {
        println!("✓ Ledger is consistent");
    } else {
        println!("✗ Ledger has discrepancies");
    }

    Ok(())
}
