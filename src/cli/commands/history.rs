use crate::services::ledger::entry_cost;
use crate::state::SharedState;

pub async fn cmd_history(state: &SharedState, user: &str) -> anyhow::Result<()> {
    let entries = state.fund_service.history_for(user).await?;

    if entries.is_empty() {
        println!("No history for {user}.");
        return Ok(());
    }

    let prices = state.fund_service.coffee_prices().await?;

    println!("History for {} ({} entries):", user, entries.len());
    println!("{:-<70}", "");

    for entry in &entries {
        let cost = entry_cost(entry, &prices);
        if let Some(participants) = entry.participants.as_ref().filter(|_| entry.is_round()) {
            println!("• {} - Paid for round (${:.2})", entry.timestamp, cost);
            for (name, favorite) in participants.iter() {
                println!("    {name}: {favorite}");
            }
        } else {
            println!("• {} - {} (${:.2})", entry.timestamp, entry.coffee, cost);
        }
    }

    Ok(())
}
