use anyhow::Context;

use crate::state::SharedState;

pub async fn cmd_settle(state: &SharedState) -> anyhow::Result<()> {
    let settled = state
        .fund_service
        .settle_round()
        .await
        .context("Could not settle the round")?;

    println!(
        "✓ {} paid ${:.2} for {} coffees",
        settled.payer,
        settled.cost,
        settled.participants.len()
    );
    for (name, favorite) in settled.participants.iter() {
        println!("    {name}: {favorite}");
    }
    println!("  {} has now spent ${:.2}", settled.payer, settled.payer_total_spent);

    Ok(())
}
