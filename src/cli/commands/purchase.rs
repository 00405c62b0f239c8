use anyhow::Context;

use crate::state::SharedState;

pub async fn cmd_purchase(state: &SharedState, user: &str, coffee: &str) -> anyhow::Result<()> {
    let recorded = state
        .fund_service
        .record_purchase(user, coffee)
        .await
        .with_context(|| format!("Could not record {coffee} for {user}"))?;

    println!(
        "✓ {} bought {} (${:.2}), total now ${:.2}",
        recorded.username, recorded.coffee, recorded.price, recorded.total_spent
    );
    Ok(())
}
