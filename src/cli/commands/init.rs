//! Init command handler

use crate::config::Config;
use crate::constants::STARTER_PRICES;
use crate::db::Store;
use crate::models::CoffeePrices;

pub async fn cmd_init(config: &Config) -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Config file created. Edit config.toml and run again.");
    } else {
        println!("Config file already exists, leaving it alone.");
    }

    let store = Store::open(&config.general.data_dir).await?;
    let prices = store.load_prices().await?;

    if prices.is_empty() {
        let starter: CoffeePrices = STARTER_PRICES.iter().copied().collect();
        store.save_prices(&starter).await?;
        println!(
            "✓ Wrote starter price list ({} coffees) to {}",
            starter.len(),
            config.general.data_dir
        );
    } else {
        println!("Price list already has {} coffees.", prices.len());
    }

    Ok(())
}
