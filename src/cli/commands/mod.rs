mod history;
mod init;
mod ledger;
mod purchase;
mod settle;

pub use history::cmd_history;
pub use init::cmd_init;
pub use ledger::{cmd_next_payer, cmd_prices, cmd_reconcile, cmd_totals};
pub use purchase::cmd_purchase;
pub use settle::cmd_settle;
