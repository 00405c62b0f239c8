pub mod ledger;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::JsonAuthService;

pub mod fund_service;
pub use fund_service::{Dashboard, FundError, FundService, RecordedPurchase, SettledRound};

pub mod fund_service_impl;
pub use fund_service_impl::JsonFundService;
