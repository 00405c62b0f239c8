/// `coffee` value that marks a history entry as a settled round.
pub const ROUND_SENTINEL: &str = "paid for round";

/// Shown in place of a payer when there are no users at all.
pub const NO_PAYER: &str = "No data";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SESSION_USER_KEY: &str = "user";

pub mod files {

    pub const USERS: &str = "users.json";

    pub const COFFEE_PRICES: &str = "coffee.json";

    pub const HISTORY: &str = "history.json";
}

pub mod limits {

    pub const USERNAME_MIN_LEN: usize = 3;

    pub const USERNAME_MAX_LEN: usize = 25;

    pub const PASSWORD_MIN_LEN: usize = 6;
}

/// Price list written by `coffeefund init` when none exists yet.
pub const STARTER_PRICES: &[(&str, f64)] = &[
    ("Espresso", 2.5),
    ("Americano", 3.0),
    ("Cappuccino", 3.5),
    ("Latte", 3.75),
];
