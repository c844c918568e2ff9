//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod search;

use clap::{Args, Subcommand};

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Show a restaurant.
    Restaurant {
        id: String,
    },
    /// List the foods of a restaurant.
    Foods {
        /// Restaurant ID.
        restaurant: String,
    },
    /// Show a food with its option groups.
    Food {
        id: String,
    },
    /// Show a menu and the foods it offers.
    Menu {
        id: String,
    },
    /// List food attributes (vegan, spicy...).
    Attributes,
}

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Free text matched against names and descriptions.
    pub text: Option<String>,

    /// Restrict to one restaurant.
    #[arg(short, long)]
    pub restaurant: Option<String>,

    /// Required food attribute (repeatable).
    #[arg(short, long = "attribute")]
    pub attributes: Vec<String>,

    #[arg(long, default_value = "1")]
    pub page: i64,

    #[arg(long, default_value_t = tavola_commerce::search::DEFAULT_PER_PAGE)]
    pub per_page: i64,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart with per-entry prices.
    Show,
    /// Compose a food and add it to the cart.
    AddFood {
        /// Food ID.
        food: String,

        #[arg(short, long, default_value = "1")]
        quantity: u32,

        /// Pick an accompaniment: `Option title=accompaniment id` (repeatable).
        #[arg(short, long = "option")]
        options: Vec<String>,

        #[arg(long)]
        comment: Option<String>,

        /// Empty a cart from another restaurant without asking.
        #[arg(short, long)]
        yes: bool,
    },
    /// Compose a menu and add it to the cart.
    AddMenu {
        /// Menu ID.
        menu: String,

        /// Food chosen in the menu (repeatable).
        #[arg(short, long = "pick", required = true)]
        picks: Vec<String>,

        #[arg(short, long, default_value = "1")]
        quantity: u32,

        /// Pick an accompaniment: `food id/Option title=accompaniment id` (repeatable).
        #[arg(short, long = "option")]
        options: Vec<String>,

        #[arg(long)]
        comment: Option<String>,

        #[arg(short, long)]
        yes: bool,
    },
    /// Change the quantity of an entry.
    SetQuantity {
        /// Entry ID (or its first characters).
        entry: String,
        quantity: u32,
    },
    /// Remove an entry.
    Remove {
        /// Entry ID (or its first characters).
        entry: String,
    },
    /// Empty the cart.
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Order type: delivery, on_site or takeaway (default from config).
    #[arg(short = 't', long = "type")]
    pub command_type: Option<String>,

    /// Order as a registered user instead of a guest.
    #[arg(long)]
    pub user: Option<String>,

    /// Guest name.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Delivery street address.
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub floor: Option<String>,

    #[arg(long)]
    pub apartment: Option<String>,

    /// Payment method: cash, card or online (default from config).
    #[arg(long)]
    pub payment: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,

    /// Fail instead of prompting for missing answers.
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
