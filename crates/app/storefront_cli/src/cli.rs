use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "storefront_cli", version, about = "Storefront operator tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the CLI version
    Version,

    /// Print freshly generated virtual codes, one per line
    GenerateCodes {
        /// Number of codes to generate
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },

    /// Create a back-office account
    AddAdmin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD")]
        password: String,

        #[arg(long, default_value = "Administrator")]
        name: String,

        /// Create the single Owner instead of an admin
        #[arg(long, default_value_t = false)]
        owner: bool,

        #[arg(
            long,
            env = "DATABASE_URL",
            default_value = "postgres://localhost:5432/storefront"
        )]
        database_url: String,
    },
}
