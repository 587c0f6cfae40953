// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod commands;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::GenerateCodes { count } => {
            for code in commands::generate_codes(*count)? {
                println!("{code}");
            }
        }
        Commands::AddAdmin {
            email,
            password,
            name,
            owner,
            database_url,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            let id = runtime.block_on(commands::add_admin(
                database_url,
                email,
                password,
                name,
                *owner,
            ))?;
            println!("{id}");
        }
    }

    Ok(())
}
