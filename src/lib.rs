pub mod assemble;
pub mod cli;
pub mod dedup;
pub mod document;
pub mod error;
pub mod format;
pub mod io_utils;
pub mod mapping;
pub mod names;
pub mod pipeline;
pub mod profile;
pub mod profiles_cmd;
pub mod reader;
pub mod record;
pub mod resolve;
pub mod table;
pub mod text;
pub mod writer;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::error::FormatError;
pub use crate::pipeline::{ProcessOptions, process, process_detailed};

/// Takes precedence over `RUST_LOG` and the verbosity flags.
const LOG_ENV: &str = "CADASTRO_LOG";

static LOGGER: OnceLock<()> = OnceLock::new();

/// Dependencies log at `warn`; this crate at `level`, unless an environment
/// filter is set.
fn init_logging(level: LevelFilter) {
    LOGGER.get_or_init(|| {
        let custom = env::var_os(LOG_ENV).is_some();
        let env = if custom {
            env_logger::Env::default().filter(LOG_ENV)
        } else {
            env_logger::Env::default()
        };
        let mut builder = env_logger::Builder::from_env(env);
        if !custom && env::var_os("RUST_LOG").is_none() {
            builder
                .filter_level(LevelFilter::Warn)
                .filter_module("cadastro_formatter", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    match cli.command {
        Commands::Format(args) => format::execute(&args),
        Commands::Mapping(args) => mapping::execute(&args),
        Commands::Profiles(args) => profiles_cmd::execute(&args),
    }
}
