//! CLI smoke entry point.
//!
//! Opens the store configured by `THREADS_DATABASE_URL` and prints the first
//! page of posts as JSON.

use log::info;
use std::process::ExitCode;
use threads_core::{
    core_version, init_logging, AppConfig, ConnectionManager, LogRevalidator, ThreadActions,
};

fn main() -> ExitCode {
    let config = AppConfig::from_env();
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("logging disabled: {err}");
    }

    println!("threads_core version={}", core_version());
    info!("event=cli_start module=cli status=ok");

    let actions = ThreadActions::new(
        ConnectionManager::new(config.database.clone()),
        LogRevalidator,
    );
    let page = match actions.fetch_posts(1, config.page_size) {
        Ok(page) => page,
        Err(err) => {
            eprintln!("fetch_posts failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&page) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to encode posts: {err}");
            ExitCode::FAILURE
        }
    }
}
