use clap::Parser;
use crmdesk::AppError;
use crmdesk::cli::dispatcher::Dispatcher;
use crmdesk::cli::main_types::Cli;
use crmdesk::storage::config::{Config, Profile};
use crmdesk::utils::logging::{init_tracing, log_warning, print_verbose};
use std::path::PathBuf;

fn report_error(error: &AppError) {
    if !error.was_toasted() {
        eprintln!("{} {}", error.severity().emoji(), error.display_friendly());
    }
    if error.redirected_to_login() {
        return;
    }
    if let Some(hint) = error.troubleshooting_hint() {
        eprintln!("💡 {}", hint);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load Config
    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| PathBuf::from(dir).join("config.toml"));

    let mut config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    let profile_name = cli
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name());

    // Create the profile on first use
    if config.get_profile(&profile_name).is_none() {
        print_verbose(
            cli.verbose,
            &format!("Creating default profile: {}", profile_name),
        );
        config.set_profile(profile_name.clone(), Profile::default());
        if config.default_profile.is_none() {
            config.default_profile = Some(profile_name.clone());
        }
        if let Err(err) = config.save(config_path.clone()) {
            log_warning(&format!("Failed to save config: {}", err));
        }
    }

    if let Some(config_dir) = &cli.config_dir {
        print_verbose(cli.verbose, &format!("Using config directory: {}", config_dir));
    }
    print_verbose(cli.verbose, &format!("Using profile: {}", profile_name));

    let dispatcher = match Dispatcher::new(
        config,
        config_path,
        profile_name,
        cli.api_url.clone(),
        cli.verbose,
    ) {
        Ok(dispatcher) => dispatcher,
        Err(err) => {
            report_error(&err);
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatcher.dispatch(cli.command).await {
        report_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
