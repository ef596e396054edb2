mod api;
mod bridge;
mod cli;
mod config;
mod controller;
mod error;
mod field;
mod keymap;
mod logging;
mod models;
mod prompt;
mod scheduler;
mod session;
mod toast;
mod ui;
mod view;

use std::io;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use api::ApiClient;
use cli::{Cli, Commands};
use config::Config;
use controller::{ControllerSettings, DashboardController};
use models::SuggestRequest;
use session::CookieStore;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        use clap_complete::{generate, Shell};
        let shell = shell.to_lowercase();
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "elvish" => Shell::Elvish,
            "powershell" => Shell::PowerShell,
            _ => {
                println!("Unsupported shell: {}", shell);
                return Ok(());
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "sprintsync", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();
    if let Some(base_url) = cli.base_url.clone() {
        config.base_url = base_url;
    }

    logging::init(&config.log_path())?;
    log::info!("Using backend {}", config.base_url);

    let client = ApiClient::new(config.base_url.clone(), config.request_timeout())?;
    let cookies = CookieStore::new(config.cookie_path(), config.cookie_override.clone());
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let (command_tx, command_rx) = mpsc::unbounded_channel();
            let (event_tx, mut event_rx) = mpsc::unbounded_channel();
            bridge::spawn_bridge(rt.handle(), client, cookies, command_rx, event_tx);

            let mut controller = DashboardController::new(
                command_tx,
                ControllerSettings {
                    reload_delay: config.reload_delay(),
                    toast_ttl: config.toast_ttl(),
                },
            );
            controller.reload_tasks();
            ui::run_tui(&mut controller, &mut event_rx, config.tick_rate())?;
        }
        Some(Commands::Login { username }) => {
            let password = prompt::read_password("Password: ")?;
            let response = rt.block_on(client.login(&username, &password))?;
            cookies
                .set_token(&response.access_token)
                .context("Failed to store access token")?;
            log::info!(
                "Logged in as {} ({} token)",
                username,
                response.token_type.as_deref().unwrap_or("bearer")
            );
            println!("Logged in as {}. Token stored in {}", username, cookies.path().display());
        }
        Some(Commands::Register { username }) => {
            let password = prompt::read_password("Password: ")?;
            let confirmation = prompt::read_password("Confirm password: ")?;
            if password != confirmation {
                bail!("Passwords do not match");
            }
            let created = rt.block_on(client.register(&username, &password))?;
            match created.user_id {
                Some(id) => println!("{} (user id {})", created.message, id),
                None => println!("{}", created.message),
            }
            println!("Run `sprintsync login {}` to sign in.", username);
        }
        Some(Commands::Logout) => {
            if cookies.clear_token().context("Failed to clear access token")? {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
            if config.cookie_override.is_some() {
                println!("Note: SPRINTSYNC_COOKIE is set and still supplies a token.");
            }
        }
        Some(Commands::Tasks) => {
            let token = cookies.token();
            let tasks = rt.block_on(client.list_tasks(token.as_deref()))?;
            if tasks.is_empty() {
                println!("No tasks found.");
            }
            for task in tasks {
                println!("{:>5}  [{:<11}]  {}", task.id, task.status.as_str(), task.title);
            }
        }
        Some(Commands::Suggest { mode, title }) => {
            let token = cookies.token();
            let request = SuggestRequest {
                title: title.filter(|t| !t.trim().is_empty()),
                mode,
            };
            let suggestion = rt.block_on(client.suggest(token.as_deref(), &request))?;
            println!("{}", suggestion);
        }
        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}
