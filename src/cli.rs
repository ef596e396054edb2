use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::SuggestMode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (defaults to <config dir>/sprintsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Backend base URL, overriding config and environment
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the dashboard
    Tui,
    /// Log in and store the access token cookie
    Login {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
    /// Create an account on the backend
    Register {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
    /// Forget the stored access token
    Logout,
    /// List tasks
    Tasks,
    /// Ask the assistant for a suggestion
    Suggest {
        #[arg(short, long, value_enum, default_value_t = SuggestMode::Draft)]
        mode: SuggestMode,
        /// Task title to draft a description for
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
