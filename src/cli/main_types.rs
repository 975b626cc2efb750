use crate::export::ExportFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crmdesk")]
#[command(about = "Command line admin client for the CRM REST backend")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Profile to use (also the target of `config set`)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Override the profile's API base URL
    #[arg(long, global = true, env = "CRMDESK_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Single-sheet Excel workbook
    Xlsx,
    /// HTML document that opens the print dialog
    Print,
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Xlsx => ExportFormat::Xlsx,
            ExportKind::Print => ExportFormat::Print,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// List the resources this client can manage
    Resources,
    /// List records of a resource
    List {
        resource: String,
        /// Case-insensitive search across all fields
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// One of 10, 25, 50, 100
        #[arg(long)]
        page_size: Option<usize>,
        /// Columns to hide, comma separated
        #[arg(long, value_delimiter = ',')]
        hide: Vec<String>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show a single record
    Get {
        resource: String,
        id: String,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Run a row action by its number in the action menu
        #[arg(long)]
        action: Option<usize>,
        /// Changed fields as a JSON object, used by the Edit action
        #[arg(long, requires = "action")]
        data: Option<String>,
        /// File attachment as field=path for the Edit action
        #[arg(long, action = clap::ArgAction::Append, requires = "data")]
        file: Vec<String>,
        /// Skip the confirmation prompt of destructive actions
        #[arg(long, short, requires = "action")]
        yes: bool,
    },
    /// Create a record
    Create {
        resource: String,
        /// Record fields as a JSON object
        #[arg(long)]
        data: String,
        /// File attachment as field=path, sent as multipart
        #[arg(long, action = clap::ArgAction::Append)]
        file: Vec<String>,
    },
    /// Update a record
    Update {
        resource: String,
        id: String,
        #[arg(long)]
        data: String,
        #[arg(long, action = clap::ArgAction::Append)]
        file: Vec<String>,
    },
    /// Delete a record
    Delete {
        resource: String,
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Flip a record's active flag
    Toggle { resource: String, id: String },
    /// Export the filtered records to a spreadsheet or print document
    Export {
        resource: String,
        #[arg(long, value_enum, default_value = "xlsx")]
        format: ExportKind,
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, value_delimiter = ',')]
        hide: Vec<String>,
        /// Output file or directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            Commands::Auth { .. } | Commands::Config { .. } | Commands::Resources => None,
            Commands::List { resource, .. }
            | Commands::Get { resource, .. }
            | Commands::Create { resource, .. }
            | Commands::Update { resource, .. }
            | Commands::Delete { resource, .. }
            | Commands::Toggle { resource, .. }
            | Commands::Export { resource, .. } => Some(resource),
        }
    }

    /// Route of the screen the command stands for; `None` for public commands
    pub fn route(&self) -> Option<String> {
        match self {
            Commands::Auth { .. } | Commands::Config { .. } | Commands::Resources => None,
            Commands::List { resource, .. }
            | Commands::Toggle { resource, .. }
            | Commands::Export { resource, .. } => Some(format!("/{}", resource)),
            Commands::Create { resource, .. } => Some(format!("/{}/new", resource)),
            Commands::Get { resource, id, .. }
            | Commands::Update { resource, id, .. }
            | Commands::Delete { resource, id, .. } => Some(format!("/{}/{}", resource, id)),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in and store the session token
    Login {
        #[arg(long, env = "CRMDESK_EMAIL")]
        email: Option<String>,
        #[arg(long, env = "CRMDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Login redirect that sent you here, e.g. /login?reason=session_expired
        #[arg(long)]
        reason: Option<String>,
    },
    /// Logout and clear the session
    Logout,
    /// Show authentication status
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a field of the profile selected with --profile
    Set {
        /// api_url, email, page_size or timeout_seconds
        #[arg(long)]
        field: String,
        #[arg(long)]
        value: String,
    },
    /// Make a profile the default
    Use { name: String },
}
