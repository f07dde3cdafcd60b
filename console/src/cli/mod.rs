//! Command-line front end

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use secrecy::SecretString;
use tokio::sync::mpsc;
use tracing::info;

use easytp::activity::filter::{ActivityType, UsageStatsFilter};
use easytp::app::options::AppOptions;
use easytp::app::run::{refresh_if_expired, run as run_session};
use easytp::app::state::AppState;
use easytp::authn::session::SessionStoreExt;
use easytp::files::browser::decode_display_path;
use easytp::logs::{init_logging, LogLevel, LogOptions};
use easytp::storage::layout::StorageLayout;
use easytp::storage::settings::Settings;
use easytp::utils::version_info;
use easytp::workers::poller::PollEvent;

mod output;

/// EasyTP remote desktop console
#[derive(Parser, Debug)]
#[command(name = "easytp")]
#[command(about = "Start remote desktops, manage files and review activity")]
#[command(version)]
pub struct Cli {
    /// Backend API base URL (overrides settings and EASYTP_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with username and password
    Login {
        username: String,
        /// Read the password from stdin without prompting
        #[arg(long)]
        password_stdin: bool,
    },
    /// Create an account and sign in
    Signup {
        username: String,
        email: String,
        /// Read password and confirmation (two lines) from stdin
        #[arg(long)]
        password_stdin: bool,
    },
    /// Continue as a guest
    Guest,
    /// Sign out
    Logout,
    /// Refresh the access token now
    Refresh,
    /// Show the signed-in user
    Whoami,
    /// Show the dashboard summary
    Dashboard,
    /// Manage applications
    Apps {
        #[command(subcommand)]
        command: AppsCommand,
    },
    /// Manage the personal file store
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },
    /// Browse the activity log (administrators only)
    Activity(ActivityArgs),
    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum AppsCommand {
    /// List applications and their status
    List,
    /// Start an application
    Start { name: String },
    /// Stop an application
    Stop { name: String },
    /// Follow application status until interrupted
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// List a directory (encoded path, root when omitted)
    Ls { path: Option<String> },
    /// Upload a local file
    Upload {
        file: PathBuf,
        /// Destination directory (encoded path)
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Download a file
    Download { path: String, out: PathBuf },
    /// Delete a file or directory
    Rm {
        path: String,
        /// Directory listing to refresh afterwards
        #[arg(long)]
        current_path: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Activity type; repeatable, only the first is sent to the backend
    #[arg(long = "type")]
    pub types: Vec<ActivityType>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Version = command {
        println!("{}", serde_json::to_string_pretty(&version_info())?);
        return Ok(());
    }

    let layout = StorageLayout::default();
    let mut settings = Settings::load(&layout.settings_file()).await?;
    if let Some(url) = cli.api_url {
        settings.backend.base_url = url;
    }

    let log_options = LogOptions {
        log_level: cli.log_level.unwrap_or_else(|| settings.log_level.clone()),
        log_dir: settings.log_to_file.then(|| layout.logs_dir()),
        json_format: cli.json_logs,
        ..Default::default()
    };
    let _log_guard = init_logging(log_options)?;

    let options = AppOptions::from_settings(&settings, layout);
    info!("Using backend {}", options.backend_base_url);

    if let Commands::Apps {
        command: AppsCommand::Watch,
    } = command
    {
        return watch(options).await;
    }

    let state = AppState::init(&options).await?;
    refresh_if_expired(&state.session).await;

    let result = dispatch(&state, &options, command).await;
    state.shutdown().await?;
    result
}

async fn dispatch(state: &AppState, options: &AppOptions, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login {
            username,
            password_stdin,
        } => {
            let password = read_secret("Password: ", password_stdin)?;
            let user = state.session.login(&username, &password).await?;
            output::signed_in(&user);
        }
        Commands::Signup {
            username,
            email,
            password_stdin,
        } => {
            let password = read_secret("Password: ", password_stdin)?;
            let confirm = read_secret("Confirm password: ", password_stdin)?;
            let user = state
                .session
                .signup(&username, &email, &password, &confirm)
                .await?;
            output::signed_in(&user);
        }
        Commands::Guest => {
            let user = state.session.continue_as_guest().await?;
            output::signed_in(&user);
        }
        Commands::Logout => {
            state.logout(options.lifecycle.logout_grace).await;
            println!("{}", "Signed out".green());
        }
        Commands::Refresh => {
            if !state.session.refresh_auth().await {
                bail!("Session expired, please sign in again");
            }
            println!("{}", "Token refreshed".green());
        }
        Commands::Whoami => match state.session.user() {
            Some(user) if state.session.is_authenticated() => output::user(&user),
            _ => println!("{}", "Not signed in".yellow()),
        },
        Commands::Dashboard => {
            let dashboard = state.apps.dashboard().await?;
            output::dashboard(&dashboard);
        }
        Commands::Apps { command } => apps(state, command).await?,
        Commands::Files { command } => files(state, command).await?,
        Commands::Activity(args) => activity(state, args).await?,
        Commands::Version => {}
    }
    Ok(())
}

async fn apps(state: &AppState, command: AppsCommand) -> anyhow::Result<()> {
    match command {
        AppsCommand::List => {
            state.apps.refresh().await?;
            output::apps(&state.apps.apps(), state.apps.store().counts());
        }
        AppsCommand::Start { name } => {
            state.apps.refresh().await?;
            let response = state.apps.start(&name).await?;
            if let Some(app) = state.apps.store().get(&name) {
                output::app_line(&app);
            }
            if let Some(message) = response.message {
                println!("  {}", message.dimmed());
            }
            // no poller here to pick up the invalidation
            reconcile(state, &name).await?;
            println!("Follow progress with {}", "easytp apps watch".bold());
        }
        AppsCommand::Stop { name } => {
            state.apps.stop(&name).await?;
            println!("{} {}", "Stopping".yellow(), name);
            reconcile(state, &name).await?;
        }
        AppsCommand::Watch => {}
    }
    Ok(())
}

/// Re-fetch after a start/stop and show what the backend reports now
async fn reconcile(state: &AppState, name: &str) -> anyhow::Result<()> {
    state.apps.refresh().await?;
    if let Some(app) = state.apps.store().get(name) {
        output::app_line(&app);
    }
    Ok(())
}

async fn watch(options: AppOptions) -> anyhow::Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (signed_out_tx, signed_out_rx) = tokio::sync::oneshot::channel::<()>();

    let printer = tokio::spawn(async move {
        let mut signed_out_tx = Some(signed_out_tx);
        while let Some(event) = events_rx.recv().await {
            if let PollEvent::SignedOut = event {
                if let Some(tx) = signed_out_tx.take() {
                    let _ = tx.send(());
                }
            }
            output::poll_event(&event);
        }
    });

    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
            _ = signed_out_rx => {}
        }
    };

    let result = run_session(options, events_tx, shutdown).await;
    let _ = printer.await;
    result.context("Watch ended")
}

async fn files(state: &AppState, command: FilesCommand) -> anyhow::Result<()> {
    match command {
        FilesCommand::Ls { path } => {
            let listing = state.files.list(path.as_deref().unwrap_or("")).await?;
            output::listing(&listing);
        }
        FilesCommand::Upload { file, path } => {
            let contents = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Unable to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("Upload needs a file name")?;
            state.files.upload(&path, file_name, &contents).await?;
            println!(
                "{} {} to {}",
                "Uploaded".green(),
                file_name,
                decode_display_path(&path)
            );
        }
        FilesCommand::Download { path, out } => {
            let bytes = state.files.download(&path).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("Unable to write {}", out.display()))?;
            println!(
                "{} {} ({})",
                "Saved".green(),
                out.display(),
                easytp::utils::format_file_size(bytes.len() as u64)
            );
        }
        FilesCommand::Rm { path, current_path } => {
            state.files.delete(&path, current_path.as_deref()).await?;
            println!("{} {}", "Deleted".green(), decode_display_path(&path));
        }
    }
    Ok(())
}

async fn activity(state: &AppState, args: ActivityArgs) -> anyhow::Result<()> {
    let mut filter = UsageStatsFilter::new();
    for activity_type in args.types {
        if !filter.activity_types().contains(&activity_type) {
            filter.toggle_type(activity_type);
        }
    }
    filter.set_start_date(args.from);
    filter.set_end_date(args.to);
    filter.set_search(args.search);
    filter.set_page(args.page);

    let stats = state.activity.fetch(&filter).await?;
    output::activity(&stats, &filter);
    Ok(())
}

/// Prompt on stderr and read one line from stdin
fn read_secret(prompt: &str, quiet: bool) -> anyhow::Result<SecretString> {
    if !quiet {
        eprint!("{}", prompt);
        std::io::stderr().flush()?;
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    Ok(SecretString::from(value))
}
