// src/main.rs - labdash command line
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labdash::api::monitoring::{self as monitoring_api, AccidentFilter};
use labdash::api::{download_export, ExportKind, ExportRange};
use labdash::config::{load_config, Config};
use labdash::format::format_date;
use labdash::models::ExperimentStatus;
use labdash::stores::{AccidentStore, AuthLogStore, ChatStore, ExperimentStore, ReagentStore, UserStore};
use labdash::{ApiClient, AuthSession, DataSource, FileTokenStore, NullNavigator};

const DEFAULT_TOKEN_FILE: &str = ".labdash/session.json";

#[derive(Parser)]
#[command(name = "labdash")]
#[command(version)]
#[command(about = "Command line client for the laboratory chemical-inventory dashboard")]
struct Cli {
    /// Serve sample data instead of calling the backend
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and keep the session tokens on disk
    Login {
        /// Account email (defaults to the last one used)
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Use the development login endpoint
        #[arg(long)]
        dev: bool,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    Reagents {
        #[command(subcommand)]
        action: ReagentCommand,
    },
    Experiments {
        #[command(subcommand)]
        action: ExperimentCommand,
    },
    Chat {
        #[command(subcommand)]
        action: ChatCommand,
    },
    Users {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Authentication history of one user
    AuthLogs {
        user_id: i64,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// List accidents, optionally acknowledging or resolving one
    Accidents {
        #[arg(long, conflicts_with = "resolve")]
        acknowledge: Option<i64>,
        #[arg(long)]
        resolve: Option<i64>,
    },
    /// Current safety status
    Safety,
    /// Download a CSV export
    Export {
        /// conversations, auth-logs, accidents, experiments or environment
        kind: ExportKind,
        /// 1000 (most recent rows) or all
        #[arg(long, default_value = "1000")]
        range: ExportRange,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ReagentCommand {
    List {
        /// Include disposed reagents
        #[arg(long)]
        disposed: bool,
    },
    Dispose {
        id: String,
        #[arg(long, default_value = "Expired")]
        reason: String,
        #[arg(long)]
        by: Option<String>,
    },
}

#[derive(Subcommand)]
enum ExperimentCommand {
    List {
        /// pending, in_progress or completed
        #[arg(long)]
        status: Option<ExperimentStatus>,
    },
}

#[derive(Subcommand)]
enum ChatCommand {
    Send { message: String },
}

#[derive(Subcommand)]
enum UserCommand {
    List,
}

// ==================== MAIN ====================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config()?;
    if cli.mock {
        config.data.use_mocks = true;
    }

    setup_logging(&config)?;
    config.print_startup_info();

    let tokens = Arc::new(FileTokenStore::new(token_file(&config)));
    let client = Arc::new(
        ApiClient::new(&config)?
            .with_token_store(tokens.clone())
            .with_navigator(Arc::new(NullNavigator)),
    );
    let source = DataSource::from_config(&config);
    let session = AuthSession::new(client.clone(), source).with_dev_login_secret(config.dev_login.secret.clone());

    match cli.command {
        Command::Login { email, password, dev } => {
            let user = if dev {
                if !config.dev_login.enabled {
                    anyhow::bail!("Dev login is disabled (set ALLOW_DEV_LOGIN=true)");
                }
                session.dev_login().await?
            } else {
                let email = match email {
                    Some(email) => email,
                    None => tokens
                        .remembered_email()
                        .await
                        .ok_or_else(|| anyhow::anyhow!("--email is required"))?,
                };
                let password = password.ok_or_else(|| anyhow::anyhow!("--password is required"))?;
                let user = session.login(&email, &password).await?;
                tokens.set_remembered_email(Some(user.email.clone())).await?;
                user
            };
            println!("Signed in as {} ({})", user.display_name(), user.role);
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out");
        }
        Command::Whoami => {
            session.start().await;
            match session.current_user() {
                Some(user) => println!("{} <{}> role={} active={}", user.display_name(), user.email, user.role, user.is_active),
                None => println!("Not signed in"),
            }
        }
        Command::Reagents { action } => {
            let store = ReagentStore::new(client.clone(), source);
            if let Err(e) = store.load().await {
                log::warn!("Showing cached reagents: {}", e);
            }
            match action {
                ReagentCommand::List { disposed } => {
                    for r in store.reagents() {
                        println!(
                            "{:<14} {:<28} {:>10} / {:<10} {:<8} {}",
                            r.id, r.name, r.current_volume, r.total_capacity, r.status, r.location
                        );
                    }
                    if disposed {
                        println!();
                        for d in store.disposed() {
                            println!("{:<14} {:<28} {} {} ({})", d.id, d.name, d.disposal_date, d.reason, d.disposed_by);
                        }
                    }
                }
                ReagentCommand::Dispose { id, reason, by } => {
                    let by = match by {
                        Some(by) => by,
                        None => {
                            session.start().await;
                            session
                                .current_user()
                                .map(|u| u.display_name().to_string())
                                .unwrap_or_else(|| "Unknown".to_string())
                        }
                    };
                    let disposal = store.dispose(&id, &reason, &by).await?;
                    println!("Disposed {} as {}", id, disposal.id);
                }
            }
        }
        Command::Experiments { action } => match action {
            ExperimentCommand::List { status } => {
                let store = ExperimentStore::new(client.clone(), source);
                if let Err(e) = store.load(status).await {
                    log::warn!("Showing cached experiments: {}", e);
                }
                for exp in store.experiments() {
                    println!(
                        "{:<14} {:<32} {:<12} {:<12} {} reagents",
                        exp.id,
                        exp.title,
                        exp.status,
                        format_date(Some(exp.date.as_str())),
                        exp.reagents.len()
                    );
                }
            }
        },
        Command::Chat { action } => match action {
            ChatCommand::Send { message } => {
                session.start().await;
                let sender = session.current_user().map(|u| u.display_name().to_string());
                let store = ChatStore::new(client.clone(), source);
                store.load_rooms().await?;
                let result = store.send_message(&message, sender.as_deref()).await;
                if let Some(reply) = store.messages().last() {
                    println!("{}", reply.content);
                }
                result?;
            }
        },
        Command::Users { action } => match action {
            UserCommand::List => {
                let store = UserStore::new(client.clone(), source);
                store.load().await?;
                println!("{} users", store.total());
                for user in store.users() {
                    println!(
                        "{:>5} {:<28} {:<20} {:<6} {}",
                        user.id,
                        user.email,
                        user.display_name(),
                        user.role,
                        if user.is_active { "active" } else { "inactive" }
                    );
                }
            }
        },
        Command::AuthLogs { user_id, limit } => {
            let store = AuthLogStore::new(client.clone(), source);
            for entry in store.load(user_id, limit).await? {
                println!(
                    "{:<20} {:<10} {:<5} {}",
                    entry.logged_at,
                    entry.event_type,
                    if entry.success { "ok" } else { "fail" },
                    entry.ip_address.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Accidents { acknowledge, resolve } => {
            let store = AccidentStore::new(client.clone(), source);
            if let Err(e) = store.load(&AccidentFilter::default()).await {
                log::warn!("Showing sample accidents: {}", e);
            }
            if let Some(id) = acknowledge {
                store.acknowledge(id).await?;
            }
            if let Some(id) = resolve {
                store.resolve(id).await?;
            }
            for a in store.accidents() {
                println!("{:>4} {:<9} {:<13} {:<20} {}", a.id, a.severity, a.status, a.reported_at, a.title);
            }
        }
        Command::Safety => {
            let status = monitoring_api::fetch_safety_status(&client, 10, 1).await?;
            println!("System status: {}", status.system_status);
            for item in &status.environmental {
                println!("  {:<16} {:<10} {}", item.label, item.value, item.status);
            }
            for alert in &status.alerts {
                println!("  [{}] {} @ {} ({})", alert.kind, alert.message, alert.location, alert.time);
            }
        }
        Command::Export { kind, range, out } => {
            let file = download_export(&client, kind, range).await?;
            let path = file.save_into(&out)?;
            println!("Saved {} rows to {}", file.row_count()?, path.display());
        }
    }

    log::debug!("Client metrics: {:?}", client.metrics().snapshot());
    Ok(())
}

fn token_file(config: &Config) -> PathBuf {
    if let Some(path) = &config.session.token_file {
        return PathBuf::from(path);
    }
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(DEFAULT_TOKEN_FILE),
        Err(_) => PathBuf::from(DEFAULT_TOKEN_FILE),
    }
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
