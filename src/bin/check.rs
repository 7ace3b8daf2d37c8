//! # Access Control Check
//!
//! Command line front end for the access control evaluator. Resolves a
//! user's built-in roles and permissions, or evaluates a single action.
//!
//! ## Configuration
//!
//! - `ACCESSCONTROL_CONFIG` - Path to a TOML or JSON configuration file
//! - `ACCESSCONTROL_FEATURE_TOGGLES_ENABLE` - Overrides enabled feature toggles
//! - `RUST_LOG` - Log level (default: info)
//!
//! Exit status for `evaluate` is 0 when access is granted and 1 when denied.

use accesscontrol::{
    AccessControl, AccessControlConfig, InMemoryUsageStats, OssAccessControlService,
    PermissionTable, RequestContext, SignedInUser,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Access control evaluator CLI
#[derive(Parser)]
#[command(name = "accesscontrol-check")]
#[command(about = "Evaluate role based access control for a user")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "ACCESSCONTROL_CONFIG")]
    config: Option<PathBuf>,

    /// JSON permission table (overrides config)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Organization role of the user
    #[arg(short, long, default_value = "Viewer")]
    role: String,

    /// Treat the user as a server administrator
    #[arg(long)]
    grafana_admin: bool,

    /// Login name of the user
    #[arg(long, default_value = "cli")]
    login: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the user's built-in roles
    Roles,

    /// Print the user's permissions
    Permissions,

    /// Evaluate an action against optional scopes
    Evaluate {
        /// Action to check (e.g., "users:read")
        action: String,

        /// Acceptable scopes; any one match grants access
        scopes: Vec<String>,
    },

    /// Print usage statistics and metrics after resolving permissions
    Metrics,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.verbose).into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AccessControlConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => AccessControlConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(table) = &cli.table {
        config.permission_table = Some(table.clone());
    }

    let table = config
        .load_permission_table()
        .context("Failed to load permission table")?;
    for warning in table.validate() {
        warn!("{}", warning);
    }

    let usage_stats = Arc::new(InMemoryUsageStats::new());
    let service = build_service(config, table)?.with_usage_stats(usage_stats.clone());
    service.init().context("Failed to initialize access control")?;

    if service.is_disabled() {
        info!("Access control is disabled; callers bypass these checks");
    }

    let ctx = RequestContext::new();
    let user = SignedInUser::new(cli.login.clone(), cli.role.as_str())
        .with_grafana_admin(cli.grafana_admin);

    match cli.command {
        Command::Roles => {
            for role in service.get_user_built_in_roles(&user) {
                println!("{}", role);
            }
        }
        Command::Permissions => {
            let permissions = service.get_user_permissions(&ctx, &user).await?;
            println!("{}", serde_json::to_string_pretty(&permissions)?);
        }
        Command::Evaluate { action, scopes } => {
            let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
            let allowed = service
                .evaluate(&ctx, &user, &action, &scopes)
                .await
                .context("Evaluation failed")?;

            println!("{}", if allowed { "ALLOW" } else { "DENY" });
            if !allowed {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Metrics => {
            service.get_user_permissions(&ctx, &user).await?;
            for (name, value) in usage_stats.collect() {
                println!("{} {}", name, value);
            }
            print!("{}", service.metrics().export_prometheus().await);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Log filter used when `RUST_LOG` is unset
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn build_service(config: AccessControlConfig, table: PermissionTable) -> Result<OssAccessControlService> {
    config.validate().context("Invalid configuration")?;
    Ok(OssAccessControlService::new(
        Some(Arc::new(config)),
        Arc::new(table),
    ))
}
