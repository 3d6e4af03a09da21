//! Session commands

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::info;

use super::Command;
use crate::config::AppConfig;
use crate::domain::{AuthState, ViewKind};
use crate::infrastructure::credentials::FileCredentialStore;
use crate::infrastructure::identity::{GraphQlIdentityClient, HttpClient};
use crate::infrastructure::logging;
use crate::infrastructure::session::SessionManager;

/// Arguments for the login command
#[derive(Args, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

/// Arguments for the register command
#[derive(Args, Clone)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

/// Arguments for the update-profile command
#[derive(Args, Clone)]
pub struct UpdateProfileArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,
}

/// Arguments for the guard command
#[derive(Args, Clone)]
pub struct GuardArgs {
    /// Kind of view to guard
    #[arg(long, value_enum, default_value = "protected")]
    pub view: ViewArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Protected,
    Public,
    GuestOnly,
}

impl From<ViewArg> for ViewKind {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Protected => ViewKind::Protected,
            ViewArg::Public => ViewKind::Public,
            ViewArg::GuestOnly => ViewKind::GuestOnly,
        }
    }
}

/// Run one session command against the configured identity service
pub async fn run(command: Command) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let manager = Arc::new(build_manager(&config)?);

    // Confirm a stored token before acting on it
    if let Some(handle) = manager.start() {
        let outcome = handle.await.context("Current-user check panicked")?;
        info!(?outcome, "Stored session checked");
    }

    match command {
        Command::Login(args) => {
            let user = manager
                .login(&args.email, &args.password)
                .await
                .map_err(|e| anyhow::anyhow!(e.message()))?;
            print_json(&user)
        }
        Command::Register(args) => {
            let user = manager
                .register(&args.name, &args.email, &args.password)
                .await
                .map_err(|e| anyhow::anyhow!(e.message()))?;
            print_json(&user)
        }
        Command::Whoami => print_json(&manager.state()),
        Command::Logout => {
            let mut events = manager.events();
            manager
                .logout()
                .context("Signed out locally, but the stored session token could not be removed")?;

            match events.try_recv() {
                Ok(event) => print_json(&event),
                Err(_) => print_json(&AuthState::Unauthenticated),
            }
        }
        Command::UpdateProfile(args) => {
            let user = manager.update_profile(&args.name, &args.email).await?;
            print_json(&user)
        }
        Command::Guard(args) => {
            let guard = config.guard.guard();
            print_json(&guard.evaluate(&manager.state(), args.view.into()))
        }
    }
}

/// Wire the file credential store and the GraphQL identity client together
pub fn build_manager(config: &AppConfig) -> anyhow::Result<SessionManager> {
    let http = match config.identity.timeout() {
        Some(timeout) => HttpClient::with_timeout(timeout)?,
        None => HttpClient::new(),
    };

    let identity = Arc::new(GraphQlIdentityClient::with_endpoint(
        http,
        config.identity.endpoint.clone(),
    ));
    let store = Arc::new(FileCredentialStore::new(config.credentials.path.clone()));

    Ok(SessionManager::with_options(
        identity,
        store,
        config.session_options(),
    ))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
