//! CLI module for identity-session
//!
//! Each invocation restores the session from the credential file, performs
//! one command and exits:
//! - `login` / `register`: open a session
//! - `whoami`: show the current session state
//! - `logout`: end the session
//! - `update-profile`: edit the signed-in user's name and email
//! - `guard`: show what a view guard decides for the current session

pub mod session;

use clap::{Parser, Subcommand};

/// identity-session - Sign in against a remote identity service
#[derive(Parser)]
#[command(name = "identity-session")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login(session::LoginArgs),

    /// Create an account and sign in
    Register(session::RegisterArgs),

    /// Show the current session
    Whoami,

    /// Sign out and forget the stored token
    Logout,

    /// Change the signed-in user's name and email
    UpdateProfile(session::UpdateProfileArgs),

    /// Evaluate the view guard against the current session
    Guard(session::GuardArgs),
}
