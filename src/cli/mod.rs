//! CLI module - Command-line interface for Brink
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Brink - flight records API server
#[derive(Parser)]
#[command(name = "brink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage user roles
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage service accounts that post flight data
    #[command(name = "api-user")]
    ApiUser {
        #[command(subcommand)]
        command: ApiUserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Grant the admin role
    Promote {
        /// Username
        username: String,
    },
    /// Revoke the admin role
    Demote {
        /// Username
        username: String,
    },
}

#[derive(Subcommand)]
pub enum ApiUserCommands {
    /// Add an api user
    Add {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// Remove an api user
    #[command(alias = "rm")]
    Remove {
        /// Username
        username: String,
    },
}

pub use commands::*;
