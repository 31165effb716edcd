//! CLI module - Command-line interface for Pantry
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Pantry - recipe management backend
#[derive(Parser)]
#[command(name = "pantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Create an account with staff and superuser flags
    CreateSuperuser {
        /// Login email
        #[arg(long)]
        email: String,

        /// Password (at least the configured minimum length)
        #[arg(long)]
        password: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Write a default config.toml if none exists
    Init,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_parses() {
        let cli = Cli::try_parse_from(["pantry"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_superuser_arguments() {
        let cli = Cli::try_parse_from([
            "pantry",
            "create-superuser",
            "--email",
            "admin@example.com",
            "--password",
            "secret123",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::CreateSuperuser {
                email,
                password,
                name,
            }) => {
                assert_eq!(email, "admin@example.com");
                assert_eq!(password, "secret123");
                assert_eq!(name, "");
            }
            _ => panic!("expected create-superuser"),
        }
    }

    #[test]
    fn create_superuser_requires_email() {
        assert!(Cli::try_parse_from(["pantry", "create-superuser", "--password", "x"]).is_err());
    }
}
