//! CLI entry point for hitos.

pub mod auth;
pub mod resource;

use clap::{Parser, Subcommand};

/// hitos backend CLI
#[derive(Parser, Debug)]
#[command(name = "hitos", version, about = "hitos: compliance console API client")]
pub struct Cli {
    /// Backend base URL (overrides HITOS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// GET a resource and print the JSON response
    Get(GetArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in with username and password
    Login(LoginArgs),
    /// Show the stored session
    Status,
    /// Remove the stored credential
    Logout,
}

/// Arguments for `hitos auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    /// Password; read from stdin when omitted
    #[arg(short, long, env = "HITOS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for `hitos get`.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Resource path, e.g. /clients
    pub path: String,

    /// Query parameters as key=value
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_auth_login() {
        let cli = Cli::try_parse_from(["hitos", "auth", "login", "-u", "ana", "-p", "pw"]).unwrap();
        match cli.command {
            Commands::Auth(auth) => match auth.command {
                AuthCommands::Login(args) => {
                    assert_eq!(args.username, "ana");
                    assert_eq!(args.password.as_deref(), Some("pw"));
                }
                other => panic!("expected Login, got {other:?}"),
            },
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_auth_status() {
        let cli = Cli::try_parse_from(["hitos", "auth", "status"]).unwrap();
        match cli.command {
            Commands::Auth(auth) => assert!(matches!(auth.command, AuthCommands::Status)),
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_get_with_query_and_api_url() {
        let cli = Cli::try_parse_from([
            "hitos",
            "--api-url",
            "http://backend:8000",
            "get",
            "/clients",
            "-q",
            "page=2",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:8000"));
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.path, "/clients");
                assert_eq!(args.query, vec![("page".to_string(), "2".to_string())]);
            }
            other => panic!("expected Get, got {other:?}"),
        }
    }

    #[test]
    fn parse_get_rejects_bad_query() {
        assert!(Cli::try_parse_from(["hitos", "get", "/clients", "-q", "page"]).is_err());
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["hitos"]).is_err());
    }
}
