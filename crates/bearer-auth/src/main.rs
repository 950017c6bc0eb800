//! bearer-check
//!
//! Validates one bearer token against the `BEARER_*` environment
//! configuration and prints the resulting identity or challenge.
//!
//! Exit codes: 0 accepted, 1 rejected, 2 configuration or input error.

use bearer_auth::challenge::www_authenticate;
use bearer_auth::{AuthConfig, BearerAuthenticator, Decision};
use clap::Parser;
use std::io::{self, Read};
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Check a bearer token against the configured key and claims policy.
#[derive(Parser, Debug)]
#[command(name = "bearer-check", version, about)]
struct Args {
    /// Token to check. Read from stdin when omitted or "-".
    token: Option<String>,

    /// Treat the input as a full Authorization header value.
    #[arg(long, default_value_t = false)]
    header: bool,
}

fn read_input(token: Option<String>) -> io::Result<String> {
    match token {
        Some(token) if token != "-" => Ok(token),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim().to_string())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bearer_auth=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    if config.realm_authentication {
        warn!("No identity store is available to bearer-check; disabling realm authentication");
        config.realm_authentication = false;
    }

    let authenticator = match BearerAuthenticator::builder(config).build() {
        Ok(authenticator) => authenticator,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    let input = match read_input(args.token) {
        Ok(input) => input,
        Err(e) => {
            error!("Failed to read token from stdin: {}", e);
            return ExitCode::from(2);
        }
    };

    let authorization = if args.header {
        input
    } else {
        format!("Bearer {input}")
    };

    match authenticator.authenticate(Some(&authorization)) {
        Decision::Accepted(identity) => {
            info!(roles = identity.roles.len(), "Token accepted");
            println!("subject: {}", identity.subject);
            println!(
                "roles: {}",
                identity.roles.iter().cloned().collect::<Vec<_>>().join(",")
            );
            ExitCode::SUCCESS
        }
        Decision::Rejected(rejection) => {
            println!(
                "WWW-Authenticate: {}",
                www_authenticate(authenticator.realm_name(), &rejection)
            );
            ExitCode::from(1)
        }
    }
}
