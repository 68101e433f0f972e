use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let token_key = matches
        .get_one::<String>("token-key")
        .cloned()
        .context("missing required argument: --token-key")?;

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one::<String>("dsn")
            .cloned()
            .context("missing required argument: --dsn")?,
        client_url: matches
            .get_one::<String>("client-url")
            .cloned()
            .context("missing required argument: --client-url")?,
        token_key: SecretString::from(token_key),
        token_issuer: matches
            .get_one::<String>("token-issuer")
            .cloned()
            .unwrap_or_else(|| "ingresso".to_string()),
        session_ttl_days: matches
            .get_one::<i64>("session-ttl-days")
            .copied()
            .unwrap_or(7),
        action_secret_ttl_seconds: matches
            .get_one::<i64>("action-secret-ttl")
            .copied()
            .unwrap_or(86400),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn maps_matches_to_server_action() {
        temp_env::with_vars([("INGRESSO_LOG_LEVEL", None::<String>)], || {
            let matches = commands::new().get_matches_from(vec![
                "ingresso",
                "--port",
                "9000",
                "--dsn",
                "postgres://user@localhost:5432/ingresso",
                "--client-url",
                "https://app.ingresso.dev",
                "--token-key",
                "super-secret-key",
                "--session-ttl-days",
                "14",
            ]);

            let action = handler(&matches).expect("handler failed");
            let Action::Server {
                port,
                dsn,
                client_url,
                token_key,
                token_issuer,
                session_ttl_days,
                action_secret_ttl_seconds,
            } = action;

            assert_eq!(port, 9000);
            assert_eq!(dsn, "postgres://user@localhost:5432/ingresso");
            assert_eq!(client_url, "https://app.ingresso.dev");
            assert_eq!(token_key.expose_secret(), "super-secret-key");
            assert_eq!(token_issuer, "ingresso");
            assert_eq!(session_ttl_days, 14);
            assert_eq!(action_secret_ttl_seconds, 86400);
        });
    }
}
