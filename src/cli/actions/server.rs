use crate::{api, api::handlers::auth::AuthConfig, cli::actions::Action};
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            client_url,
            token_key,
            token_issuer,
            session_ttl_days,
            action_secret_ttl_seconds,
        } => {
            let config = AuthConfig::new(client_url)
                .with_token_issuer(token_issuer)
                .with_session_ttl_days(session_ttl_days)
                .with_action_secret_ttl_seconds(action_secret_ttl_seconds);

            api::new(port, dsn, config, token_key).await?;
        }
    }

    Ok(())
}
