pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        client_url: String,
        token_key: SecretString,
        token_issuer: String,
        session_ttl_days: i64,
        action_secret_ttl_seconds: i64,
    },
}
