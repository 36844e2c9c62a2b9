use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config;

/// Signs a session token with the server's configured secret
pub fn handle(user_id: &str, name: &str, email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let claims = Claims::new(user_id, name, email, security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token created",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
