use serde::{Deserialize, Serialize};

/// Identity supplied by the bearer token. Never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    /// Single uppercase letter for avatar placeholders
    pub fn avatar_fallback(&self) -> char {
        self.name
            .chars()
            .next()
            .or_else(|| self.email.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "user"
        } else {
            &self.name
        }
    }
}
