use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "ADMIN",
            MemberRole::Member => "MEMBER",
        }
    }
}

/// Grants a user access to one workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub role: MemberRole,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: MemberRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roles_use_upper_case_names() {
        assert_eq!(serde_json::to_value(MemberRole::Admin).unwrap(), json!("ADMIN"));
        let req: UpdateMemberRequest = serde_json::from_value(json!({ "role": "MEMBER" })).unwrap();
        assert_eq!(req.role, MemberRole::Member);
        assert!(serde_json::from_value::<UpdateMemberRequest>(json!({ "role": "OWNER" })).is_err());
    }
}
