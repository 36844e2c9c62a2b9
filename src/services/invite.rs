use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Random alphanumeric invite code of `length` characters
pub fn generate_invite_code(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(1))
        .map(char::from)
        .collect()
}

/// Link a workspace member shares to invite someone
pub fn invite_link(origin: &str, workspace_id: &str, invite_code: &str) -> String {
    format!("{}/workspaces/{}/join/{}", origin.trim_end_matches('/'), workspace_id, invite_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_alphanumeric_with_requested_length() {
        let code = generate_invite_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_invite_code(12), generate_invite_code(12));
    }

    #[test]
    fn link_joins_origin_and_code() {
        assert_eq!(
            invite_link("https://plan.example/", "w1", "AbC123"),
            "https://plan.example/workspaces/w1/join/AbC123"
        );
    }
}
