// handlers/protected/mod.rs - Handlers behind the session middleware
//
// Route Prefix: /api/*
// Every handler receives the caller as `Extension<AuthUser>`; workspace
// scoped operations additionally pass the membership gate in the services.

pub mod auth;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod workspaces;
