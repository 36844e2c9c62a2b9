// handlers/public/mod.rs - Handlers that need no session
//
// Stored images are referenced by URL from workspace and project documents,
// so they are served without authentication.

pub mod files;
