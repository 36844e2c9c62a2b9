// handlers/mod.rs - HTTP handlers in two tiers
//
// Public (no session) → Protected (bearer token, /api/*)
// Handlers only translate HTTP to service calls; authorization and store
// access live in `crate::services`.

pub mod forms;
pub mod protected;
pub mod public;
