// handlers/mod.rs - handlers grouped by security tier
//
// Public (no auth) → Protected (bearer token required)
pub mod public;
pub mod protected;
