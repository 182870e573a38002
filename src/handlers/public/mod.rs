// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account creation, credential acquisition and logout.
pub mod auth;
