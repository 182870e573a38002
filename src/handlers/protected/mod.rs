// handlers/protected/mod.rs - Protected handlers (Auth Gate required)
//
// Every handler here can rely on a `CurrentUser` extension.
pub mod auth;
pub mod chat;
pub mod contracts;
