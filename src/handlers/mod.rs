// handlers/mod.rs - Handler tiers
//
// Public (no credential) and protected (Auth Gate applied by the router).
pub mod protected;
pub mod public;
