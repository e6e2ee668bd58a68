// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth when SECURITY_REQUIRE_AUTH is on)

pub mod protected; // /api/*
pub mod public; // /, /health
