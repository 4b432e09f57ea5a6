//!
//! tubelink
//! --------
//! Session-cookie bridge and bookmark API for YouTube timestamps.
//!
//! - `cookies`: read the request `Cookie` header, stage `Set-Cookie` mutations, flush them onto a response.
//! - `identity`: the auth provider seam and the per-request `SessionBridge`.
//! - `supabase`: GoTrue session provider and PostgREST bookmark store.
//! - `store`: bookmark model and the store seam.
//! - `server`: axum routes and the authorized request lifecycle.

pub mod config;
pub mod cookies;
pub mod error;
pub mod identity;
pub mod server;
pub mod store;
pub mod supabase;
pub mod video;

// Test-only printing helper: expands to eprintln! during tests and debug builds.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
