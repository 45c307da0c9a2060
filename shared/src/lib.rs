//! Configuration shared by the Turnstile crates.

pub mod config;
