//! HTTP front for the Chirpy authentication core.

pub mod api;
pub mod config;
pub mod logging;
pub mod membership;
