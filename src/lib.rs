//! Savings calculator and investment projection bot.

pub mod api;
pub mod core;
pub mod market;
pub mod store;
