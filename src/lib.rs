//! Paygate - payment webhook gateway with an account ledger
//!
//! This library provides the core functionality for the Paygate service,
//! including webhook signature verification, the idempotent ledger pipeline,
//! user and account storage, JWT authentication, and API handlers.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod util;
pub mod webhook;
