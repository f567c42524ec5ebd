//! Trialflow - Trial Onboarding Engine
//!
//! Scores inbound companies on a weighted risk model, recommends a commercial
//! package, and runs each trial through its lifecycle: scheduled
//! notifications with retry, expiry, conversion with partner commission, and
//! archival.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
