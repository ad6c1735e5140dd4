// nueats/functions/src/lib.rs

//! NuEats order-lifecycle functions: the auto-ready sweep, payment initiation
//! and reconciliation, and order e-mails, served over HTTP by
//! `nueats_functions_server` and driven by `nueats_core` pipelines.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod readiness;
pub mod services;
pub mod state;
pub mod web;
