//! staffdesk - employee registration and department management
//!
//! The library holds the record model, the multi-section form engine, the
//! document store and its gateways, authentication, and the terminal UI.
//! The `staffdesk` binary wires them to the command line.

pub mod app;
pub mod auth;
pub mod config;
pub mod form;
pub mod gateway;
pub mod logging;
pub mod services;
pub mod store;
pub mod types;
pub mod ui;
