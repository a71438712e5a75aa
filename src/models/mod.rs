// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod connection;
pub mod monitor;
pub mod query;

pub use connection::*;
pub use monitor::*;
pub use query::*;
