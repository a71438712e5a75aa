// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod check_service;
pub mod metric_shapes;
pub mod ojet_queries;
pub mod striim_client;
pub mod table_renderer;

pub use check_service::*;
pub use ojet_queries::OjetQuery;
pub use striim_client::*;
