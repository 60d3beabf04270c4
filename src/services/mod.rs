// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod aggregator;
pub mod cache;
pub mod cuisine_resolver;
pub mod directory_client;
pub mod geo;
pub mod google_places_client;
pub mod nearby_service;
pub mod proximity;
pub mod visit_recorder;

pub use aggregator::*;
pub use cache::*;
pub use cuisine_resolver::*;
pub use directory_client::*;
pub use geo::*;
pub use google_places_client::*;
pub use nearby_service::*;
pub use proximity::*;
pub use visit_recorder::*;
