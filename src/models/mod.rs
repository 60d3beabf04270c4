// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod coordinate;
pub mod menu;
pub mod proximity;
pub mod restaurant;
pub mod visit;

pub use coordinate::*;
pub use menu::*;
pub use proximity::*;
pub use restaurant::*;
pub use visit::*;
