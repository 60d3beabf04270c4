// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod health;
pub mod menu;
pub mod nearby;
pub mod photos;
pub mod proximity;
pub mod visits;

pub use health::config as health_config;
pub use menu::config as menu_config;
pub use nearby::config as nearby_config;
pub use photos::config as photos_config;
pub use proximity::config as proximity_config;
pub use visits::config as visits_config;
