//! Port traits for the external collaborators.

pub mod calendar_port;
pub mod config_port;
pub mod data_port;
