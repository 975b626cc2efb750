//! Business logic layer
//!
//! Services for sessions, configuration and the generic resource controller,
//! plus the process-wide notification bus and the route guard.

pub mod notifications;
pub mod resources;
pub mod route_guard;
pub mod services;
