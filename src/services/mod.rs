//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and pagination.

pub mod component;
pub mod installation;
pub mod prepare;
pub mod signing;
