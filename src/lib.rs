//! Palisade - Route-level RBAC authorization service
//!
//! This library provides the authorization core for the Palisade service:
//! a role → permission catalog, a compiled route pattern table, and a pure
//! per-request decision engine, plus the HTTP boundary that maps decisions
//! to transport responses.

pub mod authz;
pub mod identity;
pub mod settings;
pub mod web;
