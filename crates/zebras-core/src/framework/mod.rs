//! Framework layer: handlers, middleware, routing, registration and rules.

pub mod handler;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod rules;
