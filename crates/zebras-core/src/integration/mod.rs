//! Integration layer: boundary traits for external collaborators.

pub mod client;
