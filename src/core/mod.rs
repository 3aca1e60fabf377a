//! Core library components.

pub mod envelope;
pub mod kms;
pub mod materialize;
pub mod project;
pub mod resolver;
pub mod scope;
pub mod store;
pub mod validation;
pub mod variables;
