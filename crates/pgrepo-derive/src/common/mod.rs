//! Common utilities shared across macro modules.

pub mod attrs;
pub mod syn_types;
