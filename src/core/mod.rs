//! The generation engine: fragments, contexts, naming and the resolution
//! driver, plus the top-level generator.

pub mod bindings;
pub mod context;
pub mod dictionary;
pub mod error;
pub mod factory;
pub mod fragment;
pub mod generator;
pub mod legal;
pub mod namifier;
pub mod pass;
pub mod resolve;
pub mod series;
