//! Story model consumed by code generation: components, bindings, code
//! blocks and the slot table.

pub mod binding;
pub mod code_block;
pub mod component;
pub mod dialogue;
pub mod model;
