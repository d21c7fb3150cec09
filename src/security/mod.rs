mod compiler;

pub use compiler::{compile_grants, effective_grants, CompiledGrant, GrantOrigin};
