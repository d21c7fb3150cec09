use std::collections::{HashMap, HashSet};
use tracing::debug;
use crate::loader::paths;
use crate::state::{Grant, PrivilegePreset, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOrigin {
    Explicit,
    Binding,
}

impl GrantOrigin {
    /// Document the grant was declared in.
    pub fn source_path(&self) -> &'static str {
        match self {
            GrantOrigin::Explicit => paths::GRANTS,
            GrantOrigin::Binding => paths::BINDINGS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGrant {
    pub grant: Grant,
    pub origin: GrantOrigin,
}

/// Explicit grants followed by every grant synthesized from preset bindings,
/// deduplicated by the full grant tuple. The first occurrence wins, so an
/// explicit grant keeps its origin even when a binding also produces it.
///
/// A binding naming an unknown preset contributes nothing; the validator
/// reports it.
pub fn compile_grants(state: &State) -> Vec<CompiledGrant> {
    let presets: HashMap<&str, &PrivilegePreset> = state
        .privilege_presets
        .iter()
        .map(|p| (p.name.as_str(), p))
        .collect();

    let explicit = state.grants.iter().cloned().map(|grant| CompiledGrant {
        grant,
        origin: GrantOrigin::Explicit,
    });

    let expanded = state.bindings.iter().flat_map(|b| {
        let privileges = presets
            .get(b.preset.as_str())
            .map(|p| p.privileges.as_slice())
            .unwrap_or_default();
        privileges.iter().map(move |privilege| CompiledGrant {
            grant: Grant::new(&b.principal, &b.principal_type, &b.scope_type, &b.scope, privilege),
            origin: GrantOrigin::Binding,
        })
    });

    let mut seen = HashSet::new();
    let compiled: Vec<CompiledGrant> = explicit
        .chain(expanded)
        .filter(|c| seen.insert(c.grant.clone()))
        .collect();

    debug!(
        "Compiled {} effective grants ({} explicit, {} bindings)",
        compiled.len(),
        state.grants.len(),
        state.bindings.len()
    );
    compiled
}

/// The grant list the differ compares: explicit plus expanded, without duplicates.
pub fn effective_grants(state: &State) -> Vec<Grant> {
    compile_grants(state).into_iter().map(|c| c.grant).collect()
}
