use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, info};
use crate::loader::paths;
use crate::model::ResourceKind;
use crate::security::{compile_grants, CompiledGrant};
use crate::state::{
    ColumnDef, ColumnMaskSet, ColumnMaskSpec, Contract, ModelSpec, PipelineJob, RowFilterSet,
    RowFilterSpec, State, StorageCredential, TableSpec,
};
use super::fields::Changes;
use super::plan::{Action, FieldDiff, Plan};

type DiffFn = fn(&State, &State, &mut Plan);

/// One entry per top-level kind. Child kinds (memberships, bindings, jobs) are
/// emitted by their parent's entry.
const DIFFERS: &[(ResourceKind, DiffFn)] = &[
    (ResourceKind::Principal, diff_principals),
    (ResourceKind::Group, diff_groups),
    (ResourceKind::PrivilegeGrant, diff_grants),
    (ResourceKind::CatalogRegistration, diff_catalogs),
    (ResourceKind::Schema, diff_schemas),
    (ResourceKind::Table, diff_tables),
    (ResourceKind::View, diff_views),
    (ResourceKind::Volume, diff_volumes),
    (ResourceKind::RowFilter, diff_row_filters),
    (ResourceKind::ColumnMask, diff_column_masks),
    (ResourceKind::Tag, diff_tags),
    (ResourceKind::TagAssignment, diff_tag_assignments),
    (ResourceKind::StorageCredential, diff_storage_credentials),
    (ResourceKind::ExternalLocation, diff_external_locations),
    (ResourceKind::ComputeEndpoint, diff_compute_endpoints),
    (ResourceKind::ComputeAssignment, diff_compute_assignments),
    (ResourceKind::ApiKey, diff_api_keys),
    (ResourceKind::Notebook, diff_notebooks),
    (ResourceKind::Pipeline, diff_pipelines),
    (ResourceKind::Model, diff_models),
    (ResourceKind::Macro, diff_macros),
];

/// Computes the ordered plan that converges actual state to desired state.
#[derive(Debug, Default)]
pub struct Differ;

impl Differ {
    pub fn new() -> Self {
        Self
    }

    pub fn diff(&self, desired: &State, actual: &State) -> Plan {
        let mut plan = Plan::new();
        for (kind, diff_kind) in DIFFERS {
            let before = (plan.actions.len(), plan.errors.len());
            diff_kind(desired, actual, &mut plan);
            debug!(
                "{}: {} action(s), {} error(s)",
                kind,
                plan.actions.len() - before.0,
                plan.errors.len() - before.1
            );
        }
        plan.sort_actions();

        let summary = plan.summary();
        info!(
            "Plan: {} to create, {} to update, {} to delete, {} error(s)",
            summary.creates, summary.updates, summary.deletes, summary.errors
        );
        plan
    }

    pub fn registered_kinds() -> impl Iterator<Item = ResourceKind> {
        DIFFERS.iter().map(|(kind, _)| *kind)
    }
}

/// Shorthand for `Differ::new().diff(desired, actual)`.
pub fn diff(desired: &State, actual: &State) -> Plan {
    Differ::new().diff(desired, actual)
}

/// Desired and actual records matched by identity key.
struct Pairing<'a, T> {
    created: Vec<&'a T>,
    matched: Vec<(&'a T, &'a T)>,
    deleted: Vec<&'a T>,
}

fn pair<'a, T, K, F>(desired: &'a [T], actual: &'a [T], key: F) -> Pairing<'a, T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let by_key: HashMap<K, &T> = actual.iter().map(|a| (key(a), a)).collect();
    let wanted: HashSet<K> = desired.iter().map(&key).collect();

    let mut pairing = Pairing {
        created: Vec::new(),
        matched: Vec::new(),
        deleted: Vec::new(),
    };
    for d in desired {
        match by_key.get(&key(d)) {
            Some(a) => pairing.matched.push((d, *a)),
            None => pairing.created.push(d),
        }
    }
    pairing.deleted = actual.iter().filter(|a| !wanted.contains(&key(a))).collect();
    pairing
}

fn delete_unless_protected(plan: &mut Plan, kind: ResourceKind, name: &str, protected: bool, noun: &str) {
    if protected {
        plan.error(kind, name, format!("cannot delete {}: deletion_protection is enabled", noun));
    } else {
        plan.push(Action::delete(kind, name));
    }
}

fn diff_principals(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Principal;
    let pairing = pair(&desired.principals, &actual.principals, |p| p.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::PRINCIPALS));
    }
    for (d, a) in pairing.matched {
        // Principal type is fixed at creation; a changed type is not an update.
        let mut changes = Changes::new();
        changes.flag("is_admin", a.is_admin, d.is_admin);
        changes.emit(plan, kind, &d.name, paths::PRINCIPALS);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, &a.name));
    }
}

fn membership_name(group: &str, member: &str, member_type: &str) -> String {
    format!("{}/{}({})", group, member, member_type)
}

fn diff_groups(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Group;
    let membership = ResourceKind::GroupMembership;
    let pairing = pair(&desired.groups, &actual.groups, |g| g.name.clone());

    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::GROUPS));
        for m in &d.members {
            plan.push(Action::create(membership, membership_name(&d.name, &m.name, &m.member_type), paths::GROUPS));
        }
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes.text("description", &a.description, &d.description);
        changes.emit(plan, kind, &d.name, paths::GROUPS);

        let members = pair(&d.members, &a.members, |m| (m.name.clone(), m.member_type.clone()));
        for m in members.created {
            plan.push(Action::create(membership, membership_name(&d.name, &m.name, &m.member_type), paths::GROUPS));
        }
        for m in members.deleted {
            plan.push(Action::delete(membership, membership_name(&d.name, &m.name, &m.member_type)));
        }
    }
    for a in pairing.deleted {
        for m in &a.members {
            plan.push(Action::delete(membership, membership_name(&a.name, &m.name, &m.member_type)));
        }
        plan.push(Action::delete(kind, &a.name));
    }
}

fn grant_name(c: &CompiledGrant) -> String {
    let g = &c.grant;
    format!(
        "{}:{} {} on {}.{}",
        g.principal_type, g.principal, g.privilege, g.securable_type, g.securable
    )
}

/// Grants carry no updatable fields: the whole tuple is the identity.
fn diff_grants(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::PrivilegeGrant;
    let wanted = compile_grants(desired);
    let current = compile_grants(actual);
    let pairing = pair(&wanted, &current, |c| c.grant.clone());

    for d in pairing.created {
        plan.push(Action::create(kind, grant_name(d), d.origin.source_path()));
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, grant_name(a)));
    }
}

fn diff_catalogs(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::CatalogRegistration;
    let pairing = pair(&desired.catalogs, &actual.catalogs, |c| c.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::catalog(&d.name)));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("metastore_type", &a.spec.metastore_type, &d.spec.metastore_type)
            .text("dsn", &a.spec.dsn, &d.spec.dsn)
            .text("data_path", &a.spec.data_path, &d.spec.data_path)
            .flag("is_default", a.spec.is_default, d.spec.is_default)
            .text("comment", &a.spec.comment, &d.spec.comment);
        changes.emit(plan, kind, &d.name, &paths::catalog(&d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.name, a.deletion_protection, "catalog");
    }
}

fn diff_schemas(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Schema;
    let pairing = pair(&desired.schemas, &actual.schemas, |s| s.full_name());
    for d in pairing.created {
        plan.push(Action::create(kind, d.full_name(), paths::schema(&d.catalog, &d.name)));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("comment", &a.spec.comment, &d.spec.comment)
            .text("owner", &a.spec.owner, &d.spec.owner)
            .text("location_name", &a.spec.location_name, &d.spec.location_name)
            .map("properties", &a.spec.properties, &d.spec.properties);
        changes.emit(plan, kind, &d.full_name(), &paths::schema(&d.catalog, &d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.full_name(), a.deletion_protection, "schema");
    }
}

fn diff_tables(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Table;
    let pairing = pair(&desired.tables, &actual.tables, |t| t.full_name());
    for d in pairing.created {
        plan.push(Action::create(kind, d.full_name(), paths::table(&d.catalog, &d.schema, &d.name)));
    }
    for (d, a) in pairing.matched {
        let name = d.full_name();
        let mut changes = Changes::new();
        changes
            .text("table_type", &a.spec.table_type, &d.spec.table_type)
            .text("comment", &a.spec.comment, &d.spec.comment)
            .text("owner", &a.spec.owner, &d.spec.owner)
            .map("properties", &a.spec.properties, &d.spec.properties)
            .text("source_path", &a.spec.source_path, &d.spec.source_path)
            .text("file_format", &a.spec.file_format, &d.spec.file_format)
            .text("location_name", &a.spec.location_name, &d.spec.location_name);

        // A column type change blocks the whole update.
        if diff_columns(plan, &name, &mut changes, &a.spec, &d.spec) {
            continue;
        }
        changes.emit(plan, kind, &name, &paths::table(&d.catalog, &d.schema, &d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.full_name(), a.deletion_protection, "table");
    }
}

fn column_label(c: &ColumnDef) -> String {
    format!("{} {}", c.name, c.column_type)
}

/// Adds `columns.*` diffs; returns true when a column type change was reported.
fn diff_columns(plan: &mut Plan, table: &str, changes: &mut Changes, actual: &TableSpec, desired: &TableSpec) -> bool {
    let pairing = pair(&desired.columns, &actual.columns, |c| c.name.clone());
    let mut type_changed = false;

    for d in pairing.created {
        changes.push(FieldDiff::new(format!("columns.{}", d.name), "", column_label(d)));
    }
    for (d, a) in pairing.matched {
        if a.column_type != d.column_type {
            plan.error(
                ResourceKind::Table,
                table,
                format!(
                    "column {:?}: cannot change type from {:?} to {:?}",
                    d.name, a.column_type, d.column_type
                ),
            );
            type_changed = true;
            continue;
        }
        changes.text(&format!("columns.{}.comment", d.name), &a.comment, &d.comment);
    }
    for a in pairing.deleted {
        changes.push(FieldDiff::new(format!("columns.{}", a.name), column_label(a), ""));
    }
    type_changed
}

fn diff_views(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::View;
    let pairing = pair(&desired.views, &actual.views, |v| v.full_name());
    for d in pairing.created {
        plan.push(Action::create(kind, d.full_name(), paths::view(&d.catalog, &d.schema, &d.name)));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("view_definition", &a.spec.view_definition, &d.spec.view_definition)
            .text("comment", &a.spec.comment, &d.spec.comment)
            .text("owner", &a.spec.owner, &d.spec.owner)
            .map("properties", &a.spec.properties, &d.spec.properties);
        changes.emit(plan, kind, &d.full_name(), &paths::view(&d.catalog, &d.schema, &d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.full_name(), a.deletion_protection, "view");
    }
}

fn diff_volumes(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Volume;
    let pairing = pair(&desired.volumes, &actual.volumes, |v| v.full_name());
    for d in pairing.created {
        plan.push(Action::create(kind, d.full_name(), paths::volume(&d.catalog, &d.schema, &d.name)));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("volume_type", &a.spec.volume_type, &d.spec.volume_type)
            .text("storage_location", &a.spec.storage_location, &d.spec.storage_location)
            .text("comment", &a.spec.comment, &d.spec.comment)
            .text("owner", &a.spec.owner, &d.spec.owner);
        changes.emit(plan, kind, &d.full_name(), &paths::volume(&d.catalog, &d.schema, &d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.full_name(), a.deletion_protection, "volume");
    }
}

fn binding_name(parent: &str, principal_type: &str, principal: &str) -> String {
    format!("{}->{}:{}", parent, principal_type, principal)
}

/// A row filter flattened out of its per-table set.
struct FilterEntry<'a> {
    key: String,
    path: String,
    spec: &'a RowFilterSpec,
}

fn flatten_filters(sets: &[RowFilterSet]) -> Vec<FilterEntry<'_>> {
    sets.iter()
        .flat_map(|set| {
            let table = set.table_name();
            let path = paths::row_filters(&set.catalog, &set.schema, &set.table);
            set.filters.iter().map(move |spec| FilterEntry {
                key: format!("{}/{}", table, spec.name),
                path: path.clone(),
                spec,
            })
        })
        .collect()
}

fn diff_row_filters(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::RowFilter;
    let child = ResourceKind::RowFilterBinding;
    let wanted = flatten_filters(&desired.row_filters);
    let current = flatten_filters(&actual.row_filters);
    let pairing = pair(&wanted, &current, |e| e.key.clone());

    for d in pairing.created {
        plan.push(Action::create(kind, &d.key, &d.path));
        for b in &d.spec.bindings {
            plan.push(Action::create(child, binding_name(&d.key, &b.principal_type, &b.principal), &d.path));
        }
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("filter_sql", &a.spec.filter_sql, &d.spec.filter_sql)
            .text("description", &a.spec.description, &d.spec.description);
        changes.emit(plan, kind, &d.key, &d.path);

        let bindings = pair(&d.spec.bindings, &a.spec.bindings, |b| {
            (b.principal.clone(), b.principal_type.clone())
        });
        for b in bindings.created {
            plan.push(Action::create(child, binding_name(&d.key, &b.principal_type, &b.principal), &d.path));
        }
        for b in bindings.deleted {
            plan.push(Action::delete(child, binding_name(&d.key, &b.principal_type, &b.principal)));
        }
    }
    for a in pairing.deleted {
        for b in &a.spec.bindings {
            plan.push(Action::delete(child, binding_name(&a.key, &b.principal_type, &b.principal)));
        }
        plan.push(Action::delete(kind, &a.key));
    }
}

struct MaskEntry<'a> {
    key: String,
    path: String,
    spec: &'a ColumnMaskSpec,
}

fn flatten_masks(sets: &[ColumnMaskSet]) -> Vec<MaskEntry<'_>> {
    sets.iter()
        .flat_map(|set| {
            let table = set.table_name();
            let path = paths::column_masks(&set.catalog, &set.schema, &set.table);
            set.masks.iter().map(move |spec| MaskEntry {
                key: format!("{}/{}", table, spec.name),
                path: path.clone(),
                spec,
            })
        })
        .collect()
}

fn diff_column_masks(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::ColumnMask;
    let child = ResourceKind::ColumnMaskBinding;
    let wanted = flatten_masks(&desired.column_masks);
    let current = flatten_masks(&actual.column_masks);
    let pairing = pair(&wanted, &current, |e| e.key.clone());

    for d in pairing.created {
        plan.push(Action::create(kind, &d.key, &d.path));
        for b in &d.spec.bindings {
            plan.push(Action::create(child, binding_name(&d.key, &b.principal_type, &b.principal), &d.path));
        }
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("column_name", &a.spec.column_name, &d.spec.column_name)
            .text("mask_expression", &a.spec.mask_expression, &d.spec.mask_expression)
            .text("description", &a.spec.description, &d.spec.description);
        changes.emit(plan, kind, &d.key, &d.path);

        let bindings = pair(&d.spec.bindings, &a.spec.bindings, |b| {
            (b.principal.clone(), b.principal_type.clone())
        });
        for b in bindings.created {
            plan.push(Action::create(child, binding_name(&d.key, &b.principal_type, &b.principal), &d.path));
        }
        for (db, ab) in bindings.matched {
            let mut changes = Changes::new();
            changes.flag("see_original", ab.see_original, db.see_original);
            changes.emit(plan, child, &binding_name(&d.key, &db.principal_type, &db.principal), &d.path);
        }
        for b in bindings.deleted {
            plan.push(Action::delete(child, binding_name(&d.key, &b.principal_type, &b.principal)));
        }
    }
    for a in pairing.deleted {
        for b in &a.spec.bindings {
            plan.push(Action::delete(child, binding_name(&a.key, &b.principal_type, &b.principal)));
        }
        plan.push(Action::delete(kind, &a.key));
    }
}

fn diff_tags(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Tag;
    let pairing = pair(&desired.tags, &actual.tags, |t| t.identity());
    for d in pairing.created {
        plan.push(Action::create(kind, d.identity(), paths::TAGS));
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, a.identity()));
    }
}

fn diff_tag_assignments(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::TagAssignment;
    let pairing = pair(&desired.tag_assignments, &actual.tag_assignments, |t| t.identity());
    for d in pairing.created {
        plan.push(Action::create(kind, d.identity(), paths::TAGS));
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, a.identity()));
    }
}

fn configured<T>(value: &Option<T>) -> &'static str {
    if value.is_some() {
        "configured"
    } else {
        ""
    }
}

/// Secrets are never readable from the server, so only their non-secret settings are compared.
fn diff_credential_details(changes: &mut Changes, a: &StorageCredential, d: &StorageCredential) {
    match (&a.s3, &d.s3) {
        (Some(a3), Some(d3)) => {
            changes
                .text("s3.endpoint", &a3.endpoint, &d3.endpoint)
                .text("s3.region", &a3.region, &d3.region)
                .text("s3.url_style", &a3.url_style, &d3.url_style);
        }
        (old, new) => {
            changes.text("s3", configured(old), configured(new));
        }
    }
    match (&a.azure, &d.azure) {
        (Some(az), Some(dz)) => {
            changes.text("azure.tenant_id", &az.tenant_id, &dz.tenant_id);
        }
        (old, new) => {
            changes.text("azure", configured(old), configured(new));
        }
    }
    match (&a.gcs, &d.gcs) {
        (Some(ag), Some(dg)) => {
            changes.text("gcs.key_file_path", &ag.key_file_path, &dg.key_file_path);
        }
        (old, new) => {
            changes.text("gcs", configured(old), configured(new));
        }
    }
}

fn diff_storage_credentials(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::StorageCredential;
    let pairing = pair(&desired.storage_credentials, &actual.storage_credentials, |c| c.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::STORAGE_CREDENTIALS));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("credential_type", &a.credential_type, &d.credential_type)
            .text("comment", &a.comment, &d.comment);
        diff_credential_details(&mut changes, a, d);
        changes.emit(plan, kind, &d.name, paths::STORAGE_CREDENTIALS);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, &a.name));
    }
}

fn diff_external_locations(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::ExternalLocation;
    let pairing = pair(&desired.external_locations, &actual.external_locations, |l| l.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::EXTERNAL_LOCATIONS));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("url", &a.url, &d.url)
            .text("credential_name", &a.credential_name, &d.credential_name)
            .text("storage_type", &a.storage_type, &d.storage_type)
            .text("comment", &a.comment, &d.comment)
            .flag("read_only", a.read_only, d.read_only);
        changes.emit(plan, kind, &d.name, paths::EXTERNAL_LOCATIONS);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, &a.name));
    }
}

fn diff_compute_endpoints(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::ComputeEndpoint;
    let pairing = pair(&desired.compute_endpoints, &actual.compute_endpoints, |e| e.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::COMPUTE_ENDPOINTS));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("url", &a.url, &d.url)
            .text("type", &a.endpoint_type, &d.endpoint_type)
            .text("size", &a.size, &d.size)
            .number("max_memory_gb", a.max_memory_gb, d.max_memory_gb);
        changes.emit(plan, kind, &d.name, paths::COMPUTE_ENDPOINTS);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, &a.name));
    }
}

fn diff_compute_assignments(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::ComputeAssignment;
    let pairing = pair(&desired.compute_assignments, &actual.compute_assignments, |c| c.identity());
    for d in pairing.created {
        plan.push(Action::create(kind, d.identity(), paths::COMPUTE_ASSIGNMENTS));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .flag("is_default", a.is_default, d.is_default)
            .flag("fallback_local", a.fallback_local, d.fallback_local);
        changes.emit(plan, kind, &d.identity(), paths::COMPUTE_ASSIGNMENTS);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, a.identity()));
    }
}

fn diff_api_keys(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::ApiKey;
    let pairing = pair(&desired.api_keys, &actual.api_keys, |k| k.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::API_KEYS));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("principal", &a.principal, &d.principal)
            .optional("expires_at", a.expires_at.as_deref(), d.expires_at.as_deref());
        changes.emit(plan, kind, &d.name, paths::API_KEYS);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, &a.name));
    }
}

fn diff_notebooks(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Notebook;
    let pairing = pair(&desired.notebooks, &actual.notebooks, |n| n.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::notebook(&d.name)));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("description", &a.spec.description, &d.spec.description)
            .text("owner", &a.spec.owner, &d.spec.owner)
            .counted("cells", &a.spec.cells, &d.spec.cells, "cells");
        changes.emit(plan, kind, &d.name, &paths::notebook(&d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.name, a.deletion_protection, "notebook");
    }
}

fn job_name(pipeline: &str, job: &str) -> String {
    format!("{}/{}", pipeline, job)
}

fn diff_jobs(plan: &mut Plan, pipeline: &str, path: &str, desired: &[PipelineJob], actual: &[PipelineJob]) {
    let kind = ResourceKind::PipelineJob;
    let pairing = pair(desired, actual, |j| j.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, job_name(pipeline, &d.name), path));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        changes
            .text("notebook", &a.notebook, &d.notebook)
            .text("compute_endpoint", &a.compute_endpoint, &d.compute_endpoint)
            .set("depends_on", &a.depends_on, &d.depends_on)
            .number("timeout_seconds", a.timeout_seconds, d.timeout_seconds)
            .number("retry_count", a.retry_count, d.retry_count)
            .number("order", a.order, d.order);
        changes.emit(plan, kind, &job_name(pipeline, &d.name), path);
    }
    for a in pairing.deleted {
        plan.push(Action::delete(kind, job_name(pipeline, &a.name)));
    }
}

fn diff_pipelines(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Pipeline;
    let pairing = pair(&desired.pipelines, &actual.pipelines, |p| p.name.clone());
    for d in pairing.created {
        let path = paths::pipeline(&d.name);
        plan.push(Action::create(kind, &d.name, &path));
        for j in &d.spec.jobs {
            plan.push(Action::create(ResourceKind::PipelineJob, job_name(&d.name, &j.name), &path));
        }
    }
    for (d, a) in pairing.matched {
        let path = paths::pipeline(&d.name);
        let mut changes = Changes::new();
        changes
            .text("description", &a.spec.description, &d.spec.description)
            .text("schedule_cron", &a.spec.schedule_cron, &d.spec.schedule_cron)
            .flag("is_paused", a.spec.is_paused, d.spec.is_paused)
            .number("concurrency_limit", a.spec.concurrency_limit, d.spec.concurrency_limit);
        changes.emit(plan, kind, &d.name, &path);
        diff_jobs(plan, &d.name, &path, &d.spec.jobs, &a.spec.jobs);
    }
    for a in pairing.deleted {
        if !a.deletion_protection {
            for j in &a.spec.jobs {
                plan.push(Action::delete(ResourceKind::PipelineJob, job_name(&a.name, &j.name)));
            }
        }
        delete_unless_protected(plan, kind, &a.name, a.deletion_protection, "pipeline");
    }
}

fn contract_columns(contract: Option<&Contract>) -> String {
    contract
        .map(|c| {
            c.columns
                .iter()
                .map(|col| {
                    if col.nullable {
                        format!("{} {}", col.name, col.column_type)
                    } else {
                        format!("{} {} not null", col.name, col.column_type)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn diff_model_spec(changes: &mut Changes, a: &ModelSpec, d: &ModelSpec) {
    changes
        .text("materialization", &a.materialization, &d.materialization)
        .text("description", &a.description, &d.description)
        .text("sql", &a.sql, &d.sql)
        .list("tags", &a.tags, &d.tags);

    let (ac, dc) = (a.config.clone().unwrap_or_default(), d.config.clone().unwrap_or_default());
    changes
        .list("config.unique_key", &ac.unique_key, &dc.unique_key)
        .text("config.incremental_strategy", &ac.incremental_strategy, &dc.incremental_strategy)
        .text("config.on_schema_change", &ac.on_schema_change, &dc.on_schema_change);

    let enforce = |c: Option<&Contract>| c.map_or(false, |c| c.enforce);
    changes
        .flag("contract.enforce", enforce(a.contract.as_ref()), enforce(d.contract.as_ref()))
        .text(
            "contract.columns",
            &contract_columns(a.contract.as_ref()),
            &contract_columns(d.contract.as_ref()),
        )
        .counted("tests", &a.tests, &d.tests, "tests");

    let freshness = |spec: &ModelSpec| {
        spec.freshness
            .as_ref()
            .map(|f| format!("max_lag_seconds={}, cron_schedule={}", f.max_lag_seconds, f.cron_schedule))
            .unwrap_or_default()
    };
    changes.text("freshness", &freshness(a), &freshness(d));
}

fn diff_models(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Model;
    let pairing = pair(&desired.models, &actual.models, |m| m.full_name());
    for d in pairing.created {
        plan.push(Action::create(kind, d.full_name(), paths::model(&d.project, &d.name)));
    }
    for (d, a) in pairing.matched {
        let mut changes = Changes::new();
        diff_model_spec(&mut changes, &a.spec, &d.spec);
        changes.emit(plan, kind, &d.full_name(), &paths::model(&d.project, &d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.full_name(), a.deletion_protection, "model");
    }
}

fn diff_macros(desired: &State, actual: &State, plan: &mut Plan) {
    let kind = ResourceKind::Macro;
    let pairing = pair(&desired.macros, &actual.macros, |m| m.name.clone());
    for d in pairing.created {
        plan.push(Action::create(kind, &d.name, paths::macro_def(&d.name)));
    }
    for (d, a) in pairing.matched {
        let (old, new) = (&a.spec, &d.spec);
        let mut changes = Changes::new();
        changes
            .text("macro_type", &old.macro_type, &new.macro_type)
            .list("parameters", &old.parameters, &new.parameters)
            .text("body", &old.body, &new.body)
            .text("description", &old.description, &new.description)
            .text("catalog_name", &old.catalog_name, &new.catalog_name)
            .text("project_name", &old.project_name, &new.project_name)
            .text("visibility", &old.visibility, &new.visibility)
            .text("owner", &old.owner, &new.owner)
            .map("properties", &old.properties, &new.properties)
            .list("tags", &old.tags, &new.tags)
            .text("status", &old.status, &new.status);
        changes.emit(plan, kind, &d.name, &paths::macro_def(&d.name));
    }
    for a in pairing.deleted {
        delete_unless_protected(plan, kind, &a.name, a.deletion_protection, "macro");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operation;
    use crate::state::{
        CatalogResource, CatalogSpec, Group, MaskBinding, PipelineResource, PipelineSpec,
        Principal, TableResource,
    };

    #[test]
    fn test_every_top_level_kind_registered_once() {
        let kinds: Vec<ResourceKind> = Differ::registered_kinds().collect();
        let unique: HashSet<ResourceKind> = kinds.iter().copied().collect();
        assert_eq!(kinds.len(), unique.len());
        assert!(!unique.contains(&ResourceKind::GroupMembership));
        assert!(!unique.contains(&ResourceKind::PipelineJob));
    }

    #[test]
    fn test_pair_splits_by_key() {
        let desired = vec![("a", 1), ("b", 2)];
        let actual = vec![("b", 3), ("c", 4)];
        let pairing = pair(&desired, &actual, |(k, _)| *k);
        assert_eq!(pairing.created, vec![&("a", 1)]);
        assert_eq!(pairing.matched, vec![(&("b", 2), &("b", 3))]);
        assert_eq!(pairing.deleted, vec![&("c", 4)]);
    }

    #[test]
    fn test_principal_type_change_ignored() {
        let mut desired = State::new();
        desired.principals.push(Principal::service("etl"));
        let mut actual = State::new();
        actual.principals.push(Principal::user("etl"));

        let plan = diff(&desired, &actual);
        assert!(plan.actions.is_empty());
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn test_new_group_creates_memberships() {
        let mut desired = State::new();
        desired.groups.push(Group::new("analysts").with_member("alice", "user"));

        let plan = diff(&desired, &State::new());
        let kinds: Vec<ResourceKind> = plan.actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ResourceKind::Group, ResourceKind::GroupMembership]);
        assert_eq!(plan.actions[1].name, "analysts/alice(user)");
    }

    #[test]
    fn test_column_type_change_blocks_update() {
        let mut desired = State::new();
        desired.tables.push(TableResource::new(
            "main",
            "sales",
            "orders",
            TableSpec { comment: "new".into(), ..Default::default() }.with_column("id", "BIGINT"),
        ));
        let mut actual = State::new();
        actual.tables.push(TableResource::new(
            "main",
            "sales",
            "orders",
            TableSpec::default().with_column("id", "INTEGER"),
        ));

        let plan = diff(&desired, &actual);
        assert!(plan.actions.is_empty());
        assert_eq!(plan.errors.len(), 1);
        assert_eq!(
            plan.errors[0].message,
            "column \"id\": cannot change type from \"INTEGER\" to \"BIGINT\""
        );
    }

    #[test]
    fn test_column_add_and_remove() {
        let mut desired = State::new();
        desired.tables.push(TableResource::new(
            "main",
            "sales",
            "orders",
            TableSpec::default().with_column("id", "BIGINT").with_column("total", "DOUBLE"),
        ));
        let mut actual = State::new();
        actual.tables.push(TableResource::new(
            "main",
            "sales",
            "orders",
            TableSpec::default().with_column("id", "BIGINT").with_column("legacy", "VARCHAR"),
        ));

        let plan = diff(&desired, &actual);
        assert_eq!(plan.actions.len(), 1);
        let changes = &plan.actions[0].changes;
        assert_eq!(changes[0], FieldDiff::new("columns.total", "", "total DOUBLE"));
        assert_eq!(changes[1], FieldDiff::new("columns.legacy", "legacy VARCHAR", ""));
        assert_eq!(
            plan.actions[0].path.as_deref(),
            Some("catalogs/main/schemas/sales/tables/orders/table.yaml")
        );
    }

    #[test]
    fn test_protected_catalog_not_deleted() {
        let mut actual = State::new();
        actual.catalogs.push(CatalogResource::new("protected", CatalogSpec::default()).protected());

        let plan = diff(&State::new(), &actual);
        assert!(plan.actions.is_empty());
        assert_eq!(plan.errors.len(), 1);
        assert_eq!(plan.errors[0].resource_name, "protected");
        assert!(plan.errors[0].message.contains("deletion_protection"));
    }

    #[test]
    fn test_deleted_pipeline_deletes_its_jobs() {
        let mut actual = State::new();
        actual.pipelines.push(PipelineResource {
            name: "etl".into(),
            deletion_protection: false,
            spec: PipelineSpec {
                jobs: vec![PipelineJob::new("load", "nb")],
                ..Default::default()
            },
        });

        let plan = diff(&State::new(), &actual);
        let names: Vec<&str> = plan.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["etl/load", "etl"]);
        assert!(plan.actions.iter().all(|a| a.operation == Operation::Delete));
        assert!(plan.actions.iter().all(|a| a.path.is_none()));
    }

    #[test]
    fn test_protected_pipeline_keeps_its_jobs() {
        let mut actual = State::new();
        actual.pipelines.push(PipelineResource {
            name: "etl".into(),
            deletion_protection: true,
            spec: PipelineSpec {
                jobs: vec![PipelineJob::new("extract", "nb"), PipelineJob::new("load", "nb")],
                ..Default::default()
            },
        });

        let plan = diff(&State::new(), &actual);
        assert!(plan.actions.is_empty());
        assert_eq!(plan.errors.len(), 1);
        assert_eq!(plan.errors[0].resource_type, ResourceKind::Pipeline);
        assert_eq!(plan.errors[0].message, "cannot delete pipeline: deletion_protection is enabled");
    }

    #[test]
    fn test_mask_binding_see_original_update() {
        let set = |see_original: bool| ColumnMaskSet {
            catalog: "main".into(),
            schema: "sales".into(),
            table: "orders".into(),
            masks: vec![ColumnMaskSpec {
                name: "hide_email".into(),
                column_name: "email".into(),
                mask_expression: "'***'".into(),
                bindings: vec![MaskBinding {
                    principal: "admins".into(),
                    principal_type: "group".into(),
                    see_original,
                }],
                ..Default::default()
            }],
        };
        let mut desired = State::new();
        desired.column_masks.push(set(true));
        let mut actual = State::new();
        actual.column_masks.push(set(false));

        let plan = diff(&desired, &actual);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, ResourceKind::ColumnMaskBinding);
        assert_eq!(plan.actions[0].name, "main.sales.orders/hide_email->group:admins");
        assert_eq!(plan.actions[0].changes, vec![FieldDiff::new("see_original", "false", "true")]);
    }
}
