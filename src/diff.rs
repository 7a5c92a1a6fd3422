//! Structural diff engine: walks two package snapshots in lockstep and
//! classifies every change as [`Category::Breaking`] or
//! [`Category::NonBreaking`] — removing or narrowing anything a consumer
//! could already be relying on is breaking; adding or widening is not.
//! Emitted changes are sorted by path so textual diffs are stable —
//! that ordering is part of the public contract, not an implementation
//! detail.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::member::{Member, Param};
use crate::module::Module;
use crate::package::{Dep, Package};
use crate::types::{types_equal, Type};
use crate::version::Version;

/// Whether a [`Change`] would break a consumer that type-checked against
/// the old interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A previously valid use of the interface may no longer type-check.
    Breaking,
    /// Every previously valid use of the interface still type-checks.
    NonBreaking,
}

/// A single classified structural change between two interface snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Stable dotted path, e.g. `"geometry.Point.y"` or `"math.compute.x"`.
    pub path: String,
    /// Breaking or not.
    pub category: Category,
    /// Human-readable description, e.g. `"field y added"`.
    pub description: String,
}

impl Change {
    fn new(path: impl Into<String>, category: Category, description: impl Into<String>) -> Self {
        Change {
            path: path.into(),
            category,
            description: description.into(),
        }
    }

    fn breaking(path: impl Into<String>, description: impl Into<String>) -> Self {
        Change::new(path, Category::Breaking, description)
    }

    fn non_breaking(path: impl Into<String>, description: impl Into<String>) -> Self {
        Change::new(path, Category::NonBreaking, description)
    }
}

/// An ordered list of classified changes between two package snapshots.
pub type Diff = Vec<Change>;

/// `true` iff any change in `diff` is [`Category::Breaking`].
pub fn is_breaking(diff: &[Change]) -> bool {
    diff.iter().any(|c| c.category == Category::Breaking)
}

/// The version bump a publish must make, given the old version and the
/// diff against the draft: major if anything broke, minor otherwise.
pub fn required_bump(old_version: Version, diff: &[Change]) -> Version {
    if is_breaking(diff) {
        old_version.bump_major()
    } else {
        old_version.bump_minor()
    }
}

/// Compute the full, path-sorted diff between two package snapshots,
/// covering both the interface tree and the dependency set.
pub fn diff(old: &Package, new: &Package) -> Diff {
    let mut changes = Vec::new();
    diff_module(&old.root_module, &new.root_module, &mut changes);
    diff_dependencies(&old.deps, &new.deps, &mut changes);
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

/// Run [`diff`] but keep only changes whose path falls inside the
/// transitive closure of `used_member_paths` — absolute member names
/// (`"pkg.module.Member"`) together with every member reachable by
/// following their `Ref` types within the same package. This is the
/// restricted diff that lets a dependency's major version climb past what
/// a requirer declared: changes outside the closure are computed but not
/// returned, since an unused member breaking doesn't block the crossing.
pub fn diff_restricted(old: &Package, new: &Package, used_member_paths: &HashSet<String>) -> Diff {
    let pkg_name = &old.info.name;
    let closure = transitive_closure(old, new, pkg_name, used_member_paths);
    diff(old, new)
        .into_iter()
        .filter(|change| {
            closure
                .iter()
                .any(|base| change.path == *base || change.path.starts_with(&format!("{base}.")))
        })
        .collect()
}

fn transitive_closure(
    old: &Package,
    new: &Package,
    pkg_name: &str,
    used_member_paths: &HashSet<String>,
) -> HashSet<String> {
    let prefix = format!("{pkg_name}.");
    let mut relative: Vec<String> = used_member_paths
        .iter()
        .filter_map(|p| p.strip_prefix(&prefix).map(str::to_string))
        .collect();
    let mut seen: HashSet<String> = relative.iter().cloned().collect();

    while let Some(path) = relative.pop() {
        let member = new
            .root_module
            .resolve_member(&path)
            .or_else(|| old.root_module.resolve_member(&path));
        let Some(member) = member else { continue };
        for reference in member.referenced_names() {
            if let Some(rel) = reference.strip_prefix(&prefix) {
                if seen.insert(rel.to_string()) {
                    relative.push(rel.to_string());
                }
            }
        }
    }
    seen
}

fn diff_module(old: &Module, new: &Module, changes: &mut Vec<Change>) {
    let member_names: IndexMap<&String, ()> = old
        .members
        .keys()
        .chain(new.members.keys())
        .map(|k| (k, ()))
        .collect();
    for name in member_names.keys() {
        match (old.members.get(*name), new.members.get(*name)) {
            (Some(old_member), Some(new_member)) => {
                diff_member(name, old_member, new_member, changes);
            }
            (Some(_), None) => {
                changes.push(Change::breaking(
                    (*name).clone(),
                    format!("member {name} removed"),
                ));
            }
            (None, Some(_)) => {
                changes.push(Change::non_breaking(
                    (*name).clone(),
                    format!("member {name} added"),
                ));
            }
            (None, None) => unreachable!(),
        }
    }

    let module_names: IndexMap<&String, ()> = old
        .modules
        .keys()
        .chain(new.modules.keys())
        .map(|k| (k, ()))
        .collect();
    for name in module_names.keys() {
        match (old.modules.get(*name), new.modules.get(*name)) {
            (Some(old_child), Some(new_child)) => {
                diff_nested(name, old_child, new_child, changes);
            }
            (Some(_), None) => {
                changes.push(Change::breaking(
                    (*name).clone(),
                    format!("module {name} removed"),
                ));
            }
            (None, Some(_)) => {
                changes.push(Change::non_breaking(
                    (*name).clone(),
                    format!("module {name} added"),
                ));
            }
            (None, None) => unreachable!(),
        }
    }
}

/// Recurse into a nested module, prefixing every emitted path.
fn diff_nested(prefix: &str, old: &Module, new: &Module, changes: &mut Vec<Change>) {
    let mut nested = Vec::new();
    diff_module(old, new, &mut nested);
    for mut change in nested {
        change.path = format!("{prefix}.{}", change.path);
        changes.push(change);
    }
}

fn diff_member(path: &str, old: &Member, new: &Member, changes: &mut Vec<Change>) {
    match (old, new) {
        (Member::Func { params: op, ret: or }, Member::Func { params: np, ret: nr }) => {
            diff_params(path, op, np, changes);
            if !types_equal(or, nr) {
                changes.push(Change::breaking(
                    path.to_string(),
                    format!("return type changed from {or:?} to {nr:?}"),
                ));
            }
        }
        (Member::Struct { fields: of }, Member::Struct { fields: nf }) => {
            diff_fields(path, of, nf, changes);
        }
        (Member::Enum { variants: ov }, Member::Enum { variants: nv }) => {
            diff_variants(path, ov, nv, changes);
        }
        _ => {
            changes.push(Change::breaking(
                path.to_string(),
                format!(
                    "member kind changed from {} to {}",
                    old.kind_name(),
                    new.kind_name()
                ),
            ));
        }
    }
}

fn diff_params(path: &str, old: &[Param], new: &[Param], changes: &mut Vec<Change>) {
    if old == new {
        return;
    }

    let old_names: Vec<&str> = old.iter().map(|p| p.name.as_str()).collect();
    let new_names: Vec<&str> = new.iter().map(|p| p.name.as_str()).collect();

    for p in old {
        if !new.iter().any(|np| np.name == p.name) {
            changes.push(Change::breaking(
                format!("{path}.{}", p.name),
                format!("parameter {} removed", p.name),
            ));
        }
    }
    for p in new {
        if !old.iter().any(|op| op.name == p.name) {
            changes.push(Change::breaking(
                format!("{path}.{}", p.name),
                format!("parameter {} added", p.name),
            ));
        }
    }
    for p in old {
        if let Some(np) = new.iter().find(|np| np.name == p.name) {
            if !types_equal(&p.ty, &np.ty) {
                changes.push(Change::breaking(
                    format!("{path}.{}", p.name),
                    format!("parameter {} type changed", p.name),
                ));
            }
        }
    }

    let same_set: HashSet<&str> = old_names.iter().copied().collect();
    let new_set: HashSet<&str> = new_names.iter().copied().collect();
    if same_set == new_set && old_names != new_names {
        changes.push(Change::breaking(
            path.to_string(),
            "parameters reordered".to_string(),
        ));
    }
}

fn diff_fields(
    path: &str,
    old: &IndexMap<String, Type>,
    new: &IndexMap<String, Type>,
    changes: &mut Vec<Change>,
) {
    for (name, ty) in old {
        match new.get(name) {
            None => changes.push(Change::breaking(
                format!("{path}.{name}"),
                format!("field {name} removed"),
            )),
            Some(new_ty) if !types_equal(ty, new_ty) => changes.push(Change::breaking(
                format!("{path}.{name}"),
                format!("field {name} type changed"),
            )),
            Some(_) => {}
        }
    }
    for name in new.keys() {
        if !old.contains_key(name) {
            changes.push(Change::breaking(
                format!("{path}.{name}"),
                format!("field {name} added"),
            ));
        }
    }
}

fn diff_variants(
    path: &str,
    old: &IndexMap<String, Option<Type>>,
    new: &IndexMap<String, Option<Type>>,
    changes: &mut Vec<Change>,
) {
    for (name, payload) in old {
        match new.get(name) {
            None => changes.push(Change::breaking(
                format!("{path}.{name}"),
                format!("variant {name} removed"),
            )),
            Some(new_payload) if payload != new_payload => changes.push(Change::breaking(
                format!("{path}.{name}"),
                format!("variant {name} payload type changed"),
            )),
            Some(_) => {}
        }
    }
    for name in new.keys() {
        if !old.contains_key(name) {
            // Conservative stance: enum consumers may match exhaustively,
            // so a new variant can break them.
            changes.push(Change::breaking(
                format!("{path}.{name}"),
                format!("variant {name} added"),
            ));
        }
    }
}

fn diff_dependencies(old: &IndexMap<String, Dep>, new: &IndexMap<String, Dep>, changes: &mut Vec<Change>) {
    for (name, dep) in old {
        match new.get(name) {
            None => changes.push(Change::breaking(
                format!("deps.{name}"),
                format!("dependency {name} removed"),
            )),
            Some(new_dep) => {
                if dep.version.major != new_dep.version.major {
                    changes.push(Change::breaking(
                        format!("deps.{name}"),
                        format!(
                            "dependency {name} major version changed from {} to {}",
                            dep.version, new_dep.version
                        ),
                    ));
                } else if dep.version.minor != new_dep.version.minor {
                    changes.push(Change::non_breaking(
                        format!("deps.{name}"),
                        format!(
                            "dependency {name} minor version bumped from {} to {}",
                            dep.version, new_dep.version
                        ),
                    ));
                }
            }
        }
    }
    for name in new.keys() {
        if !old.contains_key(name) {
            changes.push(Change::breaking(
                format!("deps.{name}"),
                format!("dependency {name} added"),
            ));
        }
    }
}
