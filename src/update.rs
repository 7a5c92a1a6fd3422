//! Update planner: re-checks each locked dependency against the latest
//! published version, upgrading across a major when selective
//! major-crossing still admits it.

use std::collections::HashSet;

use crate::error::MyxaResult;
use crate::package::{Dep, Package};
use crate::resolver::{Resolver, ResolverLimits};
use crate::version::Version;

/// Drives the per-dependency upgrade check over an [`Index`] via an inner
/// [`Resolver`], one already-locked dependency at a time rather than
/// re-running the whole resolution search.
pub struct UpdatePlanner<'a> {
    resolver: Resolver<'a>,
}

impl<'a> UpdatePlanner<'a> {
    /// An update planner with default resolver search limits.
    pub fn new(index: &'a crate::index::Index) -> Self {
        UpdatePlanner {
            resolver: Resolver::new(index),
        }
    }

    /// An update planner with explicit resolver search limits.
    pub fn with_limits(index: &'a crate::index::Index, limits: ResolverLimits) -> Self {
        UpdatePlanner {
            resolver: Resolver::with_limits(index, limits),
        }
    }

    /// For each locked dependency, replace its lock with the latest
    /// published version if that version is admissible for every
    /// requirement and use-site `pkg` currently has on it. Returns `true`
    /// iff any lock entry changed. Idempotent: a second call with no index
    /// change is a no-op.
    pub fn update(&self, pkg: &mut Package) -> MyxaResult<bool> {
        let mut changed = false;
        let names: Vec<String> = pkg.deps.keys().cloned().collect();

        for name in names {
            let Some(req) = pkg.requirements.get(&name) else {
                continue;
            };
            let min_version = req.min_version;
            let current = pkg.deps[&name].version;

            let Ok(latest_pkg) = self.resolver.index().latest(&name) else {
                continue;
            };
            let latest = latest_pkg.info.version;
            if latest <= current {
                continue;
            }

            let used = used_members_on(pkg, &name);
            if self.resolver.admits(&name, latest, min_version, &used)? {
                pkg.deps.insert(name.clone(), Dep::new(name, latest));
                changed = true;
            }
        }

        Ok(changed)
    }
}

/// Every absolute member path of `target` that `pkg`'s own interface
/// references by `Ref`. The update planner only has `pkg`'s own code to
/// consult (its other locked deps are resolved separately), so this is a
/// single-level use-site scan rather than the resolver's whole-closure
/// seeding.
fn used_members_on(pkg: &Package, target: &str) -> HashSet<String> {
    let prefix = format!("{target}.");
    pkg.root_module
        .iter_members()
        .into_iter()
        .flat_map(|(_, member)| member.referenced_names().into_iter())
        .filter(|name| name.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}
