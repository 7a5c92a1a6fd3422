//! Backtracking dependency resolver: turns a package's unlocked
//! `requirements` into a concrete `deps` lock against an [`Index`], letting
//! a dependency's major version climb past what a requirer asked for as
//! long as the requirer's own actual usage survives the climb unbroken.
//!
//! Structurally this is a provider/pool split — candidates are sourced
//! from the index in descending version order, a requirer list constrains
//! which candidates are admissible, and a rejected candidate triggers
//! backtracking to the next one — but the admissibility test here is a
//! restricted structural diff rather than a SAT clause, since Myxa's
//! "compatible" relation depends on what a requirer actually uses, not
//! just a version range.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::diff::{diff_restricted, is_breaking};
use crate::error::{MyxaError, MyxaResult};
use crate::index::Index;
use crate::package::{Dep, Package};
use crate::version::Version;

/// Resolver search bound: backtracking over a version lattice is worst-case
/// exponential, so past this many candidate evaluations `lock` reports
/// [`MyxaError::Unresolvable`] instead of continuing to search.
pub const DEFAULT_MAX_BACKTRACK_STEPS: usize = 100_000;

/// Tunable resolver search bound. The core takes no other configuration —
/// index path discovery and CLI flags are a collaborator's concern, not
/// this crate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverLimits {
    /// Maximum number of candidate-version evaluations before giving up.
    pub max_backtrack_steps: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        ResolverLimits {
            max_backtrack_steps: DEFAULT_MAX_BACKTRACK_STEPS,
        }
    }
}

/// One package's demand on another: "R requires `name` at least
/// `min_version`".
#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirer {
    name: String,
    min_version: Version,
}

/// Search state threaded through backtracking. Cloned at each branch point
/// rather than undone in place — simpler to get right than manual undo,
/// and the indexes this resolver targets are small.
#[derive(Debug, Clone, Default)]
struct State {
    assignment: IndexMap<String, Version>,
    requirers: std::collections::HashMap<String, Vec<Requirer>>,
    used_members: std::collections::HashMap<String, HashSet<String>>,
    queue: Vec<String>,
    /// Direct requirer edges (`a -> b` iff some assigned candidate of `a`
    /// requires `b`), accumulated as assignments are made. Used to detect a
    /// requirement that closes a cycle back to an ancestor, not just a
    /// package that requires itself directly.
    edges: std::collections::HashMap<String, HashSet<String>>,
}

impl State {
    fn seed(pkg: &Package) -> Self {
        let mut state = State::default();
        for req in pkg.requirements.values() {
            state.queue.push(req.name.clone());
            state
                .requirers
                .entry(req.name.clone())
                .or_default()
                .push(Requirer {
                    name: pkg.info.name.clone(),
                    min_version: req.min_version,
                });
            let refs = refs_into(pkg, &req.name);
            state
                .used_members
                .entry(req.name.clone())
                .or_default()
                .extend(refs);
            state
                .edges
                .entry(pkg.info.name.clone())
                .or_default()
                .insert(req.name.clone());
        }
        state
    }

    /// `true` iff `to` can already reach `from` through recorded edges,
    /// i.e. adding the edge `from -> to` would close a cycle.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![to.to_string()];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == from {
                return true;
            }
            if !seen.insert(node.clone()) {
                continue;
            }
            if let Some(next) = self.edges.get(&node) {
                stack.extend(next.iter().cloned());
            }
        }
        false
    }
}

/// Every absolute `Ref` name used anywhere in `pkg` that points into
/// `target` (i.e. starts with `"target."`).
fn refs_into(pkg: &Package, target: &str) -> HashSet<String> {
    let prefix = format!("{target}.");
    pkg.root_module
        .iter_members()
        .into_iter()
        .flat_map(|(_, member)| member.referenced_names().into_iter())
        .filter(|name| name.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Backtracking resolver over a fixed [`Index`].
pub struct Resolver<'a> {
    index: &'a Index,
    limits: ResolverLimits,
}

impl<'a> Resolver<'a> {
    /// A resolver with default search limits.
    pub fn new(index: &'a Index) -> Self {
        Resolver {
            index,
            limits: ResolverLimits::default(),
        }
    }

    /// A resolver with an explicit search bound.
    pub fn with_limits(index: &'a Index, limits: ResolverLimits) -> Self {
        Resolver { index, limits }
    }

    /// The index this resolver searches.
    pub fn index(&self) -> &'a Index {
        self.index
    }

    /// Resolve `pkg.requirements` into a concrete `deps` lock. Work-list
    /// order is package name ascending and candidates are tried in
    /// descending version order, so the result is deterministic given an
    /// unchanged index.
    pub fn lock(&self, pkg: &Package) -> MyxaResult<IndexMap<String, Dep>> {
        let state = State::seed(pkg);
        let mut steps = 0usize;
        let resolved = self.backtrack(state, &mut steps)?;
        Ok(resolved
            .assignment
            .into_iter()
            .map(|(name, version)| (name.clone(), Dep::new(name, version)))
            .collect())
    }

    fn backtrack(&self, mut state: State, steps: &mut usize) -> MyxaResult<State> {
        state.queue.sort();
        state.queue.dedup();
        let Some(name) = state
            .queue
            .iter()
            .find(|n| !state.assignment.contains_key(*n))
            .cloned()
        else {
            return Ok(state);
        };
        state.queue.retain(|n| n != &name);

        let mut candidates: Vec<Version> = match self.index.get(&name) {
            Ok(versions) => versions.keys().copied().collect(),
            Err(_) => {
                return Err(MyxaError::UnknownDependency { name });
            }
        };
        candidates.sort_by(|a, b| b.cmp(a));

        let requirers = state.requirers.get(&name).cloned().unwrap_or_default();
        let used = state.used_members.get(&name).cloned().unwrap_or_default();

        for candidate in candidates {
            *steps += 1;
            if *steps > self.limits.max_backtrack_steps {
                log::warn!("{name}: exceeded resolver step limit at step {steps}");
                return Err(MyxaError::Unresolvable {
                    package: name,
                    reason: "exceeded resolver step limit".to_string(),
                });
            }
            if !self.admissible(&name, candidate, &requirers, &used)? {
                log::debug!("{name}@{candidate}: rejected, not admissible to every requirer");
                continue;
            }
            log::trace!("{name}@{candidate}: admitted, branching");

            let mut branch = state.clone();
            branch.assignment.insert(name.clone(), candidate);
            let candidate_pkg = self.index.get_version(&name, candidate)?;
            let mut cycle = None;
            for req in candidate_pkg.requirements.values() {
                if req.name == name || branch.reaches(&name, &req.name) {
                    cycle = Some(format!("{} -> {}", name, req.name));
                    break;
                }
                branch
                    .edges
                    .entry(name.clone())
                    .or_default()
                    .insert(req.name.clone());
                // A requirer discovered after `req.name` was already locked
                // must re-validate that assignment against the fuller
                // requirer/used-member set, so drop it back into the queue
                // instead of trusting the earlier, now-incomplete decision.
                if branch.assignment.shift_remove(&req.name).is_some() {
                    log::debug!(
                        "{}: re-queuing {} after a new requirer ({name}) surfaced",
                        name,
                        req.name
                    );
                }
                if !branch.queue.contains(&req.name) {
                    branch.queue.push(req.name.clone());
                }
                branch
                    .requirers
                    .entry(req.name.clone())
                    .or_default()
                    .push(Requirer {
                        name: name.clone(),
                        min_version: req.min_version,
                    });
                let refs = refs_into(candidate_pkg, &req.name);
                branch
                    .used_members
                    .entry(req.name.clone())
                    .or_default()
                    .extend(refs);
            }
            if let Some(path) = cycle {
                return Err(MyxaError::Cycle { path });
            }

            if let Ok(result) = self.backtrack(branch, steps) {
                return Ok(result);
            }
            log::warn!("{name}@{candidate}: backtracking, a downstream requirement failed");
        }

        Err(MyxaError::Unresolvable {
            package: name.clone(),
            reason: format!("no version of {name} in the index satisfies every requirer"),
        })
    }

    /// `true` iff `candidate` satisfies every requirer in `requirers`,
    /// either by matching major-and-minimum, or — when its major is
    /// strictly higher — by a clean restricted diff against the baseline
    /// version of that requirer's declared major.
    fn admissible(
        &self,
        name: &str,
        candidate: Version,
        requirers: &[Requirer],
        used: &HashSet<String>,
    ) -> MyxaResult<bool> {
        for requirer in requirers {
            if !self.admits(name, candidate, requirer.min_version, used)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Single-requirer admissibility check, exposed for
    /// [`crate::update::UpdatePlanner`], which re-checks one already-locked
    /// dependency against one requirer at a time rather than running the
    /// full backtracking search.
    pub fn admits(
        &self,
        name: &str,
        candidate: Version,
        min_version: Version,
        used: &HashSet<String>,
    ) -> MyxaResult<bool> {
        if candidate.major == min_version.major {
            return Ok(candidate >= min_version);
        }
        if candidate.major < min_version.major {
            return Ok(false);
        }

        let baseline = self
            .index
            .get_version(name, min_version)
            .ok()
            .or_else(|| self.index.latest_major(name, min_version.major).ok());
        let Some(baseline_pkg) = baseline else {
            return Ok(false);
        };
        let candidate_pkg = self.index.get_version(name, candidate)?;
        let restricted = diff_restricted(baseline_pkg, candidate_pkg, used);
        let admits = !is_breaking(&restricted);
        log::trace!(
            "{name}: selective major crossing {}@{} -> {}@{}: {}",
            name,
            min_version,
            name,
            candidate,
            if admits { "admitted" } else { "rejected" }
        );
        Ok(admits)
    }
}
