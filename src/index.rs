//! Content-addressed store of published package versions — the sole
//! durable artifact of the system. Persisting it to disk is an external
//! collaborator's job; this module only owns the in-memory,
//! immutable-once-inserted map.

use indexmap::IndexMap;

use crate::error::{MyxaError, MyxaResult};
use crate::package::Package;
use crate::version::Version;

/// `{ packages: { name: { version: Package } } }`. Every stored `Package`
/// is a deep, immutable snapshot — `insert` takes ownership of a clone,
/// never a reference into the caller's working draft.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Index {
    packages: IndexMap<String, IndexMap<Version, Package>>,
}

impl Index {
    /// An empty index.
    pub fn new() -> Self {
        Index::default()
    }

    /// All versions published under `name`, or [`MyxaError::NotFound`].
    pub fn get(&self, name: &str) -> MyxaResult<&IndexMap<Version, Package>> {
        self.packages.get(name).ok_or_else(|| MyxaError::NotFound {
            name: name.to_string(),
        })
    }

    /// `true` iff any version of `name` has been published.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// The highest published version of `name`, by [`Version`] ordering.
    pub fn latest(&self, name: &str) -> MyxaResult<&Package> {
        let versions = self.get(name)?;
        versions
            .values()
            .max_by_key(|pkg| pkg.info.version)
            .ok_or_else(|| MyxaError::NotFound {
                name: name.to_string(),
            })
    }

    /// The highest published version of `name` within a specific major, if
    /// any exists.
    pub fn latest_major(&self, name: &str, major: u32) -> MyxaResult<&Package> {
        let versions = self.get(name)?;
        versions
            .values()
            .filter(|pkg| pkg.info.version.major == major)
            .max_by_key(|pkg| pkg.info.version)
            .ok_or_else(|| MyxaError::VersionNotFound {
                name: name.to_string(),
                version: Version::new(major, 0),
            })
    }

    /// A specific published version, if present.
    pub fn get_version(&self, name: &str, version: Version) -> MyxaResult<&Package> {
        self.get(name)?
            .get(&version)
            .ok_or(MyxaError::VersionNotFound {
                name: name.to_string(),
                version,
            })
    }

    /// Every published name together with its published versions, in
    /// insertion order.
    pub fn list(&self) -> Vec<(&str, Vec<Version>)> {
        self.packages
            .iter()
            .map(|(name, versions)| (name.as_str(), versions.keys().copied().collect()))
            .collect()
    }

    /// Insert a new, immutable snapshot. Fails with
    /// [`MyxaError::AlreadyPublished`] if `(pkg.info.name, pkg.info.version)`
    /// is already present.
    pub fn insert(&mut self, pkg: Package) -> MyxaResult<()> {
        let name = pkg.info.name.clone();
        let version = pkg.info.version;
        let versions = self.packages.entry(name.clone()).or_default();
        if versions.contains_key(&version) {
            return Err(MyxaError::AlreadyPublished { name, version });
        }
        versions.insert(version, pkg);
        Ok(())
    }

    /// Validate that every cross-package `Ref` used by `pkg` resolves to a
    /// real member in `pkg`'s own tree or in one of its locked `deps` at
    /// the locked version. Intended to run last, after
    /// [`crate::package::validate`], and immediately before
    /// [`crate::publish::publish`] inserts.
    pub fn validate_refs(&self, pkg: &Package) -> MyxaResult<()> {
        for (path, member) in pkg.root_module.iter_members() {
            for reference in member.referenced_names() {
                let own_prefix = format!("{}.", pkg.info.name);
                if reference.starts_with(&own_prefix) {
                    continue; // already checked by crate::package::validate
                }
                let Some((dep_name, rest)) = reference.split_once('.') else {
                    return Err(MyxaError::InvalidInterface {
                        reason: format!("malformed reference {reference} used at {path}"),
                    });
                };
                let dep = pkg.deps.get(dep_name).ok_or_else(|| MyxaError::InvalidInterface {
                    reason: format!(
                        "reference {reference} used at {path} points at undeclared dependency {dep_name}"
                    ),
                })?;
                let dep_pkg = self.get_version(dep_name, dep.version)?;
                if dep_pkg.root_module.resolve_member(rest).is_none() {
                    return Err(MyxaError::InvalidInterface {
                        reason: format!(
                            "reference {reference} used at {path} does not resolve in {dep_name}@{}",
                            dep.version
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, version: Version) -> Package {
        let mut p = Package::init(name, "d");
        p.info.version = version;
        p
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut index = Index::new();
        index.insert(pkg("lib", Version::new(1, 0))).unwrap();
        let latest = index.latest("lib").unwrap();
        assert_eq!(latest.info.version, Version::new(1, 0));
    }

    #[test]
    fn insert_duplicate_fails() {
        let mut index = Index::new();
        index.insert(pkg("lib", Version::new(1, 0))).unwrap();
        let err = index.insert(pkg("lib", Version::new(1, 0))).unwrap_err();
        assert!(matches!(err, MyxaError::AlreadyPublished { .. }));
    }

    #[test]
    fn latest_picks_highest_version() {
        let mut index = Index::new();
        index.insert(pkg("lib", Version::new(1, 0))).unwrap();
        index.insert(pkg("lib", Version::new(1, 5))).unwrap();
        index.insert(pkg("lib", Version::new(2, 0))).unwrap();
        assert_eq!(index.latest("lib").unwrap().info.version, Version::new(2, 0));
    }

    #[test]
    fn latest_major_filters_by_major() {
        let mut index = Index::new();
        index.insert(pkg("lib", Version::new(1, 0))).unwrap();
        index.insert(pkg("lib", Version::new(1, 5))).unwrap();
        index.insert(pkg("lib", Version::new(2, 0))).unwrap();
        assert_eq!(
            index.latest_major("lib", 1).unwrap().info.version,
            Version::new(1, 5)
        );
    }

    #[test]
    fn get_unknown_package_not_found() {
        let index = Index::new();
        assert!(matches!(
            index.get("missing"),
            Err(MyxaError::NotFound { .. })
        ));
    }

    #[test]
    fn inserted_snapshot_is_immutable_against_later_caller_mutation() {
        let mut index = Index::new();
        let mut draft = pkg("lib", Version::new(1, 0));
        index.insert(draft.clone()).unwrap();
        draft
            .root_module
            .add_member("extra", crate::member::Member::Struct {
                fields: IndexMap::new(),
            });
        let stored = index.latest("lib").unwrap();
        assert!(stored.root_module.members.is_empty());
    }

    #[test]
    fn validate_refs_accepts_resolved_cross_package_ref() {
        let mut index = Index::new();
        let mut lib = pkg("lib", Version::new(1, 0));
        lib.root_module.add_member(
            "Thing",
            crate::member::Member::Struct {
                fields: IndexMap::new(),
            },
        );
        index.insert(lib).unwrap();

        let mut app = pkg("app", Version::new(1, 0));
        app.deps.insert(
            "lib".to_string(),
            crate::package::Dep::new("lib", Version::new(1, 0)),
        );
        app.root_module.add_member(
            "make",
            crate::member::Member::Func {
                params: vec![],
                ret: crate::types::Type::reference("lib.Thing"),
            },
        );
        assert!(index.validate_refs(&app).is_ok());
    }

    #[test]
    fn validate_refs_rejects_unresolved_cross_package_ref() {
        let mut index = Index::new();
        index.insert(pkg("lib", Version::new(1, 0))).unwrap();

        let mut app = pkg("app", Version::new(1, 0));
        app.deps.insert(
            "lib".to_string(),
            crate::package::Dep::new("lib", Version::new(1, 0)),
        );
        app.root_module.add_member(
            "make",
            crate::member::Member::Func {
                params: vec![],
                ret: crate::types::Type::reference("lib.Missing"),
            },
        );
        assert!(index.validate_refs(&app).is_err());
    }
}
