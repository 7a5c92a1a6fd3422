//! `Package`: a draft or published interface, its metadata, and its
//! dependency requirements/lock.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MyxaError, MyxaResult};
use crate::module::Module;
use crate::version::Version;

/// `{ name, description, version }` — a package's identity and current
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// The package's name, unique within an index.
    pub name: String,
    /// Free-form human-readable description.
    pub description: String,
    /// The current version of this snapshot.
    pub version: Version,
}

/// An unlocked dependency declaration: "depend on `name`, at least
/// `min_version`, same major".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepReq {
    /// The required package's name.
    pub name: String,
    /// The lowest acceptable version; only its major constrains candidates
    /// directly (selective major-crossing may still admit a higher major —
    /// see the resolver).
    pub min_version: Version,
}

impl DepReq {
    /// Construct a requirement.
    pub fn new(name: impl Into<String>, min_version: Version) -> Self {
        DepReq {
            name: name.into(),
            min_version,
        }
    }
}

/// A locked dependency: a concrete, resolved version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dep {
    /// The dependency's package name.
    pub name: String,
    /// The resolved version.
    pub version: Version,
}

impl Dep {
    /// Construct a lock entry.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Dep {
            name: name.into(),
            version,
        }
    }
}

/// A package: metadata, its interface tree, its unlocked requirements, and
/// (once `lock`ed) its concrete dependency versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Name, description, version.
    pub info: PackageInfo,
    /// The package's interface tree, rooted at a module named `info.name`.
    pub root_module: Module,
    /// Unlocked dependency declarations, keyed by dependency name.
    #[serde(default)]
    pub requirements: IndexMap<String, DepReq>,
    /// Locked dependency versions, keyed by dependency name. Empty until
    /// `lock`/`update` populates it.
    #[serde(default)]
    pub deps: IndexMap<String, Dep>,
}

impl Package {
    /// Start a fresh draft package at version `(1, 0)` with an empty
    /// interface and no requirements.
    pub fn init(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Package {
            info: PackageInfo {
                name: name.clone(),
                description: description.into(),
                version: Version::INITIAL,
            },
            root_module: Module::new(name),
            requirements: IndexMap::new(),
            deps: IndexMap::new(),
        }
    }

    /// Declare a dependency requirement, replacing any existing one with
    /// the same name. Does not touch `deps` — re-run `lock`/`update` after.
    pub fn add_requirement(&mut self, req: DepReq) {
        self.requirements.insert(req.name.clone(), req);
    }

    /// Drop a dependency requirement and its lock entry, if any.
    pub fn remove_requirement(&mut self, name: &str) {
        self.requirements.shift_remove(name);
        self.deps.shift_remove(name);
    }

    /// `true` iff every requirement has a lock entry whose major matches
    /// the requirement's `min_version` major or higher (selective
    /// major-crossing is a resolver-time decision; by the time a package
    /// is "locked" its `deps` entries are simply concrete choices), and
    /// every lock entry is at least the required version.
    pub fn is_locked(&self) -> bool {
        self.requirements.keys().all(|name| {
            self.deps
                .get(name)
                .map(|dep| {
                    let req = &self.requirements[name];
                    dep.version >= req.min_version
                })
                .unwrap_or(false)
        })
    }
}

/// `true` iff `name` is a non-empty `[A-Za-z_][A-Za-z0-9_]*` identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `true` iff every dot-separated segment of `path` is a valid identifier
/// and `path` is non-empty.
pub fn is_valid_module_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_valid_identifier)
}

/// Validate a package's own structural integrity: every name in its
/// interface tree is a well-formed identifier, and every `Ref` that points
/// within the package itself resolves to a real `Struct`/`Enum` member.
///
/// Refs pointing at other packages are only checked for well-formedness
/// here; resolving them against locked dependencies requires the index and
/// is performed by [`crate::index::Index::validate_refs`], which the
/// publish gate runs before accepting a package.
pub fn validate(pkg: &Package) -> MyxaResult<()> {
    if !is_valid_identifier(&pkg.info.name) {
        return Err(MyxaError::InvalidInterface {
            reason: format!("invalid package name: {}", pkg.info.name),
        });
    }

    validate_module(&pkg.info.name, &pkg.root_module)?;

    for (name, req) in &pkg.requirements {
        if name != &req.name || !is_valid_identifier(name) {
            return Err(MyxaError::InvalidInterface {
                reason: format!("invalid requirement name: {name}"),
            });
        }
    }
    for (name, dep) in &pkg.deps {
        if name != &dep.name || !is_valid_identifier(name) {
            return Err(MyxaError::InvalidInterface {
                reason: format!("invalid dependency name: {name}"),
            });
        }
    }

    for (path, member) in pkg.root_module.iter_members() {
        for reference in member.referenced_names() {
            if !is_valid_absolute_ref(reference) {
                return Err(MyxaError::InvalidInterface {
                    reason: format!("malformed reference {reference} used at {path}"),
                });
            }
            if let Some(rest) = reference.strip_prefix(&format!("{}.", pkg.info.name)) {
                if pkg.root_module.resolve_member(rest).is_none() {
                    return Err(MyxaError::InvalidInterface {
                        reason: format!("unresolved local reference {reference} used at {path}"),
                    });
                }
            }
        }
    }

    Ok(())
}

fn validate_module(name: &str, module: &Module) -> MyxaResult<()> {
    if !is_valid_identifier(name) {
        return Err(MyxaError::InvalidInterface {
            reason: format!("invalid module name: {name}"),
        });
    }
    for (member_name, _) in &module.members {
        if !is_valid_identifier(member_name) {
            return Err(MyxaError::InvalidInterface {
                reason: format!("invalid member name: {member_name}"),
            });
        }
    }
    for (child_name, child) in &module.modules {
        validate_module(child_name, child)?;
    }
    Ok(())
}

/// `true` iff `name` looks like `package.module.path.MemberName` — at
/// least two dot-separated identifier segments.
fn is_valid_absolute_ref(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    segments.len() >= 2 && segments.iter().all(|s| is_valid_identifier(s))
}
