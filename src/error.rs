//! Domain error type shared by every component of the core.
//!
//! One enum, one `#[error(...)]` message per case, `#[from]` only where a
//! lower-level error genuinely wraps into a Myxa case.

use thiserror::Error;

use crate::version::Version;

/// Errors produced by the interface model, diff engine, index, resolver,
/// and publish gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MyxaError {
    /// A package or a specific version of it is absent from the index.
    #[error("package not found: {name}")]
    NotFound {
        /// The package name that was looked up.
        name: String,
    },

    /// A package or a specific version of it is absent from the index.
    #[error("{name}@{version} not found")]
    VersionNotFound {
        /// The package name that was looked up.
        name: String,
        /// The version that was looked up.
        version: Version,
    },

    /// `Index::insert` was called for a `(name, version)` pair already
    /// present in the index.
    #[error("{name}@{version} is already published")]
    AlreadyPublished {
        /// The package name.
        name: String,
        /// The duplicate version.
        version: Version,
    },

    /// The first publish of a package name used a version other than
    /// `(1, 0)`.
    #[error("first publish of {name} must be version 1.0, got {actual}")]
    InvalidInitialVersion {
        /// The package name.
        name: String,
        /// The version that was actually supplied.
        actual: Version,
    },

    /// A publish supplied a version other than the one `required_bump`
    /// computed from the diff against the latest published version.
    #[error("publishing {name} requires version {required}, got {actual}")]
    VersionBumpRequired {
        /// The package name.
        name: String,
        /// The version the diff against the latest published release demands.
        required: Version,
        /// The version the caller actually supplied.
        actual: Version,
    },

    /// The resolver could not find an assignment satisfying every
    /// requirement.
    #[error("cannot resolve {package}: {reason}")]
    Unresolvable {
        /// The package the resolver was working on when it gave up.
        package: String,
        /// Human-readable explanation of the conflict.
        reason: String,
    },

    /// `validate` found a structural problem with a package's interface.
    #[error("invalid interface: {reason}")]
    InvalidInterface {
        /// Description of the violated invariant.
        reason: String,
    },

    /// A `DepReq` names a package absent from the index entirely.
    #[error("unknown dependency: {name}")]
    UnknownDependency {
        /// The package name that has no entry in the index at all.
        name: String,
    },

    /// A dependency cycle was detected while resolving or validating.
    #[error("dependency cycle: {path}")]
    Cycle {
        /// The cycle, rendered as `a -> b -> c -> a`.
        path: String,
    },
}

/// Convenience alias used throughout the crate, mirroring the corpus's
/// `type Result<T> = std::result::Result<T, ...>` convention.
pub type MyxaResult<T> = Result<T, MyxaError>;
