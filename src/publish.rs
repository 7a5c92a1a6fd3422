//! Publish gate: the one place a detected structural break becomes an
//! enforced version-bump requirement.

use crate::diff::{diff, required_bump};
use crate::error::{MyxaError, MyxaResult};
use crate::index::Index;
use crate::package::{validate, Package};
use crate::version::Version;

/// Validate, diff against the latest published version (if any), and
/// insert `pkg` into `index` — or fail without mutating the index.
pub fn publish(pkg: &Package, index: &mut Index) -> MyxaResult<()> {
    validate(pkg)?;
    if !pkg.is_locked() {
        log::warn!("{}: publish rejected, requirements not fully locked", pkg.info.name);
        return Err(MyxaError::InvalidInterface {
            reason: "package has unlocked requirements; run lock/update before publishing"
                .to_string(),
        });
    }
    index.validate_refs(pkg)?;

    if !index.contains(&pkg.info.name) {
        if pkg.info.version != Version::INITIAL {
            log::warn!(
                "{}: first publish must be at {}, got {}",
                pkg.info.name,
                Version::INITIAL,
                pkg.info.version
            );
            return Err(MyxaError::InvalidInitialVersion {
                name: pkg.info.name.clone(),
                actual: pkg.info.version,
            });
        }
        log::debug!("{}: first publish at {}", pkg.info.name, pkg.info.version);
        return index.insert(pkg.clone());
    }

    let old = index.latest(&pkg.info.name)?;
    let changes = diff(old, pkg);
    let required = required_bump(old.info.version, &changes);
    if pkg.info.version != required {
        log::warn!(
            "{}: publish rejected, {} changes require version {} but got {}",
            pkg.info.name,
            changes.len(),
            required,
            pkg.info.version
        );
        return Err(MyxaError::VersionBumpRequired {
            name: pkg.info.name.clone(),
            required,
            actual: pkg.info.version,
        });
    }

    log::debug!(
        "{}: publishing {} -> {} ({} changes)",
        pkg.info.name,
        old.info.version,
        pkg.info.version,
        changes.len()
    );
    index.insert(pkg.clone())
}
