//! Picks the cgroup that belongs to a container.

use cgstress_common::error::{Result, StressError};
use cgstress_common::types::StressScope;

use super::SUBSYSTEMS;
use super::path::SubsystemPath;

/// Finds the cgroup path naming `target`, probing [`SUBSYSTEMS`] in order.
///
/// # Errors
///
/// Returns [`StressError::CgroupNotFound`] if no subsystem path contains
/// `target`.
pub fn locate(paths: &dyn SubsystemPath, target: &str, scope: StressScope) -> Result<String> {
    locate_in(SUBSYSTEMS, paths, target, scope)
}

/// Like [`locate`], over an explicit subsystem catalog.
///
/// Lookup errors are skipped: a process that is not a member of a
/// subsystem simply cannot match in it. For [`StressScope::Pod`] the
/// matched path is widened to its parent directory.
///
/// # Errors
///
/// Returns [`StressError::CgroupNotFound`] if the catalog is exhausted.
pub fn locate_in(
    catalog: &[&str],
    paths: &dyn SubsystemPath,
    target: &str,
    scope: StressScope,
) -> Result<String> {
    for subsystem in catalog {
        let Ok(path) = paths.path(subsystem) else {
            continue;
        };
        if path.contains(target) {
            tracing::debug!(subsystem, path = %path, target, "found cgroup for target");
            return Ok(match scope {
                StressScope::Container => path,
                StressScope::Pod => parent_dir(&path).to_owned(),
            });
        }
    }
    Err(StressError::CgroupNotFound {
        target: target.to_owned(),
    })
}

fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &trimmed[..idx],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::cgroup::path::{FailedPaths, ResolvedPaths};

    const CONTAINER: &str = "/kubepods/burstable/podABC/container123";

    fn paths(entries: &[(&str, &str)]) -> ResolvedPaths {
        ResolvedPaths::new(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn container_scope_returns_exact_path() {
        let table = paths(&[("cpu", "/"), ("memory", CONTAINER)]);
        let found = locate(&table, "container123", StressScope::Container).unwrap();
        assert_eq!(found, CONTAINER);
    }

    #[test]
    fn pod_scope_returns_parent() {
        let table = paths(&[("memory", CONTAINER)]);
        let found = locate(&table, "container123", StressScope::Pod).unwrap();
        assert_eq!(found, "/kubepods/burstable/podABC");
    }

    #[test]
    fn first_subsystem_in_catalog_order_wins() {
        let table = paths(&[("cpu", "/a/container123"), ("memory", "/b/container123")]);
        let found = locate(&table, "container123", StressScope::Container).unwrap();
        assert_eq!(found, "/a/container123");
        let reversed = locate_in(&["memory", "cpu"], &table, "container123", StressScope::Container).unwrap();
        assert_eq!(reversed, "/b/container123");
    }

    #[test]
    fn single_match_is_found_under_any_catalog_order() {
        let table = paths(&[("cpu", "/"), ("pids", CONTAINER), ("memory", "/other")]);
        let mut catalog: Vec<&str> = SUBSYSTEMS.to_vec();
        for _ in 0..catalog.len() {
            catalog.rotate_left(1);
            assert_eq!(
                locate_in(&catalog, &table, "container123", StressScope::Container).unwrap(),
                CONTAINER
            );
            assert_eq!(
                locate_in(&catalog, &table, "container123", StressScope::Pod).unwrap(),
                "/kubepods/burstable/podABC"
            );
        }
    }

    #[test]
    fn exhausted_catalog_is_not_found() {
        let table = paths(&[("cpu", "/kubepods/other"), ("memory", "/system.slice")]);
        for _ in 0..2 {
            let err = locate(&table, "container123", StressScope::Container).unwrap_err();
            assert!(matches!(err, StressError::CgroupNotFound { ref target } if target == "container123"));
        }
    }

    #[test]
    fn failed_resolution_is_not_found() {
        let failed = FailedPaths::new(1, StressError::InvalidCgroupEntry { line: "x".into() });
        let err = locate(&failed, "container123", StressScope::Pod).unwrap_err();
        assert!(matches!(err, StressError::CgroupNotFound { .. }));
    }

    #[test]
    fn parent_dir_handles_root_and_trailing_slash() {
        assert_eq!(parent_dir("/a/b/"), "/a");
        assert_eq!(parent_dir("/a"), "/");
        assert_eq!(parent_dir("/"), "/");
    }
}
