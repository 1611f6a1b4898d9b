//! Property-based tests for manifest validation and repo selection.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::{filter_by_ids, validate_base_ref, validate_path, Repo};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,11}".prop_filter("not a parent dir", |s| s != "..")
    }

    fn repos(ids: &[String]) -> Vec<Repo> {
        ids.iter()
            .map(|id| Repo {
                id: id.clone(),
                path: id.clone(),
                ..Default::default()
            })
            .collect()
    }

    proptest! {
        /// Property: relative paths built from plain segments are accepted
        #[test]
        fn relative_paths_are_accepted(parts in prop::collection::vec(segment(), 1..5)) {
            let path = parts.join("/");
            prop_assert!(validate_path(&path, "repos[0].path").is_ok(), "rejected {}", path);
        }

        /// Property: any `..` component is rejected, wherever it appears
        #[test]
        fn parent_components_are_rejected(
            before in prop::collection::vec(segment(), 0..3),
            after in prop::collection::vec(segment(), 0..3),
        ) {
            let mut parts = before;
            parts.push("..".to_string());
            parts.extend(after);
            let path = parts.join("/");
            prop_assert!(validate_path(&path, "p").is_err(), "accepted {}", path);
        }

        /// Property: absolute paths are rejected
        #[test]
        fn absolute_paths_are_rejected(parts in prop::collection::vec(segment(), 0..4)) {
            let path = format!("/{}", parts.join("/"));
            prop_assert!(validate_path(&path, "p").is_err());
        }

        /// Property: remote-qualified base refs are rejected, bare names are not
        #[test]
        fn base_ref_prefixes(name in "[a-z][a-z0-9_-]{0,15}") {
            prop_assert!(validate_base_ref(&name, "base_ref").is_ok());
            let remote = format!("origin/{}", name);
            prop_assert!(validate_base_ref(&remote, "base_ref").is_err());
            let full = format!("refs/heads/{}", name);
            prop_assert!(validate_base_ref(&full, "base_ref").is_err());
        }

        /// Property: id filtering keeps manifest order and never adds repos
        #[test]
        fn filter_by_ids_preserves_order(
            ids in prop::collection::btree_set("[a-z]{1,6}", 0..8),
            only_mask in prop::collection::vec(any::<bool>(), 8),
            skip_mask in prop::collection::vec(any::<bool>(), 8),
        ) {
            let ids: Vec<String> = ids.into_iter().collect();
            let only: Vec<String> = ids.iter().zip(&only_mask).filter(|(_, m)| **m).map(|(i, _)| i.clone()).collect();
            let skip: Vec<String> = ids.iter().zip(&skip_mask).filter(|(_, m)| **m).map(|(i, _)| i.clone()).collect();

            let kept: Vec<String> = filter_by_ids(repos(&ids), &only, &skip)
                .into_iter()
                .map(|r| r.id)
                .collect();

            let expected: Vec<String> = ids
                .iter()
                .filter(|id| only.is_empty() || only.contains(id))
                .filter(|id| !skip.contains(id))
                .cloned()
                .collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
