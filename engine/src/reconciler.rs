//! Merging routing-derived fragments into operator-declared ones.
//!
//! A routing rule yields a fragment keyed by the router name with only a URL.
//! The operator usually declares the same entry under a different, shorter or
//! longer, identifier with a group. Two fragments are treated as the same entry
//! when one identifier contains the other.
//!
//! When several grouped fragments qualify, the one whose length is closest to
//! the incoming identifier wins and ties are broken lexicographically, so the
//! result never depends on insertion order.
use crate::store::FragmentStore;
use std::cmp::Ordering;

/// A routing-derived fragment folded into a declared one during a sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Merge {
    pub orphan: String,
    pub into: String,
}

/// True when either identifier contains the other. Empty identifiers never match.
pub fn identifiers_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

// Closest in length to `id` first, in either containment direction.
fn candidate_order(id: &str, a: &str, b: &str) -> Ordering {
    let distance = |other: &str| other.len().abs_diff(id.len());
    distance(a).cmp(&distance(b)).then_with(|| a.cmp(b))
}

/// Finds the grouped fragment, other than `id` itself, that `id` most likely
/// refers to.
fn find_grouped_match<'a>(store: &'a FragmentStore, id: &str) -> Option<&'a str> {
    store
        .iter()
        .filter(|(other, fragment)| {
            *other != id && fragment.has_group() && identifiers_overlap(other, id)
        })
        .map(|(other, _)| other)
        .min_by(|a, b| candidate_order(id, a, b))
}

/// Picks the identifier a `url` update for `id` should be written to.
///
/// An existing grouped fragment under `id` always keeps the write. Otherwise the
/// write goes to an overlapping grouped fragment if there is one.
pub fn resolve_url_target(store: &FragmentStore, id: &str) -> String {
    if store.get(id).is_some_and(|fragment| fragment.has_group()) {
        return id.to_string();
    }

    match find_grouped_match(store, id) {
        Some(target) => {
            tracing::debug!(from = id, to = target, "Redirecting url update");
            target.to_string()
        }
        None => id.to_string(),
    }
}

/// Copies the URL of every orphan fragment into its overlapping grouped
/// fragment and removes the orphan. Orphans without a match are left alone.
pub fn sweep_orphans(store: &mut FragmentStore) -> Vec<Merge> {
    let orphans: Vec<String> = store
        .iter()
        .filter(|(_, fragment)| fragment.is_orphan())
        .map(|(id, _)| id.to_string())
        .collect();

    let mut merges = Vec::new();
    for orphan in orphans {
        let Some(target) = find_grouped_match(store, &orphan).map(str::to_string) else {
            continue;
        };
        let Some(fragment) = store.remove(&orphan) else {
            continue;
        };
        if let Some(declared) = store.get_mut(&target) {
            declared.url = fragment.url;
        }
        merges.push(Merge {
            orphan,
            into: target,
        });
    }
    merges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ItemField;

    fn declared(store: &mut FragmentStore, id: &str, group: &str) {
        store.apply_field_update(id, &ItemField::Name, id);
        store.apply_field_update(id, &ItemField::Service, group);
    }

    #[test]
    fn test_identifiers_overlap() {
        assert!(identifiers_overlap("gluetun-torrent", "torrent"));
        assert!(identifiers_overlap("torrent", "gluetun-torrent"));
        assert!(identifiers_overlap("same", "same"));
        assert!(!identifiers_overlap("sonarr", "radarr"));
        assert!(!identifiers_overlap("", "anything"));
        assert!(!identifiers_overlap("anything", ""));
    }

    #[test]
    fn test_resolve_exact_match_wins() {
        let mut store = FragmentStore::new();
        declared(&mut store, "torrent", "warez");
        declared(&mut store, "torrent-ui", "warez");

        // "torrent-ui" contains "torrent" but the exact identifier is grouped
        assert_eq!(resolve_url_target(&store, "torrent"), "torrent");
    }

    #[test]
    fn test_resolve_containment() {
        let mut store = FragmentStore::new();
        declared(&mut store, "torrent", "warez");

        assert_eq!(resolve_url_target(&store, "gluetun-torrent"), "torrent");
        assert_eq!(resolve_url_target(&store, "tor"), "torrent");
        assert_eq!(resolve_url_target(&store, "slskd"), "slskd");
    }

    #[test]
    fn test_resolve_ignores_ungrouped_candidates() {
        let mut store = FragmentStore::new();
        store.apply_field_update("torrent", &ItemField::Name, "qbittorrent");

        assert_eq!(resolve_url_target(&store, "gluetun-torrent"), "gluetun-torrent");
    }

    #[test]
    fn test_resolve_ungrouped_own_fragment_still_redirects() {
        let mut store = FragmentStore::new();
        store.apply_field_update("gluetun-torrent", &ItemField::Name, "router");
        declared(&mut store, "torrent", "warez");

        assert_eq!(resolve_url_target(&store, "gluetun-torrent"), "torrent");
    }

    #[test]
    fn test_resolve_tie_break_is_deterministic() {
        let mut store = FragmentStore::new();
        declared(&mut store, "b-torrent", "warez");
        declared(&mut store, "a-torrent", "warez");
        declared(&mut store, "torrent", "warez");

        // All three contain "orrent": the closest length wins
        assert_eq!(resolve_url_target(&store, "orrent"), "torrent");
        // Equal distance falls back to lexicographic order
        assert_eq!(resolve_url_target(&store, "-torrent"), "a-torrent");
        // The most specific contained candidate wins over a shorter one
        assert_eq!(resolve_url_target(&store, "x-a-torrent-y"), "a-torrent");
    }

    #[test]
    fn test_resolve_prefers_closest_containing_candidate() {
        let mut store = FragmentStore::new();
        declared(&mut store, "radarr-4k-anime-extra", "media");
        declared(&mut store, "radarr-4k", "media");

        assert_eq!(resolve_url_target(&store, "radarr"), "radarr-4k");
        assert_eq!(
            resolve_url_target(&store, "radarr-4k-anime-extra-hd"),
            "radarr-4k-anime-extra"
        );
    }

    #[test]
    fn test_sweep_merges_orphan() {
        let mut store = FragmentStore::new();
        store.apply_field_update("gluetun-torrent", &ItemField::Url, "https://torrent.example.com");
        store.apply_field_update("torrent", &ItemField::Name, "qbittorrent");
        store.apply_field_update("torrent", &ItemField::Service, "warez");

        let merges = sweep_orphans(&mut store);

        assert_eq!(
            merges,
            vec![Merge {
                orphan: "gluetun-torrent".into(),
                into: "torrent".into()
            }]
        );
        assert!(store.get("gluetun-torrent").is_none());
        assert_eq!(store.get("torrent").unwrap().url, "https://torrent.example.com");
    }

    #[test]
    fn test_sweep_leaves_unrelated_orphans() {
        let mut store = FragmentStore::new();
        store.apply_field_update("sonarr", &ItemField::Url, "https://sonarr.example.com");
        declared(&mut store, "radarr", "media");

        assert!(sweep_orphans(&mut store).is_empty());
        assert!(store.get("sonarr").is_some());
        assert_eq!(store.get("radarr").unwrap().url, "");
    }

    #[test]
    fn test_sweep_multiple_orphans() {
        let mut store = FragmentStore::new();
        store.apply_field_update("gluetun-torrent", &ItemField::Url, "https://torrent.example.com");
        store.apply_field_update("gluetun-slskd", &ItemField::Url, "https://slskd.example.com");
        declared(&mut store, "torrent", "warez");
        declared(&mut store, "slskd", "warez");

        let merges = sweep_orphans(&mut store);
        assert_eq!(merges.len(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("torrent").unwrap().url, "https://torrent.example.com");
        assert_eq!(store.get("slskd").unwrap().url, "https://slskd.example.com");
    }
}
