use crate::document::{Document, DocumentMeta, Group};
use crate::reconciler::{Merge, sweep_orphans};
use crate::store::{Fragment, FragmentStore};
use std::collections::BTreeMap;

/// Result of a rebuild.
#[derive(Clone, Debug, PartialEq)]
pub struct Build {
    pub document: Document,
    /// Orphans folded into declared fragments during this build.
    pub merges: Vec<Merge>,
    /// Identifiers of fragments left out because they have no group.
    pub unassigned: Vec<String>,
}

/// Reconciles orphans, then groups every fragment by its declared group.
///
/// Groups are sorted by name and entries by name then identifier.
pub fn build(meta: &DocumentMeta, store: &mut FragmentStore) -> Build {
    let merges = sweep_orphans(store);

    let mut by_group: BTreeMap<&str, Vec<(&str, &Fragment)>> = BTreeMap::new();
    let mut unassigned = Vec::new();

    for (id, fragment) in store.iter() {
        if fragment.has_group() {
            by_group
                .entry(fragment.group.as_str())
                .or_default()
                .push((id, fragment));
        } else {
            unassigned.push(id.to_string());
        }
    }

    let groups = by_group
        .into_iter()
        .map(|(name, mut members)| {
            members.sort_by(|(a_id, a), (b_id, b)| {
                a.name.cmp(&b.name).then_with(|| a_id.cmp(b_id))
            });
            Group {
                name: name.to_string(),
                icon: store.group_icon(name).map(String::from),
                items: members.iter().map(|(_, f)| f.to_entry()).collect(),
            }
        })
        .collect();

    Build {
        document: Document {
            meta: meta.clone(),
            groups,
        },
        merges,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ItemField;
    use crate::document::Entry;

    fn item(store: &mut FragmentStore, id: &str, name: &str, url: &str, group: &str) {
        store.apply_field_update(id, &ItemField::Name, name);
        store.apply_field_update(id, &ItemField::Url, url);
        store.apply_field_update(id, &ItemField::Service, group);
    }

    #[test]
    fn test_build_groups_sorted() {
        let mut store = FragmentStore::new();
        item(&mut store, "z", "Zulu", "https://z", "apps");
        item(&mut store, "a", "Alpha", "https://a", "apps");
        item(&mut store, "m", "Media", "https://m", "media");
        item(&mut store, "b", "Alpha", "https://b", "apps");
        store.set_group_icon("media", "fas fa-film");

        let build = build(&DocumentMeta::with_title("Home"), &mut store);
        let document = build.document;

        assert_eq!(document.meta.title, "Home");
        assert_eq!(document.groups.len(), 2);
        assert_eq!(document.groups[0].name, "apps");
        assert_eq!(document.groups[0].icon, None);
        let urls: Vec<&str> = document.groups[0].items.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b", "https://z"]);
        assert_eq!(document.groups[1].name, "media");
        assert_eq!(document.groups[1].icon.as_deref(), Some("fas fa-film"));
        assert!(build.unassigned.is_empty());
    }

    #[test]
    fn test_build_drops_ungrouped() {
        let mut store = FragmentStore::new();
        item(&mut store, "test1", "Test Service", "http://test.com", "apps");
        store.apply_field_update("sonarr", &ItemField::Url, "https://sonarr.example.com");
        store.apply_field_update("nameless", &ItemField::Name, "Nameless");

        let build = build(&DocumentMeta::default(), &mut store);

        assert_eq!(build.document.groups.len(), 1);
        assert_eq!(
            build.document.groups[0].items,
            vec![Entry {
                name: "Test Service".into(),
                url: "http://test.com".into(),
                ..Default::default()
            }]
        );
        assert_eq!(build.unassigned, vec!["nameless".to_string(), "sonarr".to_string()]);
    }

    #[test]
    fn test_build_sweeps_first() {
        let mut store = FragmentStore::new();
        store.apply_field_update("gluetun-torrent", &ItemField::Url, "https://torrent.example.com");
        store.apply_field_update("torrent", &ItemField::Name, "qbittorrent");
        store.apply_field_update("torrent", &ItemField::Service, "warez");

        let build = build(&DocumentMeta::default(), &mut store);

        assert_eq!(build.merges.len(), 1);
        assert!(build.unassigned.is_empty());
        assert_eq!(build.document.groups[0].items[0].url, "https://torrent.example.com");
    }

    #[test]
    fn test_group_icon_without_group_is_ignored() {
        let mut store = FragmentStore::new();
        store.set_group_icon("ghost", "fas fa-ghost");
        let build = build(&DocumentMeta::default(), &mut store);
        assert!(build.document.groups.is_empty());
    }
}
