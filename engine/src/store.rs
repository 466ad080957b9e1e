use crate::classifier::ItemField;
use crate::document::Entry;
use std::collections::BTreeMap;

/// A partially populated entry, keyed by the identifier its labels used.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub subtitle: String,
    pub tag: String,
    pub url: String,
    pub icon: String,
    /// Declared group. Empty means the fragment is not placed in the document.
    pub group: String,
}

impl Fragment {
    pub fn has_group(&self) -> bool {
        !self.group.is_empty()
    }

    /// Routing-derived fragments carry a URL but were never assigned a group.
    pub fn is_orphan(&self) -> bool {
        !self.url.is_empty() && self.group.is_empty()
    }

    fn set(&mut self, field: &ItemField, value: &str) {
        let slot = match field {
            ItemField::Name => &mut self.name,
            ItemField::Subtitle => &mut self.subtitle,
            ItemField::Url => &mut self.url,
            ItemField::Icon => &mut self.icon,
            ItemField::Tag => &mut self.tag,
            ItemField::Service => &mut self.group,
            ItemField::Unknown(_) => return,
        };
        *slot = value.to_string();
    }

    pub fn to_entry(&self) -> Entry {
        Entry {
            name: self.name.clone(),
            subtitle: self.subtitle.clone(),
            tag: self.tag.clone(),
            url: self.url.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Identifier to fragment mapping. Iteration is in identifier order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FragmentStore {
    fragments: BTreeMap<String, Fragment>,
    group_icons: BTreeMap<String, String>,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches or creates the fragment for `id` and sets one field on it.
    pub fn apply_field_update(&mut self, id: &str, field: &ItemField, value: &str) {
        self.fragments
            .entry(id.to_string())
            .or_default()
            .set(field, value);
    }

    pub fn set_group_icon(&mut self, group: &str, icon: &str) {
        self.group_icons.insert(group.to_string(), icon.to_string());
    }

    pub fn group_icon(&self, group: &str) -> Option<&str> {
        self.group_icons.get(group).map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&Fragment> {
        self.fragments.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Fragment> {
        self.fragments.get_mut(id)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Fragment> {
        self.fragments.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fragment)> {
        self.fragments.iter().map(|(id, f)| (id.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn reset(&mut self) {
        self.fragments.clear();
        self.group_icons.clear();
    }
}
