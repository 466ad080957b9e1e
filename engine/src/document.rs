use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// The dashboard document written by a sink.
///
/// Unset fields are omitted from the serialized form rather than written empty.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Document {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Entry groups, serialized under `services` to match the dashboard format.
    #[serde(rename = "services", default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
}

/// Top-level dashboard metadata, set directly by `<prefix>.<key>` labels.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DocumentMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub logo: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(skip_serializing_if = "is_false")]
    pub header: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub footer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub theme: String,
}

impl DocumentMeta {
    pub fn with_title<T: Into<String>>(title: T) -> Self {
        DocumentMeta {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets a metadata field by key. Returns false for unknown keys or a
    /// header value that is not a boolean.
    pub fn set(&mut self, key: MetaKey, value: &str) -> bool {
        match key {
            MetaKey::Title => self.title = value.to_string(),
            MetaKey::Subtitle => self.subtitle = value.to_string(),
            MetaKey::Logo => self.logo = value.to_string(),
            MetaKey::Icon => self.icon = value.to_string(),
            MetaKey::Footer => self.footer = value.to_string(),
            MetaKey::Theme => self.theme = value.to_string(),
            MetaKey::Header => match value.trim().parse::<bool>() {
                Ok(header) => self.header = header,
                Err(_) => return false,
            },
        }
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaKey {
    Title,
    Subtitle,
    Logo,
    Icon,
    Header,
    Footer,
    Theme,
}

impl MetaKey {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "title" => Some(MetaKey::Title),
            "subtitle" => Some(MetaKey::Subtitle),
            "logo" => Some(MetaKey::Logo),
            "icon" => Some(MetaKey::Icon),
            "header" => Some(MetaKey::Header),
            "footer" => Some(MetaKey::Footer),
            "theme" => Some(MetaKey::Theme),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Entry>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Entry {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
}
