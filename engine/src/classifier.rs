//! Sorting raw container labels into the dashboard and routing namespaces.
//!
//! Dashboard labels look like `homer.items.<id>.<field>`, `homer.<key>` or
//! `homer.services.<group>.icon`. Routing labels look like
//! `traefik.http.routers.<router>.rule` and are translated into a synthetic
//! `homer.items.<router>.url` update.
use crate::document::MetaKey;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_PREFIX: &str = "homer";
pub const DEFAULT_ROUTING_PREFIX: &str = "traefik.http.routers";
pub const DEFAULT_URL_SCHEME: &str = "https";

// Matches Host("example.com") and Host(`example.com`).
static HOST_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Host\(\s*(?:"([^"]+)"|`([^`]+)`)"#).expect("host rule regex is valid")
});

/// Label prefixes and the scheme used for routing-derived URLs.
#[derive(Clone, Debug, PartialEq)]
pub struct Namespaces {
    pub prefix: String,
    pub routing_prefix: String,
    pub url_scheme: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Namespaces {
            prefix: DEFAULT_PREFIX.into(),
            routing_prefix: DEFAULT_ROUTING_PREFIX.into(),
            url_scheme: DEFAULT_URL_SCHEME.into(),
        }
    }
}

/// Entry field named by the last segment of an item label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemField {
    Name,
    Subtitle,
    Url,
    Icon,
    Tag,
    /// Group membership. Called `service` in the dashboard's vocabulary.
    Service,
    Unknown(String),
}

impl ItemField {
    pub fn parse(field: &str) -> Self {
        match field {
            "name" => ItemField::Name,
            "subtitle" => ItemField::Subtitle,
            "url" => ItemField::Url,
            "icon" => ItemField::Icon,
            "tag" => ItemField::Tag,
            "service" => ItemField::Service,
            other => ItemField::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Classified<'a> {
    Item { id: &'a str, field: ItemField },
    Meta(MetaKey),
    GroupIcon { group: &'a str },
    RoutingRule { router: &'a str },
    Ignored,
}

#[derive(Clone, Debug)]
pub struct LabelClassifier {
    namespaces: Namespaces,
    dashboard_prefix: String,
    items_prefix: String,
    services_prefix: String,
    routing_prefix: String,
}

impl LabelClassifier {
    pub fn new(namespaces: Namespaces) -> Self {
        let dashboard_prefix = format!("{}.", namespaces.prefix);
        LabelClassifier {
            items_prefix: format!("{dashboard_prefix}items."),
            services_prefix: format!("{dashboard_prefix}services."),
            routing_prefix: format!("{}.", namespaces.routing_prefix),
            dashboard_prefix,
            namespaces,
        }
    }

    pub fn is_dashboard_label(&self, name: &str) -> bool {
        name.starts_with(&self.dashboard_prefix)
    }

    pub fn is_routing_rule_label(&self, name: &str) -> bool {
        self.router_id(name).is_some()
    }

    fn router_id<'a>(&self, name: &'a str) -> Option<&'a str> {
        let router = name
            .strip_prefix(&self.routing_prefix)?
            .strip_suffix(".rule")?;
        if router.is_empty() || router.contains('.') {
            return None;
        }
        Some(router)
    }

    /// Builds the dashboard label for an item field.
    pub fn item_label(&self, id: &str, field: &str) -> String {
        format!("{}{id}.{field}", self.items_prefix)
    }

    /// Turns a routing rule into a `url` update for the router's identifier.
    ///
    /// Returns `None` when the label is not a routing rule or the value holds
    /// no `Host(...)` matcher.
    pub fn translate_routing_rule(&self, name: &str, value: &str) -> Option<(String, String)> {
        let router = self.router_id(name)?;
        let Some(host) = extract_host(value) else {
            tracing::debug!(label = name, value, "No host found in routing rule");
            return None;
        };

        Some((
            self.item_label(router, "url"),
            format!("{}://{host}", self.namespaces.url_scheme),
        ))
    }

    pub fn classify<'a>(&self, name: &'a str) -> Classified<'a> {
        if let Some(router) = self.router_id(name) {
            return Classified::RoutingRule { router };
        }

        if let Some(rest) = name.strip_prefix(&self.items_prefix) {
            return match split_pair(rest) {
                Some((id, field)) => Classified::Item {
                    id,
                    field: ItemField::parse(field),
                },
                None => Classified::Ignored,
            };
        }

        if let Some(rest) = name.strip_prefix(&self.services_prefix) {
            return match split_pair(rest) {
                Some((group, "icon")) => Classified::GroupIcon { group },
                _ => Classified::Ignored,
            };
        }

        if let Some(key) = name.strip_prefix(&self.dashboard_prefix) {
            return match MetaKey::parse(key) {
                Some(key) => Classified::Meta(key),
                None => Classified::Ignored,
            };
        }

        Classified::Ignored
    }
}

impl Default for LabelClassifier {
    fn default() -> Self {
        LabelClassifier::new(Namespaces::default())
    }
}

/// Splits `a.b` into exactly two non-empty segments.
fn split_pair(rest: &str) -> Option<(&str, &str)> {
    let (first, second) = rest.split_once('.')?;
    if first.is_empty() || second.is_empty() || second.contains('.') {
        return None;
    }
    Some((first, second))
}

/// Returns the first hostname in a `Host(...)` matcher.
pub fn extract_host(value: &str) -> Option<&str> {
    let captures = HOST_RULE.captures(value)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str())
}
