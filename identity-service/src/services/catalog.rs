use std::collections::HashSet;

use once_cell::sync::OnceCell;

/// Permission tags this service itself declares. Other services register
/// their own groups with their own tag constants.
pub mod tags {
    /// Any caller holding a valid session.
    pub const SESSION_ACCESS: &str = "auth:session";
    /// Administrative access to the permission catalog.
    pub const CATALOG_ADMIN: &str = "auth:admin";
}

/// One registered handler and the permission tags it requires.
#[derive(Debug, Clone)]
pub struct RegisteredHandler {
    pub route: String,
    pub tags: Vec<String>,
}

/// A group of handlers plus group-level tags that apply to all of them.
/// Built declaratively at startup, next to where the routes are wired.
#[derive(Debug, Clone)]
pub struct HandlerGroup {
    pub name: String,
    pub tags: Vec<String>,
    pub handlers: Vec<RegisteredHandler>,
}

impl HandlerGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn handler(mut self, route: impl Into<String>, tags: &[&str]) -> Self {
        self.handlers.push(RegisteredHandler {
            route: route.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        self
    }
}

/// Explicit registry of every permission tag the platform understands.
///
/// Groups register at startup in a fixed order; the catalog is that order
/// flattened, group tags before the group's handler tags, with later
/// duplicates dropped. Nothing here inspects handlers at runtime, so the
/// catalog cannot drift from what enforcement actually checks.
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    groups: Vec<HandlerGroup>,
    catalog: OnceCell<Vec<String>>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, group: HandlerGroup) -> &mut Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[HandlerGroup] {
        &self.groups
    }

    /// Walk the registered groups and collect their tags in declaration
    /// order, keeping only the first occurrence of each.
    pub fn scan(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut catalog = Vec::new();

        for group in &self.groups {
            let handler_tags = group.handlers.iter().flat_map(|h| h.tags.iter());
            for tag in group.tags.iter().chain(handler_tags) {
                if seen.insert(tag.clone()) {
                    catalog.push(tag.clone());
                }
            }
        }

        catalog
    }

    /// Cached view of [`scan`](Self::scan). Registration is finished before
    /// the router starts serving, so computing once is safe.
    pub fn catalog(&self) -> &[String] {
        self.catalog.get_or_init(|| self.scan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_yields_an_empty_catalog() {
        let registry = PermissionRegistry::new();
        assert!(registry.scan().is_empty());
    }

    #[test]
    fn group_tags_come_before_their_handlers() {
        let mut registry = PermissionRegistry::new();
        registry.register(
            HandlerGroup::new("documents")
                .tag("docs:read")
                .handler("GET /documents", &[])
                .handler("POST /documents", &["docs:write"]),
        );

        assert_eq!(registry.scan(), vec!["docs:read", "docs:write"]);
    }

    #[test]
    fn groups_flatten_in_registration_order() {
        let mut registry = PermissionRegistry::new();
        registry
            .register(
                HandlerGroup::new("activities")
                    .tag("activities:read")
                    .handler("POST /activities", &["activities:write"]),
            )
            .register(
                HandlerGroup::new("auth")
                    .handler("POST /auth/logout", &[tags::SESSION_ACCESS])
                    .handler("GET /auth/permissions", &[tags::CATALOG_ADMIN]),
            );

        assert_eq!(
            registry.scan(),
            vec![
                "activities:read",
                "activities:write",
                tags::SESSION_ACCESS,
                tags::CATALOG_ADMIN,
            ]
        );
    }

    #[test]
    fn duplicate_tags_keep_their_first_position() {
        let mut registry = PermissionRegistry::new();
        registry
            .register(
                HandlerGroup::new("first")
                    .tag("shared:tag")
                    .handler("GET /a", &["first:only"]),
            )
            .register(
                HandlerGroup::new("second")
                    .tag("second:only")
                    .handler("GET /b", &["shared:tag"]),
            );

        assert_eq!(
            registry.scan(),
            vec!["shared:tag", "first:only", "second:only"]
        );
    }

    #[test]
    fn a_handler_may_require_several_tags() {
        let mut registry = PermissionRegistry::new();
        registry.register(
            HandlerGroup::new("admin")
                .handler("DELETE /everything", &["admin:super", "admin:audit"]),
        );

        assert_eq!(registry.scan(), vec!["admin:super", "admin:audit"]);
    }

    #[test]
    fn catalog_is_stable_across_calls() {
        let mut registry = PermissionRegistry::new();
        registry.register(HandlerGroup::new("auth").tag(tags::SESSION_ACCESS));

        let first = registry.catalog().to_vec();
        let second = registry.catalog().to_vec();
        assert_eq!(first, second);
        assert_eq!(first, vec![tags::SESSION_ACCESS]);
    }
}
