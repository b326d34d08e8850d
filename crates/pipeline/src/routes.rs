//! The backend's gated endpoints

use gatehouse_core::{Capability, CachePolicy, Role, Route, RouteClass};
use std::collections::BTreeMap;

use Capability::*;

/// Named routes of the content backend
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    routes: BTreeMap<String, Route>,
}

impl Default for RouteCatalog {
    fn default() -> Self {
        Self::from_routes(default_routes())
    }
}

impl RouteCatalog {
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|route| (route.name.clone(), route))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Read, create, update and delete for one content collection
fn content_routes(
    name: &str,
    read: Capability,
    write: Capability,
    delete: Capability,
) -> Vec<Route> {
    let collection = format!("/api/{name}");
    vec![
        Route::read(format!("{name}.list"), &collection)
            .requires(read)
            .rate_limited(RouteClass::Api)
            .cached(CachePolicy::shared()),
        Route::read(format!("{name}.get"), &collection)
            .requires(read)
            .rate_limited(RouteClass::Api)
            .cached(CachePolicy::shared()),
        Route::write(format!("{name}.create"), &collection)
            .requires(write)
            .rate_limited(RouteClass::Api),
        Route::write(format!("{name}.update"), &collection)
            .requires(write)
            .rate_limited(RouteClass::Api),
        Route::write(format!("{name}.delete"), &collection)
            .requires(delete)
            .rate_limited(RouteClass::Api),
    ]
}

/// Every route the backend exposes through the gate
#[must_use]
pub fn default_routes() -> Vec<Route> {
    let mut routes = vec![
        Route::read("health", "/api/health").cached(CachePolicy::shared()),
        Route::write("auth.login", "/api/auth")
            .public()
            .rate_limited(RouteClass::Login),
        Route::write("auth.register", "/api/auth")
            .public()
            .rate_limited(RouteClass::Register),
        Route::read("auth.me", "/api/auth")
            .authenticated()
            .rate_limited(RouteClass::Api),
    ];

    routes.extend(content_routes("news", ReadNews, WriteNews, DeleteNews));
    routes.extend(content_routes("events", ReadEvents, WriteEvents, DeleteEvents));
    routes.extend(content_routes(
        "conferences",
        ReadConferences,
        WriteConferences,
        DeleteConferences,
    ));

    routes.extend([
        Route::write("events.register", "/api/events")
            .requires(RegisterEvents)
            .rate_limited(RouteClass::Api),
        Route::read("profile.get", "/api/profile")
            .authenticated()
            .requires(ReadProfile)
            .rate_limited(RouteClass::Api)
            .cached(CachePolicy::private()),
        Route::write("profile.update", "/api/profile")
            .requires(WriteProfile)
            .rate_limited(RouteClass::Api),
        Route::read("admin.users", "/api/admin/users")
            .authenticated()
            .requires_role([Role::Admin])
            .rate_limited(RouteClass::Api),
        Route::write("admin.users.update", "/api/admin/users")
            .requires(ManageUsers)
            .rate_limited(RouteClass::Api),
        Route::write("admin.roles.update", "/api/admin/roles")
            .requires_all([ManageUsers, ManageRoles])
            .rate_limited(RouteClass::Api),
        Route::read("content.drafts", "/api/drafts")
            .authenticated()
            .requires_any([WriteNews, WriteEvents, WriteConferences])
            .rate_limited(RouteClass::Api),
    ]);

    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let routes = default_routes();
        let catalog = RouteCatalog::default();
        assert_eq!(catalog.len(), routes.len());
    }

    #[test]
    fn test_health_is_exempt_and_public() {
        let catalog = RouteCatalog::default();
        let health = catalog.get("health").unwrap();
        assert_eq!(health.route_class, None);
        assert!(!health.requires_authentication());
    }

    #[test]
    fn test_writes_are_authenticated_except_auth_flows() {
        let catalog = RouteCatalog::default();
        for route in catalog.iter().filter(|route| route.is_write()) {
            let is_auth_flow = route.name.starts_with("auth.");
            assert_eq!(route.requires_authentication(), !is_auth_flow, "{}", route.name);
            assert_eq!(route.cache_policy(), None);
        }
    }

    #[test]
    fn test_news_routes_share_a_collection() {
        let catalog = RouteCatalog::default();
        let list = catalog.get("news.list").unwrap();
        let create = catalog.get("news.create").unwrap();
        assert_eq!(list.collection, create.collection);
        assert!(list.cache_policy().is_some());
    }
}
