//! Route gating.
//!
//! Decides whether the widget is enabled for the current navigation
//! location. The `show_on` setting is a pipe-separated list of route
//! category tokens; each token has a matcher over the host route name and
//! pathname. Pure predicates, no host access.

use std::collections::HashSet;

/// Route categories the widget can be enabled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteToken {
    CustomHomepage,
    Latest,
    Top,
    New,
    Categories,
    Tags,
}

impl RouteToken {
    /// Parse a single `show_on` token. Unknown tokens yield `None` and are
    /// ignored by the gate.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "custom_homepage" => Some(Self::CustomHomepage),
            "latest" => Some(Self::Latest),
            "top" => Some(Self::Top),
            "new" => Some(Self::New),
            "categories" => Some(Self::Categories),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }

    fn matches(self, route_name: Option<&str>, pathname: &str) -> bool {
        let name = route_name.unwrap_or("");
        match self {
            Self::CustomHomepage => {
                if name.is_empty() && pathname.is_empty() {
                    return false;
                }
                name == "discovery.home"
                    || (name == "discovery.latest" && pathname == "/")
                    || pathname == "/"
                    || name == "home"
            }
            Self::Latest => name.starts_with("discovery.latest"),
            Self::Top => name.starts_with("discovery.top"),
            Self::New => name.starts_with("discovery.new"),
            Self::Categories => name == "discovery.categories",
            Self::Tags => name.starts_with("tag.") || pathname.starts_with("/tag/"),
        }
    }
}

/// Current navigation location, as reported by the host's route observer.
#[derive(Debug, Clone, Default)]
pub struct RouteInfo {
    pub route_name: Option<String>,
    pub pathname: String,
    pub search: String,
}

impl RouteInfo {
    pub fn new(route_name: Option<&str>, pathname: &str, search: &str) -> Self {
        Self {
            route_name: route_name.map(str::to_owned),
            pathname: pathname.to_owned(),
            search: search.to_owned(),
        }
    }

    /// Key used to skip redundant re-evaluation when the location did not
    /// actually change (in-page updates re-fire the navigation signal).
    pub fn route_key(&self) -> String {
        format!("{}::{}", self.pathname, self.search)
    }
}

fn normalize_route_set(show_on: &str) -> HashSet<RouteToken> {
    show_on
        .split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(RouteToken::parse)
        .collect()
}

/// True iff at least one enabled token's matcher accepts the location.
/// An empty or all-unknown `show_on` always disables the widget.
pub fn is_route_enabled(show_on: &str, route_name: Option<&str>, pathname: &str) -> bool {
    let enabled = normalize_route_set(show_on);
    if enabled.is_empty() {
        return false;
    }

    enabled
        .iter()
        .any(|token| token.matches(route_name, pathname))
}
