// common/src/models/routes.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::RoutesConfig;

/// Partition a page path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Public,
    Protected,
}

/// Outcome of running a request through the route guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route `{0}` must start with '/'")]
    NotAbsolute(String),
    #[error("route `{0}` is listed more than once")]
    Duplicate(String),
    #[error("route `{0}` is listed as both public and protected")]
    Overlap(String),
    #[error("route `{0}` is hidden by unguarded prefix `{1}`")]
    Shadowed(String, String),
    #[error("login route `{0}` must be public")]
    LoginNotPublic(String),
    #[error("landing route `{0}` must be protected")]
    LandingNotProtected(String),
}

/// Explicit page-path partition, validated once at startup.
///
/// Listed paths are matched exactly (trailing slash ignored). Paths not
/// listed are protected unless they fall under an unguarded prefix or
/// suffix, in which case the guard does not look at them at all.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: BTreeMap<String, RouteClass>,
    login: String,
    landing: String,
    unguarded_prefixes: Vec<String>,
    unguarded_suffixes: Vec<String>,
}

impl RouteTable {
    pub fn from_config(config: &RoutesConfig) -> Result<Self, RouteTableError> {
        let mut entries = BTreeMap::new();

        let listed = config
            .public
            .iter()
            .map(|p| (p, RouteClass::Public))
            .chain(config.protected.iter().map(|p| (p, RouteClass::Protected)));

        for (raw, class) in listed {
            if !raw.starts_with('/') {
                return Err(RouteTableError::NotAbsolute(raw.clone()));
            }
            let path = normalize(raw).to_string();
            match entries.get(&path) {
                Some(existing) if *existing == class => {
                    return Err(RouteTableError::Duplicate(path));
                }
                Some(_) => return Err(RouteTableError::Overlap(path)),
                None => {
                    entries.insert(path, class);
                }
            }
        }

        let table = Self {
            entries,
            login: normalize(&config.login).to_string(),
            landing: normalize(&config.landing).to_string(),
            unguarded_prefixes: config.unguarded_prefixes.clone(),
            unguarded_suffixes: config.unguarded_suffixes.clone(),
        };

        for path in table.entries.keys() {
            if let Some(prefix) = table.unguarded_prefix_for(path) {
                return Err(RouteTableError::Shadowed(path.clone(), prefix.to_string()));
            }
        }

        if table.classify(&table.login) != Some(RouteClass::Public) {
            return Err(RouteTableError::LoginNotPublic(table.login.clone()));
        }
        if table.classify(&table.landing) != Some(RouteClass::Protected) {
            return Err(RouteTableError::LandingNotProtected(table.landing.clone()));
        }

        Ok(table)
    }

    /// `None` for paths the guard ignores (API calls, assets)
    pub fn classify(&self, path: &str) -> Option<RouteClass> {
        let path = normalize(path);
        if self.unguarded_prefix_for(path).is_some()
            || self.unguarded_suffixes.iter().any(|s| path.ends_with(s.as_str()))
        {
            return None;
        }
        Some(
            self.entries
                .get(path)
                .copied()
                .unwrap_or(RouteClass::Protected),
        )
    }

    /// Presence-only decision; token validity is the backend's concern
    pub fn decide(&self, path: &str, has_access_cookie: bool) -> GuardDecision {
        match (self.classify(path), has_access_cookie) {
            (Some(RouteClass::Protected), false) => GuardDecision::Redirect(self.login.clone()),
            (Some(RouteClass::Public), true) => GuardDecision::Redirect(self.landing.clone()),
            _ => GuardDecision::Pass,
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login
    }

    pub fn landing_path(&self) -> &str {
        &self.landing
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, RouteClass)> {
        self.entries.iter().map(|(p, c)| (p.as_str(), *c))
    }

    fn unguarded_prefix_for(&self, path: &str) -> Option<&str> {
        self.unguarded_prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| {
                path == *prefix
                    || path
                        .strip_prefix(*prefix)
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            })
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
