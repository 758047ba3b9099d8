// api-client/src/query_keys.rs
use common::models::resource::{ResourceKind, SummaryPeriod};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Filter parameters as they appear in both keys and query strings
pub type Params = BTreeMap<String, String>;

/// One element of a structured cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeySegment {
    Text(String),
    Id(i64),
    Params(Params),
}

/// Structured cache key: resource root, then scope, then parameters.
///
/// Invalidation matches by prefix, so `[expenses, list]` covers every
/// filtered expense list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// Matches every key; used when the session changes
    pub fn any() -> Self {
        QueryKey(Vec::new())
    }

    pub fn all(resource: ResourceKind) -> Self {
        QueryKey(vec![KeySegment::Text(resource.key_root().to_string())])
    }

    fn with(mut self, segment: KeySegment) -> Self {
        self.0.push(segment);
        self
    }

    fn scoped(resource: ResourceKind, scope: &str) -> Self {
        Self::all(resource).with(KeySegment::Text(scope.to_string()))
    }

    pub fn lists(resource: ResourceKind) -> Self {
        Self::scoped(resource, "list")
    }

    pub fn list(resource: ResourceKind, filters: Params) -> Self {
        Self::lists(resource).with(KeySegment::Params(filters))
    }

    pub fn details(resource: ResourceKind) -> Self {
        Self::scoped(resource, "detail")
    }

    pub fn detail(resource: ResourceKind, id: i64) -> Self {
        Self::details(resource).with(KeySegment::Id(id))
    }

    pub fn statistics(resource: ResourceKind) -> Self {
        Self::scoped(resource, "statistics")
    }

    pub fn expense_categories() -> Self {
        Self::scoped(ResourceKind::Expenses, "categories")
    }

    pub fn summary_current() -> Self {
        Self::scoped(ResourceKind::Summaries, "current")
    }

    pub fn summary_statistics(period: SummaryPeriod) -> Self {
        let mut params = Params::new();
        params.insert("period".to_string(), period.as_str().to_string());
        Self::statistics(ResourceKind::Summaries).with(KeySegment::Params(params))
    }

    pub fn insights() -> Self {
        Self::scoped(ResourceKind::Predictions, "insights")
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

/// Turn a filter struct into string parameters, dropping unset fields
pub fn to_params<F: Serialize>(filters: &F) -> Params {
    let mut params = Params::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(filters) {
        for (name, value) in map {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => {
                    params.insert(name, s);
                }
                other => {
                    params.insert(name, other.to_string());
                }
            }
        }
    }
    params
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncomeFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DebtFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Summary listing; every field has a backend default
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryFilters {
    pub period: SummaryPeriod,
    pub page: u32,
    pub per_page: u32,
}

impl Default for SummaryFilters {
    fn default() -> Self {
        Self {
            period: SummaryPeriod::default(),
            page: 1,
            per_page: 10,
        }
    }
}
