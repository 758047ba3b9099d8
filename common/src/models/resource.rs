// common/src/models/resource.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of backend resources the web layer talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Debts,
    Expenses,
    Incomes,
    Summaries,
    Predictions,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Debts,
        ResourceKind::Expenses,
        ResourceKind::Incomes,
        ResourceKind::Summaries,
        ResourceKind::Predictions,
    ];

    /// Root segment of this resource's cache keys
    pub fn key_root(self) -> &'static str {
        match self {
            ResourceKind::Debts => "debts",
            ResourceKind::Expenses => "expenses",
            ResourceKind::Incomes => "incomes",
            ResourceKind::Summaries => "summary",
            ResourceKind::Predictions => "predictions",
        }
    }

    /// Resource owning a backend path's first segment
    pub fn from_backend_segment(segment: &str) -> Option<Self> {
        match segment {
            "debts" => Some(ResourceKind::Debts),
            "expenses" => Some(ResourceKind::Expenses),
            "incomes" => Some(ResourceKind::Incomes),
            "summaries" => Some(ResourceKind::Summaries),
            "train" | "insights" => Some(ResourceKind::Predictions),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_root())
    }
}

/// Tabs on the personal page; each maps to one list resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalTab {
    Income,
    Expense,
    Debts,
}

impl PersonalTab {
    pub fn resource(self) -> ResourceKind {
        match self {
            PersonalTab::Income => ResourceKind::Incomes,
            PersonalTab::Expense => ResourceKind::Expenses,
            PersonalTab::Debts => ResourceKind::Debts,
        }
    }
}

impl Default for PersonalTab {
    fn default() -> Self {
        PersonalTab::Debts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab `{0}`")]
pub struct UnknownTab(pub String);

impl FromStr for PersonalTab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(PersonalTab::Income),
            "expense" => Ok(PersonalTab::Expense),
            "debts" => Ok(PersonalTab::Debts),
            other => Err(UnknownTab(other.to_string())),
        }
    }
}

/// Aggregation window for summary statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    Week,
    Month,
    Year,
}

impl SummaryPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryPeriod::Week => "week",
            SummaryPeriod::Month => "month",
            SummaryPeriod::Year => "year",
        }
    }
}

impl Default for SummaryPeriod {
    fn default() -> Self {
        SummaryPeriod::Month
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported period `{0}`")]
pub struct UnknownPeriod(pub String);

impl FromStr for SummaryPeriod {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(SummaryPeriod::Week),
            "month" => Ok(SummaryPeriod::Month),
            "year" => Ok(SummaryPeriod::Year),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}
