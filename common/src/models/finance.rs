// common/src/models/finance.rs
//! Request and response shapes mirroring the finance backend.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;
use crate::utils::{is_blank, trimmed_len};

/// Minimum length of free-text fields such as an income source
pub const MIN_TEXT_LEN: usize = 3;

/// Paginated list envelope used by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedTotal {
    pub date: String,
    pub total: f64,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCreateParams {
    pub amount: f64,
    pub description: String,
    pub category_id: Option<i64>,
    pub date: Option<String>,
}

impl ExpenseCreateParams {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_amount(&mut errors, self.amount);
        check_text(&mut errors, "description", &self.description, "Description");
        if self.category_id.is_none() {
            errors.add("category_id", "Please choose an expense category");
        }
        check_date(&mut errors, "date", self.date.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseStatistics {
    pub total_expenses: f64,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>,
    #[serde(default)]
    pub monthly_expenses: Vec<DatedTotal>,
}

// ---------------------------------------------------------------------------
// Incomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub source: String,
    pub date: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeCreateParams {
    pub amount: f64,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: Option<String>,
}

impl IncomeCreateParams {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_amount(&mut errors, self.amount);
        check_text(&mut errors, "source", &self.source, "Source");
        check_date(&mut errors, "date", self.date.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTotal {
    pub source: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatistics {
    pub total_income: f64,
    #[serde(default)]
    pub by_source: Vec<SourceTotal>,
    #[serde(default)]
    pub monthly_income: Vec<DatedTotal>,
}

// ---------------------------------------------------------------------------
// Debts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub amount: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub interest_rate: f64,
    pub due_date: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtCreateParams {
    pub amount: f64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub interest_rate: f64,
    pub due_date: Option<String>,
}

impl DebtCreateParams {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_amount(&mut errors, self.amount);
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if !self.interest_rate.is_finite() || self.interest_rate < 0.0 {
            errors.add("interest_rate", "Interest rate cannot be negative");
        }
        check_date(&mut errors, "due_date", self.due_date.as_deref());
        errors.into_result()
    }
}

/// Partial update; absent fields are left alone by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtUpdateParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
}

impl DebtUpdateParams {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(amount) = self.amount {
            check_amount(&mut errors, amount);
        }
        if let Some(rate) = self.interest_rate {
            if !rate.is_finite() || rate < 0.0 {
                errors.add("interest_rate", "Interest rate cannot be negative");
            }
        }
        if self.due_date.is_some() {
            check_date(&mut errors, "due_date", self.due_date.as_deref());
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtStatistics {
    pub total_debt: f64,
    #[serde(default)]
    pub upcoming_debts: Vec<DatedTotal>,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub total_debt: f64,
    pub balance: f64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    #[serde(default)]
    pub daily_summaries: Vec<FinancialSummary>,
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionParams {
    pub income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsight {
    pub category: String,
    pub avg_percentage: f64,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePrediction {
    pub predicted_expenses: f64,
    pub income: f64,
    pub savings_potential: f64,
    pub insights_available: bool,
    #[serde(default)]
    pub insights: Option<Vec<CategoryInsight>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInsight {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub income_range: String,
    pub category: String,
    pub avg_percentage: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResponse {
    pub success: bool,
    #[serde(default)]
    pub insights: Vec<StoredInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn check_amount(errors: &mut ValidationErrors, amount: f64) {
    if !amount.is_finite() || amount <= 0.0 {
        errors.add("amount", "Amount must be greater than 0");
    }
}

fn check_text(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) {
    if is_blank(Some(value)) {
        errors.add(field, format!("{} is required", label));
    } else if trimmed_len(value) < MIN_TEXT_LEN {
        errors.add(field, format!("{} must be at least {} characters", label, MIN_TEXT_LEN));
    }
}

fn check_date(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => errors.add(field, "Please choose a date"),
        Some(v) => {
            if NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err() {
                errors.add(field, "Date must use the YYYY-MM-DD format");
            }
        }
    }
}
