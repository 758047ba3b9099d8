// api-client/src/resources.rs
//! Typed queries and mutations per backend resource.
use common::models::finance::{
    Debt, DebtCreateParams, DebtStatistics, DebtUpdateParams, Expense, ExpenseCategory,
    ExpenseCreateParams, ExpensePrediction, ExpenseStatistics, FinancialSummary, Income,
    IncomeCreateParams, IncomeStatistics, InsightResponse, Page, PredictionParams,
    SummaryStatistics, TrainResponse,
};
use common::models::resource::{PersonalTab, ResourceKind, SummaryPeriod};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use crate::client::FinanceClient;
use crate::error::ApiError;
use crate::query_keys::{
    to_params, DebtFilters, ExpenseFilters, IncomeFilters, Params, QueryKey, SummaryFilters,
};

/// Categories barely change; everything else refetches on every use
pub const CATEGORIES_STALE_TIME: Duration = Duration::from_secs(5 * 60);
const ALWAYS_STALE: Duration = Duration::ZERO;

/// List data for one personal-page tab
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceList {
    Incomes(Page<Income>),
    Expenses(Page<Expense>),
    Debts(Page<Debt>),
}

impl ResourceList {
    pub fn resource(&self) -> ResourceKind {
        match self {
            ResourceList::Incomes(_) => ResourceKind::Incomes,
            ResourceList::Expenses(_) => ResourceKind::Expenses,
            ResourceList::Debts(_) => ResourceKind::Debts,
        }
    }
}

// Detail queries wait for a real id
fn require_id(id: i64) -> Result<i64, ApiError> {
    if id == 0 {
        Err(ApiError::Disabled)
    } else {
        Ok(id)
    }
}

impl FinanceClient {
    pub async fn list_for_tab(&self, tab: PersonalTab) -> Result<ResourceList, ApiError> {
        match tab {
            PersonalTab::Income => self
                .incomes(&IncomeFilters::default())
                .await
                .map(ResourceList::Incomes),
            PersonalTab::Expense => self
                .expenses(&ExpenseFilters::default())
                .await
                .map(ResourceList::Expenses),
            PersonalTab::Debts => self
                .debts(&DebtFilters::default())
                .await
                .map(ResourceList::Debts),
        }
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        resource: ResourceKind,
        path: &str,
        params: Params,
    ) -> Result<Page<T>, ApiError> {
        let key = QueryKey::list(resource, params.clone());
        self.query(key, path.to_string(), params, ALWAYS_STALE).await
    }

    async fn detail<T: serde::de::DeserializeOwned>(
        &self,
        resource: ResourceKind,
        path: &str,
        id: i64,
    ) -> Result<T, ApiError> {
        let id = require_id(id)?;
        let key = QueryKey::detail(resource, id);
        self.query(key, format!("{}/{}", path, id), Params::new(), ALWAYS_STALE)
            .await
    }

    async fn statistics<T: serde::de::DeserializeOwned>(
        &self,
        resource: ResourceKind,
        path: &str,
    ) -> Result<T, ApiError> {
        let key = QueryKey::statistics(resource);
        self.query(key, format!("{}/statistics", path), Params::new(), ALWAYS_STALE)
            .await
    }

    // Expenses

    pub async fn expenses(&self, filters: &ExpenseFilters) -> Result<Page<Expense>, ApiError> {
        self.list(ResourceKind::Expenses, "/expenses", to_params(filters)).await
    }

    pub async fn expense(&self, id: i64) -> Result<Expense, ApiError> {
        self.detail(ResourceKind::Expenses, "/expenses", id).await
    }

    pub async fn expense_statistics(&self) -> Result<ExpenseStatistics, ApiError> {
        self.statistics(ResourceKind::Expenses, "/expenses").await
    }

    pub async fn expense_categories(&self) -> Result<Vec<ExpenseCategory>, ApiError> {
        self.query(
            QueryKey::expense_categories(),
            "/expenses/categories".to_string(),
            Params::new(),
            CATEGORIES_STALE_TIME,
        )
        .await
    }

    pub async fn create_expense(&self, params: &ExpenseCreateParams) -> Result<Value, ApiError> {
        params.validate()?;
        self.mutate(
            Method::POST,
            "/expenses",
            params,
            &[QueryKey::lists(ResourceKind::Expenses)],
        )
        .await
    }

    // Incomes

    pub async fn incomes(&self, filters: &IncomeFilters) -> Result<Page<Income>, ApiError> {
        self.list(ResourceKind::Incomes, "/incomes", to_params(filters)).await
    }

    pub async fn income(&self, id: i64) -> Result<Income, ApiError> {
        self.detail(ResourceKind::Incomes, "/incomes", id).await
    }

    pub async fn income_statistics(&self) -> Result<IncomeStatistics, ApiError> {
        self.statistics(ResourceKind::Incomes, "/incomes").await
    }

    pub async fn create_income(&self, params: &IncomeCreateParams) -> Result<Value, ApiError> {
        params.validate()?;
        self.mutate(
            Method::POST,
            "/incomes",
            params,
            &[QueryKey::lists(ResourceKind::Incomes)],
        )
        .await
    }

    // Debts

    pub async fn debts(&self, filters: &DebtFilters) -> Result<Page<Debt>, ApiError> {
        self.list(ResourceKind::Debts, "/debts", to_params(filters)).await
    }

    pub async fn debt(&self, id: i64) -> Result<Debt, ApiError> {
        self.detail(ResourceKind::Debts, "/debts", id).await
    }

    pub async fn debt_statistics(&self) -> Result<DebtStatistics, ApiError> {
        self.statistics(ResourceKind::Debts, "/debts").await
    }

    pub async fn create_debt(&self, params: &DebtCreateParams) -> Result<Value, ApiError> {
        params.validate()?;
        self.mutate(
            Method::POST,
            "/debts",
            params,
            &[QueryKey::lists(ResourceKind::Debts)],
        )
        .await
    }

    /// Partial update, e.g. marking a debt paid
    pub async fn update_debt(&self, id: i64, params: &DebtUpdateParams) -> Result<Value, ApiError> {
        let id = require_id(id)?;
        params.validate()?;
        self.mutate(
            Method::PUT,
            &format!("/debts/{}", id),
            params,
            &[
                QueryKey::lists(ResourceKind::Debts),
                QueryKey::detail(ResourceKind::Debts, id),
            ],
        )
        .await
    }

    /// Force the next read of one debt to hit the backend
    pub async fn refresh_debt(&self, id: i64) -> Result<usize, ApiError> {
        self.invalidate(QueryKey::detail(ResourceKind::Debts, id)).await
    }

    // Summaries

    pub async fn summaries(
        &self,
        filters: &SummaryFilters,
    ) -> Result<Page<FinancialSummary>, ApiError> {
        self.list(ResourceKind::Summaries, "/summaries", to_params(filters)).await
    }

    pub async fn current_summary(&self) -> Result<FinancialSummary, ApiError> {
        self.query(
            QueryKey::summary_current(),
            "/summaries/current".to_string(),
            Params::new(),
            ALWAYS_STALE,
        )
        .await
    }

    pub async fn summary_statistics(
        &self,
        period: SummaryPeriod,
    ) -> Result<SummaryStatistics, ApiError> {
        let mut params = Params::new();
        params.insert("period".to_string(), period.as_str().to_string());
        self.query(
            QueryKey::summary_statistics(period),
            "/summaries/statistics".to_string(),
            params,
            ALWAYS_STALE,
        )
        .await
    }

    // Predictions

    pub async fn train_model(&self) -> Result<TrainResponse, ApiError> {
        self.mutate(Method::POST, "/train", &serde_json::json!({}), &[]).await
    }

    /// The backend serves predictions from `POST /expenses` with an income body
    pub async fn predict_expenses(
        &self,
        params: &PredictionParams,
    ) -> Result<ExpensePrediction, ApiError> {
        self.mutate(Method::POST, "/expenses", params, &[]).await
    }

    pub async fn insights(&self) -> Result<InsightResponse, ApiError> {
        self.query(QueryKey::insights(), "/insights".to_string(), Params::new(), ALWAYS_STALE)
            .await
    }
}
