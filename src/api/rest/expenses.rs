use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::expenses::{
    add_custom_category, category_totals, custom_categories, expenses_by_category,
    total_expenses, total_mileage, YearMonth,
};
use crate::engine::revenue::mileage_deduction;
use crate::error::AppError;
use crate::models::expense::{Expense, ExpenseCategory, MileageEntry};
use crate::reports::tax::{generate_tax_csv, Period};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/summary", get(expense_summary))
        .route(
            "/expenses/categories",
            get(list_categories).post(create_category),
        )
        .route("/expenses/:id", delete(delete_expense))
        .route("/mileage", get(list_mileage).post(create_mileage))
        .route("/exports/tax", get(export_tax))
}

#[derive(Deserialize)]
pub struct CreateExpenseRequest {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub miles: Option<f64>,
    pub notes: Option<String>,
    pub job_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CreateMileageRequest {
    pub date: NaiveDate,
    pub distance: f64,
    pub purpose: Option<String>,
    pub job_id: Option<Uuid>,
    #[serde(default)]
    pub job_related: bool,
}

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RangeQuery {
    fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub month: Option<YearMonth>,
    pub category: Option<ExpenseCategory>,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Serialize)]
pub struct ExpenseSummary {
    pub month: YearMonth,
    pub total_expenses: f64,
    pub total_mileage: f64,
    pub mileage_deduction: f64,
    pub by_category: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryTotal>,
}

#[derive(Serialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub custom: bool,
    pub total: f64,
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Err(AppError::BadRequest("amount must be > 0".to_string()));
    }
    if payload.category.is_custom() {
        add_custom_category(state.store.as_ref(), payload.category.label())?;
    }

    let expense = Expense {
        id: Uuid::new_v4(),
        date: payload.date,
        category: payload.category,
        amount: payload.amount,
        miles: payload.miles,
        notes: payload.notes,
        job_id: payload.job_id,
        created_at: Utc::now(),
    };

    state.expenses.insert(expense.id, expense.clone());
    Ok(Json(expense))
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Json<Vec<Expense>> {
    let mut expenses: Vec<Expense> = state
        .expenses
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|e| range.contains(e.date))
        .collect();
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    Json(expenses)
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .expenses
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("expense {} not found", id)))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn expense_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Json<ExpenseSummary> {
    let month = query
        .month
        .unwrap_or_else(|| YearMonth::of(Utc::now().date_naive()));

    let expenses: Vec<Expense> = state.expenses.iter().map(|e| e.value().clone()).collect();
    let mileage: Vec<MileageEntry> = state.mileage.iter().map(|e| e.value().clone()).collect();
    let miles = total_mileage(&mileage, month);
    let category = query.category.map(|category| CategoryTotal {
        total: expenses_by_category(&expenses, &category, month),
        custom: category.is_custom(),
        category,
    });

    Json(ExpenseSummary {
        month,
        total_expenses: total_expenses(&expenses, month),
        total_mileage: miles,
        mileage_deduction: mileage_deduction(miles),
        by_category: category_totals(&expenses, month),
        category,
    })
}

async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(custom_categories(state.store.as_ref())?))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(add_custom_category(state.store.as_ref(), &payload.name)?))
}

async fn create_mileage(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateMileageRequest>,
) -> Result<Json<MileageEntry>, AppError> {
    if !payload.distance.is_finite() || payload.distance <= 0.0 {
        return Err(AppError::BadRequest("distance must be > 0".to_string()));
    }

    let entry = MileageEntry {
        id: Uuid::new_v4(),
        job_id: payload.job_id,
        distance: payload.distance,
        date: payload.date,
        purpose: payload.purpose,
        job_related: payload.job_related || payload.job_id.is_some(),
        created_at: Utc::now(),
    };

    state.mileage.insert(entry.id, entry.clone());
    Ok(Json(entry))
}

async fn list_mileage(
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Json<Vec<MileageEntry>> {
    let mut entries: Vec<MileageEntry> = state
        .mileage
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|m| range.contains(m.date))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    Json(entries)
}

async fn export_tax(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let expenses: Vec<Expense> = state.expenses.iter().map(|e| e.value().clone()).collect();
    let mileage: Vec<MileageEntry> = state.mileage.iter().map(|e| e.value().clone()).collect();

    let csv = generate_tax_csv(&expenses, &mileage, query.period, Utc::now().date_naive())?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/csv; charset=utf-8")],
        csv,
    )
        .into_response())
}
