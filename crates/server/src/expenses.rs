//! Expenses API endpoints

use api_types::expense::{ExpenseListParams, ExpenseNew, ExpenseUpdate, ExpenseView, SummaryRow};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::{EngineError, ErrorKind, FieldError, ValidationErrors};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        user: expense.user_id,
        title: expense.title,
        amount: expense.amount.to_string(),
        date: expense.date,
        category: expense.category.as_str().to_string(),
    }
}

fn draft_from(payload: ExpenseNew) -> engine::ExpenseDraft {
    engine::ExpenseDraft {
        user: payload.user,
        title: payload.title,
        amount: payload.amount,
        date: payload.date,
        category: payload.category,
    }
}

fn patch_from(payload: ExpenseUpdate) -> engine::ExpensePatch {
    engine::ExpensePatch {
        user: payload.user,
        title: payload.title,
        amount: payload.amount,
        date: payload.date,
        category: payload.category,
    }
}

fn required() -> FieldError {
    FieldError::new(ErrorKind::InvalidValue, "this field is required")
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let draft = draft_from(payload);
    let expense = state.engine.create_expense(&draft).await?;
    Ok((StatusCode::CREATED, Json(view(expense))))
}

/// Dispatches `GET /expenses` to either the per-category monthly summary
/// (`summary=1`) or the date-filtered list.
pub async fn index(
    State(state): State<ServerState>,
    Query(params): Query<ExpenseListParams>,
) -> Result<Response, ServerError> {
    let summary_requested = params
        .summary
        .as_deref()
        .is_some_and(|raw| !matches!(raw, "" | "0" | "false"));

    if summary_requested {
        summary(&state, &params).await
    } else {
        list(&state, &params).await
    }
}

async fn summary(
    state: &ServerState,
    params: &ExpenseListParams,
) -> Result<Response, ServerError> {
    let (user_id, month) = match (&params.user_id, &params.month) {
        (Some(user_id), Some(month)) => (user_id, month),
        (user_id, month) => {
            let mut missing = ValidationErrors::default();
            if user_id.is_none() {
                missing.push("user_id", required());
            }
            if month.is_none() {
                missing.push("month", required());
            }
            return Err(EngineError::Validation(missing).into());
        }
    };

    let totals = state.engine.category_summary(user_id, month).await?;
    let rows: Vec<SummaryRow> = totals
        .into_iter()
        .map(|row| SummaryRow {
            category: row.category.as_str().to_string(),
            total_amount: row.total.to_string(),
        })
        .collect();
    Ok(Json(rows).into_response())
}

async fn list(state: &ServerState, params: &ExpenseListParams) -> Result<Response, ServerError> {
    let Some(user_id) = &params.user_id else {
        let mut missing = ValidationErrors::default();
        missing.push("user_id", required());
        return Err(EngineError::Validation(missing).into());
    };

    let expenses = state
        .engine
        .list_expenses_in_range(
            user_id,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
        )
        .await?;
    Ok(Json(expenses.into_iter().map(view).collect::<Vec<_>>()).into_response())
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(id).await?;
    Ok(Json(view(expense)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseView>, ServerError> {
    let draft = draft_from(payload);
    let expense = state.engine.update_expense(id, &draft).await?;
    Ok(Json(view(expense)))
}

pub async fn patch(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let patch = patch_from(payload);
    let expense = state.engine.patch_expense(id, &patch).await?;
    Ok(Json(view(expense)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
