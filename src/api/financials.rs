//! Financials panel: sponsorships, expenses, and the balance summary.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, resource_types, CreateExpenseRequest, CreateSponsorshipRequest, Expense,
    FinancialSummary, Sponsorship, SponsorshipWithSponsor, StartupStatus, UpdateExpenseRequest,
    User, UserRole,
};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::startups::{financial_summary, load_startup};
use super::validation::{validate_amount, validate_date, validate_name, validate_text, validate_uuid};

#[derive(Debug, Serialize)]
pub struct FinancialsResponse {
    pub sponsorships: Vec<SponsorshipWithSponsor>,
    pub expenses: Vec<Expense>,
    pub summary: FinancialSummary,
}

pub(super) async fn list_sponsorships_for(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<SponsorshipWithSponsor>, sqlx::Error> {
    sqlx::query_as::<_, SponsorshipWithSponsor>(
        r#"
        SELECT s.*, u.name as sponsor_name
        FROM sponsorships s
        INNER JOIN users u ON s.sponsor_id = u.id
        WHERE s.startup_id = ?
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
}

pub(super) async fn list_expenses_for(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<Expense>, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses WHERE startup_id = ? ORDER BY created_at DESC",
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
}

/// Full financials view: both ledgers plus the recomputed balance
pub async fn get_financials(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<FinancialsResponse>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;

    let sponsorships = list_sponsorships_for(&state.db, &id).await?;
    let expenses = list_expenses_for(&state.db, &id).await?;
    let summary = FinancialSummary::from_rows(&sponsorships, &expenses);

    Ok(Json(FinancialsResponse {
        sponsorships,
        expenses,
        summary,
    }))
}

/// List sponsorships only
pub async fn list_sponsorships(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<Vec<SponsorshipWithSponsor>>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;
    let sponsorships = list_sponsorships_for(&state.db, &id).await?;
    Ok(Json(sponsorships))
}

/// Record a sponsorship. Sponsors fund accepted startups themselves;
/// admins may record one on behalf of a sponsor account.
pub async fn create_sponsorship(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateSponsorshipRequest>,
) -> Result<(StatusCode, Json<Sponsorship>), ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    if !(roles.is_sponsor || roles.is_admin) {
        return Err(ApiError::forbidden("Only sponsors can fund startups"));
    }
    if !startup.status_enum().is_portfolio() {
        return Err(ApiError::bad_request(
            "Sponsorships can only be recorded for accepted startups",
        ));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_amount(req.amount) {
        errors.add("amount", e);
    }
    if let Err(e) = validate_text(&req.note, "note", 2000) {
        errors.add("note", e);
    }
    errors.finish()?;

    // Resolve the sponsor account the contribution belongs to
    let sponsor_id = match &req.sponsor_id {
        Some(other) if other != &user.id => {
            if !roles.is_admin {
                return Err(ApiError::forbidden(
                    "Only admins can record sponsorships on behalf of a sponsor",
                ));
            }
            if let Err(e) = validate_uuid(other, "sponsor_id") {
                return Err(ApiError::validation_field("sponsor_id", e));
            }
            let sponsor: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
                .bind(other)
                .fetch_optional(&state.db)
                .await?;
            let sponsor = sponsor
                .ok_or_else(|| ApiError::validation_field("sponsor_id", "Sponsor not found"))?;
            if sponsor.role_enum() != UserRole::Sponsor {
                return Err(ApiError::validation_field(
                    "sponsor_id",
                    "Account is not a sponsor",
                ));
            }
            sponsor.id
        }
        _ => user.id.clone(),
    };

    let sponsorship_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO sponsorships (id, startup_id, sponsor_id, amount, note, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sponsorship_id)
    .bind(&id)
    .bind(&sponsor_id)
    .bind(req.amount)
    .bind(&req.note)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let sponsorship = sqlx::query_as::<_, Sponsorship>("SELECT * FROM sponsorships WHERE id = ?")
        .bind(&sponsorship_id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(
        startup_id = %id,
        amount = req.amount,
        "Sponsorship recorded"
    );

    audit_log(
        &state,
        actions::SPONSORSHIP_CREATE,
        resource_types::SPONSORSHIP,
        Some(&sponsorship_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        Some(serde_json::json!({ "amount": req.amount })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(sponsorship)))
}

/// Delete a sponsorship (admin only; the ledger is otherwise append-only)
pub async fn delete_sponsorship(
    State(state): State<Arc<AppState>>,
    Path((id, sponsorship_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&sponsorship_id, "sponsorship_id") {
        return Err(ApiError::validation_field("sponsorship_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.is_admin {
        return Err(ApiError::forbidden("Only admins can remove sponsorships"));
    }

    let result = sqlx::query("DELETE FROM sponsorships WHERE id = ? AND startup_id = ?")
        .bind(&sponsorship_id)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Sponsorship not found"));
    }

    audit_log(
        &state,
        actions::SPONSORSHIP_DELETE,
        resource_types::SPONSORSHIP,
        Some(&sponsorship_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// List expenses only
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;
    let expenses = list_expenses_for(&state.db, &id).await?;
    Ok(Json(expenses))
}

fn validate_expense_create(req: &CreateExpenseRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_amount(req.amount) {
        errors.add("amount", e);
    }
    if let Err(e) = validate_name(&req.category, "category") {
        errors.add("category", e);
    }
    if let Err(e) = validate_text(&req.note, "note", 2000) {
        errors.add("note", e);
    }
    if let Err(e) = validate_date(&req.incurred_at, "incurred_at") {
        errors.add("incurred_at", e);
    }
    errors.finish()
}

/// Record an expense (founder or admin, accepted startups only)
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can record expenses",
        ));
    }
    if startup.status_enum() != StartupStatus::Accepted {
        return Err(ApiError::bad_request(
            "Expenses can only be recorded while a startup is accepted",
        ));
    }

    validate_expense_create(&req)?;

    let expense_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO expenses (id, startup_id, amount, category, note, incurred_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&expense_id)
    .bind(&id)
    .bind(req.amount)
    .bind(&req.category)
    .bind(&req.note)
    .bind(&req.incurred_at)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let expense = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = ?")
        .bind(&expense_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::EXPENSE_CREATE,
        resource_types::EXPENSE,
        Some(&expense_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        Some(serde_json::json!({ "amount": req.amount, "category": req.category })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// Update an expense (founder or admin)
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path((id, expense_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    if let Err(e) = validate_uuid(&expense_id, "expense_id") {
        return Err(ApiError::validation_field("expense_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can record expenses",
        ));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(amount) = req.amount {
        if let Err(e) = validate_amount(amount) {
            errors.add("amount", e);
        }
    }
    if let Some(ref category) = req.category {
        if let Err(e) = validate_name(category, "category") {
            errors.add("category", e);
        }
    }
    if let Some(ref note) = req.note {
        if let Err(e) = validate_text(note, "note", 2000) {
            errors.add("note", e);
        }
    }
    if let Err(e) = validate_date(&req.incurred_at, "incurred_at") {
        errors.add("incurred_at", e);
    }
    errors.finish()?;

    let existing = sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses WHERE id = ? AND startup_id = ?",
    )
    .bind(&expense_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Expense not found"))?;

    sqlx::query(
        r#"
        UPDATE expenses SET
            amount = COALESCE(?, amount),
            category = COALESCE(?, category),
            note = COALESCE(?, note),
            incurred_at = COALESCE(?, incurred_at)
        WHERE id = ?
        "#,
    )
    .bind(req.amount)
    .bind(&req.category)
    .bind(&req.note)
    .bind(&req.incurred_at)
    .bind(&existing.id)
    .execute(&state.db)
    .await?;

    let expense = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = ?")
        .bind(&expense_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::EXPENSE_UPDATE,
        resource_types::EXPENSE,
        Some(&expense_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(expense))
}

/// Delete an expense (founder or admin)
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path((id, expense_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&expense_id, "expense_id") {
        return Err(ApiError::validation_field("expense_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;
    if !roles.can_manage() {
        return Err(ApiError::forbidden(
            "Only the founder or an admin can record expenses",
        ));
    }

    let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND startup_id = ?")
        .bind(&expense_id)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Expense not found"));
    }

    audit_log(
        &state,
        actions::EXPENSE_DELETE,
        resource_types::EXPENSE,
        Some(&expense_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Balance summary only (used by the overview panel)
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<FinancialSummary>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;
    let summary = financial_summary(&state.db, &id).await?;
    Ok(Json(summary))
}
