//! Review panel endpoints: one scored review per reviewer per startup.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    actions, resource_types, CreateReviewRequest, Review, ReviewSummary, ReviewWithReviewer,
    StartupStatus, UpdateReviewRequest, User,
};
use crate::AppState;

use super::audit::{audit_log, extract_client_ip};
use super::error::{ApiError, ValidationErrorBuilder};
use super::startups::load_startup;
use super::validation::{validate_score, validate_text, validate_uuid};

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub items: Vec<ReviewWithReviewer>,
    pub summary: ReviewSummary,
}

pub(super) async fn list_for_startup(
    pool: &sqlx::SqlitePool,
    startup_id: &str,
) -> Result<Vec<ReviewWithReviewer>, sqlx::Error> {
    sqlx::query_as::<_, ReviewWithReviewer>(
        r#"
        SELECT r.*, u.name as reviewer_name
        FROM reviews r
        INNER JOIN users u ON r.reviewer_id = u.id
        WHERE r.startup_id = ?
        ORDER BY r.created_at ASC
        "#,
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
}

fn validate_scores(
    team: Option<i64>,
    product: Option<i64>,
    market: Option<i64>,
    feedback: Option<&str>,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(score) = team {
        if let Err(e) = validate_score(score, "team_score") {
            errors.add("team_score", e);
        }
    }
    if let Some(score) = product {
        if let Err(e) = validate_score(score, "product_score") {
            errors.add("product_score", e);
        }
    }
    if let Some(score) = market {
        if let Err(e) = validate_score(score, "market_score") {
            errors.add("market_score", e);
        }
    }
    if let Some(text) = feedback {
        if let Err(e) = validate_text(text, "feedback", 8000) {
            errors.add("feedback", e);
        }
    }

    errors.finish()
}

/// List reviews for a startup with the aggregate summary
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: User,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let _ = load_startup(&state.db, &user, &id).await?;

    let items = list_for_startup(&state.db, &id).await?;
    let summary = ReviewSummary::from_reviews(&items);

    Ok(Json(ReviewListResponse { items, summary }))
}

/// Submit a review. Reviewers and admins only, and only while the startup
/// is under review; a reviewer gets one review per startup.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    if !(roles.is_reviewer || roles.is_admin) {
        return Err(ApiError::forbidden("Only reviewers can score startups"));
    }
    if startup.status_enum() != StartupStatus::UnderReview {
        return Err(ApiError::bad_request(
            "Reviews can only be submitted while a startup is under review",
        ));
    }

    validate_scores(
        Some(req.team_score),
        Some(req.product_score),
        Some(req.market_score),
        Some(&req.feedback),
    )?;

    let review_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO reviews (id, startup_id, reviewer_id, team_score, product_score,
                             market_score, feedback, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&review_id)
    .bind(&id)
    .bind(&user.id)
    .bind(req.team_score)
    .bind(req.product_score)
    .bind(req.market_score)
    .bind(&req.feedback)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("You have already reviewed this startup")
        } else {
            ApiError::from(e)
        }
    })?;

    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
        .bind(&review_id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(
        startup_id = %id,
        reviewer = %user.email,
        score = review.overall_score(),
        "Review submitted"
    );

    audit_log(
        &state,
        actions::REVIEW_CREATE,
        resource_types::REVIEW,
        Some(&review_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Update a review. Its author may revise it while the startup is still
/// under review; admins may edit at any time.
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path((id, review_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    if let Err(e) = validate_uuid(&review_id, "review_id") {
        return Err(ApiError::validation_field("review_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    validate_scores(
        req.team_score,
        req.product_score,
        req.market_score,
        req.feedback.as_deref(),
    )?;

    let review = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE id = ? AND startup_id = ?",
    )
    .bind(&review_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Review not found"))?;

    let is_author = review.reviewer_id == user.id;
    if !is_author && !roles.is_admin {
        return Err(ApiError::forbidden("You can only edit your own review"));
    }
    if is_author
        && !roles.is_admin
        && startup.status_enum() != StartupStatus::UnderReview
    {
        return Err(ApiError::bad_request(
            "Reviews can no longer be revised after a decision",
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE reviews SET
            team_score = COALESCE(?, team_score),
            product_score = COALESCE(?, product_score),
            market_score = COALESCE(?, market_score),
            feedback = COALESCE(?, feedback),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.team_score)
    .bind(req.product_score)
    .bind(req.market_score)
    .bind(&req.feedback)
    .bind(&now)
    .bind(&review_id)
    .execute(&state.db)
    .await?;

    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
        .bind(&review_id)
        .fetch_one(&state.db)
        .await?;

    audit_log(
        &state,
        actions::REVIEW_UPDATE,
        resource_types::REVIEW,
        Some(&review_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(Json(review))
}

/// Delete a review (author or admin)
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path((id, review_id)): Path<(String, String)>,
    headers: HeaderMap,
    user: User,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&review_id, "review_id") {
        return Err(ApiError::validation_field("review_id", e));
    }

    let (startup, roles) = load_startup(&state.db, &user, &id).await?;

    let review = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE id = ? AND startup_id = ?",
    )
    .bind(&review_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Review not found"))?;

    if review.reviewer_id != user.id && !roles.is_admin {
        return Err(ApiError::forbidden("You can only delete your own review"));
    }

    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(&review_id)
        .execute(&state.db)
        .await?;

    audit_log(
        &state,
        actions::REVIEW_DELETE,
        resource_types::REVIEW,
        Some(&review_id),
        Some(&startup.name),
        Some(&user.id),
        extract_client_ip(&headers).as_deref(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
