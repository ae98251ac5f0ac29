mod audit;
pub mod auth;
mod comments;
mod dashboard;
mod documents;
mod error;
mod financials;
mod milestones;
mod public;
pub mod rate_limit;
mod reviews;
mod startups;
mod tabs;
mod tasks;
mod team;
mod validation;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public, tighter rate limit)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/validate", get(auth::validate))
        .route("/me", get(auth::me))
        .route("/setup-status", get(auth::setup_status))
        .route("/setup", post(auth::setup))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    // Public routes (no session required)
    let public_routes = Router::new()
        .route(
            "/sponsorship-opportunities",
            get(public::list_opportunities),
        )
        .route(
            "/sponsorship-opportunities/:id",
            get(public::get_opportunity),
        )
        .route("/latest-updates", get(public::latest_updates))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_public,
        ));

    // Protected API routes
    let api_routes = Router::new()
        // Startups
        .route("/startups", get(startups::list_startups))
        .route("/startups", post(startups::create_startup))
        .route("/startups/:id", get(startups::get_startup))
        .route("/startups/:id", put(startups::update_startup))
        .route("/startups/:id", delete(startups::delete_startup))
        .route("/startups/:id/status", post(startups::change_status))
        // Tab workflow
        .route("/startups/:id/tabs", get(tabs::list_tabs))
        .route("/startups/:id/tabs/:tab", get(tabs::get_tab_content))
        // Reviews
        .route("/startups/:id/reviews", get(reviews::list_reviews))
        .route("/startups/:id/reviews", post(reviews::create_review))
        .route(
            "/startups/:id/reviews/:review_id",
            put(reviews::update_review),
        )
        .route(
            "/startups/:id/reviews/:review_id",
            delete(reviews::delete_review),
        )
        // Milestones
        .route("/startups/:id/milestones", get(milestones::list_milestones))
        .route(
            "/startups/:id/milestones",
            post(milestones::create_milestone),
        )
        .route(
            "/startups/:id/milestones/:milestone_id",
            put(milestones::update_milestone),
        )
        .route(
            "/startups/:id/milestones/:milestone_id",
            delete(milestones::delete_milestone),
        )
        .route(
            "/startups/:id/milestones/:milestone_id/advance",
            post(milestones::advance_milestone),
        )
        // Tasks
        .route("/startups/:id/tasks", get(tasks::list_tasks))
        .route("/startups/:id/tasks", post(tasks::create_task))
        .route("/startups/:id/tasks/:task_id", put(tasks::update_task))
        .route("/startups/:id/tasks/:task_id", delete(tasks::delete_task))
        // Financials
        .route("/startups/:id/financials", get(financials::get_financials))
        .route(
            "/startups/:id/financials/summary",
            get(financials::get_summary),
        )
        .route(
            "/startups/:id/sponsorships",
            get(financials::list_sponsorships),
        )
        .route(
            "/startups/:id/sponsorships",
            post(financials::create_sponsorship),
        )
        .route(
            "/startups/:id/sponsorships/:sponsorship_id",
            delete(financials::delete_sponsorship),
        )
        .route("/startups/:id/expenses", get(financials::list_expenses))
        .route("/startups/:id/expenses", post(financials::create_expense))
        .route(
            "/startups/:id/expenses/:expense_id",
            put(financials::update_expense),
        )
        .route(
            "/startups/:id/expenses/:expense_id",
            delete(financials::delete_expense),
        )
        // Documents
        .route("/startups/:id/documents", get(documents::list_documents))
        .route("/startups/:id/documents", post(documents::create_document))
        .route(
            "/startups/:id/documents/:document_id",
            delete(documents::delete_document),
        )
        // Team
        .route("/startups/:id/team", get(team::list_members))
        .route("/startups/:id/team", post(team::add_member))
        .route("/startups/:id/team/:member_id", put(team::update_member))
        .route(
            "/startups/:id/team/:member_id",
            delete(team::remove_member),
        )
        // Discussion
        .route("/startups/:id/comments", get(comments::list_comments))
        .route("/startups/:id/comments", post(comments::create_comment))
        .route(
            "/startups/:id/comments/:comment_id",
            put(comments::update_comment),
        )
        .route(
            "/startups/:id/comments/:comment_id",
            delete(comments::delete_comment),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::get_stats))
        // Audit (admin)
        .route("/audit/logs", get(audit::list_logs))
        // Protected by auth
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/public", public_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
