pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::meetings::handlers as meetings;
use crate::outreach::handlers as outreach;
use crate::prospects::handlers as prospects;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Prospects
        .route(
            "/api/v1/prospects",
            post(prospects::handle_create_prospect).get(prospects::handle_list_prospects),
        )
        .route("/api/v1/prospects/:id", get(prospects::handle_get_prospect))
        .route(
            "/api/v1/prospects/:id/events",
            get(prospects::handle_get_events),
        )
        .route(
            "/api/v1/prospects/:id/next-action",
            get(prospects::handle_next_action),
        )
        .route(
            "/api/v1/prospects/:id/signals",
            post(prospects::handle_signal),
        )
        // Outreach
        .route(
            "/api/v1/outreach/:id/dispatch",
            post(outreach::handle_dispatch),
        )
        .route("/api/v1/outreach/draft", post(outreach::handle_draft))
        .route("/api/v1/outreach/sweep", post(outreach::handle_sweep))
        // Meetings
        .route("/api/v1/meetings", post(meetings::handle_book_meeting))
        .route(
            "/api/v1/meetings/propose/:prospect_id",
            post(meetings::handle_propose_meeting),
        )
        // Analytics
        .route("/api/v1/analytics", get(analytics::handle_analytics))
        .with_state(state)
}
