use axum::{Json, extract::State};
use chrono::Utc;

use aj_common::api::match_request::MatchJobsRequest;
use aj_common::api::match_response::MatchJobsResponse;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Scores the submitted postings against the profile and returns them ranked.
pub async fn match_jobs(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<MatchJobsRequest>,
) -> Result<Json<MatchJobsResponse>, ApiError> {
    let max_postings = state.config.max_postings;
    if request.postings.len() > max_postings {
        return Err(ApiError::BadRequest(format!(
            "too many postings: {} > {max_postings}",
            request.postings.len()
        )));
    }
    if let Some(min_score) = request.min_score {
        if !(0.0..=1.0).contains(&min_score) {
            return Err(ApiError::BadRequest(
                "min_score must be between 0 and 1".into(),
            ));
        }
    }

    let filter = request.relevance_filter();
    let include_breakdown = request.include_breakdown;
    let MatchJobsRequest {
        profile,
        postings,
        preferences,
        ..
    } = request;

    // CPU-bound; keep it off the async workers
    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.run(&profile, postings, &preferences))
        .await
        .map_err(|err| ApiError::Internal(format!("matching task failed: {err}")))?;

    let scored = report.matches.len();
    let report = report.filtered(&filter);

    Ok(Json(MatchJobsResponse::from_report(
        report,
        scored,
        include_breakdown,
        Utc::now(),
    )))
}
