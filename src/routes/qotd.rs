use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::qotd_dto::{
        LeaderboardQuery, QuestionCreated, QuestionView, RevealQuery, SubmitRequest,
        SubmitResponse, TodayResponse,
    },
    error::Result,
    extractors::{AppJson, AppQuery},
    models::question::Question,
    services::stats_service::{LeaderboardEntry, QuestionStats},
    utils::time,
    AppState,
};

#[utoipa::path(
    get,
    path = "/today",
    responses(
        (status = 200, description = "Question of the day", body = TodayResponse),
        (status = 404, description = "No questions available")
    )
)]
#[axum::debug_handler]
pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodayResponse>> {
    let today = time::today();
    let question = state.question_service.question_for_date(today).await?;
    Ok(Json(TodayResponse::new(question, today)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Question ID"),
        RevealQuery
    ),
    responses(
        (status = 200, description = "Question without hidden answers", body = QuestionView),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppQuery(query): AppQuery<RevealQuery>,
) -> Result<Json<QuestionView>> {
    let question = state.question_service.get_question(&id).await?;
    Ok(Json(QuestionView::from_question(
        question,
        query.reveal.unwrap_or(false),
    )))
}

#[utoipa::path(
    post,
    path = "/submit",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission evaluated", body = SubmitResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>> {
    let (submission, evaluation) = state.question_service.submit(payload).await?;
    Ok(Json(SubmitResponse::new(submission.id, evaluation)))
}

#[utoipa::path(
    get,
    path = "/hints/{id}",
    params(("id" = String, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Hints in order", body = [String]),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn get_hints(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.question_service.hints(&id).await?))
}

#[utoipa::path(
    get,
    path = "/stats/{id}",
    params(("id" = String, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Attempt statistics", body = QuestionStats),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuestionStats>> {
    Ok(Json(state.question_service.stats(&id).await?))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Users ranked by passing submissions", body = [LeaderboardEntry])
    )
)]
#[axum::debug_handler]
pub async fn leaderboard(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.question_service.leaderboard(query.top).await?))
}

#[utoipa::path(
    post,
    path = "/questions",
    request_body = Question,
    responses(
        (status = 201, description = "Question created", body = QuestionCreated),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Question already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Question>,
) -> Result<impl IntoResponse> {
    let id = state.question_service.create_question(payload).await?;
    Ok((StatusCode::CREATED, Json(QuestionCreated { id })))
}
