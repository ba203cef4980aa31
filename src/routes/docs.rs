use axum::Json;
use utoipa::OpenApi;

use crate::dto::qotd_dto::{
    PublicTestCase, QuestionCreated, QuestionView, SubmitRequest, SubmitResponse, TodayResponse,
};
use crate::models::question::{Difficulty, Question, TestCase};
use crate::models::submission::{Language, Verdict};
use crate::services::grading_service::CaseResult;
use crate::services::stats_service::{LeaderboardEntry, QuestionStats};

#[derive(OpenApi)]
#[openapi(
    info(title = "QOTD Backend", description = "Question of the day quiz API"),
    paths(
        crate::routes::health::health,
        crate::routes::qotd::get_today,
        crate::routes::qotd::get_question,
        crate::routes::qotd::submit,
        crate::routes::qotd::get_hints,
        crate::routes::qotd::get_stats,
        crate::routes::qotd::leaderboard,
        crate::routes::qotd::create_question,
    ),
    components(schemas(
        TodayResponse,
        QuestionView,
        PublicTestCase,
        SubmitRequest,
        SubmitResponse,
        QuestionCreated,
        Question,
        TestCase,
        Difficulty,
        Language,
        Verdict,
        CaseResult,
        QuestionStats,
        LeaderboardEntry,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
