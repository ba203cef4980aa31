use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::database::store::JsonStore;
use crate::dto::qotd_dto::SubmitRequest;
use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::submission::Submission;
use crate::services::grading_service::{Evaluation, GradingService};
use crate::services::selector_service::today_question_id;
use crate::services::stats_service::{LeaderboardEntry, QuestionStats, StatsService};
use crate::utils::time;

#[derive(Clone)]
pub struct QuestionService {
    store: JsonStore,
    grading: GradingService,
}

impl QuestionService {
    pub fn new(store: JsonStore, grading: GradingService) -> Self {
        Self { store, grading }
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub async fn question_for_date(&self, date: NaiveDate) -> Result<Question> {
        let mut questions = self.store.load_questions().await?;
        let id = today_question_id(questions.keys(), date)?;
        questions.remove(&id).ok_or(Error::EmptySet)
    }

    pub async fn get_question(&self, q_id: &str) -> Result<Question> {
        self.store.get_question(q_id).await
    }

    pub async fn hints(&self, q_id: &str) -> Result<Vec<String>> {
        Ok(self.store.get_question(q_id).await?.hints)
    }

    pub async fn create_question(&self, question: Question) -> Result<String> {
        question.validate()?;
        let id = question.id.clone();
        self.store.insert_question(question).await?;
        tracing::info!(q_id = %id, "question created");
        Ok(id)
    }

    /// Evaluates and records a submission. Unknown questions fail before
    /// anything is written.
    pub async fn submit(&self, req: SubmitRequest) -> Result<(Submission, Evaluation)> {
        req.validate()?;
        let question = self.store.get_question(&req.q_id).await?;
        let evaluation = self
            .grading
            .evaluate(&question, req.language, &req.answer)
            .await?;

        let submission = Submission {
            id: Uuid::new_v4(),
            user: req.user,
            q_id: req.q_id,
            language: req.language,
            answer: req.answer,
            timestamp: time::now(),
            result: evaluation.result,
            passed_count: evaluation.passed_count,
            total: evaluation.total,
            time_ms: evaluation.time_ms,
        };
        self.store.append_submission(submission.clone()).await?;

        tracing::info!(
            submission_id = %submission.id,
            user = %submission.user,
            q_id = %submission.q_id,
            language = ?submission.language,
            result = ?submission.result,
            "submission evaluated"
        );
        Ok((submission, evaluation))
    }

    pub async fn stats(&self, q_id: &str) -> Result<QuestionStats> {
        self.store.get_question(q_id).await?;
        let submissions = self.store.list_submissions(Some(q_id)).await?;
        Ok(StatsService::stats(&submissions, q_id))
    }

    pub async fn leaderboard(&self, top: Option<usize>) -> Result<Vec<LeaderboardEntry>> {
        if top == Some(0) {
            return Err(Error::BadRequest("top must be at least 1".to_string()));
        }
        let submissions = self.store.list_submissions(None).await?;
        Ok(StatsService::leaderboard(&submissions, top))
    }
}
