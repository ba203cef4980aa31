use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{validate_not_blank, Difficulty, Question};
use crate::models::submission::{Language, Verdict};
use crate::services::grading_service::{CaseResult, Evaluation};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TodayResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub difficulty: Difficulty,
    pub date: NaiveDate,
}

impl TodayResponse {
    pub fn new(question: Question, date: NaiveDate) -> Self {
        Self {
            id: question.id,
            title: question.title,
            body: question.body,
            difficulty: question.difficulty,
            date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicTestCase {
    pub input: Option<String>,
}

/// A question as shown to players. Answers are only present when revealed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionView {
    pub id: String,
    pub title: String,
    pub body: String,
    pub difficulty: Difficulty,
    pub hints: Vec<String>,
    pub test_cases: Vec<PublicTestCase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_solution: Option<String>,
}

impl QuestionView {
    pub fn from_question(question: Question, reveal: bool) -> Self {
        Self {
            id: question.id,
            title: question.title,
            body: question.body,
            difficulty: question.difficulty,
            hints: question.hints,
            test_cases: question
                .test_cases
                .into_iter()
                .map(|tc| PublicTestCase { input: tc.input })
                .collect(),
            sample_input: question.sample_input,
            sample_output: question.sample_output,
            expected_output: reveal.then_some(question.expected_output),
            expected_solution: question.expected_solution.filter(|_| reveal),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevealQuery {
    /// Include the expected output and reference solution.
    pub reveal: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Maximum number of entries to return.
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitRequest {
    #[validate(length(min = 1, max = 64, message = "user must be 1-64 characters"))]
    pub user: String,
    #[validate(length(min = 1, message = "q_id must not be empty"))]
    pub q_id: String,
    #[serde(default)]
    pub language: Language,
    #[validate(
        length(min = 1, max = 65536, message = "answer must be 1-65536 characters"),
        custom(function = "validate_not_blank")
    )]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub submission_id: Uuid,
    pub result: Verdict,
    pub passed_count: usize,
    pub total: usize,
    pub results: Vec<CaseResult>,
    pub time_ms: f64,
    pub message: String,
}

impl SubmitResponse {
    pub fn new(submission_id: Uuid, evaluation: Evaluation) -> Self {
        let message = match evaluation.result {
            Verdict::Pass => "Correct answer",
            Verdict::Fail => "Wrong answer",
            Verdict::Error => "Submission failed to run",
        }
        .to_string();
        Self {
            submission_id,
            result: evaluation.result,
            passed_count: evaluation.passed_count,
            total: evaluation.total,
            results: evaluation.cases,
            time_ms: evaluation.time_ms,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionCreated {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::sample_questions;

    #[test]
    fn hidden_view_leaks_no_answers() {
        let view = QuestionView::from_question(sample_questions().remove(0), false);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("expected_output").is_none());
        assert!(json.get("expected_solution").is_none());
        assert!(json["test_cases"][0].get("expected_output").is_none());
        assert_eq!(json["test_cases"][0]["input"], "2 3");
    }

    #[test]
    fn revealed_view_includes_answers() {
        let view = QuestionView::from_question(sample_questions().remove(0), true);
        assert_eq!(view.expected_output.as_deref(), Some("5"));
        assert!(view.expected_solution.is_some());
    }

    #[test]
    fn language_defaults_to_output() {
        let req: SubmitRequest =
            serde_json::from_str(r#"{"user":"a","q_id":"q1","answer":"5"}"#).unwrap();
        assert_eq!(req.language, Language::Output);
    }

    #[test]
    fn whitespace_only_answer_is_rejected() {
        let req = SubmitRequest {
            user: "a".to_string(),
            q_id: "q1".to_string(),
            language: Language::Output,
            answer: " \t\n ".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
