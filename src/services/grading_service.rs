use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::submission::{Language, Verdict};
use crate::services::execution_service::{CodeRunner, ExecutionOutcome};

const MAX_REPORTED_OUTPUT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseResult {
    pub input: Option<String>,
    pub actual_output: Option<String>,
    pub passed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: Verdict,
    pub passed_count: usize,
    pub total: usize,
    pub cases: Vec<CaseResult>,
    pub time_ms: f64,
}

/// Canonical form used for every output comparison: surrounding whitespace
/// trimmed and inner whitespace runs (including newlines) collapsed to one
/// space. Case is preserved.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn outputs_match(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}

#[derive(Clone)]
pub struct GradingService {
    runner: Arc<dyn CodeRunner>,
    timeout: Duration,
}

impl GradingService {
    pub fn new(runner: Arc<dyn CodeRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    pub async fn evaluate(
        &self,
        question: &Question,
        language: Language,
        answer: &str,
    ) -> Result<Evaluation> {
        let started = Instant::now();
        let (result, cases) = match language {
            Language::Output => Self::grade_output(question, answer)?,
            Language::Python => self.grade_python(question, answer).await?,
        };
        let passed_count = cases.iter().filter(|c| c.passed).count();

        Ok(Evaluation {
            result,
            passed_count,
            total: cases.len(),
            cases,
            time_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }

    pub fn grade_output(
        question: &Question,
        answer: &str,
    ) -> Result<(Verdict, Vec<CaseResult>)> {
        // Files edited by hand can still carry a blank answer key.
        if normalize(&question.expected_output).is_empty() {
            return Err(Error::Config(format!(
                "question '{}' has no expected output",
                question.id
            )));
        }
        let passed = outputs_match(&question.expected_output, answer);
        let case = CaseResult {
            input: None,
            actual_output: Some(truncate(answer)),
            passed,
            error: None,
        };
        let verdict = if passed { Verdict::Pass } else { Verdict::Fail };
        Ok((verdict, vec![case]))
    }

    async fn grade_python(
        &self,
        question: &Question,
        code: &str,
    ) -> Result<(Verdict, Vec<CaseResult>)> {
        if question.test_cases.is_empty() {
            return Err(Error::Config(format!(
                "question '{}' has no test cases to run code against",
                question.id
            )));
        }

        let mut cases = Vec::with_capacity(question.test_cases.len());
        let mut errored = false;

        for (idx, tc) in question.test_cases.iter().enumerate() {
            let outcome = self.runner.run(code, tc.stdin(), self.timeout).await?;
            let case = match outcome {
                ExecutionOutcome::TimedOut => {
                    errored = true;
                    CaseResult {
                        input: tc.input.clone(),
                        actual_output: None,
                        passed: false,
                        error: Some(format!(
                            "timed out after {} ms",
                            self.timeout.as_millis()
                        )),
                    }
                }
                ExecutionOutcome::Completed {
                    stdout,
                    stderr,
                    exit_code: Some(0),
                } => CaseResult {
                    input: tc.input.clone(),
                    passed: outputs_match(&tc.expected_output, &stdout),
                    actual_output: Some(truncate(&stdout)),
                    error: (!stderr.trim().is_empty()).then(|| truncate(&stderr)),
                },
                ExecutionOutcome::Completed {
                    stdout,
                    stderr,
                    exit_code,
                } => {
                    errored = true;
                    let status = exit_code
                        .map(|c| format!("exit code {}", c))
                        .unwrap_or_else(|| "terminated by signal".to_string());
                    CaseResult {
                        input: tc.input.clone(),
                        actual_output: Some(truncate(&stdout)),
                        passed: false,
                        error: Some(truncate(&format!("{}: {}", status, stderr.trim()))),
                    }
                }
            };
            tracing::debug!(
                q_id = %question.id,
                case = idx,
                passed = case.passed,
                "python test case finished"
            );
            cases.push(case);
        }

        let verdict = if errored {
            Verdict::Error
        } else if cases.iter().all(|c| c.passed) {
            Verdict::Pass
        } else {
            Verdict::Fail
        };
        Ok((verdict, cases))
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_REPORTED_OUTPUT {
        return text.to_string();
    }
    let mut end = MAX_REPORTED_OUTPUT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{sample_questions, TestCase};
    use crate::services::execution_service::MockCodeRunner;
    use mockall::predicate::eq;

    fn question() -> Question {
        sample_questions().remove(0)
    }

    fn completed(stdout: &str, exit_code: i32) -> ExecutionOutcome {
        ExecutionOutcome::Completed {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(exit_code),
        }
    }

    fn service(runner: MockCodeRunner) -> GradingService {
        GradingService::new(Arc::new(runner), Duration::from_millis(500))
    }

    #[test]
    fn normalize_trims_and_collapses_whitespace() {
        assert_eq!(normalize("  5 "), "5");
        assert_eq!(normalize("a  b\r\n c\t"), "a b c");
        assert_eq!(normalize("Hello"), "Hello");
        assert_ne!(normalize("Hello"), normalize("hello"));
    }

    #[tokio::test]
    async fn output_mode_compares_normalized_answer() {
        let svc = service(MockCodeRunner::new());
        let q = question();

        for (answer, expected) in [("5", Verdict::Pass), (" 5 ", Verdict::Pass), ("6", Verdict::Fail)] {
            let eval = svc.evaluate(&q, Language::Output, answer).await.unwrap();
            assert_eq!(eval.result, expected, "answer {:?}", answer);
            assert_eq!(eval.total, 1);
        }
    }

    #[tokio::test]
    async fn blank_answer_key_never_grades_as_pass() {
        let mut q = question();
        q.expected_output = "   ".to_string();
        let err = service(MockCodeRunner::new())
            .evaluate(&q, Language::Output, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn python_mode_passes_when_every_case_matches() {
        let mut runner = MockCodeRunner::new();
        runner
            .expect_run()
            .with(eq("code"), eq("2 3"), eq(Duration::from_millis(500)))
            .times(1)
            .returning(|_, _, _| Ok(completed("5\n", 0)));
        runner
            .expect_run()
            .with(eq("code"), eq("10 5"), eq(Duration::from_millis(500)))
            .times(1)
            .returning(|_, _, _| Ok(completed("15", 0)));

        let eval = service(runner)
            .evaluate(&question(), Language::Python, "code")
            .await
            .unwrap();
        assert_eq!(eval.result, Verdict::Pass);
        assert_eq!(eval.passed_count, 2);
        assert_eq!(eval.total, 2);
    }

    #[tokio::test]
    async fn python_mode_fails_on_wrong_output() {
        let mut runner = MockCodeRunner::new();
        runner
            .expect_run()
            .times(2)
            .returning(|_, _, _| Ok(completed("5", 0)));

        let eval = service(runner)
            .evaluate(&question(), Language::Python, "code")
            .await
            .unwrap();
        assert_eq!(eval.result, Verdict::Fail);
        assert_eq!(eval.passed_count, 1);
    }

    #[tokio::test]
    async fn timeout_is_an_error_never_a_pass() {
        let mut runner = MockCodeRunner::new();
        runner
            .expect_run()
            .times(2)
            .returning(|_, input, _| {
                if input == "2 3" {
                    Ok(completed("5", 0))
                } else {
                    Ok(ExecutionOutcome::TimedOut)
                }
            });

        let eval = service(runner)
            .evaluate(&question(), Language::Python, "code")
            .await
            .unwrap();
        assert_eq!(eval.result, Verdict::Error);
        assert!(eval.cases[1].error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error_even_with_matching_output() {
        let mut runner = MockCodeRunner::new();
        runner.expect_run().times(2).returning(|_, input, _| {
            if input == "2 3" {
                Ok(completed("5", 0))
            } else {
                Ok(completed("15", 1))
            }
        });

        let eval = service(runner)
            .evaluate(&question(), Language::Python, "code")
            .await
            .unwrap();
        assert_eq!(eval.result, Verdict::Error);
        assert_eq!(eval.passed_count, 1);
    }

    #[tokio::test]
    async fn spawn_failures_propagate() {
        let mut runner = MockCodeRunner::new();
        runner
            .expect_run()
            .returning(|_, _, _| Err(Error::Execution("no interpreter".to_string())));

        let err = service(runner)
            .evaluate(&question(), Language::Python, "code")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }

    #[tokio::test]
    async fn python_mode_requires_test_cases() {
        let mut q = question();
        q.test_cases = Vec::new();
        let err = service(MockCodeRunner::new())
            .evaluate(&q, Language::Python, "code")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn missing_case_input_runs_with_empty_stdin() {
        let mut q = question();
        q.test_cases = vec![TestCase {
            input: None,
            expected_output: "ok".to_string(),
        }];
        let mut runner = MockCodeRunner::new();
        runner
            .expect_run()
            .with(eq("code"), eq(""), eq(Duration::from_millis(500)))
            .returning(|_, _, _| Ok(completed("ok", 0)));

        let eval = service(runner)
            .evaluate(&q, Language::Python, "code")
            .await
            .unwrap();
        assert_eq!(eval.result, Verdict::Pass);
    }

    #[test]
    fn long_output_is_truncated_on_char_boundary() {
        let text = "é".repeat(MAX_REPORTED_OUTPUT);
        let out = truncate(&text);
        assert!(out.ends_with("..."));
        assert!(out.len() <= MAX_REPORTED_OUTPUT + 3);
    }
}
