use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Top-level paths that a question id would shadow or be shadowed by.
pub const RESERVED_IDS: &[&str] = &[
    "today",
    "leaderboard",
    "submit",
    "questions",
    "hints",
    "stats",
    "health",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Question {
    #[validate(
        length(min = 1, max = 64, message = "id must be 1-64 characters"),
        custom(function = "validate_question_id")
    )]
    pub id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(custom(function = "validate_not_blank"))]
    pub expected_output: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_output: Option<String>,
    /// Reference solution; only returned when explicitly revealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_solution: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestCase {
    #[serde(default)]
    pub input: Option<String>,
    pub expected_output: String,
}

fn validate_question_id(id: &str) -> Result<(), ValidationError> {
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("id_charset");
        err.message = Some("id may only contain letters, digits, '-' and '_'".into());
        return Err(err);
    }
    if RESERVED_IDS.iter().any(|r| r.eq_ignore_ascii_case(id)) {
        let mut err = ValidationError::new("id_reserved");
        err.message = Some(format!("id '{}' is reserved", id).into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must contain non-whitespace text".into());
        return Err(err);
    }
    Ok(())
}

impl TestCase {
    pub fn stdin(&self) -> &str {
        self.input.as_deref().unwrap_or("")
    }
}

/// Questions written to a fresh store when seeding is enabled.
pub fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            id: "q1".to_string(),
            title: "Sum of Two Numbers".to_string(),
            body: "Given two integers separated by space, output their sum.".to_string(),
            difficulty: Difficulty::Easy,
            expected_output: "5".to_string(),
            hints: vec![
                "Split the input by space and convert to integers".to_string(),
                "Return a+b".to_string(),
            ],
            test_cases: vec![
                TestCase {
                    input: Some("2 3".to_string()),
                    expected_output: "5".to_string(),
                },
                TestCase {
                    input: Some("10 5".to_string()),
                    expected_output: "15".to_string(),
                },
            ],
            sample_input: Some("2 3".to_string()),
            sample_output: Some("5".to_string()),
            expected_solution: Some(
                "def solve(input_str):\n    a, b = map(int, input_str.split())\n    return str(a + b)\n"
                    .to_string(),
            ),
        },
        Question {
            id: "q2".to_string(),
            title: "Reverse String".to_string(),
            body: "Given a string, return the string reversed.".to_string(),
            difficulty: Difficulty::Easy,
            expected_output: "olleh".to_string(),
            hints: vec!["Use slicing s[::-1]".to_string()],
            test_cases: vec![
                TestCase {
                    input: Some("hello".to_string()),
                    expected_output: "olleh".to_string(),
                },
                TestCase {
                    input: Some("abc".to_string()),
                    expected_output: "cba".to_string(),
                },
            ],
            sample_input: Some("hello".to_string()),
            sample_output: Some("olleh".to_string()),
            expected_solution: Some("def solve(input_str):\n    return input_str[::-1]\n".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_when_missing() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": "q9",
            "title": "Minimal",
            "expected_output": "1",
            "test_cases": [{"expected_output": "1"}]
        }))
        .unwrap();
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert!(q.hints.is_empty());
        assert_eq!(q.test_cases[0].stdin(), "");
        assert!(q.expected_solution.is_none());
    }

    #[test]
    fn blank_id_fails_validation() {
        let mut q = sample_questions().remove(0);
        q.id = String::new();
        assert!(q.validate().is_err());
    }

    #[test]
    fn ids_are_limited_to_url_safe_characters() {
        let mut q = sample_questions().remove(0);
        for bad in ["a/b", "q 1", "openapi.json", "q?x", "é"] {
            q.id = bad.to_string();
            assert!(q.validate().is_err(), "{:?} should be rejected", bad);
        }
        for good in ["q1", "sum-two_numbers", "Q42"] {
            q.id = good.to_string();
            assert!(q.validate().is_ok(), "{:?} should be accepted", good);
        }
    }

    #[test]
    fn route_names_are_reserved() {
        let mut q = sample_questions().remove(0);
        for reserved in ["leaderboard", "health", "today", "Submit", "questions"] {
            q.id = reserved.to_string();
            assert!(q.validate().is_err(), "{:?} should be reserved", reserved);
        }
    }

    #[test]
    fn expected_output_is_required_and_not_blank() {
        let missing = serde_json::from_value::<Question>(serde_json::json!({
            "id": "q9",
            "title": "T",
            "body": "B"
        }));
        assert!(missing.is_err());

        let mut q = sample_questions().remove(0);
        q.expected_output = "  \n ".to_string();
        assert!(q.validate().is_err());
    }
}
