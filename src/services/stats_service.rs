use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::submission::{Submission, Verdict};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionStats {
    pub attempts: usize,
    pub passes: usize,
    /// Every non-passing attempt, errors included.
    pub fails: usize,
    pub errors: usize,
    pub average_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub user: String,
    pub pass_count: usize,
}

pub struct StatsService;

impl StatsService {
    pub fn stats(submissions: &[Submission], q_id: &str) -> QuestionStats {
        let mut stats = QuestionStats::default();
        let mut total_time_ms = 0.0;

        for s in submissions.iter().filter(|s| s.q_id == q_id) {
            stats.attempts += 1;
            total_time_ms += s.time_ms;
            match s.result {
                Verdict::Pass => stats.passes += 1,
                Verdict::Fail => stats.fails += 1,
                Verdict::Error => {
                    stats.fails += 1;
                    stats.errors += 1;
                }
            }
        }

        if stats.attempts > 0 {
            stats.average_time_ms = total_time_ms / stats.attempts as f64;
        }
        stats
    }

    pub fn leaderboard(submissions: &[Submission], top: Option<usize>) -> Vec<LeaderboardEntry> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for s in submissions {
            let count = counts.entry(s.user.as_str()).or_insert(0);
            if s.result.is_pass() {
                *count += 1;
            }
        }

        let mut entries: Vec<LeaderboardEntry> = counts
            .into_iter()
            .map(|(user, pass_count)| LeaderboardEntry {
                user: user.to_string(),
                pass_count,
            })
            .collect();
        entries.sort_by(|a, b| match b.pass_count.cmp(&a.pass_count) {
            Ordering::Equal => a.user.cmp(&b.user),
            other => other,
        });

        if let Some(top) = top {
            entries.truncate(top);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::Language;
    use chrono::Utc;
    use uuid::Uuid;

    fn sub(user: &str, q_id: &str, result: Verdict, time_ms: f64) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            user: user.to_string(),
            q_id: q_id.to_string(),
            language: Language::Output,
            answer: String::new(),
            timestamp: Utc::now(),
            result,
            passed_count: 0,
            total: 1,
            time_ms,
        }
    }

    fn passes(user: &str, n: usize) -> Vec<Submission> {
        (0..n).map(|_| sub(user, "q1", Verdict::Pass, 1.0)).collect()
    }

    #[test]
    fn leaderboard_breaks_ties_by_name() {
        let mut history = passes("carol", 2);
        history.extend(passes("bob", 3));
        history.extend(passes("alice", 2));

        let board = StatsService::leaderboard(&history, None);
        let flat: Vec<(&str, usize)> = board
            .iter()
            .map(|e| (e.user.as_str(), e.pass_count))
            .collect();
        assert_eq!(flat, vec![("bob", 3), ("alice", 2), ("carol", 2)]);
    }

    #[test]
    fn leaderboard_lists_users_without_passes_last() {
        let mut history = passes("zed", 1);
        history.push(sub("amy", "q1", Verdict::Fail, 1.0));
        history.push(sub("amy", "q2", Verdict::Error, 1.0));

        let board = StatsService::leaderboard(&history, None);
        assert_eq!(board[0].user, "zed");
        assert_eq!(board[1], LeaderboardEntry { user: "amy".to_string(), pass_count: 0 });
    }

    #[test]
    fn leaderboard_honours_top() {
        let mut history = passes("a", 3);
        history.extend(passes("b", 2));
        history.extend(passes("c", 1));
        let board = StatsService::leaderboard(&history, Some(2));
        assert_eq!(board.len(), 2);
        assert_eq!(board[1].user, "b");
    }

    #[test]
    fn stats_only_count_the_requested_question() {
        let history = vec![
            sub("a", "q1", Verdict::Pass, 10.0),
            sub("b", "q1", Verdict::Fail, 20.0),
            sub("c", "q1", Verdict::Error, 30.0),
            sub("d", "q2", Verdict::Pass, 99.0),
        ];
        let stats = StatsService::stats(&history, "q1");
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.fails, 2);
        assert_eq!(stats.errors, 1);
        assert!((stats.average_time_ms - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_for_untouched_question_are_zero() {
        assert_eq!(StatsService::stats(&[], "q1"), QuestionStats::default());
    }
}
