use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::quiz::QuizScore;

pub const ANALYTICS_FILE: &str = "study_analytics.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsData {
    pub total_questions: u64,
    pub topics_studied: Vec<String>,
    pub quiz_scores: Vec<QuizRecord>,
    /// Questions asked per day, keyed `YYYY-MM-DD`
    pub daily_activity: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_questions: u64,
    pub topics_count: usize,
    pub quiz_count: usize,
    pub average_score: f64,
    pub daily_activity: BTreeMap<String, u64>,
}

/// Question and quiz statistics kept across sessions in a JSON file.
#[derive(Debug)]
pub struct StudyAnalytics {
    path: PathBuf,
    data: AnalyticsData,
    /// False when an existing file could not be read; it is never overwritten
    writable: bool,
}

impl StudyAnalytics {
    /// Open the analytics file in `data_dir`. A missing file starts fresh and
    /// a corrupt one is replaced on the next write. A file that exists but
    /// cannot be read is left alone and this session's statistics are kept in
    /// memory only.
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join(ANALYTICS_FILE);
        let (data, writable) = match fs::read(&path) {
            Ok(bytes) => {
                let data = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                    warn!(path = %path.display(), error = %e, "analytics file is corrupt, starting fresh");
                    AnalyticsData::default()
                });
                (data, true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (AnalyticsData::default(), true),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read analytics file, not saving this session");
                (AnalyticsData::default(), false)
            }
        };
        Self {
            path,
            data,
            writable,
        }
    }

    pub fn data(&self) -> &AnalyticsData {
        &self.data
    }

    pub fn log_question(&mut self, topic: &str) -> Result<()> {
        self.data.total_questions += 1;
        let today = Local::now().format("%Y-%m-%d").to_string();
        *self.data.daily_activity.entry(today).or_insert(0) += 1;

        let topic = topic.trim();
        if !topic.is_empty() && !self.data.topics_studied.iter().any(|t| t == topic) {
            self.data.topics_studied.push(topic.to_string());
        }
        self.save()
    }

    pub fn log_quiz_score(&mut self, result: &QuizScore) -> Result<()> {
        self.data.quiz_scores.push(QuizRecord {
            score: result.correct,
            total: result.total,
            percentage: result.percentage,
            date: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        });
        self.save()
    }

    pub fn statistics(&self) -> Statistics {
        let scores = &self.data.quiz_scores;
        let average = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|q| q.percentage).sum::<f64>() / scores.len() as f64
        };

        Statistics {
            total_questions: self.data.total_questions,
            topics_count: self.data.topics_studied.len(),
            quiz_count: scores.len(),
            average_score: (average * 10.0).round() / 10.0,
            daily_activity: self.data.daily_activity.clone(),
        }
    }

    fn save(&self) -> Result<()> {
        if !self.writable {
            bail!("{} could not be read, refusing to overwrite it", self.path.display());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&self.data)?;
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved analytics");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn quiz(correct: usize, total: usize) -> QuizScore {
        QuizScore {
            correct,
            total,
            percentage: correct as f64 / total as f64 * 100.0,
        }
    }

    #[test]
    fn test_logs_persist_across_reopen() {
        let temp = assert_fs::TempDir::new().unwrap();

        let mut analytics = StudyAnalytics::open(temp.path());
        analytics.log_question("General").unwrap();
        analytics.log_question("General").unwrap();
        analytics.log_question("Biology").unwrap();
        analytics.log_quiz_score(&quiz(2, 3)).unwrap();

        temp.child(ANALYTICS_FILE).assert(predicate::path::exists());
        temp.child("study_analytics.json.tmp")
            .assert(predicate::path::missing());

        let reopened = StudyAnalytics::open(temp.path());
        let stats = reopened.statistics();
        assert_eq!(stats.total_questions, 3);
        assert_eq!(stats.topics_count, 2);
        assert_eq!(stats.quiz_count, 1);
        assert_eq!(stats.average_score, 66.7);
        assert_eq!(stats.daily_activity.values().sum::<u64>(), 3);
    }

    #[test]
    fn test_average_of_several_quizzes() {
        let temp = assert_fs::TempDir::new().unwrap();
        let mut analytics = StudyAnalytics::open(temp.path());
        analytics.log_quiz_score(&quiz(1, 2)).unwrap();
        analytics.log_quiz_score(&quiz(1, 1)).unwrap();
        assert_eq!(analytics.statistics().average_score, 75.0);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(ANALYTICS_FILE).write_str("{ not json").unwrap();

        let mut analytics = StudyAnalytics::open(temp.path());
        assert_eq!(analytics.statistics().total_questions, 0);

        analytics.log_question("General").unwrap();
        temp.child(ANALYTICS_FILE)
            .assert(predicate::str::contains("\"total_questions\": 1"));
    }

    #[test]
    fn test_unreadable_file_is_never_overwritten() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(ANALYTICS_FILE).create_dir_all().unwrap();

        let mut analytics = StudyAnalytics::open(temp.path());
        assert_eq!(analytics.statistics().total_questions, 0);

        assert!(analytics.log_question("General").is_err());
        assert_eq!(analytics.statistics().total_questions, 1);
        temp.child(ANALYTICS_FILE).assert(predicate::path::is_dir());
        temp.child("study_analytics.json.tmp")
            .assert(predicate::path::missing());
    }

    #[test]
    fn test_empty_statistics() {
        let temp = assert_fs::TempDir::new().unwrap();
        let stats = StudyAnalytics::open(temp.path()).statistics();
        assert_eq!(stats.average_score, 0.0);
        assert!(stats.daily_activity.is_empty());
    }
}
