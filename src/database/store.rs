use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::question::{sample_questions, Question};
use crate::models::submission::Submission;

pub type QuestionMap = BTreeMap<String, Question>;

/// File-backed store for questions and submission history.
///
/// Nothing is cached: every call reads the file it needs and every write
/// replaces the whole document through a temp file and a rename.
#[derive(Clone, Debug)]
pub struct JsonStore {
    questions_path: PathBuf,
    submissions_path: PathBuf,
    // Serialises read-modify-write cycles issued by this process only.
    write_lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(questions_path: impl Into<PathBuf>, submissions_path: impl Into<PathBuf>) -> Self {
        Self {
            questions_path: questions_path.into(),
            submissions_path: submissions_path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn questions_path(&self) -> &Path {
        &self.questions_path
    }

    pub fn submissions_path(&self) -> &Path {
        &self.submissions_path
    }

    /// Creates missing data files. Existing files are left untouched.
    pub async fn ensure_files(&self, seed: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if !path_exists(&self.questions_path).await? {
            let questions: QuestionMap = if seed {
                sample_questions()
                    .into_iter()
                    .map(|q| (q.id.clone(), q))
                    .collect()
            } else {
                QuestionMap::new()
            };
            tracing::info!(
                path = %self.questions_path.display(),
                count = questions.len(),
                "creating questions file"
            );
            write_json(&self.questions_path, &questions).await?;
        }

        if !path_exists(&self.submissions_path).await? {
            tracing::info!(path = %self.submissions_path.display(), "creating submissions file");
            write_json(&self.submissions_path, &Vec::<Submission>::new()).await?;
        }

        Ok(())
    }

    pub async fn load_questions(&self) -> Result<QuestionMap> {
        read_json(&self.questions_path).await
    }

    pub async fn save_questions(&self, questions: &QuestionMap) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.questions_path, questions).await
    }

    pub async fn get_question(&self, q_id: &str) -> Result<Question> {
        let mut questions = self.load_questions().await?;
        questions
            .remove(q_id)
            .ok_or_else(|| Error::NotFound(format!("Question '{}' not found", q_id)))
    }

    /// Adds a new question. Existing ids are never overwritten.
    pub async fn insert_question(&self, question: Question) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut questions: QuestionMap = read_json(&self.questions_path).await?;
        if questions.contains_key(&question.id) {
            return Err(Error::Conflict(format!(
                "Question '{}' already exists",
                question.id
            )));
        }
        questions.insert(question.id.clone(), question);
        write_json(&self.questions_path, &questions).await
    }

    pub async fn append_submission(&self, submission: Submission) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut submissions: Vec<Submission> = read_json(&self.submissions_path).await?;
        submissions.push(submission);
        write_json(&self.submissions_path, &submissions).await
    }

    pub async fn list_submissions(&self, q_id: Option<&str>) -> Result<Vec<Submission>> {
        let submissions: Vec<Submission> = read_json(&self.submissions_path).await?;
        Ok(match q_id {
            Some(id) => submissions.into_iter().filter(|s| s.q_id == id).collect(),
            None => submissions,
        })
    }
}

pub async fn create_store(config: &Config) -> Result<JsonStore> {
    let store = JsonStore::new(&config.questions_file, &config.submissions_file);
    store.ensure_files(config.seed_sample_questions).await?;
    Ok(store)
}

async fn path_exists(path: &Path) -> Result<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| Error::Storage(format!("cannot stat {}: {}", path.display(), e)))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::Storage(format!("{} does not exist", path.display())),
        _ => Error::Storage(format!("cannot read {}: {}", path.display(), e)),
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::Storage(format!("{} is malformed: {}", path.display(), e)))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
        .await
        .map_err(|e| Error::Storage(format!("cannot write {}: {}", path.display(), e)))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path(path);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "replaced data file");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
