//! Exercise and question-answering backend.

use crate::error::BackendError;
use crate::http::JsonClient;
use async_trait::async_trait;
use graphdesk_core::{NodeId, PropertyValue};
use graphdesk_graph::EvidenceRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseOption {
    pub key: String,
    pub text: String,
}

/// Splits `"A. first;B. second"` into keyed options. Entries without a
/// `X.` prefix are keyed by position.
pub fn parse_options(raw: &str) -> Vec<ExerciseOption> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| {
            let mut chars = part.chars();
            let prefix = match (chars.next(), chars.next()) {
                (Some(letter), Some('.')) if letter.is_ascii_alphabetic() => Some(letter),
                _ => None,
            };
            match prefix {
                Some(letter) => {
                    let text = part[2..].trim();
                    ExerciseOption {
                        key: letter.to_ascii_uppercase().to_string(),
                        text: if text.is_empty() { part.to_string() } else { text.to_string() },
                    }
                }
                None => ExerciseOption {
                    key: char::from(b'A' + (i % 26) as u8).to_string(),
                    text: part.to_string(),
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: PropertyValue,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub options: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl Question {
    pub fn parsed_options(&self) -> Vec<ExerciseOption> {
        parse_options(&self.options)
    }

    pub fn answer_key(&self) -> String {
        self.answer.trim().to_uppercase()
    }

    pub fn is_correct(&self, selected: &str) -> bool {
        let selected = selected.trim().to_uppercase();
        !selected.is_empty() && selected == self.answer_key()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub module_name: String,
    pub kind: Option<String>,
    pub difficulty: Option<String>,
    /// Question the caller is moving away from; the backend skips it.
    pub exclude_id: Option<String>,
}

impl QuestionRequest {
    pub fn for_module(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub mastered: u64,
    #[serde(default)]
    pending: Option<u64>,
}

impl QuestionStats {
    pub fn pending(&self) -> u64 {
        self.pending
            .unwrap_or_else(|| self.total.saturating_sub(self.mastered))
    }
}

#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Free-text answer grounded in `evidence`.
    async fn ask(&self, question: &str, evidence: &[EvidenceRecord]) -> Result<String, BackendError>;

    async fn next_question(&self, request: &QuestionRequest) -> Result<Option<Question>, BackendError>;

    async fn submit_answer(&self, question_id: &str, is_correct: bool) -> Result<(), BackendError>;

    async fn question_stats(&self, module_name: &str) -> Result<QuestionStats, BackendError>;

    /// Records mastery of `node`; returns the nodes that became reachable.
    async fn zpd_update(&self, node: &NodeId) -> Result<Vec<NodeId>, BackendError>;
}

#[derive(Serialize)]
struct AskBody<'a> {
    question: &'a str,
    evidence: &'a [EvidenceRecord],
}

#[derive(Deserialize)]
struct AskReply {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct QuestionReply {
    #[serde(default)]
    question: Option<Question>,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    question_id: &'a str,
    is_correct: bool,
}

#[derive(Serialize)]
struct ZpdBody<'a> {
    node_id: &'a str,
}

#[derive(Deserialize)]
struct ZpdReply {
    #[serde(default)]
    unlocked: Vec<PropertyValue>,
}

pub struct HttpTutorBackend {
    http: JsonClient,
}

impl HttpTutorBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            http: JsonClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl TutorBackend for HttpTutorBackend {
    async fn ask(&self, question: &str, evidence: &[EvidenceRecord]) -> Result<String, BackendError> {
        let reply: AskReply = self.http.post("/llm", &AskBody { question, evidence }).await?;
        match (reply.answer, reply.error) {
            (Some(answer), _) if !answer.trim().is_empty() => Ok(answer),
            (_, Some(error)) => Err(BackendError::invalid_reply("/llm", error)),
            _ => Err(BackendError::invalid_reply("/llm", "empty answer")),
        }
    }

    async fn next_question(&self, request: &QuestionRequest) -> Result<Option<Question>, BackendError> {
        let mut query = vec![
            ("module_name", request.module_name.as_str()),
            ("include_answer", "true"),
        ];
        if let Some(kind) = request.kind.as_deref().filter(|k| !k.is_empty()) {
            query.push(("type", kind));
        }
        if let Some(difficulty) = request.difficulty.as_deref().filter(|d| !d.is_empty()) {
            query.push(("difficulty", difficulty));
        }
        if let Some(exclude) = request.exclude_id.as_deref().filter(|e| !e.is_empty()) {
            query.push(("exclude_id", exclude));
        }
        let reply: QuestionReply = self.http.get("/question", &query).await?;
        Ok(reply.question)
    }

    async fn submit_answer(&self, question_id: &str, is_correct: bool) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .http
            .post(
                "/submit_answer",
                &SubmitBody {
                    question_id,
                    is_correct,
                },
            )
            .await?;
        Ok(())
    }

    async fn question_stats(&self, module_name: &str) -> Result<QuestionStats, BackendError> {
        self.http
            .get("/question_stats", &[("module_name", module_name)])
            .await
    }

    async fn zpd_update(&self, node: &NodeId) -> Result<Vec<NodeId>, BackendError> {
        let reply: ZpdReply = self
            .http
            .post(
                "/zpd_update",
                &ZpdBody {
                    node_id: node.as_str(),
                },
            )
            .await?;
        Ok(reply
            .unlocked
            .iter()
            .filter_map(PropertyValue::as_text)
            .map(NodeId)
            .collect())
    }
}
