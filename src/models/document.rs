use serde::{Deserialize, Serialize};

use super::question::ChoiceLetter;

/// 文档主键
pub type DocumentId = i64;

/// 上传的阅读材料
///
/// `.toml` 文件直接反序列化为该结构；`.txt` / `.md` 文件以文件名作为标题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageDocument {
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_category: Option<String>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl PassageDocument {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            grade_level: None,
            skill_category: None,
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}

/// 已入库的题目
#[derive(Debug, Clone, Serialize)]
pub struct PersistedQuestion {
    pub id: i64,
    pub document_id: DocumentId,
    pub question_text: String,
    pub explanation: Option<String>,
    pub created_at: String,
    pub answers: Vec<PersistedAnswer>,
}

impl PersistedQuestion {
    /// 正确答案（若恰好有一个）
    pub fn correct_answer(&self) -> Option<&PersistedAnswer> {
        let mut correct = self.answers.iter().filter(|a| a.is_correct);
        match (correct.next(), correct.next()) {
            (Some(answer), None) => Some(answer),
            _ => None,
        }
    }
}

/// 已入库的选项
#[derive(Debug, Clone, Serialize)]
pub struct PersistedAnswer {
    pub id: i64,
    pub question_id: i64,
    pub choice_letter: ChoiceLetter,
    pub choice_text: String,
    pub is_correct: bool,
}
