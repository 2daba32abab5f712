//! 题目存储 - 业务能力层
//!
//! 把一次生成得到的题目和选项写入 SQLite。一次生成 = 一个事务：
//! 要么整批题目和选项都写入，要么一行都不写，读取方不会看到半套题。
//! `save` 永远不把存储错误抛给调用方，只返回 `false` 并记录日志，
//! 保证出题失败不会中断文档上传流程。
//!
//! 两个入口写入行为完全相同：
//! - `save`：给上传流程等外部调用方，只关心成功与否
//! - `try_save`：给 `QuizFlow`，需要写入条数和丢弃条数来生成报告，
//!   错误由 `QuizFlow` 记录后同样不再向上抛

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, error, info};

use crate::error::StorageError;
use crate::models::{
    ChoiceLetter, DocumentId, ParsedQuestion, PassageDocument, PersistedAnswer,
    PersistedQuestion,
};
use crate::services::validation::ValidationPolicy;

const MIGRATIONS: [(i64, &str); 1] = [(1, include_str!("../../resources/migrations/001_initial.sql"))];

/// 一次写入的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub questions_written: usize,
    pub answers_written: usize,
    /// 被校验策略丢弃的题目数
    pub dropped: usize,
}

/// 题目存储
pub struct QuizStore {
    conn: Connection,
    policy: ValidationPolicy,
}

impl QuizStore {
    /// 打开（或创建）数据库文件并执行迁移
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn,
            policy: ValidationPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// 新建文档记录（上传流程的一部分），返回文档 ID
    pub fn create_document(&self, document: &PassageDocument) -> Result<DocumentId, StorageError> {
        self.conn.execute(
            "INSERT INTO documents (title, parsed_text, grade_level, skill_category, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                document.title,
                document.text,
                document.grade_level,
                document.skill_category,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("新建文档 #{}: {}", id, document.title);
        Ok(id)
    }

    /// 读取文档正文
    pub fn document_text(&self, document_id: DocumentId) -> Result<Option<String>, StorageError> {
        let text: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT parsed_text FROM documents WHERE id = ?1",
                params![document_id],
                |row| row.get(0),
            )
            .optional()?;
        match text {
            Some(text) => Ok(text),
            None => Err(StorageError::DocumentNotFound { document_id }),
        }
    }

    /// 写入一次生成的全部题目
    ///
    /// 成功返回 true；任何存储错误（包括校验策略拒绝整批）都只记录日志并返回 false
    pub fn save(&self, document_id: DocumentId, questions: &[ParsedQuestion]) -> bool {
        match self.try_save(document_id, questions) {
            Ok(summary) => {
                info!(
                    "💾 文档 #{} 题目已保存: {} 道题, {} 个选项 (丢弃 {} 道)",
                    document_id, summary.questions_written, summary.answers_written, summary.dropped
                );
                true
            }
            Err(e) => {
                error!("❌ 文档 #{} 题目保存失败: {}", document_id, e);
                false
            }
        }
    }

    /// 与 `save` 相同，但返回具体的统计或错误
    ///
    /// `save` 返回 true 当且仅当这里返回 `Ok`
    pub fn try_save(
        &self,
        document_id: DocumentId,
        questions: &[ParsedQuestion],
    ) -> Result<SaveSummary, StorageError> {
        let screened = self.policy.screen(questions)?;

        let tx = self.conn.unchecked_transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM documents WHERE id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(StorageError::DocumentNotFound { document_id });
        }

        let created_at = Utc::now().to_rfc3339();
        let mut summary = SaveSummary {
            dropped: screened.dropped,
            ..Default::default()
        };

        for question in &screened.accepted {
            tx.execute(
                "INSERT INTO quiz_questions (document_id, question_text, explanation, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    document_id,
                    question.question_text,
                    question.explanation,
                    created_at
                ],
            )?;
            let question_id = tx.last_insert_rowid();
            summary.questions_written += 1;

            for choice in &question.choices {
                tx.execute(
                    "INSERT INTO quiz_answers (question_id, choice_letter, choice_text, is_correct)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![question_id, choice.letter, choice.text, choice.is_correct],
                )?;
                summary.answers_written += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }

    /// 读取文档的全部题目（按写入顺序，选项按字母顺序）
    pub fn load_quiz(&self, document_id: DocumentId) -> Result<Vec<PersistedQuestion>, StorageError> {
        let mut question_stmt = self.conn.prepare(
            "SELECT id, document_id, question_text, explanation, created_at
             FROM quiz_questions
             WHERE document_id = ?1
             ORDER BY id ASC",
        )?;
        let mut answer_stmt = self.conn.prepare(
            "SELECT id, question_id, choice_letter, choice_text, is_correct
             FROM quiz_answers
             WHERE question_id = ?1
             ORDER BY choice_letter ASC",
        )?;

        let rows = question_stmt.query_map(params![document_id], |row| {
            Ok(PersistedQuestion {
                id: row.get(0)?,
                document_id: row.get(1)?,
                question_text: row.get(2)?,
                explanation: row.get(3)?,
                created_at: row.get(4)?,
                answers: Vec::new(),
            })
        })?;

        let mut questions = Vec::new();
        for row in rows {
            let mut question = row?;
            let answers = answer_stmt.query_map(params![question.id], |row| {
                Ok(PersistedAnswer {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    choice_letter: row.get(2)?,
                    choice_text: row.get(3)?,
                    is_correct: row.get(4)?,
                })
            })?;
            question.answers = answers.collect::<Result<Vec<_>, _>>()?;
            questions.push(question);
        }
        Ok(questions)
    }

    pub fn count_questions(&self, document_id: DocumentId) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM quiz_questions WHERE document_id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 删除文档，题目和选项随外键级联删除
    pub fn delete_document(&self, document_id: DocumentId) -> Result<(), StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", params![document_id])?;
        if deleted == 0 {
            return Err(StorageError::DocumentNotFound { document_id });
        }
        info!("🗑️ 已删除文档 #{} 及其题目", document_id);
        Ok(())
    }
}

/// 执行尚未应用的迁移
fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current_version = get_current_version(conn);

    for (version, sql) in MIGRATIONS {
        if version > current_version {
            info!("执行数据库迁移 v{}", version);
            conn.execute_batch(sql)
                .map_err(|e| StorageError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }
    Ok(())
}

/// 当前 schema 版本（还没有 schema 时为 0）
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

impl ToSql for ChoiceLetter {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_char().to_string()))
    }
}

impl FromSql for ChoiceLetter {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        let mut chars = text.chars();
        match (chars.next().and_then(ChoiceLetter::from_char), chars.next()) {
            (Some(letter), None) => Ok(letter),
            _ => Err(FromSqlError::Other(
                format!("无效的选项字母: '{}'", text).into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedChoice;
    use crate::services::response_parser::ResponseParser;

    fn store() -> QuizStore {
        QuizStore::open_in_memory().unwrap()
    }

    fn sun_question() -> ParsedQuestion {
        ResponseParser::new()
            .parse("**1. What is the sun?**\nA) A star\nB) A planet\nC) A moon\nD) A comet\nAnswer: A")
            .remove(0)
    }

    fn question_without_answer(text: &str) -> ParsedQuestion {
        let mut q = ParsedQuestion::new(text);
        q.choices.push(ParsedChoice::new(ChoiceLetter::A, "yes"));
        q.choices.push(ParsedChoice::new(ChoiceLetter::B, "no"));
        q
    }

    fn count(store: &QuizStore, table: &str) -> i64 {
        store
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let store = store();
        assert!(run_migrations(&store.conn).is_ok());
        assert_eq!(get_current_version(&store.conn), 1);
    }

    #[test]
    fn test_save_single_question_writes_one_question_and_four_answers() {
        let store = store();
        let doc_id = store
            .create_document(&PassageDocument::new("Sun", "The sun is a star."))
            .unwrap();

        assert!(store.save(doc_id, &[sun_question()]));
        assert_eq!(count(&store, "quiz_questions"), 1);
        assert_eq!(count(&store, "quiz_answers"), 4);

        let quiz = store.load_quiz(doc_id).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].question_text, "What is the sun?");
        let correct = quiz[0].correct_answer().unwrap();
        assert_eq!(correct.choice_letter, ChoiceLetter::A);
        assert_eq!(correct.choice_text, "A star");
    }

    #[test]
    fn test_save_to_missing_document_returns_false_and_writes_nothing() {
        let store = store();

        assert!(!store.save(999, &[sun_question()]));
        assert_eq!(count(&store, "quiz_questions"), 0);
        assert!(matches!(
            store.try_save(999, &[sun_question()]),
            Err(StorageError::DocumentNotFound { document_id: 999 })
        ));
    }

    #[test]
    fn test_failure_mid_batch_rolls_back_everything() {
        let store = store();
        let doc_id = store
            .create_document(&PassageDocument::new("Sun", "The sun is a star."))
            .unwrap();
        // 题目能写入，但选项写入会失败
        store.conn.execute_batch("DROP TABLE quiz_answers;").unwrap();

        assert!(!store.save(doc_id, &[sun_question(), sun_question()]));
        assert_eq!(store.count_questions(doc_id).unwrap(), 0);
    }

    #[test]
    fn test_empty_batch_is_a_successful_noop() {
        let store = store();
        let doc_id = store
            .create_document(&PassageDocument::new("Empty", ""))
            .unwrap();

        let summary = store.try_save(doc_id, &[]).unwrap();
        assert_eq!(summary, SaveSummary::default());
        assert!(store.load_quiz(doc_id).unwrap().is_empty());
    }

    #[test]
    fn test_default_policy_drops_questions_without_single_answer() {
        let store = store();
        let doc_id = store
            .create_document(&PassageDocument::new("Mixed", "text"))
            .unwrap();

        let summary = store
            .try_save(doc_id, &[sun_question(), question_without_answer("unclear")])
            .unwrap();

        assert_eq!(summary.questions_written, 1);
        assert_eq!(summary.answers_written, 4);
        assert_eq!(summary.dropped, 1);
    }

    #[test]
    fn test_reject_policy_writes_nothing() {
        let store = store().with_policy(ValidationPolicy::RejectBatch);
        let doc_id = store
            .create_document(&PassageDocument::new("Mixed", "text"))
            .unwrap();

        assert!(!store.save(doc_id, &[sun_question(), question_without_answer("unclear")]));
        assert_eq!(store.count_questions(doc_id).unwrap(), 0);
    }

    #[test]
    fn test_keep_policy_persists_question_without_correct_answer() {
        let store = store().with_policy(ValidationPolicy::PersistAsIs);
        let doc_id = store
            .create_document(&PassageDocument::new("Mixed", "text"))
            .unwrap();

        assert!(store.save(doc_id, &[question_without_answer("unclear")]));
        let quiz = store.load_quiz(doc_id).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].answers.len(), 2);
        assert!(quiz[0].correct_answer().is_none());
    }

    #[test]
    fn test_each_generation_event_adds_a_disjoint_batch() {
        let store = store();
        let doc_id = store
            .create_document(&PassageDocument::new("Sun", "The sun is a star."))
            .unwrap();

        assert!(store.save(doc_id, &[sun_question()]));
        assert!(store.save(doc_id, &[sun_question()]));

        let quiz = store.load_quiz(doc_id).unwrap();
        assert_eq!(quiz.len(), 2);
        assert_ne!(quiz[0].id, quiz[1].id);
        assert!(quiz.iter().all(|q| q.answers.len() == 4));
    }

    #[test]
    fn test_save_and_try_save_agree_for_every_policy() {
        let batches = [
            vec![sun_question()],
            vec![sun_question(), question_without_answer("unclear")],
            vec![question_without_answer("unclear")],
            Vec::new(),
        ];

        for policy in [
            ValidationPolicy::RejectBatch,
            ValidationPolicy::DropMalformed,
            ValidationPolicy::PersistAsIs,
        ] {
            for batch in &batches {
                let via_save = store().with_policy(policy);
                let via_try = store().with_policy(policy);
                let doc = PassageDocument::new("Sun", "The sun is a star.");
                let save_id = via_save.create_document(&doc).unwrap();
                let try_id = via_try.create_document(&doc).unwrap();

                let saved = via_save.save(save_id, batch);
                let tried = via_try.try_save(try_id, batch);

                assert_eq!(saved, tried.is_ok(), "policy {} batch {}", policy, batch.len());
                assert_eq!(
                    via_save.count_questions(save_id).unwrap(),
                    via_try.count_questions(try_id).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_delete_document_cascades_to_questions_and_answers() {
        let store = store();
        let doc_id = store
            .create_document(&PassageDocument::new("Sun", "The sun is a star."))
            .unwrap();
        assert!(store.save(doc_id, &[sun_question()]));

        store.delete_document(doc_id).unwrap();

        assert_eq!(count(&store, "quiz_questions"), 0);
        assert_eq!(count(&store, "quiz_answers"), 0);
        assert!(matches!(
            store.delete_document(doc_id),
            Err(StorageError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn test_document_metadata_and_text_round_trip() {
        let store = store();
        let mut document = PassageDocument::new("Planets", "Mars is red.");
        document.grade_level = Some("Grade 4".to_string());

        let doc_id = store.create_document(&document).unwrap();
        assert_eq!(store.document_text(doc_id).unwrap().as_deref(), Some("Mars is red."));

        let grade: Option<String> = store
            .conn
            .query_row(
                "SELECT grade_level FROM documents WHERE id = ?1",
                params![doc_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(grade.as_deref(), Some("Grade 4"));
    }

    #[test]
    fn test_file_database_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.db");

        let doc_id = {
            let store = QuizStore::open(&path).unwrap();
            let doc_id = store
                .create_document(&PassageDocument::new("Sun", "The sun is a star."))
                .unwrap();
            assert!(store.save(doc_id, &[sun_question()]));
            doc_id
        };

        let reopened = QuizStore::open(&path).unwrap();
        assert_eq!(reopened.count_questions(doc_id).unwrap(), 1);
    }
}
