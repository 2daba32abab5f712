//! 题目校验策略
//!
//! 模型给出的 "Answer:" 行可能缺失、格式错误或指向不存在的选项，
//! 导致一道题没有（或有多个）正确答案。入库前按策略处理这类题目。

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{ConfigError, StorageError};
use crate::models::ParsedQuestion;

/// 入库前的题目校验策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ValidationPolicy {
    /// 只要有一道题不合格，整批都不写入
    #[serde(rename = "reject", alias = "reject_batch")]
    RejectBatch,
    /// 丢弃不合格的题目，其余照常写入
    #[default]
    #[serde(rename = "drop", alias = "drop_malformed")]
    DropMalformed,
    /// 原样写入
    #[serde(rename = "keep", alias = "persist_as_is")]
    PersistAsIs,
}

impl FromStr for ValidationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "reject_batch" => Ok(ValidationPolicy::RejectBatch),
            "drop" | "drop_malformed" => Ok(ValidationPolicy::DropMalformed),
            "keep" | "persist_as_is" => Ok(ValidationPolicy::PersistAsIs),
            other => Err(ConfigError::UnknownValidationPolicy {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationPolicy::RejectBatch => "reject",
            ValidationPolicy::DropMalformed => "drop",
            ValidationPolicy::PersistAsIs => "keep",
        };
        write!(f, "{}", name)
    }
}

/// 校验结果：允许写入的题目 + 被丢弃的数量
#[derive(Debug)]
pub struct Screened<'a> {
    pub accepted: Vec<&'a ParsedQuestion>,
    pub dropped: usize,
}

impl ValidationPolicy {
    /// 按策略筛选题目
    pub fn screen<'a>(
        &self,
        questions: &'a [ParsedQuestion],
    ) -> Result<Screened<'a>, StorageError> {
        let malformed = questions.iter().filter(|q| !q.is_well_formed()).count();

        match self {
            ValidationPolicy::PersistAsIs => Ok(Screened {
                accepted: questions.iter().collect(),
                dropped: 0,
            }),
            ValidationPolicy::RejectBatch if malformed > 0 => Err(StorageError::BatchRejected {
                malformed,
                total: questions.len(),
            }),
            ValidationPolicy::RejectBatch => Ok(Screened {
                accepted: questions.iter().collect(),
                dropped: 0,
            }),
            ValidationPolicy::DropMalformed => {
                let accepted: Vec<&ParsedQuestion> = questions
                    .iter()
                    .filter(|q| {
                        let ok = q.is_well_formed();
                        if !ok {
                            warn!(
                                "丢弃不合格题目 (正确答案数: {}, 选项数: {}): {}",
                                q.correct_count(),
                                q.choices.len(),
                                q
                            );
                        }
                        ok
                    })
                    .collect();
                Ok(Screened {
                    accepted,
                    dropped: malformed,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChoiceLetter, ParsedChoice};

    fn question(text: &str, correct: Option<ChoiceLetter>) -> ParsedQuestion {
        let mut q = ParsedQuestion::new(text);
        for letter in ChoiceLetter::ALL {
            let mut choice = ParsedChoice::new(letter, format!("choice {}", letter));
            choice.is_correct = Some(letter) == correct;
            q.choices.push(choice);
        }
        q.correct_choice_letter = correct;
        q
    }

    #[test]
    fn test_parse_policy_names() {
        assert_eq!("reject".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::RejectBatch);
        assert_eq!(" DROP ".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::DropMalformed);
        assert_eq!("persist_as_is".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::PersistAsIs);
        assert!("sometimes".parse::<ValidationPolicy>().is_err());
    }

    #[test]
    fn test_drop_malformed_keeps_order_of_good_questions() {
        let questions = vec![
            question("q1", Some(ChoiceLetter::A)),
            question("q2", None),
            question("q3", Some(ChoiceLetter::C)),
        ];
        let screened = ValidationPolicy::DropMalformed.screen(&questions).unwrap();
        let texts: Vec<&str> = screened.accepted.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "q3"]);
        assert_eq!(screened.dropped, 1);
    }

    #[test]
    fn test_reject_batch_fails_on_any_malformed_question() {
        let questions = vec![question("q1", Some(ChoiceLetter::A)), question("q2", None)];
        let result = ValidationPolicy::RejectBatch.screen(&questions);
        assert!(matches!(
            result,
            Err(StorageError::BatchRejected { malformed: 1, total: 2 })
        ));
    }

    #[test]
    fn test_persist_as_is_accepts_everything() {
        let questions = vec![question("q1", None), ParsedQuestion::new("no choices")];
        let screened = ValidationPolicy::PersistAsIs.screen(&questions).unwrap();
        assert_eq!(screened.accepted.len(), 2);
        assert_eq!(screened.dropped, 0);
    }
}
