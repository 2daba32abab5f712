use serde::{Deserialize, Serialize};
use std::fmt;

/// 选项字母
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChoiceLetter {
    A,
    B,
    C,
    D,
}

impl ChoiceLetter {
    /// 全部选项字母，按顺序
    pub const ALL: [ChoiceLetter; 4] = [
        ChoiceLetter::A,
        ChoiceLetter::B,
        ChoiceLetter::C,
        ChoiceLetter::D,
    ];

    /// 从字符解析（大小写均可），A-D 以外返回 None
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(ChoiceLetter::A),
            'B' => Some(ChoiceLetter::B),
            'C' => Some(ChoiceLetter::C),
            'D' => Some(ChoiceLetter::D),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            ChoiceLetter::A => 'A',
            ChoiceLetter::B => 'B',
            ChoiceLetter::C => 'C',
            ChoiceLetter::D => 'D',
        }
    }
}

impl fmt::Display for ChoiceLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 解析出的单个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedChoice {
    pub letter: ChoiceLetter,
    pub text: String,
    pub is_correct: bool,
}

impl ParsedChoice {
    pub fn new(letter: ChoiceLetter, text: impl Into<String>) -> Self {
        Self {
            letter,
            text: text.into(),
            is_correct: false,
        }
    }
}

/// 解析出的单道题目
///
/// 选项字母互不重复；解析阶段最多一个选项被标记为正确，
/// 即与 `correct_choice_letter` 相同字母的那个
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    pub question_text: String,
    pub choices: Vec<ParsedChoice>,
    pub correct_choice_letter: Option<ChoiceLetter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ParsedQuestion {
    pub fn new(question_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            ..Default::default()
        }
    }

    /// 查找指定字母的选项
    pub fn choice(&self, letter: ChoiceLetter) -> Option<&ParsedChoice> {
        self.choices.iter().find(|c| c.letter == letter)
    }

    pub fn has_choice(&self, letter: ChoiceLetter) -> bool {
        self.choice(letter).is_some()
    }

    /// 被标记为正确的选项数量
    pub fn correct_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_correct).count()
    }

    /// 至少一个选项，且恰好一个正确答案
    pub fn is_well_formed(&self) -> bool {
        !self.choices.is_empty() && self.correct_count() == 1
    }
}

impl fmt::Display for ParsedQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let answer = self
            .correct_choice_letter
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} [{} 个选项, 答案: {}]",
            crate::utils::logging::truncate_text(&self.question_text, 60),
            self.choices.len(),
            answer
        )
    }
}
