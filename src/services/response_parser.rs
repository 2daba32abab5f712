//! 模型回复解析 - 业务能力层
//!
//! 把模型返回的半结构化文本解析成题目列表。模型输出经常偏离约定格式，
//! 这里是"尽力识别"而不是严格语法解析：逐行分类，认不出的行直接忽略或并入题干，
//! 从不返回错误。
//!
//! ## 状态机
//!
//! ```text
//! AwaitingQuestion ──题目行──▶ CollectingChoices ──题目行──▶ CollectingChoices (上一题收尾)
//!        │                          │
//!     其他行忽略          选项行 / 单行多选项 / 答案行 / 解析行 / 续行
//! ```
//!
//! 每一行按固定优先级尝试分类：题目行 → 单行多选项 → 选项行 → 答案行 → 解析行 → 其他。
//! 单行多选项必须排在单个选项之前，否则 `A) Paris B) London` 会被当成一个选项。

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{ChoiceLetter, ParsedChoice, ParsedQuestion};

/// `**1. What is the sun?**`、`**Question 2:** Why ...`、`1. **What is the sun?**`
///
/// 编号之后整行都算题干，其中的 `**` 由 `strip_emphasis` 去掉
static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\*\*\s*(?:question\s*)?\d+\s*[.):]|(?:question\s*)?\d+\s*[.):]\s*\*\*)\s*(.*)$",
    )
    .expect("题目行正则无效")
});

/// `A) Paris`、`(B) London`、`- C) Rome`、`**D)** Berlin`
static CHOICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]\s+)?\**\(?([A-D])\)\**\s*(.+?)\s*$").expect("选项行正则无效")
});

/// 一行内的选项标记，用于 `A) Paris B) London C) Rome D) Berlin`、`**A)** Paris **B)** London`
static CHOICE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)\**\(?([A-D])\)\**").expect("选项标记正则无效")
});

/// 列表符号前缀 `- `、`* `、`• `
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s+").expect("列表符号正则无效"));

/// `Answer: B`、`**Answer:** B`、`*Correct answer: (C)*`
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[*_\s]*(?:correct\s+)?answer[*_\s]*[:：][*_\s]*\(?([a-z])\b")
        .expect("答案行正则无效")
});

/// `Explanation: ...`
static EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[*_\s]*explanation[*_\s]*[:：][*_\s]*(.+?)[*_\s]*$").expect("解析行正则无效")
});

/// 单行的分类结果
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    QuestionStart(String),
    MultiChoice(Vec<(ChoiceLetter, String)>),
    Choice(ChoiceLetter, String),
    /// 答案字母原样保留，A-D 以外的字母在应用时被忽略
    Answer(char),
    Explanation(String),
    Other(&'a str),
}

/// 解析器状态
enum ParseState {
    AwaitingQuestion,
    CollectingChoices(ParsedQuestion),
}

/// 模型回复解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析模型回复
    ///
    /// 输出顺序与题目在文本中出现的顺序一致，不去重、不重排。
    /// 一道题都识别不出时返回空列表。
    pub fn parse(&self, raw_text: &str) -> Vec<ParsedQuestion> {
        let mut questions = Vec::new();
        let mut state = ParseState::AwaitingQuestion;

        for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            state = match (state, classify_line(line)) {
                (ParseState::AwaitingQuestion, LineKind::QuestionStart(text)) => {
                    ParseState::CollectingChoices(ParsedQuestion::new(text))
                }
                (ParseState::AwaitingQuestion, _) => {
                    debug!("题目开始前的内容，忽略: {}", line);
                    ParseState::AwaitingQuestion
                }
                (ParseState::CollectingChoices(current), LineKind::QuestionStart(text)) => {
                    questions.push(current);
                    ParseState::CollectingChoices(ParsedQuestion::new(text))
                }
                (ParseState::CollectingChoices(mut current), kind) => {
                    apply_line(&mut current, kind);
                    ParseState::CollectingChoices(current)
                }
            };
        }

        if let ParseState::CollectingChoices(current) = state {
            questions.push(current);
        }

        debug!("解析完成，共识别 {} 道题目", questions.len());
        questions
    }
}

/// 按固定优先级对一行进行分类
fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(caps) = QUESTION_RE.captures(line) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        return LineKind::QuestionStart(strip_emphasis(rest));
    }

    if let Some(choices) = split_multi_choice(line) {
        return LineKind::MultiChoice(choices);
    }

    if let Some(caps) = CHOICE_RE.captures(line) {
        let letter = caps
            .get(1)
            .and_then(|m| m.as_str().chars().next())
            .and_then(ChoiceLetter::from_char);
        if let (Some(letter), Some(text)) = (letter, caps.get(2)) {
            return LineKind::Choice(letter, text.as_str().to_string());
        }
    }

    if let Some(letter) = ANSWER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
    {
        return LineKind::Answer(letter.to_ascii_uppercase());
    }

    if let Some(text) = EXPLANATION_RE.captures(line).and_then(|caps| caps.get(1)) {
        return LineKind::Explanation(text.as_str().to_string());
    }

    LineKind::Other(line)
}

/// 拆分挤在一行里的多个选项
///
/// 去掉列表符号后行首必须是选项标记，且至少两个标记、字母严格递增，否则不算多选项行
fn split_multi_choice(line: &str) -> Option<Vec<(ChoiceLetter, String)>> {
    let body = BULLET_RE.find(line).map_or(line, |m| &line[m.end()..]);

    let markers: Vec<(ChoiceLetter, usize, usize)> = CHOICE_MARKER_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let letter = caps.get(1)?.as_str().chars().next()?;
            Some((ChoiceLetter::from_char(letter)?, whole.start(), whole.end()))
        })
        .collect();

    if markers.len() < 2 || markers[0].1 != 0 {
        return None;
    }
    if !markers.windows(2).all(|w| w[0].0 < w[1].0) {
        return None;
    }

    let choices: Vec<(ChoiceLetter, String)> = markers
        .iter()
        .enumerate()
        .map(|(i, &(letter, _, text_start))| {
            let text_end = markers.get(i + 1).map_or(body.len(), |next| next.1);
            let text = body[text_start..text_end]
                .trim()
                .trim_end_matches([',', ';'])
                .trim_end();
            (letter, text.to_string())
        })
        .collect();

    // 任何一段为空说明不是真正的选项列表
    if choices.iter().any(|(_, text)| text.is_empty()) {
        return None;
    }

    Some(choices)
}

/// 在"收集选项"状态下应用一行
fn apply_line(question: &mut ParsedQuestion, kind: LineKind<'_>) {
    match kind {
        LineKind::Choice(letter, text) => push_choice(question, letter, text),
        LineKind::MultiChoice(choices) => {
            for (letter, text) in choices {
                push_choice(question, letter, text);
            }
        }
        LineKind::Answer(raw_letter) => mark_correct(question, raw_letter),
        LineKind::Explanation(text) => {
            question.explanation = Some(match question.explanation.take() {
                Some(existing) => join_text(&existing, &text),
                None => text,
            });
        }
        LineKind::Other(line) => {
            if question.choices.is_empty() {
                // 题干被模型折成多行
                question.question_text = join_text(&question.question_text, line);
            } else {
                debug!("选项之后的多余内容，忽略: {}", line);
            }
        }
        LineKind::QuestionStart(_) => {}
    }
}

fn push_choice(question: &mut ParsedQuestion, letter: ChoiceLetter, text: String) {
    if question.has_choice(letter) {
        debug!("重复的选项 {}，忽略: {}", letter, text);
        return;
    }
    question.choices.push(ParsedChoice::new(letter, text));
}

/// 把已收集到的同字母选项标记为正确；找不到则静默丢弃
fn mark_correct(question: &mut ParsedQuestion, raw_letter: char) {
    let Some(letter) = ChoiceLetter::from_char(raw_letter).filter(|l| question.has_choice(*l))
    else {
        debug!("答案 {} 没有对应的选项，忽略", raw_letter);
        return;
    };

    for choice in question.choices.iter_mut() {
        choice.is_correct = choice.letter == letter;
    }
    question.correct_choice_letter = Some(letter);
}

/// 去掉加粗标记并合并多余空白
fn strip_emphasis(text: &str) -> String {
    text.replace("**", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 用空格拼接两段文本，忽略空段
fn join_text(head: &str, tail: &str) -> String {
    match (head.trim(), tail.trim()) {
        ("", t) => t.to_string(),
        (h, "") => h.to_string(),
        (h, t) => format!("{} {}", h, t),
    }
}
