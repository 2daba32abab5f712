//! 提示词构建 - 业务能力层
//!
//! 告诉模型严格的输出格式：加粗编号的题干、A) ~ D) 四个选项、一行 `Answer: X`。
//! `ResponseParser` 只认这套格式，所以这里的模板要和解析器一起改。

/// 截取正文前 `max_chars` 个字符（按字符而不是字节，避免切断多字节字符）
pub fn truncate_passage(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// 提示词构建器
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    question_count: usize,
    request_explanations: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(7)
    }
}

impl PromptBuilder {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            request_explanations: false,
        }
    }

    /// 额外要求每题附一行 `Explanation:`
    pub fn with_explanations(mut self, enabled: bool) -> Self {
        self.request_explanations = enabled;
        self
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// 构建提示词
    ///
    /// 相同输入总是得到相同的提示词
    pub fn build(&self, passage_text: &str) -> String {
        let n = self.question_count;

        let (example_tail, explanation_rule) = if self.request_explanations {
            (
                "\nExplanation: One sentence explaining why B is correct, based on the passage.",
                "\n- After the answer line, write one line \"Explanation: ...\" that justifies the answer using the passage.",
            )
        } else {
            ("", "")
        };

        format!(
            r#"Generate exactly {n} multiple-choice reading comprehension questions based on the passage below.

Format every question exactly like this example:

**1. What is the main idea of the passage?**
A) First choice
B) Second choice
C) Third choice
D) Fourth choice
Answer: B{example_tail}

Rules:
- Number the questions from 1 to {n} and wrap each numbered question line in double asterisks.
- Give exactly four choices, each on its own line, labelled A) B) C) D).
- After the four choices, write one line "Answer: X" where X is the letter of the single correct choice.{explanation_rule}
- Every question must be answerable from the passage alone.
- Do not add any introduction, headings or closing remarks.

Passage:
{passage_text}"#
        )
    }
}
