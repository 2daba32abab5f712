//! 出题流程 - 流程层
//!
//! 核心职责：定义"一篇文档出一次题"的完整流程
//!
//! 流程顺序：
//! 1. 截取正文前 N 个字符
//! 2. 构建提示词 → 候选模型依次尝试
//! 3. 解析回复
//! 4. 校验 + 一个事务写入
//!
//! 任何一步失败都只体现在返回的 `GenerationReport` 里，不会向上抛错

use std::time::Duration;
use tracing::{error, info, warn};

use crate::clients::{LlmClient, TextGenerator};
use crate::config::Config;
use crate::services::{
    truncate_passage, PromptBuilder, QuestionGenerator, QuizStore, RawModelResponse,
    ResponseParser,
};
use crate::workflow::generation_ctx::GenerationCtx;

/// 一次出题事件的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// 题目已写入
    Saved { questions: usize, dropped: usize },
    /// 模型有回复，但没有可写入的题目
    NoQuestions,
    /// 所有候选模型都失败
    GenerationFailed,
    /// 写入失败，事务已回滚
    SaveFailed,
}

/// 出题报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcome: GenerationOutcome,
    /// 成功回复的模型
    pub model: Option<String>,
    /// 解析出的题目数（校验前）
    pub parsed: usize,
}

impl GenerationReport {
    fn failed() -> Self {
        Self {
            outcome: GenerationOutcome::GenerationFailed,
            model: None,
            parsed: 0,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.outcome, GenerationOutcome::Saved { .. })
    }

    pub fn questions_saved(&self) -> usize {
        match self.outcome {
            GenerationOutcome::Saved { questions, .. } => questions,
            _ => 0,
        }
    }
}

/// 出题流程
///
/// - 编排 截断 → 生成 → 解析 → 写入
/// - 不持有数据库连接，由调用方传入
/// - 只依赖业务能力（services）
pub struct QuizFlow<G: TextGenerator> {
    generator: QuestionGenerator<G>,
    parser: ResponseParser,
    passage_char_limit: usize,
    verbose_logging: bool,
}

impl QuizFlow<LlmClient> {
    /// 按配置创建使用真实 LLM 的出题流程
    pub fn from_config(config: &Config) -> Self {
        let prompt_builder = PromptBuilder::new(config.question_count)
            .with_explanations(config.request_explanations);
        let generator = QuestionGenerator::new(LlmClient::candidates(config), prompt_builder)
            .with_timeout(config.generation_timeout_secs.map(Duration::from_secs));

        Self::new(generator, config.passage_char_limit).with_verbose(config.verbose_logging)
    }
}

impl<G: TextGenerator> QuizFlow<G> {
    pub fn new(generator: QuestionGenerator<G>, passage_char_limit: usize) -> Self {
        Self {
            generator,
            parser: ResponseParser::new(),
            passage_char_limit,
            verbose_logging: false,
        }
    }

    pub fn with_verbose(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub fn generator(&self) -> &QuestionGenerator<G> {
        &self.generator
    }

    /// 为一篇文档执行一次出题
    ///
    /// # 参数
    /// - `store`: 题目存储
    /// - `ctx`: 文档上下文
    /// - `passage_text`: 文档全文（此处负责截断）
    pub async fn run(
        &self,
        store: &QuizStore,
        ctx: &GenerationCtx,
        passage_text: &str,
    ) -> GenerationReport {
        let passage = truncate_passage(passage_text, self.passage_char_limit);
        info!(
            "{} 🧠 开始出题，正文 {} 字符（截取后 {} 字符）",
            ctx,
            passage_text.chars().count(),
            passage.chars().count()
        );

        // ========== 生成 ==========
        let (model, raw_text) = match self.generator.generate(passage).await {
            RawModelResponse::Generated { model, text } => (model, text),
            RawModelResponse::Failed => {
                error!("{} ❌ 出题失败，跳过解析和写入", ctx);
                return GenerationReport::failed();
            }
        };

        // ========== 解析 ==========
        let questions = self.parser.parse(&raw_text);
        info!("{} ✓ 模型 {} 的回复解析出 {} 道题", ctx, model, questions.len());

        if self.verbose_logging {
            self.log_questions(ctx, &questions);
        }

        let parsed = questions.len();
        if questions.is_empty() {
            warn!("{} ⚠️ 回复中没有可识别的题目", ctx);
            return GenerationReport {
                outcome: GenerationOutcome::NoQuestions,
                model: Some(model),
                parsed,
            };
        }

        // ========== 写入 ==========
        // 用 try_save 拿到写入 / 丢弃条数；失败同 save 一样只记录，不向上抛
        let outcome = match store.try_save(ctx.document_id, &questions) {
            Ok(summary) if summary.questions_written == 0 => {
                warn!("{} ⚠️ {} 道题全部未通过校验", ctx, summary.dropped);
                GenerationOutcome::NoQuestions
            }
            Ok(summary) => {
                info!(
                    "{} 💾 已保存 {} 道题 / {} 个选项",
                    ctx, summary.questions_written, summary.answers_written
                );
                GenerationOutcome::Saved {
                    questions: summary.questions_written,
                    dropped: summary.dropped,
                }
            }
            Err(e) => {
                error!("{} ❌ 题目保存失败，已回滚: {}", ctx, e);
                GenerationOutcome::SaveFailed
            }
        };

        GenerationReport {
            outcome,
            model: Some(model),
            parsed,
        }
    }

    // ========== 日志辅助函数 ==========

    fn log_questions(&self, ctx: &GenerationCtx, questions: &[crate::models::ParsedQuestion]) {
        for (i, question) in questions.iter().enumerate() {
            info!("{}   {}. {}", ctx, i + 1, question);
        }
        match serde_json::to_string_pretty(questions) {
            Ok(json) => info!("{} 解析结果:\n{}", ctx, json),
            Err(e) => warn!("{} 解析结果序列化失败: {}", ctx, e),
        }
    }
}
