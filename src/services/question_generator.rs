//! 出题服务 - 业务能力层
//!
//! 只负责"让模型出题"能力：按优先级依次尝试候选模型，
//! 第一个成功的回复立即返回；全部失败时返回失败标记而不是错误，
//! 调用方据此把本次生成视为"没有题目"，上传流程照常继续。

use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::clients::TextGenerator;
use crate::error::LlmError;
use crate::services::prompt_builder::PromptBuilder;

/// 所有候选模型都失败时的提示文本
pub const GENERATION_FAILED_SENTINEL: &str = "❌ Failed to generate questions.";

/// 模型原始回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawModelResponse {
    /// 某个候选模型成功返回的文本
    Generated { model: String, text: String },
    /// 所有候选模型都失败
    Failed,
}

impl RawModelResponse {
    /// 成功时返回模型文本，失败时返回 None
    pub fn text(&self) -> Option<&str> {
        match self {
            RawModelResponse::Generated { text, .. } => Some(text),
            RawModelResponse::Failed => None,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            RawModelResponse::Generated { model, .. } => Some(model),
            RawModelResponse::Failed => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RawModelResponse::Failed)
    }
}

impl fmt::Display for RawModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawModelResponse::Generated { text, .. } => write!(f, "{}", text),
            RawModelResponse::Failed => write!(f, "{}", GENERATION_FAILED_SENTINEL),
        }
    }
}

/// 出题服务
///
/// 职责：
/// - 构建提示词
/// - 按优先级调用候选模型（主模型 → 备用模型）
/// - 不解析回复，不写数据库
pub struct QuestionGenerator<G: TextGenerator> {
    candidates: Vec<G>,
    prompt_builder: PromptBuilder,
    timeout: Option<Duration>,
}

impl<G: TextGenerator> QuestionGenerator<G> {
    pub fn new(candidates: Vec<G>, prompt_builder: PromptBuilder) -> Self {
        Self {
            candidates,
            prompt_builder,
            timeout: None,
        }
    }

    /// 为每个候选模型的调用设置超时，超时视为该候选失败
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.model_name()).collect()
    }

    /// 为一段（已截断的）正文生成题目文本
    ///
    /// 正文长度由调用方负责截断。同一段正文多次调用可能得到不同的结果。
    pub async fn generate(&self, passage_text: &str) -> RawModelResponse {
        let prompt = self.prompt_builder.build(passage_text);
        let total = self.candidates.len();

        for (index, candidate) in self.candidates.iter().enumerate() {
            let model = candidate.model_name();
            info!("🤖 尝试模型 {}/{}: {}", index + 1, total, model);

            match self.call_candidate(candidate, &prompt).await {
                Ok(text) => {
                    info!(
                        "✓ 模型 {} 返回成功，回复长度: {} 字符",
                        model,
                        text.chars().count()
                    );
                    return RawModelResponse::Generated {
                        model: model.to_string(),
                        text,
                    };
                }
                Err(e) => {
                    warn!("⚠️ 模型 {} 调用失败: {}", model, e);
                }
            }
        }

        error!("❌ 所有候选模型均失败 (共 {} 个)", total);
        RawModelResponse::Failed
    }

    async fn call_candidate(&self, candidate: &G, prompt: &str) -> Result<String, LlmError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, candidate.complete(prompt))
                .await
                .unwrap_or_else(|_| {
                    Err(LlmError::Timeout {
                        model: candidate.model_name().to_string(),
                        secs: limit.as_secs(),
                    })
                }),
            None => candidate.complete(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 固定行为的候选模型
    struct ScriptedGenerator {
        name: String,
        reply: Result<String, String>,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
        last_prompt: std::sync::Mutex<Option<String>>,
    }

    impl ScriptedGenerator {
        fn ok(name: &str, reply: &str) -> Self {
            Self::new(name, Ok(reply.to_string()))
        }

        fn failing(name: &str, reason: &str) -> Self {
            Self::new(name, Err(reason.to_string()))
        }

        fn new(name: &str, reply: Result<String, String>) -> Self {
            Self {
                name: name.to_string(),
                reply,
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
                last_prompt: std::sync::Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn model_name(&self) -> &str {
            &self.name
        }

        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone().map_err(|reason| LlmError::Unavailable {
                model: self.name.clone(),
                reason,
            })
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let generator = QuestionGenerator::new(
            vec![
                ScriptedGenerator::ok("primary", "primary text"),
                ScriptedGenerator::ok("fallback", "fallback text"),
            ],
            PromptBuilder::default(),
        );

        let response = generator.generate("The sun is a star.").await;

        assert_eq!(response.text(), Some("primary text"));
        assert_eq!(response.model(), Some("primary"));
        assert_eq!(generator.candidates[0].calls(), 1);
        assert_eq!(generator.candidates[1].calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_fails() {
        let generator = QuestionGenerator::new(
            vec![
                ScriptedGenerator::failing("primary", "429 quota exceeded"),
                ScriptedGenerator::ok("fallback", "fallback text"),
            ],
            PromptBuilder::default(),
        );

        let response = generator.generate("The sun is a star.").await;

        assert!(!response.is_failure());
        assert_eq!(response.text(), Some("fallback text"));
        assert_eq!(response.model(), Some("fallback"));
        assert_eq!(generator.candidates[0].calls(), 1);
        assert_eq!(generator.candidates[1].calls(), 1);
    }

    #[tokio::test]
    async fn test_all_candidates_failing_returns_sentinel() {
        let generator = QuestionGenerator::new(
            vec![
                ScriptedGenerator::failing("primary", "network down"),
                ScriptedGenerator::failing("fallback", "network down"),
            ],
            PromptBuilder::default(),
        );

        let response = generator.generate("The sun is a star.").await;

        assert_eq!(response, RawModelResponse::Failed);
        assert_eq!(response.text(), None);
        assert_eq!(response.to_string(), GENERATION_FAILED_SENTINEL);
    }

    #[tokio::test]
    async fn test_no_candidates_is_a_failure() {
        let generator: QuestionGenerator<ScriptedGenerator> =
            QuestionGenerator::new(Vec::new(), PromptBuilder::default());
        assert!(generator.generate("text").await.is_failure());
    }

    #[tokio::test]
    async fn test_candidates_receive_the_built_prompt() {
        let builder = PromptBuilder::new(7);
        let expected = builder.build("The sun is a star.");
        let generator =
            QuestionGenerator::new(vec![ScriptedGenerator::ok("primary", "x")], builder);

        generator.generate("The sun is a star.").await;

        let prompt = generator.candidates[0].last_prompt.lock().unwrap().clone();
        assert_eq!(prompt, Some(expected));
    }

    #[tokio::test]
    async fn test_slow_candidate_times_out_and_falls_back() {
        let mut slow = ScriptedGenerator::ok("slow", "too late");
        slow.delay = Some(Duration::from_secs(30));

        let generator = QuestionGenerator::new(
            vec![slow, ScriptedGenerator::ok("fast", "in time")],
            PromptBuilder::default(),
        )
        .with_timeout(Some(Duration::from_millis(20)));

        let response = generator.generate("text").await;

        assert_eq!(response.model(), Some("fast"));
        assert_eq!(generator.candidate_names(), vec!["slow", "fast"]);
    }
}
