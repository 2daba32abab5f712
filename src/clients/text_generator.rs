use crate::error::LlmError;

/// 文本生成能力
///
/// 每个实现对应一个候选模型。`QuestionGenerator` 只依赖这个 trait，
/// 测试时可以注入固定回复的实现，不需要真实的网络调用。
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    /// 模型标识（用于日志和结果记录）
    fn model_name(&self) -> &str;

    /// 发送提示词，返回模型的原始回复
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
