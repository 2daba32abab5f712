use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// LLM 后端错误
///
/// 单个候选模型调用失败时产生，由 `QuestionGenerator` 在本地消化后切换到下一个候选模型
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败（网络、配额、响应格式等）
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },
    /// 请求构建失败
    #[error("LLM请求构建失败 (模型: {model}): {message}")]
    RequestBuildFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 调用超时
    #[error("LLM调用超时 (模型: {model}, {secs} 秒)")]
    Timeout { model: String, secs: u64 },
    /// 后端不可用
    #[error("LLM后端不可用 (模型: {model}): {reason}")]
    Unavailable { model: String, reason: String },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite错误: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// 迁移失败
    #[error("数据库迁移失败 (版本 {version}): {reason}")]
    MigrationFailed { version: i64, reason: String },

    /// 文档不存在
    #[error("文档不存在: {document_id}")]
    DocumentNotFound { document_id: i64 },

    /// 校验策略拒绝整批写入
    #[error("校验策略拒绝写入: {malformed}/{total} 道题目没有唯一正确答案")]
    BatchRejected { malformed: usize, total: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 不支持的文件类型
    #[error("不支持的文件类型: {path}")]
    UnsupportedFormat { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("配置文件读取失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 没有配置任何候选模型
    #[error("至少需要配置一个候选模型")]
    NoCandidateModels,
    /// 未知的校验策略
    #[error("未知的校验策略: '{value}' (可选: reject / drop / keep)")]
    UnknownValidationPolicy { value: String },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
