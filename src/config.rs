use crate::error::ConfigError;
use crate::services::validation::ValidationPolicy;
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    /// 候选模型，按优先级排列（主模型在前，备用模型在后）
    pub candidate_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 单个候选模型的调用超时（秒），不设置则不限时
    pub generation_timeout_secs: Option<u64>,
    // --- 出题配置 ---
    /// 发送给模型前截取的正文最大字符数
    pub passage_char_limit: usize,
    /// 每篇材料要求生成的题目数量
    pub question_count: usize,
    /// 是否要求模型附带解析
    pub request_explanations: bool,
    /// 入库前的题目校验策略（`VALIDATION_POLICY`: reject / drop / keep）
    ///
    /// 默认 drop：没有恰好一个正确答案的题目不入库。
    /// 需要和旧系统一样原样保存所有解析结果时设为 keep
    pub validation_policy: ValidationPolicy,
    // --- 存储与输入输出 ---
    pub database_path: String,
    pub passages_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 生成失败的材料记录文件
    pub warn_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            candidate_models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
            ],
            temperature: 0.7,
            max_tokens: 2048,
            generation_timeout_secs: None,
            passage_char_limit: 3000,
            question_count: 7,
            request_explanations: false,
            validation_policy: ValidationPolicy::default(),
            database_path: "quiz.db".to_string(),
            passages_folder: "passages".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            warn_file: "warn.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path_str.clone(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path_str,
            source,
        })
    }

    /// 加载配置：TOML 文件（若存在）→ 环境变量覆盖 → 校验
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) if p.exists() => Self::from_toml_file(p)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_models.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::NoCandidateModels);
        }
        Ok(())
    }

    fn with_env_overrides(self) -> Self {
        let current = self;
        Self {
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .unwrap_or(current.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(current.llm_api_base_url),
            candidate_models: std::env::var("LLM_MODELS").ok().map(|v| parse_model_list(&v)).filter(|v| !v.is_empty()).unwrap_or(current.candidate_models),
            temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(current.temperature),
            max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(current.max_tokens),
            generation_timeout_secs: std::env::var("GENERATION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).or(current.generation_timeout_secs),
            passage_char_limit: std::env::var("PASSAGE_CHAR_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(current.passage_char_limit),
            question_count: std::env::var("QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(current.question_count),
            request_explanations: std::env::var("REQUEST_EXPLANATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(current.request_explanations),
            validation_policy: std::env::var("VALIDATION_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(current.validation_policy),
            database_path: std::env::var("DATABASE_PATH").unwrap_or(current.database_path),
            passages_folder: std::env::var("PASSAGES_FOLDER").unwrap_or(current.passages_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(current.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(current.output_log_file),
            warn_file: std::env::var("WARN_FILE").unwrap_or(current.warn_file),
        }
    }
}

/// 解析逗号分隔的模型列表
fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
