//! # Passage Quiz
//!
//! 为上传的阅读材料自动生成阅读理解选择题并保存到数据库
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 对外部模型服务的调用，只暴露"给一段提示词，返回一段文本"的能力
//! - `TextGenerator` - 出题能力抽象（测试中可替换）
//! - `LlmClient` - 基于 async-openai 的实现，一个客户端对应一个模型
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PromptBuilder` - 构建出题提示词
//! - `QuestionGenerator` - 候选模型依次尝试
//! - `ResponseParser` - 把模型回复解析为结构化题目
//! - `QuizStore` - 一个事务写入一次生成的全部题目
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文档出一次题"的完整流程
//! - `GenerationCtx` - 上下文封装（document_id + document_index）
//! - `QuizFlow` - 流程编排（truncate → generate → parse → save）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，管理资源
//! - `orchestrator/document_processor` - 单篇文档处理器，上传后触发出题
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{LlmClient, TextGenerator};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ChoiceLetter, ParsedChoice, ParsedQuestion, PassageDocument};
pub use orchestrator::{process_document, App};
pub use services::{QuestionGenerator, QuizStore, RawModelResponse, ResponseParser};
pub use workflow::{GenerationCtx, GenerationOutcome, GenerationReport, QuizFlow};
