//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载文章（Vec<PassageDocument>）
//! - 持有数据库连接和出题流程
//! - 输出全局统计信息
//!
//! ### `document_processor` - 单篇文档处理器
//! - 写入文档记录（上传）
//! - 触发一次出题
//! - 失败时写 warn 文件
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PassageDocument>)
//!     ↓
//! document_processor (处理单篇文档)
//!     ↓
//! workflow::QuizFlow (一次出题事件)
//!     ↓
//! services (能力层：prompt / generate / parse / store / warn)
//!     ↓
//! clients (LLM 调用)
//! ```

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use document_processor::{process_document, DocumentResult};
