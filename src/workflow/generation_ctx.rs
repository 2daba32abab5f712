//! 出题上下文
//!
//! 封装"我正在为哪篇文档出题"这一信息

use std::fmt::Display;

use crate::models::DocumentId;

/// 一次出题事件的上下文
#[derive(Debug, Clone)]
pub struct GenerationCtx {
    /// 文档 ID（题目挂在这篇文档下）
    pub document_id: DocumentId,

    /// 文档在本次运行中的序号（仅用于日志显示）
    pub document_index: usize,

    /// 文档标题
    pub title: String,
}

impl GenerationCtx {
    pub fn new(document_id: DocumentId, document_index: usize, title: impl Into<String>) -> Self {
        Self {
            document_id,
            document_index,
            title: title.into(),
        }
    }
}

impl Display for GenerationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 #{} 文档 ID#{}]", self.document_index, self.document_id)
    }
}
