//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力：记录没有产出任何题目的文档，方便之后人工补题

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::error::FileError;

/// 警告写入服务
///
/// 职责：
/// - 把生成失败 / 保存失败 / 零题目的文档追加到 warn.txt
/// - 每次只写一条记录
/// - 不关心流程顺序
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 写入警告信息
    ///
    /// # 参数
    /// - `document_title`: 文档标题
    /// - `reason`: 没有题目的原因
    pub fn write(&self, document_title: &str, reason: &str) -> Result<(), FileError> {
        debug!("写入警告: 文档 {} | 原因: {}", document_title, reason);

        let write_failed = |source| FileError::WriteFailed {
            path: self.warn_file_path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .map_err(write_failed)?;

        let warn_msg = format!(
            "[{}] 文档 {} | {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            document_title,
            reason
        );

        file.write_all(warn_msg.as_bytes()).map_err(write_failed)?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
