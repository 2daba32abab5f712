//! 单篇文档处理器 - 编排层
//!
//! 上传一篇文档：先写入文档记录，再触发一次出题。
//! 出题失败不影响上传结果，只会记入 warn 文件。

use tracing::{info, warn};

use crate::clients::TextGenerator;
use crate::error::StorageError;
use crate::models::{DocumentId, PassageDocument};
use crate::services::{QuizStore, WarnWriter};
use crate::utils::logging::log_document_start;
use crate::workflow::{GenerationCtx, GenerationOutcome, GenerationReport, QuizFlow};

/// 单篇文档的处理结果
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub document_id: DocumentId,
    pub report: GenerationReport,
}

/// 处理单篇文档
///
/// # 参数
/// - `store`: 题目存储
/// - `flow`: 出题流程
/// - `warn_writer`: 失败记录
/// - `document`: 待上传的文档
/// - `document_index`: 文档序号（从 1 开始，仅用于日志）
/// - `total`: 文档总数（仅用于日志）
///
/// # 返回
/// 文档记录写入失败时返回错误；出题本身的失败体现在 `DocumentResult::report` 中
pub async fn process_document<G: TextGenerator>(
    store: &QuizStore,
    flow: &QuizFlow<G>,
    warn_writer: &WarnWriter,
    document: &PassageDocument,
    document_index: usize,
    total: usize,
) -> Result<DocumentResult, StorageError> {
    log_document_start(document_index, total, &document.title);

    let document_id = store.create_document(document)?;
    info!("[文档 {}] ✓ 上传完成，文档 ID: {}", document_index, document_id);

    let ctx = GenerationCtx::new(document_id, document_index, document.title.clone());
    let report = flow.run(store, &ctx, &document.text).await;

    if let Some(reason) = warn_reason(&report.outcome) {
        if let Err(e) = warn_writer.write(&document.title, reason) {
            warn!("[文档 {}] ⚠️ 写入 {} 失败: {}", document_index, warn_writer.path(), e);
        }
    }

    Ok(DocumentResult {
        document_id,
        report,
    })
}

fn warn_reason(outcome: &GenerationOutcome) -> Option<&'static str> {
    match outcome {
        GenerationOutcome::Saved { .. } => None,
        GenerationOutcome::NoQuestions => Some("没有可保存的题目"),
        GenerationOutcome::GenerationFailed => Some("所有候选模型出题失败"),
        GenerationOutcome::SaveFailed => Some("题目保存失败"),
    }
}
