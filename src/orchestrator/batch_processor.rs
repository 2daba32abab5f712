//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量上传文档并为每篇文档出题。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、打开数据库、构建出题流程
//! 2. **批量加载**：扫描并加载所有待处理的文章（`Vec<PassageDocument>`）
//! 3. **顺序处理**：逐篇上传并出题，单篇失败不影响后续文章
//! 4. **全局统计**：汇总所有文档的处理结果
//!
//! 数据库连接不能跨线程共享，所以这里不做并发，每篇文章依次处理

use std::path::Path;
use tracing::{error, info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_all_passages, load_passage_document, PassageDocument};
use crate::orchestrator::document_processor;
use crate::services::{QuizStore, WarnWriter};
use crate::utils::logging::{
    init_log_file, log_documents_loaded, log_startup, print_final_stats,
};
use crate::workflow::QuizFlow;

/// 应用主结构
pub struct App {
    config: Config,
    store: QuizStore,
    flow: QuizFlow<LlmClient>,
    warn_writer: WarnWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config.candidate_models, &config.database_path);

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，模型调用将会失败");
        }

        let store = QuizStore::open(Path::new(&config.database_path))?
            .with_policy(config.validation_policy);
        info!("✓ 数据库已就绪，校验策略: {}", config.validation_policy);

        let flow = QuizFlow::from_config(&config);
        let warn_writer = WarnWriter::with_path(config.warn_file.clone());

        Ok(Self {
            config,
            store,
            flow,
            warn_writer,
        })
    }

    /// 运行应用主逻辑：处理文章目录中的所有文件
    pub async fn run(&self) -> AppResult<()> {
        info!("\n📁 正在扫描待处理的文章...");
        let documents = load_all_passages(&self.config.passages_folder).await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到待处理的文章，程序结束");
            return Ok(());
        }

        log_documents_loaded(documents.len());

        let stats = self.process_all(&documents).await;
        print_final_stats(
            stats.success,
            stats.failed,
            stats.questions,
            &self.config.output_log_file,
        );

        Ok(())
    }

    /// 只处理单个文件
    pub async fn run_file(&self, path: &Path) -> AppResult<()> {
        let document = load_passage_document(path).await?;
        let stats = self.process_all(std::slice::from_ref(&document)).await;
        print_final_stats(
            stats.success,
            stats.failed,
            stats.questions,
            &self.config.output_log_file,
        );
        Ok(())
    }

    /// 依次处理所有文档
    async fn process_all(&self, documents: &[PassageDocument]) -> ProcessingStats {
        let total = documents.len();
        let mut stats = ProcessingStats::default();

        for (idx, document) in documents.iter().enumerate() {
            let document_index = idx + 1;
            match document_processor::process_document(
                &self.store,
                &self.flow,
                &self.warn_writer,
                document,
                document_index,
                total,
            )
            .await
            {
                Ok(result) if result.report.is_saved() => {
                    stats.success += 1;
                    stats.questions += result.report.questions_saved();
                }
                Ok(_) => {
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("[文档 {}] ❌ 上传失败: {}", document_index, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    questions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, FileError};

    fn config_in(dir: &tempfile::TempDir) -> Config {
        let path = |name: &str| dir.path().join(name).to_string_lossy().to_string();
        Config {
            output_log_file: path("output.txt"),
            warn_file: path("warn.txt"),
            database_path: path("quiz.db"),
            passages_folder: path("passages"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_reports_unopenable_database_as_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir
                .path()
                .join("missing")
                .join("quiz.db")
                .to_string_lossy()
                .to_string(),
            ..config_in(&dir)
        };

        let result = App::initialize(config).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_initialize_reports_unwritable_log_file_as_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_log_file: dir
                .path()
                .join("missing")
                .join("output.txt")
                .to_string_lossy()
                .to_string(),
            ..config_in(&dir)
        };

        let result = App::initialize(config).await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::WriteFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_run_without_passage_folder_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::initialize(config_in(&dir)).await.unwrap();

        let result = app.run().await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::DirectoryNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_run_with_empty_folder_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("passages")).unwrap();
        let app = App::initialize(config_in(&dir)).await.unwrap();

        assert!(app.run().await.is_ok());
    }
}
