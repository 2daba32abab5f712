use crate::error::FileError;
use crate::models::document::PassageDocument;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 支持的阅读材料扩展名
const SUPPORTED_EXTENSIONS: [&str; 3] = ["toml", "txt", "md"];

/// 从单个文件加载阅读材料
///
/// - `.toml`：包含 `title` / `text`，可选 `grade_level` / `skill_category`
/// - `.txt` / `.md`：整个文件内容作为正文，文件名（不含扩展名）作为标题
pub async fn load_passage_document(path: &Path) -> Result<PassageDocument, FileError> {
    let path_str = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(FileError::UnsupportedFormat { path: path_str });
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;

    let document = if extension == "toml" {
        toml::from_str::<PassageDocument>(&content).map_err(|source| {
            FileError::TomlParseFailed {
                path: path_str.clone(),
                source,
            }
        })?
    } else {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path_str.clone());
        PassageDocument::new(title, content)
    };

    Ok(document.with_file_path(path_str))
}

/// 从文件夹中加载所有阅读材料
///
/// 按文件名排序，保证处理顺序稳定；单个文件加载失败只记录警告
pub async fn load_all_passages(folder_path: &str) -> Result<Vec<PassageDocument>, FileError> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        });
    }

    let read_failed = |source| FileError::ReadFailed {
        path: folder_path.to_string(),
        source,
    };

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder).await.map_err(read_failed)?;
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if supported {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_passage_document(&path).await {
            Ok(document) => {
                tracing::info!(
                    "成功加载《{}》, 正文 {} 字符",
                    document.title,
                    document.text.chars().count()
                );
                documents.push(document);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}
