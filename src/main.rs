use anyhow::Result;
use passage_quiz::utils::logging;
use passage_quiz::{App, Config};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 初始化日志
    logging::init();

    // 加载配置（quiz.toml 可选，环境变量优先）
    let config = Config::load(Some(Path::new("quiz.toml")))?;

    let app = App::initialize(config).await?;

    // 指定了文件则只处理该文件，否则处理整个文章目录
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => app.run_file(&path).await?,
        None => app.run().await?,
    }

    Ok(())
}
