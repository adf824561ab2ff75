use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use simulado_client::models::ApiStatus;
use simulado_client::utils::logging;
use simulado_client::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        error!("用法: simulado_client <答题表.xlsx>");
        std::process::exit(2);
    };

    // 初始化应用
    let app = App::initialize(config).await?;

    if app.check_health().await == ApiStatus::Offline {
        warn!("⚠️ 后端暂时不可用，仍然尝试处理（请求失败时会自动重试）");
    }

    let result = app.run_path(&path).await;

    match &result {
        Ok(outcome) => logging::log_flow_summary(outcome),
        Err(e) => error!("❌ 处理失败: {}", e.friendly_message()),
    }

    app.shutdown()?;
    info!("👋 程序结束");

    result.map(|_| ()).map_err(Into::into)
}
