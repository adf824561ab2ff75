/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::FlowOutcome;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按配置使用 `info` 或 `debug`。
/// 重复调用不会报错（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题卡批改客户端");
    info!("🌐 接口地址: {}", config.api_base_url());
    info!(
        "🔁 重试策略: 最多 {} 次, 基础间隔 {}ms",
        config.max_retries, config.retry_delay_ms
    );
    info!("{}", "=".repeat(60));
}

/// 打印一次处理的最终统计
pub fn log_flow_summary(outcome: &FlowOutcome) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🆔 流程ID: {}", outcome.process_id);
    info!(
        "👥 学生人数: {}",
        outcome.processing.statistics.general.total_students
    );
    info!(
        "📈 平均分: {:.2}",
        outcome.processing.statistics.general.average_score
    );
    info!("📄 已生成报告: {}", outcome.documents.len());
    info!(
        "🔀 状态轨迹: {}",
        outcome
            .transitions
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" → ")
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("não encontrado", 3), "não...");
    }
}
