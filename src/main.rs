//! Research Monitor - 无界面运行器
//!
//! 加载首页结果，按配置轮询完成通知并把所有监控器事件写入日志，Ctrl-C 退出

use std::sync::Arc;

use research_monitor::config::{load_config, print_config};
use research_monitor::infrastructure::adapters::HttpResearchClient;
use research_monitor::infrastructure::events::{EventPublisher, MonitorEvent, ToastLevel};
use research_monitor::infrastructure::monitor::ResearchMonitor;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},research_monitor={}",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Research Monitor starting");
    print_config(&config);

    let api = Arc::new(HttpResearchClient::new(config.api.client_config())?);
    let events = Arc::new(EventPublisher::new());
    let monitor = ResearchMonitor::new(
        config.monitor.monitor_config(),
        api,
        events,
        Arc::new(config.monitor.progress_curve()),
    );

    // 事件日志
    let mut rx = monitor.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Err(e) = monitor.refresh().await {
        tracing::warn!(error = %e, "Initial load failed");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");

    monitor.dispose();
    drop(monitor);
    logger.abort();

    tracing::info!("Research Monitor stopped");
    Ok(())
}

fn log_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::PageReplaced {
            page,
            total_count,
            task_ids,
            processing,
            ..
        } => tracing::info!(
            page,
            total_count,
            shown = task_ids.len(),
            processing,
            "Results page loaded"
        ),
        MonitorEvent::ProgressUpdated { progress } => {
            for entry in progress {
                tracing::debug!(task_id = %entry.id, percent = entry.percent, "Progress");
            }
        }
        MonitorEvent::PollingStateChanged { active } => {
            tracing::info!(active, "Completion polling changed")
        }
        MonitorEvent::CompletionDetected {
            outcome,
            notification_type,
            ..
        } => tracing::info!(?outcome, notification_type = %notification_type, "Completion detected"),
        MonitorEvent::DeletionStateChanged { state, .. } => {
            tracing::info!(state = %state, "Deletion state changed")
        }
        MonitorEvent::Toast { level, message } => match level {
            ToastLevel::Error => tracing::error!("{}", message),
            _ => tracing::info!("{}", message),
        },
        MonitorEvent::FetchFailed { error } => tracing::warn!(error = %error, "Fetch failed"),
    }
}
