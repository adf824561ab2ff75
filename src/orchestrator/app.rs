//! 应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 API 客户端、状态容器、下载目录
//! 2. **运行流程**：驱动 `ProcessFlow`，把每一步的结果写入全局状态
//! 3. **取消管理**：新的运行或重置会取消上一次运行
//! 4. **后续操作**：加载统计与排名、下载报告、清除流程、历史记录
//!
//! ## 设计特点
//!
//! - **唯一的状态写入者**：流程层只通过回调汇报，由 `StoreHooks` 转成动作
//! - **向下委托**：具体步骤委托给 workflow 和 clients

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clients::{ApiClient, BlobSink, RequestOptions, RetryPolicy};
use crate::config::Config;
use crate::error::{AppError, AppResult, TransportError};
use crate::models::{
    ApiStatus, DocumentInventory, HistoryEntry, HistorySummary, ProcessStatus,
    ProcessingResult, SettingsPatch, SpreadsheetFile, StatusEvent, UploadResponse,
};
use crate::services::{file_validator, FileStorage, StoragePort};
use crate::store::{Action, AppStore, State};
use crate::utils::logging::log_startup;
use crate::workflow::{FlowHooks, FlowOutcome, ProcessCtx, ProcessFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: ProcessFlow,
    store: Arc<AppStore>,
    sink: BlobSink,
    /// 当前运行的取消令牌
    active: Mutex<Option<CancellationToken>>,
    runs: AtomicU64,
}

impl App {
    /// 初始化应用，状态保存在 `config.storage_dir`
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let client = ApiClient::new(&config)?;
        let port: Arc<dyn StoragePort> = Arc::new(FileStorage::new(&config.storage_dir));

        Ok(Self::with_parts(config, client, port))
    }

    /// 使用指定的客户端和存储端口创建
    pub fn with_parts(config: Config, client: ApiClient, port: Arc<dyn StoragePort>) -> Self {
        let retry = RetryPolicy::from_config(&config);
        let sink = BlobSink::new(&config.download_dir);

        Self {
            flow: ProcessFlow::new(client, retry),
            store: Arc::new(AppStore::init(port)),
            sink,
            active: Mutex::new(None),
            runs: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    /// 当前状态的副本
    pub fn snapshot(&self) -> State {
        self.store.snapshot()
    }

    fn client(&self) -> &ApiClient {
        self.flow.client()
    }

    // ========== 后端状态 ==========

    /// 存活检查，结果写入 `api_status`
    pub async fn check_health(&self) -> ApiStatus {
        self.store.dispatch(Action::SetApiStatus(ApiStatus::Checking));

        let status = match self.client().health(&RequestOptions::default()).await {
            Ok(health) => {
                info!("✓ 后端在线 (状态: {})", health.status);
                ApiStatus::Online
            }
            Err(e) => {
                warn!("⚠️ 后端离线: {}", e);
                ApiStatus::Offline
            }
        };

        self.store.dispatch(Action::SetApiStatus(status));
        status
    }

    /// 手动重新加载：取消当前运行，清空流程状态，重新检查后端
    pub async fn reload(&self) -> ApiStatus {
        info!("🔄 重新加载");
        self.cancel_active();
        self.store.dispatch(Action::ResetAll);
        self.check_health().await
    }

    // ========== 运行流程 ==========

    /// 从磁盘读取文件并运行完整流程
    pub async fn run_path(&self, path: &Path) -> AppResult<FlowOutcome> {
        let file = SpreadsheetFile::from_path(path).await?;
        self.run_file(file).await
    }

    /// 运行完整流程：上传 → 批改 → 生成报告，然后加载结果并记录历史
    ///
    /// 预检不通过时直接返回，不取消正在进行的运行，也不改动当前流程的状态。
    pub async fn run_file(&self, file: SpreadsheetFile) -> AppResult<FlowOutcome> {
        if let Err(e) = file_validator::validate(&file.meta()).into_result() {
            warn!("⚠️ 文件未通过预检 ({}): {}", file.name(), e);
            return Err(e.into());
        }

        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = ProcessCtx::with_cancel(run, file.meta(), self.begin_run());

        info!("{} 🚀 开始处理", ctx);
        self.store.dispatch(Action::BeginUpload(file.meta()));
        self.store.dispatch(Action::SetLoading {
            is_loading: true,
            message: Some("正在上传文件...".to_string()),
        });

        let hooks = Arc::new(StoreHooks {
            store: Arc::clone(&self.store),
        });

        let outcome = match self.flow.run(&ctx, &file, hooks).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.finish_run(&ctx);
                return Err(e);
            }
        };

        for warning in &outcome.preflight_warnings {
            self.dispatch_if_active(&ctx, Action::AddWarning(warning.clone()))?;
        }

        if let Err(e) = self.load_results_for(&ctx, &outcome.process_id).await {
            if e.is_cancelled() {
                return Err(e);
            }
            warn!("{} ⚠️ 加载统计与排名失败: {}", ctx, e);
            self.dispatch_if_active(&ctx, Action::AddWarning(e.friendly_message()))?;
        }

        let entry = HistoryEntry::new(
            outcome.process_id.clone(),
            HistorySummary {
                file_name: file.name().to_string(),
                total_students: outcome.processing.statistics.general.total_students,
                average_score: outcome.processing.statistics.general.average_score,
                total_documents: outcome.documents.len() as u32,
            },
        );
        self.dispatch_if_active(&ctx, Action::AddToHistory(entry))?;

        if self.snapshot().settings.auto_download && !outcome.documents.is_empty() {
            info!("{} 📥 自动下载全部报告", ctx);
            if let Err(e) = self.download_all_documents().await {
                warn!("{} ⚠️ 自动下载失败: {}", ctx, e);
            }
        }

        self.finish_run(&ctx);
        Ok(outcome)
    }

    /// 重新加载当前流程的统计与完整排名
    pub async fn load_results(&self) -> AppResult<()> {
        let process_id = self.current_process_id()?;
        let ctx = ProcessCtx::new(0, Default::default());
        self.load_results_for(&ctx, &process_id).await
    }

    async fn load_results_for(&self, ctx: &ProcessCtx, process_id: &str) -> AppResult<()> {
        let options = RequestOptions::with_cancel(ctx.cancel.clone());
        let client = self.client();
        let opts = &options;
        let retry = self.flow.retry_policy();

        let statistics = retry
            .run(&ctx.cancel, move || client.statistics(process_id, opts))
            .await?;
        self.dispatch_if_active(ctx, Action::SetStatistics(statistics))?;

        let ranking = retry
            .run(&ctx.cancel, move || client.ranking(process_id, opts))
            .await?;
        info!("{} 🏆 排名已加载: {} 名学生", ctx, ranking.ranking.len());
        self.dispatch_if_active(ctx, Action::SetRanking(ranking.ranking))?;

        Ok(())
    }

    /// 取消当前运行并清空流程状态
    ///
    /// 被取消的运行不再写入状态，加载标记在这里一并关闭。
    pub fn reset_process(&self) {
        self.cancel_active();
        self.store.dispatch(Action::ResetProcess);
        self.store.dispatch(Action::SetLoading {
            is_loading: false,
            message: None,
        });
    }

    /// 清除服务端数据，然后清空流程状态
    pub async fn clear_process(&self) -> AppResult<()> {
        let process_id = self.current_process_id()?;
        let response = self
            .client()
            .clear_process(&process_id, &RequestOptions::default())
            .await?;
        info!("🧹 {}", response.message);
        self.reset_process();
        Ok(())
    }

    // ========== 下载 ==========

    /// 下载单个学生的报告
    pub async fn download_student_document(&self, student_id: &str) -> AppResult<PathBuf> {
        let state = self.snapshot();
        let process_id = current_process_id(&state)?;

        let student_name = state
            .documents()
            .and_then(|inventory| inventory.find(student_id))
            .map(|d| d.student_name.clone())
            .or_else(|| {
                state
                    .ranking
                    .as_ref()
                    .and_then(|r| r.iter().find(|s| s.id == student_id))
                    .map(|s| s.name.clone())
            })
            .unwrap_or_else(|| student_id.to_string());

        let path = self
            .client()
            .download_student_document(
                &process_id,
                student_id,
                &student_name,
                &self.sink,
                &RequestOptions::default(),
            )
            .await?;
        info!("📥 已下载: {}", path.display());
        Ok(path)
    }

    /// 下载全部报告（ZIP）
    pub async fn download_all_documents(&self) -> AppResult<PathBuf> {
        let state = self.snapshot();
        let process_id = current_process_id(&state)?;
        if !state.can_download() {
            return Err(AppError::Other("报告尚未生成".to_string()));
        }

        let path = self
            .client()
            .download_all_documents(&process_id, &self.sink, &RequestOptions::default())
            .await?;
        info!("📥 已下载: {}", path.display());
        Ok(path)
    }

    /// 下载 Excel 模板
    pub async fn download_template(&self) -> AppResult<PathBuf> {
        let path = self
            .client()
            .download_template(&self.sink, &RequestOptions::default())
            .await?;
        info!("📥 已下载模板: {}", path.display());
        Ok(path)
    }

    // ========== 设置与历史 ==========

    pub fn update_settings(&self, patch: SettingsPatch) {
        self.store.dispatch(Action::UpdateSettings(patch));
    }

    pub fn clear_history(&self) {
        self.store.dispatch(Action::ClearHistory);
    }

    /// 取消当前运行并保存状态
    pub fn shutdown(&self) -> AppResult<()> {
        self.cancel_active();
        self.store.teardown()
    }

    // ========== 取消管理 ==========

    /// 取消上一次运行，登记新的令牌
    fn begin_run(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }

    fn cancel_active(&self) {
        if let Some(token) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }

    /// 运行结束后注销令牌（如果仍是当前运行）
    fn finish_run(&self, ctx: &ProcessCtx) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = active.as_ref() {
            if !token.is_cancelled() && !ctx.is_cancelled() {
                *active = None;
            }
        }
    }

    /// 已取消的运行不再写入状态
    fn dispatch_if_active(&self, ctx: &ProcessCtx, action: Action) -> AppResult<()> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }
        self.store.dispatch(action);
        Ok(())
    }

    fn current_process_id(&self) -> AppResult<String> {
        current_process_id(&self.snapshot())
    }
}

fn current_process_id(state: &State) -> AppResult<String> {
    state
        .process_id
        .clone()
        .ok_or_else(|| AppError::Other("没有正在进行的流程".to_string()))
}

/// 把流程回调转换为状态动作
struct StoreHooks {
    store: Arc<AppStore>,
}

impl StoreHooks {
    fn loading(&self, message: &str) {
        self.store.dispatch(Action::SetLoading {
            is_loading: true,
            message: Some(message.to_string()),
        });
    }
}

impl FlowHooks for StoreHooks {
    fn on_upload_progress(&self, percent: u8) {
        self.store.dispatch(Action::SetProgress(percent));
    }

    fn on_upload_complete(&self, upload: &UploadResponse) {
        self.store
            .dispatch(Action::SetCurrentProcess(upload.process_id.clone()));
        self.store
            .dispatch(Action::SetValidationResult(upload.validation.clone()));
    }

    fn on_processing_start(&self) {
        self.loading("正在批改...");
    }

    fn on_processing_complete(&self, result: &ProcessingResult) {
        self.store
            .dispatch(Action::SetProcessingResults(result.clone()));
    }

    fn on_pdf_generation_start(&self) {
        self.loading("正在生成报告...");
    }

    fn on_pdf_generation_complete(&self, _inventory: &DocumentInventory) {
        self.store.dispatch(Action::SetLoading {
            is_loading: false,
            message: None,
        });
    }

    fn on_error(&self, error: &AppError) {
        self.store.dispatch(Action::SetError(error.friendly_message()));
    }

    fn on_transition(&self, event: &StatusEvent, status: &ProcessStatus) {
        debug!("状态: {} ({})", status, event.name());
        self.store.dispatch(Action::AdvanceStatus(event.clone()));
    }
}
