//! 处理流程 - 流程层
//!
//! 核心职责：定义"一份答题表"的完整处理流程
//!
//! 流程顺序（严格串行，任何一步失败都会终止后续步骤）：
//! 1. 本地预检
//! 2. 上传 → Uploaded
//! 3. 批改 → Processed
//! 4. 生成报告 → Ready

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{ApiClient, ProgressCallback, RequestOptions, RetryPolicy};
use crate::error::{AppError, AppResult, TransportError};
use crate::models::{
    DocumentInventory, ProcessStatus, ProcessingResult, SpreadsheetFile, StatusEvent,
    UploadResponse,
};
use crate::services::file_validator;
use crate::workflow::process_ctx::ProcessCtx;

/// 流程回调
///
/// 所有方法默认不做任何事。流程被取消后不会再调用任何回调。
pub trait FlowHooks: Send + Sync {
    /// 上传进度（0-100，单调不减）
    fn on_upload_progress(&self, _percent: u8) {}
    fn on_upload_complete(&self, _upload: &UploadResponse) {}
    fn on_processing_start(&self) {}
    fn on_processing_complete(&self, _result: &ProcessingResult) {}
    fn on_pdf_generation_start(&self) {}
    fn on_pdf_generation_complete(&self, _inventory: &DocumentInventory) {}
    /// 收到的错误与 `run` 返回的错误相同
    fn on_error(&self, _error: &AppError) {}
    /// 每次状态变化
    fn on_transition(&self, _event: &StatusEvent, _status: &ProcessStatus) {}
}

/// 不关心任何回调
pub struct NoopHooks;

impl FlowHooks for NoopHooks {}

/// 一次成功处理的完整结果
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub process_id: String,
    pub upload: UploadResponse,
    pub processing: ProcessingResult,
    pub documents: DocumentInventory,
    /// 经过的所有状态，从 `Idle` 开始
    pub transitions: Vec<ProcessStatus>,
    /// 本地预检产生的警告
    pub preflight_warnings: Vec<String>,
}

/// 处理流程
///
/// - 编排上传、批改、生成报告三个远程步骤
/// - 每一步都经过重试策略
/// - 不持有全局状态，只通过回调向外汇报
pub struct ProcessFlow {
    client: ApiClient,
    retry: RetryPolicy,
}

impl ProcessFlow {
    pub fn new(client: ApiClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// 执行完整流程
    ///
    /// 预检失败时直接返回 `AppError::Validation`，不发出请求也不调用回调。
    /// 远程步骤失败时依次触发 `Failed` 状态、`on_error`，然后原样返回错误。
    pub async fn run(
        &self,
        ctx: &ProcessCtx,
        file: &SpreadsheetFile,
        hooks: Arc<dyn FlowHooks>,
    ) -> AppResult<FlowOutcome> {
        let preflight_warnings = file_validator::validate(&file.meta()).into_result()?;
        for warning in &preflight_warnings {
            warn!("{} ⚠️ {}", ctx, warning);
        }

        let mut tracker = Tracker::new(ctx, Arc::clone(&hooks));
        match self.run_steps(ctx, file, &hooks, &mut tracker).await {
            Ok((upload, processing, documents)) => {
                info!("{} ✅ 处理完成，共 {} 份报告", ctx, documents.len());
                Ok(FlowOutcome {
                    process_id: upload.process_id.clone(),
                    upload,
                    processing,
                    documents,
                    transitions: tracker.transitions,
                    preflight_warnings,
                })
            }
            Err(err) => Err(tracker.fail(err)),
        }
    }

    async fn run_steps(
        &self,
        ctx: &ProcessCtx,
        file: &SpreadsheetFile,
        hooks: &Arc<dyn FlowHooks>,
        tracker: &mut Tracker<'_>,
    ) -> AppResult<(UploadResponse, ProcessingResult, DocumentInventory)> {
        let options = RequestOptions::with_cancel(ctx.cancel.clone());
        let client = &self.client;
        let opts = &options;

        // ========== 步骤 1: 上传 ==========
        tracker.advance(StatusEvent::Start)?;
        info!("{} 📤 正在上传 ({} 字节)...", ctx, file.size());

        let progress = monotonic_progress(ctx, Arc::clone(hooks));
        let upload = self
            .retry
            .run(&ctx.cancel, move || {
                client.upload(file, Some(Arc::clone(&progress)), opts)
            })
            .await?;

        info!("{} ✓ 上传完成，流程ID: {}", ctx, upload.process_id);
        tracker.advance(StatusEvent::UploadSucceeded)?;
        tracker.emit(|h| h.on_upload_complete(&upload))?;

        let process_id = upload.process_id.as_str();

        // ========== 步骤 2: 批改 ==========
        tracker.advance(StatusEvent::ProcessingStarted)?;
        tracker.emit(|h| h.on_processing_start())?;
        info!("{} ⚙️ 正在批改...", ctx);

        let processing = self
            .retry
            .run(&ctx.cancel, move || client.process(process_id, opts))
            .await?;

        info!(
            "{} ✓ 批改完成: {} 名学生, 平均分 {:.2}",
            ctx,
            processing.statistics.general.total_students,
            processing.statistics.general.average_score
        );
        tracker.advance(StatusEvent::ProcessingSucceeded)?;
        tracker.emit(|h| h.on_processing_complete(&processing))?;

        // ========== 步骤 3: 生成报告 ==========
        tracker.advance(StatusEvent::GenerationStarted)?;
        tracker.emit(|h| h.on_pdf_generation_start())?;
        info!("{} 📄 正在生成报告...", ctx);

        let documents = self
            .retry
            .run(&ctx.cancel, move || client.generate_documents(process_id, opts))
            .await?;

        tracker.advance(StatusEvent::GenerationSucceeded(documents.clone()))?;
        tracker.emit(|h| h.on_pdf_generation_complete(&documents))?;

        Ok((upload, processing, documents))
    }
}

/// 进度回调：去重且单调不减（重试时不会回退），取消后不再汇报
fn monotonic_progress(ctx: &ProcessCtx, hooks: Arc<dyn FlowHooks>) -> ProgressCallback {
    let cancel = ctx.cancel.clone();
    // 存储 `已汇报的最大值 + 1`，0 表示尚未汇报
    let reported = Arc::new(AtomicU16::new(0));

    Arc::new(move |percent: u8| {
        if cancel.is_cancelled() {
            return;
        }
        let marker = u16::from(percent) + 1;
        if reported.fetch_max(marker, Ordering::SeqCst) < marker {
            hooks.on_upload_progress(percent);
        }
    })
}

/// 记录本次运行经过的状态，并在每次回调前检查取消
struct Tracker<'a> {
    ctx: &'a ProcessCtx,
    hooks: Arc<dyn FlowHooks>,
    status: ProcessStatus,
    transitions: Vec<ProcessStatus>,
}

impl<'a> Tracker<'a> {
    fn new(ctx: &'a ProcessCtx, hooks: Arc<dyn FlowHooks>) -> Self {
        Self {
            ctx,
            hooks,
            status: ProcessStatus::Idle,
            transitions: vec![ProcessStatus::Idle],
        }
    }

    fn ensure_active(&self) -> AppResult<()> {
        if self.ctx.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }
        Ok(())
    }

    fn emit(&self, notify: impl FnOnce(&dyn FlowHooks)) -> AppResult<()> {
        self.ensure_active()?;
        notify(self.hooks.as_ref());
        Ok(())
    }

    fn advance(&mut self, event: StatusEvent) -> AppResult<()> {
        self.ensure_active()?;
        let next = self.status.apply(&event)?;
        self.hooks.on_transition(&event, &next);
        self.transitions.push(next.clone());
        self.status = next;
        Ok(())
    }

    /// 失败收尾：取消的运行静默结束，其余情况转到 `Errored` 并通知回调
    fn fail(&mut self, err: AppError) -> AppError {
        if err.is_cancelled() || self.ctx.is_cancelled() {
            warn!("{} ⏹️ 流程已取消", self.ctx);
            return err;
        }

        error!("{} ❌ 流程失败 ({}): {}", self.ctx, self.status, err);

        if let Ok(next) = self.status.apply(&StatusEvent::Failed) {
            self.hooks.on_transition(&StatusEvent::Failed, &next);
            self.transitions.push(next.clone());
            self.status = next;
        }
        self.hooks.on_error(&err);
        err
    }
}
