/// 批改服务 API 客户端
///
/// 封装所有与后端的 HTTP 交互：统一超时、错误分类、上传进度、二进制下载
use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::clients::blob::{self, BlobSink};
use crate::config::Config;
use crate::error::{AppResult, ConfigError, TransportError};
use crate::models::{
    ClearResponse, DocumentInventory, HealthResponse, ProcessingResult, RankingResponse,
    SpreadsheetFile, Statistics, UploadResponse,
};
use crate::utils::truncate_text;

/// 上传进度回调，参数为 0-100 的百分比
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// 上传分块大小
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// 单次请求的选项
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// 触发后请求立即以 `TransportError::Cancelled` 结束，迟到的响应被丢弃
    pub cancel: CancellationToken,
}

impl RequestOptions {
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

/// 批改服务 API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(config.api_base_url(), config.request_timeout())
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========== 通用请求 ==========

    /// 发送请求，返回 2xx 响应；其余情况按规则分类为 `TransportError`
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, &method, path, options).await
    }

    /// 发送请求并把 JSON 响应解析为 `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<T, TransportError> {
        let response = self.request(method, path, body, options).await?;
        read_json(response, options).await
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        debug!("🚀 {} {}", method, self.url(path));

        let response = cancellable(options, async {
            builder.send().await.map_err(|e| classify_send_error(&e))
        })
        .await
        .map_err(|e| {
            if let TransportError::Network { .. } = e {
                error!("❌ 网络错误 - 服务器未响应 ({} {})", method, path);
            }
            e
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("✅ {} {} - {}", method, path, status.as_u16());
            return Ok(response);
        }

        let body = cancellable(options, async {
            Ok(response.text().await.unwrap_or_else(|e| {
                debug!("读取错误响应体失败 ({} {}): {}", method, path, e);
                String::new()
            }))
        })
        .await?;
        let detail = extract_detail(&body, status);
        error!("❌ {}: {}", status.as_u16(), truncate_text(&detail, 200));

        Err(TransportError::from_status(status.as_u16(), detail))
    }

    // ========== 接口 ==========

    /// 存活检查
    pub async fn health(&self, options: &RequestOptions) -> Result<HealthResponse, TransportError> {
        self.request_json(Method::GET, "/health", None, options).await
    }

    /// 以 multipart 上传表格
    ///
    /// `on_progress` 收到的百分比为 `floor(已发送字节 * 100 / 总字节)`，单调不减。
    pub async fn upload(
        &self,
        file: &SpreadsheetFile,
        on_progress: Option<ProgressCallback>,
        options: &RequestOptions,
    ) -> Result<UploadResponse, TransportError> {
        let total = file.size();
        let body = progress_body(file.content(), on_progress.clone());

        let part = Part::stream_with_length(body, total)
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())
            .map_err(|e| TransportError::Unknown {
                message: format!("无效的文件类型 {}: {}", file.mime_type(), e),
            })?;
        let form = Form::new().part("file", part);

        let builder = self
            .http
            .post(self.url("/upload"))
            .header(ACCEPT, "application/json")
            .multipart(form);
        let response = self.execute(builder, &Method::POST, "/upload", options).await?;

        // 空文件没有分块，不会触发回调
        if total == 0 {
            if let Some(callback) = &on_progress {
                callback(100);
            }
        }

        read_json(response, options).await
    }

    /// 批改
    pub async fn process(
        &self,
        process_id: &str,
        options: &RequestOptions,
    ) -> Result<ProcessingResult, TransportError> {
        self.request_json(Method::POST, &format!("/processar/{}", process_id), None, options)
            .await
    }

    /// 统计数据
    pub async fn statistics(
        &self,
        process_id: &str,
        options: &RequestOptions,
    ) -> Result<Statistics, TransportError> {
        self.request_json(Method::GET, &format!("/estatisticas/{}", process_id), None, options)
            .await
    }

    /// 完整排名
    pub async fn ranking(
        &self,
        process_id: &str,
        options: &RequestOptions,
    ) -> Result<RankingResponse, TransportError> {
        self.request_json(Method::GET, &format!("/ranking/{}", process_id), None, options)
            .await
    }

    /// 生成所有学生的报告
    pub async fn generate_documents(
        &self,
        process_id: &str,
        options: &RequestOptions,
    ) -> Result<DocumentInventory, TransportError> {
        self.request_json(Method::POST, &format!("/gerar-pdfs/{}", process_id), None, options)
            .await
    }

    /// 清除服务端的流程数据
    pub async fn clear_process(
        &self,
        process_id: &str,
        options: &RequestOptions,
    ) -> Result<ClearResponse, TransportError> {
        self.request_json(Method::DELETE, &format!("/limpar/{}", process_id), None, options)
            .await
    }

    // ========== 二进制下载 ==========

    /// 下载二进制内容并写入 `sink`，返回文件路径
    pub async fn download_blob(
        &self,
        path: &str,
        file_name: &str,
        sink: &BlobSink,
        options: &RequestOptions,
    ) -> AppResult<PathBuf> {
        let response = self.request(Method::GET, path, None, options).await?;
        let bytes = cancellable(options, async {
            response.bytes().await.map_err(|e| classify_body_error(&e))
        })
        .await?;

        sink.write(file_name, &bytes).await
    }

    /// 下载单个学生的报告
    pub async fn download_student_document(
        &self,
        process_id: &str,
        student_id: &str,
        student_name: &str,
        sink: &BlobSink,
        options: &RequestOptions,
    ) -> AppResult<PathBuf> {
        self.download_blob(
            &format!("/download-pdf/{}/{}", process_id, student_id),
            &blob::student_document_name(student_name),
            sink,
            options,
        )
        .await
    }

    /// 下载全部报告（ZIP）
    pub async fn download_all_documents(
        &self,
        process_id: &str,
        sink: &BlobSink,
        options: &RequestOptions,
    ) -> AppResult<PathBuf> {
        self.download_blob(
            &format!("/download-todos-pdfs/{}", process_id),
            &blob::archive_name(process_id),
            sink,
            options,
        )
        .await
    }

    /// 下载 Excel 模板
    pub async fn download_template(
        &self,
        sink: &BlobSink,
        options: &RequestOptions,
    ) -> AppResult<PathBuf> {
        self.download_blob("/template-excel", blob::TEMPLATE_FILE_NAME, sink, options)
            .await
    }
}

// ========== 辅助函数 ==========

/// 取消令牌触发时立即返回 `Cancelled`
async fn cancellable<T, F>(options: &RequestOptions, fut: F) -> Result<T, TransportError>
where
    F: std::future::Future<Output = Result<T, TransportError>>,
{
    tokio::select! {
        biased;
        _ = options.cancel.cancelled() => Err(TransportError::Cancelled),
        result = fut => result,
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    options: &RequestOptions,
) -> Result<T, TransportError> {
    cancellable(options, async {
        response.json::<T>().await.map_err(|e| classify_body_error(&e))
    })
    .await
}

/// 发送阶段的错误：除了请求构建失败，都视为没有收到响应
fn classify_send_error(err: &reqwest::Error) -> TransportError {
    if err.is_builder() || err.is_redirect() {
        TransportError::Unknown {
            message: err.to_string(),
        }
    } else {
        TransportError::Network {
            message: err.to_string(),
        }
    }
}

/// 读取响应体阶段的错误
fn classify_body_error(err: &reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Unknown {
            message: format!("响应解析失败: {}", err),
        }
    } else {
        TransportError::Network {
            message: err.to_string(),
        }
    }
}

/// 从错误响应体中提取说明
///
/// 依次尝试 `detail`、`erro`（字符串或字符串数组），然后是原始文本，最后按状态码给出默认说明。
pub fn extract_detail(body: &str, status: StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = json.get("detail").and_then(|v| v.as_str()) {
            return detail.to_string();
        }
        match json.get("erro") {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                if !parts.is_empty() {
                    return parts.join(", ");
                }
            }
            _ => {}
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// 上传百分比
pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (sent.min(total) * 100 / total) as u8
}

fn chunk_ranges(len: usize) -> Vec<Range<usize>> {
    (0..len)
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| start..(start + UPLOAD_CHUNK_SIZE).min(len))
        .collect()
}

/// 构造分块发送的请求体，每交出一块就汇报一次进度
fn progress_body(content: Arc<Vec<u8>>, on_progress: Option<ProgressCallback>) -> reqwest::Body {
    let total = content.len() as u64;
    let sent = Arc::new(AtomicU64::new(0));

    let stream = futures::stream::iter(chunk_ranges(content.len())).map(move |range| {
        let chunk = content[range].to_vec();
        let now = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        if let Some(callback) = &on_progress {
            callback(upload_percent(now, total));
        }
        Ok::<Vec<u8>, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}
