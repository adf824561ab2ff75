use thiserror::Error;

use crate::models::process::InvalidTransition;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件预检错误（不会发出任何网络请求）
    #[error("文件校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// HTTP 传输错误（已在传输层完成分类）
    #[error("API错误: {0}")]
    Transport(#[from] TransportError),
    /// 本地存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 流程状态机错误
    #[error("流程错误: {0}")]
    Workflow(#[from] InvalidTransition),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 文件预检错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .errors.join(", "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// HTTP 传输错误
///
/// 分类规则：
/// - 收到 4xx 响应 → `Client`（不可重试）
/// - 收到 5xx 响应 → `Server`（可重试）
/// - 没有收到响应 → `Network`（可重试）
/// - 其余情况 → `Unknown`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 请求方错误
    #[error("请求错误 ({status}): {detail}")]
    Client { status: u16, detail: String },
    /// 服务端错误
    #[error("服务端错误 ({status}): {detail}")]
    Server { status: u16, detail: String },
    /// 网络错误，服务器未响应
    #[error("网络错误，服务器未响应: {message}")]
    Network { message: String },
    /// 无法分类的错误
    #[error("未知错误: {message}")]
    Unknown { message: String },
    /// 流程已被取消
    #[error("请求已取消")]
    Cancelled,
}

impl TransportError {
    /// 根据响应状态码分类
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            400..=499 => TransportError::Client { status, detail },
            500..=u16::MAX => TransportError::Server { status, detail },
            _ => TransportError::Unknown {
                message: format!("意外的响应状态 {}: {}", status, detail),
            },
        }
    }

    /// 是否允许重试（只有 5xx 和网络错误）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Server { .. } | TransportError::Network { .. }
        )
    }

    /// 响应状态码（如果收到了响应）
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Client { status, .. } | TransportError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// 面向用户的错误提示
    pub fn friendly_message(&self) -> String {
        match self {
            TransportError::Client { status, detail } | TransportError::Server { status, detail } => {
                match *status {
                    400 if !detail.is_empty() => detail.clone(),
                    400 => "数据无效".to_string(),
                    404 => "资源不存在".to_string(),
                    413 => "文件过大".to_string(),
                    422 => "数据无法处理".to_string(),
                    500 => "服务器内部错误".to_string(),
                    503 => "服务暂时不可用".to_string(),
                    _ if !detail.is_empty() => detail.clone(),
                    _ => format!("错误 {}", status),
                }
            }
            TransportError::Network { .. } => "连接错误 - 请检查网络".to_string(),
            TransportError::Unknown { message } if !message.is_empty() => message.clone(),
            TransportError::Unknown { .. } => "未知错误".to_string(),
            TransportError::Cancelled => "操作已取消".to_string(),
        }
    }
}

/// 本地存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 读取失败
    #[error("读取 {key} 失败: {source}")]
    ReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入 {key} 失败: {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 删除失败
    #[error("删除 {key} 失败: {source}")]
    RemoveFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 序列化失败
    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),
    /// 其他 IO 错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    HttpClient(String),
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(StorageError::Json(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(StorageError::Io(err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建预检错误
    pub fn validation(errors: Vec<String>) -> Self {
        AppError::Validation(ValidationError { errors })
    }

    /// 是否为取消错误
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Transport(TransportError::Cancelled))
    }

    /// 传输层错误（如果是）
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            AppError::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// 面向用户的错误提示
    pub fn friendly_message(&self) -> String {
        match self {
            AppError::Transport(e) => e.friendly_message(),
            other => other.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
