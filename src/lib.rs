//! # Simulado Client
//!
//! 答题卡批改服务的 Rust 客户端：上传答题表格，等待批改，生成并下载学生报告
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 所有 HTTP 交互，只暴露能力
//! - `ApiClient` - 统一超时、错误分类、上传进度、二进制下载
//! - `RetryPolicy` - 只重试 5xx 和网络错误，可被取消
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `file_validator` - 上传前的本地预检
//! - `Persistence` - 设置与历史记录的本地读写
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份答题表"的完整处理流程
//! - `ProcessCtx` - 上下文封装（文件 + 取消令牌）
//! - `ProcessFlow` - 流程编排（预检 → 上传 → 批改 → 生成报告）
//!
//! ### ④ 状态层（Store）
//! - `store/` - 全局状态，动作串行归约
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/App` - 持有客户端和状态，驱动流程并写入结果
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ApiClient, RetryPolicy};
pub use config::Config;
pub use error::{AppError, AppResult, TransportError};
pub use models::{ProcessStatus, SpreadsheetFile};
pub use orchestrator::App;
pub use store::{Action, AppStore, State};
pub use workflow::{FlowHooks, FlowOutcome, ProcessCtx, ProcessFlow};
