//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有 API 客户端和全局状态，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (运行流程、下载、历史记录)
//!     ↓
//! workflow::ProcessFlow (上传 → 批改 → 生成报告)
//!     ↓
//! services (能力层：预检 / 持久化)    clients (HTTP / 重试 / 下载落盘)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一写入者**：只有编排层向 `AppStore` 派发动作
//! 2. **向下依赖**：编排层 → workflow → services / clients
//! 3. **取消即静默**：被取消的运行不再修改状态

pub mod app;

pub use app::App;
