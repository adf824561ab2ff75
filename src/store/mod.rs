//! 全局状态层
//!
//! - `action` - 封闭的动作集合
//! - `state` - 状态与派生值
//! - `reducer` - 纯归约函数
//! - `app_store` - 带锁的状态容器，负责写回本地存储

pub mod action;
pub mod app_store;
pub mod reducer;
pub mod state;

pub use action::Action;
pub use app_store::AppStore;
pub use reducer::{reduce, HISTORY_LIMIT};
pub use state::{LoadingState, State};
