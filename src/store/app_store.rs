//! 全局状态容器
//!
//! 生命周期：`init → dispatch* → teardown`。每次 `dispatch` 在锁内原子地应用一个动作，
//! 读取方通过 `snapshot` 拿到独立的副本。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::AppResult;
use crate::services::{Persistence, StoragePort};
use crate::store::action::Action;
use crate::store::reducer::{reduce, HISTORY_LIMIT};
use crate::store::state::State;

/// 全局状态容器
pub struct AppStore {
    state: Mutex<State>,
    persistence: Persistence,
}

impl AppStore {
    /// 创建容器并尽力恢复已保存的设置和历史
    pub fn init(port: Arc<dyn StoragePort>) -> Self {
        let persistence = Persistence::new(port);

        let mut state = State::default();
        if let Some(settings) = persistence.load_settings() {
            state.settings = settings;
        }
        if let Some(mut history) = persistence.load_history() {
            history.truncate(HISTORY_LIMIT);
            state.history = history;
        }

        debug!(
            "状态已初始化: 主题 {:?}, 历史记录 {} 条",
            state.settings.theme,
            state.history.len()
        );

        Self {
            state: Mutex::new(state),
            persistence,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 应用一个动作，并把变化的设置和历史写回存储
    pub fn dispatch(&self, action: Action) {
        let name = action.name();
        let clears_history = matches!(action, Action::ClearHistory);

        let mut state = self.lock();
        let settings_before = state.settings.clone();
        let history_before = state.history.clone();

        reduce(&mut state, action);
        debug!("dispatch {}", name);

        if state.settings != settings_before {
            if let Err(e) = self.persistence.save_settings(&state.settings) {
                warn!("⚠️ 保存设置失败: {}", e);
            }
        }

        if clears_history {
            if let Err(e) = self.persistence.clear_history() {
                warn!("⚠️ 删除历史记录失败: {}", e);
            }
        } else if state.history != history_before && !state.history.is_empty() {
            if let Err(e) = self.persistence.save_history(&state.history) {
                warn!("⚠️ 保存历史记录失败: {}", e);
            }
        }
    }

    /// 当前状态的副本
    pub fn snapshot(&self) -> State {
        self.lock().clone()
    }

    /// 把设置和历史最后写一次
    pub fn teardown(&self) -> AppResult<()> {
        let state = self.lock();
        self.persistence.save_settings(&state.settings)?;
        if !state.history.is_empty() {
            self.persistence.save_history(&state.history)?;
        }
        debug!("状态容器已关闭");
        Ok(())
    }
}
