//! 本地持久化 - 业务能力层
//!
//! 只负责把设置和历史记录读写到存储端口，不关心何时写

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AppResult, StorageError};
use crate::models::{HistoryEntry, Settings};

/// 设置的存储键
pub const SETTINGS_KEY: &str = "corretor-acafe-settings";
/// 历史记录的存储键
pub const HISTORY_KEY: &str = "corretor-acafe-history";

/// 键值存储端口
///
/// 接口是同步的：`AppStore::dispatch` 在持有状态锁时直接调用它，
/// 保证写回的顺序与动作顺序一致。实现只适合保存设置、历史这类小文件。
pub trait StoragePort: Send + Sync {
    /// 读取，键不存在时返回 `None`
    fn load(&self, key: &str) -> AppResult<Option<String>>;
    /// 覆盖写入
    fn save(&self, key: &str, value: &str) -> AppResult<()>;
    /// 删除，键不存在不算错误
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// 文件存储：每个键对应 `<dir>/<key>.json`
///
/// 使用阻塞的 `std::fs`，单个文件只有几 KB，不值得切到 `spawn_blocking`。
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StoragePort for FileStorage {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                source,
            }
            .into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value).map_err(|source| StorageError::WriteFailed {
            key: key.to_string(),
            source,
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::RemoveFailed {
                key: key.to_string(),
                source,
            }
            .into()),
        }
    }
}

/// 内存存储，主要用于测试
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的原始内容
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl StoragePort for MemoryStorage {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// 持久化适配器
///
/// 读取是尽力而为：读不到或解析失败都记录警告并视为不存在。
#[derive(Clone)]
pub struct Persistence {
    port: Arc<dyn StoragePort>,
}

impl Persistence {
    pub fn new(port: Arc<dyn StoragePort>) -> Self {
        Self { port }
    }

    pub fn load_settings(&self) -> Option<Settings> {
        self.load_json(SETTINGS_KEY)
    }

    pub fn load_history(&self) -> Option<Vec<HistoryEntry>> {
        self.load_json(HISTORY_KEY)
    }

    pub fn save_settings(&self, settings: &Settings) -> AppResult<()> {
        self.save_json(SETTINGS_KEY, settings)
    }

    pub fn save_history(&self, history: &[HistoryEntry]) -> AppResult<()> {
        self.save_json(HISTORY_KEY, &history)
    }

    pub fn clear_history(&self) -> AppResult<()> {
        debug!("删除历史记录");
        self.port.remove(HISTORY_KEY)
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.port.load(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("⚠️ 读取 {} 失败: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("⚠️ 解析 {} 失败，忽略已保存的数据: {}", key, e);
                None
            }
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        debug!("保存 {} ({} 字节)", key, raw.len());
        self.port.save(key, &raw)
    }
}
