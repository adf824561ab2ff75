//! 用户设置与处理历史（会被持久化到本地）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 界面主题
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// 用户设置
///
/// 读取时缺失的字段取默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub auto_download: bool,
    pub show_animations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            auto_download: false,
            show_animations: true,
        }
    }
}

/// 部分设置更新，只覆盖给出的字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_download: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_animations: Option<bool>,
}

impl Settings {
    pub fn merged(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            theme: patch.theme.unwrap_or(self.theme),
            auto_download: patch.auto_download.unwrap_or(self.auto_download),
            show_animations: patch.show_animations.unwrap_or(self.show_animations),
        }
    }
}

/// 历史记录条目
///
/// 同一个 `process_id` 可以出现多次（例如重置后重新处理同一份文件）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub process_id: String,
    pub timestamp: DateTime<Utc>,
    pub summary: HistorySummary,
}

/// 历史记录摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub total_students: u32,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub total_documents: u32,
}

impl HistoryEntry {
    pub fn new(process_id: impl Into<String>, summary: HistorySummary) -> Self {
        Self {
            process_id: process_id.into(),
            timestamp: Utc::now(),
            summary,
        }
    }
}
