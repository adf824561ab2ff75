//! 全局状态及其派生值

use crate::models::{
    ApiStatus, DocumentInventory, FileMeta, HistoryEntry, ProcessStatus, ProcessingResult,
    Settings, Statistics, StudentResult, ValidationResult,
};

/// 加载提示
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub message: String,
}

/// 全局状态
///
/// 同一时间最多只有一个当前流程；历史记录单独保留。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub api_status: ApiStatus,
    pub loading: LoadingState,
    /// 0-100
    pub progress: u8,

    pub uploaded_file: Option<FileMeta>,
    pub process_id: Option<String>,
    pub validation: Option<ValidationResult>,
    pub processing: Option<ProcessingResult>,
    pub statistics: Option<Statistics>,
    pub ranking: Option<Vec<StudentResult>>,
    pub status: ProcessStatus,

    pub error: Option<String>,
    pub warnings: Vec<String>,

    pub settings: Settings,
    pub history: Vec<HistoryEntry>,
}

impl State {
    pub fn has_current_process(&self) -> bool {
        self.process_id.is_some()
    }

    pub fn has_results(&self) -> bool {
        self.processing.is_some()
    }

    pub fn has_statistics(&self) -> bool {
        self.statistics.is_some()
    }

    /// 报告已生成，可以下载
    pub fn can_download(&self) -> bool {
        self.status
            .documents()
            .map(|inventory| !inventory.is_empty())
            .unwrap_or(false)
    }

    pub fn documents(&self) -> Option<&DocumentInventory> {
        self.status.documents()
    }

    pub fn is_processing(&self) -> bool {
        self.loading.is_loading && self.has_current_process()
    }

    pub fn total_students(&self) -> u32 {
        self.statistics
            .as_ref()
            .map(|s| s.general.total_students)
            .unwrap_or(0)
    }

    pub fn average_score(&self) -> f64 {
        self.statistics
            .as_ref()
            .map(|s| s.general.average_score)
            .unwrap_or(0.0)
    }

    pub fn process_count(&self) -> usize {
        self.history.len()
    }
}
