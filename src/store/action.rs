//! 状态变更动作

use crate::models::{
    ApiStatus, FileMeta, HistoryEntry, ProcessingResult, SettingsPatch, Statistics,
    StatusEvent, StudentResult, ValidationResult,
};

/// 所有可以改变全局状态的动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetApiStatus(ApiStatus),
    SetLoading {
        is_loading: bool,
        message: Option<String>,
    },
    SetProgress(u8),
    /// 记录新上传的文件，清除错误并丢弃上一次处理的结果
    BeginUpload(FileMeta),
    /// 同时用结果中的警告整体替换当前警告
    SetValidationResult(ValidationResult),
    SetCurrentProcess(String),
    /// 同时更新统计与排名
    SetProcessingResults(ProcessingResult),
    SetStatistics(Statistics),
    SetRanking(Vec<StudentResult>),
    /// 推进流程状态；非法转换会被记录并忽略
    AdvanceStatus(StatusEvent),
    /// 插入到最前，最多保留 10 条
    AddToHistory(HistoryEntry),
    RestoreHistory(Vec<HistoryEntry>),
    ClearHistory,
    UpdateSettings(SettingsPatch),
    /// 同时结束加载状态
    SetError(String),
    ClearError,
    AddWarning(String),
    ClearWarnings,
    ResetProcess,
    ResetAll,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetApiStatus(_) => "SET_API_STATUS",
            Action::SetLoading { .. } => "SET_LOADING",
            Action::SetProgress(_) => "SET_PROGRESS",
            Action::BeginUpload(_) => "BEGIN_UPLOAD",
            Action::SetValidationResult(_) => "SET_VALIDATION_RESULT",
            Action::SetCurrentProcess(_) => "SET_CURRENT_PROCESS",
            Action::SetProcessingResults(_) => "SET_PROCESSING_RESULTS",
            Action::SetStatistics(_) => "SET_STATISTICS",
            Action::SetRanking(_) => "SET_RANKING",
            Action::AdvanceStatus(_) => "ADVANCE_STATUS",
            Action::AddToHistory(_) => "ADD_TO_HISTORY",
            Action::RestoreHistory(_) => "RESTORE_HISTORY",
            Action::ClearHistory => "CLEAR_HISTORY",
            Action::UpdateSettings(_) => "UPDATE_SETTINGS",
            Action::SetError(_) => "SET_ERROR",
            Action::ClearError => "CLEAR_ERROR",
            Action::AddWarning(_) => "ADD_WARNING",
            Action::ClearWarnings => "CLEAR_WARNINGS",
            Action::ResetProcess => "RESET_PROCESS",
            Action::ResetAll => "RESET_ALL",
        }
    }
}
