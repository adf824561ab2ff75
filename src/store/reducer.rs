//! 状态归约
//!
//! 纯函数：只根据动作修改状态，不做任何 IO

use tracing::warn;

use crate::models::{ProcessStatus, StatusEvent};
use crate::store::action::Action;
use crate::store::state::State;

/// 历史记录上限
pub const HISTORY_LIMIT: usize = 10;

/// 把动作应用到状态上
pub fn reduce(state: &mut State, action: Action) {
    match action {
        Action::SetApiStatus(status) => state.api_status = status,

        Action::SetLoading {
            is_loading,
            message,
        } => {
            state.loading.is_loading = is_loading;
            state.loading.message = message.unwrap_or_default();
        }

        Action::SetProgress(progress) => state.progress = progress.min(100),

        Action::BeginUpload(file) => {
            clear_process(state);
            state.uploaded_file = Some(file);
        }

        Action::SetValidationResult(result) => {
            state.warnings = result.warnings.clone();
            state.validation = Some(result);
        }

        Action::SetCurrentProcess(process_id) => state.process_id = Some(process_id),

        Action::SetProcessingResults(result) => {
            state.statistics = Some(result.statistics.clone());
            state.ranking = Some(result.ranking.clone());
            state.processing = Some(result);
        }

        Action::SetStatistics(statistics) => state.statistics = Some(statistics),

        Action::SetRanking(ranking) => state.ranking = Some(ranking),

        Action::AdvanceStatus(event) => advance_status(state, &event),

        Action::AddToHistory(entry) => {
            state.history.insert(0, entry);
            state.history.truncate(HISTORY_LIMIT);
        }

        Action::RestoreHistory(mut history) => {
            history.truncate(HISTORY_LIMIT);
            state.history = history;
        }

        Action::ClearHistory => state.history.clear(),

        Action::UpdateSettings(patch) => state.settings = state.settings.merged(&patch),

        Action::SetError(message) => {
            state.error = Some(message);
            state.loading.is_loading = false;
        }

        Action::ClearError => state.error = None,

        Action::AddWarning(warning) => state.warnings.push(warning),

        Action::ClearWarnings => state.warnings.clear(),

        Action::ResetProcess => clear_process(state),

        Action::ResetAll => {
            *state = State {
                api_status: state.api_status,
                settings: state.settings.clone(),
                history: std::mem::take(&mut state.history),
                ..State::default()
            };
        }
    }
}

/// 清除当前流程的所有字段，保留后端状态、设置、历史和加载状态
fn clear_process(state: &mut State) {
    state.process_id = None;
    state.uploaded_file = None;
    state.validation = None;
    state.processing = None;
    state.statistics = None;
    state.ranking = None;
    state.status = ProcessStatus::Idle;
    state.progress = 0;
    state.error = None;
    state.warnings.clear();
}

fn advance_status(state: &mut State, event: &StatusEvent) {
    match state.status.apply(event) {
        Ok(next) => {
            if matches!(next, ProcessStatus::Ready(_)) {
                state.progress = 100;
            }
            state.status = next;
        }
        Err(e) => warn!("⚠️ 忽略状态事件: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApiStatus, DocumentDescriptor, DocumentInventory, FileMeta, HistoryEntry, HistorySummary,
        ProcessingResult, SettingsPatch, Statistics, Theme, ValidationResult,
    };

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry::new(id, HistorySummary::default())
    }

    fn file() -> FileMeta {
        FileMeta {
            name: "simulado.xlsx".to_string(),
            mime_type: "application/vnd.ms-excel".to_string(),
            size: 1024,
        }
    }

    fn validation(warnings: &[&str]) -> ValidationResult {
        ValidationResult {
            valid: true,
            errors: vec![],
            warnings: warnings.iter().map(|w| w.to_string()).collect(),
            detected_structure: Default::default(),
        }
    }

    fn processing() -> ProcessingResult {
        let mut statistics = Statistics::default();
        statistics.general.total_students = 42;
        statistics.general.average_score = 7.25;
        ProcessingResult {
            process_id: "p-1".to_string(),
            status: "concluido".to_string(),
            statistics,
            ranking: vec![],
        }
    }

    /// 一个走完全流程的状态
    fn populated() -> State {
        let mut state = State::default();
        for action in [
            Action::SetApiStatus(ApiStatus::Online),
            Action::UpdateSettings(SettingsPatch {
                theme: Some(Theme::Dark),
                ..Default::default()
            }),
            Action::AddToHistory(entry("old")),
            Action::BeginUpload(file()),
            Action::AdvanceStatus(StatusEvent::Start),
            Action::SetProgress(100),
            Action::SetValidationResult(validation(&["coluna extra"])),
            Action::SetCurrentProcess("p-1".to_string()),
            Action::AdvanceStatus(StatusEvent::UploadSucceeded),
            Action::AdvanceStatus(StatusEvent::ProcessingStarted),
            Action::SetProcessingResults(processing()),
            Action::AdvanceStatus(StatusEvent::ProcessingSucceeded),
            Action::AdvanceStatus(StatusEvent::GenerationStarted),
            Action::AdvanceStatus(StatusEvent::GenerationSucceeded(DocumentInventory {
                total: 1,
                documents: vec![DocumentDescriptor {
                    student_id: "a1".to_string(),
                    student_name: "Ana".to_string(),
                    ..Default::default()
                }],
                archive_available: true,
            })),
            Action::SetError("falha".to_string()),
        ] {
            reduce(&mut state, action);
        }
        state
    }

    #[test]
    fn test_history_keeps_ten_most_recent() {
        let mut state = State::default();
        for i in 0..11 {
            reduce(&mut state, Action::AddToHistory(entry(&format!("p{}", i))));
        }

        assert_eq!(state.history.len(), 10);
        assert_eq!(state.history[0].process_id, "p10");
        assert_eq!(state.history[9].process_id, "p1");
        assert!(state.history.iter().all(|e| e.process_id != "p0"));
        assert_eq!(state.process_count(), 10);
    }

    #[test]
    fn test_history_allows_duplicate_ids() {
        let mut state = State::default();
        reduce(&mut state, Action::AddToHistory(entry("same")));
        reduce(&mut state, Action::AddToHistory(entry("same")));
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_validation_result_replaces_warnings() {
        let mut state = State::default();
        reduce(&mut state, Action::AddWarning("manual".to_string()));
        reduce(&mut state, Action::SetValidationResult(validation(&["a", "b"])));

        assert_eq!(state.warnings, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_processing_results_fill_statistics() {
        let mut state = State::default();
        assert_eq!(state.total_students(), 0);
        assert_eq!(state.average_score(), 0.0);

        reduce(&mut state, Action::SetProcessingResults(processing()));

        assert!(state.has_results());
        assert!(state.has_statistics());
        assert_eq!(state.total_students(), 42);
        assert_eq!(state.average_score(), 7.25);
    }

    #[test]
    fn test_reset_all_keeps_api_settings_history() {
        let before = populated();
        assert!(before.can_download());

        let mut state = before.clone();
        reduce(&mut state, Action::ResetAll);

        assert_eq!(state.api_status, ApiStatus::Online);
        assert_eq!(state.settings, before.settings);
        assert_eq!(state.history, before.history);
        assert_eq!(
            state,
            State {
                api_status: ApiStatus::Online,
                settings: before.settings.clone(),
                history: before.history.clone(),
                ..State::default()
            }
        );
    }

    #[test]
    fn test_reset_process_clears_process_fields_only() {
        let mut state = populated();
        reduce(
            &mut state,
            Action::SetLoading {
                is_loading: true,
                message: Some("Processando".to_string()),
            },
        );
        reduce(&mut state, Action::ResetProcess);

        assert_eq!(state.process_id, None);
        assert_eq!(state.uploaded_file, None);
        assert_eq!(state.validation, None);
        assert_eq!(state.statistics, None);
        assert_eq!(state.ranking, None);
        assert_eq!(state.status, ProcessStatus::Idle);
        assert_eq!(state.progress, 0);
        assert_eq!(state.error, None);
        assert!(state.warnings.is_empty());
        assert!(!state.can_download());

        assert!(state.loading.is_loading);
        assert_eq!(state.api_status, ApiStatus::Online);
        assert_eq!(state.settings.theme, Theme::Dark);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_begin_upload_discards_previous_process() {
        let mut state = populated();
        reduce(&mut state, Action::BeginUpload(file()));

        assert_eq!(state.uploaded_file, Some(file()));
        assert_eq!(state.status, ProcessStatus::Idle);
        assert_eq!(state.error, None);
        assert!(!state.has_current_process());
    }

    #[test]
    fn test_invalid_transition_is_ignored() {
        let mut state = State::default();
        reduce(&mut state, Action::AdvanceStatus(StatusEvent::ProcessingSucceeded));
        assert_eq!(state.status, ProcessStatus::Idle);
    }

    #[test]
    fn test_set_error_stops_loading() {
        let mut state = State::default();
        reduce(
            &mut state,
            Action::SetLoading {
                is_loading: true,
                message: None,
            },
        );
        reduce(&mut state, Action::SetCurrentProcess("p".to_string()));
        assert!(state.is_processing());

        reduce(&mut state, Action::SetError("boom".to_string()));
        assert!(!state.loading.is_loading);
        assert!(!state.is_processing());

        reduce(&mut state, Action::ClearError);
        assert_eq!(state.error, None);
    }
}
