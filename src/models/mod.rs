pub mod api;
pub mod file;
pub mod process;
pub mod settings;

pub use api::{
    ClearResponse, DetectedStructure, DocumentDescriptor, DocumentInventory, GeneralStatistics,
    HealthResponse, ProcessingResult, RankingResponse, Statistics, StudentResult,
    SubjectStatistics, UploadResponse, ValidationResult,
};
pub use file::{FileMeta, SpreadsheetFile};
pub use process::{ApiStatus, InvalidTransition, ProcessStatus, StatusEvent};
pub use settings::{HistoryEntry, HistorySummary, Settings, SettingsPatch, Theme};
