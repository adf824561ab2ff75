//! 流程状态
//!
//! 一次处理的完整生命周期：
//!
//! ```text
//! Idle → Uploading → Uploaded → Processing → Processed → GeneratingDocuments → Ready
//!   └──────────┴──────────┴──────────┴──────────┴──────────────┴──→ Errored
//! ```
//!
//! `Ready` 携带报告清单，因此不存在"就绪但没有报告清单"的状态。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::api::DocumentInventory;

/// 后端可用状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

/// 一次处理的状态
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ProcessStatus {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Processing,
    Processed,
    GeneratingDocuments,
    Ready(DocumentInventory),
    Errored,
}

/// 驱动状态变化的事件
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// 开始上传
    Start,
    UploadSucceeded,
    ProcessingStarted,
    ProcessingSucceeded,
    GenerationStarted,
    GenerationSucceeded(DocumentInventory),
    /// 当前步骤失败
    Failed,
}

/// 非法状态转换
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("非法状态转换: {from} --{event}-->")]
pub struct InvalidTransition {
    pub from: String,
    pub event: String,
}

impl ProcessStatus {
    /// 状态转换函数
    ///
    /// `Start` 可以从 `Idle`、`Ready`、`Errored` 出发（新的上传会丢弃上一次的结果）；
    /// `Failed` 可以从任何非终止状态出发。
    pub fn apply(&self, event: &StatusEvent) -> Result<ProcessStatus, InvalidTransition> {
        use ProcessStatus::*;

        let next = match (self, event) {
            (Idle | Ready(_) | Errored, StatusEvent::Start) => Uploading,
            (Uploading, StatusEvent::UploadSucceeded) => Uploaded,
            (Uploaded, StatusEvent::ProcessingStarted) => Processing,
            (Processing, StatusEvent::ProcessingSucceeded) => Processed,
            (Processed, StatusEvent::GenerationStarted) => GeneratingDocuments,
            (GeneratingDocuments, StatusEvent::GenerationSucceeded(inventory)) => {
                Ready(inventory.clone())
            }
            (status, StatusEvent::Failed) if !status.is_terminal() => Errored,
            _ => {
                return Err(InvalidTransition {
                    from: self.to_string(),
                    event: event.name().to_string(),
                })
            }
        };

        Ok(next)
    }

    /// `Ready` 和 `Errored` 为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessStatus::Ready(_) | ProcessStatus::Errored)
    }

    /// 是否有远程步骤正在进行（包括步骤之间的自动衔接状态）
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ProcessStatus::Idle | ProcessStatus::Ready(_) | ProcessStatus::Errored
        )
    }

    /// 就绪时的报告清单
    pub fn documents(&self) -> Option<&DocumentInventory> {
        match self {
            ProcessStatus::Ready(inventory) => Some(inventory),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProcessStatus::Idle => "Idle",
            ProcessStatus::Uploading => "Uploading",
            ProcessStatus::Uploaded => "Uploaded",
            ProcessStatus::Processing => "Processing",
            ProcessStatus::Processed => "Processed",
            ProcessStatus::GeneratingDocuments => "GeneratingDocuments",
            ProcessStatus::Ready(_) => "Ready",
            ProcessStatus::Errored => "Errored",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl StatusEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StatusEvent::Start => "start",
            StatusEvent::UploadSucceeded => "upload_succeeded",
            StatusEvent::ProcessingStarted => "processing_started",
            StatusEvent::ProcessingSucceeded => "processing_succeeded",
            StatusEvent::GenerationStarted => "generation_started",
            StatusEvent::GenerationSucceeded(_) => "generation_succeeded",
            StatusEvent::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> DocumentInventory {
        DocumentInventory {
            total: 0,
            documents: Vec::new(),
            archive_available: false,
        }
    }

    #[test]
    fn test_happy_path() {
        let events = [
            StatusEvent::Start,
            StatusEvent::UploadSucceeded,
            StatusEvent::ProcessingStarted,
            StatusEvent::ProcessingSucceeded,
            StatusEvent::GenerationStarted,
            StatusEvent::GenerationSucceeded(inventory()),
        ];

        let mut status = ProcessStatus::Idle;
        let mut names = vec![status.name()];
        for event in &events {
            status = status.apply(event).unwrap();
            names.push(status.name());
        }

        assert_eq!(
            names,
            vec![
                "Idle",
                "Uploading",
                "Uploaded",
                "Processing",
                "Processed",
                "GeneratingDocuments",
                "Ready"
            ]
        );
        assert!(status.documents().is_some());
        assert!(status.is_terminal());
    }

    #[test]
    fn test_failed_from_non_terminal_states() {
        for status in [
            ProcessStatus::Idle,
            ProcessStatus::Uploading,
            ProcessStatus::Uploaded,
            ProcessStatus::Processing,
            ProcessStatus::Processed,
            ProcessStatus::GeneratingDocuments,
        ] {
            assert_eq!(
                status.apply(&StatusEvent::Failed).unwrap(),
                ProcessStatus::Errored
            );
        }

        assert!(ProcessStatus::Errored.apply(&StatusEvent::Failed).is_err());
        assert!(ProcessStatus::Ready(inventory())
            .apply(&StatusEvent::Failed)
            .is_err());
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let err = ProcessStatus::Uploading
            .apply(&StatusEvent::ProcessingSucceeded)
            .unwrap_err();
        assert_eq!(err.from, "Uploading");
        assert_eq!(err.event, "processing_succeeded");

        assert!(ProcessStatus::Idle
            .apply(&StatusEvent::GenerationSucceeded(inventory()))
            .is_err());
        assert!(ProcessStatus::Processing.apply(&StatusEvent::Start).is_err());
    }

    #[test]
    fn test_new_upload_after_terminal_state() {
        assert_eq!(
            ProcessStatus::Errored.apply(&StatusEvent::Start).unwrap(),
            ProcessStatus::Uploading
        );
        assert_eq!(
            ProcessStatus::Ready(inventory())
                .apply(&StatusEvent::Start)
                .unwrap(),
            ProcessStatus::Uploading
        );
    }
}
