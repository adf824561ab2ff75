//! 流程上下文
//!
//! 封装"我正在处理哪份文件、这次处理是否已被取消"这一信息

use std::fmt::Display;

use tokio_util::sync::CancellationToken;

use crate::models::FileMeta;

/// 单次处理的上下文
#[derive(Debug, Clone)]
pub struct ProcessCtx {
    /// 运行编号（仅用于日志显示）
    pub run: u64,

    /// 被处理的文件
    pub file: FileMeta,

    /// 取消后不再发出请求，也不再调用任何回调
    pub cancel: CancellationToken,
}

impl ProcessCtx {
    pub fn new(run: u64, file: FileMeta) -> Self {
        Self {
            run,
            file,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(run: u64, file: FileMeta, cancel: CancellationToken) -> Self {
        Self { run, file, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Display for ProcessCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[运行 #{} 文件 {}]", self.run, self.file.name)
    }
}
