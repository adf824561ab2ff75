//! 二进制下载落盘
//!
//! 先写入同目录下的临时文件，成功后再改名；失败时删除临时文件，不留下半个文件。

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::AppResult;

/// 模板文件名
pub const TEMPLATE_FILE_NAME: &str = "template_simulado_acafe.xlsx";

/// 单个学生报告的文件名：`Boletim_<姓名>.pdf`，连续空白替换为 `_`
pub fn student_document_name(student_name: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("合法的正则表达式"));
    format!("Boletim_{}.pdf", re.replace_all(student_name.trim(), "_"))
}

/// 全部报告压缩包的文件名：`boletins_simulado_<流程ID前8位>.zip`
pub fn archive_name(process_id: &str) -> String {
    let prefix: String = process_id.chars().take(8).collect();
    format!("boletins_simulado_{}.zip", prefix)
}

/// 下载文件写入器
#[derive(Debug, Clone)]
pub struct BlobSink {
    dir: PathBuf,
}

impl BlobSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 写入文件，返回最终路径
    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let safe_name = file_name.replace(['/', '\\'], "_");
        let target = self.dir.join(&safe_name);
        let temp = self.dir.join(format!(".{}.part", safe_name));

        debug!("写入下载文件: {} ({} 字节)", target.display(), bytes.len());

        if let Err(e) = fs::write(&temp, bytes).await {
            self.discard(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            self.discard(&temp).await;
            return Err(e.into());
        }

        Ok(target)
    }

    async fn discard(&self, temp: &Path) {
        if let Err(e) = fs::remove_file(temp).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("⚠️ 无法删除临时文件 {}: {}", temp.display(), e);
            }
        }
    }
}
