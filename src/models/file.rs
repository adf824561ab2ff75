use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// 文件元信息（预检只看这些字段，不读取内容）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// 待上传的答题表格
///
/// 内容用 `Arc` 共享，重试上传时不需要复制数据。
#[derive(Debug, Clone)]
pub struct SpreadsheetFile {
    name: String,
    mime_type: String,
    content: Arc<Vec<u8>>,
}

impl SpreadsheetFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: Arc::new(content),
        }
    }

    /// 从磁盘读取文件，MIME 类型根据扩展名推断
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(name, mime_type, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.content)
    }

    pub fn meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
        }
    }
}
