//! 文件预检 - 业务能力层
//!
//! 上传前在本地检查文件，不发出任何网络请求

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::models::FileMeta;

/// `.xlsx`
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// `.xls`
pub const XLS_MIME: &str = "application/vnd.ms-excel";

/// 允许的 MIME 类型
pub const ALLOWED_MIME_TYPES: [&str; 2] = [XLSX_MIME, XLS_MIME];

/// 文件大小上限：200 MiB
pub const MAX_FILE_SIZE: u64 = 200 * 1024 * 1024;

/// 预检结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl FileValidation {
    /// 转换为 `Result`，有错误时返回 `ValidationError`
    pub fn into_result(self) -> Result<Vec<String>, ValidationError> {
        if self.is_valid {
            Ok(self.warnings)
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

fn extension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\.(xlsx|xls)$").expect("合法的正则表达式"))
}

/// 预检文件
///
/// 所有规则都会执行，不会在第一个错误处停止：
/// 1. MIME 类型必须是 Excel → 否则为错误
/// 2. 大小不超过 200 MiB → 否则为错误
/// 3. 扩展名为 `.xlsx` / `.xls`（不区分大小写）→ 否则为警告
pub fn validate(file: &FileMeta) -> FileValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        errors.push("文件类型无效，请上传 Excel 文件 (.xlsx 或 .xls)".to_string());
    }

    if file.size > MAX_FILE_SIZE {
        errors.push(format!(
            "文件过大 ({:.1} MB)，最大允许 200 MB",
            file.size as f64 / (1024.0 * 1024.0)
        ));
    }

    if !extension_pattern().is_match(&file.name) {
        warnings.push("文件扩展名不是 .xlsx 或 .xls".to_string());
    }

    FileValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, mime: &str, size: u64) -> FileMeta {
        FileMeta {
            name: name.to_string(),
            mime_type: mime.to_string(),
            size,
        }
    }

    #[test]
    fn test_valid_xlsx() {
        let result = validate(&meta("gabarito.xlsx", XLSX_MIME, 50 * 1024 * 1024));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_valid_xls_uppercase_extension() {
        let result = validate(&meta("SIMULADO.XLS", XLS_MIME, 1024));
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_disallowed_mime_is_error_only() {
        let result = validate(&meta("notas.xlsx", "text/csv", 10));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate(&meta("a.xlsx", XLSX_MIME, MAX_FILE_SIZE)).is_valid);

        let result = validate(&meta("a.xlsx", XLSX_MIME, MAX_FILE_SIZE + 1));
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("200 MB"));
    }

    #[test]
    fn test_all_rules_run() {
        let result = validate(&meta("notas.csv", "text/csv", MAX_FILE_SIZE * 2));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_extension_mismatch_is_warning() {
        let result = validate(&meta("export.xlsx.bak", XLSX_MIME, 10));
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_into_result() {
        let ok = validate(&meta("x.dat", XLSX_MIME, 1)).into_result().unwrap();
        assert_eq!(ok.len(), 1);

        let err = validate(&meta("x.xlsx", "image/png", 1))
            .into_result()
            .unwrap_err();
        assert_eq!(err.errors.len(), 1);
    }
}
