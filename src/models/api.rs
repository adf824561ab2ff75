//! 后端 HTTP 接口的数据结构
//!
//! 字段名保持后端的命名（葡萄牙语），Rust 侧使用英文字段名。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /health` 返回的存活信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "processos_ativos", default)]
    pub active_processes: Option<u32>,
}

/// 服务端对文件结构的校验结果（上传响应中返回，之后不再变化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "erros", default)]
    pub errors: Vec<String>,
    #[serde(rename = "avisos", default)]
    pub warnings: Vec<String>,
    #[serde(rename = "estrutura_detectada", default)]
    pub detected_structure: DetectedStructure,
}

/// 检测到的表格结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedStructure {
    #[serde(rename = "total_alunos", default)]
    pub participants: u32,
    #[serde(rename = "total_questoes", default)]
    pub items: u32,
    #[serde(rename = "disciplinas", default)]
    pub subjects: Vec<String>,
    #[serde(rename = "colunas_questoes", default)]
    pub item_columns: u32,
}

/// `POST /upload` 的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "processo_id")]
    pub process_id: String,
    #[serde(rename = "validacao")]
    pub validation: ValidationResult,
    #[serde(default)]
    pub preview: Option<serde_json::Value>,
}

/// 单个学生的成绩
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResult {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "sede", default)]
    pub site: Option<String>,
    #[serde(rename = "posicao", default)]
    pub position: u32,
    #[serde(rename = "nota_percentual", default)]
    pub score_percent: f64,
    #[serde(rename = "acertos", default)]
    pub correct: u32,
    #[serde(rename = "total_questoes", default)]
    pub total_items: u32,
    #[serde(rename = "status_performance", default)]
    pub performance: Option<String>,
}

/// 单个科目的统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStatistics {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "media_percentual", default)]
    pub average_percent: f64,
    #[serde(rename = "questoes_total", default)]
    pub total_items: u32,
}

/// 总体统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralStatistics {
    #[serde(rename = "total_alunos", default)]
    pub total_students: u32,
    #[serde(rename = "total_questoes", default)]
    pub total_items: u32,
    #[serde(rename = "media_geral", default)]
    pub average_score: f64,
    #[serde(rename = "nota_maxima", default)]
    pub max_score: f64,
    #[serde(rename = "nota_minima", default)]
    pub min_score: f64,
    #[serde(rename = "desvio_padrao", default)]
    pub std_deviation: f64,
    #[serde(rename = "disciplinas", default)]
    pub subjects: Vec<SubjectStatistics>,
}

/// `GET /estatisticas/{id}` 的响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "gerais", default)]
    pub general: GeneralStatistics,
    #[serde(rename = "distribuicao_notas", default)]
    pub score_distribution: BTreeMap<String, u32>,
    #[serde(default)]
    pub top_3: Vec<StudentResult>,
}

/// `GET /ranking/{id}` 的响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingResponse {
    #[serde(default)]
    pub ranking: Vec<StudentResult>,
}

/// `POST /processar/{id}` 的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    #[serde(rename = "processo_id")]
    pub process_id: String,
    pub status: String,
    #[serde(rename = "estatisticas", default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub ranking: Vec<StudentResult>,
}

/// 已生成的单份报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    #[serde(rename = "aluno_id")]
    pub student_id: String,
    #[serde(rename = "nome_aluno")]
    pub student_name: String,
    #[serde(rename = "nome_arquivo", default)]
    pub file_name: String,
    #[serde(rename = "caminho", default)]
    pub path: String,
    #[serde(rename = "tamanho_bytes", default)]
    pub size_bytes: u64,
}

/// `POST /gerar-pdfs/{id}` 的响应：按顺序排列的报告清单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInventory {
    #[serde(rename = "total_pdfs", default)]
    pub total: u32,
    #[serde(rename = "pdfs", default)]
    pub documents: Vec<DocumentDescriptor>,
    #[serde(rename = "zip_disponivel", default)]
    pub archive_available: bool,
}

impl DocumentInventory {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// 按学生ID查找报告
    pub fn find(&self, student_id: &str) -> Option<&DocumentDescriptor> {
        self.documents.iter().find(|d| d.student_id == student_id)
    }
}

/// `DELETE /limpar/{id}` 的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_response_from_backend_json() {
        let body = json!({
            "processo_id": "6f1c2a90-1111-2222-3333-444455556666",
            "validacao": {
                "valido": true,
                "erros": [],
                "avisos": ["Questão 3 duplicada em Matemática"],
                "estrutura_detectada": {
                    "total_alunos": 42,
                    "total_questoes": 60,
                    "disciplinas": ["Matemática", "Biologia"],
                    "colunas_questoes": 60
                }
            },
            "preview": { "total_alunos": 42 }
        });

        let upload: UploadResponse = serde_json::from_value(body).unwrap();
        assert_eq!(upload.process_id, "6f1c2a90-1111-2222-3333-444455556666");
        assert!(upload.validation.valid);
        assert_eq!(upload.validation.warnings.len(), 1);
        assert_eq!(upload.validation.detected_structure.participants, 42);
        assert_eq!(upload.validation.detected_structure.subjects.len(), 2);
    }

    #[test]
    fn test_empty_detected_structure() {
        let body = json!({
            "valido": false,
            "erros": ["Aba 'GABARITO' não encontrada"],
            "avisos": [],
            "estrutura_detectada": {}
        });

        let validation: ValidationResult = serde_json::from_value(body).unwrap();
        assert!(!validation.valid);
        assert_eq!(validation.detected_structure, DetectedStructure::default());
    }

    #[test]
    fn test_inventory_find() {
        let body = json!({
            "total_pdfs": 2,
            "pdfs": [
                {"aluno_id": "1", "nome_aluno": "Ana Souza", "nome_arquivo": "a.pdf", "caminho": "/tmp/a.pdf", "tamanho_bytes": 1024},
                {"aluno_id": "2", "nome_aluno": "Bruno Lima", "nome_arquivo": "b.pdf", "caminho": "/tmp/b.pdf", "tamanho_bytes": 2048}
            ]
        });

        let inventory: DocumentInventory = serde_json::from_value(body).unwrap();
        assert_eq!(inventory.len(), 2);
        assert!(!inventory.archive_available);
        assert_eq!(inventory.find("2").unwrap().student_name, "Bruno Lima");
        assert!(inventory.find("3").is_none());
    }
}
