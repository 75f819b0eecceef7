//! Kiểu dữ liệu lõi cho việc trích xuất đơn thuốc từ văn bản tự do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cấu hình điều chỉnh pipeline trích xuất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Cho phép chạy các chiến lược dự phòng khi bộ phân tích dòng không thấy thuốc nào.
    pub fallback_enabled: bool,
    /// Dịch tần suất viết tắt (BID, q8h...) sang cụm từ dễ đọc.
    pub normalize_frequency: bool,
    /// Sửa lỗi chính tả tên thuốc bằng từ điển tích hợp.
    pub correct_medication_names: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            normalize_frequency: true,
            correct_medication_names: false,
        }
    }
}

/// Thông tin bệnh nhân và nơi kê đơn.
///
/// `None` nghĩa là không tìm thấy nhãn; chuỗi như "Not visible" vẫn là giá trị có mặt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub doctor: Option<String>,
    pub clinic: Option<String>,
    pub address: Option<String>,
    pub date: Option<String>,
}

impl PatientInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.doctor.is_none()
            && self.clinic.is_none()
            && self.address.is_none()
            && self.date.is_none()
    }
}

/// Một thuốc trong đơn. Chỉ được tạo khi đã có tên.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medication {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

impl Medication {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: None,
            frequency: None,
            duration: None,
            instructions: None,
        }
    }
}

/// Ghi chú tái cấp thuốc.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefillNotes {
    pub refills: Option<String>,
    pub label: Option<String>,
}

impl RefillNotes {
    pub fn is_empty(&self) -> bool {
        self.refills.is_none() && self.label.is_none()
    }
}

/// Kết quả trích xuất: ba phần độc lập với nhau.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    pub patient: PatientInfo,
    pub medications: Vec<Medication>,
    pub refill: RefillNotes,
}

impl ExtractionResult {
    pub fn new(patient: PatientInfo, medications: Vec<Medication>, refill: RefillNotes) -> Self {
        Self {
            patient,
            medications,
            refill,
        }
    }

    /// Rỗng khi cả năm trường bệnh nhân, danh sách thuốc và ghi chú tái cấp đều trống.
    pub fn is_empty(&self) -> bool {
        self.patient.is_empty() && self.medications.is_empty() && self.refill.is_empty()
    }
}

/// Chiến lược đã tạo ra danh sách thuốc.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Bộ phân tích theo dòng (chính).
    LineScan,
    /// Quét bộ ba Name/Dosage/Frequency sau tiêu đề "**Medication N:**".
    MarkerTuples,
    /// Tách khối theo tiêu đề "Medication N:".
    BlockSplit,
    /// Không chiến lược nào tìm thấy thuốc.
    #[serde(rename = "none")]
    Unresolved,
}

/// Kết quả tổng hợp của một lần chạy pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionReport {
    pub generated_at: DateTime<Utc>,
    pub strategy: ExtractionStrategy,
    /// Văn bản sau khi định vị phần đơn thuốc và bỏ lời dẫn.
    pub located: String,
    pub result: ExtractionResult,
}

impl ExtractionReport {
    pub fn new(strategy: ExtractionStrategy, located: String, result: ExtractionResult) -> Self {
        Self {
            generated_at: Utc::now(),
            strategy,
            located,
            result,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// Dịch vụ sửa tên thuốc bên ngoài (tùy chọn).
pub trait NameCorrector {
    /// Trả về tên đã sửa, hoặc lỗi nếu tra cứu thất bại.
    fn correct(&self, name: &str) -> Result<String, CorrectionError>;
}

/// Lỗi tra cứu tên thuốc. Luôn được xử lý cục bộ, không bao giờ chặn việc hiển thị.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrectionError {
    /// Tên không khớp mục nào trong nguồn tra cứu.
    #[error("Không có gợi ý cho tên thuốc: {0}")]
    NotFound(String),
    #[error("Tra cứu tên thuốc thất bại: {0}")]
    Lookup(String),
}

/// Thông điệp ổn định hiển thị cho người dùng khi dịch vụ phân tích ảnh lỗi.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to analyze prescription from API.";

/// Lỗi chung của pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PrescriptionError {
    /// Chi tiết chỉ dùng để ghi log, người dùng chỉ thấy thông điệp cố định.
    #[error("Failed to analyze prescription from API.")]
    Upstream(String),
    #[error("Cấu hình không hợp lệ: {0}")]
    Config(String),
    #[error("Lỗi khác: {0}")]
    Other(String),
}

impl PrescriptionError {
    /// Chi tiết kỹ thuật đi kèm (nếu có).
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Upstream(detail) | Self::Config(detail) | Self::Other(detail) => Some(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_result_is_empty() {
        assert!(ExtractionResult::default().is_empty());
    }

    #[test]
    fn any_patient_field_makes_result_non_empty() {
        let result = ExtractionResult {
            patient: PatientInfo {
                date: Some("2024-01-15".to_string()),
                ..PatientInfo::default()
            },
            ..ExtractionResult::default()
        };
        assert!(!result.is_empty());
    }

    #[test]
    fn upstream_error_hides_detail_from_display() {
        let err = PrescriptionError::Upstream("HTTP 503: backend overloaded".to_string());
        assert_eq!(err.to_string(), UPSTREAM_FAILURE_MESSAGE);
        assert_eq!(err.detail(), Some("HTTP 503: backend overloaded"));
    }

    #[test]
    fn strategy_serializes_snake_case() {
        let json = serde_json::to_string(&ExtractionStrategy::MarkerTuples).unwrap();
        assert_eq!(json, "\"marker_tuples\"");
    }

    #[test]
    fn unresolved_strategy_is_none_on_the_wire() {
        let json = serde_json::to_string(&ExtractionStrategy::Unresolved).unwrap();
        assert_eq!(json, "\"none\"");
        let back: ExtractionStrategy = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(back, ExtractionStrategy::Unresolved);
    }

    #[test]
    fn config_error_keeps_detail() {
        let err = PrescriptionError::Config("invalid type: string, expected a boolean".to_string());
        assert!(err.to_string().starts_with("Cấu hình không hợp lệ"));
        assert_eq!(err.detail(), Some("invalid type: string, expected a boolean"));
    }
}
