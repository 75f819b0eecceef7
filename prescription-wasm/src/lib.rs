//! Bridge WASM <-> JavaScript cho lớp hiển thị đơn thuốc.

use prescription_core::{ExtractionReport, ExtractorConfig, PrescriptionError};
use prescription_ui::{DocumentKind, RenderConfig};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
struct JsPipelineConfig {
    #[serde(default)]
    fallback_enabled: Option<bool>,
    #[serde(default)]
    normalize_frequency: Option<bool>,
    #[serde(default)]
    correct_medication_names: Option<bool>,
    #[serde(default)]
    refill_notice: Option<bool>,
    #[serde(default)]
    embed_styles: Option<bool>,
}

impl From<JsPipelineConfig> for (ExtractorConfig, RenderConfig) {
    fn from(cfg: JsPipelineConfig) -> Self {
        let mut extractor = ExtractorConfig::default();
        if let Some(enabled) = cfg.fallback_enabled {
            extractor.fallback_enabled = enabled;
        }
        if let Some(enabled) = cfg.normalize_frequency {
            extractor.normalize_frequency = enabled;
        }
        if let Some(enabled) = cfg.correct_medication_names {
            extractor.correct_medication_names = enabled;
        }

        let mut render = RenderConfig::default();
        if let Some(enabled) = cfg.refill_notice {
            render.refill_notice = enabled;
        }
        if let Some(enabled) = cfg.embed_styles {
            render.embed_styles = enabled;
        }

        (extractor, render)
    }
}

/// Kết quả trả về cho JavaScript.
#[derive(Debug, Serialize)]
struct FormattedPrescription {
    kind: DocumentKind,
    html: String,
    report: ExtractionReport,
}

#[wasm_bindgen]
pub async fn format_prescription(
    raw_text: String,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = match config {
        Some(js_cfg) => read_config(js_cfg).map_err(|err| JsValue::from_str(&err.to_string()))?,
        None => JsPipelineConfig::default(),
    };

    let formatted = format_with(&raw_text, cfg).await;

    to_value(&formatted)
        .map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

/// Prompt mà lớp gọi mạng cần gửi kèm ảnh.
#[wasm_bindgen]
pub fn extraction_prompt() -> String {
    prescription_text::prompt::EXTRACTION_PROMPT.to_string()
}

/// HTML hiển thị khi gọi dịch vụ phân tích ảnh thất bại; `detail` chỉ được ghi log.
#[wasm_bindgen]
pub async fn format_upstream_failure(detail: String) -> String {
    let error = PrescriptionError::Upstream(detail);
    prescription_ui::render_failure(&error, &RenderConfig::default())
        .await
        .html
}

fn read_config(js_cfg: JsValue) -> Result<JsPipelineConfig, PrescriptionError> {
    from_value::<JsPipelineConfig>(js_cfg)
        .map_err(|err| PrescriptionError::Config(err.to_string()))
}

async fn format_with(raw_text: &str, cfg: JsPipelineConfig) -> FormattedPrescription {
    let (extractor, render): (ExtractorConfig, RenderConfig) = cfg.into();
    let report = prescription_text::extract(raw_text, &extractor);
    let document = prescription_ui::render_with(&report.result, raw_text, &render).await;

    FormattedPrescription {
        kind: document.kind,
        html: document.html,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_overrides_defaults() {
        let cfg: JsPipelineConfig =
            serde_json::from_str(r#"{ "fallback_enabled": false, "embed_styles": true }"#).unwrap();
        let (extractor, render): (ExtractorConfig, RenderConfig) = cfg.into();

        assert!(!extractor.fallback_enabled);
        assert!(extractor.normalize_frequency);
        assert!(render.embed_styles);
        assert!(render.refill_notice);
    }

    #[tokio::test]
    async fn formats_well_formed_text() {
        let raw = "Patient Name: Ada\nMedication(s):\nMedication 1:\n* Name: Cetirizine\n* Frequency: HS";
        let formatted = format_with(raw, JsPipelineConfig::default()).await;

        assert_eq!(formatted.kind, DocumentKind::Normal);
        assert!(formatted.html.contains("Cetirizine"));
        assert!(formatted.html.contains("At bedtime"));
        assert_eq!(formatted.report.result.medications.len(), 1);
    }

    #[tokio::test]
    async fn sentinel_formats_as_diagnostic() {
        let formatted = format_with(
            prescription_text::prompt::NOT_A_PRESCRIPTION,
            JsPipelineConfig::default(),
        )
        .await;
        assert_eq!(formatted.kind, DocumentKind::Diagnostic);
        assert!(formatted.report.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_hides_detail() {
        let html = format_upstream_failure("401 Unauthorized: bad key".to_string()).await;
        assert!(html.contains("Failed to analyze prescription from API."));
        assert!(!html.contains("bad key"));
    }
}
