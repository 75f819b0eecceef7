//! Thành phần giao diện hiển thị kết quả trích xuất đơn thuốc.
//!
//! Các document được dựng bằng component `yew`; ngoài trình duyệt, chuỗi HTML
//! được tạo qua `ServerRenderer`.

mod styles;

use prescription_core::{
    ExtractionResult, Medication, PatientInfo, PrescriptionError, RefillNotes,
};
use serde::{Deserialize, Serialize};
use yew::prelude::*;
use yew::html::BaseComponent;
use yew::ServerRenderer;

pub use styles::{style_tag, DEFAULT_STYLES};

const MISSING: &str = "N/A";
const UNKNOWN_MEDICATION: &str = "Unknown Medication";
const REFILL_NOTICE: &str = "Please contact your doctor or clinic to request a refill. Refills are not available online for this prescription.";

/// Cấu hình hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderConfig {
    /// Hiện lời nhắc liên hệ phòng khám trong mục tái cấp.
    pub refill_notice: bool,
    /// Nhúng thẻ `<style>` mặc định vào đầu tài liệu.
    pub embed_styles: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            refill_notice: true,
            embed_styles: false,
        }
    }
}

/// Loại tài liệu đã dựng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Normal,
    Diagnostic,
    Failure,
}

/// Tài liệu HTML sẵn sàng cho lớp hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub kind: DocumentKind,
    pub html: String,
}

/// Props của [`PrescriptionView`].
#[derive(Properties, PartialEq)]
pub struct PrescriptionViewProps {
    pub result: ExtractionResult,
    pub raw_text: String,
    pub config: RenderConfig,
}

#[derive(Properties, PartialEq)]
struct DiagnosticProps {
    result: ExtractionResult,
    raw_text: String,
}

#[derive(Properties, PartialEq)]
struct FailureProps {
    message: String,
}

/// Render with [`RenderConfig::default`].
pub async fn render(result: &ExtractionResult, raw_text: &str) -> Document {
    render_with(result, raw_text, &RenderConfig::default()).await
}

/// Normal three-section document, or the diagnostic document when nothing was extracted.
pub async fn render_with(
    result: &ExtractionResult,
    raw_text: &str,
    config: &RenderConfig,
) -> Document {
    let (kind, body) = if result.is_empty() {
        tracing::debug!("nothing extracted, rendering diagnostic document");
        let props = DiagnosticProps {
            result: result.clone(),
            raw_text: raw_text.to_string(),
        };
        (
            DocumentKind::Diagnostic,
            render_to_string::<DiagnosticDocument>(props).await,
        )
    } else {
        let props = PrescriptionViewProps {
            result: result.clone(),
            raw_text: raw_text.to_string(),
            config: config.clone(),
        };
        (
            DocumentKind::Normal,
            render_to_string::<NormalDocument>(props).await,
        )
    };

    Document {
        kind,
        html: with_styles(body, config),
    }
}

/// Document shown when the upstream call itself failed. Only the stable message is shown.
pub async fn render_failure(error: &PrescriptionError, config: &RenderConfig) -> Document {
    tracing::warn!(detail = ?error.detail(), "rendering failure document");
    let props = FailureProps {
        message: error.to_string(),
    };
    let body = render_to_string::<FailureDocument>(props).await;

    Document {
        kind: DocumentKind::Failure,
        html: with_styles(body, config),
    }
}

async fn render_to_string<C>(props: C::Properties) -> String
where
    C: BaseComponent,
    C::Properties: Send + 'static,
{
    ServerRenderer::<C>::with_props(move || props)
        .hydratable(false)
        .render()
        .await
}

fn with_styles(body: String, config: &RenderConfig) -> String {
    if config.embed_styles {
        format!("{}{body}", style_tag())
    } else {
        body
    }
}

/// Chọn document thường hoặc document chẩn đoán theo kết quả.
#[function_component(PrescriptionView)]
pub fn prescription_view(props: &PrescriptionViewProps) -> Html {
    if props.result.is_empty() {
        html! { <DiagnosticDocument result={props.result.clone()} raw_text={props.raw_text.clone()} /> }
    } else {
        html! {
            <NormalDocument
                result={props.result.clone()}
                raw_text={props.raw_text.clone()}
                config={props.config.clone()}
            />
        }
    }
}

#[function_component(NormalDocument)]
fn normal_document(props: &PrescriptionViewProps) -> Html {
    let result = &props.result;

    html! {
        <div class="rx-document">
            { render_patient(&result.patient) }
            { render_medications(&result.medications) }
            { render_refill(&result.refill, &props.config) }
        </div>
    }
}

#[function_component(DiagnosticDocument)]
fn diagnostic_document(props: &DiagnosticProps) -> Html {
    let located = prescription_text::locate_section(&props.raw_text).to_string();
    let findings = [
        ("Patient Info Found:", json_dump(&props.result.patient)),
        ("Medications Found:", json_dump(&props.result.medications)),
        ("Other Notes Found:", json_dump(&props.result.refill)),
    ];

    html! {
        <div class="rx-document rx-diagnostic">
            <section class="rx-card">
                <h3>{"Parsing Failed - Debug Information"}</h3>
                <p>{"Could not extract prescription details. Here's the raw data for debugging:"}</p>
                <details>
                    <summary>{"Original Response"}</summary>
                    <pre>{ props.raw_text.clone() }</pre>
                </details>
                <details>
                    <summary>{"Cleaned Text"}</summary>
                    <pre>{ located }</pre>
                </details>
                <details>
                    <summary>{"Parsing Results"}</summary>
                    {
                        for findings.into_iter().map(|(label, dump)| html! {
                            <>
                                <p><strong>{ label }</strong></p>
                                <pre>{ dump }</pre>
                            </>
                        })
                    }
                </details>
            </section>
        </div>
    }
}

#[function_component(FailureDocument)]
fn failure_document(props: &FailureProps) -> Html {
    html! {
        <div class="rx-document">
            <p class="rx-error">{ format!("Error: {}", props.message) }</p>
        </div>
    }
}

fn render_patient(patient: &PatientInfo) -> Html {
    let body = if patient.is_empty() {
        render_empty_note("No patient information found in the prescription.")
    } else {
        let fields = [
            ("Name", &patient.name),
            ("Doctor", &patient.doctor),
            ("Clinic", &patient.clinic),
            ("Address", &patient.address),
            ("Date Issued", &patient.date),
        ];
        html! {
            <dl class="rx-grid">
                { for fields.into_iter().map(|(label, value)| render_field(label, value.as_deref(), None)) }
            </dl>
        }
    };

    html! {
        <section class="rx-card rx-patient">
            <h3>{"Patient Information"}</h3>
            { body }
        </section>
    }
}

fn render_medications(medications: &[Medication]) -> Html {
    html! {
        <section class="rx-card rx-medications">
            <h3>{"Medication Details"}</h3>
            {
                if medications.is_empty() {
                    render_empty_note("No medications found in the prescription text.")
                } else {
                    html! { for medications.iter().map(render_medication) }
                }
            }
        </section>
    }
}

fn render_medication(medication: &Medication) -> Html {
    let name = if medication.name.trim().is_empty() {
        UNKNOWN_MEDICATION.to_string()
    } else {
        medication.name.clone()
    };

    html! {
        <article class="rx-medication">
            <h4>{ name }</h4>
            <dl class="rx-grid">
                { render_field("Dosage", medication.dosage.as_deref(), None) }
                { render_field("Frequency", medication.frequency.as_deref(), Some("rx-frequency")) }
                {
                    medication
                        .duration
                        .as_deref()
                        .map(|duration| render_field("Duration", Some(duration), None))
                        .unwrap_or_default()
                }
                {
                    medication
                        .instructions
                        .as_deref()
                        .map(render_instructions)
                        .unwrap_or_default()
                }
            </dl>
        </article>
    }
}

fn render_instructions(instructions: &str) -> Html {
    html! {
        <div class="rx-field is-wide">
            <dt>{"Instructions:"}</dt>
            <dd>{ instructions.to_string() }</dd>
        </div>
    }
}

fn render_refill(refill: &RefillNotes, config: &RenderConfig) -> Html {
    let body = if refill.is_empty() {
        render_empty_note("No refill information found in the prescription.")
    } else {
        html! {
            <>
                <dl class="rx-grid">
                    { render_field("Refills", refill.refills.as_deref(), None) }
                    { render_field("Label", refill.label.as_deref(), None) }
                </dl>
                {
                    if config.refill_notice {
                        html! { <p class="rx-notice">{ REFILL_NOTICE }</p> }
                    } else {
                        Html::default()
                    }
                }
            </>
        }
    };

    html! {
        <section class="rx-card rx-refill">
            <h3>{"Refill Information"}</h3>
            { body }
        </section>
    }
}

fn render_field(label: &str, value: Option<&str>, value_class: Option<&'static str>) -> Html {
    let value = value.unwrap_or(MISSING).to_string();
    html! {
        <div class="rx-field">
            <dt>{ format!("{label}:") }</dt>
            <dd class={classes!(value_class)}>{ value }</dd>
        </div>
    }
}

fn render_empty_note(text: &'static str) -> Html {
    html! { <p class="rx-empty">{ text }</p> }
}

fn json_dump<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use prescription_core::ExtractorConfig;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document as DomDocument, Element, Window};

    use crate::{styles, PrescriptionView, PrescriptionViewProps, RenderConfig};

    /// Trích xuất văn bản thô và gắn component đơn thuốc vào phần tử theo selector.
    #[wasm_bindgen]
    pub fn mount_prescription(selector: &str, raw_text: &str) -> Result<(), JsValue> {
        let window: Window =
            web_sys::window().ok_or_else(|| JsValue::from_str("Không có window"))?;
        let document: DomDocument = window
            .document()
            .ok_or_else(|| JsValue::from_str("Không truy cập được document"))?;

        styles::ensure_styles(&document)?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Selector lỗi: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("Không tìm thấy element theo selector"))?;

        let report = prescription_text::extract(raw_text, &ExtractorConfig::default());
        let props = PrescriptionViewProps {
            result: report.result,
            raw_text: raw_text.to_string(),
            config: RenderConfig::default(),
        };

        yew::Renderer::<PrescriptionView>::with_root_and_props(target, props).render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_prescription;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_prescription(_: &str, _: &str) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "prescription-ui chỉ hỗ trợ gắn DOM trên target wasm32",
    ))
}
