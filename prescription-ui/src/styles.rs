#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Node};

#[cfg(target_arch = "wasm32")]
const STYLE_TAG_SELECTOR: &str = "style[data-prescription-ui]";

/// Default CSS for the document along with easy-to-override design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --rx-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --rx-card-bg: #374151;
  --rx-card-radius: 0.5rem;
  --rx-card-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);
  --rx-heading: #ffffff;
  --rx-text: #d1d5db;
  --rx-muted: #9ca3af;
  --rx-label: #60a5fa;
  --rx-medication-bg: #4b5563;
  --rx-medication-name: #34d399;
  --rx-medication-label: #c084fc;
  --rx-highlight: #fbbf24;
  --rx-alert-bg: #dc2626;
  --rx-alert-panel: #450a0a;
  --rx-error: #f87171;
}

.rx-document {
  font-family: var(--rx-font-family);
  color: var(--rx-text);
}

.rx-card {
  margin-bottom: 2rem;
  padding: 1.5rem;
  background-color: var(--rx-card-bg);
  border-radius: var(--rx-card-radius);
  box-shadow: var(--rx-card-shadow);
}

.rx-card h3 {
  font-size: 1.25rem;
  font-weight: 600;
  margin: 0 0 1rem;
  color: var(--rx-heading);
}

.rx-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 1rem;
  margin: 0;
}

.rx-field {
  display: flex;
  flex-direction: column;
}

.rx-field dt {
  font-weight: 500;
  color: var(--rx-label);
}

.rx-field dd {
  margin: 0;
}

.rx-field.is-wide {
  grid-column: 1 / -1;
}

.rx-medication {
  background-color: var(--rx-medication-bg);
  padding: 1rem;
  border-radius: var(--rx-card-radius);
  margin-bottom: 1rem;
}

.rx-medication h4 {
  font-size: 1.125rem;
  font-weight: 600;
  color: var(--rx-medication-name);
  margin: 0 0 0.5rem;
}

.rx-medication .rx-field dt {
  color: var(--rx-medication-label);
}

.rx-frequency {
  color: var(--rx-highlight);
}

.rx-empty {
  color: var(--rx-highlight);
}

.rx-notice {
  color: var(--rx-muted);
  margin-top: 1rem;
}

.rx-diagnostic .rx-card {
  background-color: var(--rx-alert-bg);
  color: #ffffff;
}

.rx-diagnostic details {
  margin-bottom: 1rem;
}

.rx-diagnostic summary {
  cursor: pointer;
  font-weight: 600;
  margin-bottom: 0.5rem;
}

.rx-diagnostic pre {
  background-color: var(--rx-alert-panel);
  padding: 1rem;
  border-radius: 0.25rem;
  white-space: pre-wrap;
  word-wrap: break-word;
  font-size: 0.875rem;
  overflow-x: auto;
}

.rx-error {
  color: var(--rx-error);
}
"#;

/// `<style>` element carrying [`DEFAULT_STYLES`], for documents rendered outside the browser.
pub fn style_tag() -> String {
    format!("<style data-prescription-ui=\"v1\">{DEFAULT_STYLES}</style>")
}

#[cfg(target_arch = "wasm32")]
pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document không có thẻ <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-prescription-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
