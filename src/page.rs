//! Read-only probes against the current page. All of them degrade to a
//! negative answer on any evaluation failure; a flaky probe must never abort
//! a flow on its own.

use headless_chrome::Tab;

/// Whether the given text currently appears in the rendered page.
/// `innerText` only reflects rendered content, so hidden markup does not
/// count.
pub fn text_visible(tab: &Tab, needle: &str) -> bool {
    let literal = serde_json::to_string(needle).unwrap_or_default();
    let script = format!("document.body ? document.body.innerText.includes({literal}) : false");
    tab.evaluate(&script, false)
        .ok()
        .and_then(|r| r.value)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Combined text of any visible toast/alert containers, if present.
pub fn alert_text(tab: &Tab) -> Option<String> {
    const SCRIPT: &str = r#"
        (() => {
            const nodes = document.querySelectorAll(
                ".toast-error, .alert-danger, [role='alert'], .text-destructive"
            );
            const out = [];
            for (const n of nodes) {
                const t = (n.innerText || '').trim();
                if (t) out.push(t);
            }
            return out.join('\n');
        })()
    "#;

    let text = tab
        .evaluate(SCRIPT, false)
        .ok()
        .and_then(|r| r.value)
        .and_then(|v| v.as_str().map(|s| s.to_string()))?;

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
