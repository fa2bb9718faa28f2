//! JavaScript injected into the page: snapshot capture, hover-listener
//! instrumentation, and the stamp-sheet applier.

use super::Stamp;

/// Walks the live DOM and returns the snapshot tree as a JSON string.
/// Stamps a `data-wg-node` handle on every element so the stamp script can
/// re-locate nodes in one querySelector pass.
pub const CAPTURE_JS: &str = r#"
(() => {
    let nextHandle = 1;

    const capture = (el) => {
        const cs = getComputedStyle(el);
        el.setAttribute('data-wg-node', String(nextHandle++));

        const attrs = {};
        for (const a of el.attributes) attrs[a.name] = a.value;

        const node = {
            tag: el.tagName.toLowerCase(),
            attrs,
            style: {
                display: cs.display,
                visibility: cs.visibility,
                opacity: cs.opacity,
                cursor: cs.cursor,
                pointerEvents: cs.pointerEvents,
            },
            width: el.offsetWidth,
            height: el.offsetHeight,
            disabled: el.disabled === true,
            readOnly: el.readOnly === true,
            value: typeof el.value === 'string' ? el.value : null,
            checked: typeof el.checked === 'boolean' ? el.checked : null,
            selected: typeof el.selected === 'boolean' ? el.selected : null,
            focused: el === document.activeElement,
            selectionStart: null,
            selectionEnd: null,
            selectedIndex: typeof el.selectedIndex === 'number' ? el.selectedIndex : null,
            multiple: el.multiple === true,
            children: [],
        };

        // selectionStart throws on non-text input types
        try {
            if (typeof el.selectionStart === 'number' && typeof el.selectionEnd === 'number') {
                node.selectionStart = el.selectionStart;
                node.selectionEnd = el.selectionEnd;
            }
        } catch (e) {}

        for (const child of el.childNodes) {
            if (child.nodeType === Node.TEXT_NODE) {
                if (child.textContent) node.children.push({ text: child.textContent });
            } else if (child.nodeType === Node.ELEMENT_NODE) {
                node.children.push(capture(child));
            }
        }
        return node;
    };

    return JSON.stringify(capture(document.documentElement));
})()
"#;

/// Patches `addEventListener` so elements gaining a hover-family listener are
/// marked `data-maybe-hoverable`. Best-effort: listeners registered before
/// this runs are missed. Idempotent across navigations within one document.
pub const HOVER_INSTRUMENT_JS: &str = r#"
(() => {
    if (window.__wgHoverPatched) return;
    window.__wgHoverPatched = true;
    const hoverEvents = ['mouseenter', 'mouseover', 'pointerenter'];
    const original = EventTarget.prototype.addEventListener;
    EventTarget.prototype.addEventListener = function (type, listener, options) {
        if (hoverEvents.includes(type) && this instanceof Element) {
            try { this.setAttribute('data-maybe-hoverable', 'true'); } catch (e) {}
        }
        return original.call(this, type, listener, options);
    };
})()
"#;

/// Build the script that mirrors a stamp sheet onto the live page.
pub fn stamp_script(stamps: &[Stamp]) -> String {
    let data = serde_json::to_string(stamps).unwrap_or_else(|_| "[]".into());
    format!(
        r#"(() => {{
    const stamps = {data};
    for (const s of stamps) {{
        const el = document.querySelector('[data-wg-node="' + s.node + '"]');
        if (!el) continue;
        el.setAttribute('data-semantic-id', s.id);
        if (s.clickable) el.setAttribute('data-clickable', 'true');
        if (s.hoverable) el.setAttribute('data-maybe-hoverable', 'true');
    }}
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_script_embeds_sheet_as_json() {
        let stamps = vec![Stamp {
            node: "3".into(),
            id: "add_to_cart".into(),
            clickable: true,
            hoverable: false,
        }];
        let js = stamp_script(&stamps);
        assert!(js.contains("\"node\":\"3\""));
        assert!(js.contains("\"id\":\"add_to_cart\""));
        assert!(js.contains("data-semantic-id"));
    }

    #[test]
    fn stamp_script_with_empty_sheet_is_valid() {
        let js = stamp_script(&[]);
        assert!(js.contains("const stamps = []"));
    }
}
