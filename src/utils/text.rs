//! Report text normalization.
//!
//! Diagnostic tools export HTML tables; the extractor works on lines, so rows become
//! lines and cells become space separated. This is not an HTML parser.

use regex::Regex;
use std::sync::OnceLock;

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<(script|style)\b.*?</(script|style)\s*>").expect("valid regex"))
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(tr|p|div|li|h[1-6]|table|thead|tbody|section|ul|ol)\s*>")
            .expect("valid regex")
    })
}

fn cell_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</(td|th)\s*>").expect("valid regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"))
}

/// 將原始報告轉為逐行的純文字
pub fn normalize_report(raw: &str, is_html: bool) -> String {
    let text = if is_html {
        strip_html(raw)
    } else {
        raw.replace("\r\n", "\n")
    };

    let mut lines = Vec::new();
    let mut previous_blank = true;
    for line in text.lines() {
        let collapsed = spaces_re().replace_all(line, " ");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(trimmed.to_string());
            previous_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

fn strip_html(raw: &str) -> String {
    let without_scripts = script_style_re().replace_all(raw, "");
    // 原始換行不代表結構，先攤平
    let flattened = without_scripts.replace(['\r', '\n'], " ");
    let with_breaks = line_break_re().replace_all(&flattened, "\n");
    let with_cells = cell_break_re().replace_all(&with_breaks, " ");
    let without_tags = tag_re().replace_all(&with_cells, "");
    decode_entities(&without_tags)
}

fn decode_entities(text: &str) -> String {
    // &amp; 最後處理，避免二次解碼
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#174;", "®")
        .replace("&reg;", "®")
        .replace("&trade;", "™")
        .replace("&amp;", "&")
}
