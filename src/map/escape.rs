//! Escaping of untrusted spreadsheet text before it is embedded in markup.

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape free text and turn its line breaks into `<br>`.
pub fn escape_multiline(text: &str) -> String {
    text.lines()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Make serialized JSON safe to inline in a `<script>` element: no `</script>`,
/// no `<!--`, and no raw line separators, which JavaScript treats as newlines.
pub fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>'"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;&#39;"
        );
        assert_eq!(escape_html("杜少卿"), "杜少卿");
    }

    #[test]
    fn line_breaks_become_br_after_escaping() {
        assert_eq!(escape_multiline("a<b\r\nc"), "a&lt;b<br>c");
        assert_eq!(escape_multiline(""), "");
    }

    #[test]
    fn script_json_cannot_close_the_element() {
        let json = serde_json::to_string("</script><script>evil()</script>").unwrap();
        let safe = escape_script_json(&json);
        assert!(!safe.contains("</script>"));
        let back: String = serde_json::from_str(&safe).unwrap();
        assert_eq!(back, "</script><script>evil()</script>");
    }
}
