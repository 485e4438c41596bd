use std::borrow::Cow;

/// Escapes text for HTML element content and double-quoted attributes.
///
/// Control characters are stripped first, then `<`, `>`, `&`, `'` and `"`
/// are replaced by entities.
///
/// # Examples
///
/// ```
/// use matome::util::escape_html;
///
/// assert_eq!(escape_html("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(s: &str) -> Cow<'_, str> {
    match strip_control_chars(s) {
        Cow::Borrowed(clean) => quick_xml::escape::escape(clean),
        Cow::Owned(clean) => Cow::Owned(quick_xml::escape::escape(clean.as_str()).into_owned()),
    }
}

/// Makes serialized JSON safe to embed inside a `<script>` element.
///
/// `<`, `>` and `&` can only occur inside JSON strings, where their `\u`
/// escapes are equivalent, so the document still parses to the same value
/// while `</script>` can no longer terminate the element early.
pub fn script_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip characters that are not allowed in XML 1.0 documents.
///
/// Provider text goes into RSS, sitemaps and HTML; a stray control byte in a
/// scraped title would otherwise make the whole feed malformed.
///
/// Strips ASCII control chars 0x00-0x08, 0x0B-0x0C, 0x0E-0x1F and 0x7F.
/// Preserves: tab (0x09), newline (0x0A), carriage return (0x0D).
///
/// Returns `Cow::Borrowed` when the input contains no control characters (common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_stripped(c: char) -> bool {
        c == '\u{7f}' || (c < '\u{20}' && c != '\t' && c != '\n' && c != '\r')
    }

    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().filter(|&c| !is_stripped(c)).collect())
}
