mod macros;
mod deferred;

pub use macros::*;
pub use deferred::*;

use std::borrow::Cow;

/// Returns `true` if `input` is likely to contain a template action.
///
/// ```
/// use quill::util::is_template;
///
/// assert!(is_template("Hello, {{.Name}}!"));
/// assert!(!is_template("Hello, { world }!"));
/// assert!(!is_template("trailing {"));
/// ```
pub fn is_template(input: &str) -> bool {
    memchr::memmem::find(input.as_bytes(), b"{{").is_some()
}

/// Replaces the characters with special meaning in HTML text and attribute
/// values with character references: `&`, `'`, `<`, `>`, `"`, and `\r`.
///
/// Returns the input unchanged and unallocated if nothing needs escaping.
///
/// ```
/// use quill::util::escape_html;
///
/// assert_eq!(escape_html("<b>"), "&lt;b&gt;");
/// assert_eq!(escape_html("Tom & \"Jerry\""), "Tom &amp; &#34;Jerry&#34;");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(input: &str) -> Cow<'_, str> {
    let needs_escape = |b: u8| matches!(b, b'&' | b'\'' | b'<' | b'>' | b'"' | b'\r');
    let Some(first) = input.bytes().position(needs_escape) else {
        return Cow::Borrowed(input);
    };

    let mut output = String::with_capacity(input.len() + 16);
    output.push_str(&input[..first]);
    for ch in input[first..].chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '\'' => output.push_str("&#39;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&#34;"),
            '\r' => output.push_str("&#13;"),
            ch => output.push(ch),
        }
    }

    Cow::Owned(output)
}

/// Converts a byte offset into `source` into a 1-based `(line, column)`
/// pair, counting columns in characters.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let prefix = &source.as_bytes()[..offset];
    let line_start = memchr::memrchr(b'\n', prefix).map_or(0, |i| i + 1);
    let line = memchr::memchr_iter(b'\n', prefix).count() + 1;
    let column = source.get(line_start..offset).map_or(1, |s| s.chars().count() + 1);
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a'b"), "a&#39;b");
        assert_eq!(escape_html("line\r\nnext"), "line&#13;\nnext");
        assert_eq!(escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;");
        assert_eq!(escape_html("ünïcödé & more"), "ünïcödé &amp; more");
        assert!(matches!(escape_html("nothing to do"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_line_column() {
        let source = "first\nsecond {{\nthird";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 3), (1, 4));
        assert_eq!(line_column(source, 6), (2, 1));
        assert_eq!(line_column(source, 13), (2, 8));
        assert_eq!(line_column(source, 16), (3, 1));
        assert_eq!(line_column(source, 1000), (3, 6));
    }
}
