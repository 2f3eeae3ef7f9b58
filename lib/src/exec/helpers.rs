use once_cell::sync::Lazy;

use crate::escape::HTML_ESCAPER;
use crate::exec::Methods;
use crate::util::escape_html;
use crate::value::Value;

static HELPERS: Lazy<Methods> = Lazy::new(|| {
    Methods::new()
        .with(HTML_ESCAPER, |value: Value| escape_html(&value.to_string()).into_owned())
});

/// The receiver's built-in helpers: the escaping functions the escaper
/// appends to actions.
pub fn helpers() -> &'static Methods {
    &HELPERS
}
