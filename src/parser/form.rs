//! `application/x-www-form-urlencoded` decoding for query strings and bodies.

use std::collections::HashMap;

use url::form_urlencoded;

/// Multi-valued parameters; repeated names keep their values in encounter order.
pub type Params = HashMap<String, Vec<String>>;

/// The media type whose bodies are decoded into body parameters.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decode a query string such as `a=1&b=x+y&a=%32`.
pub fn decode_str(input: &str) -> Params {
    decode_bytes(input.as_bytes())
}

/// Decode form-encoded bytes. `+` becomes a space, percent escapes are
/// decoded, and a pair without `=` is a name with an empty value.
pub fn decode_bytes(input: &[u8]) -> Params {
    let mut params = Params::new();
    for (name, value) in form_urlencoded::parse(input) {
        params
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}
