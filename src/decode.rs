//! Content-part decoding: base64 transport encoding plus charset conversion.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::warn;

use crate::error::{Result, TriageError};

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Gmail's alphabet for `body.data`.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);

/// Decode a base64 content blob and convert it to text using `charset`.
///
/// Fails only when the blob is not base64. Charset problems degrade to
/// lossy UTF-8 instead.
pub fn decode_body(data: &str, charset: &str) -> Result<String> {
    let bytes = decode_base64(data)?;
    Ok(decode_charset(charset, &bytes))
}

/// Decode base64 in either the URL-safe or the standard alphabet.
///
/// Padding is optional and ASCII whitespace is ignored.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match URL_SAFE_LENIENT.decode(&cleaned) {
        Ok(bytes) => Ok(bytes),
        Err(url_err) => STANDARD_LENIENT
            .decode(&cleaned)
            .map_err(|_| TriageError::Decode(url_err.to_string())),
    }
}

/// Decode bytes using a named charset.
pub fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let charset_lower = charset.trim().to_lowercase();
    match charset_lower.as_str() {
        "" | "utf-8" | "utf8" | "us-ascii" => String::from_utf8_lossy(bytes).into_owned(),
        _ => {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset_lower.as_bytes()) {
                let (decoded, _, _) = encoding.decode(bytes);
                decoded.into_owned()
            } else {
                warn!(
                    charset = charset,
                    "Unknown charset, falling back to UTF-8 lossy"
                );
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}

/// Extract the `charset` parameter from a `Content-Type` header value.
///
/// `text/plain; charset="ISO-8859-1"` yields `Some("ISO-8859-1")`.
pub fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (name, val) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let val = val.trim().trim_matches('"').trim();
        (!val.is_empty()).then(|| val.to_string())
    })
}
