use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    /// Some byte sequences were invalid and replaced with U+FFFD.
    pub had_errors: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown character encoding {0:?}")]
    UnknownEncoding(String),
}

/// Resolve a WHATWG encoding label such as `"utf-8"` or `"shift_jis"`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, DecodeError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))
}

/// Decode with a fixed encoding, ignoring whatever the server or the page
/// declares. A BOM of that same encoding is stripped; malformed sequences are
/// replaced rather than rejected.
pub fn decode_forced(bytes: &[u8], encoding: &'static Encoding) -> DecodedHtml {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: encoding.name().to_string(),
        had_errors,
    }
}
