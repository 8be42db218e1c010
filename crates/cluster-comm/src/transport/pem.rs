//! PEM rendering of DER certificates.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const LINE_WIDTH: usize = 64;

/// Renders a DER certificate as a PEM `CERTIFICATE` block: base64 wrapped at
/// 64 columns, LF line endings, trailing newline.
pub fn der_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 64);

    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % LINE_WIDTH == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    if !encoded.is_empty() {
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}
