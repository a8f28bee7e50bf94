//! Lenient base32 (RFC 4648) secret codec.
//!
//! Shared secrets travel as text pasted out of QR payloads, setup pages
//! and chat messages, so the decoder accepts input exactly as pasted:
//! lowercase letters, embedded whitespace, missing `=` padding and stray
//! punctuation all decode to the same key. A `=` ends the data; any other
//! character outside `A–Z2–7` is skipped.

/// Decode a base32 string into raw bytes.
///
/// Never fails: malformed input degrades to whatever bytes can be
/// extracted, and empty input yields an empty vector. Callers that need
/// an error on unusable input check for emptiness (see
/// [`core::decode_secret`](crate::otp::core::decode_secret)).
pub fn decode(text: &str) -> Vec<u8> {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    // Secrets are routinely copied without their trailing `=` padding;
    // top the input up to a full 8-character block before decoding.
    let remainder = cleaned.len() % 8;
    if remainder != 0 {
        for _ in remainder..8 {
            cleaned.push('=');
        }
    }

    let mut output = Vec::with_capacity(cleaned.len() * 5 / 8);
    let mut accumulator: u32 = 0;
    let mut bits: u32 = 0;

    for c in cleaned.chars() {
        let value = match c {
            'A'..='Z' => c as u32 - 'A' as u32,
            '2'..='7' => c as u32 - '2' as u32 + 26,
            // Padding marks end-of-data, not an error.
            '=' => break,
            // Lenient: anything else is skipped.
            _ => continue,
        };

        accumulator = (accumulator << 5) | value;
        bits += 5;

        if bits >= 8 {
            output.push((accumulator >> (bits - 8)) as u8);
            bits -= 8;
        }
    }

    output
}

/// Encode raw bytes as base32 (uppercase, no padding).
pub fn encode(bytes: &[u8]) -> String {
    ::base32::encode(::base32::Alphabet::Rfc4648 { padding: false }, bytes)
}
