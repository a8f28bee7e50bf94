//! `otpauth://` key-URI parsing and generation, per the format the
//! Google Authenticator ecosystem settled on:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! `otpauth://totp/ISSUER:LABEL?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`

use crate::otp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse an `otpauth://` URI into an [`OtpEntry`].
pub fn parse_otpauth_uri(uri: &str) -> Result<OtpEntry, OtpError> {
    let url = url::Url::parse(uri)
        .map_err(|e| OtpError::new(OtpErrorKind::InvalidUri, "not a valid URI").with_detail(e.to_string()))?;

    if url.scheme() != "otpauth" {
        return Err(OtpError::new(
            OtpErrorKind::InvalidUri,
            format!("expected scheme 'otpauth', got '{}'", url.scheme()),
        ));
    }

    let otp_type = match url.host_str() {
        Some("totp") => OtpType::Totp,
        Some("hotp") => OtpType::Hotp,
        other => {
            return Err(OtpError::new(
                OtpErrorKind::InvalidUri,
                format!("unknown OTP type: {:?}", other),
            ))
        }
    };

    let (path_issuer, label) = split_label(url.path());

    let mut entry = OtpEntry::new(label, String::new());
    entry.otp_type = otp_type;
    let mut secret = None;
    let mut param_issuer = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.into_owned()),
            "issuer" => param_issuer = Some(value.into_owned()),
            "algorithm" => {
                if let Some(algorithm) = Algorithm::from_name(&value) {
                    entry.algorithm = algorithm;
                }
            }
            "digits" => match value.parse::<u8>() {
                // Outside the range every authenticator supports: keep the default.
                Ok(d) if (6..=8).contains(&d) => entry.digits = d,
                _ => {}
            },
            "period" => match value.parse::<u32>() {
                Ok(p) if p > 0 => entry.period = p,
                _ => {}
            },
            "counter" => {
                if let Ok(c) = value.parse::<u64>() {
                    entry.counter = c;
                }
            }
            // Unknown parameters are ignored.
            _ => {}
        }
    }

    entry.secret = secret.ok_or_else(|| {
        OtpError::new(OtpErrorKind::InvalidUri, "missing 'secret' parameter")
    })?;

    // The query parameter wins over the path prefix when both are present.
    entry.issuer = param_issuer.or(path_issuer);

    Ok(entry)
}

/// Parse multiple URIs (one per line), skipping blank lines and comments.
pub fn parse_otpauth_uris(text: &str) -> Vec<Result<OtpEntry, OtpError>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_otpauth_uri)
        .collect()
}

/// Split the URI path into optional issuer prefix and label:
/// "/ISSUER:LABEL" or "/LABEL".
fn split_label(path: &str) -> (Option<String>, String) {
    let decoded = percent_decode(path.strip_prefix('/').unwrap_or(path));
    if let Some((issuer, label)) = decoded.split_once(':') {
        return (Some(issuer.trim().to_string()), label.trim().to_string());
    }
    (None, decoded)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Build
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build an `otpauth://` URI for an entry. Parameters matching the
/// RFC defaults are omitted, as provisioning apps expect.
pub fn build_otpauth_uri(entry: &OtpEntry) -> String {
    let label = percent_encode(&entry.label);
    let path = match entry.issuer.as_deref() {
        Some(issuer) if !issuer.is_empty() => {
            format!("{}:{}", percent_encode(issuer), label)
        }
        _ => label,
    };

    let mut params = vec![format!("secret={}", entry.normalised_secret())];
    if let Some(issuer) = entry.issuer.as_deref() {
        params.push(format!("issuer={}", percent_encode(issuer)));
    }
    if entry.algorithm != Algorithm::Sha1 {
        params.push(format!("algorithm={}", entry.algorithm.name()));
    }
    if entry.digits != 6 {
        params.push(format!("digits={}", entry.digits));
    }
    match entry.otp_type {
        OtpType::Totp if entry.period != 30 => params.push(format!("period={}", entry.period)),
        OtpType::Hotp => params.push(format!("counter={}", entry.counter)),
        _ => {}
    }

    format!("otpauth://{}/{}?{}", entry.otp_type, path, params.join("&"))
}

/// Build URIs for multiple entries, one per line.
pub fn build_otpauth_uris(entries: &[OtpEntry]) -> String {
    entries.iter().map(build_otpauth_uri).collect::<Vec<_>>().join("\n")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Percent-encoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn percent_decode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => out.push(byte as char),
                    Err(_) => {
                        out.push('%');
                        out.push_str(&hex);
                    }
                }
            }
            '+' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}
