//! Code generation: RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! Counter derivation, keyed-hash computation, dynamic truncation and
//! decimal formatting, plus drift-window verification and the timing
//! helpers a countdown display needs. Everything here is a pure function
//! of its inputs; no state, no locking, no blocking I/O.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::otp::base32;
use crate::otp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an OTP code for raw key bytes and a counter value.
///
/// The counter is serialised as 8 bytes big-endian per RFC 4226.
/// `digits` must be in `1..=9`.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8, algorithm: Algorithm) -> String {
    let digest = keyed_digest(algorithm, key, &counter.to_be_bytes());
    truncate(&digest, digits)
}

/// HMAC(key, message) with the chosen hash.
fn keyed_digest(algorithm: Algorithm, key: &[u8], message: &[u8]) -> Vec<u8> {
    match algorithm {
        Algorithm::Sha1 => {
            let mut mac =
                Hmac::<Sha1>::new_from_slice(key).expect("HMAC key length is unrestricted");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac =
                Hmac::<Sha256>::new_from_slice(key).expect("HMAC key length is unrestricted");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac =
                Hmac::<Sha512>::new_from_slice(key).expect("HMAC key length is unrestricted");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Dynamic truncation per RFC 4226 §5.3: the low nibble of the last
/// digest byte selects a 4-byte window, read big-endian with the sign
/// bit masked off, reduced modulo `10^digits`.
fn truncate(digest: &[u8], digits: u8) -> String {
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let window = [
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ];
    let code = (u32::from_be_bytes(window) & 0x7fff_ffff) % 10u32.pow(digits as u32);
    format!("{:0width$}", code, width = digits as usize)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOTP (counter-based, RFC 4226)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate an HOTP code from a base-32 encoded secret.
pub fn generate_hotp(
    secret_b32: &str,
    counter: u64,
    digits: u8,
    algorithm: Algorithm,
) -> Result<String, OtpError> {
    let key = decode_secret(secret_b32)?;
    Ok(hotp_raw(&key, counter, digits, algorithm))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP (time-based, RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Current time-step counter.
pub fn time_step(period: u32) -> u64 {
    time_step_at(unix_now(), period)
}

/// Time-step counter for a given unix timestamp. `period` must be
/// non-zero.
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / period as u64
}

/// Seconds until the current time step expires.
pub fn seconds_remaining(period: u32) -> u32 {
    seconds_remaining_at(unix_now(), period)
}

/// Seconds remaining for a specific timestamp.
///
/// Always in `1..=period`: a timestamp exactly on a period edge reports
/// a full fresh period, never 0.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let p = period as u64;
    (p - (unix_seconds % p)) as u32
}

/// Progress fraction (0.0 = fresh code, approaching 1.0 = about to expire).
pub fn progress_fraction(period: u32) -> f64 {
    progress_fraction_at(unix_now(), period)
}

/// Progress fraction for a specific timestamp.
pub fn progress_fraction_at(unix_seconds: u64, period: u32) -> f64 {
    (unix_seconds % period as u64) as f64 / period as f64
}

/// Generate a TOTP code from a base-32 secret, at the current time.
pub fn generate_totp(
    secret_b32: &str,
    digits: u8,
    period: u32,
    algorithm: Algorithm,
) -> Result<String, OtpError> {
    generate_totp_at(secret_b32, digits, period, algorithm, unix_now())
}

/// Generate a TOTP code at an explicit unix timestamp.
pub fn generate_totp_at(
    secret_b32: &str,
    digits: u8,
    period: u32,
    algorithm: Algorithm,
    unix_seconds: u64,
) -> Result<String, OtpError> {
    if period == 0 {
        return Err(OtpError::new(OtpErrorKind::InvalidPeriod, "period must be non-zero"));
    }
    generate_hotp(secret_b32, time_step_at(unix_seconds, period), digits, algorithm)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Entry-level generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate a [`GeneratedCode`] for an entry at the current time.
pub fn generate_code(entry: &OtpEntry) -> Result<GeneratedCode, OtpError> {
    generate_code_at(entry, unix_now())
}

/// Generate a [`GeneratedCode`] at a specific unix timestamp.
pub fn generate_code_at(entry: &OtpEntry, unix_seconds: u64) -> Result<GeneratedCode, OtpError> {
    validate_entry(entry)?;
    let secret = entry.normalised_secret();
    match entry.otp_type {
        OtpType::Totp => {
            let step = time_step_at(unix_seconds, entry.period);
            let code = generate_hotp(&secret, step, entry.digits, entry.algorithm)?;
            Ok(GeneratedCode {
                code,
                remaining_seconds: seconds_remaining_at(unix_seconds, entry.period),
                period: entry.period,
                progress: progress_fraction_at(unix_seconds, entry.period),
                counter: step,
            })
        }
        OtpType::Hotp => {
            let code = generate_hotp(&secret, entry.counter, entry.digits, entry.algorithm)?;
            Ok(GeneratedCode {
                code,
                remaining_seconds: 0,
                period: 0,
                progress: 0.0,
                counter: entry.counter,
            })
        }
    }
}

fn validate_entry(entry: &OtpEntry) -> Result<(), OtpError> {
    if !(1..=9).contains(&entry.digits) {
        return Err(OtpError::new(
            OtpErrorKind::InvalidDigits,
            format!("unsupported digit count: {}", entry.digits),
        ));
    }
    if entry.otp_type == OtpType::Totp && entry.period == 0 {
        return Err(OtpError::new(OtpErrorKind::InvalidPeriod, "period must be non-zero"));
    }
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Verify a submitted code against an entry at the current time.
///
/// `drift_window` is how many time steps (or counters) to accept on
/// either side of the current value; TOTP checks both directions, HOTP
/// only looks ahead.
pub fn verify_code(
    entry: &OtpEntry,
    code: &str,
    drift_window: u32,
) -> Result<VerifyResult, OtpError> {
    verify_code_at(entry, code, drift_window, unix_now())
}

/// Verify at a specific unix timestamp.
pub fn verify_code_at(
    entry: &OtpEntry,
    code: &str,
    drift_window: u32,
    unix_seconds: u64,
) -> Result<VerifyResult, OtpError> {
    validate_entry(entry)?;
    let key = decode_secret(&entry.normalised_secret())?;

    let no_match = VerifyResult {
        valid: false,
        drift: 0,
        matched_counter: None,
    };

    // A code of the wrong shape can never match; skip the HMAC work.
    if code.len() != entry.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(no_match);
    }

    let base = match entry.otp_type {
        OtpType::Totp => time_step_at(unix_seconds, entry.period),
        OtpType::Hotp => entry.counter,
    };
    let start = match entry.otp_type {
        OtpType::Totp => base.saturating_sub(drift_window as u64),
        // Resynchronisation only ever moves an HOTP counter forward.
        OtpType::Hotp => base,
    };

    for candidate in start..=base + drift_window as u64 {
        let expected = hotp_raw(&key, candidate, entry.digits, entry.algorithm);
        if constant_time_eq(expected.as_bytes(), code.as_bytes()) {
            return Ok(VerifyResult {
                valid: true,
                drift: candidate as i64 - base as i64,
                matched_counter: Some(candidate),
            });
        }
    }

    Ok(no_match)
}

/// Constant-time comparison, so verification timing leaks nothing about
/// how many leading digits matched.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a base-32 secret into key bytes.
///
/// Decoding itself is lenient (see [`base32::decode`]); the only error
/// state is input that yields no key material at all: empty input, or
/// input with no valid alphabet characters.
pub fn decode_secret(secret_b32: &str) -> Result<Vec<u8>, OtpError> {
    let key = base32::decode(secret_b32);
    if key.is_empty() {
        return Err(OtpError::new(
            OtpErrorKind::InvalidSecret,
            "secret contains no decodable base32 data",
        ));
    }
    Ok(key)
}

/// Encode raw key bytes as a base-32 secret (uppercase, no padding).
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(bytes)
}

/// Generate a cryptographically random base-32 secret of `byte_length`
/// key bytes (20 for SHA-1 per RFC 4226 §4 R6).
pub fn generate_secret(byte_length: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; byte_length];
    rand::thread_rng().fill_bytes(&mut buf);
    encode_secret(&buf)
}

/// Group a code for display: "123456" → "123 456".
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}

/// Current unix timestamp in whole seconds.
fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Secret "12345678901234567890" (ASCII) in base32, shared by the
    // RFC 4226 Appendix D and RFC 6238 Appendix B vectors.
    const RFC_SECRET_SHA1: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    // ── RFC 4226 Appendix D (HOTP) ───────────────────────────────

    #[test]
    fn rfc4226_hotp_vectors() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314",
            "254676", "287922", "162583", "399871", "520489",
        ];
        for (counter, want) in expected.iter().enumerate() {
            let code =
                generate_hotp(RFC_SECRET_SHA1, counter as u64, 6, Algorithm::Sha1).unwrap();
            assert_eq!(&code, want, "HOTP mismatch at counter {}", counter);
        }
    }

    // ── RFC 6238 Appendix B (TOTP) ───────────────────────────────

    #[test]
    fn rfc6238_sha1_at_59() {
        let code = generate_totp_at(RFC_SECRET_SHA1, 8, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(code, "94287082");
    }

    #[test]
    fn six_digit_code_is_low_order_slice_of_eight() {
        let code = generate_totp_at(RFC_SECRET_SHA1, 6, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(code, "287082");
    }

    #[test]
    fn rfc6238_sha256_at_59() {
        let secret = encode_secret(b"12345678901234567890123456789012");
        let code = generate_totp_at(&secret, 8, 30, Algorithm::Sha256, 59).unwrap();
        assert_eq!(code, "46119246");
    }

    #[test]
    fn rfc6238_sha512_at_59() {
        let secret = encode_secret(
            b"1234567890123456789012345678901234567890123456789012345678901234",
        );
        let code = generate_totp_at(&secret, 8, 30, Algorithm::Sha512, 59).unwrap();
        assert_eq!(code, "90693936");
    }

    #[test]
    fn rfc6238_leading_zero_keeps_width() {
        let code =
            generate_totp_at(RFC_SECRET_SHA1, 8, 30, Algorithm::Sha1, 1111111109).unwrap();
        assert_eq!(code, "07081804");
    }

    #[test]
    fn rfc6238_far_future() {
        let code =
            generate_totp_at(RFC_SECRET_SHA1, 8, 30, Algorithm::Sha1, 20000000000).unwrap();
        assert_eq!(code, "65353130");
    }

    // ── Formatting ───────────────────────────────────────────────

    #[test]
    fn truncate_zero_pads_small_values() {
        // Last byte selects offset 0; the window reads 42.
        let mut digest = [0u8; 20];
        digest[3] = 42;
        assert_eq!(truncate(&digest, 6), "000042");
        assert_eq!(truncate(&digest, 8), "00000042");
    }

    #[test]
    fn code_width_always_equals_digits() {
        for t in [0u64, 59, 1234567890, 20000000000] {
            for digits in [6u8, 7, 8] {
                let code =
                    generate_totp_at(RFC_SECRET_SHA1, digits, 30, Algorithm::Sha1, t).unwrap();
                assert_eq!(code.len(), digits as usize, "width at t={} digits={}", t, digits);
            }
        }
    }

    // ── Time-step maths ──────────────────────────────────────────

    #[test]
    fn time_step_boundaries() {
        assert_eq!(time_step_at(0, 30), 0);
        assert_eq!(time_step_at(29, 30), 0);
        assert_eq!(time_step_at(30, 30), 1);
        assert_eq!(time_step_at(59, 30), 1);
        assert_eq!(time_step_at(60, 30), 2);
    }

    #[test]
    fn seconds_remaining_stays_in_one_to_period() {
        assert_eq!(seconds_remaining_at(1, 30), 29);
        assert_eq!(seconds_remaining_at(29, 30), 1);
        for t in 0..121 {
            let r = seconds_remaining_at(t, 30);
            assert!((1..=30).contains(&r), "remaining {} at t={}", r, t);
        }
    }

    #[test]
    fn period_edge_reports_full_period_not_zero() {
        assert_eq!(seconds_remaining_at(0, 30), 30);
        assert_eq!(seconds_remaining_at(30, 30), 30);
        assert_eq!(seconds_remaining_at(3600, 30), 30);
    }

    #[test]
    fn progress_runs_zero_to_one() {
        assert!((progress_fraction_at(0, 30) - 0.0).abs() < 1e-9);
        assert!((progress_fraction_at(15, 30) - 0.5).abs() < 1e-9);
        assert!((progress_fraction_at(29, 30) - 29.0 / 30.0).abs() < 1e-9);
    }

    // ── Determinism & step change ────────────────────────────────

    #[test]
    fn same_step_same_code() {
        let a = generate_totp_at(RFC_SECRET_SHA1, 6, 30, Algorithm::Sha1, 30).unwrap();
        let b = generate_totp_at(RFC_SECRET_SHA1, 6, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn next_step_changes_code() {
        let a = generate_totp_at(RFC_SECRET_SHA1, 6, 30, Algorithm::Sha1, 59).unwrap();
        let b = generate_totp_at(RFC_SECRET_SHA1, 6, 30, Algorithm::Sha1, 89).unwrap();
        assert_ne!(a, b);
    }

    // ── Secrets ──────────────────────────────────────────────────

    #[test]
    fn invalid_secret_is_an_error() {
        for bad in ["", "!!!", "   ", "0189"] {
            let err = decode_secret(bad).unwrap_err();
            assert_eq!(err.kind, OtpErrorKind::InvalidSecret, "input {:?}", bad);
        }
    }

    #[test]
    fn pasted_secret_matches_clean_secret() {
        let clean = generate_totp_at(RFC_SECRET_SHA1, 6, 30, Algorithm::Sha1, 59).unwrap();
        let pasted = generate_totp_at(
            "gezd gnbv gy3t qojq-GEZD GNBV GY3T QOJQ",
            6,
            30,
            Algorithm::Sha1,
            59,
        )
        .unwrap();
        assert_eq!(clean, pasted);
    }

    #[test]
    fn generated_secret_roundtrips() {
        let secret = generate_secret(20);
        assert_eq!(decode_secret(&secret).unwrap().len(), 20);
    }

    // ── Entry-level generation ───────────────────────────────────

    #[test]
    fn entry_generation_carries_timing_info() {
        let entry = OtpEntry::new("user", RFC_SECRET_SHA1);
        let generated = generate_code_at(&entry, 59).unwrap();
        assert_eq!(generated.code, "287082");
        assert_eq!(generated.remaining_seconds, 1);
        assert_eq!(generated.period, 30);
        assert_eq!(generated.counter, 1);
    }

    #[test]
    fn entry_generation_hotp() {
        let entry = OtpEntry::new("user", RFC_SECRET_SHA1).as_hotp(0);
        let generated = generate_code_at(&entry, 59).unwrap();
        assert_eq!(generated.code, "755224");
        assert_eq!(generated.remaining_seconds, 0);
    }

    #[test]
    fn entry_rejects_bad_parameters() {
        let entry = OtpEntry::new("user", RFC_SECRET_SHA1).with_digits(0);
        assert_eq!(
            generate_code_at(&entry, 59).unwrap_err().kind,
            OtpErrorKind::InvalidDigits
        );

        let entry = OtpEntry::new("user", RFC_SECRET_SHA1).with_period(0);
        assert_eq!(
            generate_code_at(&entry, 59).unwrap_err().kind,
            OtpErrorKind::InvalidPeriod
        );

        let entry = OtpEntry::new("user", "!!!");
        assert_eq!(
            generate_code_at(&entry, 59).unwrap_err().kind,
            OtpErrorKind::InvalidSecret
        );
    }

    // ── Verification ─────────────────────────────────────────────

    #[test]
    fn verify_exact_step() {
        let entry = OtpEntry::new("u", RFC_SECRET_SHA1);
        let result = verify_code_at(&entry, "287082", 0, 59).unwrap();
        assert!(result.valid);
        assert_eq!(result.drift, 0);
        assert_eq!(result.matched_counter, Some(1));
    }

    #[test]
    fn verify_accepts_previous_step_within_window() {
        let entry = OtpEntry::new("u", RFC_SECRET_SHA1);
        // "755224" belongs to step 0; at t=59 we are in step 1.
        let result = verify_code_at(&entry, "755224", 1, 59).unwrap();
        assert!(result.valid);
        assert_eq!(result.drift, -1);
    }

    #[test]
    fn verify_rejects_outside_window() {
        let entry = OtpEntry::new("u", RFC_SECRET_SHA1);
        let result = verify_code_at(&entry, "755224", 0, 59).unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn verify_rejects_wrong_code_and_shape() {
        let entry = OtpEntry::new("u", RFC_SECRET_SHA1);
        assert!(!verify_code_at(&entry, "000000", 0, 59).unwrap().valid);
        assert!(!verify_code_at(&entry, "28708", 0, 59).unwrap().valid);
        assert!(!verify_code_at(&entry, "28708a", 0, 59).unwrap().valid);
    }

    #[test]
    fn verify_hotp_looks_ahead_only() {
        let entry = OtpEntry::new("u", RFC_SECRET_SHA1).as_hotp(1);
        // Counter 3 code is within a +3 window…
        let ahead = verify_code(&entry, "969429", 3).unwrap();
        assert!(ahead.valid);
        assert_eq!(ahead.matched_counter, Some(3));
        // …but counter 0 is behind and never accepted.
        let behind = verify_code(&entry, "755224", 3).unwrap();
        assert!(!behind.valid);
    }

    #[test]
    fn constant_time_eq_semantics() {
        assert!(constant_time_eq(b"287082", b"287082"));
        assert!(!constant_time_eq(b"287082", b"287083"));
        assert!(!constant_time_eq(b"287082", b"28708"));
    }

    // ── Display helper ───────────────────────────────────────────

    #[test]
    fn display_grouping() {
        assert_eq!(format_code_display("123456"), "123 456");
        assert_eq!(format_code_display("12345678"), "1234 5678");
        assert_eq!(format_code_display("1234"), "1234");
    }
}
