//! Core types for OTP generation and verification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::otp::base32;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for the HMAC step.
///
/// SHA-1 is the RFC 6238 default and what virtually every provisioning
/// QR code means when it says nothing; the wider variants are carried as
/// configurable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl Algorithm {
    /// Canonical upper-case name, as used in `otpauth://` parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Parse a case-insensitive name, tolerating dashes and an `HMAC`
    /// prefix (`sha256`, `SHA-256` and `HmacSHA256` all parse).
    pub fn from_name(s: &str) -> Option<Self> {
        let cleaned = s.trim().to_uppercase().replace('-', "");
        match cleaned.strip_prefix("HMAC").unwrap_or(&cleaned) {
            "SHA1" => Some(Self::Sha1),
            "SHA256" => Some(Self::Sha256),
            "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether codes are bound to the clock (TOTP) or a counter (HOTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    #[default]
    Totp,
    Hotp,
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => f.write_str("totp"),
            Self::Hotp => f.write_str("hotp"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A secret plus the parameters needed to turn it into codes.
///
/// This is the unit an `otpauth://` URI describes. The secret is kept in
/// its textual base32 form and decoded fresh on every generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpEntry {
    /// Issuer (e.g. "GitHub"), if known.
    pub issuer: Option<String>,
    /// Account label (e.g. "user@example.com").
    pub label: String,
    /// Base-32 encoded secret key.
    pub secret: String,
    /// Hash algorithm.
    pub algorithm: Algorithm,
    /// Number of digits in the generated code (6 or 8 in practice).
    pub digits: u8,
    /// TOTP or HOTP.
    pub otp_type: OtpType,
    /// Time period in seconds (TOTP only, typically 30).
    pub period: u32,
    /// Counter value (HOTP only).
    pub counter: u64,
}

impl OtpEntry {
    /// Create a TOTP entry with the RFC 6238 defaults: SHA-1, 6 digits,
    /// 30-second period.
    pub fn new(label: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            issuer: None,
            label: label.into(),
            secret: secret.into(),
            algorithm: Algorithm::default(),
            digits: 6,
            otp_type: OtpType::Totp,
            period: 30,
            counter: 0,
        }
    }

    /// Builder: set issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time period.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Builder: switch to HOTP at the given counter.
    pub fn as_hotp(mut self, counter: u64) -> Self {
        self.otp_type = OtpType::Hotp;
        self.counter = counter;
        self
    }

    /// Display name: "Issuer (label)" or just "label".
    pub fn display_name(&self) -> String {
        match &self.issuer {
            Some(iss) if !iss.is_empty() => format!("{} ({})", iss, self.label),
            _ => self.label.clone(),
        }
    }

    /// The secret in canonical form: uppercase, spaces and dashes removed.
    pub fn normalised_secret(&self) -> String {
        self.secret
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_uppercase()
    }

    /// Whether the secret yields any key material at all.
    pub fn has_usable_secret(&self) -> bool {
        !base32::decode(&self.secret).is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generated code with the timing info a countdown display needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// The code string, zero-padded to the configured width (e.g. "007423").
    pub code: String,
    /// Seconds remaining until the code expires, always in `1..=period`
    /// (TOTP only; 0 for HOTP).
    pub remaining_seconds: u32,
    /// Total period in seconds.
    pub period: u32,
    /// Progress as fraction 0.0–1.0 (1.0 = about to expire).
    pub progress: f64,
    /// The time step (TOTP) or counter (HOTP) used.
    pub counter: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of checking a submitted code against an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    /// How many time steps or counters off the match was (0 = exact).
    pub drift: i64,
    /// The counter value that matched, if any.
    pub matched_counter: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpErrorKind {
    /// The secret yields no usable key material after decoding.
    InvalidSecret,
    /// An `otpauth://` URI could not be parsed.
    InvalidUri,
    /// Digit count outside the supported range.
    InvalidDigits,
    /// Zero or otherwise unusable period.
    InvalidPeriod,
    /// A caller-supplied value that is none of the above.
    InvalidInput,
}

/// Crate-level error.
#[derive(Debug, Clone)]
pub struct OtpError {
    pub kind: OtpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl OtpError {
    pub fn new(kind: OtpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for OtpError {}
