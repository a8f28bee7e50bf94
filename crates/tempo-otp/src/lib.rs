//! # Tempo – One-Time Password Core
//!
//! Time-based and counter-based one-time password crate:
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP generation with SHA-1, SHA-256, SHA-512
//! - **Lenient base32** – Decodes secrets exactly as pasted: lowercase,
//!   missing padding, embedded whitespace and stray punctuation are tolerated
//! - **Verification** – Drift-window code checking with constant-time comparison
//! - **otpauth:// URIs** – Parsing & generation per the Google Authenticator spec
//! - **Countdown helpers** – Seconds remaining and progress fraction for
//!   driving a refresh loop or progress display
//!
//! The crate is stateless: every operation is a pure function of its inputs,
//! safe to call concurrently without coordination. Periodic refresh is the
//! calling application's concern.

pub mod otp;
