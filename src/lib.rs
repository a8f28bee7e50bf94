//! Tempo CLI: the presentation shell around the stateless OTP core.
//!
//! The core never schedules anything: this crate owns the refresh loop,
//! polls [`tempo_otp`] each tick, renders code and countdown, and turns
//! core errors into terminal messages.

pub mod args;

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use tempo_otp::otp::core;
use tempo_otp::otp::types::{Algorithm, OtpEntry, OtpError, OtpErrorKind, OtpType};
use tempo_otp::otp::uri;

use crate::args::Args;

/// Entry point called by `main` once arguments are parsed.
pub async fn run(args: Args) -> Result<ExitCode, OtpError> {
    let entry = entry_from_args(&args)?;
    tracing::debug!(
        account = %entry.display_name(),
        algorithm = %entry.algorithm,
        otp_type = %entry.otp_type,
        "resolved entry"
    );

    if let Some(code) = args.verify.as_deref() {
        return verify_once(&entry, code, args.window, args.at, args.json);
    }

    if args.watch {
        if args.at.is_some() || entry.otp_type == OtpType::Hotp {
            return Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                "--watch follows the live clock; drop --at and --counter",
            ));
        }
        return watch(&entry).await;
    }

    generate_once(&entry, args.at, args.json)
}

/// Build the working entry from either an otpauth URI or a bare secret.
fn entry_from_args(args: &Args) -> Result<OtpEntry, OtpError> {
    if let Some(uri_text) = args.uri.as_deref() {
        return uri::parse_otpauth_uri(uri_text);
    }

    let secret = args.secret.clone().ok_or_else(|| {
        OtpError::new(
            OtpErrorKind::InvalidInput,
            "provide a base32 secret, or --uri with an otpauth:// URI",
        )
    })?;
    let algorithm = Algorithm::from_name(&args.algorithm).ok_or_else(|| {
        OtpError::new(
            OtpErrorKind::InvalidInput,
            format!("unknown algorithm '{}'", args.algorithm),
        )
    })?;

    let mut entry = OtpEntry::new("tempo", secret)
        .with_algorithm(algorithm)
        .with_digits(args.digits)
        .with_period(args.period);
    if let Some(counter) = args.counter {
        entry = entry.as_hotp(counter);
    }
    Ok(entry)
}

/// One-shot generation: bare code on stdout, fit for command substitution.
fn generate_once(entry: &OtpEntry, at: Option<u64>, json: bool) -> Result<ExitCode, OtpError> {
    let generated = match at {
        Some(unix_seconds) => core::generate_code_at(entry, unix_seconds)?,
        None => core::generate_code(entry)?,
    };

    if json {
        println!("{}", render_json(&generated));
    } else {
        println!("{}", generated.code);
    }
    Ok(ExitCode::SUCCESS)
}

/// One-shot verification; the exit code reports the outcome to scripts.
fn verify_once(
    entry: &OtpEntry,
    code: &str,
    window: u32,
    at: Option<u64>,
    json: bool,
) -> Result<ExitCode, OtpError> {
    let result = match at {
        Some(unix_seconds) => core::verify_code_at(entry, code, window, unix_seconds)?,
        None => core::verify_code(entry, code, window)?,
    };

    if json {
        println!("{}", render_json(&result));
    } else if result.valid {
        println!("valid (drift {})", result.drift);
    } else {
        println!("invalid");
    }
    Ok(if result.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// The refresh loop of the original authenticator shells: poll the
/// stateless core once a second, repaint the countdown, and pick up the
/// new code when the time step rolls over. All state lives here.
async fn watch(entry: &OtpEntry) -> Result<ExitCode, OtpError> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut current_step: Option<u64> = None;
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let generated = core::generate_code(entry)?;
                if current_step != Some(generated.counter) {
                    current_step = Some(generated.counter);
                    tracing::debug!(step = generated.counter, "time step rolled over");
                }
                print!(
                    "\r{}   {:>2}s ",
                    core::format_code_display(&generated.code),
                    generated.remaining_seconds
                );
                let _ = stdout.flush();
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}

fn render_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
