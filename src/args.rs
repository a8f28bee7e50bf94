use clap::Parser;

/// Generate RFC 6238 one-time codes in the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base32-encoded shared secret (A–Z, 2–7; case, spaces and padding
    /// are all forgiven)
    pub secret: Option<String>,

    /// Full otpauth:// key URI instead of a bare secret
    #[arg(long, conflicts_with = "secret")]
    pub uri: Option<String>,

    /// Number of code digits
    #[arg(long, default_value_t = 6)]
    pub digits: u8,

    /// Time-step period in seconds
    #[arg(long, default_value_t = 30)]
    pub period: u32,

    /// HMAC hash algorithm: sha1, sha256 or sha512
    #[arg(long, default_value = "sha1")]
    pub algorithm: String,

    /// Generate in HOTP mode with this counter value
    #[arg(long)]
    pub counter: Option<u64>,

    /// Compute for an explicit unix timestamp instead of the current time
    #[arg(long)]
    pub at: Option<u64>,

    /// Keep running, refreshing code and countdown as time steps roll over
    #[arg(short, long)]
    pub watch: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Verify the given code instead of generating one
    #[arg(long)]
    pub verify: Option<String>,

    /// Drift window (time steps either side) accepted by --verify
    #[arg(long, default_value_t = 1)]
    pub window: u32,
}

pub fn init() -> Args {
    Args::parse()
}
