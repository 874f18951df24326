//! WotVouch CLI: `wotv` command.
//!
//! Verifies pending web-of-trust vouches offline, against sigchains and a
//! local identity kept under a home directory, and inspects the pieces a
//! vouch is built from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use wot_vouch::confidence::{normalize_confidence, UsernameLookup};
use wot_vouch::fetch::fetch_pending_vouches;
use wot_vouch::pending::{PendingVouch, VouchServices};
use wot_vouch::storage::{ChainStore, ResponseFile};
use wot_vouch::time::{micros_to_rfc3339, now_micros};
use wot_vouch::{Sha256Extractor, VouchContext};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("WOT_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = std::env::var("HOME").map_err(|_| anyhow!("neither WOT_HOME nor HOME is set"))?;
    Ok(PathBuf::from(home).join(".wot"))
}

fn open_store(home: &Path) -> Result<ChainStore> {
    ChainStore::new(home)
        .with_context(|| format!("failed to open chain store at {}", home.display()))
}

// ── Duration parsing ──────────────────────────────────────────────────────────

/// Parse a duration string like "30s", "2m", "1h30m", or plain seconds.
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u64>() {
        return Ok(Duration::from_secs(n));
    }

    let mut total_secs: u64 = 0;
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else {
            let val: u64 = current
                .parse()
                .map_err(|_| anyhow!("invalid duration: {s}"))?;
            current.clear();
            let unit: u64 = match ch {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => return Err(anyhow!("unknown duration unit '{}' in '{s}'", ch)),
            };
            total_secs = val
                .checked_mul(unit)
                .and_then(|secs| total_secs.checked_add(secs))
                .ok_or_else(|| anyhow!("duration '{s}' is too large"))?;
        }
    }

    if !current.is_empty() {
        return Err(anyhow!("duration '{s}' is missing a unit (h/m/s)"));
    }

    if total_secs == 0 {
        return Err(anyhow!("duration must be > 0"));
    }

    Ok(Duration::from_secs(total_secs))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// WotVouch CLI: verify pending web-of-trust vouches against sigchains.
#[derive(Parser, Debug)]
#[command(
    name = "wotv",
    about = "WotVouch CLI",
    version,
    long_about = "wotv: WotVouch CLI\n\nVerify server-reported pending web-of-trust vouches against the\nvoucher's sigchain and your own identity. Fails closed: one bad\nvouch rejects the whole batch."
)]
struct Cli {
    /// Home directory holding me.json and chains/ (default: $WOT_HOME or ~/.wot)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Give up after this long (e.g. 30s, 2m)
    #[arg(long, global = true)]
    timeout: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify every vouch in a recorded wot/pending response
    Pending {
        /// Path to the recorded response body
        #[arg(long)]
        response: PathBuf,

        /// Print the verified vouches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the expansion id committing to a file's exact bytes
    ExpansionId {
        /// Expansion JSON file
        file: PathBuf,
    },

    /// Normalize a raw confidence object into the canonical record
    Confidence {
        /// JSON file holding the confidence object
        file: PathBuf,
    },

    /// List users with a stored sigchain
    Users,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let home = match cli.home {
        Some(home) => home,
        None => default_home()?,
    };
    let ctx = match cli.timeout.as_deref() {
        Some(t) => VouchContext::with_timeout(parse_duration(t)?),
        None => VouchContext::background(),
    };

    match cli.command {
        Commands::Pending { response, json } => cmd_pending(&ctx, &home, &response, json),
        Commands::ExpansionId { file } => cmd_expansion_id(&file),
        Commands::Confidence { file } => cmd_confidence(&ctx, &home, &file),
        Commands::Users => cmd_users(&home),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `wotv pending --response FILE [--json]`
fn cmd_pending(ctx: &VouchContext, home: &Path, response: &Path, json: bool) -> Result<()> {
    let store = open_store(home)?;
    log::debug!(
        "verifying {} against chains in {}",
        response.display(),
        store.base_dir().display()
    );
    let services = VouchServices {
        chains: &store,
        expansions: &Sha256Extractor,
        usernames: &store,
        me: &store,
    };

    let vouches = fetch_pending_vouches(ctx, &ResponseFile::new(response), &services)
        .context("pending vouches failed verification")?;
    let verified_at = micros_to_rfc3339(now_micros());

    if json {
        let out = serde_json::json!({
            "verified_at": verified_at,
            "pending": vouches,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Pending vouches: {} (verified {verified_at})", vouches.len());
    for (i, vouch) in vouches.iter().enumerate() {
        print_vouch(ctx, &store, i + 1, vouch);
    }
    Ok(())
}

fn print_vouch(ctx: &VouchContext, store: &ChainStore, n: usize, vouch: &PendingVouch) {
    let voucher = vouch.voucher();
    let name = store
        .lookup_username(ctx, &voucher.uid)
        .unwrap_or_else(|e| {
            log::warn!("no display name for {}: {e}", voucher.uid);
            "?".to_string()
        });

    println!();
    println!("[{n}] {name} ({voucher})");
    println!("  Proof: {}", vouch.proof());
    for text in vouch.vouch_texts() {
        println!("  \"{text}\"");
    }

    let confidence = vouch.confidence();
    if let Some(via) = confidence.username_verified_via {
        println!("  Verified via: {via}");
    }
    if !confidence.vouched_by.is_empty() {
        println!("  Vouched by:   {}", confidence.vouched_by.join(", "));
    }
    if let Some(days) = confidence.known_on_keybase_days {
        println!("  Known for:    {days} days");
    }
    if let Some(other) = &confidence.other {
        println!("  Other:        {other}");
    }
}

/// `wotv expansion-id FILE`
fn cmd_expansion_id(file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    println!("{}", Sha256Extractor::expansion_id_for(&bytes));
    Ok(())
}

/// `wotv confidence FILE`
fn cmd_confidence(ctx: &VouchContext, home: &Path, file: &Path) -> Result<()> {
    let store = open_store(home)?;
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let raw: serde_json::Value =
        serde_json::from_slice(&bytes).context("confidence file is not JSON")?;
    let serde_json::Value::Object(map) = raw else {
        return Err(anyhow!("confidence must be a JSON object"));
    };

    let confidence = normalize_confidence(ctx, &store, map).context("normalization failed")?;
    println!("{}", serde_json::to_string_pretty(&confidence)?);
    Ok(())
}

/// `wotv users`
fn cmd_users(home: &Path) -> Result<()> {
    let store = open_store(home)?;
    let uids = store.list_users().context("failed to list chains")?;

    if uids.is_empty() {
        println!("No sigchains stored in {}", store.base_dir().display());
        return Ok(());
    }
    for uid in uids {
        match store.load(&uid) {
            Ok(user) => println!("{uid}  {}  ({} links)", user.username, user.links.len()),
            Err(e) => println!("{uid}  <unreadable: {e}>"),
        }
    }
    Ok(())
}
