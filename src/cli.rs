// ============================================================================
// maskpair CLI: headless annotation of an image pair
// ============================================================================
//
// Usage examples:
//   maskpair --base https://host/a.jpg --reference https://host/b.jpg --script edits.json
//   maskpair --base a.b64 --reference b.b64 --script edits.json --out-dir out/
//   maskpair --base ... --reference ... --script edits.json --clone-reference --submit --email me@host
//
// The script is a JSON array of commands, e.g.
//   [{"action": "set_mode", "slot": "base", "mode": {"kind": "point"}},
//    {"action": "add_point", "slot": "base", "x": 50, "y": 50, "label": "positive"},
//    {"action": "create_mask", "slot": "base"}]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use maskpair::color::to_hex;
use maskpair::config::AppConfig;
use maskpair::services::{NoSegmenter, Segmenter};
use maskpair::{Command, MaskError, SessionSettings, SessionStore, Slot};
use maskpair_http::{HttpClient, SegmentationClient, SubmissionClient};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Annotate a base and a reference image with binary masks.
#[derive(Parser, Debug)]
#[command(
    name = "maskpair",
    version,
    about = "Paired mask annotation: replay edits, export masks, submit"
)]
pub struct CliArgs {
    /// Base image: an http(s) URL or inline base64 (data URL allowed).
    /// A path to an existing file is read and its contents used as the source.
    #[arg(long, value_name = "SOURCE")]
    pub base: String,

    /// Reference image, same forms as --base.
    #[arg(long, value_name = "SOURCE")]
    pub reference: String,

    /// Email sent with the submission.
    #[arg(long, default_value = "")]
    pub email: String,

    /// Configuration file. Defaults to the user config directory when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON list of commands to replay.
    #[arg(long, value_name = "COMMANDS.json")]
    pub script: Option<PathBuf>,

    /// Where masks and overlays are written.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Seed the base drawing surface with the reference mask after the script.
    #[arg(long)]
    pub clone_reference: bool,

    /// Submit both masks to the configured backend.
    #[arg(long)]
    pub submit: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code.
/// `0` = everything succeeded, `1` = setup failed or any command failed.
pub fn run(args: CliArgs) -> ExitCode {
    let config = match AppConfig::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    log::debug!(
        "Overlay {} at opacity {}, model input {}px",
        to_hex(config.overlay.color),
        config.overlay.opacity,
        config.model_input_size
    );

    let http = HttpClient::new(config.request_timeout());
    let segmenter: Box<dyn Segmenter> = match &config.segmentation_url {
        Some(url) => Box::new(SegmentationClient::new(http.clone(), url.clone())),
        None => {
            log::warn!("No segmentation URL configured; create_mask will fail");
            Box::new(NoSegmenter)
        }
    };

    let settings = SessionSettings::from(&config);
    let mut store = match load_store(&args, &http, settings) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut any_failure = false;

    if let Some(path) = &args.script {
        match read_script(path) {
            Ok(commands) => {
                any_failure |= !replay(&mut store, commands, segmenter.as_ref());
            }
            Err(e) => {
                eprintln!("error: could not read script '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    if args.clone_reference {
        if let Err(e) = store.clone_mask(Slot::Base) {
            eprintln!("error: clone reference mask: {}", e);
            any_failure = true;
        }
    }

    if let Err(e) = write_outputs(&store, &args.out_dir) {
        eprintln!("error: {}", e);
        any_failure = true;
    }

    if args.submit {
        if let Err(e) = submit(&store, &config, &http, &args.email) {
            eprintln!("error: {}", e);
            any_failure = true;
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Steps
// ============================================================================

fn load_store(
    args: &CliArgs,
    http: &HttpClient,
    settings: SessionSettings,
) -> Result<SessionStore, MaskError> {
    let base = resolve_source(&args.base)?;
    let reference = resolve_source(&args.reference)?;
    SessionStore::load(&base, &reference, http, settings)
}

/// A source naming an existing file is replaced by the file's contents.
fn resolve_source(source: &str) -> Result<String, MaskError> {
    let path = Path::new(source);
    if !source.starts_with("http") && path.is_file() {
        log::debug!("Reading image source from {}", path.display());
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(source.to_string())
}

fn read_script(path: &Path) -> Result<Vec<Command>, MaskError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Apply every command, reporting failures without stopping.
/// Returns `true` when all commands succeeded.
fn replay(store: &mut SessionStore, commands: Vec<Command>, segmenter: &dyn Segmenter) -> bool {
    let total = commands.len();
    let mut ok = true;

    for (idx, command) in commands.into_iter().enumerate() {
        let description = command.description();
        match store.dispatch(command, segmenter) {
            Ok(snapshot) => {
                println!(
                    "[{}/{}] {}: {} ({:.1}% mask)",
                    idx + 1,
                    total,
                    description,
                    snapshot.phase.name(),
                    snapshot.coverage() * 100.0
                );
            }
            Err(e) => {
                eprintln!(
                    "[{}/{}] {}: {:?} error: {}",
                    idx + 1,
                    total,
                    description,
                    e.category(),
                    e
                );
                ok = false;
            }
        }
    }
    ok
}

fn write_outputs(store: &SessionStore, dir: &Path) -> Result<(), MaskError> {
    std::fs::create_dir_all(dir)?;

    for slot in Slot::all() {
        let session = store.session(slot)?;
        match session.natural_mask()? {
            Some(mask) => {
                let path = dir.join(format!("{}_mask.png", slot.name()));
                mask.as_image().save(&path)?;
                println!("  -> {}", path.display());
            }
            None => println!("  {} has no mask", slot),
        }

        let path = dir.join(format!("{}_overlay.png", slot.name()));
        store.overlay(slot)?.save(&path)?;
        println!("  -> {}", path.display());
    }
    Ok(())
}

fn submit(
    store: &SessionStore,
    config: &AppConfig,
    http: &HttpClient,
    email: &str,
) -> Result<(), MaskError> {
    let url = config
        .backend_url
        .as_deref()
        .ok_or_else(|| MaskError::Config("no backend URL configured".to_string()))?;

    let client = SubmissionClient::new(http.clone(), url);
    store.submit(email, &client)?;
    println!("Submitted masks for {}", if email.is_empty() { "<no email>" } else { email });
    Ok(())
}
