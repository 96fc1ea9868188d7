//! Bridge Safety CLI
//!
//! Replays a recorded trace of typed signal events through the safety
//! validator and reports every allow/deny decision plus a summary. Useful
//! for vetting a profile against drive logs and for reproducing field
//! reports offline.

use anyhow::{Context, Result};
use bridge_safety::{profiles, SafetyValidator, TxCommand, VehicleProfile};
use clap::Parser;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

mod events;
mod report;

use events::{ReplayClock, TraceEvent, TraceRecord};
use report::ReplaySummary;

/// Bridge Safety - replay CAN bridge traces through the safety validator
#[derive(Parser, Debug)]
#[command(name = "bridge-safety-cli")]
#[command(about = "Replay recorded bridge traces against a vehicle safety profile", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a JSON Lines trace file to replay
    #[arg(short, long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Path to a vehicle profile (profile.toml)
    #[arg(short, long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Use the built-in Volkswagen MQB profile
    #[arg(long)]
    mqb: bool,

    /// With --mqb: full longitudinal control instead of stock ACC
    #[arg(long)]
    long: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Bridge Safety CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using validator library v{}", bridge_safety::VERSION);

    let profile = resolve_profile(&args)?;

    if let Some(trace_path) = &args.trace {
        replay_trace(trace_path, profile)?;
    } else {
        println!("Bridge Safety - No trace specified");
        println!("\nQuick Start:");
        println!("  bridge-safety-cli --trace drive.jsonl --mqb --long");
        println!("  bridge-safety-cli --trace drive.jsonl --profile mqb.toml");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Pick the profile from --profile or the built-in selection
fn resolve_profile(args: &Args) -> Result<VehicleProfile> {
    if let Some(path) = &args.profile {
        load_profile(path)
    } else {
        if !args.mqb {
            log::info!("no profile given, defaulting to built-in MQB");
        }
        Ok(profiles::volkswagen_mqb(args.long))
    }
}

/// Load a vehicle profile from a TOML file
fn load_profile(path: &Path) -> Result<VehicleProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file: {:?}", path))?;

    let profile: VehicleProfile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse profile file: {:?}", path))?;

    Ok(profile)
}

/// Replay every record of the trace through a fresh validator
fn replay_trace(path: &Path, profile: VehicleProfile) -> Result<()> {
    println!("───────────────────────────────────────────────");
    println!("  Bridge Safety - Trace Replay");
    println!("───────────────────────────────────────────────");
    println!("Profile: {}", profile.name);
    println!("Trace:   {:?}\n", path);

    let clock = ReplayClock::new();
    let mut validator = SafetyValidator::with_clock(profile, Box::new(clock.clone()))
        .context("profile failed validation")?;

    let file = fs::File::open(path).with_context(|| format!("Failed to open trace: {:?}", path))?;
    let reader = BufReader::new(file);

    let mut summary = ReplaySummary::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read trace line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: TraceRecord = serde_json::from_str(&line)
            .with_context(|| format!("Malformed trace record on line {}", line_no + 1))?;

        clock.set_us(record.ts_us);
        replay_record(&mut validator, &record, &mut summary);
    }

    summary.print(&validator);
    Ok(())
}

/// Offer one record to the validator and account for the outcome
fn replay_record(validator: &mut SafetyValidator, record: &TraceRecord, summary: &mut ReplaySummary) {
    match record.event {
        TraceEvent::DriverTorque { torque } => {
            validator.on_driver_torque(torque);
            summary.record_observation();
        }
        TraceEvent::Brake { active } => {
            validator.on_brake(active);
            summary.record_observation();
        }
        TraceEvent::DriverGas { value } => {
            validator.on_driver_gas(value);
            summary.record_observation();
        }
        TraceEvent::AccStatus { status } => {
            validator.on_acc_status(status);
            summary.record_observation();
        }
        TraceEvent::WheelSpeeds { ref speeds } => {
            validator.on_speed(speeds);
            summary.record_observation();
        }
        TraceEvent::CruiseButtons { cancel, set, resume } => {
            validator.on_cruise_buttons(cancel, set, resume);
            summary.record_observation();
        }
        TraceEvent::TxSteering { bus, id, torque, steer_req } => {
            let cmd = TxCommand::Steering { torque, steer_req };
            record_tx(validator, bus, id, &cmd, record.ts_us, summary);
        }
        TraceEvent::TxAccel { bus, id, accel, secondary_accel } => {
            let cmd = TxCommand::AccelRequest { accel, secondary_accel };
            record_tx(validator, bus, id, &cmd, record.ts_us, summary);
        }
        TraceEvent::TxButtons { bus, id, cancel, set, resume } => {
            let cmd = TxCommand::CruiseButtons { cancel, set, resume };
            record_tx(validator, bus, id, &cmd, record.ts_us, summary);
        }
        TraceEvent::TxHud { bus, id } => {
            record_tx(validator, bus, id, &TxCommand::Hud, record.ts_us, summary);
        }
        TraceEvent::Forward { bus, id } => {
            let target = validator.should_forward(bus, id);
            match target {
                Some(target) => {
                    log::debug!("[{}us] forward 0x{:X}: bus {} -> {}", record.ts_us, id, bus, target)
                }
                None => log::info!("[{}us] DROP 0x{:X} from bus {}", record.ts_us, id, bus),
            }
            summary.record_forward(target.is_some());
        }
    }
}

fn record_tx(
    validator: &mut SafetyValidator,
    bus: bridge_safety::Bus,
    id: bridge_safety::MessageId,
    cmd: &TxCommand,
    ts_us: u64,
    summary: &mut ReplaySummary,
) {
    let allowed = validator.should_transmit(bus, id, cmd);
    if allowed {
        log::debug!("[{}us] TX 0x{:X} on bus {} allowed", ts_us, id, bus);
    } else {
        log::info!("[{}us] TX 0x{:X} on bus {} BLOCKED", ts_us, id, bus);
    }
    summary.record_tx(allowed);
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
