//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Interrupt check
//!         - Density acquisition from the density source
//!         - Drive control processing
//!         - Steer filtering (optional)
//!         - Actuation
//!         - Monitoring and archiving
//!
//! The loop runs in simulation time, advancing by one cycle period per cycle. In real time mode
//! each cycle is also padded out to the cycle period in wall time.
//!
//! # Modules
//!
//! All modules (e.g. `drive_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{
    actuator::{Actuator, ArchiveActuator},
    data_store::{DataStore, SafeModeCause},
    density_source::{DensityPoll, DensitySource, ScriptedDensity},
    drive_ctrl::{self, SteerFilter},
    monitor::DriveMonitor,
    params::DriveExecParams,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use drive_if::eqpt::actuation::Control;
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::ScriptInterpreter,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line arguments
#[derive(Debug, StructOpt)]
#[structopt(
    name = "drive_exec",
    about = "Drives the vehicle away from obstacles using zonal obstacle densities"
)]
struct Args {
    /// Path to the density script to replay
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Show the per-tick detail in the terminal
    #[structopt(short, long)]
    verbose: bool,

    /// Don't wait between cycles
    #[structopt(short, long)]
    fast: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, the log file always gets the per-tick detail
    let stdout_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger_init(LevelFilter::Debug, stdout_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Density Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", args);

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;
    exec_params
        .validate()
        .wrap_err("Invalid exec params")?;

    let real_time = exec_params.real_time && !args.fast;
    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let cycles_per_summary = exec_params.cycles_per_summary();

    info!("Exec parameters loaded");

    // ---- INITIALISE DENSITY SOURCE ----

    info!("Loading script from {:?}", args.script);

    let si = ScriptInterpreter::new(&args.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} frames\n",
        si.get_duration(),
        si.get_num_frames()
    );

    let mut source = ScriptedDensity::new(si, exec_params.sensor_timeout_s);

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.drive_ctrl
        .init("drive_ctrl.toml", &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!(
        "DriveCtrl init complete ({:?} controller)",
        ds.drive_ctrl.params().controller
    );

    let mut steer_filter = exec_params.steer_filter_alpha.map(SteerFilter::new);
    if let Some(ref f) = steer_filter {
        info!("Steer filter enabled, alpha = {:.2}", f.alpha());
    }

    let mut actuator =
        ArchiveActuator::new(&session).wrap_err("Failed to initialise the actuator")?;
    info!("Actuator init complete");

    let mut monitor = DriveMonitor::new();

    info!("Module initialisation complete\n");

    // ---- INTERRUPT HANDLING ----

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .wrap_err("Failed to set the interrupt handler")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let end_reason = loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(exec_params.cycle_period_s, cycles_per_summary);

        if ds.sim_time_s > exec_params.sim_duration_s {
            info!("Simulation duration reached, stopping");
            break "duration reached";
        }

        // Leave the vehicle braked if interrupted
        if interrupted.load(Ordering::Relaxed) {
            monitor.interrupted(ds.sim_time_s);
            ds.make_safe(SafeModeCause::Interrupted);

            if let Err(e) = actuator.actuate(&Control::fail_safe()) {
                warn!("Could not apply the fail-safe control: {}", e);
            }
            break "interrupted";
        }

        // ---- DATA INPUT ----

        match source.poll(ds.sim_time_s) {
            DensityPoll::Frame(f) => {
                ds.density_frame = Some(f);
                ds.speed_ms = f.speed_ms;
                ds.make_unsafe(SafeModeCause::SensorTimeout).ok();
            }
            DensityPoll::NoData => ds.make_safe(SafeModeCause::SensorTimeout),
            DensityPoll::EndOfStream => {
                info!("End of density script reached, stopping");
                break "end of script";
            }
        }

        ds.drive_ctrl_input = drive_ctrl::InputData {
            density: ds.density_frame.and_then(|f| f.sample),
            speed_ms: ds.speed_ms,
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_ctrl_output = o;
                ds.drive_ctrl_status_rpt = r;
            }
            Err(e) => {
                warn!("Error during DriveCtrl processing: {}", e);
                ds.drive_ctrl_output.control = Control::fail_safe();
            }
        };

        // Smooth the steer, restarting the filter after fail-safe ticks
        ds.control = match steer_filter.as_mut() {
            Some(f) if !ds.drive_ctrl_status_rpt.sensor_timeout => {
                f.apply(&ds.drive_ctrl_output.control)
            }
            Some(f) => {
                f.reset();
                ds.drive_ctrl_output.control
            }
            None => ds.drive_ctrl_output.control,
        };

        // ---- ACTUATION ----

        if let Err(e) = actuator.actuate(&ds.control) {
            warn!("Actuator error: {}", e);
            monitor.actuator_error();
        }

        // ---- MONITORING ----

        monitor.record(
            ds.sim_time_s,
            ds.is_summary_cycle,
            &ds.drive_ctrl_input,
            &ds.drive_ctrl_output,
            &ds.drive_ctrl_status_rpt,
            &ds.control,
        );

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.drive_ctrl.write() {
            warn!("Could not write the DriveCtrl archive: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        if real_time {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => {
                    ds.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                    );
                    ds.num_consec_cycle_overruns += 1;
                }
            }
        }

        ds.cycle_end();
    };

    // ---- SHUTDOWN ----

    let summary = monitor.finish(end_reason);
    session.save("run_summary.json", summary);

    info!("End of execution");

    session.exit();

    Ok(())
}
