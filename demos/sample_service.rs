//! # Example: sample_service
//!
//! A countdown service that fails on purpose after ten seconds.
//!
//! Shows how to:
//! - Write a job that honours cancellation and pause checkpoints.
//! - Drive it through [`ServiceController`] the way a service manager would.
//! - Read the exit code the host would report after a fault.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► --host:   run_until_shutdown(args)      (Ctrl-C stops it cleanly)
//!   └─► default:  scripted host
//!         ├─► start()            Stopped → StartPending → Running
//!         ├─► sleep 3s
//!         ├─► pause()            Running → PausePending → Paused
//!         ├─► sleep 2s           (countdown frozen)
//!         ├─► resume()           Paused → ContinuePending → Running
//!         ├─► --stop-early:      stop() (only if the config allows stopping)
//!         └─► wait               job faults → exit code 1066 → StopPending → Stopped
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example sample_service
//! cargo run --example sample_service -- --host
//! cargo run --example sample_service -- --stop-early
//! RUST_LOG=servicevisor=debug cargo run --example sample_service
//! ```

use std::{sync::Arc, thread, time::Duration};

use servicevisor::{
    Config, JobError, JobFn, JobRef, PauseToken, ServiceController, ServiceStatus, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const COUNTDOWN: u32 = 10;

fn countdown() -> JobRef {
    JobFn::arc(
        "countdown",
        |_args: Vec<String>, cancel: CancellationToken, pause: PauseToken| async move {
            for i in 0..COUNTDOWN {
                if cancel.is_cancelled() {
                    return Err(JobError::Canceled);
                }
                println!("I'm going to throw an error in {} seconds ...", COUNTDOWN - i);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(JobError::Canceled),
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
                pause.wait_while_paused(&cancel).await?;
            }

            if cancel.is_cancelled() {
                return Err(JobError::Canceled);
            }
            Err(JobError::msg("Simulating an application error"))
        },
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let host_mode = args.iter().any(|a| a == "--host");
    let stop_early = args.iter().any(|a| a == "--stop-early");

    let cfg = Config {
        can_pause_and_continue: true,
        include_fault_detail: true,
        ..Config::named("sample-service")
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(servicevisor::LogWriter)];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let ctl = ServiceController::builder(cfg, countdown())
        .with_subscribers(subs)
        .build();
    println!("controls: {}", controls(ctl.config()));

    let code = if host_mode {
        println!("=== sample_service (host mode, Ctrl-C to stop) ===\n");
        ctl.run_until_shutdown(args)?
    } else {
        println!("=== sample_service (scripted) ===\n");
        scripted(&ctl, args, stop_early)?
    };

    println!("\nexit code: {code}");
    Ok(())
}

/// Lifecycle controls a host would offer for this configuration.
fn controls(cfg: &Config) -> String {
    let mut ops = Vec::new();
    if cfg.can_stop {
        ops.push("stop");
    }
    if cfg.can_pause_and_continue {
        ops.extend(["pause", "continue"]);
    }
    if ops.is_empty() {
        "none".to_string()
    } else {
        ops.join(", ")
    }
}

fn scripted(ctl: &ServiceController, args: Vec<String>, stop_early: bool) -> anyhow::Result<i32> {
    let cfg = ctl.config();
    ctl.start(args)?;

    thread::sleep(Duration::from_secs(3));
    if cfg.can_pause_and_continue {
        println!("-- pause");
        ctl.pause()?;

        thread::sleep(Duration::from_secs(2));
        println!("-- continue");
        ctl.resume()?;
    }

    if stop_early {
        if cfg.can_stop {
            println!("-- stop");
            ctl.stop();
        } else {
            println!("-- stop not offered by this service; waiting for the job");
        }
    }

    while ctl.status() != ServiceStatus::Stopped || ctl.has_live_cycle() {
        thread::sleep(Duration::from_millis(100));
    }
    Ok(ctl.exit_code())
}
