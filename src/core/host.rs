//! # Host runner: run a controller as a plain process.
//!
//! [`ServiceController::run_until_shutdown`] plays the part of a service
//! manager for processes that are not hosted by one: it starts the service,
//! waits for either a termination signal or the controller settling to
//! `Stopped` on its own, stops it and hands back the exit code.
//!
//! ```text
//! run_until_shutdown(args)
//!   ├─► subscribe to the bus
//!   ├─► start(args)
//!   ├─► select! {
//!   │     SIGINT/SIGTERM/SIGQUIT (ctrl-c) ─► stop()
//!   │     StatusChanged(→ Stopped)        ─► (already stopped)
//!   │   }
//!   └─► exit_code()
//! ```

use tokio::runtime;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::core::shutdown::wait_for_shutdown_signal;
use crate::core::{ServiceController, ServiceStatus};
use crate::error::ControlError;
use crate::events::Event;

enum Woke {
    Signal,
    Stopped,
}

impl ServiceController {
    /// Starts the service and blocks until it stops, returning the exit code.
    ///
    /// Must not be called from inside an async runtime: it drives its own
    /// current-thread runtime to listen for signals.
    pub fn run_until_shutdown(&self, args: Vec<String>) -> Result<i32, ControlError> {
        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ControlError::Spawn)?;

        let mut rx = self.subscribe();
        self.start(args)?;

        let woke = rt.block_on(async {
            tokio::select! {
                res = wait_for_shutdown_signal() => res.map(|_| Woke::Signal),
                _ = wait_stopped(self, &mut rx) => Ok(Woke::Stopped),
            }
        });

        match woke {
            Ok(Woke::Signal) => {
                tracing::info!(service = %self.config().service_name, "shutdown signal received");
                self.stop();
            }
            Ok(Woke::Stopped) => {
                // The internal stop may still be tearing down the worker.
                if self.has_live_cycle() {
                    self.stop();
                }
            }
            Err(e) => {
                self.stop();
                return Err(ControlError::Signal(e));
            }
        }
        Ok(self.exit_code())
    }
}

/// Resolves once the controller reports a transition to `Stopped`.
async fn wait_stopped(ctl: &ServiceController, rx: &mut broadcast::Receiver<Event>) {
    // `start` may already have run to completion before we got here.
    if ctl.status() == ServiceStatus::Stopped && !ctl.has_live_cycle() {
        return;
    }
    loop {
        match rx.recv().await {
            Ok(ev) if ev.is_status_change() && ev.to == Some(ServiceStatus::Stopped) => return,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "host runner lagged behind the bus");
                if ctl.status() == ServiceStatus::Stopped {
                    return;
                }
            }
            Err(RecvError::Closed) => return,
        }
    }
}
