//! Operator countdowns and Ctrl-C handling.
//!
//! A [`Countdown`] owns a small tokio runtime whose only background task
//! listens for Ctrl-C and raises the shared [`Interrupt`] flag. Countdowns
//! race their one-second ticks against that flag; the other steps poll it
//! between units of work.

use crate::error::{BackupError, Result};
use std::future::{Future, pending};
use std::io::{self, Write};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Cheap, cloneable view of "has the operator pressed Ctrl-C".
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// An interrupt that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Interrupt { rx }
    }

    /// An interrupt that has already fired.
    pub fn triggered() -> Self {
        let (_tx, rx) = watch::channel(true);
        Interrupt { rx }
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// `Err(Interrupted)` once Ctrl-C has been seen.
    pub fn check(&self) -> Result<()> {
        if self.is_set() {
            Err(BackupError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Resolves when the interrupt fires; never resolves if it cannot.
    pub async fn fired(mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without firing.
                return pending().await;
            }
        }
    }
}

pub struct Countdown {
    rt: Runtime,
    interrupt: Interrupt,
}

impl Countdown {
    /// Starts listening for Ctrl-C for the rest of the process.
    pub fn install() -> Result<Self> {
        let rt = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ctrl-c")
            .enable_all()
            .build()
            .map_err(BackupError::Runtime)?;
        let (tx, rx) = watch::channel(false);
        rt.spawn(async move {
            loop {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        debug!("ctrl-c received");
                        let _ = tx.send(true);
                    }
                    Err(e) => {
                        warn!("unable to listen for ctrl-c: {e}");
                        // Park instead of dropping `tx`, so the flag stays readable.
                        pending::<()>().await;
                    }
                }
            }
        });
        Ok(Countdown {
            rt,
            interrupt: Interrupt { rx },
        })
    }

    /// A countdown driven by `interrupt` instead of the process signal.
    pub fn with_interrupt(interrupt: Interrupt) -> Result<Self> {
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BackupError::Runtime)?;
        Ok(Countdown { rt, interrupt })
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Prints `"<title> in <seconds>"` and counts down on stdout, one tick a
    /// second. Blocks until done or until Ctrl-C.
    pub fn run(&self, title: &str, seconds: u64) -> Result<()> {
        self.interrupt.check()?;
        let fired = self.interrupt.clone().fired();
        self.rt.block_on(async {
            let mut stdout = io::stdout().lock();
            countdown_until(title, seconds, &mut stdout, fired).await
        })
    }
}

/// Writes the countdown to `out`, returning `Err(Interrupted)` if `cancel`
/// resolves before the last tick has elapsed.
pub async fn countdown_until<W, F>(title: &str, seconds: u64, out: &mut W, cancel: F) -> Result<()>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(cancel);
    writeln!(out, "{title} in {seconds}").map_err(stdout_err)?;
    if seconds == 0 {
        return Ok(());
    }
    for i in (1..=seconds).rev() {
        write!(out, "{i} ").map_err(stdout_err)?;
        out.flush().map_err(stdout_err)?;
        tokio::select! {
            biased;
            _ = &mut cancel => {
                writeln!(out).map_err(stdout_err)?;
                return Err(BackupError::Interrupted);
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }
    writeln!(out).map_err(stdout_err)?;
    Ok(())
}

fn stdout_err(e: io::Error) -> BackupError {
    BackupError::io("<stdout>", e)
}
