//! Background serial reader.
//!
//! Spawns a thread that owns a blocking byte source (serial port, stdin, …)
//! and forwards bytes through a bounded channel. The control loop drains it
//! with the non-blocking [`SerialRx`] primitive, one queued byte at a time.
//!
//! Safety: each `SerialPump` owns exactly one thread. On drop the shutdown
//! flag is raised; the thread is joined if it has already exited, otherwise
//! it is left to finish its current blocking read and exit on its own.
use crossbeam_channel as xch;
use diffdrive_traits::{HwResult, SerialRx};
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub struct SerialPump {
    rx: xch::Receiver<u8>,
    overruns: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SerialPump {
    /// Spawn the reader thread. `capacity` bounds the receive queue; bytes
    /// arriving while it is full are dropped and counted as overruns.
    pub fn spawn<S: Read + Send + 'static>(mut source: S, capacity: usize) -> Self {
        let (tx, rx) = xch::bounded(capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let overruns = Arc::new(AtomicU64::new(0));
        let overruns_clone = overruns.clone();

        let join_handle = std::thread::spawn(move || {
            let mut chunk = [0u8; 64];
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("serial pump received shutdown signal");
                    break;
                }
                let n = match source.read(&mut chunk) {
                    Ok(0) => {
                        tracing::debug!("serial source reached EOF");
                        break;
                    }
                    Ok(n) => n,
                    Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "serial read failed, pump exiting");
                        break;
                    }
                };
                for &b in &chunk[..n] {
                    match tx.try_send(b) {
                        Ok(()) => {}
                        Err(xch::TrySendError::Full(_)) => {
                            overruns_clone.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(xch::TrySendError::Disconnected(_)) => {
                            tracing::debug!("serial consumer disconnected, exiting thread");
                            return;
                        }
                    }
                }
            }
            tracing::trace!("serial pump exiting cleanly");
        });

        Self {
            rx,
            overruns,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Non-blocking receiver handle for the command link.
    pub fn receiver(&self) -> PumpRx {
        PumpRx {
            rx: self.rx.clone(),
        }
    }

    /// Bytes dropped because the queue was full.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// True once the reader thread has exited (EOF or error).
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished)
    }
}

impl Drop for SerialPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if !handle.is_finished() {
                // Blocked in read(); it will observe the flag on return.
                tracing::trace!("serial pump still blocked in read, detaching");
                return;
            }
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "serial pump thread panicked during shutdown");
            }
        }
    }
}

/// Receiving end of a [`SerialPump`].
#[derive(Clone)]
pub struct PumpRx {
    rx: xch::Receiver<u8>,
}

impl SerialRx for PumpRx {
    fn read_byte(&mut self) -> HwResult<Option<u8>> {
        match self.rx.try_recv() {
            Ok(b) => Ok(Some(b)),
            Err(xch::TryRecvError::Empty | xch::TryRecvError::Disconnected) => Ok(None),
        }
    }
}
