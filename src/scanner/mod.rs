// src/scanner/mod.rs
//! Optical scanner loop: samples camera frames on a fixed interval, decodes
//! them and forwards each new payload, with repeats debounced.

pub mod camera;
pub mod debounce;
pub mod decoder;
pub mod session;

use camera::{Camera, CameraError, CameraGuard};
use debounce::Debouncer;
use decoder::CodeDecoder;
use std::time::Duration;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    RequestingPermission,
    Streaming,
    /// Terminal: the scanner will not ask again.
    PermissionDenied,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("scanner is already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy)]
pub struct ScannerConfig {
    pub scan_interval: Duration,
    pub debounce_window: Duration,
    /// Capacity of the payload channel handed to the caller.
    pub buffer: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            buffer: 16,
        }
    }
}

pub struct Scanner {
    config: ScannerConfig,
    state: watch::Sender<ScannerState>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        let (state, _) = watch::channel(ScannerState::Idle);
        Scanner {
            config,
            state,
            stop_tx: None,
            task: None,
        }
    }

    pub fn state(&self) -> ScannerState {
        *self.state.borrow()
    }

    /// Watch handle for state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ScannerState> {
        self.state.subscribe()
    }

    /// Acquires the camera and starts the scan loop. Decoded, debounced
    /// payloads arrive on the returned receiver; dropping it stops the loop.
    pub async fn start<C: Camera, D: CodeDecoder>(
        &mut self,
        mut camera: C,
        decoder: D,
    ) -> Result<mpsc::Receiver<String>, ScanError> {
        match self.state() {
            ScannerState::PermissionDenied => return Err(ScanError::PermissionDenied),
            ScannerState::Idle => {}
            _ => return Err(ScanError::AlreadyRunning),
        }
        // A loop that ended on its own (receiver dropped) leaves a finished task behind
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Err(ScanError::AlreadyRunning);
        }

        self.state.send_replace(ScannerState::RequestingPermission);
        tracing::info!("📷 Requesting camera access...");

        if let Err(e) = camera.request_access().await {
            camera.release();
            return Err(match e {
                CameraError::PermissionDenied => {
                    tracing::warn!("Camera permission denied.");
                    self.state.send_replace(ScannerState::PermissionDenied);
                    ScanError::PermissionDenied
                }
                CameraError::Unavailable(reason) => {
                    tracing::error!("Camera unavailable: {}", reason);
                    self.state.send_replace(ScannerState::Idle);
                    ScanError::CameraUnavailable(reason)
                }
            });
        }

        let (payload_tx, payload_rx) = mpsc::channel(self.config.buffer);
        let (stop_tx, stop_rx) = oneshot::channel();

        self.state.send_replace(ScannerState::Streaming);
        tracing::info!("✅ Scanner streaming every {:?}.", self.config.scan_interval);

        let task = tokio::spawn(scan_loop(
            CameraGuard(camera),
            decoder,
            self.config,
            payload_tx,
            stop_rx,
            self.state.clone(),
        ));
        self.stop_tx = Some(stop_tx);
        self.task = Some(task);

        Ok(payload_rx)
    }

    /// Stops the loop and waits until the camera has been released.
    pub async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Scan loop ended abnormally: {}", e);
            }
        }
        if self.state() != ScannerState::PermissionDenied {
            self.state.send_replace(ScannerState::Idle);
        }
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        // Dropping the stop sender ends the loop, which releases the camera
        self.stop_tx.take();
    }
}

async fn scan_loop<C: Camera, D: CodeDecoder>(
    mut camera: CameraGuard<C>,
    mut decoder: D,
    config: ScannerConfig,
    payload_tx: mpsc::Sender<String>,
    mut stop_rx: oneshot::Receiver<()>,
    state: watch::Sender<ScannerState>,
) {
    let mut ticker = tokio::time::interval(config.scan_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut debouncer = Debouncer::new(config.debounce_window);

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                tracing::debug!("Scan loop stopped.");
                break;
            }
            _ = ticker.tick() => {
                let Some(frame) = camera.0.capture_frame() else {
                    continue; // no data yet
                };
                let Some(payload) = decoder.decode(&frame) else {
                    continue;
                };
                if !debouncer.admit(&payload, Instant::now()) {
                    tracing::trace!("Debounced repeat scan: {}", payload);
                    continue;
                }
                tracing::debug!("Scanned: {}", payload);
                // A consumer that stops reading must not keep stop() waiting
                tokio::select! {
                    _ = &mut stop_rx => {
                        tracing::debug!("Scan loop stopped while the payload channel was full.");
                        break;
                    }
                    sent = payload_tx.send(payload) => {
                        if sent.is_err() {
                            tracing::debug!("Payload receiver dropped, ending scan loop.");
                            break;
                        }
                    }
                }
            }
        }
    }

    drop(camera);
    state.send_replace(ScannerState::Idle);
}
