// src/scanner/camera.rs
use std::future::Future;
use thiserror::Error;

/// One greyscale frame, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl Frame {
    pub fn is_complete(&self) -> bool {
        self.luma.len() == self.width as usize * self.height as usize
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

/// A video source the scanner samples frames from.
pub trait Camera: Send + 'static {
    /// Asks for access to the device. Called once per start.
    fn request_access(&mut self) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Latest frame, or `None` when the stream has no data yet.
    fn capture_frame(&mut self) -> Option<Frame>;

    /// Gives the device back. Must be safe to call more than once.
    fn release(&mut self);
}

// Releases the camera when the scan loop ends, however it ends
pub(crate) struct CameraGuard<C: Camera>(pub C);

impl<C: Camera> Drop for CameraGuard<C> {
    fn drop(&mut self) {
        self.0.release();
        tracing::debug!("📷 Camera released.");
    }
}
