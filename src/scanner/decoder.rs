// src/scanner/decoder.rs
use crate::scanner::camera::Frame;

/// Turns a frame into the payload of the first readable code in it.
pub trait CodeDecoder: Send + 'static {
    fn decode(&mut self, frame: &Frame) -> Option<String>;
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl CodeDecoder for QrDecoder {
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        if !frame.is_complete() || frame.width == 0 {
            return None;
        }
        let width = frame.width as usize;
        let mut image = rqrr::PreparedImage::prepare_from_greyscale(width, frame.height as usize, |x, y| {
            frame.luma[y * width + x]
        });

        image.detect_grids().into_iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(content),
            Err(e) => {
                tracing::trace!("QR grid found but not decodable: {:?}", e);
                None
            }
        })
    }
}
