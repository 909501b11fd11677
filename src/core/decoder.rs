//! Asynchronous image decoding keyed by scene entity.
//!
//! Each request gets a fresh generation for its [`ImageKey`]. A newer
//! request for the same key cancels the older one: if it has not started
//! it is skipped, and if it finishes anyway its result is dropped in
//! [`ImageDecoder::poll`] because the generation no longer matches.
//! Results travel back over a crossbeam channel and are drained once per
//! UI frame.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use image::RgbaImage;
use log::{debug, trace, warn};

use super::workers::{CancelToken, Workers};
use crate::entities::LayerId;
use crate::entities::data_url::{DataUrlError, decode_data_url};

/// What a decoded bitmap belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKey {
    Background,
    Layer(LayerId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Source(DataUrlError),
    Image(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Source(e) => write!(f, "Unreadable image source: {}", e),
            DecodeError::Image(msg) => write!(f, "Image decode failed: {}", msg),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Source(e) => Some(e),
            DecodeError::Image(_) => None,
        }
    }
}

impl From<DataUrlError> for DecodeError {
    fn from(e: DataUrlError) -> Self {
        DecodeError::Source(e)
    }
}

/// Decode a data URL into an RGBA bitmap.
pub fn decode_image_url(url: &str) -> Result<RgbaImage, DecodeError> {
    let bytes = decode_data_url(url)?;
    let img = image::load_from_memory(&bytes).map_err(|e| DecodeError::Image(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Finished decode, already checked against the latest generation.
#[derive(Debug)]
pub enum DecodeOutcome {
    Ready { key: ImageKey, image: RgbaImage },
    Failed { key: ImageKey, error: DecodeError },
}

struct DecodeMessage {
    key: ImageKey,
    generation: u64,
    result: Result<RgbaImage, DecodeError>,
}

struct Pending {
    generation: u64,
    cancel: CancelToken,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct ImageDecoder {
    workers: Workers,
    tx: Sender<DecodeMessage>,
    rx: Receiver<DecodeMessage>,
    pending: HashMap<ImageKey, Pending>,
    next_generation: u64,
    waker: Option<Waker>,
}

impl ImageDecoder {
    pub fn new(num_threads: usize) -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        Ok(Self {
            workers: Workers::new(num_threads)?,
            tx,
            rx,
            pending: HashMap::new(),
            next_generation: 1,
            waker: None,
        })
    }

    /// Called from a worker after each finished decode (e.g. request a repaint).
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    /// Queue a decode for `key`, superseding any earlier request for it.
    pub fn request(&mut self, key: ImageKey, url: &str) -> u64 {
        self.cancel(key);

        let generation = self.next_generation;
        self.next_generation += 1;
        let cancel = CancelToken::new();
        self.pending.insert(
            key,
            Pending {
                generation,
                cancel: cancel.clone(),
            },
        );

        let url = url.to_owned();
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let token = cancel.clone();
        self.workers.execute_cancellable(cancel, move || {
            let result = decode_image_url(&url);
            if token.is_cancelled() {
                return;
            }
            // Receiver gone means the app is shutting down
            if tx.send(DecodeMessage { key, generation, result }).is_ok() {
                if let Some(wake) = waker {
                    wake();
                }
            }
        });

        debug!("Decode requested: {:?} gen {}", key, generation);
        generation
    }

    /// Drop any outstanding request for `key`.
    pub fn cancel(&mut self, key: ImageKey) {
        if let Some(prev) = self.pending.remove(&key) {
            trace!("Decode cancelled: {:?} gen {}", key, prev.generation);
            prev.cancel.cancel();
        }
    }

    pub fn is_pending(&self, key: ImageKey) -> bool {
        self.pending.contains_key(&key)
    }

    /// Collect finished decodes, discarding stale generations.
    pub fn poll(&mut self) -> Vec<DecodeOutcome> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            let current = self.pending.get(&msg.key).map(|p| p.generation);
            if current != Some(msg.generation) {
                trace!("Discarding stale decode {:?} gen {}", msg.key, msg.generation);
                continue;
            }
            self.pending.remove(&msg.key);
            match msg.result {
                Ok(image) => {
                    debug!("Decoded {:?}: {}x{}", msg.key, image.width(), image.height());
                    out.push(DecodeOutcome::Ready { key: msg.key, image });
                }
                Err(error) => {
                    warn!("Failed to load image for {:?}: {}", msg.key, error);
                    out.push(DecodeOutcome::Failed { key: msg.key, error });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::data_url::encode_data_url;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn png_url(w: u32, h: u32) -> String {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([255, 128, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        encode_data_url("image/png", &bytes)
    }

    fn poll_until_idle(decoder: &mut ImageDecoder, key: ImageKey) -> Vec<DecodeOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while decoder.is_pending(key) && Instant::now() < deadline {
            out.extend(decoder.poll());
            std::thread::sleep(Duration::from_millis(2));
        }
        out
    }

    #[test]
    fn test_decode_image_url() {
        let img = decode_image_url(&png_url(3, 2)).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(matches!(decode_image_url("data:image/png;base64,AAAA"), Err(DecodeError::Image(_))));
        assert!(matches!(decode_image_url("nope"), Err(DecodeError::Source(_))));
    }

    #[test]
    fn test_request_delivers_bitmap() {
        let mut decoder = ImageDecoder::new(1).unwrap();
        decoder.request(ImageKey::Background, &png_url(4, 2));
        let out = poll_until_idle(&mut decoder, ImageKey::Background);
        assert_eq!(out.len(), 1);
        match &out[0] {
            DecodeOutcome::Ready { key, image } => {
                assert_eq!(*key, ImageKey::Background);
                assert_eq!(image.dimensions(), (4, 2));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let mut decoder = ImageDecoder::new(2).unwrap();
        let key = ImageKey::Layer(LayerId::new());
        let first = decoder.request(key, &png_url(8, 8));
        let second = decoder.request(key, &png_url(2, 6));
        assert!(second > first);

        let out = poll_until_idle(&mut decoder, key);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], DecodeOutcome::Ready { image, .. } if image.dimensions() == (2, 6)));
    }

    #[test]
    fn test_failure_is_reported_once() {
        let mut decoder = ImageDecoder::new(1).unwrap();
        let key = ImageKey::Layer(LayerId::new());
        decoder.request(key, "data:image/png;base64,AAAA");
        let out = poll_until_idle(&mut decoder, key);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], DecodeOutcome::Failed { key: k, .. } if *k == key));
        assert!(!decoder.is_pending(key));
    }

    #[test]
    fn test_cancel_drops_result() {
        let mut decoder = ImageDecoder::new(1).unwrap();
        let key = ImageKey::Layer(LayerId::new());
        decoder.request(key, &png_url(2, 2));
        decoder.cancel(key);
        assert!(!decoder.is_pending(key));

        std::thread::sleep(Duration::from_millis(100));
        assert!(decoder.poll().is_empty());
    }
}
