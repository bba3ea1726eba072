//! Test fixtures and data for orchestrator tests
//!
//! This module provides consistent test data and fixtures used across all test suites.

use chrono::{DateTime, TimeZone, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shared::InputFile;
use worker::{TransformError, TransformInput, Transformer};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Content the recording transformer refuses to decode
    pub const CORRUPT: &'static [u8] = b"corrupt";

    pub const DEFAULT_MAX_WORKERS: usize = 4;

    /// Fixed modification time so exported metadata is predictable
    pub fn modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 9, 30, 0).unwrap()
    }

    /// `photo_<i>.jpg` with content `[i, b'x']`
    pub fn file(index: usize) -> InputFile {
        InputFile::from_bytes(format!("photo_{index}.jpg"), Self::modified(), vec![index as u8, b'x'])
    }

    pub fn files(count: usize) -> Vec<InputFile> {
        (0..count).map(Self::file).collect()
    }

    /// `count` files where the one at `corrupt_index` cannot be transformed
    pub fn files_with_corrupt(count: usize, corrupt_index: usize) -> Vec<InputFile> {
        (0..count)
            .map(|i| {
                if i == corrupt_index {
                    InputFile::from_bytes(format!("photo_{i}.jpg"), Self::modified(), Self::CORRUPT.to_vec())
                } else {
                    Self::file(i)
                }
            })
            .collect()
    }

    /// Solid-color PNG of the given size
    pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    pub fn png_files(count: usize) -> Vec<InputFile> {
        (0..count)
            .map(|i| {
                let content = Self::png(8 + i as u32 * 4, 8, [i as u8 * 40, 0, 0]);
                InputFile::from_bytes(format!("scan_{i}.png"), Self::modified(), content)
            })
            .collect()
    }
}

/// One transform call as seen from inside a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformCall {
    pub thread: String,
    pub file: String,
}

/// Transformer recording every call, reversing content and rejecting [`TestFixtures::CORRUPT`]
#[derive(Clone, Default)]
pub struct RecordingTransformer {
    pub inits: Arc<AtomicUsize>,
    pub calls: Arc<Mutex<Vec<TransformCall>>>,
    pub delay: Duration,
}

impl RecordingTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block each transform for `delay` on its unit thread
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<TransformCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Files handled by `thread`, in the order it handled them
    pub fn files_on(&self, thread: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.thread == thread)
            .map(|call| call.file)
            .collect()
    }
}

impl Transformer for RecordingTransformer {
    type Engine = ();

    fn initialize(&self) -> Result<(), TransformError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn transform(&self, _: &(), input: &TransformInput<'_>) -> Result<Vec<u8>, TransformError> {
        self.calls.lock().unwrap().push(TransformCall {
            thread: std::thread::current().name().unwrap_or_default().to_string(),
            file: input.name.to_string(),
        });

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if input.content == TestFixtures::CORRUPT {
            return Err(TransformError::Decode {
                name: input.name.to_string(),
                reason: "unsupported image format".to_string(),
            });
        }
        Ok(input.content.iter().rev().copied().collect())
    }
}
