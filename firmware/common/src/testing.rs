//! Test doubles for every platform collaborator.

use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::bmp::{HEADER_LEN, INFO_HEADER_LEN, row_stride};
use crate::error::{ErrorKind, StatusCode};
use crate::files::{FileError, FileReader};
use crate::input::{InputEvents, Key, Wake};
use crate::render::{FrameAllocator, HeapAllocator};
use crate::sequencer::{BootCandidate, ImageLoader, LoadError};
use crate::status::StatusReporter;
use crate::surface::TargetSurface;

// =============================================================================
// Bitmap files
// =============================================================================

/// Largest gap written between the headers and the pixel rows.
const MAX_GAP: usize = 4096;

/// Writes bitmap files with arbitrary (possibly invalid) header fields.
pub struct BitmapBuilder {
    width: i32,
    height: i32,
    bit_depth: u16,
    compression: u32,
    pixel_offset: u32,
}

impl BitmapBuilder {
    /// 24-bit uncompressed image; a negative `height` means top-down.
    pub const fn new(
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            width,
            height,
            bit_depth: 24,
            compression: 0,
            pixel_offset: HEADER_LEN as u32,
        }
    }

    pub const fn bit_depth(
        mut self,
        bit_depth: u16,
    ) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub const fn compression(
        mut self,
        compression: u32,
    ) -> Self {
        self.compression = compression;
        self
    }

    /// Value of the pixel offset field. Rows are written at that offset when
    /// it is close to the headers, otherwise directly after them.
    pub const fn pixel_offset(
        mut self,
        offset: u32,
    ) -> Self {
        self.pixel_offset = offset;
        self
    }

    /// Both headers and nothing else.
    pub fn header_only(&self) -> Vec<u8> {
        let mut bytes = vec![0; HEADER_LEN];
        bytes[0..2].copy_from_slice(b"BM");
        bytes[2..6].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        bytes[10..14].copy_from_slice(&self.pixel_offset.to_le_bytes());
        bytes[14..18].copy_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
        bytes[18..22].copy_from_slice(&self.width.to_le_bytes());
        bytes[22..26].copy_from_slice(&self.height.to_le_bytes());
        bytes[26..28].copy_from_slice(&1u16.to_le_bytes());
        bytes[28..30].copy_from_slice(&self.bit_depth.to_le_bytes());
        bytes[30..34].copy_from_slice(&self.compression.to_le_bytes());
        bytes
    }

    /// Complete file; `color(x, y)` gives the pixel shown at display row `y`.
    pub fn build(
        &self,
        color: impl Fn(u32, u32) -> Rgb888,
    ) -> Vec<u8> {
        let height = self.height.unsigned_abs();
        let top_down = self.height < 0;
        self.build_stored(|x, row| {
            let y = if top_down { row } else { height - 1 - row };
            color(x, y)
        })
    }

    /// Complete file; `color(x, row)` gives the pixel at stored row `row`.
    pub fn build_stored(
        &self,
        color: impl Fn(u32, u32) -> Rgb888,
    ) -> Vec<u8> {
        let width = self.width.max(0) as u32;
        let height = self.height.unsigned_abs();
        let stride = row_stride(width);

        let mut bytes = self.header_only();
        let gap = (self.pixel_offset as usize).saturating_sub(HEADER_LEN);
        if gap <= MAX_GAP {
            bytes.resize(HEADER_LEN + gap, 0);
        }
        for row in 0..height {
            let start = bytes.len();
            for x in 0..width {
                let c = color(x, row);
                bytes.extend_from_slice(&[c.b(), c.g(), c.r()]);
            }
            bytes.resize(start + stride, 0);
        }

        let len = bytes.len() as u32;
        bytes[2..6].copy_from_slice(&len.to_le_bytes());
        bytes
    }
}

// =============================================================================
// Surface
// =============================================================================

/// Content of a fresh surface, distinct from the background.
pub const STALE: Rgb888 = Rgb888::new(1, 2, 3);

/// Surface failure injected by tests.
#[derive(Debug)]
pub struct SurfaceFault;

/// In-memory surface that counts every transfer.
pub struct RecordingSurface {
    size: Size,
    pixels: Vec<Rgb888>,
    pub fills: u32,
    pub buffer_blits: u32,
    pub row_blits: u32,
    pub out_of_bounds_writes: u32,
    pub fail_transfers: bool,
    /// Reported by `mode()`.
    pub mode: Option<(u32, u32)>,
}

impl RecordingSurface {
    pub fn new(
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            size: Size::new(width, height),
            pixels: vec![STALE; (width * height) as usize],
            fills: 0,
            buffer_blits: 0,
            row_blits: 0,
            out_of_bounds_writes: 0,
            fail_transfers: false,
            mode: None,
        }
    }

    pub fn pixel(
        &self,
        x: u32,
        y: u32,
    ) -> Rgb888 {
        self.pixels[(y * self.size.width + x) as usize]
    }

    pub fn pixels(&self) -> &[Rgb888] { &self.pixels }

    /// Bulk plus per-row transfers.
    pub const fn image_transfers(&self) -> u32 { self.buffer_blits + self.row_blits }

    fn put(
        &mut self,
        point: Point,
        color: Rgb888,
    ) {
        let inside = point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.size.width
            && (point.y as u32) < self.size.height;
        if inside {
            let index = point.y as u32 * self.size.width + point.x as u32;
            self.pixels[index as usize] = color;
        } else {
            self.out_of_bounds_writes += 1;
        }
    }
}

impl TargetSurface for RecordingSurface {
    type Error = SurfaceFault;
    type Pixel = Rgb888;

    fn resolution(&self) -> Size { self.size }

    fn mode(&self) -> Option<(u32, u32)> { self.mode }

    fn fill_rect(
        &mut self,
        color: Rgb888,
        area: Rectangle,
    ) -> Result<(), SurfaceFault> {
        if self.fail_transfers {
            return Err(SurfaceFault);
        }
        self.fills += 1;
        for point in area.points() {
            self.put(point, color);
        }
        Ok(())
    }

    fn blit_buffer(
        &mut self,
        pixels: &[Rgb888],
        stride: usize,
        src: Rectangle,
        dest: Point,
    ) -> Result<(), SurfaceFault> {
        if self.fail_transfers {
            return Err(SurfaceFault);
        }
        self.buffer_blits += 1;
        for row in 0..src.size.height as i32 {
            for col in 0..src.size.width as i32 {
                let index = (src.top_left.y + row) as usize * stride + (src.top_left.x + col) as usize;
                self.put(dest + Point::new(col, row), pixels[index]);
            }
        }
        Ok(())
    }

    fn blit_row(
        &mut self,
        pixels: &[Rgb888],
        dest: Point,
    ) -> Result<(), SurfaceFault> {
        if self.fail_transfers {
            return Err(SurfaceFault);
        }
        self.row_blits += 1;
        for (x, &color) in pixels.iter().enumerate() {
            self.put(dest + Point::new(x as i32, 0), color);
        }
        Ok(())
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// Refuses any buffer longer than `max_len` pixels.
pub struct LimitedAllocator {
    max_len: usize,
    pub requests: Vec<usize>,
}

impl LimitedAllocator {
    pub const fn new(max_len: usize) -> Self {
        Self {
            max_len,
            requests: Vec::new(),
        }
    }
}

impl FrameAllocator for LimitedAllocator {
    fn try_alloc<P: Copy>(
        &mut self,
        len: usize,
        fill: P,
    ) -> Option<Vec<P>> {
        self.requests.push(len);
        if len > self.max_len {
            return None;
        }
        HeapAllocator.try_alloc(len, fill)
    }
}

// =============================================================================
// Input
// =============================================================================

/// Input failure injected by tests.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InputFault;

/// Console with a virtual clock and keys scheduled at fixed times.
///
/// Waiting advances the clock to the next event, so tests run instantly.
pub struct ScriptedInput {
    pub now_ms: u64,
    /// Arrival time and key; `None` is a key signal with no key behind it.
    events: VecDeque<(u64, Option<Key>)>,
    deadline: Option<u64>,
    next_timer: u32,
    pub armed: u32,
    pub disarmed: u32,
    pub fail_arm: bool,
    pub fail_wait: bool,
}

impl ScriptedInput {
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            events: VecDeque::new(),
            deadline: None,
            next_timer: 0,
            armed: 0,
            disarmed: 0,
            fail_arm: false,
            fail_wait: false,
        }
    }

    /// Schedule `key` at `at_ms`. Calls must be in time order.
    pub fn key_at(
        mut self,
        at_ms: u64,
        key: Key,
    ) -> Self {
        self.events.push_back((at_ms, Some(key)));
        self
    }

    /// Schedule a key signal that yields no key.
    pub fn spurious_at(
        mut self,
        at_ms: u64,
    ) -> Self {
        self.events.push_back((at_ms, None));
        self
    }

    /// Keys not consumed yet, delivered or not.
    pub fn pending_keys(&self) -> usize { self.events.iter().filter(|(_, key)| key.is_some()).count() }

    /// Whether a timer is still armed.
    pub const fn timer_armed(&self) -> bool { self.deadline.is_some() }
}

impl InputEvents for ScriptedInput {
    type Error = InputFault;
    type Timer = u32;

    fn read_key(&mut self) -> Result<Option<Key>, InputFault> {
        match self.events.front() {
            Some(&(at, key)) if at <= self.now_ms => {
                self.events.pop_front();
                Ok(key)
            }
            _ => Ok(None),
        }
    }

    fn arm_timer(
        &mut self,
        timeout_ms: u32,
    ) -> Result<u32, InputFault> {
        if self.fail_arm {
            return Err(InputFault);
        }
        self.armed += 1;
        self.next_timer += 1;
        self.deadline = Some(self.now_ms + u64::from(timeout_ms));
        Ok(self.next_timer)
    }

    fn wait(
        &mut self,
        timer: Option<&u32>,
    ) -> Result<Wake, InputFault> {
        if self.fail_wait {
            return Err(InputFault);
        }
        let deadline = timer.and(self.deadline);
        let next_key = self.events.front().map(|&(at, _)| at);

        match (next_key, deadline) {
            (Some(at), Some(deadline)) if at > deadline => {
                self.now_ms = self.now_ms.max(deadline);
                Ok(Wake::Timer)
            }
            (Some(at), _) => {
                self.now_ms = self.now_ms.max(at);
                Ok(Wake::Key)
            }
            (None, Some(deadline)) => {
                self.now_ms = self.now_ms.max(deadline);
                Ok(Wake::Timer)
            }
            // Nothing would ever wake this wait
            (None, None) => Err(InputFault),
        }
    }

    fn disarm_timer(
        &mut self,
        _timer: u32,
    ) {
        self.disarmed += 1;
        self.deadline = None;
    }

    fn stall(
        &mut self,
        ms: u32,
    ) {
        self.now_ms += u64::from(ms);
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Starts only the listed paths; everything else fails with `NotFound`.
pub struct ScriptedLoader {
    bootable: Vec<String>,
    attempted: Vec<String>,
}

impl ScriptedLoader {
    /// Status returned for every failed attempt.
    pub const FAILURE_STATUS: StatusCode = StatusCode::NOT_FOUND;

    pub fn succeeding(paths: &[&str]) -> Self {
        Self {
            bootable: paths.iter().map(ToString::to_string).collect(),
            attempted: Vec::new(),
        }
    }

    /// Paths tried so far, in order.
    pub fn attempted(&self) -> &[String] { &self.attempted }
}

impl ImageLoader for ScriptedLoader {
    fn load_and_start(
        &mut self,
        candidate: &BootCandidate,
    ) -> Result<(), LoadError> {
        self.attempted.push(candidate.path().to_string());
        if self.bootable.iter().any(|path| path == candidate.path()) {
            Ok(())
        } else {
            Err(LoadError {
                kind: ErrorKind::NotFound,
                status: Self::FAILURE_STATUS,
            })
        }
    }
}

// =============================================================================
// Files
// =============================================================================

/// Map-backed volume.
pub struct MemoryFiles {
    files: Vec<(String, Result<Vec<u8>, FileError>)>,
}

impl MemoryFiles {
    pub const fn new() -> Self { Self { files: Vec::new() } }

    pub fn with(
        mut self,
        path: &str,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push((path.to_string(), Ok(bytes)));
        self
    }

    /// `path` exists but reading it fails with `status`.
    pub fn failing(
        mut self,
        path: &str,
        status: StatusCode,
    ) -> Self {
        self.files.push((path.to_string(), Err(FileError::Device(status))));
        self
    }
}

impl FileReader for MemoryFiles {
    fn read_whole(
        &mut self,
        path: &str,
    ) -> Result<Vec<u8>, FileError> {
        self.files
            .iter()
            .find(|(name, _)| name == path)
            .map_or(Err(FileError::NotFound), |(_, contents)| contents.clone())
    }
}

// =============================================================================
// Reporter
// =============================================================================

/// One captured status message.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Report {
    Error {
        title: String,
        message: String,
        kind: ErrorKind,
        status: Option<StatusCode>,
    },
    Warning {
        title: String,
        message: String,
    },
    Info(String),
}

/// Captures every message in order.
#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Vec<Report>,
}

impl StatusReporter for RecordingReporter {
    fn report_error(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
        kind: ErrorKind,
        status: Option<StatusCode>,
    ) {
        self.reports.push(Report::Error {
            title: title.to_string(),
            message: message.to_string(),
            kind,
            status,
        });
    }

    fn report_warning(
        &mut self,
        title: &str,
        message: fmt::Arguments<'_>,
    ) {
        self.reports.push(Report::Warning {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn report_info(
        &mut self,
        message: fmt::Arguments<'_>,
    ) {
        self.reports.push(Report::Info(message.to_string()));
    }
}
