// Mock backend for testing the pipeline without hardware.
//
// Every handle registers itself in a shared `ResourceLog` when created and
// again when dropped, so tests can check that each acquisition is released
// exactly once on every path.

use std::cell::Cell;
use std::collections::VecDeque;
use std::ops::Deref;
use std::rc::Rc;

use super::backend::{
    BackendError, BackendResult, CaptureBackend, MediaBuffer, MediaSample, MediaSource,
    SampleReader, VideoDevice,
};
use super::types::{PixelLayout, ReaderOptions, StreamFormat, VideoSubtype};

/// Kinds of native handles the pipeline acquires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Descriptor,
    Device,
    Reader,
    Sample,
    Buffer,
    Lock,
}

const RESOURCE_KINDS: usize = 6;

impl Resource {
    fn slot(self) -> usize {
        self as usize
    }
}

/// Acquire/release counters shared by all handles of one mock backend.
#[derive(Debug, Default)]
pub struct ResourceLog {
    acquired: [Cell<usize>; RESOURCE_KINDS],
    released: [Cell<usize>; RESOURCE_KINDS],
    reads: Cell<usize>,
    requested: std::cell::RefCell<Vec<PixelLayout>>,
    reader_options: std::cell::RefCell<Vec<ReaderOptions>>,
}

impl ResourceLog {
    pub fn acquired(&self, kind: Resource) -> usize {
        self.acquired[kind.slot()].get()
    }

    pub fn released(&self, kind: Resource) -> usize {
        self.released[kind.slot()].get()
    }

    /// Number of `read_sample` calls made.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Layouts requested through `request_layout`, in call order.
    pub fn requested_layouts(&self) -> Vec<PixelLayout> {
        self.requested.borrow().clone()
    }

    /// Options passed to `into_reader`, in call order.
    pub fn reader_options(&self) -> Vec<ReaderOptions> {
        self.reader_options.borrow().clone()
    }

    /// Every acquired handle has been released exactly once.
    pub fn balanced(&self) -> bool {
        (0..RESOURCE_KINDS).all(|i| self.acquired[i].get() == self.released[i].get())
    }
}

/// Ties a handle's lifetime to the log.
#[derive(Debug)]
struct Tracked {
    kind: Resource,
    log: Rc<ResourceLog>,
}

impl Tracked {
    fn new(kind: Resource, log: &Rc<ResourceLog>) -> Self {
        let cell = &log.acquired[kind.slot()];
        cell.set(cell.get() + 1);
        Self {
            kind,
            log: Rc::clone(log),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let cell = &self.log.released[self.kind.slot()];
        cell.set(cell.get() + 1);
    }
}

/// Outcome of one `read_sample` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    Sample,
    NoSample,
    Error,
}

/// Behaviour of the simulated camera.
#[derive(Debug, Clone)]
pub struct MockCamera {
    pub name: String,
    /// Layouts the device agrees to deliver when asked
    pub accepted_layouts: Vec<PixelLayout>,
    /// Format in effect before any request
    pub native: StreamFormat,
    pub fail_activation: bool,
    pub fail_reader: bool,
    pub fail_format_query: bool,
    pub fail_contiguous: bool,
    pub fail_lock: bool,
    /// Read outcomes in order; once exhausted `read_tail` repeats
    pub reads: Vec<ReadStep>,
    pub read_tail: ReadStep,
    /// Cut delivered buffers to this many bytes
    pub truncate_buffer: Option<usize>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    /// A 640x480 camera that accepts both candidate layouts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "Mock Camera".to_owned(),
            accepted_layouts: PixelLayout::CANDIDATES.to_vec(),
            native: StreamFormat {
                subtype: VideoSubtype::Other("YUY2".to_owned()),
                width: 640,
                height: 480,
                default_stride: Some(640 * 2),
            },
            fail_activation: false,
            fail_reader: false,
            fail_format_query: false,
            fail_contiguous: false,
            fail_lock: false,
            reads: Vec::new(),
            read_tail: ReadStep::Sample,
            truncate_buffer: None,
        }
    }

    #[must_use]
    pub fn with_accepted_layouts(mut self, layouts: &[PixelLayout]) -> Self {
        self.accepted_layouts = layouts.to_vec();
        self
    }

    #[must_use]
    pub fn with_native(mut self, native: StreamFormat) -> Self {
        self.native = native;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.native.width = width;
        self.native.height = height;
        self
    }

    #[must_use]
    pub fn with_reads(mut self, reads: &[ReadStep], tail: ReadStep) -> Self {
        self.reads = reads.to_vec();
        self.read_tail = tail;
        self
    }
}

/// Backend exposing `device_count` copies of one simulated camera.
pub struct MockBackend {
    camera: MockCamera,
    device_count: usize,
    fail_enumeration: bool,
    log: Rc<ResourceLog>,
}

impl MockBackend {
    pub fn new(camera: MockCamera) -> Self {
        Self {
            camera,
            device_count: 1,
            fail_enumeration: false,
            log: Rc::default(),
        }
    }

    /// Backend that enumerates no devices at all.
    pub fn empty() -> Self {
        Self::new(MockCamera::new()).with_device_count(0)
    }

    #[must_use]
    pub fn with_device_count(mut self, count: usize) -> Self {
        self.device_count = count;
        self
    }

    #[must_use]
    pub fn with_failed_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn log(&self) -> Rc<ResourceLog> {
        Rc::clone(&self.log)
    }
}

impl CaptureBackend for MockBackend {
    type Device = MockDescriptor;

    fn enumerate_devices(&mut self) -> BackendResult<Vec<MockDescriptor>> {
        if self.fail_enumeration {
            return Err(BackendError::new("MFEnumDeviceSources", "simulated failure"));
        }
        Ok((0..self.device_count)
            .map(|index| MockDescriptor {
                index,
                camera: self.camera.clone(),
                _tracked: Tracked::new(Resource::Descriptor, &self.log),
                log: Rc::clone(&self.log),
            })
            .collect())
    }
}

pub struct MockDescriptor {
    index: usize,
    camera: MockCamera,
    _tracked: Tracked,
    log: Rc<ResourceLog>,
}

impl VideoDevice for MockDescriptor {
    type Source = MockSource;

    fn friendly_name(&self) -> Option<String> {
        Some(format!("{} #{}", self.camera.name, self.index))
    }

    fn activate(&self) -> BackendResult<MockSource> {
        if self.camera.fail_activation {
            return Err(BackendError::new("ActivateObject", "simulated failure"));
        }
        Ok(MockSource {
            camera: self.camera.clone(),
            _tracked: Tracked::new(Resource::Device, &self.log),
            log: Rc::clone(&self.log),
        })
    }
}

pub struct MockSource {
    camera: MockCamera,
    _tracked: Tracked,
    log: Rc<ResourceLog>,
}

impl MediaSource for MockSource {
    type Reader = MockReader;

    fn into_reader(self, options: ReaderOptions) -> BackendResult<MockReader> {
        self.log.reader_options.borrow_mut().push(options);
        if self.camera.fail_reader {
            return Err(BackendError::new(
                "MFCreateSourceReaderFromMediaSource",
                "simulated failure",
            ));
        }
        let current = self.camera.native.clone();
        Ok(MockReader {
            reads: self.camera.reads.iter().copied().collect(),
            current,
            sequence: 0,
            _tracked: Tracked::new(Resource::Reader, &self.log),
            log: Rc::clone(&self.log),
            camera: self.camera,
        })
    }
}

pub struct MockReader {
    camera: MockCamera,
    current: StreamFormat,
    reads: VecDeque<ReadStep>,
    sequence: u32,
    _tracked: Tracked,
    log: Rc<ResourceLog>,
}

impl SampleReader for MockReader {
    type Sample = MockSample;

    fn request_layout(&mut self, layout: PixelLayout) -> BackendResult<()> {
        self.log.requested.borrow_mut().push(layout);
        if !self.camera.accepted_layouts.contains(&layout) {
            return Err(BackendError::new(
                "SetCurrentMediaType",
                format!("{layout:?} rejected"),
            ));
        }
        let stride = self.current.width as usize * layout.bytes_per_pixel();
        self.current = StreamFormat {
            subtype: match layout {
                PixelLayout::Bgr24 => VideoSubtype::Rgb24,
                PixelLayout::Bgrx32 => VideoSubtype::Rgb32,
            },
            default_stride: i32::try_from(stride).ok(),
            ..self.current.clone()
        };
        Ok(())
    }

    fn current_format(&mut self) -> BackendResult<StreamFormat> {
        if self.camera.fail_format_query {
            return Err(BackendError::new("GetCurrentMediaType", "simulated failure"));
        }
        Ok(self.current.clone())
    }

    fn read_sample(&mut self) -> BackendResult<Option<MockSample>> {
        self.log.reads.set(self.log.reads.get() + 1);
        let step = self.reads.pop_front().unwrap_or(self.camera.read_tail);
        match step {
            ReadStep::Error => Err(BackendError::new("ReadSample", "simulated failure")),
            ReadStep::NoSample => Ok(None),
            ReadStep::Sample => {
                let sequence = self.sequence;
                self.sequence += 1;
                let mut data = generate_frame(&self.current, sequence);
                if let Some(len) = self.camera.truncate_buffer {
                    data.truncate(len);
                }
                Ok(Some(MockSample {
                    sequence,
                    data: Rc::new(data),
                    fail_contiguous: self.camera.fail_contiguous,
                    fail_lock: self.camera.fail_lock,
                    _tracked: Tracked::new(Resource::Sample, &self.log),
                    log: Rc::clone(&self.log),
                }))
            }
        }
    }
}

pub struct MockSample {
    pub sequence: u32,
    data: Rc<Vec<u8>>,
    fail_contiguous: bool,
    fail_lock: bool,
    _tracked: Tracked,
    log: Rc<ResourceLog>,
}

impl MediaSample for MockSample {
    type Buffer = MockBuffer;

    fn to_contiguous(&self) -> BackendResult<MockBuffer> {
        if self.fail_contiguous {
            return Err(BackendError::new(
                "ConvertToContiguousBuffer",
                "simulated failure",
            ));
        }
        Ok(MockBuffer {
            sequence: self.sequence,
            data: Rc::clone(&self.data),
            fail_lock: self.fail_lock,
            _tracked: Tracked::new(Resource::Buffer, &self.log),
            log: Rc::clone(&self.log),
        })
    }
}

pub struct MockBuffer {
    pub sequence: u32,
    data: Rc<Vec<u8>>,
    fail_lock: bool,
    _tracked: Tracked,
    log: Rc<ResourceLog>,
}

impl MediaBuffer for MockBuffer {
    type Guard<'a> = MockLock<'a>;

    fn lock(&mut self) -> BackendResult<MockLock<'_>> {
        if self.fail_lock {
            return Err(BackendError::new("Lock", "simulated failure"));
        }
        Ok(MockLock {
            data: &self.data,
            _tracked: Tracked::new(Resource::Lock, &self.log),
        })
    }
}

pub struct MockLock<'a> {
    data: &'a [u8],
    _tracked: Tracked,
}

impl Deref for MockLock<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

/// Fill value for row padding bytes.
pub const PADDING_BYTE: u8 = 0xEE;
/// Value of the fourth channel in 32-bit frames.
pub const FILLER_BYTE: u8 = 0xAA;

/// Expected canonical pixel at (x, y) of sample `sequence`: B = x, G = y, R = sequence.
pub fn expected_pixel(x: u32, y: u32, sequence: u32) -> [u8; 3] {
    [x as u8, y as u8, sequence as u8]
}

/// Generate a frame in the stream's current layout.
///
/// Unknown subtypes are filled with 2 bytes per pixel of zeroes.
fn generate_frame(format: &StreamFormat, sequence: u32) -> Vec<u8> {
    let bpp = format.subtype.layout().map_or(2, PixelLayout::bytes_per_pixel);
    let row_bytes = format.width as usize * bpp;
    let stride = format
        .default_stride
        .map(|s| s.unsigned_abs() as usize)
        .filter(|&s| s >= row_bytes)
        .unwrap_or(row_bytes);

    let mut data = vec![PADDING_BYTE; stride * format.height as usize];
    if format.subtype.layout().is_none() {
        data.fill(0);
        return data;
    }

    for (y, row) in data.chunks_exact_mut(stride).enumerate() {
        for (x, px) in row[..row_bytes].chunks_exact_mut(bpp).enumerate() {
            let [b, g, r] = expected_pixel(x as u32, y as u32, sequence);
            px[0] = b;
            px[1] = g;
            px[2] = r;
            if bpp == 4 {
                px[3] = FILLER_BYTE;
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_logged() {
        let mut backend = MockBackend::new(MockCamera::new()).with_device_count(2);
        let log = backend.log();

        let devices = backend.enumerate_devices().expect("enumerate");
        assert_eq!(log.acquired(Resource::Descriptor), 2);

        let source = devices[0].activate().expect("activate");
        drop(devices);
        assert_eq!(log.released(Resource::Descriptor), 2);

        let reader = source.into_reader(ReaderOptions::default()).expect("reader");
        assert_eq!(log.released(Resource::Device), 1);

        drop(reader);
        assert!(log.balanced());
    }

    #[test]
    fn test_layout_request_changes_format() {
        let mut backend =
            MockBackend::new(MockCamera::new().with_accepted_layouts(&[PixelLayout::Bgrx32]));
        let devices = backend.enumerate_devices().expect("enumerate");
        let mut reader = devices[0]
            .activate()
            .and_then(|s| s.into_reader(ReaderOptions::default()))
            .expect("reader");

        assert!(reader.request_layout(PixelLayout::Bgr24).is_err());
        reader
            .request_layout(PixelLayout::Bgrx32)
            .expect("Bgrx32 accepted");
        let format = reader.current_format().expect("format");
        assert_eq!(format.subtype, VideoSubtype::Rgb32);
        assert_eq!(format.default_stride, Some(640 * 4));
    }

    #[test]
    fn test_generated_frame_pattern() {
        let format = StreamFormat {
            subtype: VideoSubtype::Rgb32,
            width: 4,
            height: 2,
            default_stride: Some(20),
        };
        let data = generate_frame(&format, 7);
        assert_eq!(data.len(), 40);
        // Second pixel of second row
        assert_eq!(&data[20 + 4..20 + 8], &[1, 1, 7, FILLER_BYTE]);
        // Row padding
        assert_eq!(&data[16..20], &[PADDING_BYTE; 4]);
    }
}
