// Media Foundation capture backend
//
// Device enumeration via MFEnumDeviceSources, activation into an IMFMediaSource,
// and sample reading through IMFSourceReader. COM references are released by
// the `windows` crate's Drop impls, so each wrapper below releases its handle
// exactly once when it goes out of scope.

use std::ptr;
use std::slice;

use windows::core::{GUID, PWSTR};
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::Media::MediaFoundation::{
    IMFActivate, IMFAttributes, IMFMediaBuffer, IMFMediaSource, IMFSample, IMFSourceReader,
    MFCreateAttributes, MFCreateMediaType, MFCreateSourceReaderFromMediaSource,
    MFEnumDeviceSources, MFMediaType_Video, MFShutdown, MFStartup, MFVideoFormat_ARGB32,
    MFVideoFormat_RGB24, MFVideoFormat_RGB32, MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME,
    MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE, MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
    MF_MT_DEFAULT_STRIDE, MF_MT_FRAME_SIZE, MF_MT_MAJOR_TYPE, MF_MT_SUBTYPE,
    MF_SOURCE_READER_ENABLE_VIDEO_PROCESSING, MF_SOURCE_READER_FIRST_VIDEO_STREAM, MF_VERSION,
};
use windows::Win32::System::Com::{
    CoInitializeEx, CoTaskMemFree, CoUninitialize, COINIT_MULTITHREADED,
};

use super::backend::{
    BackendError, BackendResult, CaptureBackend, MediaBuffer, MediaSample, MediaSource,
    SampleReader, VideoDevice,
};
use super::subsystem::Runtime;
use super::types::{PixelLayout, ReaderOptions, StreamFormat, VideoSubtype};

const FIRST_VIDEO_STREAM: u32 = MF_SOURCE_READER_FIRST_VIDEO_STREAM.0 as u32;

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// COM (multithreaded apartment) + Media Foundation platform.
#[derive(Debug, Default)]
pub struct MediaFoundationRuntime {
    /// We initialized COM on this thread and owe a CoUninitialize
    com_owned: bool,
}

impl MediaFoundationRuntime {
    fn release_com(&mut self) {
        if std::mem::take(&mut self.com_owned) {
            // SAFETY: balances the successful CoInitializeEx in startup()
            unsafe { CoUninitialize() };
        }
    }
}

impl Runtime for MediaFoundationRuntime {
    fn startup(&mut self) -> Result<(), BackendError> {
        // SAFETY: plain COM initialization for the calling thread.
        // RPC_E_CHANGED_MODE means the thread already runs in another apartment,
        // which Media Foundation tolerates; we just must not uninitialize it.
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr.is_ok() {
            self.com_owned = true;
        } else if hr != RPC_E_CHANGED_MODE {
            return Err(BackendError::new(
                "CoInitializeEx",
                format!("0x{:08X}", hr.0),
            ));
        }

        // SAFETY: MFStartup has no preconditions beyond COM being usable
        if let Err(err) = unsafe { MFStartup(MF_VERSION, 0) } {
            self.release_com();
            return Err(("MFStartup", err).into());
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        // SAFETY: called once per successful startup()
        if let Err(err) = unsafe { MFShutdown() } {
            tracing::warn!("MFShutdown failed: {err}");
        }
        self.release_com();
    }
}

// ---------------------------------------------------------------------------
// Device enumeration
// ---------------------------------------------------------------------------

fn create_attributes(initial_size: u32) -> BackendResult<IMFAttributes> {
    let mut attributes = None;
    // SAFETY: out-pointer to a local Option
    unsafe { MFCreateAttributes(&mut attributes, initial_size) }
        .map_err(|err| BackendError::from(("MFCreateAttributes", err)))?;
    attributes.ok_or_else(|| BackendError::new("MFCreateAttributes", "returned null"))
}

/// Media Foundation video-capture device source.
#[derive(Debug, Default)]
pub struct MediaFoundationBackend;

impl CaptureBackend for MediaFoundationBackend {
    type Device = MfDevice;

    fn enumerate_devices(&mut self) -> BackendResult<Vec<MfDevice>> {
        let attributes = create_attributes(1)?;
        // SAFETY: both GUIDs are static constants
        unsafe {
            attributes.SetGUID(
                &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
                &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
            )
        }
        .map_err(|err| BackendError::from(("IMFAttributes::SetGUID", err)))?;

        let mut activates: *mut Option<IMFActivate> = ptr::null_mut();
        let mut count = 0u32;
        // SAFETY: out-pointers to locals; on success the array is ours to free
        unsafe { MFEnumDeviceSources(&attributes, &mut activates, &mut count) }
            .map_err(|err| BackendError::from(("MFEnumDeviceSources", err)))?;

        if activates.is_null() {
            return Ok(Vec::new());
        }

        // SAFETY: MFEnumDeviceSources returned `count` initialized entries.
        // Each reference is moved out with take(), so dropping the Vec releases
        // every device exactly once; the array itself goes back to CoTaskMemFree.
        let devices = unsafe {
            let list = slice::from_raw_parts_mut(activates, count as usize);
            let devices: Vec<MfDevice> = list
                .iter_mut()
                .filter_map(Option::take)
                .map(|activate| MfDevice { activate })
                .collect();
            CoTaskMemFree(Some(activates as *const _));
            devices
        };

        tracing::debug!("MFEnumDeviceSources returned {} device(s)", devices.len());
        Ok(devices)
    }
}

/// Enumerated device (IMFActivate).
pub struct MfDevice {
    activate: IMFActivate,
}

impl VideoDevice for MfDevice {
    type Source = MfSource;

    fn friendly_name(&self) -> Option<String> {
        let mut name = PWSTR::null();
        let mut len = 0u32;
        // SAFETY: on success `name` is a CoTaskMemAlloc'd, NUL-terminated string
        unsafe {
            self.activate
                .GetAllocatedString(&MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME, &mut name, &mut len)
                .ok()?;
            let value = name.to_string().ok();
            CoTaskMemFree(Some(name.0 as *const _));
            value
        }
    }

    fn activate(&self) -> BackendResult<MfSource> {
        // SAFETY: IMFActivate is valid for the lifetime of self
        let source: IMFMediaSource = unsafe { self.activate.ActivateObject() }
            .map_err(|err| BackendError::from(("IMFActivate::ActivateObject", err)))?;
        Ok(MfSource { source })
    }
}

/// Activated device (IMFMediaSource).
pub struct MfSource {
    source: IMFMediaSource,
}

/// Attribute store enabling the reader's video processor.
///
/// Best-effort: failures are logged and the reader is built with whatever
/// could be prepared.
fn video_processing_attributes() -> Option<IMFAttributes> {
    let attributes = match create_attributes(1) {
        Ok(attributes) => attributes,
        Err(err) => {
            tracing::warn!("reader attributes unavailable, continuing without: {err}");
            return None;
        }
    };
    // SAFETY: static GUID key, plain integer value
    if let Err(err) =
        unsafe { attributes.SetUINT32(&MF_SOURCE_READER_ENABLE_VIDEO_PROCESSING, 1) }
    {
        tracing::warn!("could not enable reader video processing: {err}");
    }
    Some(attributes)
}

impl MediaSource for MfSource {
    type Reader = MfReader;

    fn into_reader(self, options: ReaderOptions) -> BackendResult<MfReader> {
        let attributes = if options.video_processing {
            video_processing_attributes()
        } else {
            None
        };

        // SAFETY: source and attributes are live COM objects.
        // The reader holds its own reference to the source; ours drops with self.
        let reader = unsafe {
            MFCreateSourceReaderFromMediaSource(&self.source, attributes.as_ref())
        }
        .map_err(|err| BackendError::from(("MFCreateSourceReaderFromMediaSource", err)))?;

        Ok(MfReader { reader })
    }
}

// ---------------------------------------------------------------------------
// Source reader
// ---------------------------------------------------------------------------

fn subtype_guid(layout: PixelLayout) -> GUID {
    match layout {
        PixelLayout::Bgr24 => MFVideoFormat_RGB24,
        PixelLayout::Bgrx32 => MFVideoFormat_RGB32,
    }
}

fn video_subtype(guid: GUID) -> VideoSubtype {
    if guid == MFVideoFormat_RGB24 {
        VideoSubtype::Rgb24
    } else if guid == MFVideoFormat_RGB32 {
        VideoSubtype::Rgb32
    } else if guid == MFVideoFormat_ARGB32 {
        VideoSubtype::Argb32
    } else {
        VideoSubtype::Other(format!("{guid:?}"))
    }
}

/// Source reader bound to the first video stream.
pub struct MfReader {
    reader: IMFSourceReader,
}

impl SampleReader for MfReader {
    type Sample = MfSample;

    fn request_layout(&mut self, layout: PixelLayout) -> BackendResult<()> {
        // SAFETY: media type is created and configured locally before use
        unsafe {
            let media_type = MFCreateMediaType()
                .map_err(|err| BackendError::from(("MFCreateMediaType", err)))?;
            media_type
                .SetGUID(&MF_MT_MAJOR_TYPE, &MFMediaType_Video)
                .and_then(|()| media_type.SetGUID(&MF_MT_SUBTYPE, &subtype_guid(layout)))
                .map_err(|err| BackendError::from(("IMFMediaType::SetGUID", err)))?;
            self.reader
                .SetCurrentMediaType(FIRST_VIDEO_STREAM, None, &media_type)
                .map_err(|err| BackendError::from(("SetCurrentMediaType", err)))
        }
    }

    fn current_format(&mut self) -> BackendResult<StreamFormat> {
        // SAFETY: queries on a live reader and the media type it returns
        unsafe {
            let media_type = self
                .reader
                .GetCurrentMediaType(FIRST_VIDEO_STREAM)
                .map_err(|err| BackendError::from(("GetCurrentMediaType", err)))?;

            // MF_MT_FRAME_SIZE packs width in the high and height in the low 32 bits
            let size = media_type
                .GetUINT64(&MF_MT_FRAME_SIZE)
                .map_err(|err| BackendError::from(("MF_MT_FRAME_SIZE", err)))?;

            let subtype = media_type
                .GetGUID(&MF_MT_SUBTYPE)
                .map(video_subtype)
                .unwrap_or_else(|_| VideoSubtype::Other("unknown".to_owned()));

            let default_stride = media_type
                .GetUINT32(&MF_MT_DEFAULT_STRIDE)
                .ok()
                .map(|stride| stride as i32);

            Ok(StreamFormat {
                subtype,
                width: (size >> 32) as u32,
                height: size as u32,
                default_stride,
            })
        }
    }

    fn read_sample(&mut self) -> BackendResult<Option<MfSample>> {
        let mut flags = 0u32;
        let mut sample: Option<IMFSample> = None;
        // SAFETY: synchronous read with out-pointers to locals
        unsafe {
            self.reader.ReadSample(
                FIRST_VIDEO_STREAM,
                0,
                None,
                Some(&mut flags),
                None,
                Some(&mut sample),
            )
        }
        .map_err(|err| BackendError::from(("ReadSample", err)))?;

        if sample.is_none() {
            tracing::trace!("ReadSample returned no sample (flags 0x{flags:X})");
        }
        Ok(sample.map(|sample| MfSample { sample }))
    }
}

// ---------------------------------------------------------------------------
// Samples and buffers
// ---------------------------------------------------------------------------

pub struct MfSample {
    sample: IMFSample,
}

impl MediaSample for MfSample {
    type Buffer = MfBuffer;

    fn to_contiguous(&self) -> BackendResult<MfBuffer> {
        // SAFETY: sample is a live COM object
        let buffer = unsafe { self.sample.ConvertToContiguousBuffer() }
            .map_err(|err| BackendError::from(("ConvertToContiguousBuffer", err)))?;
        Ok(MfBuffer { buffer })
    }
}

pub struct MfBuffer {
    buffer: IMFMediaBuffer,
}

impl MediaBuffer for MfBuffer {
    type Guard<'a> = MfLock<'a>;

    fn lock(&mut self) -> BackendResult<MfLock<'_>> {
        let mut data: *mut u8 = ptr::null_mut();
        let mut len = 0u32;
        // SAFETY: out-pointers to locals; a successful Lock is paired with
        // exactly one Unlock in MfLock::drop
        unsafe { self.buffer.Lock(&mut data, None, Some(&mut len)) }
            .map_err(|err| BackendError::from(("IMFMediaBuffer::Lock", err)))?;

        let lock = MfLock {
            buffer: &self.buffer,
            data,
            len: len as usize,
        };
        if data.is_null() {
            return Err(BackendError::new("IMFMediaBuffer::Lock", "null data pointer"));
        }
        Ok(lock)
    }
}

/// Locked view of a media buffer; unlocks on drop.
pub struct MfLock<'a> {
    buffer: &'a IMFMediaBuffer,
    data: *mut u8,
    len: usize,
}

impl std::ops::Deref for MfLock<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: Lock returned `len` valid bytes at `data`, which stay mapped
        // until Unlock in drop(); the borrow of the buffer keeps it alive
        unsafe { slice::from_raw_parts(self.data, self.len) }
    }
}

impl Drop for MfLock<'_> {
    fn drop(&mut self) {
        // SAFETY: paired with the successful Lock that created this guard
        if let Err(err) = unsafe { self.buffer.Unlock() } {
            tracing::warn!("IMFMediaBuffer::Unlock failed: {err}");
        }
    }
}
