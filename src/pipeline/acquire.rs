// Frame acquisition with a fixed warm-up
//
// The first few delivered samples are discarded so the camera's auto-exposure
// and white balance can settle. Attempts are bounded: a stalled device ends in
// CaptureFailed instead of blocking forever.

use std::thread;
use std::time::Duration;

use crate::capture::{MediaSample, SampleReader};

use super::error::CaptureError;

/// Total `read_sample` calls before giving up.
const MAX_ATTEMPTS: u32 = 10;

/// Samples discarded before one is kept.
const WARMUP_SAMPLES: u32 = 3;

/// Pause after an attempt that produced no sample.
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Warm-up aware sample acquirer.
#[derive(Debug, Clone)]
pub struct FrameAcquirer {
    max_attempts: u32,
    warmup_samples: u32,
    retry_delay: Duration,
}

impl Default for FrameAcquirer {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            warmup_samples: WARMUP_SAMPLES,
            retry_delay: RETRY_DELAY,
        }
    }
}

impl FrameAcquirer {
    #[cfg(test)]
    pub(crate) fn without_delay() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Read until a post-warm-up sample arrives, and flatten it into one
    /// contiguous buffer.
    ///
    /// Failed reads count as attempts without a sample. A flatten failure on
    /// the accepted sample is not retried.
    pub fn acquire<R: SampleReader>(
        &self,
        reader: &mut R,
    ) -> Result<<R::Sample as MediaSample>::Buffer, CaptureError> {
        let sample = self.accept_sample(reader)?;
        sample.to_contiguous().map_err(CaptureError::capture)
    }

    fn accept_sample<R: SampleReader>(&self, reader: &mut R) -> Result<R::Sample, CaptureError> {
        let mut delivered = 0u32;

        for attempt in 1..=self.max_attempts {
            let sample = match reader.read_sample() {
                Ok(Some(sample)) => sample,
                Ok(None) => {
                    tracing::trace!("attempt {attempt}: no sample yet");
                    thread::sleep(self.retry_delay);
                    continue;
                }
                Err(err) => {
                    tracing::debug!("attempt {attempt}: {err}");
                    thread::sleep(self.retry_delay);
                    continue;
                }
            };

            if delivered < self.warmup_samples {
                delivered += 1;
                tracing::trace!("attempt {attempt}: discarding warm-up sample {delivered}");
                drop(sample);
                continue;
            }

            tracing::debug!("attempt {attempt}: accepted sample after {delivered} warm-up");
            return Ok(sample);
        }

        Err(CaptureError::CaptureFailed(format!(
            "no usable sample after {} attempts ({} warm-up sample(s) seen)",
            self.max_attempts, delivered
        )))
    }
}
