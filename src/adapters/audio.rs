//! WAV playback adapter.
//!
//! [`WavPlayer`] implements [`AudioPort`] for RIFF/WAVE files holding
//! 16-bit PCM, mono or stereo.  Playback runs on a worker thread that
//! streams the data chunk into a [`PcmSink`]; the control loop only polls
//! [`is_playing`](AudioPort::is_playing) and never blocks on audio.
//!
//! ```text
//!  play(source) ─▶ parse header ─▶ sink.configure ─▶ spawn worker
//!                                                    │
//!  stop() ─▶ cancel flag ─▶ join ◀─── read ─▶ sink.write (loop)
//! ```
//!
//! The sink is the codec/driver seam: [`I2sSink`] on the device,
//! [`NullSink`] for host simulation, recording sinks in tests.

use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::app::ports::{AudioError, AudioPort};

/// Bytes moved to the sink per write.
const STREAM_CHUNK_BYTES: usize = 1024;

// ───────────────────────────────────────────────────────────────
// WAV header
// ───────────────────────────────────────────────────────────────

/// Format of a playable WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Length of the `data` chunk in bytes.
    pub data_len: u32,
}

impl WavFormat {
    /// Playback length of the data chunk.
    pub fn duration_ms(&self) -> u64 {
        let bytes_per_sec =
            u64::from(self.sample_rate) * u64::from(self.channels) * u64::from(self.bits_per_sample / 8);
        if bytes_per_sec == 0 {
            return 0;
        }
        u64::from(self.data_len) * 1_000 / bytes_per_sec
    }
}

const WAVE_FORMAT_PCM: u16 = 1;

fn read_u16(r: &mut impl Read) -> Result<u16, AudioError> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b).map_err(|_| AudioError::Unsupported)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32(r: &mut impl Read) -> Result<u32, AudioError> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b).map_err(|_| AudioError::Unsupported)?;
    Ok(u32::from_le_bytes(b))
}

fn read_tag(r: &mut impl Read) -> Result<[u8; 4], AudioError> {
    let mut tag = [0u8; 4];
    r.read_exact(&mut tag).map_err(|_| AudioError::Unsupported)?;
    Ok(tag)
}

/// Parse the RIFF header and leave `r` positioned at the first sample.
///
/// Unknown chunks (`LIST`, `fact`, ...) are skipped.  Only 16-bit PCM with
/// one or two channels at 8–48 kHz is accepted.
pub fn parse_header<R: Read + Seek>(r: &mut R) -> Result<WavFormat, AudioError> {
    r.seek(SeekFrom::Start(0)).map_err(|_| AudioError::Unsupported)?;

    if &read_tag(r)? != b"RIFF" {
        return Err(AudioError::Unsupported);
    }
    let _riff_len = read_u32(r)?;
    if &read_tag(r)? != b"WAVE" {
        return Err(AudioError::Unsupported);
    }

    let mut fmt: Option<(u16, u32, u16)> = None;
    loop {
        let tag = read_tag(r)?;
        let len = read_u32(r)?;
        // Chunks are word-aligned.
        let padded = i64::from(len) + i64::from(len & 1);

        match &tag {
            b"fmt " => {
                if len < 16 {
                    return Err(AudioError::Unsupported);
                }
                let format = read_u16(r)?;
                let channels = read_u16(r)?;
                let sample_rate = read_u32(r)?;
                let _byte_rate = read_u32(r)?;
                let _block_align = read_u16(r)?;
                let bits = read_u16(r)?;
                if format != WAVE_FORMAT_PCM {
                    return Err(AudioError::Unsupported);
                }
                fmt = Some((channels, sample_rate, bits));
                r.seek(SeekFrom::Current(padded - 16))
                    .map_err(|_| AudioError::Unsupported)?;
            }
            b"data" => {
                let (channels, sample_rate, bits_per_sample) = fmt.ok_or(AudioError::Unsupported)?;
                let format = WavFormat {
                    channels,
                    sample_rate,
                    bits_per_sample,
                    data_len: len,
                };
                return if is_supported(&format) {
                    Ok(format)
                } else {
                    Err(AudioError::Unsupported)
                };
            }
            _ => {
                r.seek(SeekFrom::Current(padded))
                    .map_err(|_| AudioError::Unsupported)?;
            }
        }
    }
}

fn is_supported(format: &WavFormat) -> bool {
    matches!(format.channels, 1 | 2)
        && format.bits_per_sample == 16
        && (8_000..=48_000).contains(&format.sample_rate)
        && format.data_len > 0
}

// ───────────────────────────────────────────────────────────────
// Sink seam
// ───────────────────────────────────────────────────────────────

/// Destination for raw little-endian PCM frames.
pub trait PcmSink: Send + 'static {
    /// Whether this sink can render `format` at all.
    fn supports(&self, format: &WavFormat) -> bool;

    /// Prepare for a stream in `format`.  Called before every playback.
    fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError>;

    /// Write interleaved samples.  May block until the hardware has room.
    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError>;
}

/// Discards samples.  With `realtime` set it sleeps for the duration each
/// chunk would take to play, so simulations see realistic playback length.
#[derive(Debug, Default)]
pub struct NullSink {
    realtime: bool,
    bytes_per_sec: u32,
}

impl NullSink {
    pub fn new(realtime: bool) -> Self {
        Self {
            realtime,
            bytes_per_sec: 0,
        }
    }
}

impl PcmSink for NullSink {
    fn supports(&self, _format: &WavFormat) -> bool {
        true
    }

    fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError> {
        self.bytes_per_sec =
            format.sample_rate * u32::from(format.channels) * u32::from(format.bits_per_sample / 8);
        Ok(())
    }

    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError> {
        if self.realtime && self.bytes_per_sec > 0 {
            let micros = pcm.len() as u64 * 1_000_000 / u64::from(self.bytes_per_sec);
            std::thread::sleep(std::time::Duration::from_micros(micros));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Player
// ───────────────────────────────────────────────────────────────

pub struct WavPlayer<S> {
    sink: Arc<Mutex<S>>,
    playing: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<S: PcmSink> WavPlayer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            playing: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Cancel the current stream (if any) and wait for the worker to exit.
    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.cancel.store(true, Ordering::Release);
            if handle.join().is_err() {
                warn!("WavPlayer: audio worker panicked");
            }
            self.playing.store(false, Ordering::Release);
        }
    }
}

fn stream<R: Read, S: PcmSink>(
    source: &mut R,
    format: WavFormat,
    sink: &Mutex<S>,
    cancel: &AtomicBool,
) -> Result<(), AudioError> {
    let mut sink = sink.lock().map_err(|_| AudioError::OutputFailed)?;
    let mut buf = [0u8; STREAM_CHUNK_BYTES];
    let mut remaining = format.data_len as usize;

    while remaining > 0 && !cancel.load(Ordering::Acquire) {
        let want = remaining.min(buf.len());
        let n = fill(source, &mut buf[..want]).map_err(|_| AudioError::OutputFailed)?;
        // Sinks take whole 16-bit samples; a dangling byte can only be the
        // end of a truncated file.
        let whole = n & !1;
        if whole > 0 {
            sink.write(&buf[..whole])?;
        }
        if n < want {
            // Truncated file: play what there is.
            break;
        }
        remaining -= n;
    }
    Ok(())
}

/// Read until `buf` is full or the source ends.
fn fill(source: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<S, R> AudioPort<R> for WavPlayer<S>
where
    S: PcmSink,
    R: Read + Seek + Send + 'static,
{
    fn can_play(&mut self, source: &mut R) -> bool {
        match parse_header(source) {
            Ok(format) => {
                let supported = self.sink.lock().is_ok_and(|sink| sink.supports(&format));
                debug!(
                    "WavPlayer: {} ch, {} Hz, {} ms, supported={}",
                    format.channels,
                    format.sample_rate,
                    format.duration_ms(),
                    supported
                );
                supported
            }
            Err(_) => false,
        }
    }

    fn play(&mut self, mut source: R) -> Result<(), AudioError> {
        self.join_worker();

        let format = parse_header(&mut source)?;
        self.sink
            .lock()
            .map_err(|_| AudioError::OutputFailed)?
            .configure(&format)?;

        self.cancel.store(false, Ordering::Release);
        self.playing.store(true, Ordering::Release);

        let sink = Arc::clone(&self.sink);
        let playing = Arc::clone(&self.playing);
        let cancel = Arc::clone(&self.cancel);

        let spawned = std::thread::Builder::new()
            .name("alert-audio".into())
            .spawn(move || {
                if let Err(e) = stream(&mut source, format, &sink, &cancel) {
                    warn!("WavPlayer: stream aborted: {}", e);
                }
                playing.store(false, Ordering::Release);
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(_) => {
                self.playing.store(false, Ordering::Release);
                Err(AudioError::OutputFailed)
            }
        }
    }

    fn is_playing(&mut self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        self.join_worker();
    }
}

impl<S> Drop for WavPlayer<S> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

// ───────────────────────────────────────────────────────────────
// I2S output (device)
// ───────────────────────────────────────────────────────────────

/// Sink over an ESP-IDF standard-mode I2S transmitter (stereo slots).
/// Mono sources are duplicated into both slots.
#[cfg(target_os = "espidf")]
pub struct I2sSink {
    driver: esp_idf_hal::i2s::I2sDriver<'static, esp_idf_hal::i2s::I2sTx>,
    sample_rate: u32,
    channels: u16,
}

#[cfg(target_os = "espidf")]
impl I2sSink {
    /// `sample_rate` must match the rate the driver was created with.
    pub fn new(
        mut driver: esp_idf_hal::i2s::I2sDriver<'static, esp_idf_hal::i2s::I2sTx>,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        driver.tx_enable().map_err(|_| AudioError::OutputFailed)?;
        Ok(Self {
            driver,
            sample_rate,
            channels: 2,
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), AudioError> {
        let mut offset = 0;
        while offset < bytes.len() {
            let n = self
                .driver
                .write(&bytes[offset..], esp_idf_hal::delay::BLOCK)
                .map_err(|_| AudioError::OutputFailed)?;
            offset += n;
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl PcmSink for I2sSink {
    fn supports(&self, format: &WavFormat) -> bool {
        format.sample_rate == self.sample_rate
    }

    fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError> {
        if !self.supports(format) {
            return Err(AudioError::Unsupported);
        }
        self.channels = format.channels;
        Ok(())
    }

    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError> {
        if self.channels == 2 {
            return self.write_all(pcm);
        }

        let mut stereo = [0u8; STREAM_CHUNK_BYTES * 2];
        let mut len = 0;
        for sample in pcm.chunks_exact(2) {
            stereo[len..len + 2].copy_from_slice(sample);
            stereo[len + 2..len + 4].copy_from_slice(sample);
            len += 4;
        }
        self.write_all(&stereo[..len])
    }
}
