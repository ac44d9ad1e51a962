//! Looping video backgrounds decoded by an external process.
//!
//! The decoder writes raw rgba frames of a fixed size to its stdout. A reader
//! thread fills one frame at a time into a buffer it owns and hands the full
//! frame over through [`FrameSlot`], so the renderer never sees a half written
//! frame.

use std::{
    ffi::OsString,
    fmt,
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc, Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("video size must be non zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("couldn't start video decoder {}: {source}", .program.display())]
    Spawn { program: PathBuf, source: io::Error },
    #[error("video decoder {0} wasn't piped")]
    MissingPipe(&'static str),
    #[error("couldn't start video reader thread: {0}")]
    Thread(io::Error),
}

pub const BYTES_PER_PIXEL: usize = 4;
/// how long the reader waits for the decoder to describe its output
pub const NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    width: u32,
    height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Result<Self, VideoError> {
        if width == 0 || height == 0 {
            return Err(VideoError::ZeroSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// `[width, height]` as egui wants it
    #[must_use]
    pub const fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }

    #[must_use]
    pub const fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// arguments for ffmpeg: loop the input forever, scale it and write raw rgba frames to stdout
#[must_use]
pub fn decoder_args(path: &Path, geometry: FrameGeometry) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostats", "-stream_loop", "-1", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    let size = geometry.to_string();
    args.extend(
        [
            "-f",
            "image2pipe",
            "-pix_fmt",
            "rgba",
            "-vcodec",
            "rawvideo",
            "-s",
            size.as_str(),
            "-",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

/// what the decoder says it is actually writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedOutput {
    pub pixel_format: String,
    pub width: u32,
    pub height: u32,
}

impl NegotiatedOutput {
    #[must_use]
    pub fn matches(&self, geometry: FrameGeometry) -> bool {
        self.pixel_format == "rgba" && self.width == geometry.width && self.height == geometry.height
    }
}

impl fmt::Display for NegotiatedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.pixel_format, self.width, self.height)
    }
}

/// splits on commas that aren't inside parentheses or brackets
fn split_top_level(s: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                fields.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(s[start..].trim());
    fields
}

fn parse_size(token: &str) -> Option<(u32, u32)> {
    let (width, height) = token.split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?))
}

/// parses a stream line like
/// `Stream #0:0: Video: rawvideo (RGBA / 0x41424752), rgba(pc, progressive), 1280x720 [SAR 1:1 DAR 16:9], ...`
#[must_use]
pub fn parse_output_stream(line: &str) -> Option<NegotiatedOutput> {
    let (_, description) = line.split_once("Video: ")?;
    let fields = split_top_level(description);
    let pixel_format = fields.get(1)?;
    let pixel_format = pixel_format
        .split_once('(')
        .map_or(*pixel_format, |(name, _)| name)
        .trim();
    let (width, height) = fields
        .iter()
        .skip(2)
        .find_map(|field| field.split_whitespace().next().and_then(parse_size))?;
    Some(NegotiatedOutput {
        pixel_format: pixel_format.to_string(),
        width,
        height,
    })
}

/// reads decoder stderr until it ends. the first video stream listed after `Output #0`
/// is sent on `negotiated`, if stderr ends first `None` is sent instead
fn watch_stderr<R: BufRead>(stderr: R, negotiated: &mpsc::Sender<Option<NegotiatedOutput>>) {
    let mut in_output = false;
    let mut reported = false;
    for line in stderr.lines() {
        let Ok(line) = line else { break };
        log::trace!("decoder: {line}");
        if line.starts_with("Output #") {
            in_output = true;
        } else if in_output && !reported {
            if let Some(output) = parse_output_stream(&line) {
                // the reader may already be gone, nothing to do about it here
                let _ = negotiated.send(Some(output));
                reported = true;
            }
        }
    }
    if !reported {
        let _ = negotiated.send(None);
    }
}

/// single slot handoff between the reader thread and the renderer
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Vec<u8>>>,
    spare: Mutex<Option<Vec<u8>>>,
    published: AtomicU64,
    closed: AtomicBool,
}

impl FrameSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// replaces the latest frame, handing back the previous one if nobody took it
    pub fn publish(&self, frame: Vec<u8>) -> Option<Vec<u8>> {
        let previous = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame);
        self.published.fetch_add(1, Ordering::Release);
        previous
    }

    /// the newest frame since the last call, if there is one
    pub fn take(&self) -> Option<Vec<u8>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// give a frame back once it has been uploaded so the reader can fill it again
    pub fn recycle(&self, frame: Vec<u8>) {
        let mut spare = self.spare.lock().unwrap_or_else(PoisonError::into_inner);
        if spare.is_none() {
            *spare = Some(frame);
        }
    }

    fn back_buffer(&self, len: usize) -> Vec<u8> {
        match self.spare.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(buffer) if buffer.len() == len => buffer,
            _ => vec![0; len],
        }
    }

    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// true once the reader has stopped for good
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// reads whole frames until the stream ends or fails, returns how many were published.
/// a partial frame at the end is dropped
pub fn read_frames<R: Read>(
    mut reader: R,
    frame_len: usize,
    slot: &FrameSlot,
    notify: impl Fn(),
) -> u64 {
    if frame_len == 0 {
        return 0;
    }
    let mut frames = 0;
    let mut back = slot.back_buffer(frame_len);
    loop {
        if let Err(e) = reader.read_exact(&mut back) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                log::debug!("video stream ended after {frames} frames");
            } else {
                log::warn!("video stream failed after {frames} frames: {e}");
            }
            return frames;
        }
        frames += 1;
        back = slot
            .publish(back)
            .unwrap_or_else(|| slot.back_buffer(frame_len));
        notify();
    }
}

fn kill(child: &Mutex<Child>) {
    let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = child.kill() {
        log::debug!("couldn't kill video decoder: {e}");
    }
    if let Err(e) = child.wait() {
        log::debug!("couldn't reap video decoder: {e}");
    }
}

/// a running decoder process plus the thread reading its frames
#[derive(Debug)]
pub struct VideoDecoder {
    child: Arc<Mutex<Child>>,
    slot: Arc<FrameSlot>,
    geometry: FrameGeometry,
}

impl VideoDecoder {
    /// starts `program` on `path`, `notify` is called from the reader thread after every frame
    pub fn spawn<F>(
        program: &Path,
        path: &Path,
        geometry: FrameGeometry,
        notify: F,
    ) -> Result<Self, VideoError>
    where
        F: Fn() + Send + 'static,
    {
        let mut command = Command::new(program);
        command.args(decoder_args(path, geometry));
        log::info!("starting video decoder {} for {}", program.display(), path.display());
        Self::spawn_command(command, geometry, NEGOTIATION_TIMEOUT, notify)
    }

    pub(crate) fn spawn_command<F>(
        mut command: Command,
        geometry: FrameGeometry,
        negotiation_timeout: Duration,
        notify: F,
    ) -> Result<Self, VideoError>
    where
        F: Fn() + Send + 'static,
    {
        let program = PathBuf::from(command.get_program());
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| VideoError::Spawn { program, source })?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let child = Mutex::new(child);
            kill(&child);
            return Err(VideoError::MissingPipe("output"));
        };
        let child = Arc::new(Mutex::new(child));
        let slot = Arc::new(FrameSlot::new());

        let (negotiated_tx, negotiated_rx) = mpsc::channel();
        if let Err(e) = thread::Builder::new()
            .name("video decoder stderr".to_string())
            .spawn(move || watch_stderr(BufReader::new(stderr), &negotiated_tx))
        {
            kill(&child);
            return Err(VideoError::Thread(e));
        }

        let reader_child = Arc::clone(&child);
        let reader_slot = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name("video frames".to_string())
            .spawn(move || {
                match negotiated_rx.recv_timeout(negotiation_timeout) {
                    Ok(Some(output)) if output.matches(geometry) => {
                        log::info!("video decoder negotiated {output}");
                        read_frames(stdout, geometry.frame_len(), &reader_slot, notify);
                    }
                    Ok(Some(output)) => {
                        log::warn!("video decoder negotiated {output}, expected rgba {geometry}");
                    }
                    Ok(None) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        log::warn!("video decoder never reported its output stream");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        log::warn!(
                            "video decoder didn't report a readable output stream within {}",
                            crate::duration::format(negotiation_timeout)
                        );
                    }
                }
                reader_slot.close();
                kill(&reader_child);
            });
        if let Err(e) = spawned {
            kill(&child);
            return Err(VideoError::Thread(e));
        }

        Ok(Self {
            child,
            slot,
            geometry,
        })
    }

    #[must_use]
    pub const fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    #[must_use]
    pub fn take_frame(&self) -> Option<Vec<u8>> {
        self.slot.take()
    }

    pub fn recycle(&self, frame: Vec<u8>) {
        self.slot.recycle(frame);
    }

    #[must_use]
    pub fn frames_published(&self) -> u64 {
        self.slot.published()
    }

    /// length of the buffer waiting to be refilled by the reader
    #[cfg(test)]
    pub(crate) fn spare_len(&self) -> Option<usize> {
        self.slot
            .spare
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Vec::len)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.is_closed()
    }

    /// kills the decoder, the reader thread then stops on its own
    pub fn stop(&self) {
        kill(&self.child);
    }
}
