use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::foundation::core::{Canvas, Fps, TimeRange};
use crate::foundation::error::{ReelError, ReelResult};

/// Raw RGBA frames of one source interval, cover-scaled and center-cropped to the canvas.
///
/// Frames are resampled to the output rate by `ffmpeg`. Once the stream runs dry the last frame
/// is repeated. The child process is killed and reaped on drop.
pub(crate) struct VideoFrameStream {
    path: PathBuf,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    frames_read: u64,
    exhausted: bool,
}

/// The `-vf` chain that fills `canvas` without letterboxing.
pub(crate) fn cover_filter(canvas: Canvas, fps: Fps) -> String {
    format!(
        "fps={num}/{den},scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        num = fps.num,
        den = fps.den,
        w = canvas.width,
        h = canvas.height,
    )
}

impl VideoFrameStream {
    pub(crate) fn open(path: &Path, source: TimeRange, canvas: Canvas, fps: Fps) -> ReelResult<Self> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-nostdin"]);
        if source.start > 0.0 {
            cmd.args(["-ss", &format!("{:.6}", source.start)]);
        }
        cmd.args(["-t", &format!("{:.6}", source.span())])
            .arg("-i")
            .arg(path)
            .args([
                "-an",
                "-vf",
                &cover_filter(canvas, fps),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::render(format!("failed to spawn ffmpeg for video decode: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::render("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::render("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        tracing::debug!(
            path = %path.display(),
            start = source.start,
            span = source.span(),
            "video decode pass started"
        );

        Ok(Self {
            path: path.to_path_buf(),
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; canvas.rgba_len()],
            frames_read: 0,
            exhausted: false,
        })
    }

    /// Write the next frame into `dst`. After the stream ends `dst` is left as is, which repeats
    /// the previous frame when the caller reuses its buffer.
    pub(crate) fn next_frame_into(&mut self, dst: &mut [u8]) -> ReelResult<()> {
        if dst.len() != self.scratch.len() {
            return Err(ReelError::render("decode buffer size mismatch"));
        }
        if self.exhausted {
            return Ok(());
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Err(ReelError::render("video decoder already closed"));
        };
        match stdout.read_exact(&mut self.scratch) {
            Ok(()) => {
                dst.copy_from_slice(&self.scratch);
                self.frames_read += 1;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.exhausted = true;
                if self.frames_read == 0 {
                    let detail = self.shutdown();
                    return Err(ReelError::render(format!(
                        "no video frames decoded from '{}'{detail}",
                        self.path.display()
                    )));
                }
                tracing::debug!(frames = self.frames_read, "video decode pass ran dry; holding last frame");
                Ok(())
            }
            Err(e) => Err(ReelError::render(format!(
                "failed to read decoded frame from '{}': {e}",
                self.path.display()
            ))),
        }
    }

    /// Frames delivered so far.
    pub(crate) fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Stop decoding and reap the child.
    pub(crate) fn close(mut self) {
        let _ = self.shutdown();
    }

    fn shutdown(&mut self) -> String {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            String::new()
        } else {
            format!(": {stderr}")
        }
    }
}

impl Drop for VideoFrameStream {
    fn drop(&mut self) {
        if self.child.is_some() {
            let _ = self.shutdown();
        }
    }
}
