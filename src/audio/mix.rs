use std::path::Path;

use crate::audio::manifest::{AudioManifest, PassSpan};
use crate::foundation::error::{ReelError, ReelResult};

/// Render the manifest into interleaved output PCM: each pass copies source frames in place, then
/// the tail fade is applied.
///
/// Output is not clamped; call [`clamp_in_place`] once levels are final.
pub(crate) fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let ch = usize::from(manifest.channels);
    let mut out = vec![0.0f32; manifest.total_samples as usize * ch];
    if ch == 0 {
        return out;
    }
    for pass in &manifest.passes {
        copy_pass(&mut out, &manifest.source, ch, pass);
    }
    apply_tail_fade(&mut out, ch, manifest.tail_fade_samples);
    out
}

/// Hard-limit samples to `[-1, 1]`.
pub(crate) fn clamp_in_place(samples: &mut [f32]) {
    for s in samples {
        *s = s.clamp(-1.0, 1.0);
    }
}

fn copy_pass(out: &mut [f32], src: &[f32], ch: usize, pass: &PassSpan) {
    let out_frames = out.len() / ch;
    let src_frames = src.len() / ch;
    let out_start = pass.out_start as usize;
    let src_start = pass.src_start as usize;

    let frames = (pass.out_end.saturating_sub(pass.out_start) as usize)
        .min(out_frames.saturating_sub(out_start))
        .min(src_frames.saturating_sub(src_start));
    if frames == 0 {
        return;
    }
    out[out_start * ch..(out_start + frames) * ch]
        .copy_from_slice(&src[src_start * ch..(src_start + frames) * ch]);
}

/// Linear ramp to silence over the last `fade_frames` frames; the final frame keeps `1 / fade`.
fn apply_tail_fade(out: &mut [f32], ch: usize, fade_frames: u64) {
    let frames = out.len() / ch;
    let fade = (fade_frames as usize).min(frames);
    if fade == 0 {
        return;
    }
    let first = frames - fade;
    for (i, frame) in out[first * ch..].chunks_exact_mut(ch).enumerate() {
        let gain = (fade - i) as f32 / fade as f32;
        for s in frame {
            *s *= gain;
        }
    }
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub(crate) fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::render(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::render(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
