use super::*;

fn manifest(total: u64, source: Vec<f32>, passes: &[(u64, u64)], fade: u64) -> AudioManifest {
    AudioManifest {
        sample_rate: 1000,
        channels: 2,
        total_samples: total,
        source,
        passes: passes
            .iter()
            .map(|&(out_start, out_end)| PassSpan {
                out_start,
                out_end,
                src_start: 0,
            })
            .collect(),
        tail_fade_samples: fade,
    }
}

#[test]
fn mix_applies_tail_fade() {
    let out = mix_manifest(&manifest(1000, vec![1.0; 2000], &[(0, 1000)], 500));
    assert_eq!(out.len(), 2000);
    assert!((out[0] - 1.0).abs() < 1e-6);
    assert!((out[2 * 400] - 1.0).abs() < 1e-6);
    assert!((out[2 * 500] - 1.0).abs() < 1e-6);
    assert!((out[2 * 750] - 0.5).abs() < 1e-6);
    assert!((out[2 * 750 + 1] - 0.5).abs() < 1e-6);
    assert!(out[out.len() - 2] < 0.01);
}

#[test]
fn looped_passes_replay_the_source() {
    let src: Vec<f32> = (0..100).flat_map(|i| [i as f32 / 100.0; 2]).collect();
    let out = mix_manifest(&manifest(250, src, &[(0, 100), (100, 200), (200, 250)], 0));
    for base in [0usize, 100, 200] {
        assert_eq!(out[base * 2], 0.0);
        assert!((out[(base + 10) * 2 + 1] - 0.10).abs() < 1e-6);
    }
    // Seams are butt joints: the frame before a pass start is the source's last frame.
    assert!((out[99 * 2] - 0.99).abs() < 1e-6);
    assert!((out[249 * 2] - 0.49).abs() < 1e-6);
}

#[test]
fn short_source_leaves_silence_and_clamp_limits() {
    let mut out = mix_manifest(&manifest(100, vec![1.5; 20], &[(0, 100)], 0));
    assert_eq!(out[0], 1.5);
    assert_eq!(out[2 * 9 + 1], 1.5);
    assert_eq!(out[2 * 10], 0.0);
    assert_eq!(out[2 * 50], 0.0);
    clamp_in_place(&mut out);
    assert_eq!(out[0], 1.0);
}

#[test]
fn passes_past_the_track_end_are_cut() {
    let out = mix_manifest(&manifest(50, vec![0.5; 200], &[(0, 80)], 0));
    assert_eq!(out.len(), 100);
    assert!(out.iter().all(|&s| s == 0.5));
}

#[test]
fn silent_manifest_mixes_to_zeros() {
    let out = mix_manifest(&AudioManifest::silent(48_000, 2, 480));
    assert_eq!(out.len(), 960);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn f32le_file_has_four_bytes_per_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("mix.f32le");
    write_mix_to_f32le_file(&[0.5, -0.25], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), -0.25);
}
