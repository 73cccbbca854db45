use super::*;

fn pcm(sample_frames: usize, sample_rate: u32, channels: u16) -> AudioPcm {
    AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: (0..sample_frames * usize::from(channels))
            .map(|i| i as f32)
            .collect(),
    }
}

#[test]
fn longer_audio_is_cut_to_video_duration() {
    // 25 frames at 10 fps = 2.5 s = 120_000 sample frames at 48 kHz.
    let src = pcm(48_000 * 4, 48_000, 2);
    let out = trim_to_video(src, 25, Fps::integer(10).unwrap());
    assert_eq!(out.sample_frames(), 120_000);
    assert!((out.duration_secs() - 2.5).abs() < 1e-9);
}

#[test]
fn shorter_audio_is_neither_padded_nor_looped() {
    let src = pcm(48_000, 48_000, 2);
    let before = src.clone();
    let out = trim_to_video(src, 100, Fps::integer(10).unwrap());
    assert_eq!(out, before);
    assert!((out.duration_secs() - 1.0).abs() < 1e-9);
}

#[test]
fn trim_keeps_the_head_of_the_stream() {
    let src = pcm(10, 10, 1);
    let out = trim_to_video(src, 1, Fps::integer(2).unwrap());
    assert_eq!(out.interleaved_f32, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn rational_fps_rounds_sample_count() {
    let src = pcm(48_000 * 20, 48_000, 1);
    let out = trim_to_video(src, 300, Fps::new(30_000, 1001).unwrap());
    // 300 frames at 29.97 fps = 10.01 s.
    assert_eq!(out.sample_frames(), 480_480);
}

#[test]
fn write_f32le_roundtrips_through_parser() {
    let dir = PathBuf::from("target").join("unit").join("trim");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("nested").join("clip.f32le");

    let src = AudioPcm {
        sample_rate: 8,
        channels: 2,
        interleaved_f32: vec![0.25, -0.25, 0.75, -0.75],
    };
    let cfg = write_f32le_file(&src, &path).unwrap();
    assert_eq!(cfg.path, path);
    assert_eq!(cfg.sample_rate, 8);
    assert_eq!(cfg.channels, 2);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16);
    let back = crate::audio::decode::pcm_from_f32le(&bytes, 8, 2).unwrap();
    assert_eq!(back, src);
}
