use super::*;

#[test]
fn pcm_from_f32le_parses_interleaved_samples() {
    let mut bytes = Vec::new();
    for s in [0.5f32, -0.5, 1.0, -1.0] {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    let pcm = pcm_from_f32le(&bytes, 4, 2).unwrap();
    assert_eq!(pcm.interleaved_f32, vec![0.5, -0.5, 1.0, -1.0]);
    assert_eq!(pcm.sample_frames(), 2);
    assert!((pcm.duration_secs() - 0.5).abs() < 1e-12);
}

#[test]
fn pcm_from_f32le_rejects_misaligned_bytes() {
    let err = pcm_from_f32le(&[0, 0, 0], 48_000, 2).unwrap_err();
    assert!(err.to_string().contains("not aligned"));
}

#[test]
fn duration_of_degenerate_pcm_is_zero() {
    let pcm = AudioPcm {
        sample_rate: 0,
        channels: 0,
        interleaved_f32: vec![1.0; 8],
    };
    assert_eq!(pcm.sample_frames(), 0);
    assert_eq!(pcm.duration_secs(), 0.0);
}

#[test]
fn missing_ffmpeg_is_an_audio_error() {
    let dec = FfmpegAudioDecoder::new("stillreel-no-such-ffmpeg", 48_000, 2);
    let err = dec.decode(Path::new("song.mp3")).unwrap_err();
    assert!(matches!(err, StillreelError::Audio(_)));
}

#[test]
fn zero_rate_is_rejected_before_spawning() {
    let dec = FfmpegAudioDecoder::new("ffmpeg", 0, 2);
    let err = dec.decode(Path::new("song.mp3")).unwrap_err();
    assert!(matches!(err, StillreelError::Validation(_)));
}
