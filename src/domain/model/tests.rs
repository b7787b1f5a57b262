// Unit tests for domain models

use super::*;
use std::collections::HashSet;
use tempfile::TempDir;

fn media_file(dir: &TempDir, name: &str, streams: Vec<Stream>) -> Arc<VideoFile> {
    let path = dir.path().join(name);
    std::fs::write(&path, b"media").unwrap();
    let info = MediaInfo::new(Some("mpegts".to_string()), streams).unwrap();
    Arc::new(VideoFile::from_media_info(&path, info).unwrap())
}

fn broadcast_streams() -> Vec<Stream> {
    vec![
        Stream::video(0, "mpeg2video"),
        Stream::audio(1, "aac", 2, 48000),
        Stream::audio(2, "aac", 0, 48000),
        Stream::new(3, CodecType::Subtitle, Some("arib_caption".to_string())),
        Stream::audio(4, "aac", 1, 44100),
    ]
}

#[test]
fn test_media_info_accepts_contiguous_indices() {
    let info = MediaInfo::new(None, broadcast_streams()).unwrap();
    assert_eq!(info.total_streams(), 5);
}

#[test]
fn test_media_info_rejects_gap() {
    let err = MediaInfo::new(
        None,
        vec![Stream::video(0, "h264"), Stream::audio(2, "aac", 2, 48000)],
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::InvalidStreams(_)));
    assert!(err.to_string().contains("does not match"));
}

#[test]
fn test_media_info_rejects_duplicate_and_out_of_order() {
    assert!(MediaInfo::new(
        None,
        vec![Stream::video(0, "h264"), Stream::audio(0, "aac", 2, 48000)]
    )
    .is_err());
    assert!(MediaInfo::new(
        None,
        vec![Stream::audio(1, "aac", 2, 48000), Stream::video(0, "h264")]
    )
    .is_err());
}

#[test]
fn test_media_info_accepts_empty_list() {
    assert!(MediaInfo::new(None, vec![]).unwrap().streams().is_empty());
}

#[test]
fn test_codec_type_parse() {
    assert_eq!("video".parse::<CodecType>().unwrap(), CodecType::Video);
    assert_eq!("data".parse::<CodecType>().unwrap(), CodecType::Data);
    assert!("hologram".parse::<CodecType>().is_err());
}

#[test]
fn test_valid_streams_exclude_zero_channel_audio() {
    let dir = TempDir::new().unwrap();
    let file = media_file(&dir, "input.ts", broadcast_streams());

    let audio: Vec<usize> = file.valid_audio_streams().iter().map(|s| s.index).collect();
    assert_eq!(audio, vec![1, 4]);
    assert_eq!(file.audio_streams().len(), 3);

    let valid: Vec<usize> = file.valid_streams().iter().map(|s| s.index).collect();
    assert_eq!(valid, vec![0, 1, 4]);
}

#[test]
fn test_valid_streams_lists_video_before_audio() {
    let dir = TempDir::new().unwrap();
    let file = media_file(
        &dir,
        "odd.ts",
        vec![
            Stream::audio(0, "aac", 2, 48000),
            Stream::video(1, "h264"),
        ],
    );
    let valid: Vec<usize> = file.valid_streams().iter().map(|s| s.index).collect();
    assert_eq!(valid, vec![1, 0]);
}

#[test]
fn test_video_file_requires_existing_path() {
    let dir = TempDir::new().unwrap();
    let info = MediaInfo::new(None, vec![]).unwrap();
    let err = VideoFile::from_media_info(dir.path().join("missing.ts"), info).unwrap_err();
    assert!(matches!(err, DomainError::FileNotFound(_)));
}

#[test]
fn test_video_file_identity_is_resolved_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.ts");
    std::fs::write(&path, b"media").unwrap();

    let a = VideoFile::from_media_info(&path, MediaInfo::new(None, vec![]).unwrap()).unwrap();
    let dotted = dir.path().join(".").join("input.ts");
    let b = VideoFile::from_media_info(
        &dotted,
        MediaInfo::new(None, vec![Stream::video(0, "h264")]).unwrap(),
    )
    .unwrap();

    assert_eq!(a, b);
    let set: HashSet<VideoFile> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_stream_source_rejects_unknown_stream() {
    let dir = TempDir::new().unwrap();
    let file = media_file(&dir, "input.ts", broadcast_streams());
    let err = StreamSource::new(file, 9, TransformationKind::Copied).unwrap_err();
    assert!(err.to_string().contains("Stream 9 not found"));
}

#[test]
fn test_converted_video_file_requires_matching_source_count() {
    let dir = TempDir::new().unwrap();
    let input = media_file(&dir, "input.ts", broadcast_streams());
    let sources = StreamSources::for_initial_conversion(vec![
        StreamSource::new(Arc::clone(&input), 0, TransformationKind::Converted).unwrap(),
        StreamSource::new(Arc::clone(&input), 1, TransformationKind::Copied).unwrap(),
        StreamSource::new(Arc::clone(&input), 4, TransformationKind::Copied).unwrap(),
    ])
    .unwrap();

    let short = media_file(
        &dir,
        "short.mp4",
        vec![Stream::video(0, "hevc"), Stream::audio(1, "aac", 2, 48000)],
    );
    let err = ConvertedVideoFile::new(short, sources.clone()).unwrap_err();
    assert!(err.to_string().contains("does not match number of streams"));

    let output = media_file(
        &dir,
        "output.mp4",
        vec![
            Stream::video(0, "hevc"),
            Stream::audio(1, "aac", 2, 48000),
            Stream::audio(2, "aac", 1, 44100),
        ],
    );
    let converted = ConvertedVideoFile::new(output, sources).unwrap();
    let pairs: Vec<(usize, usize)> = converted
        .stream_with_sources()
        .map(|(stream, source)| (stream.index, source.source_stream_index()))
        .collect();
    assert_eq!(pairs, vec![(0, 0), (1, 1), (2, 4)]);
    assert_eq!(converted.output_index_for(&input, 4), Some(2));
    assert_eq!(converted.output_index_for(&input, 2), None);
}

#[test]
fn test_source_video_files_in_first_appearance_order() {
    let dir = TempDir::new().unwrap();
    let original = media_file(&dir, "input.ts", broadcast_streams());
    let encoded = media_file(
        &dir,
        "output.mp4",
        vec![
            Stream::video(0, "hevc"),
            Stream::audio(1, "aac", 2, 48000),
            Stream::audio(2, "aac", 1, 44100),
        ],
    );
    let sources = StreamSources::for_repair(vec![
        StreamSource::new(Arc::clone(&encoded), 0, TransformationKind::Copied).unwrap(),
        StreamSource::new(Arc::clone(&original), 1, TransformationKind::ReEncoded).unwrap(),
        StreamSource::new(Arc::clone(&encoded), 2, TransformationKind::Copied).unwrap(),
    ])
    .unwrap();

    let files = sources.source_video_files();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0], encoded);
    assert_eq!(files[1], original);
    assert_eq!(sources.indices_of_kind(TransformationKind::ReEncoded), vec![1]);
    assert_eq!(sources.stage(), ConversionStage::Repair);
}

#[test]
fn test_stream_digest_display_is_hex() {
    let mut bytes = [0u8; 16];
    bytes[0] = 0xab;
    bytes[15] = 0x01;
    assert_eq!(
        StreamDigest::new(bytes).to_string(),
        "ab000000000000000000000000000001"
    );
}

#[test]
fn test_quality_metrics_display() {
    let metrics = AudioQualityMetrics {
        apsnr: Some(85.123),
        asdr: None,
    };
    assert_eq!(metrics.to_string(), "APSNR=85.12dB");
    assert!(AudioQualityMetrics::default().is_empty());
}
