use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use ts2mp4::app::ConvertInteractor;
use ts2mp4::domain::model::*;
use ts2mp4::domain::usecases::*;
use ts2mp4::output::CachedStreamHasher;
use ts2mp4::ports::*;
use ts2mp4::DomainError;

/// In-memory stand-ins for ffprobe and ffmpeg
mod test_utils {
    use super::*;

    pub fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Prober answering from a table of stream lists keyed by file name
    pub struct TableProbe {
        pub streams: HashMap<String, Vec<Stream>>,
    }

    #[async_trait]
    impl ProbePort for TableProbe {
        async fn probe(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
            let name = file_name(file_path);
            let streams = self
                .streams
                .get(&name)
                .cloned()
                .ok_or_else(|| DomainError::ProbeFail(format!("no streams for {}", name)))?;
            MediaInfo::new(Some("mp4".to_string()), streams)
        }
    }

    /// Transcoder writing a marker file at the output path of each pass
    #[derive(Default)]
    pub struct RecordingTranscoder {
        pub passes: Mutex<Vec<Vec<String>>>,
        pub encoders: Vec<String>,
        pub fail: bool,
    }

    impl RecordingTranscoder {
        pub fn passes(&self) -> Vec<Vec<String>> {
            self.passes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscodePort for RecordingTranscoder {
        async fn transcode(&self, args: &[String]) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::ExecFail("ffmpeg exited with exit status: 1".to_string()));
            }
            let mut passes = self.passes.lock().unwrap();
            passes.push(args.to_vec());
            let output = args.last().expect("output path is the last argument");
            std::fs::write(output, format!("pass {}", passes.len())).unwrap();
            Ok(())
        }

        async fn has_encoder(&self, encoder: &str) -> Result<bool, DomainError> {
            Ok(self.encoders.iter().any(|e| e == encoder))
        }
    }

    /// Hasher answering from a digest table keyed by (file name, stream index).
    ///
    /// Keys listed in `flaky` fail on their first request only.
    #[derive(Default)]
    pub struct TableHasher {
        pub digests: HashMap<(String, usize), u8>,
        pub flaky: Mutex<HashSet<(String, usize)>>,
        pub calls: AtomicUsize,
    }

    impl TableHasher {
        pub fn with(mut self, name: &str, index: usize, byte: u8) -> Self {
            self.digests.insert((name.to_string(), index), byte);
            self
        }

        pub fn flaky(self, name: &str, index: usize) -> Self {
            self.flaky.lock().unwrap().insert((name.to_string(), index));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StreamHashPort for TableHasher {
        async fn stream_digest(&self, file_path: &Path, stream: &Stream) -> Result<StreamDigest, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = (file_name(file_path), stream.index);
            if self.flaky.lock().unwrap().remove(&key) {
                return Err(DomainError::HashFail(format!("{} stream {}: decoder error", key.0, key.1)));
            }
            self.digests
                .get(&key)
                .map(|b| StreamDigest::new([*b; 16]))
                .ok_or_else(|| DomainError::HashFail(format!("no digest for {} stream {}", key.0, key.1)))
        }
    }

    pub struct FixedQuality {
        pub metrics: Option<AudioQualityMetrics>,
        pub requests: Mutex<Vec<(String, usize, String, usize)>>,
    }

    #[async_trait]
    impl QualityMetricsPort for FixedQuality {
        async fn audio_quality(
            &self,
            original: &Path,
            original_stream: usize,
            reencoded: &Path,
            reencoded_stream: usize,
        ) -> Result<AudioQualityMetrics, DomainError> {
            self.requests.lock().unwrap().push((
                file_name(original),
                original_stream,
                file_name(reencoded),
                reencoded_stream,
            ));
            self.metrics
                .ok_or_else(|| DomainError::ExecFail("apsnr filter unavailable".to_string()))
        }
    }

    /// `in.ts` with video, two AAC streams and a silent zero-channel stream
    pub fn original_streams() -> Vec<Stream> {
        vec![
            Stream::video(0, "mpeg2video"),
            Stream::audio(1, "aac", 2, 48000).with_profile("LC"),
            Stream::audio(2, "aac", 1, 44100).with_profile("LC").with_bit_rate(96000),
            Stream::audio(3, "aac", 0, 48000),
        ]
    }

    pub fn encoded_streams() -> Vec<Stream> {
        vec![
            Stream::video(0, "hevc"),
            Stream::audio(1, "aac", 2, 48000).with_profile("LC"),
            Stream::audio(2, "aac", 1, 44100).with_profile("LC"),
        ]
    }

    pub struct Harness {
        pub dir: TempDir,
        pub transcoder: Arc<RecordingTranscoder>,
        pub hasher: Arc<TableHasher>,
        pub quality: Arc<FixedQuality>,
        pub interactor: ConvertInteractor,
    }

    impl Harness {
        pub fn new(encoded: Vec<Stream>, hasher: TableHasher, transcoder: RecordingTranscoder) -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("in.ts"), b"transport stream").unwrap();

            let mut streams = HashMap::new();
            streams.insert("in.ts".to_string(), original_streams());
            streams.insert("in.mp4".to_string(), encoded.clone());
            streams.insert("in.mp4.temp".to_string(), encoded);

            let transcoder = Arc::new(transcoder);
            let hasher = Arc::new(hasher);
            let quality = Arc::new(FixedQuality {
                metrics: Some(AudioQualityMetrics {
                    apsnr: Some(41.5),
                    asdr: Some(38.25),
                }),
                requests: Mutex::new(Vec::new()),
            });
            let interactor = ConvertInteractor::new(
                Arc::new(TableProbe { streams }),
                transcoder.clone(),
                Arc::new(CachedStreamHasher::new(hasher.clone())),
                quality.clone(),
            );

            Self {
                dir,
                transcoder,
                hasher,
                quality,
                interactor,
            }
        }

        pub fn input(&self) -> PathBuf {
            self.dir.path().join("in.ts")
        }

        pub fn output(&self) -> PathBuf {
            self.dir.path().join("in.mp4")
        }

        pub fn request(&self) -> ConvertRequest {
            ConvertRequest::new(self.input(), self.output(), EncodingOptions::default()).unwrap()
        }
    }

    /// Digests for which every copy is faithful
    pub fn faithful_hasher() -> TableHasher {
        TableHasher::default()
            .with("in.ts", 1, 1)
            .with("in.mp4", 1, 1)
            .with("in.ts", 2, 2)
            .with("in.mp4", 2, 2)
    }
}

use test_utils::*;

#[tokio::test]
async fn test_first_pass_verified() {
    let h = Harness::new(encoded_streams(), faithful_hasher(), RecordingTranscoder::default());

    let response = h.interactor.execute(h.request()).await.unwrap();

    assert_eq!(response.outcome, ConversionOutcome::Verified);
    assert!(response.quality.is_empty());
    assert_eq!(h.transcoder.passes().len(), 1);
    assert_eq!(std::fs::read_to_string(h.output()).unwrap(), "pass 1");
    assert!(!h.dir.path().join("in.mp4.temp").exists());

    let kinds: Vec<TransformationKind> = response
        .output_file
        .stream_sources()
        .iter()
        .map(|s| s.transformation_kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            TransformationKind::Converted,
            TransformationKind::Copied,
            TransformationKind::Copied
        ]
    );

    let first_pass = h.transcoder.passes()[0].join(" ");
    assert!(first_pass.contains("-map 0:0 -map 0:1 -map 0:2 -f mp4"));
    assert!(!first_pass.contains("0:3"));
}

#[tokio::test]
async fn test_repair_reencodes_mismatched_stream_and_promotes() {
    let hasher = TableHasher::default()
        .with("in.ts", 1, 1)
        .with("in.mp4", 1, 1)
        .with("in.ts", 2, 2)
        .with("in.mp4", 2, 9)
        .with("in.mp4", 0, 5)
        .with("in.mp4.temp", 0, 5)
        .with("in.mp4.temp", 1, 1);
    let h = Harness::new(encoded_streams(), hasher, RecordingTranscoder::default());

    let response = h.interactor.execute(h.request()).await.unwrap();

    assert_eq!(
        response.outcome,
        ConversionOutcome::Repaired {
            re_encoded_streams: vec![2]
        }
    );
    assert_eq!(response.output_file.path(), h.output().canonicalize().unwrap().as_path());
    assert_eq!(std::fs::read_to_string(h.output()).unwrap(), "pass 2");
    assert!(!h.dir.path().join("in.mp4.temp").exists());

    let repair_pass = h.transcoder.passes()[1].join(" ");
    assert!(repair_pass.contains("-map 0:0 -codec:0 copy -map 0:1 -codec:1 copy -map 1:2 -codec:2 aac"));
    assert!(repair_pass.contains("-b:2 96000 -bsf:2 aac_adtstoasc"));
    let temp = h.dir.path().join("in.mp4.temp");
    assert!(repair_pass.ends_with(&format!("-f mp4 {}", temp.display())));

    assert_eq!(response.quality.len(), 1);
    assert_eq!(response.quality[&2].apsnr, Some(41.5));
    let requests = h.quality.requests.lock().unwrap().clone();
    assert_eq!(requests, vec![("in.ts".to_string(), 2, "in.mp4".to_string(), 2)]);
}

#[tokio::test]
async fn test_repair_noop_keeps_first_pass_file() {
    // verification cannot hash stream 1 once; planning later finds every copy faithful
    let hasher = faithful_hasher().flaky("in.mp4", 1);
    let h = Harness::new(encoded_streams(), hasher, RecordingTranscoder::default());

    let response = h.interactor.execute(h.request()).await.unwrap();

    assert_eq!(response.outcome, ConversionOutcome::NothingToRepair);
    assert_eq!(h.transcoder.passes().len(), 1);
    assert_eq!(std::fs::read_to_string(h.output()).unwrap(), "pass 1");
}

#[tokio::test]
async fn test_failed_reverification_is_fatal() {
    let hasher = TableHasher::default()
        .with("in.ts", 1, 1)
        .with("in.mp4", 1, 1)
        .with("in.ts", 2, 2)
        .with("in.mp4", 2, 9)
        .with("in.mp4", 0, 5)
        .with("in.mp4.temp", 0, 6)
        .with("in.mp4.temp", 1, 1);
    let h = Harness::new(encoded_streams(), hasher, RecordingTranscoder::default());

    let err = h.interactor.execute(h.request()).await.unwrap_err();

    match err {
        DomainError::StreamIntegrity {
            output_stream_index,
            source_file,
            ..
        } => {
            assert_eq!(output_stream_index, 0);
            assert_eq!(source_file, "in.mp4");
        }
        other => panic!("unexpected error: {other}"),
    }
    // no second repair
    assert_eq!(h.transcoder.passes().len(), 2);
    // the failed repair stays next to the untouched first-pass file
    assert_eq!(
        std::fs::read_to_string(h.dir.path().join("in.mp4.temp")).unwrap(),
        "pass 2"
    );
    assert_eq!(std::fs::read_to_string(h.output()).unwrap(), "pass 1");
    // quality is still measured for the re-encoded stream
    assert_eq!(h.quality.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dropped_stream_fails_the_first_pass() {
    let mut encoded = encoded_streams();
    encoded.pop();
    let h = Harness::new(encoded, faithful_hasher(), RecordingTranscoder::default());

    let err = h.interactor.execute(h.request()).await.unwrap_err();

    assert!(matches!(err, DomainError::InvalidStreamSources(_)));
    assert!(err.to_string().contains("does not match number of streams"));
    assert_eq!(h.hasher.calls(), 0);
}

#[tokio::test]
async fn test_transcoder_failure_is_not_repaired() {
    let transcoder = RecordingTranscoder {
        fail: true,
        ..RecordingTranscoder::default()
    };
    let h = Harness::new(encoded_streams(), faithful_hasher(), transcoder);

    let err = h.interactor.execute(h.request()).await.unwrap_err();

    assert!(matches!(err, DomainError::ExecFail(_)));
    assert_eq!(h.hasher.calls(), 0);
}

#[tokio::test]
async fn test_missing_input() {
    let h = Harness::new(encoded_streams(), faithful_hasher(), RecordingTranscoder::default());
    let request = ConvertRequest::new(
        h.dir.path().join("absent.ts"),
        h.output(),
        EncodingOptions::default(),
    )
    .unwrap();

    let err = h.interactor.execute(request).await.unwrap_err();

    assert!(matches!(err, DomainError::FileNotFound(_)));
    assert!(h.transcoder.passes().is_empty());
}

#[tokio::test]
async fn test_repeated_digests_come_from_cache() {
    let hasher = TableHasher::default()
        .with("in.ts", 1, 1)
        .with("in.mp4", 1, 1)
        .with("in.ts", 2, 2)
        .with("in.mp4", 2, 9)
        .with("in.mp4", 0, 5)
        .with("in.mp4.temp", 0, 5)
        .with("in.mp4.temp", 1, 1);
    let h = Harness::new(encoded_streams(), hasher, RecordingTranscoder::default());

    h.interactor.execute(h.request()).await.unwrap();

    // verify: 4, planning: 0 new, re-verify: in.mp4 0, in.mp4.temp 0 and 1
    assert_eq!(h.hasher.calls(), 7);
}
