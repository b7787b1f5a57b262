// Domain rules - Business logic and policies

use std::collections::HashSet;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Invariant sets a [`StreamSources`] must satisfy for each pipeline stage
pub struct StreamSourceRules;

impl StreamSourceRules {
    /// Initial conversion: video converted, audio copied, all from one input
    pub fn validate_initial(sources: &[StreamSource]) -> Result<(), DomainError> {
        Self::require_audio_or_video(sources)?;
        Self::require_video_and_audio(sources)?;

        if !Self::video(sources).all(|s| s.transformation_kind() == TransformationKind::Converted) {
            return Err(Self::invalid("All video streams must be converted."));
        }
        if !Self::audio(sources).all(|s| s.transformation_kind() == TransformationKind::Copied) {
            return Err(Self::invalid("All audio streams must be copied."));
        }

        let files: HashSet<&VideoFile> = sources.iter().map(|s| s.source_video_file().as_ref()).collect();
        if files.len() != 1 {
            return Err(Self::invalid(
                "All stream sources must originate from the same VideoFile.",
            ));
        }

        let unique: HashSet<usize> = sources.iter().map(|s| s.source_stream_index()).collect();
        if unique.len() < sources.len() {
            return Err(Self::invalid("Source streams must be unique."));
        }

        Ok(())
    }

    /// Repair pass: video copied from the encoded file, audio either copied
    /// from the encoded file or re-encoded from a different original file
    pub fn validate_repair(sources: &[StreamSource]) -> Result<(), DomainError> {
        Self::require_audio_or_video(sources)?;
        Self::require_video_and_audio(sources)?;

        if !Self::video(sources).all(|s| s.transformation_kind() == TransformationKind::Copied) {
            return Err(Self::invalid("All video streams must be copied."));
        }

        let video_files: HashSet<&VideoFile> =
            Self::video(sources).map(|s| s.source_video_file().as_ref()).collect();
        if video_files.len() != 1 {
            return Err(Self::invalid(
                "All video streams must originate from the same encoded file.",
            ));
        }
        // Non-empty: at least one video source was required above.
        let encoded = video_files.into_iter().next();

        for source in Self::audio(sources) {
            let from_encoded = Some(source.source_video_file().as_ref()) == encoded;
            match source.transformation_kind() {
                TransformationKind::Copied if !from_encoded => {
                    return Err(Self::invalid(
                        "Copied audio streams must originate from the encoded file.",
                    ));
                }
                TransformationKind::ReEncoded if from_encoded => {
                    return Err(Self::invalid(
                        "Re-encoded streams must originate from the original file, not the encoded file.",
                    ));
                }
                TransformationKind::Converted => {
                    return Err(Self::invalid(
                        "Audio streams must be either copied or re-encoded.",
                    ));
                }
                _ => {}
            }
        }

        let originals: HashSet<&VideoFile> = sources
            .iter()
            .filter(|s| s.transformation_kind() == TransformationKind::ReEncoded)
            .map(|s| s.source_video_file().as_ref())
            .collect();
        if originals.len() > 1 {
            return Err(Self::invalid(
                "All re-encoded streams must originate from the same original file.",
            ));
        }

        let mut seen = HashSet::new();
        for source in sources {
            if !seen.insert((source.source_video_file().path(), source.source_stream_index())) {
                return Err(Self::invalid("Source streams must be unique."));
            }
        }

        Ok(())
    }

    fn require_audio_or_video(sources: &[StreamSource]) -> Result<(), DomainError> {
        if sources
            .iter()
            .any(|s| !s.source_stream().codec_type.is_audio_or_video())
        {
            return Err(Self::invalid(
                "Stream sources must only contain video or audio streams.",
            ));
        }
        Ok(())
    }

    fn require_video_and_audio(sources: &[StreamSource]) -> Result<(), DomainError> {
        if Self::video(sources).next().is_none() {
            return Err(Self::invalid("At least one video stream is required."));
        }
        if Self::audio(sources).next().is_none() {
            return Err(Self::invalid("At least one audio stream is required."));
        }
        Ok(())
    }

    fn video(sources: &[StreamSource]) -> impl Iterator<Item = &StreamSource> {
        sources.iter().filter(|s| s.source_stream().is_video())
    }

    fn audio(sources: &[StreamSource]) -> impl Iterator<Item = &StreamSource> {
        sources.iter().filter(|s| s.source_stream().is_audio())
    }

    fn invalid(message: &str) -> DomainError {
        DomainError::InvalidStreamSources(message.to_string())
    }
}

/// Maps probed AAC profile names to encoder `-profile` values
pub struct AacProfileMap;

impl AacProfileMap {
    const PROFILES: &'static [(&'static str, &'static str)] = &[
        ("LC", "aac_low"),
        ("Main", "aac_main"),
        ("LTP", "aac_ltp"),
        ("HE-AAC", "aac_he"),
        ("HE-AACv2", "aac_he_v2"),
        ("LD", "aac_ld"),
        ("ELD", "aac_eld"),
    ];

    /// Encoder profile for a probed profile, if one is known
    pub fn encoder_profile(probed: &str) -> Option<&'static str> {
        Self::PROFILES
            .iter()
            .find(|(name, _)| *name == probed)
            .map(|(_, encoder)| *encoder)
    }
}

/// Codec names the repair pass knows how to re-encode
pub fn is_reencode_supported(codec_name: Option<&str>) -> bool {
    codec_name == Some("aac")
}
