//! Silence-based segmentation of a transcript token stream

use rust_decimal::Decimal;

use super::speech_segment::SpeechSegment;
use crate::domain::error::TranscriptError;
use crate::domain::transcript::WordToken;

/// Default minimum silence (seconds) that splits two segments
pub const DEFAULT_SILENCE_THRESHOLD: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Ordered output of one segmentation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    segments: Vec<SpeechSegment>,
}

impl Segmentation {
    pub fn segments(&self) -> &[SpeechSegment] {
        &self.segments
    }

    /// Number of segments; this is the job's segment count
    pub fn count(&self) -> u32 {
        self.segments.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn into_segments(self) -> Vec<SpeechSegment> {
        self.segments
    }
}

/// Splits speech wherever the gap between consecutive pronunciation
/// tokens reaches the silence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    threshold: Decimal,
}

/// Accumulator for the segment being grown
struct Cursor {
    start: Decimal,
    end: Decimal,
    next_index: u32,
    segments: Vec<SpeechSegment>,
}

impl Cursor {
    fn new() -> Self {
        Self {
            start: Decimal::ZERO,
            end: Decimal::ZERO,
            next_index: 0,
            segments: Vec::new(),
        }
    }

    /// Emit the current interval unless it is empty.
    fn close(&mut self) {
        let duration = self.end - self.start;
        if duration > Decimal::ZERO {
            self.segments.push(SpeechSegment {
                index: self.next_index,
                start_time: self.start,
                duration,
            });
            self.next_index += 1;
        }
    }
}

impl Segmenter {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Segment a token stream.
    ///
    /// Non-pronunciation tokens are skipped. The first segment always
    /// starts at 0 unless the first word begins after a full threshold of
    /// silence, in which case the empty leading interval is dropped.
    pub fn segment(&self, tokens: &[WordToken]) -> Result<Segmentation, TranscriptError> {
        let mut cursor = Cursor::new();

        for (position, token) in tokens.iter().enumerate() {
            if !token.is_pronunciation() {
                continue;
            }
            let (start, end) = token
                .span()
                .ok_or(TranscriptError::MissingTiming { position })?;

            if start - cursor.end >= self.threshold {
                cursor.close();
                cursor.start = start;
            }
            cursor.end = end;
        }
        cursor.close();

        Ok(Segmentation {
            segments: cursor.segments,
        })
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn word(start: &str, end: &str) -> WordToken {
        WordToken::pronunciation(d(start), d(end))
    }

    fn assert_well_formed(segmentation: &Segmentation) {
        let segments = segmentation.segments();
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index as usize, i);
            assert!(segment.duration > Decimal::ZERO);
        }
        for pair in segments.windows(2) {
            assert!(pair[0].end_time() <= pair[1].start_time);
        }
    }

    #[test]
    fn default_threshold_is_point_two() {
        assert_eq!(Segmenter::default().threshold(), d("0.2"));
    }

    #[test]
    fn merges_small_gap_and_splits_large_gap() {
        let tokens = vec![word("0.0", "1.0"), word("1.05", "2.0"), word("3.5", "4.0")];
        let result = Segmenter::new(d("0.2")).segment(&tokens).unwrap();

        assert_eq!(
            result.segments(),
            &[
                SpeechSegment {
                    index: 0,
                    start_time: d("0.0"),
                    duration: d("2.0"),
                },
                SpeechSegment {
                    index: 1,
                    start_time: d("3.5"),
                    duration: d("0.5"),
                },
            ]
        );
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn run_without_threshold_gap_is_one_segment() {
        let tokens = vec![
            word("0.1", "0.4"),
            word("0.5", "0.9"),
            word("1.0", "1.3"),
            word("1.49", "2.0"),
        ];
        let result = Segmenter::new(d("0.2")).segment(&tokens).unwrap();
        assert_eq!(result.count(), 1);
        assert_eq!(result.segments()[0].start_time, d("0"));
        assert_eq!(result.segments()[0].duration, d("2.0"));
    }

    #[test]
    fn gap_equal_to_threshold_splits() {
        let tokens = vec![word("0.0", "1.0"), word("1.2", "1.5")];
        let result = Segmenter::new(d("0.2")).segment(&tokens).unwrap();
        assert_eq!(result.count(), 2);
        assert_eq!(result.segments()[1].start_time, d("1.2"));
    }

    #[test]
    fn late_first_word_drops_leading_silence() {
        let tokens = vec![word("5.0", "6.0"), word("6.1", "7.25")];
        let result = Segmenter::new(d("0.2")).segment(&tokens).unwrap();
        assert_eq!(result.count(), 1);
        assert_eq!(result.segments()[0].index, 0);
        assert_eq!(result.segments()[0].start_time, d("5.0"));
        assert_eq!(result.segments()[0].duration, d("2.25"));
    }

    #[test]
    fn zero_duration_segments_are_dropped_without_index() {
        let tokens = vec![word("1.0", "1.0"), word("3.0", "4.0")];
        let result = Segmenter::new(d("0.2")).segment(&tokens).unwrap();
        assert_eq!(result.count(), 1);
        assert_eq!(result.segments()[0].index, 0);
        assert_eq!(result.segments()[0].start_time, d("3.0"));
    }

    #[test]
    fn punctuation_does_not_affect_timing() {
        let with = vec![
            word("0.0", "1.0"),
            WordToken::punctuation(),
            word("2.0", "3.0"),
            WordToken::punctuation(),
        ];
        let without = vec![word("0.0", "1.0"), word("2.0", "3.0")];
        let segmenter = Segmenter::new(d("0.2"));
        assert_eq!(
            segmenter.segment(&with).unwrap(),
            segmenter.segment(&without).unwrap()
        );
    }

    #[test]
    fn empty_stream_yields_no_segments() {
        let result = Segmenter::default().segment(&[]).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn untimed_pronunciation_is_rejected() {
        let tokens = vec![
            word("0.0", "1.0"),
            WordToken {
                start_time: None,
                ..word("0", "0")
            },
        ];
        let result = Segmenter::default().segment(&tokens);
        assert!(matches!(
            result,
            Err(TranscriptError::MissingTiming { position: 1 })
        ));
    }

    #[test]
    fn threshold_comparison_is_exact() {
        // 0.3 - 0.1 is exactly 0.2 in decimal arithmetic
        let tokens = vec![word("0.0", "0.1"), word("0.3", "0.5")];
        let result = Segmenter::new(d("0.2")).segment(&tokens).unwrap();
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn output_is_ordered_and_contiguous() {
        let streams = [
            vec![word("0.0", "0.5"), word("0.6", "1.0"), word("1.5", "2.0")],
            vec![word("0.3", "0.4"), word("0.9", "1.4"), word("1.45", "1.9"), word("4.0", "4.2")],
            vec![word("2.0", "2.5"), word("2.5", "2.5"), word("9.0", "9.1")],
        ];
        for threshold in ["0.05", "0.2", "1"] {
            let segmenter = Segmenter::new(d(threshold));
            for tokens in &streams {
                assert_well_formed(&segmenter.segment(tokens).unwrap());
            }
        }
    }

    #[test]
    fn identical_input_is_deterministic() {
        let tokens = vec![word("0.0", "1.0"), word("1.05", "2.0"), word("3.5", "4.0")];
        let segmenter = Segmenter::new(d("0.2"));
        assert_eq!(
            segmenter.segment(&tokens).unwrap(),
            segmenter.segment(&tokens).unwrap()
        );
    }
}
