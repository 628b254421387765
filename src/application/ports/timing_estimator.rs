use crate::domain::ScriptLine;

/// Estimated span of one spoken line within the narration track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSpan {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Maps script lines to time spans in the rendered narration. The default
/// implementation is a chars-per-second heuristic; swapping in an
/// alignment-driven estimator must not touch pipeline control flow.
pub trait TimingEstimator: Send + Sync {
    fn line_spans(&self, lines: &[ScriptLine]) -> Vec<LineSpan>;
}

/// Fixed-rate estimator. This is an approximation: spans are derived from
/// text length, not from the TTS alignment data, even when that data exists.
#[derive(Debug, Clone, Copy)]
pub struct CharsPerSecondEstimator {
    chars_per_second: f64,
}

impl CharsPerSecondEstimator {
    pub fn new(chars_per_second: f64) -> Self {
        Self { chars_per_second }
    }
}

impl Default for CharsPerSecondEstimator {
    fn default() -> Self {
        // ~14 chars/s of narrated speech.
        Self::new(14.0)
    }
}

impl TimingEstimator for CharsPerSecondEstimator {
    fn line_spans(&self, lines: &[ScriptLine]) -> Vec<LineSpan> {
        let mut current = 0.0;
        lines
            .iter()
            .map(|line| {
                let duration = line.text.len() as f64 / self.chars_per_second;
                let span = LineSpan {
                    start_seconds: current,
                    end_seconds: current + duration,
                };
                current += duration;
                span
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScriptLine;

    fn line(text: &str) -> ScriptLine {
        ScriptLine {
            speaker: "A".to_string(),
            voice_id: None,
            text: text.to_string(),
            sound_effect: None,
        }
    }

    #[test]
    fn spans_are_cumulative_and_proportional_to_length() {
        let estimator = CharsPerSecondEstimator::new(10.0);
        let spans = estimator.line_spans(&[line("aaaaaaaaaa"), line("bbbbb")]);

        assert_eq!(spans.len(), 2);
        assert!((spans[0].start_seconds - 0.0).abs() < 1e-9);
        assert!((spans[0].end_seconds - 1.0).abs() < 1e-9);
        assert!((spans[1].start_seconds - 1.0).abs() < 1e-9);
        assert!((spans[1].end_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_script_yields_no_spans() {
        let estimator = CharsPerSecondEstimator::default();
        assert!(estimator.line_spans(&[]).is_empty());
    }
}
