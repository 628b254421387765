use crate::domain::ScriptLine;

/// A TTS request never carries more than this many parts; long scripts are
/// distributed across them instead of overflowing the provider's budget.
pub const MAX_PARTS: usize = 3;

/// Splits script lines into at most [`MAX_PARTS`] ordered parts for TTS
/// requests with a fixed character budget. A line is never split across
/// parts; when the whole script fits the budget a single part is returned.
///
/// Distribution is greedy against a `total / MAX_PARTS` target. The line
/// that reaches the target stays in the current part; the split happens
/// before the next line.
pub fn split_into_parts(lines: &[ScriptLine], max_chars_per_request: usize) -> Vec<Vec<ScriptLine>> {
    let total_chars: usize = lines.iter().map(|l| l.text.len()).sum();

    if total_chars <= max_chars_per_request {
        return vec![lines.to_vec()];
    }

    let target_chars_per_part = total_chars as f64 / MAX_PARTS as f64;

    let mut parts: Vec<Vec<ScriptLine>> = Vec::new();
    let mut current_part: Vec<ScriptLine> = Vec::new();
    let mut current_length = 0usize;

    for line in lines {
        if current_length as f64 >= target_chars_per_part
            && parts.len() < MAX_PARTS - 1
            && !current_part.is_empty()
        {
            parts.push(std::mem::take(&mut current_part));
            current_length = 0;
        }
        current_length += line.text.len();
        current_part.push(line.clone());
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> ScriptLine {
        ScriptLine {
            speaker: "Narrator".to_string(),
            voice_id: None,
            text: text.to_string(),
            sound_effect: None,
        }
    }

    fn lines_of(sizes: &[usize]) -> Vec<ScriptLine> {
        sizes.iter().map(|n| line(&"x".repeat(*n))).collect()
    }

    #[test]
    fn under_budget_returns_single_part() {
        let lines = lines_of(&[100, 200, 300]);
        let parts = split_into_parts(&lines, 1000);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 3);
    }

    #[test]
    fn exactly_at_budget_returns_single_part() {
        let lines = lines_of(&[500, 500]);
        let parts = split_into_parts(&lines, 1000);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn over_budget_never_exceeds_three_parts() {
        // Well over 3x the budget.
        let lines = lines_of(&[400; 10]);
        let parts = split_into_parts(&lines, 1000);
        assert!(parts.len() <= MAX_PARTS);
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn concatenating_parts_reconstructs_original_sequence() {
        let lines = lines_of(&[350, 120, 800, 90, 410, 770, 60, 500]);
        let parts = split_into_parts(&lines, 1000);

        let rejoined: Vec<ScriptLine> = parts.into_iter().flatten().collect();
        assert_eq!(rejoined, lines);
    }

    #[test]
    fn lines_are_never_split_across_parts() {
        let lines = lines_of(&[2000, 2000, 2000]);
        let parts = split_into_parts(&lines, 1000);

        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert_eq!(part.len(), 1);
        }
    }

    #[test]
    fn line_reaching_target_stays_in_current_part() {
        // Total 3000, target 1000 per part. The second line pushes the first
        // part past the target but belongs to it.
        let lines = lines_of(&[900, 200, 900, 1000]);
        let parts = split_into_parts(&lines, 1000);

        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[0][1].text.len(), 200);
    }
}
