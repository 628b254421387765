use serde::{Deserialize, Serialize};

use super::VoiceId;

/// Structured episode script produced by the script writer (or edited by
/// hand, as long as it keeps the same shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub genre_tone: String,
    pub approx_duration_minutes: u32,
    pub lines: Vec<ScriptLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub speaker: String,
    #[serde(default)]
    pub voice_id: Option<VoiceId>,
    pub text: String,
    #[serde(default)]
    pub sound_effect: Option<String>,
}

impl Script {
    /// Renders the display-text version of the script. Rebuilt whenever the
    /// script is replaced; stored alongside the structured form so the
    /// continuation context does not re-derive it.
    pub fn render_text(&self) -> String {
        let mut out = Vec::new();
        out.push(format!("# {}", self.title));
        out.push(String::new());
        out.push(format!("*{}*", self.genre_tone));
        out.push(String::new());

        for line in &self.lines {
            out.push(format!("**{}**: {}", line.speaker, line.text));
            if let Some(effect) = &line.sound_effect {
                out.push(format!("  [{}]", effect));
            }
            out.push(String::new());
        }

        out.join("\n")
    }

    pub fn total_chars(&self) -> usize {
        self.lines.iter().map(|l| l.text.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(speaker: &str, text: &str, effect: Option<&str>) -> ScriptLine {
        ScriptLine {
            speaker: speaker.to_string(),
            voice_id: None,
            text: text.to_string(),
            sound_effect: effect.map(String::from),
        }
    }

    #[test]
    fn render_text_includes_title_speakers_and_effects() {
        let script = Script {
            title: "The Vault".to_string(),
            genre_tone: "noir thriller".to_string(),
            approx_duration_minutes: 5,
            lines: vec![
                line("Narrator", "It was raining.", None),
                line("Mara", "Open the door.", Some("metal creaking")),
            ],
        };

        let text = script.render_text();

        assert!(text.starts_with("# The Vault"));
        assert!(text.contains("**Narrator**: It was raining."));
        assert!(text.contains("[metal creaking]"));
    }

    #[test]
    fn total_chars_counts_only_spoken_text() {
        let script = Script {
            title: "t".to_string(),
            genre_tone: "g".to_string(),
            approx_duration_minutes: 1,
            lines: vec![line("A", "abcd", Some("long effect prompt")), line("B", "ef", None)],
        };

        assert_eq!(script.total_chars(), 6);
    }
}
