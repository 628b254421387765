use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{ScriptContext, ScriptWriter, ScriptWriterError};
use crate::domain::{Script, ScriptLine, VoiceId};

/// Characters of spoken text that roughly fill one minute of narration, used
/// when the model omits its own duration estimate.
const CHARS_PER_MINUTE: usize = 850;

/// Script writer backed by an OpenRouter-compatible chat completions API.
pub struct OpenRouterScriptWriter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterScriptWriter {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        model: String,
        base_url: String,
    ) -> Result<Self, ScriptWriterError> {
        if api_key.trim().is_empty() {
            return Err(ScriptWriterError::MissingApiKey("openrouter".to_string()));
        }
        Ok(Self {
            http,
            api_key,
            model,
            base_url,
        })
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, ScriptWriterError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": user},
                ],
            }))
            .send()
            .await
            .map_err(|e| ScriptWriterError::ApiRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScriptWriterError::ApiRequestFailed(format!(
                "{}: {}",
                status, body
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScriptWriterError::ApiRequestFailed(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ScriptWriterError::MalformedResponse("no completion choices".to_string())
            })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Raw model output before validation and voice resolution.
#[derive(Deserialize)]
struct RawScript {
    #[serde(default)]
    title: String,
    #[serde(default)]
    genre_tone: String,
    #[serde(default)]
    approx_duration_minutes: Option<u32>,
    #[serde(default)]
    lines: Vec<RawLine>,
}

#[derive(Deserialize)]
struct RawLine {
    #[serde(default)]
    speaker: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    sound_effect: Option<String>,
}

/// Strips a leading/trailing markdown code fence if the model wrapped its
/// JSON in one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn build_system_prompt(context: &ScriptContext) -> String {
    let mut prompt = String::from(
        "You are an audiobook scriptwriter. Respond with a single JSON object, \
         no prose, matching this shape:\n\
         {\"title\": string, \"genre_tone\": string, \"approx_duration_minutes\": number, \
         \"lines\": [{\"speaker\": string, \"text\": string, \"sound_effect\": string|null}]}\n",
    );
    if context.include_sound_effects {
        prompt.push_str(
            "Where a short ambient sound would strengthen a line, set its \
             sound_effect to a brief sound description; otherwise null.\n",
        );
    } else {
        prompt.push_str("Set every sound_effect to null.\n");
    }
    prompt
}

fn build_user_prompt(context: &ScriptContext) -> String {
    let mut prompt = format!(
        "Series: {}\nSeries description: {}\nGenre and tone: {}\n\
         Episode number: {}\nEpisode premise: {}\nTarget length: about {} minutes of narration.\n",
        context.project_title,
        context.project_description,
        context.genre_tone,
        context.episode_number,
        context.episode_description,
        context.target_duration_minutes,
    );

    if !context.characters.is_empty() {
        prompt.push_str("\nCast (use these speaker names exactly):\n");
        for character in &context.characters {
            prompt.push_str(&format!(
                "- {} ({}), voiced by {}\n",
                character.character_name, character.role, character.voice_name
            ));
        }
    }

    if !context.earlier_summaries.is_empty() {
        prompt.push_str("\nStory so far:\n");
        for summary in &context.earlier_summaries {
            prompt.push_str(&format!(
                "Episode {} ({}): {}\n",
                summary.episode_number, summary.title, summary.summary
            ));
        }
    }

    if let Some(previous) = &context.previous_script_text {
        prompt.push_str("\nFull script of the previous episode:\n");
        prompt.push_str(previous);
        prompt.push('\n');
        prompt.push_str("\nContinue the story directly from where it left off.\n");
    }

    if let Some(custom) = &context.custom_prompt {
        prompt.push_str(&format!("\nAdditional instructions: {}\n", custom));
    }

    prompt
}

/// Validates the raw model output and resolves each line's voice from the
/// cast roster. Speakers outside the roster fall back to the first voice.
fn into_script(raw: RawScript, context: &ScriptContext) -> Result<Script, ScriptWriterError> {
    if raw.title.trim().is_empty() {
        return Err(ScriptWriterError::MalformedResponse(
            "missing title".to_string(),
        ));
    }
    if raw.genre_tone.trim().is_empty() {
        return Err(ScriptWriterError::MalformedResponse(
            "missing genre_tone".to_string(),
        ));
    }
    if raw.lines.is_empty() {
        return Err(ScriptWriterError::MalformedResponse(
            "script has no lines".to_string(),
        ));
    }

    let fallback_voice: Option<VoiceId> =
        context.characters.first().map(|c| c.voice_id.clone());

    let mut lines = Vec::with_capacity(raw.lines.len());
    for (i, line) in raw.lines.into_iter().enumerate() {
        if line.speaker.trim().is_empty() || line.text.trim().is_empty() {
            return Err(ScriptWriterError::MalformedResponse(format!(
                "line {} is missing speaker or text",
                i
            )));
        }
        let voice_id = context
            .characters
            .iter()
            .find(|c| c.character_name.eq_ignore_ascii_case(line.speaker.trim()))
            .map(|c| c.voice_id.clone())
            .or_else(|| fallback_voice.clone());
        let sound_effect = line
            .sound_effect
            .filter(|effect| !effect.trim().is_empty());

        lines.push(ScriptLine {
            speaker: line.speaker,
            voice_id,
            text: line.text,
            sound_effect,
        });
    }

    let total_chars: usize = lines.iter().map(|l| l.text.len()).sum();
    let approx_duration_minutes = match raw.approx_duration_minutes {
        Some(minutes) if minutes > 0 => minutes,
        _ => ((total_chars / CHARS_PER_MINUTE).max(1)) as u32,
    };

    Ok(Script {
        title: raw.title,
        genre_tone: raw.genre_tone,
        approx_duration_minutes,
        lines,
    })
}

#[async_trait]
impl ScriptWriter for OpenRouterScriptWriter {
    #[tracing::instrument(skip(self, context), fields(episode_number = context.episode_number))]
    async fn generate_script(&self, context: &ScriptContext) -> Result<Script, ScriptWriterError> {
        let content = self
            .complete(&build_system_prompt(context), &build_user_prompt(context))
            .await?;

        let raw: RawScript = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| ScriptWriterError::MalformedResponse(e.to_string()))?;

        into_script(raw, context)
    }

    async fn summarize(&self, script_text: &str) -> Result<String, ScriptWriterError> {
        let summary = self
            .complete(
                "Summarize the episode script you are given in 3-5 sentences, \
                 present tense, covering the plot beats a sequel writer needs. \
                 Respond with the summary text only.",
                script_text,
            )
            .await?;
        Ok(summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CharacterBrief;

    fn context_with_cast() -> ScriptContext {
        ScriptContext {
            characters: vec![
                CharacterBrief {
                    role: "narrator".to_string(),
                    character_name: "Narrator".to_string(),
                    voice_id: VoiceId::new("v-narrator"),
                    voice_name: "Atlas".to_string(),
                },
                CharacterBrief {
                    role: "protagonist".to_string(),
                    character_name: "Mara".to_string(),
                    voice_id: VoiceId::new("v-mara"),
                    voice_name: "Vega".to_string(),
                },
            ],
            ..Default::default()
        }
    }

    fn raw(title: &str, lines: Vec<RawLine>) -> RawScript {
        RawScript {
            title: title.to_string(),
            genre_tone: "noir".to_string(),
            approx_duration_minutes: None,
            lines,
        }
    }

    fn raw_line(speaker: &str, text: &str) -> RawLine {
        RawLine {
            speaker: speaker.to_string(),
            text: text.to_string(),
            sound_effect: None,
        }
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn voices_resolve_by_speaker_name_case_insensitively() {
        let script = into_script(
            raw("T", vec![raw_line("mara", "Hello."), raw_line("Narrator", "Rain.")]),
            &context_with_cast(),
        )
        .unwrap();

        assert_eq!(script.lines[0].voice_id.as_ref().unwrap().as_str(), "v-mara");
        assert_eq!(
            script.lines[1].voice_id.as_ref().unwrap().as_str(),
            "v-narrator"
        );
    }

    #[test]
    fn unknown_speakers_fall_back_to_the_first_voice() {
        let script = into_script(
            raw("T", vec![raw_line("Stranger", "Who goes there?")]),
            &context_with_cast(),
        )
        .unwrap();

        assert_eq!(
            script.lines[0].voice_id.as_ref().unwrap().as_str(),
            "v-narrator"
        );
    }

    #[test]
    fn missing_title_is_malformed() {
        let result = into_script(raw("", vec![raw_line("A", "x")]), &context_with_cast());
        assert!(matches!(
            result,
            Err(ScriptWriterError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_lines_are_malformed() {
        let result = into_script(raw("T", vec![]), &context_with_cast());
        assert!(matches!(
            result,
            Err(ScriptWriterError::MalformedResponse(_))
        ));
    }

    #[test]
    fn line_without_text_is_malformed() {
        let result = into_script(raw("T", vec![raw_line("A", "  ")]), &context_with_cast());
        assert!(matches!(
            result,
            Err(ScriptWriterError::MalformedResponse(_))
        ));
    }

    #[test]
    fn duration_falls_back_to_the_character_heuristic() {
        let long_text = "x".repeat(CHARS_PER_MINUTE * 3);
        let script = into_script(
            raw("T", vec![raw_line("A", &long_text)]),
            &context_with_cast(),
        )
        .unwrap();

        assert_eq!(script.approx_duration_minutes, 3);
    }

    #[test]
    fn blank_sound_effects_become_none() {
        let mut line = raw_line("A", "text");
        line.sound_effect = Some("   ".to_string());
        let script = into_script(raw("T", vec![line]), &context_with_cast()).unwrap();

        assert!(script.lines[0].sound_effect.is_none());
    }
}
