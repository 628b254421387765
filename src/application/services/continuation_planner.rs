use crate::application::ports::{CharacterBrief, EpisodeSummary, ScriptContext};
use crate::domain::{Episode, Project, ProjectCharacter};

/// Character cap on the previous episode's full script carried into the
/// writer context, to respect provider context limits.
pub const PREVIOUS_SCRIPT_CHAR_LIMIT: usize = 10_000;

/// Assembles the writer context for an episode: project identity, character
/// roster, and - for continuations - compact summaries of every earlier
/// episode plus the complete script of the immediately preceding one.
pub struct ContinuationPlanner;

impl ContinuationPlanner {
    pub fn build_context(
        project: &Project,
        episode: &Episode,
        characters: &[ProjectCharacter],
        previous_episodes: &[Episode],
        custom_prompt: Option<String>,
    ) -> ScriptContext {
        let character_briefs = characters
            .iter()
            .map(|c| CharacterBrief {
                role: c.role.clone(),
                character_name: c.character_name.clone(),
                voice_id: c.voice_id.clone(),
                voice_name: c.voice_name.clone(),
            })
            .collect();

        // Summaries for 1..N-2; the immediate predecessor contributes its
        // full script text instead.
        let earlier_summaries = if previous_episodes.len() > 1 {
            previous_episodes[..previous_episodes.len() - 1]
                .iter()
                .filter_map(|ep| {
                    ep.summary.as_ref().map(|summary| EpisodeSummary {
                        episode_number: ep.episode_number,
                        title: ep.title.clone(),
                        summary: summary.clone(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let previous_script_text = previous_episodes.last().and_then(|ep| {
            ep.script_text.as_ref().map(|text| {
                let mut capped = String::new();
                for ch in text.chars() {
                    if capped.len() + ch.len_utf8() > PREVIOUS_SCRIPT_CHAR_LIMIT {
                        break;
                    }
                    capped.push(ch);
                }
                capped
            })
        });

        ScriptContext {
            project_title: project.title.clone(),
            project_description: project.description.clone(),
            genre_tone: project.genre_tone.clone(),
            episode_number: episode.episode_number,
            episode_description: episode.description.clone(),
            target_duration_minutes: episode.target_duration_minutes,
            characters: character_briefs,
            include_sound_effects: episode.options.include_sound_effects,
            earlier_summaries,
            previous_script_text,
            custom_prompt,
        }
    }
}
