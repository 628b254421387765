use serde::{Deserialize, Serialize};

use super::BlobUrl;

/// Rendered narration track. `parts` records how many TTS requests the
/// dialogue was split across; `alignment` keeps the provider's raw timing
/// payload for each part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAudio {
    pub url: BlobUrl,
    pub duration_seconds: f64,
    pub parts: u32,
    pub alignment: serde_json::Value,
}

/// One generated sound-effect artifact, anchored to estimated speech timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEffect {
    pub prompt: String,
    pub url: BlobUrl,
    pub start_time_seconds: f64,
    pub duration_seconds: f64,
    pub line_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub url: BlobUrl,
    pub composition_plan: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAudio {
    pub url: BlobUrl,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverVariant {
    pub url: BlobUrl,
    pub selected: bool,
}

/// Episode cover art: a primary URL plus alternative variants. Exactly one
/// variant is selected at a time; the primary URL always mirrors the
/// selected variant. The whole value is replaced on write, never mutated in
/// place behind the episode's back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverArt {
    pub url: BlobUrl,
    #[serde(default)]
    pub reference_image_url: Option<String>,
    pub variants: Vec<CoverVariant>,
}

impl CoverArt {
    /// Builds cover art from generated variant URLs. The first variant is
    /// auto-selected.
    pub fn from_variants(
        urls: Vec<BlobUrl>,
        reference_image_url: Option<String>,
    ) -> Option<Self> {
        let first = urls.first()?.clone();
        let variants = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| CoverVariant { url, selected: i == 0 })
            .collect();
        Some(Self {
            url: first,
            reference_image_url,
            variants,
        })
    }

    /// Selects variant `index` as primary, clearing every other selection.
    /// Returns a new value; `None` when the index is out of range.
    pub fn with_selected(&self, index: usize) -> Option<Self> {
        if index >= self.variants.len() {
            return None;
        }
        let variants: Vec<CoverVariant> = self
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| CoverVariant {
                url: v.url.clone(),
                selected: i == index,
            })
            .collect();
        Some(Self {
            url: variants[index].url.clone(),
            reference_image_url: self.reference_image_url.clone(),
            variants,
        })
    }

    /// Removes variant `index`. If the removed variant was selected, the
    /// first remaining variant is promoted; removing the last variant yields
    /// `None` (no cover at all).
    pub fn with_removed(&self, index: usize) -> Option<Option<Self>> {
        if index >= self.variants.len() {
            return None;
        }
        let was_selected = self.variants[index].selected;
        let mut variants: Vec<CoverVariant> = self
            .variants
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, v)| v.clone())
            .collect();

        if variants.is_empty() {
            return Some(None);
        }
        if was_selected {
            for (i, v) in variants.iter_mut().enumerate() {
                v.selected = i == 0;
            }
        }
        let url = variants
            .iter()
            .find(|v| v.selected)
            .map(|v| v.url.clone())
            .unwrap_or_else(|| variants[0].url.clone());

        Some(Some(Self {
            url,
            reference_image_url: self.reference_image_url.clone(),
            variants,
        }))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.variants.iter().position(|v| v.selected)
    }
}
