//! Static model capability table.
//!
//! Each entry describes how a model family expects its input (task prefix or instruction
//! prompt) and which language it summarizes natively. The table decides once per run whether
//! the pipeline summarizes directly or translates around a monolingual model.

use serde::Serialize;

/// How the prompt sent to a model is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "prefix", rename_all = "snake_case")]
pub enum PromptStyle {
    /// Seq2seq models trained with a task prefix, e.g. `"summarize: "` for T5.
    TaskPrefix(&'static str),
    /// Instruction-tuned chat models that need an explicit instruction.
    Instruction,
}

/// Capabilities of a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelProfile {
    /// Lowercase substring matched against the model identifier.
    pub pattern: &'static str,
    /// Native summarization language, or `None` for multilingual models.
    pub language: Option<&'static str>,
    /// Prompt assembly style.
    pub prompt_style: PromptStyle,
}

/// Processing variant selected for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingVariant {
    /// The model summarizes the document language directly.
    Direct,
    /// Translate each chunk into `pivot`, summarize, and translate the summary back to `source`.
    TranslateSummarizeTranslate {
        /// Language of the article.
        source: String,
        /// Language the model summarizes in.
        pivot: String,
    },
}

// Order matters: the first matching pattern wins, so `mt5` precedes `t5`.
const MODEL_PROFILES: &[ModelProfile] = &[
    ModelProfile {
        pattern: "mt5",
        language: None,
        prompt_style: PromptStyle::TaskPrefix("summarize: "),
    },
    ModelProfile {
        pattern: "t5",
        language: Some("en"),
        prompt_style: PromptStyle::TaskPrefix("summarize: "),
    },
    ModelProfile {
        pattern: "bart",
        language: Some("en"),
        prompt_style: PromptStyle::Instruction,
    },
    ModelProfile {
        pattern: "pegasus",
        language: Some("en"),
        prompt_style: PromptStyle::Instruction,
    },
    ModelProfile {
        pattern: "phi",
        language: Some("en"),
        prompt_style: PromptStyle::Instruction,
    },
    ModelProfile {
        pattern: "bielik",
        language: Some("pl"),
        prompt_style: PromptStyle::Instruction,
    },
];

const DEFAULT_PROFILE: ModelProfile = ModelProfile {
    pattern: "*",
    language: None,
    prompt_style: PromptStyle::Instruction,
};

/// Look up the profile for a model identifier; unknown models are treated as multilingual.
pub fn profile_for(model: &str) -> ModelProfile {
    let normalized = model.to_lowercase();
    MODEL_PROFILES
        .iter()
        .find(|profile| normalized.contains(profile.pattern))
        .copied()
        .unwrap_or(DEFAULT_PROFILE)
}

/// Every known profile followed by the catch-all default.
pub fn model_profiles() -> Vec<ModelProfile> {
    let mut profiles = MODEL_PROFILES.to_vec();
    profiles.push(DEFAULT_PROFILE);
    profiles
}

impl ModelProfile {
    /// Choose the processing variant for articles written in `document_language`.
    pub fn variant_for(&self, document_language: &str) -> ProcessingVariant {
        match self.language {
            Some(native) if !native.eq_ignore_ascii_case(document_language) => {
                ProcessingVariant::TranslateSummarizeTranslate {
                    source: document_language.to_lowercase(),
                    pivot: native.to_string(),
                }
            }
            _ => ProcessingVariant::Direct,
        }
    }

    /// Assemble the prompt for `text` under the given token bounds.
    pub fn build_prompt(&self, text: &str, max_tokens: usize, min_tokens: usize) -> String {
        match self.prompt_style {
            PromptStyle::TaskPrefix(prefix) => format!("{prefix}{text}"),
            PromptStyle::Instruction => {
                let max_words = words_for_tokens(max_tokens);
                let min_words = words_for_tokens(min_tokens).min(max_words);
                format!(
                    "Summarize the following news text in {min_words} to {max_words} words. \
                     Write in the same language as the text. Do not add facts that are not in \
                     the text. Output a single plain paragraph without a preamble.\n\n{text}"
                )
            }
        }
    }
}

fn words_for_tokens(tokens: usize) -> usize {
    (tokens * 3 / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mt5_is_matched_before_t5() {
        assert_eq!(profile_for("google/mt5-small").language, None);
        assert_eq!(profile_for("flan-t5-base").language, Some("en"));
    }

    #[test]
    fn unknown_models_summarize_directly() {
        let profile = profile_for("llama3.2:3b");
        assert_eq!(profile.variant_for("pl"), ProcessingVariant::Direct);
        assert_eq!(profile.prompt_style, PromptStyle::Instruction);
    }

    #[test]
    fn monolingual_models_translate_around_foreign_articles() {
        let profile = profile_for("bart-large-cnn");
        assert_eq!(
            profile.variant_for("pl"),
            ProcessingVariant::TranslateSummarizeTranslate {
                source: "pl".into(),
                pivot: "en".into(),
            }
        );
        assert_eq!(profile.variant_for("EN"), ProcessingVariant::Direct);
    }

    #[test]
    fn task_prefix_is_prepended() {
        let prompt = profile_for("t5-small").build_prompt("Text body.", 60, 20);
        assert_eq!(prompt, "summarize: Text body.");
    }

    #[test]
    fn instruction_prompt_states_word_bounds() {
        let prompt = profile_for("llama3.2").build_prompt("Body", 100, 40);
        assert!(prompt.contains("30 to 75 words"));
        assert!(prompt.ends_with("Body"));
    }
}
