//! Two-stage reduction of chunk summaries into one text.
//!
//! Stage one joins the summaries in document order. When that overshoots the budget, stage two
//! embeds every summary, ranks them by cosine similarity to the centroid, and greedily selects
//! the most central ones until the minimum length is reached or the maximum would be exceeded.

use crate::embedding::{EmbeddingClient, EmbeddingClientError};

use super::{
    budget::Budget,
    types::{ChunkSummary, ReductionStage},
};

const SEPARATOR: &str = " ";
const SENTENCE_END: &str = ". ";

/// Reduced text plus the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// Combined or selected text.
    pub text: String,
    /// Stage that produced `text`.
    pub stage: ReductionStage,
    /// Chunk indexes included, in output order.
    pub selected: Vec<usize>,
}

/// Reduce `summaries` to fit `budget`.
pub async fn reduce(
    summaries: &[ChunkSummary],
    budget: &Budget,
    embedder: &dyn EmbeddingClient,
) -> Result<Reduction, EmbeddingClientError> {
    let combined = summaries
        .iter()
        .map(|summary| summary.text.as_str())
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    if summaries.len() <= 1 || char_len(&combined) <= budget.max_length() {
        return Ok(Reduction {
            text: combined,
            stage: ReductionStage::Combined,
            selected: summaries.iter().map(|summary| summary.index).collect(),
        });
    }

    tracing::info!(
        summaries = summaries.len(),
        combined_chars = char_len(&combined),
        max_length = budget.max_length(),
        "Combined summary over budget; ranking by salience"
    );

    let texts = summaries.iter().map(|summary| summary.text.clone()).collect();
    let embeddings = embedder.generate_embeddings(texts).await?;
    if embeddings.len() != summaries.len() {
        return Err(EmbeddingClientError::GenerationFailed(format!(
            "expected {} embeddings, received {}",
            summaries.len(),
            embeddings.len()
        )));
    }
    let dimension = embeddings[0].len();
    if embeddings.iter().any(|vector| vector.len() != dimension) {
        return Err(EmbeddingClientError::GenerationFailed(
            "embeddings have inconsistent dimensions".into(),
        ));
    }

    let (text, positions) = select_by_salience(summaries, &embeddings, budget);
    Ok(Reduction {
        text,
        stage: ReductionStage::Ranked,
        selected: positions
            .into_iter()
            .map(|position| summaries[position].index)
            .collect(),
    })
}

/// Greedy centroid selection; returns the text and the positions used, in selection order.
///
/// The output never exceeds `budget.max_length()` characters.
pub fn select_by_salience(
    summaries: &[ChunkSummary],
    embeddings: &[Vec<f32>],
    budget: &Budget,
) -> (String, Vec<usize>) {
    let center = centroid(embeddings);
    let scores: Vec<f32> = embeddings
        .iter()
        .map(|vector| cosine_similarity(vector, &center))
        .collect();

    let mut selected = vec![false; summaries.len()];
    let mut pieces: Vec<String> = Vec::new();
    let mut order = Vec::new();
    let mut length = 0usize;

    for _ in 0..summaries.len() {
        let Some(best) = most_salient(&scores, &selected) else {
            break;
        };
        selected[best] = true;

        let separator = if pieces.is_empty() { 0 } else { SEPARATOR.len() };
        let candidate = summaries[best].text.as_str();
        let candidate_len = char_len(candidate);

        if length + separator + candidate_len > budget.max_length() {
            let remaining = budget.max_length().saturating_sub(length + separator);
            let truncated = truncate_at_sentence(candidate, remaining);
            if !truncated.is_empty() {
                pieces.push(truncated.to_string());
                order.push(best);
            }
            break;
        }

        pieces.push(candidate.to_string());
        order.push(best);
        length += separator + candidate_len;
        if length >= budget.min_length() {
            break;
        }
    }

    (pieces.join(SEPARATOR), order)
}

/// Highest-scoring unselected position; the lowest position wins ties.
fn most_salient(scores: &[f32], selected: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (position, score) in scores.iter().enumerate() {
        if selected[position] {
            continue;
        }
        match best {
            Some(current) if *score > scores[current] => best = Some(position),
            None => best = Some(position),
            _ => {}
        }
    }
    best
}

/// Cut `text` to at most `budget` characters, preferring the last sentence end.
fn truncate_at_sentence(text: &str, budget: usize) -> &str {
    let prefix = match text.char_indices().nth(budget) {
        Some((offset, _)) => &text[..offset],
        None => text,
    };
    match prefix.rfind(SENTENCE_END).filter(|&position| position > 0) {
        Some(position) => prefix[..=position].trim(),
        None => prefix.trim(),
    }
}

/// Mean of equally sized vectors; empty input yields an empty vector.
pub fn centroid(vectors: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; first.len()];
    for vector in vectors {
        for (total, value) in sum.iter_mut().zip(vector) {
            *total += value;
        }
    }
    let count = vectors.len() as f32;
    sum.iter_mut().for_each(|total| *total /= count);
    sum
}

/// Cosine similarity; zero when either vector has no magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
