//! Diversity-aware ranking
//!
//! Maximal-marginal-relevance selection over a candidate pool returned by
//! the vector store. `lambda` mixes relevance against redundancy: 1.0 is
//! pure relevance, 0.0 is pure diversity.

use crate::vector_store::ScoredPoint;

/// Cosine similarity between two vectors; zero for mismatched or empty input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Select up to `k` candidates by maximal marginal relevance.
///
/// Greedy selection: each round picks the candidate maximising
/// `lambda * sim(query, c) - (1 - lambda) * max(sim(c, selected))`.
/// Candidate order in the result is selection order (best first).
pub fn maximal_marginal_relevance(
    query: &[f32],
    candidates: Vec<ScoredPoint>,
    lambda: f32,
    k: usize,
) -> Vec<ScoredPoint> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, &c.vector))
        .collect();

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(&candidates[idx].vector, &candidates[s].vector))
                .fold(0.0f32, f32::max);
            let score = lambda * relevance[idx] - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.swap_remove(best_pos));
    }

    let mut by_index: Vec<Option<ScoredPoint>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|idx| by_index[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(content: &str, vector: Vec<f32>, score: f32) -> ScoredPoint {
        ScoredPoint {
            content: content.to_string(),
            page: 1,
            score,
            vector,
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn pure_relevance_picks_nearest() {
        let query = [1.0, 0.0];
        let candidates = vec![
            point("far", vec![0.0, 1.0], 0.0),
            point("near", vec![1.0, 0.1], 0.9),
            point("mid", vec![0.7, 0.7], 0.5),
        ];
        let picked = maximal_marginal_relevance(&query, candidates, 1.0, 1);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].content, "near");
    }

    #[test]
    fn diversity_avoids_near_duplicates() {
        let query = [1.0, 0.0, 0.0];
        // Two near-identical highly relevant points plus one distinct one.
        let candidates = vec![
            point("dup_a", vec![1.0, 0.01, 0.0], 0.99),
            point("dup_b", vec![1.0, 0.02, 0.0], 0.98),
            point("other", vec![0.6, 0.0, 0.8], 0.6),
        ];
        let picked = maximal_marginal_relevance(&query, candidates, 0.7, 2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].content, "dup_a");
        // The second pick skips the near-duplicate in favor of diversity
        assert_eq!(picked[1].content, "other");
    }

    #[test]
    fn k_larger_than_pool_returns_everything() {
        let query = [1.0, 0.0];
        let candidates = vec![
            point("a", vec![1.0, 0.0], 1.0),
            point("b", vec![0.0, 1.0], 0.0),
        ];
        let picked = maximal_marginal_relevance(&query, candidates, 0.7, 5);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn empty_pool_is_empty() {
        assert!(maximal_marginal_relevance(&[1.0], Vec::new(), 0.7, 5).is_empty());
    }
}
