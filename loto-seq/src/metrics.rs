use loto_db::models::Pool;

/// Indices of the `k` highest scores, best first. Ties keep the lower index.
pub fn top_k_indices(scores: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices.truncate(k);
    indices
}

/// Average fraction of the drawn balls found among the top-K scored numbers.
/// `predictions[i]` holds one score per ball (index = number - 1).
pub fn hit_rate(predictions: &[Vec<f64>], actuals: &[[u8; 5]], top_k: usize) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }

    let pick_count = Pool::Balls.pick_count() as f64;
    let total: f64 = predictions
        .iter()
        .zip(actuals)
        .map(|(pred, actual)| {
            let top: Vec<u8> = top_k_indices(pred, top_k)
                .into_iter()
                .map(|i| (i + 1) as u8)
                .collect();
            actual.iter().filter(|&n| top.contains(n)).count() as f64 / pick_count
        })
        .sum();

    total / predictions.len() as f64
}

/// Expected hit rate of a uniform random top-K pick: `top_k / 49`.
pub fn random_baseline(top_k: usize) -> f64 {
    top_k as f64 / Pool::Balls.size() as f64
}

/// Mean binary cross-entropy between scores in (0, 1) and a 0/1 target.
pub fn binary_cross_entropy(scores: &[f64], target: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let eps = 1e-12;
    let sum: f64 = scores
        .iter()
        .zip(target)
        .map(|(&p, &y)| {
            let p = p.clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    sum / scores.len() as f64
}
