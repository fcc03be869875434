use rand::Rng;

use lotofacil_db::models::POOL_SIZE;

use crate::history::HistorySnapshot;

/// Amplitude du bruit ajouté au score, pour départager les égalités.
pub const JITTER: f64 = 0.5;

/// -1 si le numéro est sorti au dernier concours, +1 sinon : un poids de
/// récence positif favorise les numéros absents du dernier tirage.
pub fn recency_term(number: u8, history: &HistorySnapshot) -> f64 {
    if history.last_draw().contains(number) { -1.0 } else { 1.0 }
}

pub fn deterministic_score(
    number: u8,
    history: &HistorySnapshot,
    weight_frequency: i32,
    weight_recency: i32,
) -> f64 {
    history.frequency(number) as f64 * weight_frequency as f64
        + recency_term(number, history) * weight_recency as f64
}

pub fn score<R: Rng + ?Sized>(
    number: u8,
    history: &HistorySnapshot,
    weight_frequency: i32,
    weight_recency: i32,
    rng: &mut R,
) -> f64 {
    deterministic_score(number, history, weight_frequency, weight_recency)
        + rng.random::<f64>() * JITTER
}

/// Les 25 numéros triés par score décroissant.
pub fn ranked_numbers<R: Rng + ?Sized>(
    history: &HistorySnapshot,
    weight_frequency: i32,
    weight_recency: i32,
    rng: &mut R,
) -> Vec<u8> {
    let mut scored: Vec<(u8, f64)> = (1..=POOL_SIZE)
        .map(|n| (n, score(n, history, weight_frequency, weight_recency, rng)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(n, _)| n).collect()
}
