use std::collections::HashSet;

use log::{info, warn};
use rand::Rng;

use lotofacil_db::models::Combination;

use crate::generator::Generator;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 50_000;

#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Combinaisons uniques, dans l'ordre d'obtention.
    pub combinations: Vec<Combination>,
    /// Appels au générateur consommés.
    pub attempts: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}

/// Appelle la stratégie pondérée/uniforme jusqu'à `target` combinaisons distinctes
/// ou `max_attempts` appels. Un lot vide signale un échec total.
pub fn generate_batch<R: Rng + ?Sized>(
    generator: &Generator<'_>,
    target: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Batch {
    let mut batch = Batch::default();

    if !generator.config().is_feasible() {
        warn!("Filtres impossibles à satisfaire, lot abandonné");
        return batch;
    }

    let mut seen: HashSet<Combination> = HashSet::with_capacity(target);
    while batch.combinations.len() < target && batch.attempts < max_attempts {
        batch.attempts += 1;
        if let Some(combination) = generator.generate(rng) {
            if seen.insert(combination) {
                batch.combinations.push(combination);
            }
        }
    }

    info!(
        "Lot : {}/{} combinaisons en {} appels",
        batch.len(),
        target,
        batch.attempts
    );
    batch
}
