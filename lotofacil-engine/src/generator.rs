use anyhow::{Context, Result, bail};
use log::{debug, warn};
use rand::Rng;

use lotofacil_db::models::{Combination, PICK_COUNT, POOL_SIZE, validate_number};

use crate::config::GenerationConfig;
use crate::filters::is_valid;
use crate::history::HistorySnapshot;
use crate::scoring::ranked_numbers;

/// Le vivier pondéré garde entre 15 et 20 meilleurs numéros.
const TOP_SLICE_EXTRA: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    pub weighted: usize,
    pub uniform: usize,
    pub seeded: usize,
}

impl Default for AttemptBudget {
    fn default() -> Self {
        Self {
            weighted: 5_000,
            uniform: 10_000,
            seeded: 10_000,
        }
    }
}

/// Complète `numbers` avec des tirages uniformes distincts jusqu'à `target` éléments.
fn fill_distinct<R: Rng + ?Sized>(numbers: &mut Vec<u8>, target: usize, rng: &mut R) {
    while numbers.len() < target {
        let n = rng.random_range(1..=POOL_SIZE);
        if !numbers.contains(&n) {
            numbers.push(n);
        }
    }
}

fn seeded_attempt<R: Rng + ?Sized>(base: &[u8], rng: &mut R) -> Option<Combination> {
    let mut numbers = Vec::with_capacity(PICK_COUNT);
    numbers.extend_from_slice(base);
    fill_distinct(&mut numbers, PICK_COUNT, rng);
    Combination::new(&numbers).ok()
}

fn uniform_attempt<R: Rng + ?Sized>(rng: &mut R) -> Option<Combination> {
    seeded_attempt(&[], rng)
}

fn weighted_attempt<R: Rng + ?Sized>(
    history: &HistorySnapshot,
    config: &GenerationConfig,
    rng: &mut R,
) -> Option<Combination> {
    let ranked = ranked_numbers(history, config.weight_frequency, config.weight_recency, rng);
    let top = PICK_COUNT + rng.random_range(0..TOP_SLICE_EXTRA);

    // Le vivier est toujours complété jusqu'aux 25 numéros.
    let mut pool: Vec<u8> = ranked[..top].to_vec();
    fill_distinct(&mut pool, POOL_SIZE as usize, rng);

    let mut picked = Vec::with_capacity(PICK_COUNT);
    while picked.len() < PICK_COUNT {
        let idx = rng.random_range(0..pool.len());
        picked.push(pool.remove(idx));
    }
    Combination::new(&picked).ok()
}

/// Numéros fixés par l'utilisateur : doublons retirés, 1 à 15 numéros de 1 à 25.
pub fn normalize_picks(picks: &[u8]) -> Result<Vec<u8>> {
    let mut base: Vec<u8> = Vec::with_capacity(picks.len());
    for &n in picks {
        validate_number(n)?;
        if !base.contains(&n) {
            base.push(n);
        }
    }
    if base.is_empty() {
        bail!("Aucun numéro fixé");
    }
    if base.len() > PICK_COUNT {
        bail!("Au plus {} numéros peuvent être fixés (reçu {})", PICK_COUNT, base.len());
    }
    Ok(base)
}

pub struct Generator<'a> {
    config: &'a GenerationConfig,
    history: Option<&'a HistorySnapshot>,
    budget: AttemptBudget,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a GenerationConfig, history: Option<&'a HistorySnapshot>) -> Self {
        Self {
            config,
            history,
            budget: AttemptBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: AttemptBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        self.config
    }

    fn accepts(&self, combination: &Combination) -> bool {
        is_valid(combination, self.config, self.history.map(HistorySnapshot::last_draw))
    }

    fn first_valid<F>(&self, budget: usize, mut attempt: F) -> Option<Combination>
    where
        F: FnMut() -> Option<Combination>,
    {
        (0..budget)
            .filter_map(|_| attempt())
            .find(|candidate| self.accepts(candidate))
    }

    /// Stratégie pondérée si un historique est chargé, uniforme sinon.
    /// `None` : aucun candidat valide dans le budget, il faut assouplir les filtres.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Combination> {
        match self.history {
            Some(history) => self.weighted(history, rng),
            None => self.uniform(rng),
        }
    }

    fn weighted<R: Rng + ?Sized>(&self, history: &HistorySnapshot, rng: &mut R) -> Option<Combination> {
        let found = self.first_valid(self.budget.weighted, || weighted_attempt(history, self.config, rng));
        if found.is_some() {
            return found;
        }
        debug!(
            "Stratégie pondérée épuisée après {} essais, repli sur la stratégie uniforme",
            self.budget.weighted
        );
        self.uniform(rng)
    }

    pub fn uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Combination> {
        let found = self.first_valid(self.budget.uniform, || uniform_attempt(rng));
        if found.is_none() {
            warn!("Aucune combinaison valide après {} essais uniformes", self.budget.uniform);
        }
        found
    }

    /// Complète les numéros fixés. Si aucun tirage ne passe les filtres,
    /// la grille est rendue complétée sans contrôle des filtres.
    pub fn seeded<R: Rng + ?Sized>(&self, picks: &[u8], rng: &mut R) -> Result<Combination> {
        let base = normalize_picks(picks)?;

        if base.len() == PICK_COUNT {
            let combination = Combination::new(&base)?;
            if !self.accepts(&combination) {
                warn!("La sélection complète ne respecte pas les filtres, elle est conservée telle quelle");
            }
            return Ok(combination);
        }

        if let Some(found) = self.first_valid(self.budget.seeded, || seeded_attempt(&base, rng)) {
            return Ok(found);
        }

        warn!(
            "Aucune grille valide avec ces numéros fixés après {} essais : grille complétée sans filtre",
            self.budget.seeded
        );
        seeded_attempt(&base, rng).context("Impossible de compléter la sélection")
    }

    /// Sans numéro fixé : stratégie pondérée ou uniforme. Avec 1 à 15 numéros : stratégie fixée.
    pub fn generate_one<R: Rng + ?Sized>(&self, picks: &[u8], rng: &mut R) -> Result<Option<Combination>> {
        if picks.is_empty() {
            return Ok(self.generate(rng));
        }
        self.seeded(picks, rng).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotofacil_db::models::DrawRecord;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn history() -> HistorySnapshot {
        let draws = [
            (1..=15).collect::<Vec<u8>>(),
            (6..=20).collect(),
            (11..=25).collect(),
        ];
        HistorySnapshot::from_draws(
            draws
                .iter()
                .enumerate()
                .map(|(i, numbers)| DrawRecord {
                    draw_id: (i + 1).to_string(),
                    date: String::new(),
                    numbers: Combination::new(numbers).unwrap(),
                })
                .collect(),
        )
        .unwrap()
    }

    fn assert_well_formed(c: &Combination) {
        let numbers = c.numbers();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]), "non trié ou doublon : {c}");
        assert!(numbers.iter().all(|&n| (1..=25).contains(&n)));
    }

    fn small_budget() -> AttemptBudget {
        AttemptBudget { weighted: 20, uniform: 20, seeded: 20 }
    }

    #[test]
    fn test_uniform_unconstrained_succeeds() {
        let config = GenerationConfig::default();
        let generator = Generator::new(&config, None);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let c = generator.generate(&mut rng).expect("filtres triviaux");
            assert_well_formed(&c);
        }
    }

    #[test]
    fn test_no_history_uses_uniform_and_respects_filters() {
        let config = GenerationConfig { min_even: 6, max_even: 8, min_sum: 180, max_sum: 210, ..Default::default() };
        let generator = Generator::new(&config, None);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let c = generator.generate(&mut rng).unwrap();
            assert_well_formed(&c);
            assert!((6..=8).contains(&c.even_count()));
            assert!((180..=210).contains(&c.sum()));
        }
    }

    #[test]
    fn test_weighted_respects_filters_and_repetition() {
        let h = history();
        let config = GenerationConfig {
            min_even: 5,
            max_even: 9,
            min_sum: 170,
            max_sum: 220,
            weight_frequency: 2,
            weight_recency: 3,
            avoid_repeat: true,
        };
        let generator = Generator::new(&config, Some(&h));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let c = generator.generate(&mut rng).unwrap();
            assert_well_formed(&c);
            assert!((5..=9).contains(&c.even_count()));
            assert!((170..=220).contains(&c.sum()));
            assert!(c.overlap(h.last_draw()) <= 9);
        }
    }

    #[test]
    fn test_weighted_exhaustion_falls_back_to_uniform() {
        let h = history();
        let config = GenerationConfig::default();
        let budget = AttemptBudget { weighted: 0, ..AttemptBudget::default() };
        let generator = Generator::new(&config, Some(&h)).with_budget(budget);
        let mut rng = StdRng::seed_from_u64(4);
        assert!(generator.generate(&mut rng).is_some());
    }

    #[test]
    fn test_infeasible_filters_yield_nothing() {
        let h = history();
        let config = GenerationConfig { max_even: 1, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(5);

        let generator = Generator::new(&config, Some(&h)).with_budget(small_budget());
        assert_eq!(generator.generate(&mut rng), None);

        let generator = Generator::new(&config, None).with_budget(small_budget());
        assert_eq!(generator.generate(&mut rng), None);
    }

    #[test]
    fn test_zero_uniform_budget_yields_nothing() {
        let config = GenerationConfig::default();
        let budget = AttemptBudget { uniform: 0, ..AttemptBudget::default() };
        let generator = Generator::new(&config, None).with_budget(budget);
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(generator.generate(&mut rng), None);
    }

    #[test]
    fn test_seeded_keeps_picks_and_filters() {
        let config = GenerationConfig { min_sum: 190, max_sum: 230, ..Default::default() };
        let generator = Generator::new(&config, None);
        let mut rng = StdRng::seed_from_u64(7);
        let picks = [25, 3, 17];
        for _ in 0..20 {
            let c = generator.seeded(&picks, &mut rng).unwrap();
            assert_well_formed(&c);
            assert!(picks.iter().all(|&p| c.contains(p)));
            assert!((190..=230).contains(&c.sum()));
        }
    }

    #[test]
    fn test_full_selection_returned_as_is() {
        // Somme de 1..15 = 120, hors des filtres : la sélection est rendue quand même.
        let config = GenerationConfig { min_sum: 200, max_sum: 250, ..Default::default() };
        let generator = Generator::new(&config, None);
        let mut rng = StdRng::seed_from_u64(8);
        let picks: Vec<u8> = (1..=15).rev().collect();
        let c = generator.seeded(&picks, &mut rng).unwrap();
        assert_eq!(c.numbers().to_vec(), (1..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn test_seeded_fallback_ignores_filters() {
        let config = GenerationConfig { max_even: 1, ..Default::default() };
        let generator = Generator::new(&config, None).with_budget(small_budget());
        let mut rng = StdRng::seed_from_u64(9);
        let c = generator.seeded(&[2, 4, 6], &mut rng).unwrap();
        assert_well_formed(&c);
        assert!(c.contains(2) && c.contains(4) && c.contains(6));
        assert!(c.even_count() >= 3);
    }

    #[test]
    fn test_duplicate_picks_collapsed() {
        assert_eq!(normalize_picks(&[5, 5, 7, 5]).unwrap(), vec![5, 7]);
        let many: Vec<u8> = (1..=15).chain(1..=15).collect();
        assert_eq!(normalize_picks(&many).unwrap().len(), 15);
    }

    #[test]
    fn test_invalid_picks_rejected() {
        assert!(normalize_picks(&[]).is_err());
        assert!(normalize_picks(&[0, 3]).is_err());
        assert!(normalize_picks(&[26]).is_err());
        let sixteen: Vec<u8> = (1..=16).collect();
        assert!(normalize_picks(&sixteen).is_err());
    }

    #[test]
    fn test_generate_one_dispatch() {
        let config = GenerationConfig::default();
        let generator = Generator::new(&config, None);
        let mut rng = StdRng::seed_from_u64(10);

        assert!(generator.generate_one(&[], &mut rng).unwrap().is_some());

        let c = generator.generate_one(&[1, 2], &mut rng).unwrap().unwrap();
        assert!(c.contains(1) && c.contains(2));

        assert!(generator.generate_one(&[30], &mut rng).is_err());
    }

    #[test]
    fn test_seed_determinism() {
        let h = history();
        let config = GenerationConfig { avoid_repeat: true, ..Default::default() };
        let generator = Generator::new(&config, Some(&h));

        let mut rng1 = StdRng::seed_from_u64(123);
        let mut rng2 = StdRng::seed_from_u64(123);
        for _ in 0..10 {
            assert_eq!(generator.generate(&mut rng1), generator.generate(&mut rng2));
        }
    }
}
