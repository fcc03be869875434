use std::fmt;

use lotofacil_db::models::Combination;

use crate::config::GenerationConfig;

/// Au plus 9 numéros en commun avec le dernier concours.
pub const MAX_REPEATED_FROM_LAST: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Parity { found: usize, min: usize, max: usize },
    Sum { found: u16, min: u16, max: u16 },
    Repetition { found: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Parity { found, min, max } => {
                write!(f, "{found} pairs (attendu {min}-{max})")
            }
            Violation::Sum { found, min, max } => {
                write!(f, "somme {found} (attendu {min}-{max})")
            }
            Violation::Repetition { found } => {
                write!(f, "{found} numéros répétés du dernier concours (max {MAX_REPEATED_FROM_LAST})")
            }
        }
    }
}

/// Premier filtre non respecté, dans l'ordre parité, somme, répétition.
/// `last_draw` vaut `None` sans historique : la répétition n'est alors pas contrôlée.
pub fn first_violation(
    combination: &Combination,
    config: &GenerationConfig,
    last_draw: Option<&Combination>,
) -> Option<Violation> {
    let evens = combination.even_count();
    if evens < config.min_even || evens > config.max_even {
        return Some(Violation::Parity { found: evens, min: config.min_even, max: config.max_even });
    }

    let sum = combination.sum();
    if sum < config.min_sum || sum > config.max_sum {
        return Some(Violation::Sum { found: sum, min: config.min_sum, max: config.max_sum });
    }

    if config.avoid_repeat {
        if let Some(last) = last_draw {
            let repeated = combination.overlap(last);
            if repeated > MAX_REPEATED_FROM_LAST {
                return Some(Violation::Repetition { found: repeated });
            }
        }
    }

    None
}

pub fn is_valid(
    combination: &Combination,
    config: &GenerationConfig,
    last_draw: Option<&Combination>,
) -> bool {
    first_violation(combination, config, last_draw).is_none()
}
