use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use lotofacil_db::models::PICK_COUNT;

pub const SUM_FLOOR: u16 = 15;
pub const SUM_CEILING: u16 = 325;

// Bornes réellement atteignables par 15 numéros parmi 1-25 :
// 12 pairs et 13 impairs, somme de 1..=15 à 11..=25.
const REACHABLE_EVEN: (usize, usize) = (2, 12);
const REACHABLE_SUM: (u16, u16) = (120, 270);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub min_even: usize,
    pub max_even: usize,
    pub min_sum: u16,
    pub max_sum: u16,
    pub weight_frequency: i32,
    pub weight_recency: i32,
    pub avoid_repeat: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_even: 0,
            max_even: PICK_COUNT,
            min_sum: SUM_FLOOR,
            max_sum: SUM_CEILING,
            weight_frequency: 1,
            weight_recency: 1,
            avoid_repeat: false,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_even > PICK_COUNT {
            bail!("Pairs max {} hors limites (0-{})", self.max_even, PICK_COUNT);
        }
        if self.min_even > self.max_even {
            bail!("Pairs min ({}) supérieur à pairs max ({})", self.min_even, self.max_even);
        }
        for sum in [self.min_sum, self.max_sum] {
            if !(SUM_FLOOR..=SUM_CEILING).contains(&sum) {
                bail!("Somme {} hors limites ({}-{})", sum, SUM_FLOOR, SUM_CEILING);
            }
        }
        if self.min_sum > self.max_sum {
            bail!("Somme min ({}) supérieure à somme max ({})", self.min_sum, self.max_sum);
        }
        Ok(())
    }

    /// Faux quand aucune combinaison ne peut passer les filtres de parité ou de somme.
    /// Vrai ne garantit pas qu'une combinaison existe pour les deux à la fois.
    pub fn is_feasible(&self) -> bool {
        self.max_even >= REACHABLE_EVEN.0
            && self.min_even <= REACHABLE_EVEN.1
            && self.max_sum >= REACHABLE_SUM.0
            && self.min_sum <= REACHABLE_SUM.1
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let config: GenerationConfig = serde_json::from_str(&json)
            .with_context(|| format!("JSON invalide dans {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
        Ok(())
    }
}
