use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Plus grand numéro de la grille (1-25).
pub const POOL_SIZE: u8 = 25;

/// Nombre de numéros par combinaison.
pub const PICK_COUNT: usize = 15;

/// 15 numéros distincts de 1 à 25, toujours triés par ordre croissant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Combination([u8; PICK_COUNT]);

impl Combination {
    pub fn new(numbers: &[u8]) -> Result<Self> {
        validate_numbers(numbers)?;
        let mut sorted = [0u8; PICK_COUNT];
        sorted.copy_from_slice(numbers);
        sorted.sort_unstable();
        Ok(Self(sorted))
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    pub fn contains(&self, number: u8) -> bool {
        self.0.binary_search(&number).is_ok()
    }

    pub fn sum(&self) -> u16 {
        self.0.iter().map(|&n| n as u16).sum()
    }

    pub fn even_count(&self) -> usize {
        self.0.iter().filter(|&&n| n % 2 == 0).count()
    }

    /// Nombre de numéros communs avec `other`.
    pub fn overlap(&self, other: &Combination) -> usize {
        self.0.iter().filter(|&&n| other.contains(n)).count()
    }
}

impl TryFrom<Vec<u8>> for Combination {
    type Error = anyhow::Error;

    fn try_from(numbers: Vec<u8>) -> Result<Self> {
        Self::new(&numbers)
    }
}

impl From<Combination> for Vec<u8> {
    fn from(combination: Combination) -> Self {
        combination.0.to_vec()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .iter()
            .map(|n| format!("{:02}", n))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{formatted}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub draw_id: String,
    pub date: String,
    pub numbers: Combination,
}

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: u32,
    pub tag: FrequencyTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyTag {
    Hot,
    Cold,
    Normal,
}

impl fmt::Display for FrequencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyTag::Hot => write!(f, "HOT"),
            FrequencyTag::Cold => write!(f, "COLD"),
            FrequencyTag::Normal => write!(f, "-"),
        }
    }
}

pub fn validate_number(number: u8) -> Result<()> {
    if number < 1 || number > POOL_SIZE {
        bail!("Numéro {} hors limites (1-{})", number, POOL_SIZE);
    }
    Ok(())
}

pub fn validate_numbers(numbers: &[u8]) -> Result<()> {
    if numbers.len() != PICK_COUNT {
        bail!(
            "Une combinaison contient exactement {} numéros (reçu {})",
            PICK_COUNT,
            numbers.len()
        );
    }
    let mut seen = [false; POOL_SIZE as usize + 1];
    for &n in numbers {
        validate_number(n)?;
        if seen[n as usize] {
            bail!("Numéro en double : {}", n);
        }
        seen[n as usize] = true;
    }
    Ok(())
}
