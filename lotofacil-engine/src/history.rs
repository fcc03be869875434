use std::sync::Arc;

use log::{debug, info};

use lotofacil_db::models::{
    Combination, DrawRecord, FrequencyTag, NumberStats, PICK_COUNT, POOL_SIZE,
};

use crate::error::{HistoryError, RowParseError};

// concurso, data, n1..n15
const MIN_FIELDS: usize = 2 + PICK_COUNT;
const TAG_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub total_rows: usize,
    pub kept: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct ParsedHistory {
    pub draws: Vec<DrawRecord>,
    pub summary: LoadSummary,
}

fn parse_row(record: &csv::StringRecord) -> Result<DrawRecord, RowParseError> {
    let line = record.position().map_or(0, |p| p.line());

    if record.len() < MIN_FIELDS {
        return Err(RowParseError::TooFewFields { line, found: record.len() });
    }

    let numbers: Vec<u8> = record
        .iter()
        .skip(2)
        .take(PICK_COUNT)
        .filter_map(|field| field.parse::<u8>().ok())
        .collect();
    if numbers.len() < PICK_COUNT {
        return Err(RowParseError::BadNumbers { line, parsed: numbers.len() });
    }

    let numbers = Combination::new(&numbers)
        .map_err(|e| RowParseError::InvalidNumbers { line, reason: e.to_string() })?;

    Ok(DrawRecord {
        draw_id: record[0].to_string(),
        date: record[1].to_string(),
        numbers,
    })
}

/// Lit le CSV des résultats. La première ligne est un en-tête ; les lignes
/// invalides sont ignorées une par une (pas de guillemets : une ligne reste
/// une ligne), seul un résultat vide est une erreur.
pub fn parse_history(raw: &str) -> Result<ParsedHistory, HistoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut draws = Vec::new();
    let mut summary = LoadSummary::default();

    for (index, record_result) in reader.records().enumerate() {
        summary.total_rows += 1;
        let parsed = record_result
            .map_err(|e| RowParseError::Unreadable { line: index as u64 + 2, reason: e.to_string() })
            .and_then(|record| parse_row(&record));
        match parsed {
            Ok(draw) => draws.push(draw),
            Err(e) => {
                debug!("Ligne ignorée, {e}");
                summary.skipped += 1;
            }
        }
    }

    if draws.is_empty() {
        return Err(HistoryError::EmptyHistory);
    }

    summary.kept = draws.len();
    info!(
        "{} concours chargés ({} lignes lues, {} ignorées)",
        summary.kept, summary.total_rows, summary.skipped
    );
    Ok(ParsedHistory { draws, summary })
}

/// Historique complet et ses statistiques, figés à la construction.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    draws: Vec<DrawRecord>,
    frequency: [u32; POOL_SIZE as usize],
    last_seen: [Option<usize>; POOL_SIZE as usize],
    mean_sum: f64,
    mean_even_count: f64,
}

impl HistorySnapshot {
    pub fn from_draws(draws: Vec<DrawRecord>) -> Result<Self, HistoryError> {
        if draws.is_empty() {
            return Err(HistoryError::EmptyHistory);
        }

        let mut frequency = [0u32; POOL_SIZE as usize];
        let mut last_seen = [None; POOL_SIZE as usize];
        let mut total_sum = 0u64;
        let mut total_even = 0u64;

        for (i, draw) in draws.iter().enumerate() {
            total_sum += draw.numbers.sum() as u64;
            total_even += draw.numbers.even_count() as u64;
            for &n in draw.numbers.numbers() {
                let idx = (n - 1) as usize;
                frequency[idx] += 1;
                last_seen[idx] = Some(i);
            }
        }

        let count = draws.len() as f64;
        Ok(Self {
            mean_sum: total_sum as f64 / count,
            mean_even_count: total_even as f64 / count,
            draws,
            frequency,
            last_seen,
        })
    }

    pub fn load(raw: &str) -> Result<Self, HistoryError> {
        Self::from_draws(parse_history(raw)?.draws)
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn record_count(&self) -> usize {
        self.draws.len()
    }

    /// Dernière ligne du fichier : l'ordre source fait foi, les dates ne sont pas comparées.
    pub fn last_record(&self) -> &DrawRecord {
        &self.draws[self.draws.len() - 1]
    }

    pub fn last_draw(&self) -> &Combination {
        &self.last_record().numbers
    }

    pub fn frequency(&self, number: u8) -> u32 {
        match number {
            1..=POOL_SIZE => self.frequency[(number - 1) as usize],
            _ => 0,
        }
    }

    pub fn mean_sum(&self) -> f64 {
        self.mean_sum
    }

    pub fn mean_even_count(&self) -> f64 {
        self.mean_even_count
    }

    /// Les `k` numéros les plus sortis ; à égalité le plus petit numéro d'abord.
    pub fn top_frequent(&self, k: usize) -> Vec<u8> {
        let mut numbers: Vec<u8> = (1..=POOL_SIZE).collect();
        numbers.sort_by(|&a, &b| self.frequency(b).cmp(&self.frequency(a)));
        numbers.truncate(k);
        numbers
    }

    pub fn number_stats(&self) -> Vec<NumberStats> {
        let count = self.draws.len();
        let expected = count as f64 * PICK_COUNT as f64 / POOL_SIZE as f64;

        (1..=POOL_SIZE)
            .map(|n| {
                let idx = (n - 1) as usize;
                let frequency = self.frequency[idx];
                let gap = match self.last_seen[idx] {
                    Some(i) => (count - 1 - i) as u32,
                    None => count as u32,
                };
                let deviation = (frequency as f64 - expected) / expected;
                let tag = if deviation > TAG_THRESHOLD {
                    FrequencyTag::Hot
                } else if deviation < -TAG_THRESHOLD {
                    FrequencyTag::Cold
                } else {
                    FrequencyTag::Normal
                };
                NumberStats { number: n, frequency, gap, tag }
            })
            .collect()
    }

    /// Les `k` derniers concours, du plus récent au plus ancien.
    pub fn recent(&self, k: usize) -> impl Iterator<Item = &DrawRecord> {
        self.draws.iter().rev().take(k)
    }
}

/// Détient l'historique courant. Un rechargement construit un nouvel
/// instantané complet et ne le publie qu'en cas de succès.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    current: Option<Arc<HistorySnapshot>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: HistorySnapshot) -> Self {
        Self { current: Some(Arc::new(snapshot)) }
    }

    pub fn current(&self) -> Option<Arc<HistorySnapshot>> {
        self.current.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn reload(&mut self, raw: &str) -> Result<LoadSummary, HistoryError> {
        let parsed = parse_history(raw)?;
        let snapshot = HistorySnapshot::from_draws(parsed.draws)?;
        self.current = Some(Arc::new(snapshot));
        Ok(parsed.summary)
    }
}
