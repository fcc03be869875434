use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use lotofacil_db::models::{Combination, DrawRecord, FrequencyTag};
use lotofacil_engine::batch::Batch;
use lotofacil_engine::config::GenerationConfig;
use lotofacil_engine::filters::first_violation;
use lotofacil_engine::history::{HistorySnapshot, LoadSummary};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn display_draws(draws: &[&DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun concours à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Date", "Numéros", "Somme", "Pairs"]);
    for draw in draws {
        table.add_row(vec![
            draw.draw_id.clone(),
            draw.date.clone(),
            draw.numbers.to_string(),
            draw.numbers.sum().to_string(),
            draw.numbers.even_count().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(summary: &LoadSummary) {
    println!("Résultats chargés ({} concours) :", summary.kept);
    println!("  Total lignes lues : {}", summary.total_rows);
    println!("  Concours retenus  : {}", summary.kept);
    if summary.skipped > 0 {
        println!("  Lignes ignorées   : {}", summary.skipped);
    }
}

pub fn display_history_unavailable() {
    println!("Historique indisponible : analyse désactivée, génération uniforme sans filtre de répétition.");
}

pub fn display_stats(history: &HistorySnapshot, top: usize) {
    let last = history.last_record();

    println!("\n📊 Statistiques de l'historique\n");
    println!("  Concours      : {}", history.record_count());
    println!("  Dernier       : {} ({})", last.draw_id, last.date);
    println!("  Somme moyenne : {:.2}", history.mean_sum());
    println!("  Pairs moyens  : {:.2}", history.mean_even_count());
    println!("  Top fréquents : {}", format_numbers(&history.top_frequent(top)));

    println!("\n── Numéros (1-25) ──");
    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard", "Tag"]);

    let mut sorted = history.number_stats();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    for stat in &sorted {
        let color = match stat.tag {
            FrequencyTag::Hot => Color::Green,
            FrequencyTag::Cold => Color::Red,
            FrequencyTag::Normal => Color::White,
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", stat.number)),
            Cell::new(stat.frequency.to_string()),
            Cell::new(stat.gap.to_string()),
            Cell::new(stat.tag.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_config(config: &GenerationConfig) {
    let mut table = new_table(vec!["Filtre", "Valeur"]);
    table.add_row(vec!["Pairs".to_string(), format!("{} - {}", config.min_even, config.max_even)]);
    table.add_row(vec!["Somme".to_string(), format!("{} - {}", config.min_sum, config.max_sum)]);
    table.add_row(vec!["Poids fréquence".to_string(), config.weight_frequency.to_string()]);
    table.add_row(vec!["Poids récence".to_string(), config.weight_recency.to_string()]);
    table.add_row(vec![
        "Éviter la répétition".to_string(),
        if config.avoid_repeat { "oui" } else { "non" }.to_string(),
    ]);
    println!("{table}");
}

/// Grilles numérotées à partir de 1 ; la colonne « Répétés » compte les
/// numéros communs avec le dernier concours quand l'historique est chargé.
pub fn display_combinations(combinations: &[Combination], history: Option<&HistorySnapshot>) {
    if combinations.is_empty() {
        println!("Aucune grille.");
        return;
    }

    let mut header = vec!["#", "Numéros", "Somme", "Pairs"];
    if history.is_some() {
        header.push("Répétés");
    }
    let mut table = new_table(header);

    for (i, combination) in combinations.iter().enumerate() {
        let mut row = vec![
            (i + 1).to_string(),
            combination.to_string(),
            combination.sum().to_string(),
            combination.even_count().to_string(),
        ];
        if let Some(history) = history {
            row.push(combination.overlap(history.last_draw()).to_string());
        }
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_batch_summary(batch: &Batch, target: usize) {
    println!(
        "{} grilles uniques sur {} demandées ({} appels au générateur)",
        batch.len(),
        target,
        batch.attempts
    );
}

pub fn display_ticket_check(
    combinations: &[Combination],
    config: &GenerationConfig,
    history: Option<&HistorySnapshot>,
) {
    if combinations.is_empty() {
        println!("Liste vide.");
        return;
    }

    let last_draw = history.map(HistorySnapshot::last_draw);
    let mut table = new_table(vec!["#", "Numéros", "Somme", "Pairs", "Répétés", "Filtres"]);

    for (i, combination) in combinations.iter().enumerate() {
        let repeated = last_draw
            .map(|last| combination.overlap(last).to_string())
            .unwrap_or_else(|| "—".to_string());
        let verdict = match first_violation(combination, config, last_draw) {
            None => Cell::new("OK").fg(Color::Green),
            Some(violation) => Cell::new(violation.to_string()).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(combination.to_string()),
            Cell::new(combination.sum()),
            Cell::new(combination.even_count()),
            Cell::new(repeated),
            verdict,
        ]);
    }
    println!("{table}");
}
