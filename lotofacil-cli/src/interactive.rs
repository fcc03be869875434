use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;

use lotofacil_db::db::replace_draws;
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::batch::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS};
use lotofacil_engine::config::GenerationConfig;
use lotofacil_engine::session::{BatchRequest, GenerateRequest, GenerateResponse, Session};
use lotofacil_engine::tickets::TicketList;

use crate::display::{
    display_batch_summary, display_combinations, display_config, display_draws,
    display_history_unavailable, display_import_summary, display_stats,
};
use crate::fetch::fetch_history;

const DEFAULT_TICKETS_FILE: &str = "meus_jogos.json";

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Generate,
    Batch,
    Keep,
    Remove,
    Tickets,
    Export,
    Import,
    Clear,
    Stats,
    History,
    Filters,
    Reload,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "generer" | "générer" | "generate" | "gen" => Some(InteractiveCommand::Generate),
        "2" | "lot" | "batch" => Some(InteractiveCommand::Batch),
        "3" | "garder" | "keep" => Some(InteractiveCommand::Keep),
        "4" | "retirer" | "remove" | "rm" => Some(InteractiveCommand::Remove),
        "5" | "liste" | "list" | "ls" => Some(InteractiveCommand::Tickets),
        "6" | "exporter" | "export" => Some(InteractiveCommand::Export),
        "7" | "importer" | "import" => Some(InteractiveCommand::Import),
        "8" | "vider" | "clear" => Some(InteractiveCommand::Clear),
        "9" | "stats" | "statistiques" => Some(InteractiveCommand::Stats),
        "10" | "historique" | "history" | "hist" => Some(InteractiveCommand::History),
        "11" | "filtres" | "filters" => Some(InteractiveCommand::Filters),
        "12" | "recharger" | "reload" => Some(InteractiveCommand::Reload),
        "13" | "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu() {
    println!();
    println!("── Mode interactif ──");
    println!("  1. generer     Générer une grille");
    println!("  2. lot         Générer un lot de grilles uniques");
    println!("  3. garder      Garder une grille générée");
    println!("  4. retirer     Retirer une grille de la liste");
    println!("  5. liste       Afficher ma liste");
    println!("  6. exporter    Exporter ma liste (JSON)");
    println!("  7. importer    Importer une liste (JSON)");
    println!("  8. vider       Vider ma liste");
    println!("  9. stats       Statistiques de l'historique");
    println!("  10. historique Derniers concours");
    println!("  11. filtres    Modifier les filtres");
    println!("  12. recharger  Retélécharger les résultats");
    println!("  13. quitter    Quitter");
    println!();
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        bail!("Fin de l'entrée");
    }
    Ok(input.trim().to_string())
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}] : ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_parsed<T: std::str::FromStr>(msg: &str, default: T) -> Result<T>
where
    T: std::fmt::Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let input = prompt_with_default(msg, &default.to_string())?;
    input
        .parse::<T>()
        .with_context(|| format!("Valeur invalide : '{}'", input))
}

fn parse_yes_no(input: &str) -> Result<bool> {
    match input.trim().to_lowercase().as_str() {
        "o" | "oui" | "y" | "yes" | "true" => Ok(true),
        "n" | "non" | "no" | "false" => Ok(false),
        other => bail!("Réponse attendue : o/n (reçu '{}')", other),
    }
}

fn prompt_yes_no(msg: &str, default: bool) -> Result<bool> {
    let input = prompt_with_default(&format!("{} (o/n)", msg), if default { "o" } else { "n" })?;
    parse_yes_no(&input)
}

/// Numéros séparés par des espaces ou des virgules.
fn parse_numbers(input: &str) -> Result<Vec<u8>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Numéro invalide : '{}'", s))
        })
        .collect()
}

/// Numéro de grille saisi à partir de 1, rendu en index base 0.
fn parse_index(input: &str) -> Result<usize> {
    let n = input
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Numéro de grille invalide : '{}'", input.trim()))?;
    if n == 0 {
        bail!("Les grilles sont numérotées à partir de 1");
    }
    Ok(n - 1)
}

fn show_generated(session: &Session<StdRng>) {
    let history = session.history();
    display_combinations(session.generated(), history.as_deref());
}

fn cmd_generate_interactive(session: &mut Session<StdRng>, config: &GenerationConfig) -> Result<()> {
    let input = prompt("Numéros fixés (vide = aucun) : ")?;
    let picks = parse_numbers(&input)?;

    match session.generate(&GenerateRequest { config: *config, picks })? {
        GenerateResponse::Generated(_) => show_generated(session),
        GenerateResponse::Exhausted => {
            println!("Impossible de générer avec ces filtres. Ajustez les limites.")
        }
    }
    Ok(())
}

fn cmd_batch_interactive(session: &mut Session<StdRng>, config: &GenerationConfig) -> Result<()> {
    let count = prompt_parsed("Nombre de grilles", DEFAULT_BATCH_SIZE)?;
    let request = BatchRequest {
        config: *config,
        count,
        max_attempts: DEFAULT_MAX_ATTEMPTS,
    };

    let batch = session.generate_batch(&request)?;
    if batch.is_empty() {
        println!("Impossible de générer des grilles avec ces filtres. Ajustez les limites.");
        return Ok(());
    }
    show_generated(session);
    display_batch_summary(&batch, count);
    Ok(())
}

fn cmd_keep_interactive(session: &mut Session<StdRng>) -> Result<()> {
    if session.generated().is_empty() {
        println!("Aucune grille générée pour l'instant.");
        return Ok(());
    }
    let index = parse_index(&prompt_with_default("Grille à garder", "1")?)?;
    let kept = session.keep(index)?;
    println!("Ajoutée : {} ({} dans la liste)", kept, session.tickets().len());
    Ok(())
}

fn cmd_remove_interactive(session: &mut Session<StdRng>) -> Result<()> {
    if session.tickets().is_empty() {
        println!("Liste vide.");
        return Ok(());
    }
    let index = parse_index(&prompt("Grille à retirer : ")?)?;
    let removed = session.tickets_mut().remove(index)?;
    println!("Retirée : {}", removed);
    Ok(())
}

fn cmd_tickets_interactive(session: &Session<StdRng>) {
    if session.tickets().is_empty() {
        println!("Liste vide.");
        return;
    }
    let history = session.history();
    display_combinations(session.tickets().as_slice(), history.as_deref());
}

fn cmd_export_interactive(session: &Session<StdRng>) -> Result<()> {
    if session.tickets().is_empty() {
        println!("Liste vide, rien à exporter.");
        return Ok(());
    }
    let path = prompt_with_default("Fichier", DEFAULT_TICKETS_FILE)?;
    session.tickets().export(Path::new(&path))?;
    println!("{} grilles exportées dans {}", session.tickets().len(), path);
    Ok(())
}

fn cmd_import_interactive(session: &mut Session<StdRng>) -> Result<()> {
    let path = prompt_with_default("Fichier", DEFAULT_TICKETS_FILE)?;
    let list = TicketList::import(Path::new(&path))?;
    println!("{} grilles importées (la liste précédente est remplacée)", list.len());
    *session.tickets_mut() = list;
    Ok(())
}

fn cmd_clear_interactive(session: &mut Session<StdRng>) -> Result<()> {
    if prompt_yes_no("Vider la liste ?", false)? {
        session.tickets_mut().clear();
        println!("Liste vidée.");
    } else {
        println!("Annulé.");
    }
    Ok(())
}

fn cmd_filters_interactive(config: &mut GenerationConfig) -> Result<()> {
    display_config(config);
    let updated = GenerationConfig {
        min_even: prompt_parsed("Pairs minimum", config.min_even)?,
        max_even: prompt_parsed("Pairs maximum", config.max_even)?,
        min_sum: prompt_parsed("Somme minimale", config.min_sum)?,
        max_sum: prompt_parsed("Somme maximale", config.max_sum)?,
        weight_frequency: prompt_parsed("Poids fréquence", config.weight_frequency)?,
        weight_recency: prompt_parsed("Poids récence", config.weight_recency)?,
        avoid_repeat: prompt_yes_no("Éviter la répétition", config.avoid_repeat)?,
    };
    updated.validate()?;
    if !updated.is_feasible() {
        println!("Attention : aucune grille ne peut satisfaire ces limites.");
    }
    *config = updated;
    println!("Filtres mis à jour.");
    Ok(())
}

fn cmd_reload_interactive(conn: &Connection, url: &str, session: &mut Session<StdRng>) -> Result<()> {
    println!("Téléchargement de {url}...");
    match session.reload_history(fetch_history(url)) {
        Ok(summary) => {
            display_import_summary(&summary);
            if let Some(history) = session.history() {
                replace_draws(conn, history.draws())?;
            }
        }
        Err(e) => {
            println!("Échec du chargement des résultats. Analyse désactivée : {e}");
            if let Some(history) = session.history() {
                println!("L'historique précédent ({} concours) est conservé.", history.record_count());
            }
        }
    }
    Ok(())
}

pub fn run_interactive(conn: &Connection, url: &str, mut session: Session<StdRng>) -> Result<()> {
    println!("Bienvenue dans le mode interactif de lotofacil !");
    match session.history() {
        Some(history) => println!(
            "Historique : {} concours, dernier n°{}",
            history.record_count(),
            history.last_record().draw_id
        ),
        None => display_history_unavailable(),
    }

    let mut config = GenerationConfig::default();

    loop {
        display_menu();
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        let result = match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Generate) => cmd_generate_interactive(&mut session, &config),
            Some(InteractiveCommand::Batch) => cmd_batch_interactive(&mut session, &config),
            Some(InteractiveCommand::Keep) => cmd_keep_interactive(&mut session),
            Some(InteractiveCommand::Remove) => cmd_remove_interactive(&mut session),
            Some(InteractiveCommand::Tickets) => {
                cmd_tickets_interactive(&session);
                Ok(())
            }
            Some(InteractiveCommand::Export) => cmd_export_interactive(&session),
            Some(InteractiveCommand::Import) => cmd_import_interactive(&mut session),
            Some(InteractiveCommand::Clear) => cmd_clear_interactive(&mut session),
            Some(InteractiveCommand::Stats) => {
                match session.history() {
                    Some(history) => display_stats(&history, 5),
                    None => display_history_unavailable(),
                }
                Ok(())
            }
            Some(InteractiveCommand::History) => {
                match session.history() {
                    Some(history) => display_draws(&history.recent(30).collect::<Vec<_>>()),
                    None => display_history_unavailable(),
                }
                Ok(())
            }
            Some(InteractiveCommand::Filters) => cmd_filters_interactive(&mut config),
            Some(InteractiveCommand::Reload) => cmd_reload_interactive(conn, url, &mut session),
            None => {
                println!("Commande inconnue : '{}'. Tapez un numéro ou un nom.", input);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Erreur: {e:#}");
        }
    }

    Ok(())
}
