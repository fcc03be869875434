mod display;
mod fetch;
mod import;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use lotofacil_db::db::{count_draws, db_path, migrate, open_db};
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::batch::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS};
use lotofacil_engine::config::{GenerationConfig, SUM_CEILING, SUM_FLOOR};
use lotofacil_engine::error::HistoryError;
use lotofacil_engine::history::HistoryStore;
use lotofacil_engine::session::{BatchRequest, GenerateRequest, GenerateResponse, Session};
use lotofacil_engine::tickets::TicketList;

use crate::display::{
    display_batch_summary, display_combinations, display_draws, display_history_unavailable,
    display_import_summary, display_stats, display_ticket_check,
};
use crate::fetch::{DEFAULT_URL, fetch_history};
use crate::import::{load_snapshot, read_history_file, store_history};

#[derive(Parser)]
#[command(name = "lotofacil", about = "Générateur de grilles Lotofácil guidé par l'historique")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Filtres communs à la génération et à la vérification.
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Nombre minimum de numéros pairs
    #[arg(long, default_value = "0")]
    min_even: usize,

    /// Nombre maximum de numéros pairs
    #[arg(long, default_value = "15")]
    max_even: usize,

    /// Somme minimale des 15 numéros
    #[arg(long, default_value_t = SUM_FLOOR)]
    min_sum: u16,

    /// Somme maximale des 15 numéros
    #[arg(long, default_value_t = SUM_CEILING)]
    max_sum: u16,

    /// Poids de la fréquence historique
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    weight_frequency: i32,

    /// Poids de la récence (positif : favorise les numéros absents du dernier concours)
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    weight_recency: i32,

    /// Rejeter les grilles ayant 10 numéros ou plus en commun avec le dernier concours
    #[arg(long)]
    avoid_repeat: bool,

    /// Fichier JSON de filtres (remplace les options ci-dessus)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl FilterArgs {
    fn resolve(&self) -> Result<GenerationConfig> {
        if let Some(path) = &self.config {
            return GenerationConfig::load(path);
        }
        let config = GenerationConfig {
            min_even: self.min_even,
            max_even: self.max_even,
            min_sum: self.min_sum,
            max_sum: self.max_sum,
            weight_frequency: self.weight_frequency,
            weight_recency: self.weight_recency,
            avoid_repeat: self.avoid_repeat,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Télécharger les résultats officiels et les enregistrer en base
    Fetch {
        /// URL du CSV des résultats
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },

    /// Importer les résultats depuis un fichier CSV local
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "resultados.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers concours
    List {
        /// Nombre de concours à afficher
        #[arg(short, long, default_value = "30")]
        last: usize,
    },

    /// Afficher les statistiques (fréquences, retards, moyennes)
    Stats {
        /// Nombre de numéros les plus fréquents à afficher
        #[arg(short, long, default_value = "5")]
        top: usize,
    },

    /// Générer une grille
    Generate {
        #[command(flatten)]
        filters: FilterArgs,

        /// Numéros fixés (1 à 15 numéros entre 1 et 25)
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        pick: Vec<u8>,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Exporter la grille dans un fichier JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Générer un lot de grilles uniques
    Batch {
        #[command(flatten)]
        filters: FilterArgs,

        /// Nombre de grilles demandées
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        count: usize,

        /// Nombre maximum d'appels au générateur
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Exporter le lot dans un fichier JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Vérifier une liste de grilles (JSON) contre les filtres
    Check {
        /// Fichier JSON : liste de listes de 15 numéros
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Afficher ou enregistrer un fichier de filtres
    Config {
        #[command(flatten)]
        filters: FilterArgs,

        /// Fichier de sortie (sinon affichage)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mode interactif
    Interactive {
        /// URL utilisée par la commande « recharger »
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Fetch { url } => cmd_fetch(&conn, &url),
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { top } => cmd_stats(&conn, top),
        Command::Generate {
            filters,
            pick,
            seed,
            output,
        } => cmd_generate(&conn, &filters, &pick, seed, output.as_deref()),
        Command::Batch {
            filters,
            count,
            max_attempts,
            seed,
            output,
        } => cmd_batch(&conn, &filters, count, max_attempts, seed, output.as_deref()),
        Command::Check { file, filters } => cmd_check(&conn, &file, &filters),
        Command::Config { filters, output } => cmd_config(&filters, output.as_deref()),
        Command::Interactive { url, seed } => {
            let session = open_session(&conn, seed)?;
            interactive::run_interactive(&conn, &url, session)
        }
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn open_session(conn: &Connection, seed: Option<u64>) -> Result<Session<StdRng>> {
    let store = match load_snapshot(conn)? {
        Some(snapshot) => HistoryStore::with_snapshot(snapshot),
        None => {
            display_history_unavailable();
            println!("Lancez d'abord : lotofacil fetch");
            HistoryStore::new()
        }
    };
    Ok(Session::new(store, make_rng(seed)))
}

fn store_fetched(conn: &Connection, fetched: Result<String, HistoryError>) -> Result<()> {
    let outcome = fetched
        .map_err(anyhow::Error::from)
        .and_then(|raw| store_history(conn, &raw));

    match outcome {
        Ok(summary) => display_import_summary(&summary),
        Err(e) => {
            println!("Échec du chargement des résultats. Analyse désactivée : {e:#}");
            let kept = count_draws(conn)?;
            if kept > 0 {
                println!("L'historique précédent ({kept} concours) est conservé.");
            }
        }
    }
    Ok(())
}

fn cmd_fetch(conn: &Connection, url: &str) -> Result<()> {
    println!("Téléchargement de {url}...");
    store_fetched(conn, fetch_history(url))
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    store_fetched(conn, read_history_file(file))
}

fn cmd_list(conn: &Connection, last: usize) -> Result<()> {
    match load_snapshot(conn)? {
        Some(snapshot) => display_draws(&snapshot.recent(last).collect::<Vec<_>>()),
        None => println!("Base vide. Lancez d'abord : lotofacil fetch"),
    }
    Ok(())
}

fn cmd_stats(conn: &Connection, top: usize) -> Result<()> {
    match load_snapshot(conn)? {
        Some(snapshot) => display_stats(&snapshot, top),
        None => println!("Base vide. Lancez d'abord : lotofacil fetch"),
    }
    Ok(())
}

fn export_generated(session: &Session<StdRng>, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        TicketList::from(session.generated().to_vec()).export(path)?;
        println!("{} grilles exportées dans {}", session.generated().len(), path.display());
    }
    Ok(())
}

fn cmd_generate(
    conn: &Connection,
    filters: &FilterArgs,
    picks: &[u8],
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let config = filters.resolve()?;
    let mut session = open_session(conn, seed)?;

    let request = GenerateRequest {
        config,
        picks: picks.to_vec(),
    };
    match session.generate(&request)? {
        GenerateResponse::Generated(_) => {
            let history = session.history();
            display_combinations(session.generated(), history.as_deref());
            export_generated(&session, output)?;
        }
        GenerateResponse::Exhausted => {
            println!("Impossible de générer avec ces filtres. Ajustez les limites.")
        }
    }
    Ok(())
}

fn cmd_batch(
    conn: &Connection,
    filters: &FilterArgs,
    count: usize,
    max_attempts: usize,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let config = filters.resolve()?;
    let mut session = open_session(conn, seed)?;

    let batch = session.generate_batch(&BatchRequest {
        config,
        count,
        max_attempts,
    })?;
    if batch.is_empty() {
        println!("Impossible de générer des grilles avec ces filtres. Ajustez les limites.");
        return Ok(());
    }

    let history = session.history();
    display_combinations(session.generated(), history.as_deref());
    display_batch_summary(&batch, count);
    export_generated(&session, output)
}

fn cmd_check(conn: &Connection, file: &Path, filters: &FilterArgs) -> Result<()> {
    let config = filters.resolve()?;
    let tickets = TicketList::import(file)?;
    let snapshot = load_snapshot(conn)?;
    if snapshot.is_none() {
        display_history_unavailable();
    }
    display_ticket_check(tickets.as_slice(), &config, snapshot.as_ref());
    Ok(())
}

fn cmd_config(filters: &FilterArgs, output: Option<&Path>) -> Result<()> {
    let config = filters.resolve()?;
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Filtres enregistrés dans {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
