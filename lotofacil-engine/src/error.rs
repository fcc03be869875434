use thiserror::Error;

/// Échecs du chargement de l'historique. Dans les deux cas l'historique
/// précédent reste en place et la génération passe en mode uniforme.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("impossible de charger {source_name} : {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("historique vide ou format invalide")]
    EmptyHistory,
}

/// Ligne ignorée pendant l'import. Jamais remontée à l'appelant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowParseError {
    #[error("ligne {line} illisible : {reason}")]
    Unreadable { line: u64, reason: String },

    #[error("ligne {line} : {found} champs (17 attendus au minimum)")]
    TooFewFields { line: u64, found: usize },

    #[error("ligne {line} : {parsed} numéros lisibles sur 15")]
    BadNumbers { line: u64, parsed: usize },

    #[error("ligne {line} : {reason}")]
    InvalidNumbers { line: u64, reason: String },
}
