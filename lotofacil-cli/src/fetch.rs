use std::time::Duration;

use log::{debug, info};

use lotofacil_engine::error::HistoryError;

pub const DEFAULT_URL: &str =
    "https://raw.githubusercontent.com/Tchocco/perseveran-a/main/resultados.csv";

const TIMEOUT: Duration = Duration::from_secs(30);

fn fetch_error(url: &str, reason: impl ToString) -> HistoryError {
    HistoryError::Fetch {
        source_name: url.to_string(),
        reason: reason.to_string(),
    }
}

async fn fetch_text(url: &str) -> Result<String, HistoryError> {
    let client = reqwest::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(|e| fetch_error(url, e))?;

    debug!("GET {url}");
    let response = client.get(url).send().await.map_err(|e| fetch_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(url, format!("HTTP {}", status.as_u16())));
    }

    let body = response.text().await.map_err(|e| fetch_error(url, e))?;
    info!("{} octets reçus de {url}", body.len());
    Ok(body)
}

/// Télécharge le CSV des résultats. Un seul essai, sans relance : l'appelant
/// décide de conserver l'historique courant en cas d'échec.
pub fn fetch_history(url: &str) -> Result<String, HistoryError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| fetch_error(url, e))?;
    runtime.block_on(fetch_text(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_fetch_error() {
        let err = fetch_history("pas une url").unwrap_err();
        match err {
            HistoryError::Fetch { source_name, .. } => assert_eq!(source_name, "pas une url"),
            other => panic!("erreur inattendue : {other}"),
        }
    }

    #[test]
    fn test_default_url_points_to_raw_csv() {
        assert!(DEFAULT_URL.starts_with("https://raw.githubusercontent.com/"));
        assert!(DEFAULT_URL.ends_with(".csv"));
    }
}
