use std::sync::Arc;

use anyhow::{Context, Result};
use log::warn;
use rand::Rng;

use lotofacil_db::models::Combination;

use crate::batch::{Batch, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, generate_batch};
use crate::config::GenerationConfig;
use crate::error::HistoryError;
use crate::generator::Generator;
use crate::history::{HistorySnapshot, HistoryStore, LoadSummary};
use crate::tickets::TicketList;

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub config: GenerationConfig,
    /// Numéros fixés ; vide pour laisser faire le générateur.
    pub picks: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateResponse {
    Generated(Combination),
    /// Aucun candidat valide dans le budget : assouplir les filtres.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub config: GenerationConfig,
    pub count: usize,
    pub max_attempts: usize,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            config: GenerationConfig::default(),
            count: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// État d'une session : historique courant, dernières grilles générées et
/// liste de l'utilisateur.
pub struct Session<R: Rng> {
    store: HistoryStore,
    tickets: TicketList,
    generated: Vec<Combination>,
    rng: R,
}

impl<R: Rng> Session<R> {
    pub fn new(store: HistoryStore, rng: R) -> Self {
        Self {
            store,
            tickets: TicketList::new(),
            generated: Vec::new(),
            rng,
        }
    }

    pub fn history(&self) -> Option<Arc<HistorySnapshot>> {
        self.store.current()
    }

    /// Un échec (téléchargement ou contenu) est rendu une seule fois et
    /// laisse l'historique précédent en place.
    pub fn reload_history(
        &mut self,
        fetched: Result<String, HistoryError>,
    ) -> Result<LoadSummary, HistoryError> {
        let outcome = fetched.and_then(|raw| self.store.reload(&raw));
        if let Err(e) = &outcome {
            warn!("Historique non rechargé : {e}");
        }
        outcome
    }

    pub fn generate(&mut self, request: &GenerateRequest) -> Result<GenerateResponse> {
        request.config.validate()?;
        let snapshot = self.store.current();
        let generator = Generator::new(&request.config, snapshot.as_deref());

        match generator.generate_one(&request.picks, &mut self.rng)? {
            Some(combination) => {
                self.generated = vec![combination];
                Ok(GenerateResponse::Generated(combination))
            }
            None => Ok(GenerateResponse::Exhausted),
        }
    }

    pub fn generate_batch(&mut self, request: &BatchRequest) -> Result<Batch> {
        request.config.validate()?;
        let snapshot = self.store.current();
        let generator = Generator::new(&request.config, snapshot.as_deref());

        let batch = generate_batch(&generator, request.count, request.max_attempts, &mut self.rng);
        if !batch.is_empty() {
            self.generated = batch.combinations.clone();
        }
        Ok(batch)
    }

    pub fn generated(&self) -> &[Combination] {
        &self.generated
    }

    /// Copie la grille générée n°`index` (base 0) dans la liste.
    pub fn keep(&mut self, index: usize) -> Result<Combination> {
        let combination = *self
            .generated
            .get(index)
            .with_context(|| format!("Aucune grille générée n°{}", index + 1))?;
        self.tickets.add(combination);
        Ok(combination)
    }

    pub fn tickets(&self) -> &TicketList {
        &self.tickets
    }

    pub fn tickets_mut(&mut self) -> &mut TicketList {
        &mut self.tickets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const CSV: &str = "Concurso,Data,B1,B2,B3,B4,B5,B6,B7,B8,B9,B10,B11,B12,B13,B14,B15
1,01/01/2024,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15
2,02/01/2024,11,12,13,14,15,16,17,18,19,20,21,22,23,24,25";

    fn session() -> Session<StdRng> {
        Session::new(HistoryStore::new(), StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_generate_without_history() {
        let mut s = session();
        assert!(s.history().is_none());

        let response = s.generate(&GenerateRequest::default()).unwrap();
        assert!(matches!(response, GenerateResponse::Generated(_)));
        assert_eq!(s.generated().len(), 1);
    }

    #[test]
    fn test_failed_fetch_keeps_session_usable() {
        let mut s = session();
        let err = s
            .reload_history(Err(HistoryError::Fetch {
                source_name: "http://exemple".to_string(),
                reason: "HTTP 404".to_string(),
            }))
            .unwrap_err();
        assert!(matches!(err, HistoryError::Fetch { .. }));
        assert!(s.history().is_none());

        let err = s.reload_history(Ok("pas,un,csv\n1,2".to_string())).unwrap_err();
        assert!(matches!(err, HistoryError::EmptyHistory));

        assert!(matches!(
            s.generate(&GenerateRequest::default()).unwrap(),
            GenerateResponse::Generated(_)
        ));
    }

    #[test]
    fn test_reload_then_failure_keeps_previous_history() {
        let mut s = session();
        let summary = s.reload_history(Ok(CSV.to_string())).unwrap();
        assert_eq!(summary.kept, 2);

        assert!(s.reload_history(Ok(String::new())).is_err());
        let history = s.history().unwrap();
        assert_eq!(history.record_count(), 2);
        assert_eq!(history.last_record().draw_id, "2");
    }

    #[test]
    fn test_generate_with_history_avoids_repetition() {
        let mut s = session();
        s.reload_history(Ok(CSV.to_string())).unwrap();
        let config = GenerationConfig { avoid_repeat: true, ..Default::default() };
        let last = *s.history().unwrap().last_draw();

        for _ in 0..20 {
            match s.generate(&GenerateRequest { config, picks: vec![] }).unwrap() {
                GenerateResponse::Generated(c) => assert!(c.overlap(&last) <= 9),
                GenerateResponse::Exhausted => panic!("filtres satisfaisables"),
            }
        }
    }

    #[test]
    fn test_generate_full_selection() {
        let mut s = session();
        let picks: Vec<u8> = (11..=25).collect();
        let config = GenerationConfig { max_sum: 200, ..Default::default() };
        let response = s.generate(&GenerateRequest { config, picks: picks.clone() }).unwrap();
        match response {
            GenerateResponse::Generated(c) => assert_eq!(c.numbers().to_vec(), picks),
            GenerateResponse::Exhausted => panic!("la sélection manuelle ne peut pas échouer"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut s = session();
        let config = GenerationConfig { min_even: 10, max_even: 2, ..Default::default() };
        assert!(s.generate(&GenerateRequest { config, picks: vec![] }).is_err());
        assert!(s.generate_batch(&BatchRequest { config, ..Default::default() }).is_err());
    }

    #[test]
    fn test_exhausted_response() {
        let mut s = session();
        // 12 pairs imposent une somme d'au moins 165.
        let config = GenerationConfig { min_even: 12, max_sum: 150, ..Default::default() };
        let response = s.generate(&GenerateRequest { config, picks: vec![] }).unwrap();
        assert_eq!(response, GenerateResponse::Exhausted);
        assert!(s.generated().is_empty());
    }

    #[test]
    fn test_batch_then_keep() {
        let mut s = session();
        s.reload_history(Ok(CSV.to_string())).unwrap();

        let batch = s.generate_batch(&BatchRequest { count: 4, ..Default::default() }).unwrap();
        assert_eq!(batch.len(), 4);
        assert_eq!(s.generated(), batch.combinations.as_slice());

        let kept = s.keep(2).unwrap();
        assert_eq!(kept, batch.combinations[2]);
        assert_eq!(s.tickets().as_slice(), &[kept]);

        assert!(s.keep(10).is_err());

        s.tickets_mut().clear();
        assert!(s.tickets().is_empty());
    }
}
