use std::path::Path;

use anyhow::{Context, Result, bail};

use lotofacil_db::models::Combination;

/// Les grilles retenues par l'utilisateur pendant la session.
/// Format d'échange : tableau JSON de tableaux de 15 entiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketList {
    combinations: Vec<Combination>,
}

impl TicketList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, combination: Combination) {
        self.combinations.push(combination);
    }

    pub fn remove(&mut self, index: usize) -> Result<Combination> {
        if index >= self.combinations.len() {
            bail!(
                "Grille n°{} inexistante ({} grilles dans la liste)",
                index + 1,
                self.combinations.len()
            );
        }
        Ok(self.combinations.remove(index))
    }

    pub fn clear(&mut self) {
        self.combinations.clear();
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn as_slice(&self) -> &[Combination] {
        &self.combinations
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.combinations)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<Vec<u8>> = serde_json::from_str(json)
            .context("Format attendu : liste de listes de 15 numéros")?;
        let combinations = raw
            .iter()
            .enumerate()
            .map(|(i, numbers)| {
                Combination::new(numbers).with_context(|| format!("Grille n°{} invalide", i + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { combinations })
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))
    }

    pub fn import(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Liste invalide dans {}", path.display()))
    }
}

impl From<Vec<Combination>> for TicketList {
    fn from(combinations: Vec<Combination>) -> Self {
        Self { combinations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combination(first: u8) -> Combination {
        Combination::new(&(first..first + 15).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_add_remove_clear() {
        let mut list = TicketList::new();
        list.add(combination(1));
        list.add(combination(2));
        list.add(combination(3));
        assert_eq!(list.len(), 3);

        let removed = list.remove(1).unwrap();
        assert_eq!(removed, combination(2));
        assert_eq!(list.as_slice(), &[combination(1), combination(3)]);

        assert!(list.remove(5).is_err());

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_json_shape_is_list_of_lists() {
        let list = TicketList::from(vec![combination(1)]);
        let value: serde_json::Value = serde_json::from_str(&list.to_json().unwrap()).unwrap();
        let outer = value.as_array().unwrap();
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].as_array().unwrap().len(), 15);
        assert_eq!(outer[0][0], 1);
    }

    #[test]
    fn test_from_json_sorts_each_combination() {
        let list = TicketList::from_json("[[15,14,13,12,11,10,9,8,7,6,5,4,3,2,1]]").unwrap();
        assert_eq!(list.as_slice(), &[combination(1)]);
    }

    #[test]
    fn test_from_json_rejects_invalid_entry() {
        let json = "[[1,2,3,4,5,6,7,8,9,10,11,12,13,14,15],[1,2,3]]";
        let err = TicketList::from_json(json).unwrap_err();
        assert!(format!("{err:#}").contains("n°2"), "{err:#}");

        assert!(TicketList::from_json("{\"a\": 1}").is_err());
        assert!(TicketList::from_json("[[1,2,3,4,5,6,7,8,9,10,11,12,13,14,26]]").is_err());
    }

    #[test]
    fn test_export_then_import_file() {
        let path = std::env::temp_dir().join(format!("lotofacil_tickets_{}.json", std::process::id()));
        let list = TicketList::from(vec![combination(1), combination(11)]);
        list.export(&path).unwrap();
        let loaded = TicketList::import(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, list);
    }

    #[test]
    fn test_empty_list_json() {
        let list = TicketList::from_json("[]").unwrap();
        assert!(list.is_empty());
        assert_eq!(TicketList::new().to_json().unwrap(), "[]");
    }
}
