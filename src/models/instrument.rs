use crate::error::Error;
use crate::models::Domain;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A tracked instrument (ticker or macro variable) with its display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker symbol or variable id, as the remote API expects it
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Sector, bond type or macro group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Unit of the observed values ("ARS", "% TNA", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Chart color (CSS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// File stem in the local store; defaults to `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Instrument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category: None,
            unit: None,
            color: None,
            file: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn file_stem(&self) -> &str {
        self.file.as_deref().unwrap_or(&self.id)
    }

    /// Category with the catch-all used by the dashboards
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("Otros")
    }
}

/// Instrument table for one domain, loaded from `config/<domain>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    /// Dashboard title
    pub title: String,

    /// Ids highlighted as KPI cards (macro dashboard)
    #[serde(default)]
    pub kpi_ids: Vec<String>,

    /// Volume baseline window override for this domain
    #[serde(default)]
    pub volume_window: Option<usize>,

    pub instruments: Vec<Instrument>,
}

impl InstrumentCatalog {
    /// Load a catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let catalog: InstrumentCatalog = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the catalog of a domain from a config directory
    pub fn load(config_dir: &Path, domain: Domain) -> Result<Self, Error> {
        Self::from_file(config_dir.join(domain.catalog_file()))
    }

    /// Reject empty ids, ids (or file stems) that appear twice and KPI ids
    /// that name no instrument
    pub fn validate(&self) -> Result<(), Error> {
        let mut ids = std::collections::HashSet::new();
        let mut stems = std::collections::HashSet::new();
        for instrument in &self.instruments {
            if instrument.id.trim().is_empty() {
                return Err(Error::Config(format!("Empty instrument id in '{}'", self.title)));
            }
            if !ids.insert(instrument.id.as_str()) {
                return Err(Error::Config(format!("Duplicate instrument id: {}", instrument.id)));
            }
            if !stems.insert(instrument.file_stem()) {
                return Err(Error::Config(format!("Duplicate storage file: {}", instrument.file_stem())));
            }
        }
        if let Some(unknown) = self.kpi_ids.iter().find(|id| self.find(id).is_none()) {
            return Err(Error::Config(format!("KPI id '{}' is not in '{}'", unknown, self.title)));
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id == id)
    }

    /// Map id -> category, for instruments that have one
    pub fn categories(&self) -> HashMap<String, String> {
        self.instruments
            .iter()
            .filter_map(|i| i.category.clone().map(|c| (i.id.clone(), c)))
            .collect()
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }
}
