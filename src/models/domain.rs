use std::path::{Path, PathBuf};

/// Dashboard domain
///
/// Determines the instrument catalog, the storage directory, the remote
/// source and the kind of observation being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Argentine equities (BYMA panel)
    ///
    /// Source: data912 `historical/stocks`
    Stocks,

    /// Argentine sovereign, provincial and corporate bonds
    ///
    /// Source: data912 `historical/bonds`
    Bonds,

    /// Central bank monetary series (reserves, rates, inflation...)
    ///
    /// Source: BCRA `Monetarias/{id}`
    Macro,
}

impl Domain {
    /// Every domain, in the order `all` runs them
    pub fn all() -> [Domain; 3] {
        [Domain::Stocks, Domain::Bonds, Domain::Macro]
    }

    /// Catalog file inside the config directory
    pub fn catalog_file(&self) -> &'static str {
        match self {
            Domain::Stocks => "stocks.json",
            Domain::Bonds => "bonds.json",
            Domain::Macro => "macro.json",
        }
    }

    /// Per-domain subdirectory (shared by the store and the report output)
    pub fn dir_in(&self, root: &Path) -> PathBuf {
        root.join(self.as_str())
    }

    /// Path segment of the data912 historical endpoint, `None` for macro
    pub fn data912_path(&self) -> Option<&'static str> {
        match self {
            Domain::Stocks => Some("stocks"),
            Domain::Bonds => Some("bonds"),
            Domain::Macro => None,
        }
    }

    /// Whether observations are OHLCV bars (as opposed to macro points)
    pub fn is_price_domain(&self) -> bool {
        !matches!(self, Domain::Macro)
    }

    /// Human-readable label for console output
    pub fn label(&self) -> &'static str {
        match self {
            Domain::Stocks => "Acciones",
            Domain::Bonds => "Bonos",
            Domain::Macro => "Macro BCRA",
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Stocks => "stocks",
            Domain::Bonds => "bonds",
            Domain::Macro => "macro",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_as_str() {
        assert_eq!(Domain::Stocks.as_str(), "stocks");
        assert_eq!(Domain::Bonds.as_str(), "bonds");
        assert_eq!(Domain::Macro.to_string(), "macro");
    }

    #[test]
    fn test_domain_paths() {
        assert_eq!(Domain::Bonds.catalog_file(), "bonds.json");
        assert_eq!(
            Domain::Stocks.dir_in(Path::new("data")),
            PathBuf::from("data/stocks")
        );
        assert_eq!(Domain::Stocks.data912_path(), Some("stocks"));
        assert_eq!(Domain::Macro.data912_path(), None);
        assert!(!Domain::Macro.is_price_domain());
    }

    #[test]
    fn test_all_order() {
        assert_eq!(Domain::all(), [Domain::Stocks, Domain::Bonds, Domain::Macro]);
    }
}
