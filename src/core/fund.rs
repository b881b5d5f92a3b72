//! Fund catalog types shared by the gateway, the engine and the views

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FundId(pub i64);

impl Display for FundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FundId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(FundId)
            .map_err(|_| anyhow::anyhow!("Invalid fund id: {}", s))
    }
}

/// Summary figures some catalog rows carry inline. These are a snapshot taken
/// at ingestion time and never replace a fetched [`MetricsRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundSummary {
    pub rentability: f64,
    pub volatility: f64,
    pub sharpe: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub id: FundId,
    /// Business key (CNPJ) used to look up metrics.
    pub tax_id: String,
    pub name: String,
    pub asset_class: Option<String>,
    pub summary: Option<FundSummary>,
}

impl Fund {
    pub fn new(id: i64, tax_id: &str, name: &str) -> Self {
        Self {
            id: FundId(id),
            tax_id: tax_id.to_string(),
            name: name.to_string(),
            asset_class: None,
            summary: None,
        }
    }

    pub fn metrics_key(&self) -> &str {
        &self.tax_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteMark {
    pub id: FundId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub rentability: f64,
    pub volatility: f64,
    pub sharpe: f64,
    /// Number of price points the remote computation used, when reported.
    pub observations: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTab {
    #[default]
    #[serde(alias = "funds")]
    All,
    Favorites,
    Recommendations,
}

impl Display for ActiveTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ActiveTab::All => "All Funds",
                ActiveTab::Favorites => "Favorites",
                ActiveTab::Recommendations => "Recommendations",
            }
        )
    }
}

impl FromStr for ActiveTab {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "funds" => Ok(ActiveTab::All),
            "favorites" | "favs" => Ok(ActiveTab::Favorites),
            "recommendations" | "recs" => Ok(ActiveTab::Recommendations),
            _ => Err(anyhow::anyhow!("Invalid tab: {}", s)),
        }
    }
}
