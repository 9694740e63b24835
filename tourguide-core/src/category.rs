use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How a category's records are laid out under its database path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `{ "<field>": [record, ...], "metadata": {...} }`
    List(&'static str),
    /// `{ "<key>": record, ... }`
    Keyed,
}

/// A browsable collection of attractions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Beach,
    Lake,
    Temple,
    Wildlife,
    Hills,
    Popular,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Beach,
        Category::Lake,
        Category::Temple,
        Category::Wildlife,
        Category::Hills,
        Category::Popular,
    ];

    /// Database path holding the collection
    pub fn path(self) -> &'static str {
        match self {
            Category::Beach => "/beach",
            Category::Lake => "/lake",
            Category::Temple => "/temple/historical_temples",
            Category::Wildlife => "/wildlife",
            Category::Hills => "/hills",
            Category::Popular => "/papular/destinations",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Category::Beach => Layout::List("beaches"),
            Category::Lake => Layout::List("lakes"),
            Category::Wildlife => Layout::List("wildlife_places"),
            Category::Hills => Layout::List("hill_stations"),
            Category::Temple | Category::Popular => Layout::Keyed,
        }
    }

    /// Plural noun for messages, e.g. "wildlife sanctuaries"
    pub fn label(self) -> &'static str {
        match self {
            Category::Beach => "beaches",
            Category::Lake => "lakes",
            Category::Temple => "historical temples",
            Category::Wildlife => "wildlife sanctuaries",
            Category::Hills => "hill stations",
            Category::Popular => "popular destinations",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Category::Beach => "beach",
            Category::Lake => "lake",
            Category::Temple => "temple",
            Category::Wildlife => "wildlife",
            Category::Hills => "hills",
            Category::Popular => "popular",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        let wanted = match wanted.as_str() {
            "beaches" => "beach",
            "lakes" => "lake",
            "temples" => "temple",
            "hill" => "hills",
            other => other,
        };

        Category::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
                anyhow::anyhow!("Unknown category '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}
