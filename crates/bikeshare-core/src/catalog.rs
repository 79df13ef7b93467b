//! Registry of selectable cities, months and weekdays.
//!
//! The catalog is built once at startup (either from the built-in tables or
//! from three small CSV files) and is read-only afterwards. Every selection
//! made by the user is resolved here into a canonical lowercase key.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BikeshareError, Result};

/// Sentinel key meaning "do not filter on this field".
pub const ALL: &str = "all";

/// The three kinds of selection a query is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    City,
    Month,
    Weekday,
}

impl Category {
    /// The canonical lowercase string identifier for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::City => "city",
            Category::Month => "month",
            Category::Weekday => "weekday",
        }
    }

    /// File name of the catalog table for this category.
    pub fn table_file(&self) -> &'static str {
        match self {
            Category::City => "cities.csv",
            Category::Month => "months.csv",
            Category::Weekday => "weekdays.csv",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BikeshareError;

    /// Case-insensitive; `"day"` is accepted for [`Category::Weekday`].
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "city" => Ok(Category::City),
            "month" => Ok(Category::Month),
            "weekday" | "day" => Ok(Category::Weekday),
            other => Err(BikeshareError::Config(format!(
                "unknown catalog category: {other}"
            ))),
        }
    }
}

/// Immutable configuration record for one selectable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical lowercase key, e.g. `"new york city"` or `"june"`.
    pub key: String,
    /// Number shown next to the entry in menus; also accepted as input.
    pub number: u32,
    /// Source filename (cities) or numeric code (months, weekdays).
    /// `None` for the `"all"` entries.
    pub value: Option<String>,
    /// Extra spellings accepted on input, stored lowercase.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CatalogEntry {
    fn new(key: &str, number: u32, value: Option<&str>, aliases: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            number,
            value: value.map(str::to_string),
            aliases: aliases.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// Whether a case-folded candidate names this entry.
    ///
    /// Matches the key, the display number, the configured value, or any
    /// alias.
    pub fn matches(&self, folded: &str) -> bool {
        self.key == folded
            || self.number.to_string() == folded
            || self
                .value
                .as_deref()
                .is_some_and(|v| v.to_lowercase() == folded)
            || self.aliases.iter().any(|a| a == folded)
    }

    /// Numeric code parsed from `value`, if any.
    pub fn code(&self) -> Option<u32> {
        self.value.as_deref().and_then(|v| v.trim().parse().ok())
    }

    /// Title-cased key for display, e.g. `"New York City"`.
    pub fn display_name(&self) -> String {
        title_case(&self.key)
    }

    pub fn is_all(&self) -> bool {
        self.key == ALL
    }
}

/// The full set of selectable cities, months and weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    cities: Vec<CatalogEntry>,
    months: Vec<CatalogEntry>,
    weekdays: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The built-in tables: three cities, all + twelve months, all + seven
    /// weekdays.
    pub fn builtin() -> Self {
        Self {
            cities: builtin_table(Category::City),
            months: builtin_table(Category::Month),
            weekdays: builtin_table(Category::Weekday),
        }
    }

    /// Load the catalog tables from `cities.csv`, `months.csv` and
    /// `weekdays.csv` inside `dir`.
    ///
    /// Each table has a header row and the columns `key,number,value,aliases`
    /// (aliases separated by `|`). A missing file falls back to the built-in
    /// table for that category.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let catalog = Self {
            cities: load_table(dir, Category::City)?,
            months: load_table(dir, Category::Month)?,
            weekdays: load_table(dir, Category::Weekday)?,
        };
        debug!(
            "Catalog loaded from {}: {} cities, {} months, {} weekdays",
            dir.display(),
            catalog.cities.len(),
            catalog.months.len(),
            catalog.weekdays.len()
        );
        Ok(catalog)
    }

    /// Entries of `category` in display order.
    pub fn entries(&self, category: Category) -> &[CatalogEntry] {
        match category {
            Category::City => &self.cities,
            Category::Month => &self.months,
            Category::Weekday => &self.weekdays,
        }
    }

    /// Resolve a user-typed candidate to the canonical key of its entry.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace. The
    /// first entry in display order that matches wins.
    pub fn resolve(&self, category: Category, candidate: &str) -> Result<&str> {
        let folded = candidate.trim().to_lowercase();
        self.entries(category)
            .iter()
            .find(|entry| entry.matches(&folded))
            .map(|entry| entry.key.as_str())
            .ok_or_else(|| BikeshareError::unknown_selection(category, candidate.trim()))
    }

    /// Look up an entry by its canonical key.
    pub fn entry(&self, category: Category, key: &str) -> Option<&CatalogEntry> {
        self.entries(category).iter().find(|e| e.key == key)
    }

    /// Source filename for a city selection (key, number or alias).
    pub fn city_filename(&self, city: &str) -> Result<&str> {
        let key = self.resolve(Category::City, city)?;
        self.entry(Category::City, key)
            .and_then(|e| e.value.as_deref())
            .ok_or_else(|| BikeshareError::Config(format!("city \"{key}\" has no source file")))
    }

    /// Month number (1–12) for a month selection, `None` for `"all"`.
    pub fn month_code(&self, month: &str) -> Result<Option<u32>> {
        self.filter_code(Category::Month, month)
    }

    /// Canonical weekday key for a weekday selection, `None` for `"all"`.
    pub fn weekday_key(&self, weekday: &str) -> Result<Option<&str>> {
        if weekday.trim().eq_ignore_ascii_case(ALL) {
            return Ok(None);
        }
        let key = self.resolve(Category::Weekday, weekday)?;
        Ok((key != ALL).then_some(key))
    }

    fn filter_code(&self, category: Category, candidate: &str) -> Result<Option<u32>> {
        if candidate.trim().eq_ignore_ascii_case(ALL) {
            return Ok(None);
        }
        let key = self.resolve(category, candidate)?;
        if key == ALL {
            return Ok(None);
        }
        self.entry(category, key)
            .and_then(CatalogEntry::code)
            .map(Some)
            .ok_or_else(|| {
                BikeshareError::Config(format!("{category} \"{key}\" has no numeric code"))
            })
    }
}

// ── Table data ────────────────────────────────────────────────────────────────

fn builtin_table(category: Category) -> Vec<CatalogEntry> {
    match category {
        Category::City => vec![
            CatalogEntry::new("chicago", 1, Some("chicago.csv"), &["chi"]),
            CatalogEntry::new(
                "new york city",
                2,
                Some("new_york_city.csv"),
                &["new york", "nyc"],
            ),
            CatalogEntry::new("washington", 3, Some("washington.csv"), &["dc", "washington dc"]),
        ],
        Category::Month => {
            let mut months = vec![CatalogEntry::new(ALL, 0, None, &[])];
            months.extend(MONTH_NAMES.iter().enumerate().map(|(i, name)| {
                let number = i as u32 + 1;
                let code = number.to_string();
                CatalogEntry::new(name, number, Some(code.as_str()), &[&name[..3]])
            }));
            months
        }
        Category::Weekday => {
            let mut days = vec![CatalogEntry::new(ALL, 0, None, &[])];
            days.extend(WEEKDAY_NAMES.iter().enumerate().map(|(i, name)| {
                let number = i as u32 + 1;
                let code = number.to_string();
                CatalogEntry::new(name, number, Some(code.as_str()), &[&name[..3]])
            }));
            days
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

fn load_table(dir: &Path, category: Category) -> Result<Vec<CatalogEntry>> {
    let path = dir.join(category.table_file());
    if !path.exists() {
        warn!(
            "Catalog table {} not found, using built-in {} table",
            path.display(),
            category
        );
        return Ok(builtin_table(category));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|source| BikeshareError::Csv {
            path: path.clone(),
            source,
        })?;

    let mut entries = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|source| BikeshareError::Csv {
            path: path.clone(),
            source,
        })?;
        let line = idx + 2;

        let key = record.get(0).unwrap_or("").to_lowercase();
        if key.is_empty() {
            continue;
        }
        let number = record
            .get(1)
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| {
                BikeshareError::Config(format!(
                    "{}:{line}: display number must be a non-negative integer",
                    path.display()
                ))
            })?;
        let value = record.get(2).filter(|v| !v.is_empty()).map(str::to_string);
        let aliases = record
            .get(3)
            .map(|a| {
                a.split('|')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let entry = CatalogEntry {
            key,
            number,
            value,
            aliases,
        };
        validate_entry(category, &entry).map_err(|reason| {
            BikeshareError::Config(format!("{}:{line}: {reason}", path.display()))
        })?;
        entries.push(entry);
    }

    if entries.iter().all(CatalogEntry::is_all) {
        return Err(BikeshareError::Config(format!(
            "{} defines no selectable {} entries",
            path.display(),
            category
        )));
    }

    entries.sort_by_key(|e| e.number);
    Ok(entries)
}

fn validate_entry(category: Category, entry: &CatalogEntry) -> std::result::Result<(), String> {
    if entry.is_all() {
        return match category {
            Category::City => Err("cities cannot use the \"all\" key".to_string()),
            _ => Ok(()),
        };
    }
    match category {
        Category::City if entry.value.is_none() => {
            Err(format!("city \"{}\" needs a filename", entry.key))
        }
        Category::Month if !matches!(entry.code(), Some(1..=12)) => {
            Err(format!("month \"{}\" needs a code between 1 and 12", entry.key))
        }
        Category::Weekday if !WEEKDAY_NAMES.contains(&entry.key.as_str()) => Err(format!(
            "weekday \"{}\" is not a full weekday name",
            entry.key
        )),
        _ => Ok(()),
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
