//! BOK base rate decision history
//!
//! Labels for the rate predictor: every Monetary Policy Committee rate
//! decision with the resulting base rate and the direction of the move.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::ModelResult;

/// Direction of a base rate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateAction {
    Hike,
    Hold,
    Cut,
}

impl RateAction {
    /// Class order used by the predictor's probability vector
    pub const ALL: [RateAction; 3] = [RateAction::Hike, RateAction::Hold, RateAction::Cut];

    /// Numeric code: hike 1, hold 0, cut -1
    pub fn code(&self) -> i8 {
        match self {
            RateAction::Hike => 1,
            RateAction::Hold => 0,
            RateAction::Cut => -1,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(RateAction::Hike),
            0 => Some(RateAction::Hold),
            -1 => Some(RateAction::Cut),
            _ => None,
        }
    }

    /// Position in `RateAction::ALL`
    pub fn index(&self) -> usize {
        match self {
            RateAction::Hike => 0,
            RateAction::Hold => 1,
            RateAction::Cut => 2,
        }
    }

    /// Korean label used in BOK releases
    pub fn label(&self) -> &'static str {
        match self {
            RateAction::Hike => "인상",
            RateAction::Hold => "동결",
            RateAction::Cut => "인하",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "인상" => Some(RateAction::Hike),
            "동결" => Some(RateAction::Hold),
            "인하" => Some(RateAction::Cut),
            _ => None,
        }
    }
}

impl std::fmt::Display for RateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateDecision {
    /// Base rate after the decision, in percent
    pub rate: f64,
    pub action: RateAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateHistory(BTreeMap<NaiveDate, RateDecision>);

impl RateHistory {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Rate decisions announced by the BOK from 2021 through 2025
    pub fn bok_default() -> Self {
        use RateAction::{Cut, Hike, Hold};

        const DECISIONS: &[((i32, u32, u32), f64, RateAction)] = &[
            // 2021
            ((2021, 1, 15), 0.50, Hold),
            ((2021, 2, 25), 0.50, Hold),
            ((2021, 4, 15), 0.50, Hold),
            ((2021, 5, 27), 0.50, Hold),
            ((2021, 7, 15), 0.50, Hold),
            ((2021, 8, 26), 0.75, Hike),
            ((2021, 10, 12), 0.75, Hold),
            ((2021, 11, 25), 1.00, Hike),
            // 2022
            ((2022, 1, 14), 1.25, Hike),
            ((2022, 2, 24), 1.25, Hold),
            ((2022, 4, 14), 1.50, Hike),
            ((2022, 5, 26), 1.75, Hike),
            ((2022, 7, 13), 2.25, Hike),
            ((2022, 8, 25), 2.50, Hike),
            ((2022, 10, 12), 3.00, Hike),
            ((2022, 11, 24), 3.25, Hike),
            // 2023
            ((2023, 1, 13), 3.50, Hike),
            ((2023, 2, 23), 3.50, Hold),
            ((2023, 4, 11), 3.50, Hold),
            ((2023, 5, 25), 3.50, Hold),
            ((2023, 7, 13), 3.50, Hold),
            ((2023, 8, 24), 3.50, Hold),
            ((2023, 10, 19), 3.50, Hold),
            ((2023, 11, 30), 3.50, Hold),
            // 2024
            ((2024, 1, 11), 3.50, Hold),
            ((2024, 2, 22), 3.50, Hold),
            ((2024, 4, 12), 3.50, Hold),
            ((2024, 5, 23), 3.50, Hold),
            ((2024, 7, 11), 3.50, Hold),
            ((2024, 8, 22), 3.50, Hold),
            ((2024, 10, 11), 3.25, Cut),
            ((2024, 11, 28), 3.00, Cut),
            // 2025
            ((2025, 1, 16), 3.00, Hold),
            ((2025, 2, 25), 2.75, Cut),
            ((2025, 4, 17), 2.75, Hold),
            ((2025, 5, 29), 2.50, Cut),
            ((2025, 7, 10), 2.50, Hold),
            ((2025, 8, 28), 2.50, Hold),
            ((2025, 10, 23), 2.50, Hold),
            ((2025, 11, 27), 2.50, Hold),
        ];

        let mut history = Self::new();
        for &((year, month, day), rate, action) in DECISIONS {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                history.insert(date, RateDecision { rate, action });
            }
        }
        history
    }

    /// Load from JSON (`{"2024-10-11": {"rate": 3.25, "action": "cut"}, ...}`),
    /// falling back to the built-in history when the file does not exist
    pub fn load_or_default(path: &Path) -> ModelResult<Self> {
        if !path.exists() {
            warn!(
                "Rate history file not found at {}, using built-in BOK decisions",
                path.display()
            );
            return Ok(Self::bok_default());
        }

        let history: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        info!("Loaded {} rate decisions from {}", history.len(), path.display());
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> ModelResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn insert(&mut self, date: NaiveDate, decision: RateDecision) {
        self.0.insert(date, decision);
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&RateDecision> {
        self.0.get(date)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0.contains_key(date)
    }

    /// Most recent decision strictly before `date`
    pub fn previous(&self, date: NaiveDate) -> Option<(NaiveDate, &RateDecision)> {
        self.0.range(..date).next_back().map(|(d, decision)| (*d, decision))
    }

    pub fn latest(&self) -> Option<(NaiveDate, &RateDecision)> {
        self.0.iter().next_back().map(|(d, decision)| (*d, decision))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &RateDecision)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_action_codes_and_labels() {
        for action in RateAction::ALL {
            assert_eq!(RateAction::from_code(action.code()), Some(action));
            assert_eq!(RateAction::from_label(action.label()), Some(action));
            assert_eq!(RateAction::ALL[action.index()], action);
        }
        assert_eq!(RateAction::Cut.code(), -1);
        assert_eq!(RateAction::from_code(2), None);
        assert_eq!(RateAction::Hike.to_string(), "인상");
    }

    #[test]
    fn test_bok_default_history() {
        let history = RateHistory::bok_default();
        assert_eq!(history.len(), 40);

        let first_cut = history.get(&date(2024, 10, 11)).unwrap();
        assert_eq!(first_cut.action, RateAction::Cut);
        assert_eq!(first_cut.rate, 3.25);

        let (latest_date, latest) = history.latest().unwrap();
        assert_eq!(latest_date, date(2025, 11, 27));
        assert_eq!(latest.rate, 2.50);
    }

    #[test]
    fn test_previous_decision() {
        let history = RateHistory::bok_default();
        let (prev_date, prev) = history.previous(date(2022, 1, 14)).unwrap();
        assert_eq!(prev_date, date(2021, 11, 25));
        assert_eq!(prev.action, RateAction::Hike);
        assert!(history.previous(date(2021, 1, 15)).is_none());
    }

    #[test]
    fn test_load_or_default_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rate_history.json");

        let fallback = RateHistory::load_or_default(&path).unwrap();
        assert_eq!(fallback, RateHistory::bok_default());

        let mut custom = RateHistory::new();
        custom.insert(date(2026, 1, 15), RateDecision { rate: 2.25, action: RateAction::Cut });
        custom.save(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"2026-01-15\""));
        assert!(json.contains("\"cut\""));

        let loaded = RateHistory::load_or_default(&path).unwrap();
        assert_eq!(loaded, custom);
    }
}
