use anyhow::{Context, Result};
use bench_core::{AnalysisRecord, NO_FACE_HUE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const UNKNOWN_RACE: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceHue {
    pub race: String,
    pub faces: usize,
    pub mean_hue: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HueReport {
    pub total_rows: usize,
    pub faceless_rows: usize,
    pub by_race: Vec<RaceHue>,
}

/// Face hue statistics grouped by predicted race, sorted by label.
/// Rows carrying the no-face sentinel are counted but not averaged.
pub fn hue_report(records: &[AnalysisRecord]) -> HueReport {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut faceless_rows = 0;

    for record in records {
        if record.hue == NO_FACE_HUE {
            faceless_rows += 1;
            continue;
        }
        let race = if record.race.is_empty() {
            UNKNOWN_RACE
        } else {
            record.race.as_str()
        };
        groups.entry(race).or_default().push(record.hue);
    }

    let by_race = groups
        .into_iter()
        .map(|(race, hues)| {
            let mean_hue = statistical::mean(&hues);
            // sample standard deviation is undefined for a single value
            let std_dev = if hues.len() > 1 {
                statistical::standard_deviation(&hues, Some(mean_hue))
            } else {
                0.0
            };
            RaceHue {
                race: race.to_string(),
                faces: hues.len(),
                mean_hue,
                std_dev,
            }
        })
        .collect();

    HueReport {
        total_rows: records.len(),
        faceless_rows,
        by_race,
    }
}

pub fn save_report(report: &HueReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hue: f64, race: &str) -> AnalysisRecord {
        AnalysisRecord {
            hue,
            face: None,
            race: race.to_string(),
            gender: "Man".to_string(),
        }
    }

    #[test]
    fn test_groups_by_race_and_skips_faceless() {
        let records = vec![
            record(10.0, "white"),
            record(20.0, "white"),
            record(30.0, "asian"),
            record(NO_FACE_HUE, "white"),
            record(40.0, ""),
        ];
        let report = hue_report(&records);

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.faceless_rows, 1);

        let races: Vec<&str> = report.by_race.iter().map(|r| r.race.as_str()).collect();
        assert_eq!(races, vec!["asian", "unknown", "white"]);

        let white = &report.by_race[2];
        assert_eq!(white.faces, 2);
        assert!((white.mean_hue - 15.0).abs() < 1e-9);
        assert!((white.std_dev - 50f64.sqrt()).abs() < 1e-9);

        assert_eq!(report.by_race[0].std_dev, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let report = hue_report(&[]);
        assert_eq!(report.total_rows, 0);
        assert!(report.by_race.is_empty());
    }

    #[test]
    fn test_report_saved_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("hue.json");
        save_report(&hue_report(&[record(5.0, "black")]), &path).unwrap();

        let loaded: HueReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.by_race[0].race, "black");
        assert_eq!(loaded.by_race[0].mean_hue, 5.0);
    }
}
