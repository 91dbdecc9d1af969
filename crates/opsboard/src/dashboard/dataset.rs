use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// One row of the operational export: a single agent on a single day.
///
/// Metric columns are optional because the export variants in circulation do
/// not all carry the same columns; an absent column or empty cell becomes
/// `None` and aggregation treats it as a neutral contribution.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricRecord {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    pub agent: String,
    pub zone: String,
    #[serde(rename = "total_commandes_journalier", default)]
    pub daily_orders: Option<f64>,
    #[serde(rename = "total_interactions_par_agent", default)]
    pub interactions: Option<f64>,
    #[serde(rename = "total_interaction_appel_par_agent", default)]
    pub call_interactions: Option<f64>,
    #[serde(rename = "total_reclamation_par_agent", default)]
    pub complaints: Option<f64>,
    #[serde(rename = "total_suivi_livraison_impossible_par_agent", default)]
    pub failed_deliveries: Option<f64>,
    #[serde(rename = "total_notation_par_agent", default)]
    pub rating: Option<f64>,
    #[serde(rename = "total_sku_par_agent", default)]
    pub sku_count: Option<f64>,
    #[serde(rename = "total_suivi_reclamation_par_agent", default)]
    pub complaint_followups: Option<f64>,
    #[serde(rename = "moyenne_sku_par_commande", default)]
    pub sku_per_order: Option<f64>,
}

/// The loaded table, immutable for the lifetime of a session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<MetricRecord>,
}

impl Dataset {
    pub fn new(records: Vec<MetricRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for record in csv_reader.deserialize::<MetricRecord>() {
            records.push(record?);
        }

        Ok(Self { records })
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct agent ids, ordered.
    pub fn agents(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .map(|record| record.agent.clone())
            .collect()
    }

    /// Distinct zone ids, ordered.
    pub fn zones(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .map(|record| record.zone.clone())
            .collect()
    }

    /// Earliest and latest dates present, `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|record| record.date).min()?;
        let max = self.records.iter().map(|record| record.date).max()?;
        Some((min, max))
    }
}

/// Fetch a CSV export over HTTP with a hard timeout. Any transport failure,
/// non-success status, or parse failure surfaces as a `DatasetError`; callers
/// render that as "no data" instead of crashing the session.
pub async fn fetch_remote(url: &str, timeout: Duration) -> Result<Dataset, DatasetError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(DatasetError::Http)?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(DatasetError::Http)?
        .error_for_status()
        .map_err(DatasetError::Http)?;

    let body = response.text().await.map_err(DatasetError::Http)?;
    Dataset::from_reader(body.as_bytes())
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("unable to read source: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("fetch failed: {0}")]
    Http(reqwest::Error),
    #[error("dataset is empty; nothing to report on")]
    EmptySource,
}

fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();

    // Exports carry either bare dates or full timestamps; keep the day part.
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }

    Err(serde::de::Error::custom(format!(
        "unparseable date '{trimmed}', expected YYYY-MM-DD"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,agent,zone,total_commandes_journalier,total_interaction_appel_par_agent,total_reclamation_par_agent,total_suivi_livraison_impossible_par_agent,total_notation_par_agent
2024-03-01,Alice,Nord,12,30,1,0,4.5
2024-03-02,Bob,Sud,8,22,,2,3.9
";

    #[test]
    fn parses_rows_with_missing_cells() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).expect("sample parses");
        assert_eq!(dataset.len(), 2);

        let bob = &dataset.records()[1];
        assert_eq!(bob.agent, "Bob");
        assert_eq!(bob.complaints, None);
        assert_eq!(bob.failed_deliveries, Some(2.0));
        // Columns absent from this variant come back as None, not an error.
        assert_eq!(bob.interactions, None);
        assert_eq!(bob.sku_count, None);
    }

    #[test]
    fn exposes_distinct_agents_zones_and_date_bounds() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).expect("sample parses");
        assert_eq!(
            dataset.agents().into_iter().collect::<Vec<_>>(),
            vec!["Alice".to_string(), "Bob".to_string()]
        );
        assert_eq!(dataset.zones().len(), 2);

        let (min, max) = dataset.date_bounds().expect("bounds exist");
        assert_eq!(min, NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"));
        assert_eq!(max, NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid date"));
    }

    #[test]
    fn accepts_timestamped_dates() {
        let csv = "date,agent,zone\n2024-03-01 08:15:00,Alice,Nord\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).expect("timestamp parses");
        assert_eq!(
            dataset.records()[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
        );
    }

    #[test]
    fn rejects_unparseable_dates() {
        let csv = "date,agent,zone\nnot-a-date,Alice,Nord\n";
        assert!(Dataset::from_reader(csv.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn remote_fetch_failure_is_a_dataset_error() {
        // Nothing listens on the discard port; the fetch must come back as a
        // recoverable error within the timeout, never a panic.
        let err = fetch_remote("http://127.0.0.1:9", Duration::from_millis(250))
            .await
            .expect_err("unreachable endpoint fails");
        assert!(matches!(err, DatasetError::Http(_)));
    }

    #[test]
    fn missing_file_is_a_dataset_error() {
        let err = Dataset::from_path(Path::new("definitely/does/not/exist.csv"))
            .expect_err("missing file fails");
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
