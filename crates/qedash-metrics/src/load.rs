use std::path::Path;

use tracing::debug;

use crate::errors::MetricsError;
use crate::kpi::{AtRiskKpi, EngagementKpi, KpiRecord, KpiTables, PassRateKpi, TurnaroundKpi};

/// Read the four KPI CSVs from `dir`.
pub fn load_kpis(dir: &Path) -> Result<KpiTables, MetricsError> {
    let kpis = KpiTables {
        pass_rate: load_kpi::<PassRateKpi>(dir)?,
        turnaround: load_kpi::<TurnaroundKpi>(dir)?,
        engagement: load_kpi::<EngagementKpi>(dir)?,
        at_risk: load_kpi::<AtRiskKpi>(dir)?,
    };
    debug!(
        event = "kpis_loaded",
        dir = %dir.display(),
        pass_rate = kpis.pass_rate.len(),
        turnaround = kpis.turnaround.len(),
        engagement = kpis.engagement.len(),
        at_risk = kpis.at_risk.len()
    );
    Ok(kpis)
}

/// Read one KPI table; columns are matched by header name.
pub fn load_kpi<T: KpiRecord>(dir: &Path) -> Result<Vec<T>, MetricsError> {
    let path = dir.join(T::FILE);
    if !path.exists() {
        return Err(MetricsError::MissingFile(path));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = T::HEADERS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        return Err(MetricsError::InvalidKpi {
            file: T::FILE.to_string(),
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T>().enumerate() {
        let row = record.map_err(|err| MetricsError::InvalidKpi {
            file: T::FILE.to_string(),
            message: format!("row {}: {err}", index + 1),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("qedash-load-{label}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = temp_dir("missing");
        let err = load_kpis(&dir).expect_err("no files");
        assert!(matches!(
            err,
            MetricsError::MissingFile(path) if path.ends_with("kpi_pass_rate.csv")
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = temp_dir("columns");
        std::fs::write(
            dir.join(PassRateKpi::FILE),
            "programme,term,assessed,passed\nNursing,2023-Fall,1,1\n",
        )
        .expect("write csv");
        let err = load_kpi::<PassRateKpi>(&dir).expect_err("missing pass_rate_pct");
        assert!(err.to_string().contains("pass_rate_pct"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn reordered_columns_and_padding_are_accepted() {
        let dir = temp_dir("reordered");
        std::fs::write(
            dir.join(PassRateKpi::FILE),
            "term,programme,pass_rate_pct,passed,assessed\n 2023-Fall , Nursing ,NA,0,0\n",
        )
        .expect("write csv");
        let rows = load_kpi::<PassRateKpi>(&dir).expect("load");
        assert_eq!(rows[0].programme, "Nursing");
        assert_eq!(rows[0].pass_rate_pct, None);
        let _ = std::fs::remove_dir_all(dir);
    }
}
