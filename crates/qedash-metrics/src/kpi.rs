//! KPI tables as written to and read back from CSV.

use serde::{Deserialize, Deserializer, Serialize};

/// File name and column order of an exported KPI table.
pub trait KpiRecord: Serialize + for<'de> Deserialize<'de> {
    const FILE: &'static str;
    const HEADERS: &'static [&'static str];
}

/// Pass rate per programme and term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRateKpi {
    pub programme: String,
    pub term: String,
    #[serde(deserialize_with = "coerce::int")]
    pub assessed: i64,
    #[serde(deserialize_with = "coerce::int")]
    pub passed: i64,
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub pass_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnaroundKpi {
    #[serde(deserialize_with = "coerce::int")]
    pub assessment_id: i64,
    #[serde(deserialize_with = "coerce::int")]
    pub module_id: i64,
    #[serde(deserialize_with = "coerce::opt_string")]
    pub programme: Option<String>,
    #[serde(deserialize_with = "coerce::opt_string")]
    pub term: Option<String>,
    #[serde(deserialize_with = "coerce::opt_int")]
    pub turnaround_days: Option<i64>,
    #[serde(deserialize_with = "coerce::opt_string")]
    pub turn_bin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementKpi {
    pub programme: String,
    pub term: String,
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub mean_score_1_5: Option<f64>,
    #[serde(deserialize_with = "coerce::opt_int")]
    pub survey_responses: Option<i64>,
    #[serde(deserialize_with = "coerce::opt_int")]
    pub enrolments: Option<i64>,
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub response_rate: Option<f64>,
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub support_participation: Option<f64>,
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub engagement_index: Option<f64>,
}

/// Module flagged by low survey satisfaction and pass rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskKpi {
    #[serde(deserialize_with = "coerce::int")]
    pub module_id: i64,
    pub programme: String,
    pub term: String,
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub mean_survey: Option<f64>,
    /// Pass rate in percent.
    #[serde(deserialize_with = "coerce::opt_f64")]
    pub pass_rate: Option<f64>,
    #[serde(deserialize_with = "coerce::flag")]
    pub at_risk: bool,
}

impl KpiRecord for PassRateKpi {
    const FILE: &'static str = "kpi_pass_rate.csv";
    const HEADERS: &'static [&'static str] =
        &["programme", "term", "assessed", "passed", "pass_rate_pct"];
}

impl KpiRecord for TurnaroundKpi {
    const FILE: &'static str = "assessment_turnaround_bins.csv";
    const HEADERS: &'static [&'static str] = &[
        "assessment_id",
        "module_id",
        "programme",
        "term",
        "turnaround_days",
        "turn_bin",
    ];
}

impl KpiRecord for EngagementKpi {
    const FILE: &'static str = "engagement_index.csv";
    const HEADERS: &'static [&'static str] = &[
        "programme",
        "term",
        "mean_score_1_5",
        "survey_responses",
        "enrolments",
        "response_rate",
        "support_participation",
        "engagement_index",
    ];
}

impl KpiRecord for AtRiskKpi {
    const FILE: &'static str = "at_risk_modules.csv";
    const HEADERS: &'static [&'static str] = &[
        "module_id",
        "programme",
        "term",
        "mean_survey",
        "pass_rate",
        "at_risk",
    ];
}

/// The four exported KPI tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiTables {
    pub pass_rate: Vec<PassRateKpi>,
    pub turnaround: Vec<TurnaroundKpi>,
    pub engagement: Vec<EngagementKpi>,
    pub at_risk: Vec<AtRiskKpi>,
}

/// Lenient field parsing for hand-edited or foreign CSV exports.
pub mod coerce {
    use super::*;

    const NULL_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none"];

    fn is_null(raw: &str) -> bool {
        let lowered = raw.trim().to_ascii_lowercase();
        NULL_MARKERS.contains(&lowered.as_str())
    }

    pub fn parse_flag(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" | "1.0" => Some(true),
            "false" | "f" | "0" | "no" | "n" | "0.0" | "" => Some(false),
            _ => None,
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_flag(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean '{raw}'")))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if is_null(&raw) {
            return Ok(None);
        }
        raw.trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{raw}'")))
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if is_null(&raw) {
            return Ok(None);
        }
        parse_int(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid integer '{raw}'")))
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_int(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid integer '{raw}'")))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if is_null(&raw) {
            Ok(None)
        } else {
            Ok(Some(raw))
        }
    }

    /// Integers exported through float columns come back as `12.0`.
    fn parse_int(raw: &str) -> Option<i64> {
        let trimmed = raw.trim();
        trimmed.parse::<i64>().ok().or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|value| value.fract() == 0.0 && value.is_finite())
                .map(|value| value as i64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read<T: for<'de> Deserialize<'de>>(csv_text: &str) -> Vec<T> {
        csv::Reader::from_reader(csv_text.as_bytes())
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .expect("deserialize rows")
    }

    #[test]
    fn headers_match_serialized_fields() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(EngagementKpi {
                programme: "Nursing".to_string(),
                term: "2023-Fall".to_string(),
                mean_score_1_5: Some(3.9),
                survey_responses: None,
                enrolments: Some(10),
                response_rate: None,
                support_participation: Some(0.5),
                engagement_index: None,
            })
            .expect("serialize");
        let bytes = writer.into_inner().expect("flush");
        let text = String::from_utf8(bytes).expect("utf8");
        let header = text.lines().next().expect("header line");
        assert_eq!(header, EngagementKpi::HEADERS.join(","));
        assert_eq!(text.lines().nth(1), Some("Nursing,2023-Fall,3.9,,10,,0.5,"));
    }

    #[test]
    fn at_risk_accepts_common_spellings() {
        let rows: Vec<AtRiskKpi> = read(
            "module_id,programme,term,mean_survey,pass_rate,at_risk\n\
             1,Nursing,2023-Fall,3.5,88.0,True\n\
             2,Nursing,2023-Fall,3.9,91.2,0\n\
             3,Nursing,2023-Fall,,,yes\n\
             4.0,Nursing,2023-Fall,NaN,90,false\n",
        );
        let flags: Vec<bool> = rows.iter().map(|row| row.at_risk).collect();
        assert_eq!(flags, vec![true, false, true, false]);
        assert_eq!(rows[2].mean_survey, None);
        assert_eq!(rows[3].module_id, 4);
        assert_eq!(rows[3].mean_survey, None);
    }

    #[test]
    fn rejects_unknown_flag() {
        let result = csv::Reader::from_reader(
            "module_id,programme,term,mean_survey,pass_rate,at_risk\n1,A,B,1,1,maybe\n".as_bytes(),
        )
        .deserialize::<AtRiskKpi>()
        .collect::<Result<Vec<_>, _>>();
        assert!(result.is_err());
    }

    #[test]
    fn empty_bins_read_as_null() {
        let rows: Vec<TurnaroundKpi> = read(
            "assessment_id,module_id,programme,term,turnaround_days,turn_bin\n\
             1,1,Nursing,2023-Fall,12,11-15\n\
             2,1,,,,\n",
        );
        assert_eq!(rows[0].turn_bin.as_deref(), Some("11-15"));
        assert_eq!(rows[1].turnaround_days, None);
        assert_eq!(rows[1].programme, None);
    }
}
