use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder the analysis backend writes when a field is absent from a resume.
pub const NOT_LISTED: &str = "Tidak tercantum";
/// Placeholder written to `Drive Link` when the resume could not be stored.
pub const DRIVE_UPLOAD_FAILED: &str = "Gagal upload ke Drive";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One analysed applicant, as stored in the results spreadsheet.
///
/// Spreadsheet rows are loosely typed: phone numbers come back as numbers,
/// scores as strings, and empty cells as `""`. Every field decodes leniently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(rename = "Nama", default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "Email", default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(rename = "Nomor Telepon", default, deserialize_with = "lenient_text")]
    pub phone: String,
    #[serde(
        rename = "Pendidikan Terakhir",
        default,
        deserialize_with = "lenient_text"
    )]
    pub education: String,
    #[serde(rename = "Overall Fit", default, deserialize_with = "fit_score")]
    pub overall_fit: u8,
    #[serde(rename = "Kekuatan", default, deserialize_with = "lenient_text")]
    pub strengths: String,
    #[serde(rename = "Kekurangan", default, deserialize_with = "lenient_text")]
    pub weaknesses: String,
    #[serde(rename = "Risk Factor", default, deserialize_with = "lenient_text")]
    pub risk_factors: String,
    #[serde(rename = "Reward Factor", default, deserialize_with = "lenient_text")]
    pub reward_factors: String,
    #[serde(rename = "Justifikasi", default, deserialize_with = "lenient_text")]
    pub justification: String,
    #[serde(rename = "Drive Link", default, deserialize_with = "lenient_text")]
    pub drive_link: String,
    #[serde(rename = "Waktu", default, deserialize_with = "lenient_text")]
    pub timestamp: String,
}

impl CandidateRecord {
    pub fn fit_band(&self) -> FitBand {
        FitBand::from_score(self.overall_fit)
    }

    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.trim();
        if raw.is_empty() {
            return None;
        }
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
    }

    pub fn recorded_date(&self) -> Option<NaiveDate> {
        self.recorded_at().map(|at| at.date())
    }

    pub fn recorded_time(&self) -> Option<NaiveTime> {
        self.recorded_at().map(|at| at.time())
    }

    pub fn contact_email(&self) -> Option<&str> {
        listed(&self.email)
    }

    pub fn contact_phone(&self) -> Option<&str> {
        listed(&self.phone)
    }

    pub fn resume_link(&self) -> Option<&str> {
        let link = self.drive_link.trim();
        if link.is_empty() || link == DRIVE_UPLOAD_FAILED {
            None
        } else {
            Some(link)
        }
    }
}

fn listed(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value == NOT_LISTED {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FitBand {
    /// Below 60.
    Low,
    /// 60 up to (not including) 80.
    Medium,
    /// 80 and above.
    High,
}

impl FitBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::High,
            60..=79 => Self::Medium,
            _ => Self::Low,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    })
}

fn fit_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let score = match value {
        Some(Value::Number(number)) => number.as_f64().map(f64::round).unwrap_or(0.0),
        Some(Value::String(text)) => {
            // The analysis step sometimes writes "85%" or "85/100".
            text.split(['/', '%'])
                .next()
                .unwrap_or_default()
                .trim()
                .parse::<f64>()
                .map(f64::round)
                .unwrap_or(0.0)
        }
        _ => 0.0,
    };
    Ok(score.clamp(0.0, 100.0) as u8)
}
