//! Conversion of `key=value` launch arguments into job parameters.
//!
//! A key may carry a type suffix: `run.date(date)=2013/01/01`,
//! `chunk(long)=100`, `ratio(double)=0.5`, `dry(boolean)=true`. Untyped and
//! `(string)` values are strings. Dates accept `YYYY/MM/DD` or RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use jobledger_core::{JobParameter, JobParameters};

use crate::error::LaunchError;

/// Converts command-line style arguments into [`JobParameters`].
pub struct JobParametersConverter;

impl JobParametersConverter {
    /// Convert every `key=value` argument. Arguments without `=` are skipped.
    pub fn from_args<I, S>(args: I) -> Result<JobParameters, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parameters = JobParameters::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((raw_key, value)) = arg.split_once('=') else {
                debug!("Ignoring launch argument without '=': {}", arg);
                continue;
            };
            let (key, parameter) = Self::convert(raw_key.trim(), value)?;
            parameters = parameters.with(key, parameter);
        }
        Ok(parameters)
    }

    fn convert(raw_key: &str, value: &str) -> Result<(String, JobParameter), LaunchError> {
        let (key, kind) = match raw_key.strip_suffix(')').and_then(|k| k.split_once('(')) {
            Some((key, kind)) => (key, kind.trim().to_ascii_lowercase()),
            None => (raw_key, "string".to_string()),
        };

        if key.is_empty() {
            return Err(invalid(raw_key, "empty parameter name"));
        }

        let parameter = match kind.as_str() {
            "string" => JobParameter::String(value.to_string()),
            "long" => JobParameter::Long(
                value
                    .trim()
                    .parse()
                    .map_err(|e| invalid(key, format!("not a long: {}", e)))?,
            ),
            "double" => {
                let v: f64 = value
                    .trim()
                    .parse()
                    .map_err(|e| invalid(key, format!("not a double: {}", e)))?;
                if !v.is_finite() {
                    return Err(invalid(key, format!("not a finite double: {}", value)));
                }
                JobParameter::Double(v)
            }
            "boolean" => JobParameter::Boolean(
                value
                    .trim()
                    .parse()
                    .map_err(|e| invalid(key, format!("not a boolean: {}", e)))?,
            ),
            "date" => JobParameter::Date(parse_date(value.trim()).ok_or_else(|| {
                invalid(key, format!("not a date (YYYY/MM/DD or RFC 3339): {}", value))
            })?),
            other => return Err(invalid(key, format!("unknown parameter type '{}'", other))),
        };

        Ok((key.to_string(), parameter))
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y/%m/%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn invalid(key: &str, message: impl Into<String>) -> LaunchError {
    LaunchError::InvalidParameter {
        key: key.to_string(),
        message: message.into(),
    }
}
