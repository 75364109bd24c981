//! Human-readable licence rendering.

use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::licence::{Licence, Validity};

/// Render a licence for people (CLI output, support emails).
pub fn render(licence: &Licence) -> String {
    licence.to_string()
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Format a run period as `1d 2h 30m 15s`, omitting zero units.
pub fn format_run_period(period: Duration) -> String {
    let total = period.num_seconds();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .iter()
        .filter(|(value, _)| *value != 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        format!("{}ms", period.num_milliseconds())
    } else {
        parts.join(" ")
    }
}

impl fmt::Display for Licence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Licence Information:")?;
        writeln!(f, "ID: {}", self.id())?;

        match self.validity() {
            Validity::Fixed(window) => {
                writeln!(f, "Valid From: {}", timestamp(window.valid_from))?;
                writeln!(f, "Valid Until: {}", timestamp(window.valid_until))?;
            }
            Validity::Trial {
                run_period,
                activation,
            } => {
                writeln!(f, "Run Period: {}", format_run_period(*run_period))?;
                match activation {
                    Some(window) => {
                        writeln!(f, "Valid From: {}", timestamp(window.valid_from))?;
                        writeln!(f, "Valid Until: {}", timestamp(window.valid_until))?;
                    }
                    None => writeln!(f, "Activation: not yet activated")?,
                }
            }
        }

        if self.is_unlimited() {
            write!(f, "Limit: unlimited")
        } else {
            write!(f, "Limit: {}", self.max_count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::licence::Window;
    use chrono::TimeZone;

    fn fixed() -> Licence {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        Licence::from_parts(
            "lic-1".to_string(),
            Validity::Fixed(Window::new(from, until).unwrap()),
            10,
            Vec::new(),
        )
    }

    fn trial() -> Licence {
        Licence::from_parts(
            "lic-2".to_string(),
            Validity::trial(Duration::minutes(90)).unwrap(),
            0,
            Vec::new(),
        )
    }

    #[test]
    fn renders_fixed_window() {
        let text = render(&fixed());
        assert_eq!(
            text,
            "Licence Information:\n\
             ID: lic-1\n\
             Valid From: 2024-01-01T00:00:00Z\n\
             Valid Until: 2024-12-31T23:59:59Z\n\
             Limit: 10"
        );
    }

    #[test]
    fn unactivated_trial_shows_no_window() {
        let text = render(&trial());
        assert!(text.contains("Run Period: 1h 30m"));
        assert!(text.contains("not yet activated"));
        assert!(!text.contains("Valid From"));
        assert!(text.ends_with("Limit: unlimited"));
    }

    #[test]
    fn activated_trial_shows_window() {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let text = render(&trial().activate(t).unwrap());
        assert!(text.contains("Run Period: 1h 30m"));
        assert!(text.contains("Valid From: 2024-06-01T08:00:00Z"));
        assert!(text.contains("Valid Until: 2024-06-01T09:30:00Z"));
        assert!(!text.contains("not yet activated"));
    }

    #[test]
    fn run_period_formatting() {
        assert_eq!(format_run_period(Duration::minutes(60)), "1h");
        assert_eq!(format_run_period(Duration::days(2) + Duration::seconds(5)), "2d 5s");
        assert_eq!(format_run_period(Duration::milliseconds(250)), "250ms");
    }
}
