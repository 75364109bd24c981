//! The licence entity.
//!
//! A licence is either *fixed* (valid between two instants chosen by the
//! issuer) or a *trial* (valid for a run period starting at activation).
//! The mode is a closed enum so a licence can never be half of each.
//!
//! Trial activation happens on the verifying side, after signing. The
//! activation window is therefore not part of the signed fields, and
//! activating a trial licence never invalidates its signature.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LicenceError, LicenceResult};
use crate::identity::new_id;
use crate::logging::{log_licence_event, LicenceEvent};
use crate::signing::Signer;

/// An inclusive validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl Window {
    /// Create a window, rejecting `valid_from > valid_until`.
    pub fn new(valid_from: DateTime<Utc>, valid_until: DateTime<Utc>) -> LicenceResult<Self> {
        if valid_from > valid_until {
            return Err(LicenceError::InvalidTerms(format!(
                "valid_from ({valid_from}) is after valid_until ({valid_until})"
            )));
        }
        Ok(Self {
            valid_from,
            valid_until,
        })
    }

    /// Both ends are inclusive.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_from && now <= self.valid_until
    }

    fn outside(&self) -> LicenceError {
        LicenceError::OutsideValidityWindow {
            valid_from: self.valid_from,
            valid_until: self.valid_until,
        }
    }

    /// Fail with `OutsideValidityWindow` unless `now` is inside.
    pub(crate) fn enforce(&self, now: DateTime<Utc>) -> LicenceResult<()> {
        if self.contains(now) {
            Ok(())
        } else {
            Err(self.outside())
        }
    }
}

/// How a licence decides when it is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    /// Valid inside a window fixed at issuance.
    Fixed(Window),
    /// Valid for `run_period` from activation.
    Trial {
        run_period: Duration,
        /// Set once, by the verifying party.
        activation: Option<Window>,
    },
}

impl Validity {
    /// Create a trial validity, rejecting empty or negative run periods.
    pub fn trial(run_period: Duration) -> LicenceResult<Self> {
        if run_period <= Duration::zero() {
            return Err(LicenceError::InvalidTerms(format!(
                "run period must be positive, got {run_period}"
            )));
        }
        Ok(Validity::Trial {
            run_period,
            activation: None,
        })
    }
}

/// A software licence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Licence {
    id: String,
    validity: Validity,
    max_count: u64,
    signature: Vec<u8>,
}

impl Licence {
    /// Create an unsigned fixed-window licence with a fresh id.
    pub fn new_fixed(
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
        max_count: u64,
    ) -> LicenceResult<Self> {
        let window = Window::new(valid_from, valid_until)?;
        Ok(Self::from_parts(new_id()?, Validity::Fixed(window), max_count, Vec::new()))
    }

    /// Create an unsigned trial licence with a fresh id.
    pub fn new_trial(run_period: Duration, max_count: u64) -> LicenceResult<Self> {
        let validity = Validity::trial(run_period)?;
        Ok(Self::from_parts(new_id()?, validity, max_count, Vec::new()))
    }

    /// Issue a signed fixed-window licence.
    pub fn issue_fixed(
        signer: &Signer,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
        max_count: u64,
    ) -> LicenceResult<Self> {
        let mut licence = Self::new_fixed(valid_from, valid_until, max_count)?;
        signer.sign(&mut licence)?;
        log_licence_event(LicenceEvent::Issued, &licence.id, Some("fixed"));
        Ok(licence)
    }

    /// Issue a signed fixed-window licence valid for `days` days from `now`.
    pub fn issue_for_days(
        signer: &Signer,
        now: DateTime<Utc>,
        days: i64,
        max_count: u64,
    ) -> LicenceResult<Self> {
        if days <= 0 {
            return Err(LicenceError::InvalidTerms(
                "duration must be a positive number of days".to_string(),
            ));
        }
        let length = Duration::try_days(days).ok_or_else(|| {
            LicenceError::InvalidTerms(format!("duration of {days} days is out of range"))
        })?;
        let valid_until = now.checked_add_signed(length).ok_or_else(|| {
            LicenceError::InvalidTerms(format!("duration of {days} days is out of range"))
        })?;
        Self::issue_fixed(signer, now, valid_until, max_count)
    }

    /// Issue a signed trial licence.
    pub fn issue_trial(signer: &Signer, run_period: Duration, max_count: u64) -> LicenceResult<Self> {
        let mut licence = Self::new_trial(run_period, max_count)?;
        signer.sign(&mut licence)?;
        log_licence_event(LicenceEvent::Issued, &licence.id, Some("trial"));
        Ok(licence)
    }

    /// Assemble a licence from already-known parts.
    ///
    /// Nothing is checked here; an assembled licence is only trustworthy
    /// once a `Verifier` accepts it.
    pub fn from_parts(id: String, validity: Validity, max_count: u64, signature: Vec<u8>) -> Self {
        Self {
            id,
            validity,
            max_count,
            signature,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// Usage ceiling, zero means unlimited.
    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_count == 0
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    pub(crate) fn set_signature(&mut self, signature: Vec<u8>) {
        self.signature = signature;
    }

    pub fn is_trial(&self) -> bool {
        matches!(self.validity, Validity::Trial { .. })
    }

    /// The trial run period, `None` for fixed licences.
    pub fn run_period(&self) -> Option<Duration> {
        match self.validity {
            Validity::Fixed(_) => None,
            Validity::Trial { run_period, .. } => Some(run_period),
        }
    }

    /// The window currently in force: the fixed window, the activated trial
    /// window, or `None` for a trial that has not been activated.
    pub fn window(&self) -> Option<Window> {
        match self.validity {
            Validity::Fixed(window) => Some(window),
            Validity::Trial { activation, .. } => activation,
        }
    }

    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.window().map(|w| w.valid_from)
    }

    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.window().map(|w| w.valid_until)
    }

    /// True for trial licences whose window has been fixed.
    pub fn is_activated(&self) -> bool {
        matches!(
            self.validity,
            Validity::Trial {
                activation: Some(_),
                ..
            }
        )
    }

    /// Activate a trial licence at `now`.
    ///
    /// Fires once: a trial that already has a window, and any fixed
    /// licence, is returned unchanged.
    pub fn activate(mut self, now: DateTime<Utc>) -> LicenceResult<Self> {
        self.activate_in_place(now)?;
        Ok(self)
    }

    /// Returns true if the activation happened on this call.
    pub(crate) fn activate_in_place(&mut self, now: DateTime<Utc>) -> LicenceResult<bool> {
        let Validity::Trial {
            run_period,
            activation,
        } = &mut self.validity
        else {
            return Ok(false);
        };
        if activation.is_some() {
            return Ok(false);
        }

        let valid_until = now.checked_add_signed(*run_period).ok_or_else(|| {
            LicenceError::InvalidTerms(format!("run period {run_period} overflows from {now}"))
        })?;
        let window = Window::new(now, valid_until)?;
        *activation = Some(window);

        log_licence_event(
            LicenceEvent::Activated,
            &self.id,
            Some(&format!("valid until {valid_until}")),
        );
        Ok(true)
    }

    /// True if the licence is inside its window at `now`.
    ///
    /// An unactivated trial has no window and is never inside it. The
    /// signature is not consulted.
    pub fn check_window(&self, now: DateTime<Utc>) -> bool {
        self.window().is_some_and(|w| w.contains(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn window_is_inclusive() {
        let w = Window::new(at(2024, 1, 1), at(2024, 2, 1)).unwrap();
        assert!(w.contains(at(2024, 1, 1)));
        assert!(w.contains(at(2024, 2, 1)));
        assert!(!w.contains(at(2024, 2, 1) + Duration::nanoseconds(1)));
        assert!(!w.contains(at(2024, 1, 1) - Duration::nanoseconds(1)));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let result = Licence::new_fixed(at(2024, 2, 1), at(2024, 1, 1), 0);
        assert!(matches!(result, Err(LicenceError::InvalidTerms(_))));
    }

    #[test]
    fn empty_run_period_is_rejected() {
        assert!(Licence::new_trial(Duration::zero(), 0).is_err());
        assert!(Licence::new_trial(Duration::minutes(-5), 0).is_err());
    }

    #[test]
    fn fixed_licence_exposes_its_window() {
        let l = Licence::new_fixed(at(2024, 1, 1), at(2024, 12, 31), 10).unwrap();
        assert!(!l.is_trial());
        assert!(!l.is_signed());
        assert_eq!(l.valid_from(), Some(at(2024, 1, 1)));
        assert_eq!(l.valid_until(), Some(at(2024, 12, 31)));
        assert_eq!(l.run_period(), None);
        assert_eq!(l.max_count(), 10);
        assert!(!l.is_unlimited());
    }

    #[test]
    fn unactivated_trial_has_no_window() {
        let l = Licence::new_trial(Duration::minutes(60), 0).unwrap();
        assert!(l.is_trial());
        assert!(!l.is_activated());
        assert!(l.is_unlimited());
        assert_eq!(l.window(), None);
        assert!(!l.check_window(Utc::now()));
    }

    #[test]
    fn activation_spans_run_period() {
        let t = at(2024, 3, 1);
        let l = Licence::new_trial(Duration::minutes(60), 0)
            .unwrap()
            .activate(t)
            .unwrap();

        assert!(l.is_activated());
        assert_eq!(l.valid_from(), Some(t));
        assert_eq!(l.valid_until(), Some(t + Duration::minutes(60)));
        assert!(l.check_window(t + Duration::minutes(30)));
        assert!(!l.check_window(t + Duration::minutes(61)));
    }

    #[test]
    fn activation_fires_once() {
        let t = at(2024, 3, 1);
        let first = Licence::new_trial(Duration::minutes(60), 0)
            .unwrap()
            .activate(t)
            .unwrap();
        let second = first.clone().activate(t + Duration::days(1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn activating_fixed_licence_changes_nothing() {
        let l = Licence::new_fixed(at(2024, 1, 1), at(2024, 12, 31), 0).unwrap();
        let activated = l.clone().activate(at(2024, 6, 1)).unwrap();
        assert_eq!(l, activated);
    }

    #[test]
    fn activation_overflow_is_reported() {
        let mut l = Licence::new_trial(Duration::days(365), 0).unwrap();
        let result = l.activate_in_place(DateTime::<Utc>::MAX_UTC);
        assert!(matches!(result, Err(LicenceError::InvalidTerms(_))));
        assert!(!l.is_activated());
    }

    #[test]
    fn fresh_licences_get_distinct_ids() {
        let a = Licence::new_trial(Duration::minutes(1), 0).unwrap();
        let b = Licence::new_trial(Duration::minutes(1), 0).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(crate::identity::is_well_formed(a.id()));
    }
}
