//! Typestate encoding of a unit rollout.
//!
//! Each step of a rollout consumes the previous state and returns the
//! next, so a manifest can only be deployed by a rollout that has
//! registered its application owner, and a sync can only follow a
//! deployed manifest.
//!
//! ```text
//! NotStarted ─► NamespaceEnsured ─► ProjectEnsured ─► AppRegistered ─► ManifestDeployed ─► Synced
//!      └──────────────┴─────────────────┴────────────────┴──────────────────┴──► Failed
//! ```
//!
//! # Example
//!
//! ```ignore
//! let rollout = Rollout::start("demo-1-3", UnitKind::Pipeline);
//! let rollout = rollout.namespace_ensured().project_ensured(EnsureOutcome::Created);
//! // rollout.synced(1) would not compile: no manifest has been deployed
//! ```

use std::marker::PhantomData;

use chrono::Utc;

use crate::types::{EnsureOutcome, UnitKind, UnitReport, UnitState};

/// Marker trait for rollout states.
pub trait RolloutState: private::Sealed + Send + Sync {
    /// The reported state.
    fn state() -> UnitState;
}

/// States a rollout can still fail from.
pub trait InFlight: RolloutState {}

mod private {
    pub trait Sealed {}
}

/// Nothing attempted yet.
#[derive(Debug, Clone, Copy)]
pub struct NotStarted;

/// Namespace create issued.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceEnsured;

/// Project present.
#[derive(Debug, Clone, Copy)]
pub struct ProjectEnsured;

/// Application owner present.
#[derive(Debug, Clone, Copy)]
pub struct AppRegistered;

/// Manifest accepted.
#[derive(Debug, Clone, Copy)]
pub struct ManifestDeployed;

/// Sync accepted.
#[derive(Debug, Clone, Copy)]
pub struct Synced;

/// Stopped on a fatal error.
#[derive(Debug, Clone, Copy)]
pub struct Failed;

macro_rules! rollout_state {
    ($marker:ident => $state:ident) => {
        impl private::Sealed for $marker {}

        impl RolloutState for $marker {
            fn state() -> UnitState {
                UnitState::$state
            }
        }
    };
}

rollout_state!(NotStarted => NotStarted);
rollout_state!(NamespaceEnsured => NamespaceEnsured);
rollout_state!(ProjectEnsured => ProjectEnsured);
rollout_state!(AppRegistered => AppRegistered);
rollout_state!(ManifestDeployed => ManifestDeployed);
rollout_state!(Synced => Synced);
rollout_state!(Failed => Failed);

impl InFlight for NotStarted {}
impl InFlight for NamespaceEnsured {}
impl InFlight for ProjectEnsured {}
impl InFlight for AppRegistered {}
impl InFlight for ManifestDeployed {}

/// A unit rollout in state `S`.
#[derive(Debug)]
pub struct Rollout<S: RolloutState> {
    report: UnitReport,
    _state: PhantomData<S>,
}

impl<S: RolloutState> Rollout<S> {
    /// The report so far.
    #[must_use]
    pub const fn report(&self) -> &UnitReport {
        &self.report
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> UnitState {
        S::state()
    }

    fn transition<T: RolloutState>(self) -> Rollout<T> {
        self.transition_with(|_| {})
    }

    fn transition_with<T: RolloutState>(mut self, f: impl FnOnce(&mut UnitReport)) -> Rollout<T> {
        f(&mut self.report);
        self.report.state = T::state();
        self.report.states.push(T::state());
        Rollout {
            report: self.report,
            _state: PhantomData,
        }
    }
}

impl<S: InFlight> Rollout<S> {
    /// Stop on a fatal error.
    #[must_use]
    pub fn fail(self, error: String) -> Rollout<Failed> {
        self.transition_with(|report| report.error = Some(error))
    }
}

impl Rollout<NotStarted> {
    /// Begin a rollout.
    #[must_use]
    pub fn start(application_name: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            report: UnitReport::new(application_name, kind),
            _state: PhantomData,
        }
    }

    /// The namespace create succeeded.
    #[must_use]
    pub fn namespace_ensured(self) -> Rollout<NamespaceEnsured> {
        self.transition()
    }

    /// The namespace create failed. The rollout carries on and the error
    /// is kept on the report.
    #[must_use]
    pub fn namespace_unconfirmed(self, error: String) -> Rollout<NamespaceEnsured> {
        self.transition_with(|report| report.namespace_error = Some(error))
    }
}

impl Rollout<NamespaceEnsured> {
    /// The project exists.
    #[must_use]
    pub fn project_ensured(self, outcome: EnsureOutcome) -> Rollout<ProjectEnsured> {
        self.transition_with(|report| report.project = Some(outcome))
    }
}

impl Rollout<ProjectEnsured> {
    /// The application owner exists.
    #[must_use]
    pub fn app_registered(self, outcome: EnsureOutcome) -> Rollout<AppRegistered> {
        self.transition_with(|report| report.application_owner = Some(outcome))
    }
}

impl Rollout<AppRegistered> {
    /// The manifest was accepted.
    #[must_use]
    pub fn manifest_deployed(self) -> Rollout<ManifestDeployed> {
        self.transition()
    }
}

impl Rollout<ManifestDeployed> {
    /// The sync was accepted after `attempts` requests.
    #[must_use]
    pub fn synced(self, attempts: u32) -> Rollout<Synced> {
        self.transition_with(|report| report.sync_attempts = Some(attempts))
    }
}

/// A finished rollout.
#[derive(Debug)]
pub enum Finished {
    /// Synced.
    Synced(Rollout<Synced>),
    /// Failed.
    Failed(Rollout<Failed>),
}

impl From<Rollout<Synced>> for Finished {
    fn from(rollout: Rollout<Synced>) -> Self {
        Self::Synced(rollout)
    }
}

impl From<Rollout<Failed>> for Finished {
    fn from(rollout: Rollout<Failed>) -> Self {
        Self::Failed(rollout)
    }
}

impl Finished {
    /// Stamp the finish time and hand back the report.
    #[must_use]
    pub fn into_report(self) -> UnitReport {
        let mut report = match self {
            Self::Synced(rollout) => rollout.report,
            Self::Failed(rollout) => rollout.report,
        };
        report.finished_at = Some(Utc::now());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_records_every_state() {
        let rollout = Rollout::start("demo-1-3", UnitKind::Pipeline);
        assert_eq!(rollout.state(), UnitState::NotStarted);

        let synced = rollout
            .namespace_ensured()
            .project_ensured(EnsureOutcome::Created)
            .app_registered(EnsureOutcome::AlreadyExists)
            .manifest_deployed()
            .synced(2);
        assert_eq!(synced.state(), UnitState::Synced);

        let report = Finished::from(synced).into_report();
        assert_eq!(
            report.states,
            vec![
                UnitState::NotStarted,
                UnitState::NamespaceEnsured,
                UnitState::ProjectEnsured,
                UnitState::AppRegistered,
                UnitState::ManifestDeployed,
                UnitState::Synced,
            ]
        );
        assert_eq!(report.project, Some(EnsureOutcome::Created));
        assert_eq!(report.application_owner, Some(EnsureOutcome::AlreadyExists));
        assert_eq!(report.sync_attempts, Some(2));
        assert!(report.succeeded());
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn namespace_failure_is_recorded_but_not_fatal() {
        let rollout = Rollout::start("team-a-ns", UnitKind::Namespace)
            .namespace_unconfirmed("status 502".to_owned());

        assert_eq!(rollout.state(), UnitState::NamespaceEnsured);
        assert_eq!(rollout.report().namespace_error.as_deref(), Some("status 502"));
        assert!(rollout.report().error.is_none());
    }

    #[test]
    fn fail_keeps_progress() {
        let failed = Rollout::start("demo-1-champion", UnitKind::Alias)
            .namespace_ensured()
            .project_ensured(EnsureOutcome::AlreadyExists)
            .fail("create application owner failed".to_owned());

        let report = Finished::from(failed).into_report();
        assert_eq!(report.state, UnitState::Failed);
        assert_eq!(report.states.last().copied(), Some(UnitState::Failed));
        assert_eq!(report.states.len(), 4);
        assert!(!report.succeeded());
    }
}
