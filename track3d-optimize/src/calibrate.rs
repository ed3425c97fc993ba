use crate::PlaneConstraint;
use log::{debug, info, log_enabled, warn, Level};
use std::time::Instant;
use track3d_core::{
    sync, CalibrationSettings, CameraParams, CameraSystem, Result, SyncedWindow, Track,
};

/// The outcome of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// The calibrated system, with anchored pans.
    pub system: CameraSystem,
    /// The settings the system was calibrated with.
    pub settings: CalibrationSettings,
    /// The number of iterations that ran.
    pub iterations: usize,
    /// The loss of the calibrated system over the reference window.
    pub loss: f64,
    /// The deadline expired before all iterations could run.
    pub interrupted: bool,
}

/// The state of a calibration in progress.
///
/// Every [`CalibrationSession::step`] is a pure transition from the current parameters to the
/// next ones. The session only tracks which parameters and which iteration it is at.
///
/// ```no_run
/// # use track3d_core::{CameraSystem, CalibrationSettings, SyncedWindow};
/// # use track3d_optimize::CalibrationSession;
/// # fn run(system: &CameraSystem, window: SyncedWindow) -> track3d_core::Result<()> {
/// let mut session = CalibrationSession::new(system, window, CalibrationSettings::default());
/// while !session.is_done() {
///     session.step()?;
/// }
/// let calibration = session.finish(false)?;
/// println!("loss {}", calibration.loss);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationSession<'a> {
    constraint: PlaneConstraint<'a>,
    system: CameraSystem,
    settings: CalibrationSettings,
    params: CameraParams,
    iteration: usize,
}

impl<'a> CalibrationSession<'a> {
    /// Starts a session from the parameters of `system`.
    pub fn new(
        system: &CameraSystem,
        window: SyncedWindow<'a>,
        settings: CalibrationSettings,
    ) -> Self {
        Self {
            constraint: PlaneConstraint::new(window, system.config, &settings),
            system: *system,
            settings,
            params: system.params,
            iteration: 0,
        }
    }

    pub fn constraint(&self) -> &PlaneConstraint<'a> {
        &self.constraint
    }

    /// The parameters after the iterations run so far.
    ///
    /// The pans are only anchored at the start of the next step, so they may lag behind `phi`.
    pub fn params(&self) -> CameraParams {
        self.params
    }

    /// The number of iterations run so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// All `ntrials` iterations ran.
    pub fn is_done(&self) -> bool {
        self.iteration >= self.settings.ntrials
    }

    /// The learning rate of the next step.
    pub fn learning_rate(&self) -> f64 {
        self.settings.learning_rate(self.iteration)
    }

    /// The loss of the current parameters.
    pub fn loss(&self) -> Result<f64> {
        self.constraint
            .loss(self.params)
            .map_err(|e| e.at_iteration(self.iteration))
    }

    /// Runs one iteration and returns the new parameters.
    ///
    /// Errors identify the iteration that failed, and leave the session unchanged.
    pub fn step(&mut self) -> Result<CameraParams> {
        let params = self
            .constraint
            .descend(self.params, self.learning_rate())
            .map_err(|e| e.at_iteration(self.iteration))?;
        self.params = params;
        self.iteration += 1;
        Ok(params)
    }

    /// Anchors the final parameters and reports the calibration.
    pub fn finish(self, interrupted: bool) -> Result<Calibration> {
        let iteration = self.iteration;
        let params = self
            .constraint
            .anchor(self.params)
            .map_err(|e| e.at_iteration(iteration))?;
        let loss = self
            .constraint
            .loss(params)
            .map_err(|e| e.at_iteration(iteration))?;
        Ok(Calibration {
            system: self.system.with_params(params),
            settings: self.settings,
            iterations: iteration,
            loss,
            interrupted,
        })
    }
}

/// Calibrates the orientation of both cameras of `system` on a reference window.
///
/// Exactly `settings.ntrials` iterations run, there is no convergence test. The only way to stop
/// early is the optional `deadline`, which is checked before every iteration. When it expires the
/// calibration reports the parameters reached so far and sets [`Calibration::interrupted`].
pub fn calibrate(
    system: &CameraSystem,
    window: SyncedWindow,
    settings: CalibrationSettings,
    deadline: Option<Instant>,
) -> Result<Calibration> {
    let mut session = CalibrationSession::new(system, window, settings);
    let initial = session.loss()?;
    info!(
        "calibrating on frames {} for {} iterations, initial loss {:.6}",
        window.span(),
        settings.ntrials,
        initial
    );

    let report_every = (settings.ntrials / 20).max(1);
    let mut interrupted = false;
    while !session.is_done() {
        if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            warn!(
                "calibration deadline expired after {} of {} iterations",
                session.iteration(),
                settings.ntrials
            );
            interrupted = true;
            break;
        }
        session.step()?;
        if session.iteration() % report_every == 0 && log_enabled!(Level::Debug) {
            let loss = session.loss()?;
            debug!(
                "iteration {}: loss {:.6}, learning rate {:.6}",
                session.iteration(),
                loss,
                session.learning_rate()
            );
        }
    }

    let calibration = session.finish(interrupted)?;
    info!(
        "calibrated after {} iterations, loss {:.6} (from {:.6})",
        calibration.iterations, calibration.loss, initial
    );
    Ok(calibration)
}

/// Synchronizes a reference track pair and calibrates on it.
///
/// Fails with [`track3d_core::Error::NoOverlap`] if the reference tracks share no frames.
pub fn calibrate_tracks(
    system: &CameraSystem,
    first: &Track,
    second: &Track,
    settings: CalibrationSettings,
    deadline: Option<Instant>,
) -> Result<Calibration> {
    calibrate(system, sync(first, second)?, settings, deadline)
}
