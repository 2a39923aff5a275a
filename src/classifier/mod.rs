//! Motor ON/OFF classifier
//!
//! A two-state debounce machine over the vibration magnitude. Reporting ON
//! needs the magnitude above the calibrated threshold for `on_debounce`;
//! reporting OFF needs it at or below for `off_debounce`. While ON, the
//! runtime counter advances by one per tick.
//!
//! The classifier never reads a clock: every `tick` receives `now`, so the
//! whole machine is driven deterministically in tests.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::ClassifierConfig;
use crate::types::{CalibrationProfile, VibrationMagnitude};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorPhase {
    Off,
    On,
}

impl std::fmt::Display for MotorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
        }
    }
}

/// Debounce state. Mutated only by [`VibrationClassifier::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct MotorState {
    pub phase: MotorPhase,
    /// Start of the current above-threshold streak
    pub on_candidate_since: Option<Instant>,
    /// Start of the current at-or-below-threshold streak
    pub off_candidate_since: Option<Instant>,
    /// Total seconds the motor has been ON, persisted across restarts
    pub accumulated_seconds: u64,
}

impl MotorState {
    pub fn new(accumulated_seconds: u64) -> Self {
        Self {
            phase: MotorPhase::Off,
            on_candidate_since: None,
            off_candidate_since: None,
            accumulated_seconds,
        }
    }

    pub fn is_on(&self) -> bool {
        self.phase == MotorPhase::On
    }
}

// ============================================================================
// Tick Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    TurnedOn,
    TurnedOff,
}

/// Why the caller should write the runtime counter now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistReason {
    TurnedOff,
    Checkpoint,
}

impl PersistReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TurnedOff => "turned_off",
            Self::Checkpoint => "checkpoint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub transition: Option<Transition>,
    pub persist: Option<PersistReason>,
    pub accumulated_seconds: u64,
}

// ============================================================================
// Classifier
// ============================================================================

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub on_debounce: Duration,
    pub off_debounce: Duration,
    pub checkpoint_interval: Duration,
}

impl ClassifierSettings {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            on_debounce: Duration::from_secs(config.on_debounce_secs),
            off_debounce: Duration::from_secs(config.off_debounce_secs),
            checkpoint_interval: Duration::from_secs(config.checkpoint_interval_secs),
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

pub struct VibrationClassifier {
    profile: CalibrationProfile,
    settings: ClassifierSettings,
    state: MotorState,
    last_checkpoint: Instant,
}

impl VibrationClassifier {
    /// Start OFF with a previously persisted runtime. The checkpoint timer
    /// starts at `now`.
    pub fn new(
        profile: CalibrationProfile,
        settings: ClassifierSettings,
        accumulated_seconds: u64,
        now: Instant,
    ) -> Self {
        Self {
            profile,
            settings,
            state: MotorState::new(accumulated_seconds),
            last_checkpoint: now,
        }
    }

    pub fn state(&self) -> &MotorState {
        &self.state
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Advance the machine by one tick.
    pub fn tick(&mut self, magnitude: VibrationMagnitude, now: Instant) -> TickOutcome {
        let mut transition = None;
        let mut persist = None;
        let m = magnitude.value();

        if m > self.profile.threshold {
            self.state.off_candidate_since = None;
            let since = *self.state.on_candidate_since.get_or_insert(now);
            if !self.state.is_on() && now.saturating_duration_since(since) >= self.settings.on_debounce {
                self.state.phase = MotorPhase::On;
                transition = Some(Transition::TurnedOn);
                info!(
                    magnitude = format!("{:.2}", m),
                    threshold = format!("{:.2}", self.profile.threshold),
                    "Motor ON"
                );
            }
        } else {
            self.state.on_candidate_since = None;
            let since = *self.state.off_candidate_since.get_or_insert(now);
            if self.state.is_on() && now.saturating_duration_since(since) >= self.settings.off_debounce {
                self.state.phase = MotorPhase::Off;
                transition = Some(Transition::TurnedOff);
                persist = Some(PersistReason::TurnedOff);
                info!(
                    magnitude = format!("{:.2}", m),
                    threshold = format!("{:.2}", self.profile.threshold),
                    runtime_secs = self.state.accumulated_seconds,
                    "Motor OFF"
                );
            }
        }

        if self.state.is_on() {
            self.state.accumulated_seconds += 1;
        }

        if now.saturating_duration_since(self.last_checkpoint) >= self.settings.checkpoint_interval {
            self.last_checkpoint = now;
            if self.state.is_on() && persist.is_none() {
                persist = Some(PersistReason::Checkpoint);
            }
        }

        TickOutcome {
            transition,
            persist,
            accumulated_seconds: self.state.accumulated_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    const THRESHOLD: f64 = 1.0;

    fn high() -> VibrationMagnitude {
        VibrationMagnitude::from_axes(2.0, 0.0, 0.0)
    }

    fn low() -> VibrationMagnitude {
        VibrationMagnitude::from_axes(0.1, 0.0, 0.0)
    }

    fn classifier(accumulated: u64) -> (VibrationClassifier, Instant) {
        let t0 = Instant::now();
        let profile = CalibrationProfile {
            noise_floor: 0.25,
            threshold: THRESHOLD,
        };
        (
            VibrationClassifier::new(profile, ClassifierSettings::default(), accumulated, t0),
            t0,
        )
    }

    fn at(t0: Instant, secs: u64) -> Instant {
        t0 + Duration::from_secs(secs)
    }

    /// Drive to ON with ticks at t = 0..=3 and return the next free second.
    fn turn_on(c: &mut VibrationClassifier, t0: Instant) -> u64 {
        for s in 0..=3 {
            c.tick(high(), at(t0, s));
        }
        assert!(c.state().is_on());
        4
    }

    #[test]
    fn test_short_burst_stays_off() {
        let (mut c, t0) = classifier(0);
        for s in 0..3 {
            let out = c.tick(high(), at(t0, s));
            assert_eq!(out.transition, None);
        }
        for s in 3..20 {
            c.tick(low(), at(t0, s));
        }
        assert!(!c.state().is_on());
        assert_eq!(c.state().accumulated_seconds, 0);
    }

    #[test]
    fn test_turns_on_exactly_at_debounce() {
        let (mut c, t0) = classifier(0);
        assert_eq!(c.tick(high(), at(t0, 0)).transition, None);
        assert_eq!(c.tick(high(), at(t0, 1)).transition, None);
        assert_eq!(c.tick(high(), at(t0, 2)).transition, None);
        let out = c.tick(high(), at(t0, 3));
        assert_eq!(out.transition, Some(Transition::TurnedOn));
        assert_eq!(out.persist, None);
        // The ON tick itself counts
        assert_eq!(out.accumulated_seconds, 1);
    }

    #[test]
    fn test_dip_resets_on_candidate() {
        let (mut c, t0) = classifier(0);
        c.tick(high(), at(t0, 0));
        c.tick(high(), at(t0, 1));
        c.tick(high(), at(t0, 2));
        c.tick(low(), at(t0, 3));
        c.tick(high(), at(t0, 4));
        c.tick(high(), at(t0, 6));
        assert!(!c.state().is_on());
        assert_eq!(c.tick(high(), at(t0, 7)).transition, Some(Transition::TurnedOn));
    }

    #[test]
    fn test_turns_off_after_debounce_with_persist() {
        let (mut c, t0) = classifier(100);
        let s = turn_on(&mut c, t0);
        let before = c.state().accumulated_seconds;
        assert_eq!(before, 101);

        // Quiet from s; OFF needs 5 s of evidence
        for k in 0..5 {
            let out = c.tick(low(), at(t0, s + k));
            assert_eq!(out.transition, None, "premature OFF at +{k}s");
            assert_eq!(out.persist, None);
        }
        let out = c.tick(low(), at(t0, s + 5));
        assert_eq!(out.transition, Some(Transition::TurnedOff));
        assert_eq!(out.persist, Some(PersistReason::TurnedOff));
        // Counted during the five debounce ticks, not on the OFF tick
        assert_eq!(out.accumulated_seconds, before + 5);
    }

    #[test]
    fn test_runtime_frozen_while_off_and_counts_while_on() {
        let (mut c, t0) = classifier(7);
        let mut rng = StdRng::seed_from_u64(42);
        let mut prev = c.state().accumulated_seconds;

        for s in 0..2_000 {
            let m = if rng.gen_bool(0.6) { high() } else { low() };
            let out = c.tick(m, at(t0, s));
            let expected = if c.state().is_on() { prev + 1 } else { prev };
            assert_eq!(out.accumulated_seconds, expected, "tick {s}");
            prev = out.accumulated_seconds;
        }
    }

    #[test]
    fn test_checkpoint_every_interval_while_on() {
        let (mut c, t0) = classifier(0);
        let start = turn_on(&mut c, t0);
        let mut checkpoints = Vec::new();
        for s in start..=1_000 {
            if let Some(PersistReason::Checkpoint) = c.tick(high(), at(t0, s)).persist {
                checkpoints.push(s);
            }
        }
        assert_eq!(checkpoints, vec![300, 600, 900]);
    }

    #[test]
    fn test_no_checkpoint_while_off() {
        let (mut c, t0) = classifier(0);
        for s in 0..=1_000 {
            assert_eq!(c.tick(low(), at(t0, s)).persist, None);
        }
    }
}
