/*
 * Scheduler Tunables
 *
 * The slice length and the aging threshold are shared by every domain and
 * may be changed by an operator at any time. They are held in atomics and
 * read with relaxed ordering on every evaluation, so a change reaches each
 * domain at its next tick; tasks already mid-slice are not adjusted.
 *
 * Values are in timer ticks. `for_tick_rate` derives them from the
 * millisecond defaults for a given tick frequency.
 *
 * A small sysctl-style table exposes both knobs by name so a host can wire
 * them to its own configuration surface.
 */

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU32, Ordering};

/// Default slice length in milliseconds
pub const DEFAULT_TIMESLICE_MS: u32 = 100;

/// Tick rate the tick-valued defaults are expressed at
pub const REFERENCE_HZ: u32 = 1000;

/// Default slice length in ticks at `REFERENCE_HZ`
pub const DEFAULT_TIMESLICE: u32 = DEFAULT_TIMESLICE_MS * REFERENCE_HZ / 1000;

/// Aging runs once every this many slices by default
pub const AGE_THRESHOLD_SLICES: u32 = 3;

/// Default aging threshold in ticks at `REFERENCE_HZ`
pub const DEFAULT_AGE_THRESHOLD: u32 = AGE_THRESHOLD_SLICES * DEFAULT_TIMESLICE;

/// Errors from writing a tunable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No tunable with this name
    UnknownTunable,
    /// Value is not a non-negative integer that fits in 32 bits
    InvalidValue,
    /// Value is zero; both knobs must be at least one tick
    ZeroValue,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownTunable => write!(f, "Unknown tunable"),
            ConfigError::InvalidValue => write!(f, "Invalid tunable value"),
            ConfigError::ZeroValue => write!(f, "Tunable must be at least one tick"),
        }
    }
}

/// Named knobs of the sysctl table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tunable {
    Timeslice,
    AgeThreshold,
}

impl Tunable {
    pub const ALL: [Tunable; 2] = [Tunable::Timeslice, Tunable::AgeThreshold];

    pub fn name(self) -> &'static str {
        match self {
            Tunable::Timeslice => "sched_band_rr_timeslice",
            Tunable::AgeThreshold => "sched_band_rr_age_threshold",
        }
    }
}

impl FromStr for Tunable {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Tunable::ALL
            .into_iter()
            .find(|tunable| tunable.name() == name)
            .ok_or(ConfigError::UnknownTunable)
    }
}

/// Shared, runtime-adjustable scheduling parameters
#[derive(Debug)]
pub struct SchedTunables {
    timeslice: AtomicU32,
    age_threshold: AtomicU32,
}

impl SchedTunables {
    /// Create tunables with explicit tick values
    pub fn new(timeslice: u32, age_threshold: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            timeslice: AtomicU32::new(nonzero(timeslice)?),
            age_threshold: AtomicU32::new(nonzero(age_threshold)?),
        })
    }

    /// Derive the default millisecond values for a tick rate of `hz`
    ///
    /// Slices shorter than one tick are rounded up to one tick.
    pub fn for_tick_rate(hz: u32) -> Result<Self, ConfigError> {
        let hz = nonzero(hz)?;
        let timeslice = ms_to_ticks(DEFAULT_TIMESLICE_MS, hz).max(1);
        Self::new(timeslice, timeslice.saturating_mul(AGE_THRESHOLD_SLICES))
    }

    pub fn timeslice(&self) -> u32 {
        self.timeslice.load(Ordering::Relaxed)
    }

    pub fn age_threshold(&self) -> u32 {
        self.age_threshold.load(Ordering::Relaxed)
    }

    pub fn set_timeslice(&self, ticks: u32) -> Result<(), ConfigError> {
        self.timeslice.store(nonzero(ticks)?, Ordering::Relaxed);
        log::debug!("[Tunables] timeslice = {} ticks", ticks);
        Ok(())
    }

    pub fn set_age_threshold(&self, ticks: u32) -> Result<(), ConfigError> {
        self.age_threshold.store(nonzero(ticks)?, Ordering::Relaxed);
        log::debug!("[Tunables] age_threshold = {} ticks", ticks);
        Ok(())
    }

    // ========== SYSCTL INTERFACE ==========

    /// Read a tunable by its sysctl name
    pub fn read(&self, name: &str) -> Option<u32> {
        match name.parse().ok()? {
            Tunable::Timeslice => Some(self.timeslice()),
            Tunable::AgeThreshold => Some(self.age_threshold()),
        }
    }

    /// Write a tunable by its sysctl name from its textual value
    pub fn write(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        let result = name.parse::<Tunable>().and_then(|tunable| {
            let ticks = value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue)?;
            match tunable {
                Tunable::Timeslice => self.set_timeslice(ticks),
                Tunable::AgeThreshold => self.set_age_threshold(ticks),
            }
        });

        if let Err(err) = result {
            log::warn!("[Tunables] rejected write {}={:?}: {}", name, value, err);
        }
        result
    }
}

impl Default for SchedTunables {
    fn default() -> Self {
        Self {
            timeslice: AtomicU32::new(DEFAULT_TIMESLICE),
            age_threshold: AtomicU32::new(DEFAULT_AGE_THRESHOLD),
        }
    }
}

/// Behaviour of the switched-to hook when a task enters the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchInPolicy {
    /// Evaluate preemption exactly like a newly runnable task
    #[default]
    Preempt,
    /// Never preempt; the newcomer waits for the next natural switch
    Passive,
}

/// Convert milliseconds to ticks at `hz`, rounding down
pub fn ms_to_ticks(ms: u32, hz: u32) -> u32 {
    (u64::from(ms) * u64::from(hz) / 1000).min(u64::from(u32::MAX)) as u32
}

fn nonzero(value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroValue)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        let tunables = SchedTunables::default();
        assert_eq!(tunables.timeslice(), 100);
        assert_eq!(tunables.age_threshold(), 300);
    }

    #[test]
    fn test_for_tick_rate() {
        let t = SchedTunables::for_tick_rate(250).unwrap();
        assert_eq!(t.timeslice(), 25);
        assert_eq!(t.age_threshold(), 75);

        let slow = SchedTunables::for_tick_rate(5).unwrap();
        assert_eq!(slow.timeslice(), 1);
        assert_eq!(slow.age_threshold(), 3);

        assert_eq!(SchedTunables::for_tick_rate(0).unwrap_err(), ConfigError::ZeroValue);
    }

    #[test]
    fn test_sysctl_read_write() {
        let t = SchedTunables::default();
        assert_eq!(t.read("sched_band_rr_timeslice"), Some(100));
        assert_eq!(t.read("sched_rt_period_us"), None);

        t.write("sched_band_rr_timeslice", "40\n").unwrap();
        t.write("sched_band_rr_age_threshold", "120").unwrap();
        assert_eq!(t.timeslice(), 40);
        assert_eq!(t.read("sched_band_rr_age_threshold"), Some(120));
    }

    #[test]
    fn test_sysctl_rejects_bad_writes() {
        let t = SchedTunables::default();
        assert_eq!(t.write("nope", "1"), Err(ConfigError::UnknownTunable));
        assert_eq!(
            t.write("sched_band_rr_timeslice", "-3"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            t.write("sched_band_rr_age_threshold", "0"),
            Err(ConfigError::ZeroValue)
        );
        assert_eq!(t.timeslice(), DEFAULT_TIMESLICE);
        assert_eq!(t.age_threshold(), DEFAULT_AGE_THRESHOLD);
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(SchedTunables::new(0, 10).is_err());
        assert!(SchedTunables::new(10, 0).is_err());
    }
}
