//! Tuning profiles.
//!
//! Every leniency factor, threshold and point budget used by detection and
//! scoring lives here. Profiles are YAML files so tuning can change without
//! recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! tuning/
//! ├── standard.yaml
//! └── forgiving.yaml
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::SYNTHETIC_CAPACITY;
use crate::types::constants;

/// Error type for tuning operations.
#[derive(Debug)]
pub enum TuningError {
    IoError(std::io::Error),
    ParseError(serde_yaml::Error),
    NotFound(String),
    Invalid(String),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::IoError(e) => write!(f, "IO error: {}", e),
            TuningError::ParseError(e) => write!(f, "YAML parse error: {}", e),
            TuningError::NotFound(name) => write!(f, "Tuning profile not found: {}", name),
            TuningError::Invalid(msg) => write!(f, "Invalid tuning: {}", msg),
        }
    }
}

impl std::error::Error for TuningError {}

impl From<std::io::Error> for TuningError {
    fn from(err: std::io::Error) -> Self {
        TuningError::IoError(err)
    }
}

impl From<serde_yaml::Error> for TuningError {
    fn from(err: serde_yaml::Error) -> Self {
        TuningError::ParseError(err)
    }
}

// =============================================================================
// Tuning Sections
// =============================================================================

/// How forgiving the sensing geometry is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leniency {
    /// Tip pushed outward by this many blade lengths
    pub tip_extension: f64,
    /// Handle pulled back by this many blade lengths
    pub handle_extension: f64,
    /// Footprint scale about the target origin
    pub box_scaling: f64,
}

impl Leniency {
    /// Correct implement: easier to hit.
    pub fn good() -> Self {
        Self {
            tip_extension: 0.5,
            handle_extension: 0.25,
            box_scaling: 1.2,
        }
    }

    /// Wrong implement or mine: close to the visual size.
    pub fn bad() -> Self {
        Self {
            tip_extension: 0.1,
            handle_extension: 0.1,
            box_scaling: 1.02,
        }
    }
}

/// Sub-frame interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingTuning {
    /// Synthesize samples once the tip moves more than this fraction of the
    /// box width between frames.
    pub step_fraction: f64,
    /// Upper bound on synthetic samples per frame
    pub max_synthetic: usize,
    /// Used to fabricate a previous sample on the first frame
    pub default_frame_interval_ms: f64,
}

impl Default for SamplingTuning {
    fn default() -> Self {
        Self {
            step_fraction: 0.3,
            max_synthetic: SYNTHETIC_CAPACITY,
            default_frame_interval_ms: constants::DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

/// A clamped linear band: `from` earns nothing, `to` earns `points`.
///
/// `from > to` is allowed for factors where smaller is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub from: f64,
    pub to: f64,
    pub points: f64,
}

impl ScoreBand {
    pub const fn new(from: f64, to: f64, points: f64) -> Self {
        Self { from, to, points }
    }

    pub fn award(&self, value: f64) -> f64 {
        crate::scoring::clamp_and_remap(value, self.from, self.to, 0.0, self.points)
    }
}

/// Slice scoring: hard floors and point bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceScoring {
    /// Awarded for any valid slice
    pub base_score: f64,
    /// Total is capped here; percent is relative to it
    pub max_score: f64,
    /// Percent at or above which a cut counts as perfect
    pub perfect_percent: f64,
    pub min_slice_ratio: f64,
    pub min_angle_dot: f64,
    pub slice_ratio: ScoreBand,
    pub angle: ScoreBand,
    pub accuracy: ScoreBand,
    pub speed: ScoreBand,
}

impl Default for SliceScoring {
    fn default() -> Self {
        Self {
            base_score: 100.0,
            max_score: 250.0,
            perfect_percent: 98.0,
            min_slice_ratio: 0.2,
            // ~51 degrees off the cut axis
            min_angle_dot: 0.625,
            slice_ratio: ScoreBand::new(0.5, 1.0, 80.0),
            angle: ScoreBand::new(0.75, 0.97, 20.0),
            accuracy: ScoreBand::new(0.25, 0.095, 50.0),
            speed: ScoreBand::new(5.0, 15.0, 50.0),
        }
    }
}

/// Punch mode scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PunchScoring {
    /// Awarded for any contact
    pub base_score: f64,
    /// Speed at which the slow band tops out
    pub super_speed: f64,
    /// Speed at which the fast band tops out
    pub max_speed: f64,
    pub slow_points: f64,
    pub fast_points: f64,
}

impl PunchScoring {
    pub fn max_score(&self) -> f64 {
        self.base_score + self.fast_points
    }
}

impl Default for PunchScoring {
    fn default() -> Self {
        Self {
            base_score: 60.0,
            super_speed: 1.5,
            max_speed: 6.0,
            slow_points: 40.0,
            fast_points: 70.0,
        }
    }
}

/// When pooled targets become checkable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachTuning {
    /// A target is polled from this long before its scheduled time
    pub lead_time_ms: f64,
}

impl Default for ReachTuning {
    fn default() -> Self {
        Self {
            lead_time_ms: 400.0,
        }
    }
}

/// Complete tuning profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub name: String,
    pub good: Leniency,
    pub bad: Leniency,
    #[serde(default)]
    pub sampling: SamplingTuning,
    #[serde(default)]
    pub slice: SliceScoring,
    #[serde(default)]
    pub punch: PunchScoring,
    #[serde(default)]
    pub reach: ReachTuning,
}

impl Tuning {
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            good: Leniency::good(),
            bad: Leniency::bad(),
            sampling: SamplingTuning::default(),
            slice: SliceScoring::default(),
            punch: PunchScoring::default(),
            reach: ReachTuning::default(),
        }
    }

    pub fn leniency(&self, is_good: bool) -> Leniency {
        if is_good {
            self.good
        } else {
            self.bad
        }
    }

    /// Checks the values detection relies on.
    pub fn validate(&self) -> Result<(), TuningError> {
        for (label, l) in [("good", &self.good), ("bad", &self.bad)] {
            if !(l.box_scaling > 0.0) {
                return Err(TuningError::Invalid(format!(
                    "{} box_scaling must be positive, got {}",
                    label, l.box_scaling
                )));
            }
            if l.tip_extension < 0.0 || l.handle_extension < 0.0 {
                return Err(TuningError::Invalid(format!(
                    "{} extensions must not be negative",
                    label
                )));
            }
        }
        if self.sampling.max_synthetic > SYNTHETIC_CAPACITY {
            return Err(TuningError::Invalid(format!(
                "max_synthetic {} exceeds capacity {}",
                self.sampling.max_synthetic, SYNTHETIC_CAPACITY
            )));
        }
        if !(self.sampling.step_fraction > 0.0) {
            return Err(TuningError::Invalid("step_fraction must be positive".into()));
        }
        if !(self.sampling.default_frame_interval_ms > 0.0) {
            return Err(TuningError::Invalid(
                "default_frame_interval_ms must be positive".into(),
            ));
        }
        let slice = &self.slice;
        if !(slice.max_score > 0.0) {
            return Err(TuningError::Invalid("max_score must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&slice.min_angle_dot) {
            return Err(TuningError::Invalid(format!(
                "min_angle_dot must be a cosine, got {}",
                slice.min_angle_dot
            )));
        }
        for (label, band) in [
            ("slice_ratio", &slice.slice_ratio),
            ("angle", &slice.angle),
            ("accuracy", &slice.accuracy),
            ("speed", &slice.speed),
        ] {
            if band.from == band.to {
                return Err(TuningError::Invalid(format!("{} band is empty", label)));
            }
        }
        let punch = &self.punch;
        if !(punch.super_speed > 0.0) || !(punch.max_speed > punch.super_speed) {
            return Err(TuningError::Invalid(
                "punch speeds must satisfy 0 < super_speed < max_speed".into(),
            ));
        }
        if !(self.reach.lead_time_ms >= 0.0) {
            return Err(TuningError::Invalid(format!(
                "lead_time_ms must not be negative, got {}",
                self.reach.lead_time_ms
            )));
        }
        Ok(())
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Tuning loader with configurable base directory.
pub struct TuningLoader {
    base_path: PathBuf,
}

impl TuningLoader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load and validate a profile by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = TuningLoader::new("tuning");
    /// let tuning = loader.load("forgiving")?;
    /// ```
    pub fn load(&self, name: &str) -> Result<Tuning, TuningError> {
        let path = self.base_path.join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(TuningError::NotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        let tuning = Self::parse(&contents)?;
        log::debug!("loaded tuning profile '{}' from {}", tuning.name, path.display());
        Ok(tuning)
    }

    /// Parse and validate a profile from YAML text.
    pub fn parse(contents: &str) -> Result<Tuning, TuningError> {
        let tuning: Tuning = serde_yaml::from_str(contents)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// List available profile names, sorted.
    pub fn list(&self) -> Result<Vec<String>, TuningError> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if name.ends_with(".yaml") {
                names.push(name.trim_end_matches(".yaml").to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================
