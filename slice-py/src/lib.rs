//! Python bindings for slice-core hit detection.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from slice_detect import SliceDetector, Vec3
//!
//! det = SliceDetector("arrow", True, (-0.25, -0.25, -0.25), (0.25, 0.25, 0.25))
//! det.set_position(0.0, 1.0, -1.0)
//!
//! for i, (tip, handle) in enumerate(blade_frames):
//!     det.update_blade(tip, handle)
//!     if det.is_hit(i * 11.1):
//!         print(det.outcome_dict())
//!         break
//! ```

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use slice_core::detection::BladeHitDetector;
use slice_core::tuning::{Tuning, TuningError, TuningLoader};
use slice_core::types::{
    Aabb, BladePose, Hand, HitOutcome, LocalFrame, Target, TargetKind, Vec3 as CoreVec3,
};

/// 3D vector for blade and target positions.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn magnitude(&self) -> f64 {
        CoreVec3::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

fn tuning_err(err: TuningError) -> PyErr {
    match err {
        TuningError::IoError(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// A loaded tuning profile.
#[pyclass(name = "Tuning")]
#[derive(Clone)]
pub struct TuningProfile {
    inner: Tuning,
}

#[pymethods]
impl TuningProfile {
    /// The built-in standard profile.
    #[staticmethod]
    fn standard() -> Self {
        Self {
            inner: Tuning::standard(),
        }
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    /// Minimum percent counted as a perfect cut.
    #[getter]
    fn perfect_percent(&self) -> f64 {
        self.inner.slice.perfect_percent
    }

    fn __repr__(&self) -> String {
        format!("Tuning({:?})", self.inner.name)
    }
}

/// Load `<directory>/<name>.yaml`.
#[pyfunction]
fn load_tuning(directory: &str, name: &str) -> PyResult<TuningProfile> {
    let inner = TuningLoader::new(directory).load(name).map_err(tuning_err)?;
    Ok(TuningProfile { inner })
}

/// Profile names available in `directory`.
#[pyfunction]
fn list_tunings(directory: &str) -> PyResult<Vec<String>> {
    TuningLoader::new(directory).list().map_err(tuning_err)
}

fn parse_kind(kind: &str) -> PyResult<TargetKind> {
    match kind {
        "arrow" => Ok(TargetKind::Arrow),
        "dot" => Ok(TargetKind::Dot),
        "mine" => Ok(TargetKind::Mine),
        other => Err(PyValueError::new_err(format!(
            "unknown target kind '{}', expected arrow, dot or mine",
            other
        ))),
    }
}

/// Slice detector for one blade against one target.
///
/// The blade pose is pushed once per frame with `update_blade`, then
/// `is_hit` advances detection to the given time in milliseconds.
#[pyclass]
pub struct SliceDetector {
    target: Target,
    detector: BladeHitDetector,
    blade: Option<BladePose>,
}

#[pymethods]
impl SliceDetector {
    /// Create a detector for a target with local bounds `min`/`max`.
    ///
    /// `good` says whether this blade is the one meant to hit the target.
    #[new]
    #[pyo3(signature = (kind, good, min, max, tuning=None))]
    fn new(
        kind: &str,
        good: bool,
        min: (f64, f64, f64),
        max: (f64, f64, f64),
        tuning: Option<PyRef<'_, TuningProfile>>,
    ) -> PyResult<Self> {
        let kind = parse_kind(kind)?;
        let bounds = Aabb::new(
            CoreVec3::new(min.0, min.1, min.2),
            CoreVec3::new(max.0, max.1, max.2),
        );
        let target = Target::new(kind, Hand::Left, bounds, LocalFrame::IDENTITY);
        let tuning = tuning.map_or_else(Tuning::standard, |t| t.inner.clone());
        Ok(Self {
            detector: BladeHitDetector::new(&target, good, &tuning),
            target,
            blade: None,
        })
    }

    /// Move the target; keeps its current roll.
    fn set_position(&mut self, x: f64, y: f64, z: f64) {
        self.target.frame.origin = CoreVec3::new(x, y, z);
    }

    /// The target's world-space origin.
    #[getter]
    fn position(&self) -> Vec3 {
        self.target.frame.origin.into()
    }

    /// Place the target at (x, y, z) rolled by `angle` radians about world Z.
    fn set_frame(&mut self, x: f64, y: f64, z: f64, angle: f64) {
        let scale = self.target.frame.scale;
        self.target.frame = LocalFrame::rolled(CoreVec3::new(x, y, z), angle).with_scale(scale);
    }

    /// Record this frame's world-space blade tip and handle.
    fn update_blade(&mut self, tip: Vec3, handle: Vec3) {
        let (tip, handle) = (tip.into(), handle.into());
        match self.blade.as_mut() {
            Some(blade) => blade.update(tip, handle),
            None => self.blade = Some(BladePose::new(tip, handle)),
        }
    }

    /// Advance to `time` (ms). Always false until a blade has been pushed.
    fn is_hit(&mut self, time: f64) -> bool {
        match self.blade {
            Some(blade) => self.detector.is_hit(time, &blade, &self.target),
            None => false,
        }
    }

    /// Current swing state: not_reaching, reaching, inside_box or hit.
    #[getter]
    fn state(&self) -> &'static str {
        self.detector.state().name()
    }

    #[getter]
    fn footprint_width(&self) -> f64 {
        self.detector.footprint().width()
    }

    /// The classification as a dict, or None before a hit.
    fn outcome_dict(&self, py: Python<'_>) -> PyResult<Option<PyObject>> {
        let Some(outcome) = self.detector.outcome() else {
            return Ok(None);
        };
        let dict = pyo3::types::PyDict::new(py);
        match outcome {
            HitOutcome::Bad { reason } => {
                dict.set_item("good", false)?;
                dict.set_item("reason", reason.as_str())?;
            }
            HitOutcome::Good(score) => {
                dict.set_item("good", true)?;
                dict.set_item("score", score.score)?;
                dict.set_item("percent", score.percent)?;
                dict.set_item("slice_ratio", score.metrics.slice_ratio)?;
                dict.set_item("angle_dot", score.metrics.angle_dot)?;
                dict.set_item("dist_from_center", score.metrics.dist_from_center)?;
                dict.set_item("slash_speed", score.metrics.slash_speed)?;
                dict.set_item("slice_ratio_score", score.sub_scores.slice_ratio)?;
                dict.set_item("angle_score", score.sub_scores.angle)?;
                dict.set_item("accuracy_score", score.sub_scores.accuracy)?;
                dict.set_item("speed_score", score.sub_scores.speed)?;
            }
        }
        Ok(Some(dict.into()))
    }

    /// Forget the swing and the blade history.
    fn reset(&mut self) {
        self.detector.reset();
        self.blade = None;
    }
}

/// Python module definition.
#[pymodule]
fn slice_detect(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<TuningProfile>()?;
    m.add_class::<SliceDetector>()?;
    m.add_function(wrap_pyfunction!(load_tuning, m)?)?;
    m.add_function(wrap_pyfunction!(list_tunings, m)?)?;
    Ok(())
}
