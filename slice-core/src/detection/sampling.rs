//! Per-frame blade samples and sub-frame interpolation.
//!
//! Samples arrive once per rendered frame. A fast swing can cross a thin
//! target entirely between two of them, so when the tip moves more than a
//! fraction of the footprint width we insert evenly spaced samples:
//!
//! ```text
//!  last                                   current
//!   ●──────────○──────────○──────────○──────●
//!             1/4        2/4        3/4
//! ```

use crate::tuning::SamplingTuning;
use crate::types::{BladePose, BladeSample, LocalFrame};

/// Size of the synthetic sample pool.
pub const SYNTHETIC_CAPACITY: usize = 5;

/// Last-frame and current-frame samples plus a fixed synthetic pool.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    last: Option<BladeSample>,
    current: BladeSample,
    synthetic: [BladeSample; SYNTHETIC_CAPACITY],
    synthetic_len: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self {
            last: None,
            current: BladeSample::default(),
            synthetic: [BladeSample::default(); SYNTHETIC_CAPACITY],
            synthetic_len: 0,
        }
    }

    /// Record this frame's pose in target-local space.
    ///
    /// The first capture has no last sample; it is fabricated from the
    /// pose's previous pair, one default frame interval earlier.
    pub fn capture(
        &mut self,
        time: f64,
        pose: &BladePose,
        frame: &LocalFrame,
        default_frame_interval_ms: f64,
    ) {
        if self.last.is_none() {
            self.last = Some(BladeSample::new(
                frame.world_to_local(&pose.prev_tip),
                frame.world_to_local(&pose.prev_handle),
                time - default_frame_interval_ms,
            ));
        }
        self.current = BladeSample::new(
            frame.world_to_local(&pose.tip),
            frame.world_to_local(&pose.handle),
            time,
        );
        self.synthetic_len = 0;
    }

    /// Fill the synthetic pool if the tip moved more than
    /// `step_fraction * box_width`. Returns the number of samples created.
    pub fn synthesize(&mut self, box_width: f64, tuning: &SamplingTuning) -> usize {
        self.synthetic_len = 0;
        let Some(last) = self.last else {
            return 0;
        };
        let step = tuning.step_fraction * box_width;
        let swing = last.tip.distance_to(&self.current.tip);
        if !(step > 0.0) || !(swing > step) {
            return 0;
        }

        let max = tuning.max_synthetic.min(SYNTHETIC_CAPACITY);
        let count = ((swing / step).floor() as usize).min(max);
        for (i, slot) in self.synthetic[..count].iter_mut().enumerate() {
            let ratio = (i + 1) as f64 / (count + 1) as f64;
            *slot = last.lerp(&self.current, ratio);
        }
        self.synthetic_len = count;
        log::trace!("synthesized {} samples for a {:.3} m swing", count, swing);
        count
    }

    /// Samples to process this frame, in time order: synthetic then current.
    pub fn pending(&self) -> impl Iterator<Item = &BladeSample> {
        self.synthetic[..self.synthetic_len]
            .iter()
            .chain(std::iter::once(&self.current))
    }

    /// Make the current sample the last one.
    pub fn commit(&mut self) {
        self.last = Some(self.current);
        self.synthetic_len = 0;
    }

    pub fn last(&self) -> Option<&BladeSample> {
        self.last.as_ref()
    }

    pub fn current(&self) -> &BladeSample {
        &self.current
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.synthetic_len = 0;
    }
}

// =============================================================================
// Tests
// =============================================================================
