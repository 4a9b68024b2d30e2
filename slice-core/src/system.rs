//! Per-frame hit checking over a pool of live targets.
//!
//! Each target gets one detector per hand. Slots are recycled: despawning
//! a target frees its slot, and the next spawn resets and retargets the
//! slot's detectors instead of building new ones. Ids carry a generation so
//! a stale id never reaches the slot's new occupant.

use crate::detection::HitDetector;
use crate::tuning::Tuning;
use crate::types::{Hand, HitOutcome, Target, TargetKind};

/// Stable handle to a spawned target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId {
    index: u32,
    generation: u32,
}

impl TargetId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// A resolved target, delivered once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub target: TargetId,
    pub hand: Hand,
    pub kind: TargetKind,
    pub outcome: HitOutcome,
    /// Good hit at or above the profile's perfect threshold.
    pub perfect: bool,
    /// The hand was the one meant to hit the target. Punch contact scores
    /// as good either way.
    pub correct_hand: bool,
}

/// Receives hit events synchronously from `HitSystem::check_hits`.
pub trait HitObserver {
    fn on_hit(&mut self, event: &HitEvent);
}

impl<F> HitObserver for F
where
    F: FnMut(&HitEvent),
{
    fn on_hit(&mut self, event: &HitEvent) {
        self(event)
    }
}

#[derive(Debug)]
struct Slot<D> {
    generation: u32,
    live: bool,
    hit: bool,
    target: Target,
    detectors: [D; 2],
}

/// Owns the live targets and their detectors.
#[derive(Debug)]
pub struct HitSystem<D: HitDetector> {
    tuning: Tuning,
    slots: Vec<Slot<D>>,
    free: Vec<usize>,
    /// Scratch for `check_hits`
    due: Vec<usize>,
}

impl<D: HitDetector> HitSystem<D> {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            slots: Vec::new(),
            free: Vec::new(),
            due: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Number of live targets.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn spawn(&mut self, target: Target) -> TargetId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            for hand in Hand::ALL {
                slot.detectors[hand.index()].retarget(&target, target.is_good_for(hand));
            }
            slot.target = target;
            slot.live = true;
            slot.hit = false;
            log::trace!("reused slot {} for {} target", index, target.kind);
            return TargetId {
                index: index as u32,
                generation: slot.generation,
            };
        }

        let tuning = &self.tuning;
        let detectors = Hand::ALL.map(|hand| D::new(&target, target.is_good_for(hand), tuning));
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            live: true,
            hit: false,
            target,
            detectors,
        });
        TargetId {
            index: index as u32,
            generation: 0,
        }
    }

    /// Frees the target's slot. Returns the target, or `None` for a stale id.
    pub fn despawn(&mut self, id: TargetId) -> Option<Target> {
        let slot = self.slot_mut(id)?;
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        let target = slot.target;
        self.free.push(id.index());
        Some(target)
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.slot(id).map(|slot| &slot.target)
    }

    /// Mutable access so the timeline can move the target between frames.
    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.slot_mut(id).map(|slot| &mut slot.target)
    }

    pub fn is_hit(&self, id: TargetId) -> bool {
        self.slot(id).map_or(false, |slot| slot.hit)
    }

    /// The detector for `hand` on a target.
    pub fn detector(&self, id: TargetId, hand: Hand) -> Option<&D> {
        self.slot(id).map(|slot| &slot.detectors[hand.index()])
    }

    /// Ids of every live target, hit or not.
    pub fn ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.live)
            .map(|(index, slot)| TargetId {
                index: index as u32,
                generation: slot.generation,
            })
    }

    /// Polls the targets due for checking against both implements.
    ///
    /// A live, unresolved target is due once `time` is within the reach lead
    /// of its scheduled time. Within a lane only the earliest due target is
    /// polled, so a swing through a stack of beats resolves the front one.
    /// Hands are checked in `Hand::ALL` order and the first hit wins; the
    /// other hand's detector is not polled for that target again. Returns the
    /// number of events delivered.
    pub fn check_hits<O>(
        &mut self,
        time: f64,
        implements: [&D::Implement; 2],
        observer: &mut O,
    ) -> usize
    where
        O: HitObserver + ?Sized,
    {
        let perfect_percent = self.tuning.slice.perfect_percent;
        let mut due = std::mem::take(&mut self.due);
        self.collect_due(time, &mut due);

        let mut events = 0;
        for &index in &due {
            let slot = &mut self.slots[index];
            for hand in Hand::ALL {
                let detector = &mut slot.detectors[hand.index()];
                if !detector.is_hit(time, implements[hand.index()], &slot.target) {
                    continue;
                }
                slot.hit = true;
                if let Some(outcome) = detector.outcome().copied() {
                    let event = HitEvent {
                        target: TargetId {
                            index: index as u32,
                            generation: slot.generation,
                        },
                        hand,
                        kind: slot.target.kind,
                        perfect: outcome
                            .score()
                            .map_or(false, |score| score.is_perfect(perfect_percent)),
                        correct_hand: detector.is_good(),
                        outcome,
                    };
                    log::debug!(
                        "{:?} hand hit {} target {}: {:?}",
                        hand,
                        event.kind,
                        index,
                        event.outcome
                    );
                    observer.on_hit(&event);
                    events += 1;
                }
                break;
            }
        }

        self.due = due;
        events
    }

    /// Fills `due` with the slots to poll at `time`, in slot order.
    fn collect_due(&self, time: f64, due: &mut Vec<usize>) {
        let lead = self.tuning.reach.lead_time_ms;
        due.clear();
        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.live || slot.hit || time < slot.target.time - lead {
                continue;
            }
            let Some(lane) = slot.target.lane else {
                due.push(index);
                continue;
            };
            let front = due
                .iter_mut()
                .find(|i| self.slots[**i].target.lane == Some(lane));
            match front {
                Some(front) => {
                    if slot.target.time < self.slots[*front].target.time {
                        *front = index;
                    }
                }
                None => due.push(index),
            }
        }
    }

    fn slot(&self, id: TargetId) -> Option<&Slot<D>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.live && slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: TargetId) -> Option<&mut Slot<D>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.live && slot.generation == id.generation)
    }
}

// =============================================================================
// Tests
// =============================================================================
