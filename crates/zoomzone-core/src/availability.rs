//! Reconciling candidate slots against occupied intervals.
//!
//! [`is_busy`] is shared by slot display and by the pre-booking recheck, so
//! a slot shown as free is exactly a slot the booking path accepts.

use crate::slots::Slot;
use crate::time::TimeInterval;

/// Returns true if `candidate` overlaps any busy interval.
pub fn is_busy(candidate: &TimeInterval, busy: &[TimeInterval]) -> bool {
    first_conflict(candidate, busy).is_some()
}

/// The first busy interval overlapping `candidate`, if any.
pub fn first_conflict<'a>(
    candidate: &TimeInterval,
    busy: &'a [TimeInterval],
) -> Option<&'a TimeInterval> {
    busy.iter().find(|b| candidate.overlaps(b))
}

/// Annotates each slot with its busy flag, preserving order.
///
/// The flag is recomputed from scratch, so reconciling twice with the same
/// inputs gives the same result.
pub fn reconcile(slots: Vec<Slot>, busy: &[TimeInterval]) -> Vec<Slot> {
    slots
        .into_iter()
        .map(|mut slot| {
            slot.is_busy = is_busy(&slot.interval(), busy);
            slot
        })
        .collect()
}
