//! Read-only projection of a request's `status` onto an ordered step list.
//!
//! Nothing here changes a record. A status that is missing from the step
//! list falls back to the first step instead of failing; callers can read
//! `recognized` to see that it happened.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStep {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

const fn step(key: &'static str, label: &'static str, description: &'static str) -> StatusStep {
    StatusStep {
        key,
        label,
        description,
    }
}

/// Steps shown by the contact-search tracking page.
pub const TRACKING_STEPS: [StatusStep; 4] = [
    step("pending", "Request", "Request submitted"),
    step("acknowledged", "Acknowledged", "Request confirmed"),
    step("in_transit", "In Transit", "On the way"),
    step("delivered", "Delivered", "Completed"),
];

/// Steps shown on a blood request's own page; adds the donor pickup.
pub const BLOOD_LIFECYCLE_STEPS: [StatusStep; 5] = [
    step("pending", "Request", "Request submitted"),
    step("acknowledged", "Acknowledged", "Donor found"),
    step("pickup", "Pickup", "Blood collected from donor"),
    step("in_transit", "In Transit", "On the way"),
    step("delivered", "Delivered", "Completed"),
];

/// Which vocabulary a screen renders with. The two are kept apart on purpose
/// until the business meaning of `pickup` is settled for non-blood requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimelineView {
    Tracking,
    BloodLifecycle,
}

impl TimelineView {
    pub fn steps(&self) -> &'static [StatusStep] {
        match self {
            TimelineView::Tracking => &TRACKING_STEPS,
            TimelineView::BloodLifecycle => &BLOOD_LIFECYCLE_STEPS,
        }
    }

    pub fn project(&self, status: &str) -> Timeline {
        Timeline::project(status, *self, self.steps())
    }
}

/// Position of `status` in `steps`, or 0 when it is not listed.
pub fn step_index(status: &str, steps: &[StatusStep]) -> usize {
    steps.iter().position(|s| s.key == status).unwrap_or(0)
}

/// `index / (len - 1)`, kept inside `[0, 1]`.
pub fn progress_fraction(index: usize, steps: &[StatusStep]) -> f64 {
    if steps.len() < 2 {
        return 0.0;
    }
    let last = steps.len() - 1;
    index.min(last) as f64 / last as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TimelineStep {
    pub key: String,
    pub label: String,
    pub description: String,
    pub completed: bool,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Timeline {
    pub view: TimelineView,
    pub status: String,
    pub recognized: bool,
    pub current_index: usize,
    pub progress: f64,
    pub steps: Vec<TimelineStep>,
}

impl Timeline {
    pub fn project(status: &str, view: TimelineView, steps: &[StatusStep]) -> Self {
        let current_index = step_index(status, steps);
        let recognized = steps.iter().any(|s| s.key == status);

        Timeline {
            view,
            status: status.to_string(),
            recognized,
            current_index,
            progress: progress_fraction(current_index, steps),
            steps: steps
                .iter()
                .enumerate()
                .map(|(i, s)| TimelineStep {
                    key: s.key.to_string(),
                    label: s.label.to_string(),
                    description: s.description.to_string(),
                    completed: i <= current_index,
                    current: i == current_index,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_map_to_their_position() {
        for steps in [&TRACKING_STEPS[..], &BLOOD_LIFECYCLE_STEPS[..]] {
            for (i, s) in steps.iter().enumerate() {
                assert_eq!(step_index(s.key, steps), i);
            }
        }
    }

    #[test]
    fn unknown_status_falls_back_to_first_step() {
        assert_eq!(step_index("bananas", &TRACKING_STEPS), 0);
        // pickup only exists in the blood lifecycle vocabulary
        assert_eq!(step_index("pickup", &TRACKING_STEPS), 0);
        assert_eq!(step_index("pickup", &BLOOD_LIFECYCLE_STEPS), 2);

        let timeline = TimelineView::Tracking.project("bananas");
        assert!(!timeline.recognized);
        assert_eq!(timeline.current_index, 0);
        assert_eq!(timeline.progress, 0.0);
        let first = &timeline.steps[0];
        assert_eq!(first.label, "Request");
        assert!(first.completed && first.current);
        assert!(timeline.steps[1..].iter().all(|s| !s.completed && !s.current));
    }

    #[test]
    fn progress_runs_from_zero_to_one() {
        for steps in [&TRACKING_STEPS[..], &BLOOD_LIFECYCLE_STEPS[..]] {
            let fractions: Vec<f64> = (0..steps.len())
                .map(|i| progress_fraction(i, steps))
                .collect();
            assert_eq!(fractions[0], 0.0);
            assert_eq!(*fractions.last().unwrap(), 1.0);
            assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        }
        assert_eq!(progress_fraction(2, &BLOOD_LIFECYCLE_STEPS), 0.5);
    }

    #[test]
    fn steps_up_to_current_are_completed() {
        let timeline = TimelineView::BloodLifecycle.project("in_transit");
        assert!(timeline.recognized);
        assert_eq!(timeline.current_index, 3);
        assert_eq!(timeline.progress, 0.75);

        let completed: Vec<bool> = timeline.steps.iter().map(|s| s.completed).collect();
        assert_eq!(completed, vec![true, true, true, true, false]);
        let current: Vec<bool> = timeline.steps.iter().map(|s| s.current).collect();
        assert_eq!(current, vec![false, false, false, true, false]);
    }
}
