//! Routine progress tracker.
//!
//! Picks the routine that is active right now, applies step actions to its
//! progress and hands over to the next scheduled routine once it is done.
//! Every operation is a short synchronous read-compute-write against the
//! injected store; failures are logged and reported as "nothing happened".

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::repository::{
    clear_override_edit, completion_edit, override_edits, progress_edits, RoutineRepository,
};
use super::{DayProgress, Routine, StepAction};
use crate::day::EffectiveDay;
use crate::prefs::PrefStore;

/// What a widget would render for the current routine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoutineView {
    /// Nothing scheduled, or everything scheduled today is finished.
    NoRoutine,
    Step {
        routine: Routine,
        index: usize,
        text: String,
        progress: DayProgress,
    },
    /// The routine has no step left to show but is not marked finished,
    /// e.g. it has no steps at all.
    AllStepsDone {
        routine: Routine,
        progress: DayProgress,
    },
}

/// A routine was finished or abandoned and the next one selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineHandoff {
    pub finished: String,
    /// Routine now pinned for the day, `None` when nothing is left.
    pub next_routine: Option<String>,
}

/// Result of one step action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub routine_id: String,
    pub action: StepAction,
    pub step_index: usize,
    pub progress: DayProgress,
    pub handoff: Option<RoutineHandoff>,
}

impl StepOutcome {
    pub fn routine_finished(&self) -> bool {
        self.handoff.is_some()
    }
}

pub struct RoutineTracker<S: PrefStore> {
    store: S,
}

impl<S: PrefStore> RoutineTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn repo(&self) -> RoutineRepository<'_, S> {
        RoutineRepository::new(&self.store)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The routine active on `day`.
    ///
    /// A pin for the same day wins when its routine still exists.
    /// Otherwise the first routine, in declaration order, scheduled on the
    /// weekday and not yet marked completed.
    pub fn current_routine(&self, day: &EffectiveDay) -> Option<Routine> {
        let repo = self.repo();
        let routines = repo.routines();
        if routines.is_empty() {
            return None;
        }

        let date = day.date_key();
        if let Some(pin) = repo.load_override().filter(|o| o.is_valid_on(&date)) {
            match routines.iter().find(|r| r.id == pin.routine_id) {
                Some(routine) => return Some(routine.clone()),
                None => {
                    tracing::debug!(routine_id = %pin.routine_id, "override points at a missing routine")
                }
            }
        }

        routines.into_iter().find(|r| {
            !r.id.is_empty() && r.is_active_on(day.weekday) && !repo.is_completed(&r.id, day)
        })
    }

    pub fn progress(&self, routine: &Routine, day: &EffectiveDay) -> DayProgress {
        self.repo().load_progress(&routine.id, day, routine.items.len())
    }

    pub fn view(&self, day: &EffectiveDay) -> RoutineView {
        let Some(routine) = self.current_routine(day) else {
            return RoutineView::NoRoutine;
        };
        let progress = self.progress(&routine, day);
        match progress.current_step() {
            Some(index) => RoutineView::Step {
                text: routine.items[index].text.clone(),
                routine,
                index,
                progress,
            },
            None => RoutineView::AllStepsDone { routine, progress },
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn complete_step(&mut self, day: &EffectiveDay) -> Option<StepOutcome> {
        self.apply_step(StepAction::Complete, day, Utc::now())
    }

    pub fn postpone_step(&mut self, day: &EffectiveDay) -> Option<StepOutcome> {
        self.apply_step(StepAction::Postpone, day, Utc::now())
    }

    pub fn skip_step(&mut self, day: &EffectiveDay) -> Option<StepOutcome> {
        self.apply_step(StepAction::Skip, day, Utc::now())
    }

    /// Apply `action` to the current step of the current routine.
    ///
    /// The whole progress record, and the completion marker when the
    /// routine is now finished, go out in a single batch. Returns `None`
    /// when there is no routine, no step left, or the write failed.
    pub fn apply_step(
        &mut self,
        action: StepAction,
        day: &EffectiveDay,
        now: DateTime<Utc>,
    ) -> Option<StepOutcome> {
        let routine = self.current_routine(day)?;
        let mut progress = self.progress(&routine, day);

        let Some(step_index) = progress.apply_current(action, now) else {
            tracing::debug!(routine_id = %routine.id, "no step left to act on");
            return None;
        };

        let finished = progress.is_finished();
        let mut edits = progress_edits(&routine.id, day, &progress);
        if finished {
            edits.push(completion_edit(&routine.id, day));
        }
        if let Err(e) = self.store.apply(edits) {
            tracing::error!(routine_id = %routine.id, error = %e, "failed to save routine progress");
            return None;
        }

        tracing::info!(
            routine_id = %routine.id,
            ?action,
            step_index,
            next_index = progress.current_step_index,
            finished,
            "step updated"
        );

        let handoff = finished.then(|| RoutineHandoff {
            finished: routine.id.clone(),
            next_routine: self.load_next_routine(&routine.id, day),
        });

        Some(StepOutcome {
            routine_id: routine.id,
            action,
            step_index,
            progress,
            handoff,
        })
    }

    /// Abandon the current routine for the day without touching its steps.
    pub fn skip_routine(&mut self, day: &EffectiveDay) -> Option<RoutineHandoff> {
        let routine = self.current_routine(day)?;
        if let Err(e) = self.store.apply(vec![completion_edit(&routine.id, day)]) {
            tracing::error!(routine_id = %routine.id, error = %e, "failed to mark routine skipped");
            return None;
        }
        tracing::info!(routine_id = %routine.id, "routine skipped");

        let next_routine = self.load_next_routine(&routine.id, day);
        Some(RoutineHandoff {
            finished: routine.id,
            next_routine,
        })
    }

    /// Pin the next routine after `finished_id` that is scheduled on the
    /// weekday and not completed, resetting its progress for the day. When
    /// there is none the pin is cleared. Returns the pinned routine id.
    pub fn load_next_routine(&mut self, finished_id: &str, day: &EffectiveDay) -> Option<String> {
        let (next, edits) = {
            let repo = self.repo();
            let scheduled: Vec<Routine> = repo
                .routines()
                .into_iter()
                .filter(|r| !r.id.is_empty() && r.is_active_on(day.weekday))
                .collect();
            let start = scheduled
                .iter()
                .position(|r| r.id == finished_id)
                .map_or(0, |pos| pos + 1);
            let next = scheduled[start..]
                .iter()
                .find(|r| !repo.is_completed(&r.id, day))
                .map(|r| r.id.clone());
            let edits = match &next {
                Some(id) => override_edits(id, day),
                None => vec![clear_override_edit()],
            };
            (next, edits)
        };

        if let Err(e) = self.store.apply(edits) {
            tracing::error!(finished_id, error = %e, "failed to hand over to the next routine");
            return None;
        }

        match &next {
            Some(id) => tracing::info!(finished_id, next = %id, "next routine pinned"),
            None => tracing::info!(finished_id, "no routine left today, override cleared"),
        }
        next
    }
}
