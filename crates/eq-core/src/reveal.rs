//! Staged disclosure of extracted sections.
//!
//! "Content exists" and "content is shown" are decoupled so a finished
//! answer unfolds instead of popping in all at once. While a message
//! streams, a section becomes visible the moment its tag is first
//! observed. Once the message finalizes, any section not yet shown is
//! revealed on a short stagger: reasoning first, then explanation, then
//! SQL.
//!
//! The scheduler is runtime-free: it holds plain `Instant` deadlines and
//! the event loop drives it via [`RevealScheduler::next_deadline`] and
//! [`RevealScheduler::fire_due`]. Firing order against arriving frames
//! is not guaranteed, so every deferred reveal re-checks the section's
//! presence at fire time and no-ops when already satisfied.

use crate::sections::{Section, SectionFlags, StructuredContent};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const REASONING_REVEAL_DELAY: Duration = Duration::from_millis(100);
pub const EXPLANATION_REVEAL_DELAY: Duration = Duration::from_millis(300);
pub const SQL_REVEAL_DELAY: Duration = Duration::from_millis(500);

/// Per-message, per-section visibility gate. Monotonic: once a section
/// is visible it stays visible for the life of the message.
pub type RevealState = SectionFlags;

#[derive(Debug, Clone, Copy)]
struct PendingReveal {
    due: Instant,
    message_id: Uuid,
    section: Section,
}

#[derive(Debug, Default)]
pub struct RevealScheduler {
    visible: HashMap<Uuid, RevealState>,
    pending: Vec<PendingReveal>,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current visibility for a message; all-hidden if never seen.
    pub fn visibility(&self, message_id: Uuid) -> RevealState {
        self.visible.get(&message_id).copied().unwrap_or_default()
    }

    pub fn is_visible(&self, message_id: Uuid, section: Section) -> bool {
        self.visibility(message_id).get(section)
    }

    /// Streaming mode: reveal each section the instant its partial flag
    /// is first observed. Flags only ever flip on.
    pub fn note_partial(&mut self, message_id: Uuid, partial: SectionFlags) {
        self.visible.entry(message_id).or_default().merge(partial);
    }

    /// Finalized mode: schedule the staged reveals for every non-empty
    /// section. Reveals already made in streaming mode are a no-op when
    /// they fire.
    pub fn schedule_finalized(
        &mut self,
        message_id: Uuid,
        now: Instant,
        content: &StructuredContent,
    ) {
        let stages = [
            (Section::Reasoning, REASONING_REVEAL_DELAY),
            (Section::Explanation, EXPLANATION_REVEAL_DELAY),
            (Section::Sql, SQL_REVEAL_DELAY),
        ];
        for (section, delay) in stages {
            if content.has(section) {
                self.pending.push(PendingReveal { due: now + delay, message_id, section });
            }
        }
    }

    /// Earliest pending deadline, if any. The event loop sleeps until
    /// this instant and then calls [`fire_due`](Self::fire_due).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Fires every reveal whose deadline has passed. `present` is
    /// consulted at fire time: a section whose extracted content is
    /// empty by then is dropped without becoming visible. Returns the
    /// reveals that newly flipped on.
    pub fn fire_due<F>(&mut self, now: Instant, present: F) -> Vec<(Uuid, Section)>
    where
        F: Fn(Uuid, Section) -> bool,
    {
        let mut fired = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.due > now {
                remaining.push(entry);
                continue;
            }
            if !present(entry.message_id, entry.section) {
                continue;
            }
            let flags = self.visible.entry(entry.message_id).or_default();
            if !flags.get(entry.section) {
                flags.set(entry.section, true);
                fired.push((entry.message_id, entry.section));
            }
        }
        self.pending = remaining;
        fired
    }

    /// Cancels pending reveals for one message, e.g. when its view is
    /// torn down before they fire. Already-visible sections stay as-is.
    pub fn cancel(&mut self, message_id: Uuid) {
        self.pending.retain(|p| p.message_id != message_id);
    }

    /// Drops all pending reveals and visibility state (transcript
    /// cleared).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_content() -> StructuredContent {
        StructuredContent {
            reasoning: "R".into(),
            explanation: "E".into(),
            sql: "SELECT 1".into(),
            partial: SectionFlags { reasoning: true, explanation: true, sql: true },
        }
    }

    #[test]
    fn streaming_reveal_is_immediate_on_partial_flag() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        scheduler.note_partial(id, SectionFlags { reasoning: true, ..SectionFlags::default() });
        assert!(scheduler.is_visible(id, Section::Reasoning));
        assert!(!scheduler.is_visible(id, Section::Explanation));
        assert!(!scheduler.is_visible(id, Section::Sql));
    }

    #[test]
    fn streaming_reveal_never_reverts() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        scheduler.note_partial(id, SectionFlags { reasoning: true, ..SectionFlags::default() });
        // Later extraction no longer reports the flag; visibility holds.
        scheduler.note_partial(id, SectionFlags::default());
        assert!(scheduler.is_visible(id, Section::Reasoning));
    }

    #[test]
    fn finalized_reveals_fire_in_staged_order() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        let start = Instant::now();
        scheduler.schedule_finalized(id, start, &full_content());

        assert_eq!(scheduler.next_deadline(), Some(start + REASONING_REVEAL_DELAY));

        let fired = scheduler.fire_due(start + REASONING_REVEAL_DELAY, |_, _| true);
        assert_eq!(fired, vec![(id, Section::Reasoning)]);
        assert!(!scheduler.is_visible(id, Section::Sql));

        let fired = scheduler.fire_due(start + SQL_REVEAL_DELAY, |_, _| true);
        assert_eq!(fired, vec![(id, Section::Explanation), (id, Section::Sql)]);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn empty_sections_are_never_scheduled() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        let content = StructuredContent { sql: "SELECT 1".into(), ..StructuredContent::default() };
        scheduler.schedule_finalized(id, Instant::now(), &content);
        assert_eq!(scheduler.pending.len(), 1);
    }

    #[test]
    fn fire_rechecks_presence_at_fire_time() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        let start = Instant::now();
        scheduler.schedule_finalized(id, start, &full_content());
        // Content changed underneath the timer; nothing becomes visible.
        let fired = scheduler.fire_due(start + SQL_REVEAL_DELAY, |_, _| false);
        assert!(fired.is_empty());
        assert!(!scheduler.is_visible(id, Section::Reasoning));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn deferred_reveal_is_idempotent_over_streaming_reveal() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        scheduler.note_partial(id, SectionFlags { reasoning: true, explanation: true, sql: true });
        let start = Instant::now();
        scheduler.schedule_finalized(id, start, &full_content());
        let fired = scheduler.fire_due(start + SQL_REVEAL_DELAY, |_, _| true);
        // Everything was already visible; the timers are silent no-ops.
        assert!(fired.is_empty());
        assert!(scheduler.is_visible(id, Section::Sql));
    }

    #[test]
    fn cancel_drops_pending_but_keeps_visibility() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        scheduler.note_partial(id, SectionFlags { reasoning: true, ..SectionFlags::default() });
        let start = Instant::now();
        scheduler.schedule_finalized(id, start, &full_content());
        scheduler.cancel(id);
        assert_eq!(scheduler.next_deadline(), None);
        assert!(scheduler.is_visible(id, Section::Reasoning));
    }

    #[test]
    fn reveal_is_monotonic_under_interleaving() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        let start = Instant::now();

        scheduler.note_partial(id, SectionFlags { reasoning: true, ..SectionFlags::default() });
        scheduler.schedule_finalized(id, start, &full_content());

        let mut seen_visible = false;
        for step in 0..10u64 {
            let now = start + Duration::from_millis(step * 100);
            scheduler.fire_due(now, |_, _| true);
            // A frame arriving between timer firings observes state too;
            // once visible, never hidden again.
            let visible = scheduler.is_visible(id, Section::Reasoning);
            if seen_visible {
                assert!(visible);
            }
            seen_visible |= visible;
        }
        assert!(seen_visible);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut scheduler = RevealScheduler::new();
        let id = Uuid::new_v4();
        scheduler.note_partial(id, SectionFlags { reasoning: true, ..SectionFlags::default() });
        scheduler.schedule_finalized(id, Instant::now(), &full_content());
        scheduler.clear();
        assert_eq!(scheduler.next_deadline(), None);
        assert!(!scheduler.is_visible(id, Section::Reasoning));
    }
}
