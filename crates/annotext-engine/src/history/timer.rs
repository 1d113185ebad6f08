use std::fmt;
use std::time::{Duration, Instant};

use super::{FileState, HistoryManager};

/// Interval between automatic snapshots
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_millis(5000);

/// Reads the active file's state; `None` when no file is open
pub type StateAccessor = Box<dyn FnMut() -> Option<FileState>>;

/// What a call to [`SnapshotTimer::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer is not running
    Stopped,
    /// The next deadline has not been reached
    NotDue,
    /// The timer fired but no file was active
    NoActiveFile,
    /// The timer fired and the content matched the current snapshot
    Unchanged,
    /// The timer fired and a new snapshot was recorded
    Recorded,
}

/// Cooperative interval timer for automatic snapshots.
///
/// The timer never runs on its own: the host event loop calls [`tick`] and
/// the timer fires when its deadline has passed. Firing reads the editor state
/// through the accessor given to [`start`] and records it with
/// [`HistoryManager::record_if_changed`].
///
/// [`tick`]: SnapshotTimer::tick
/// [`start`]: SnapshotTimer::start
pub struct SnapshotTimer {
    interval: Duration,
    accessor: Option<StateAccessor>,
    next_due: Option<Instant>,
}

impl fmt::Debug for SnapshotTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotTimer")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .field("next_due", &self.next_due)
            .finish()
    }
}

impl Default for SnapshotTimer {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_INTERVAL)
    }
}

impl SnapshotTimer {
    /// A zero interval is raised to one millisecond
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accessor: None,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.accessor.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn start<F>(&mut self, accessor: F)
    where
        F: FnMut() -> Option<FileState> + 'static,
    {
        self.start_at(Instant::now(), accessor);
    }

    /// Start (or restart) the timer as if at `now`; the first snapshot is due
    /// one interval later
    pub fn start_at<F>(&mut self, now: Instant, accessor: F)
    where
        F: FnMut() -> Option<FileState> + 'static,
    {
        if self.is_running() {
            log::debug!("Restarting snapshot timer");
        } else {
            log::debug!("Starting snapshot timer every {:?}", self.interval);
        }
        self.accessor = Some(Box::new(accessor));
        self.next_due = Some(now + self.interval);
    }

    /// Stop the timer; does nothing when it is not running
    pub fn stop(&mut self) {
        if self.accessor.take().is_some() {
            log::debug!("Stopped snapshot timer");
        }
        self.next_due = None;
    }

    /// Fire if the deadline has passed.
    ///
    /// Fires at most once per call. If the host fell more than a whole interval
    /// behind, missed firings are skipped and the next deadline is one interval
    /// after `now`.
    pub fn tick(&mut self, now: Instant, history: &mut HistoryManager) -> TickOutcome {
        let Some(due) = self.next_due else {
            return TickOutcome::Stopped;
        };
        if now < due {
            return TickOutcome::NotDue;
        }

        let next = due + self.interval;
        self.next_due = Some(if next > now { next } else { now + self.interval });

        let Some(accessor) = self.accessor.as_mut() else {
            return TickOutcome::Stopped;
        };
        match accessor() {
            None => TickOutcome::NoActiveFile,
            Some(state) => {
                if history.record_if_changed(state) {
                    TickOutcome::Recorded
                } else {
                    TickOutcome::Unchanged
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{CursorPosition, ScrollPosition};
    use relative_path::{RelativePath, RelativePathBuf};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Editor stand-in whose content the test can change between ticks
    fn editor(content: &str) -> (Rc<RefCell<Option<String>>>, impl FnMut() -> Option<FileState>) {
        let shared = Rc::new(RefCell::new(Some(content.to_string())));
        let reader = Rc::clone(&shared);
        let accessor = move || {
            reader.borrow().clone().map(|content| FileState {
                file_path: RelativePathBuf::from("notes/today.md"),
                content,
                cursor: CursorPosition::default(),
                scroll: ScrollPosition::default(),
            })
        };
        (shared, accessor)
    }

    fn snapshot_count(history: &HistoryManager) -> usize {
        history
            .history(RelativePath::new("notes/today.md"))
            .map_or(0, |file| file.len())
    }

    #[test]
    fn test_default_interval_is_five_seconds() {
        assert_eq!(SnapshotTimer::default().interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_tick_before_start_is_stopped() {
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();

        assert_eq!(timer.tick(Instant::now(), &mut history), TickOutcome::Stopped);
    }

    #[test]
    fn test_fires_only_after_interval() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (_content, accessor) = editor("draft");
        timer.start_at(start, accessor);

        assert_eq!(
            timer.tick(start + Duration::from_millis(4999), &mut history),
            TickOutcome::NotDue
        );
        assert_eq!(snapshot_count(&history), 0);

        assert_eq!(
            timer.tick(start + Duration::from_millis(5000), &mut history),
            TickOutcome::Recorded
        );
        assert_eq!(snapshot_count(&history), 1);
    }

    #[test]
    fn test_idle_document_adds_no_snapshots() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (_content, accessor) = editor("unchanged");
        timer.start_at(start, accessor);

        timer.tick(start + Duration::from_secs(5), &mut history);
        let second = timer.tick(start + Duration::from_secs(10), &mut history);
        let third = timer.tick(start + Duration::from_secs(15), &mut history);

        assert_eq!(second, TickOutcome::Unchanged);
        assert_eq!(third, TickOutcome::Unchanged);
        assert_eq!(snapshot_count(&history), 1);
    }

    #[test]
    fn test_records_each_change() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (content, accessor) = editor("one");
        timer.start_at(start, accessor);

        timer.tick(start + Duration::from_secs(5), &mut history);
        *content.borrow_mut() = Some("two".to_string());
        let outcome = timer.tick(start + Duration::from_secs(10), &mut history);

        assert_eq!(outcome, TickOutcome::Recorded);
        assert_eq!(snapshot_count(&history), 2);
        assert!(history.can_undo(RelativePath::new("notes/today.md")));
    }

    #[test]
    fn test_no_active_file() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (content, accessor) = editor("one");
        *content.borrow_mut() = None;
        timer.start_at(start, accessor);

        assert_eq!(
            timer.tick(start + Duration::from_secs(5), &mut history),
            TickOutcome::NoActiveFile
        );
        assert_eq!(history.file_count(), 0);
    }

    #[test]
    fn test_fires_once_after_long_pause() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (_content, accessor) = editor("one");
        timer.start_at(start, accessor);

        let late = start + Duration::from_secs(60);
        assert_eq!(timer.tick(late, &mut history), TickOutcome::Recorded);
        assert_eq!(timer.tick(late, &mut history), TickOutcome::NotDue);
        assert_eq!(timer.next_due(), Some(late + DEFAULT_SNAPSHOT_INTERVAL));
    }

    #[test]
    fn test_stays_on_schedule_when_slightly_late() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (_content, accessor) = editor("one");
        timer.start_at(start, accessor);

        timer.tick(start + Duration::from_millis(5200), &mut history);

        assert_eq!(timer.next_due(), Some(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_stop_cancels_and_is_idempotent() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (_content, accessor) = editor("one");
        timer.start_at(start, accessor);

        timer.stop();
        timer.stop();

        assert!(!timer.is_running());
        assert_eq!(timer.next_due(), None);
        assert_eq!(
            timer.tick(start + Duration::from_secs(5), &mut history),
            TickOutcome::Stopped
        );
        assert_eq!(history.file_count(), 0);
    }

    #[test]
    fn test_restart_replaces_accessor() {
        let start = Instant::now();
        let mut timer = SnapshotTimer::default();
        let mut history = HistoryManager::new();
        let (_first, first_accessor) = editor("first");
        let (_second, second_accessor) = editor("second");

        timer.start_at(start, first_accessor);
        timer.start_at(start + Duration::from_secs(3), second_accessor);

        assert_eq!(
            timer.tick(start + Duration::from_secs(5), &mut history),
            TickOutcome::NotDue
        );
        timer.tick(start + Duration::from_secs(8), &mut history);

        let current = history
            .current_snapshot(RelativePath::new("notes/today.md"))
            .unwrap();
        assert_eq!(current.content, "second");
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        assert_eq!(
            SnapshotTimer::new(Duration::ZERO).interval(),
            Duration::from_millis(1)
        );
    }
}
