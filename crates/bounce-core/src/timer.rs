//! Per-component wall-clock accounting.

use std::time::{Duration, Instant};

/// Accumulates wall-clock time per task slot.
///
/// At most one task is active at any instant; starting a task stops the
/// currently active one and folds its elapsed time into its slot. The engine
/// reserves the last slot for itself and gives each plugin its index.
#[derive(Debug)]
pub struct TaskTimer {
    totals: Vec<Duration>,
    active: Option<(usize, Instant)>,
}

impl TaskTimer {
    pub fn new(num_tasks: usize) -> Self {
        Self {
            totals: vec![Duration::ZERO; num_tasks],
            active: None,
        }
    }

    #[inline]
    pub fn num_tasks(&self) -> usize {
        self.totals.len()
    }

    /// Switch timing to `task`. Starting the task that is already active is
    /// a no-op.
    pub fn start(&mut self, task: usize) {
        debug_assert!(task < self.totals.len());
        if let Some((active, _)) = self.active {
            if active == task {
                return;
            }
        }
        self.stop();
        self.active = Some((task, Instant::now()));
    }

    /// Stop the active task, accumulating its elapsed time.
    pub fn stop(&mut self) {
        if let Some((task, started)) = self.active.take() {
            self.totals[task] += started.elapsed();
        }
    }

    pub fn total(&self, task: usize) -> Duration {
        self.totals[task]
    }

    pub fn totals(&self) -> &[Duration] {
        &self.totals
    }

    /// Sum of every slot.
    pub fn total_all(&self) -> Duration {
        self.totals.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_only_one_task_active() {
        let mut timer = TaskTimer::new(2);
        timer.start(0);
        sleep(Duration::from_millis(2));
        // Starting task 1 implicitly stops task 0.
        timer.start(1);
        sleep(Duration::from_millis(2));
        timer.stop();

        assert!(timer.total(0) > Duration::ZERO);
        assert!(timer.total(1) > Duration::ZERO);
    }

    #[test]
    fn test_restart_same_task_is_noop() {
        let mut timer = TaskTimer::new(1);
        timer.start(0);
        sleep(Duration::from_millis(2));
        timer.start(0);
        sleep(Duration::from_millis(2));
        timer.stop();

        // The second start must not have reset the running measurement.
        assert!(timer.total(0) >= Duration::from_millis(4));
    }

    #[test]
    fn test_stop_without_start() {
        let mut timer = TaskTimer::new(1);
        timer.stop();
        assert_eq!(timer.total(0), Duration::ZERO);
    }

    #[test]
    fn test_totals_bounded_by_wall_clock() {
        let begin = Instant::now();
        let mut timer = TaskTimer::new(3);
        for task in 0..3 {
            timer.start(task);
            sleep(Duration::from_millis(1));
        }
        timer.stop();
        assert!(timer.total_all() <= begin.elapsed());
    }
}
