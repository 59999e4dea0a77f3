use std::fmt;

use uuid::Uuid;

use crate::event::JobSummary;
use crate::scheduler::job::Job;

/// One queued job together with its normalized weight bookkeeping.
///
/// `cumulative` is the sum of the normalized weights of every job before
/// this one in its list; `weight` is this job's own normalized
/// contribution. Within one list `cumulative` is non-decreasing and the
/// list's total span is `last.cumulative + last.weight`.
pub struct WeightedJob {
    pub id: Uuid,
    pub cumulative: f64,
    pub weight: f64,
    pub job: Box<dyn Job>,
}

impl fmt::Debug for WeightedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedJob")
            .field("id", &self.id)
            .field("cumulative", &self.cumulative)
            .field("weight", &self.weight)
            .field("job", &self.job.name())
            .finish()
    }
}

/// Ordered sequence of weighted jobs; insertion order is execution order.
#[derive(Debug, Default)]
pub struct WeightedJobList {
    entries: Vec<WeightedJob>,
}

impl WeightedJobList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of jobs, distributing `module_weight` among them in
    /// proportion to their raw weights.
    ///
    /// The batch's total raw weight is clamped to a minimum of 1.0, so a
    /// batch of all zero-weight jobs contributes nothing to the progress
    /// share rather than dividing by zero. Zero-weight jobs are typically
    /// instant no-ops and intentionally get no share. An empty batch
    /// leaves the list unchanged.
    pub fn push_batch(&mut self, module_weight: f64, jobs: Vec<Box<dyn Job>>) {
        let mut cumulative = self.span();

        let total_raw_weight: f64 = jobs.iter().map(|job| job.weight()).sum();
        let total_raw_weight = if total_raw_weight < 1.0 {
            1.0
        } else {
            total_raw_weight
        };

        for job in jobs {
            let contribution = (job.weight() / total_raw_weight) * module_weight;
            self.entries.push(WeightedJob {
                id: Uuid::new_v4(),
                cumulative,
                weight: contribution,
                job,
            });
            cumulative += contribution;
        }
    }

    /// Total normalized weight span of the list; 0.0 when empty.
    pub fn span(&self) -> f64 {
        self.entries
            .last()
            .map(|entry| entry.cumulative + entry.weight)
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WeightedJob> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut WeightedJob> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedJob> {
        self.entries.iter()
    }

    pub fn summaries(&self) -> Vec<JobSummary> {
        self.entries
            .iter()
            .map(|entry| JobSummary {
                id: entry.id,
                name: entry.job.name(),
                emergency: entry.job.is_emergency(),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::job::{JobContext, JobResult};

    struct StubJob {
        name: String,
        weight: f64,
    }

    impl StubJob {
        fn boxed(name: &str, weight: f64) -> Box<dyn Job> {
            Box::new(Self {
                name: name.to_string(),
                weight,
            })
        }
    }

    impl Job for StubJob {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn weight(&self) -> f64 {
            self.weight
        }

        fn run(&mut self, _ctx: &JobContext<'_>) -> JobResult {
            JobResult::ok()
        }
    }

    #[test]
    fn batch_contributions_sum_to_module_weight() {
        let mut list = WeightedJobList::new();
        list.push_batch(
            10.0,
            vec![
                StubJob::boxed("a", 1.0),
                StubJob::boxed("b", 1.0),
                StubJob::boxed("c", 2.0),
            ],
        );

        let total: f64 = list.iter().map(|entry| entry.weight).sum();
        assert!((total - 10.0).abs() < 1e-9);
        assert!((list.span() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut list = WeightedJobList::new();
        list.push_batch(4.0, vec![StubJob::boxed("a", 1.0)]);
        let span = list.span();

        list.push_batch(7.0, Vec::new());
        assert_eq!(list.len(), 1);
        assert_eq!(list.span(), span);
    }

    #[test]
    fn zero_weight_jobs_get_no_share() {
        let mut list = WeightedJobList::new();
        list.push_batch(5.0, vec![StubJob::boxed("noop", 0.0)]);

        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().weight, 0.0);
        assert_eq!(list.span(), 0.0);
    }

    #[test]
    fn cumulative_is_monotonic_across_batches() {
        let mut list = WeightedJobList::new();
        list.push_batch(3.0, vec![StubJob::boxed("a", 2.0), StubJob::boxed("b", 1.0)]);
        list.push_batch(6.0, vec![StubJob::boxed("c", 1.0), StubJob::boxed("d", 1.0)]);

        let mut previous_end = 0.0;
        for entry in list.iter() {
            assert!(entry.cumulative + 1e-12 >= previous_end);
            previous_end = entry.cumulative + entry.weight;
        }
        assert!((list.span() - 9.0).abs() < 1e-9);
    }
}
