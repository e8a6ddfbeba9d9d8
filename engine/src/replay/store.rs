
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::distributions::WeightedIndex;
use rand::distributions::Distribution;

use utils::{Serialize, Deserialize};

use super::config::Config as ReplayConfig;
use super::trajectory::UnrollSample;

///
/// The serializable part of the replay store, used to persist and restore
/// accumulated experience across runs.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayState
{
    pub entries: Vec<Option<UnrollSample>>,
    pub priorities: Vec<f32>,
    pub write_index: usize,
    pub size: usize,
    pub num_added: usize
}

///
/// A fixed-capacity, priority-weighted store of training samples.
///
/// Priorities bias sampling, never retention: insertion beyond capacity
/// always evicts the oldest entry, ring-buffer style. The store itself is
/// not synchronized; the pipeline wraps it in a single mutex, which is all
/// its single-producer/single-consumer usage needs.
///
pub struct PrioritizedReplay
{
    capacity: usize,
    priority_exponent: f32,
    importance_sampling_exponent: f32,

    entries: Vec<Option<UnrollSample>>,
    priorities: Vec<f32>,
    write_index: usize,
    size: usize,
    num_added: usize,

    rng: StdRng
}

impl PrioritizedReplay
{
    pub fn new (config: & ReplayConfig, seed: u64) -> PrioritizedReplay
    {
        let capacity = config.capacity.max(1);

        PrioritizedReplay
        {
            capacity,
            priority_exponent: config.priority_exponent,
            importance_sampling_exponent: config.importance_sampling_exponent,

            entries: vec![None; capacity],
            priorities: vec![0.0; capacity],
            write_index: 0,
            size: 0,
            num_added: 0,

            rng: StdRng::seed_from_u64(seed)
        }
    }

    ///
    /// Inserts a sample with the given priority, evicting the oldest
    /// entry once the store is full.
    ///
    pub fn add (& mut self, sample: UnrollSample, priority: f32)
    {
        self.entries[self.write_index] = Some(sample);
        self.priorities[self.write_index] = priority.max(f32::EPSILON);

        self.write_index = (self.write_index + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
        self.num_added += 1;
    }

    ///
    /// Draws a batch with probability proportional to
    /// `priority ^ priority_exponent`, returning the sampled slots, the
    /// samples themselves and their importance weights (normalized so the
    /// largest weight in the batch is one).
    ///
    pub fn sample (& mut self, batch_size: usize) -> (Vec<usize>, Vec<UnrollSample>, Vec<f32>)
    {
        if self.size == 0 || batch_size == 0
        {
            return (Vec::new(), Vec::new(), Vec::new());
        }

        let scaled : Vec<f32> = self.priorities[.. self.size].iter()
            .map(|p| p.powf(self.priority_exponent))
            .collect();
        let total : f32 = scaled.iter().sum();

        let indices : Vec<usize> = match WeightedIndex::new(& scaled)
        {
            Ok(distribution) => (0 .. batch_size).map(|_| distribution.sample(& mut self.rng)).collect(),
            Err(_)           => (0 .. batch_size).map(|_| self.rng.gen_range(0 .. self.size)).collect()
        };

        let mut weights : Vec<f32> = indices.iter()
            .map(|& i| {
                let probability = match total > 0.0 { true => scaled[i] / total, false => 1.0 / self.size as f32 };
                (1.0 / (self.size as f32 * probability)).powf(self.importance_sampling_exponent)
            })
            .collect();

        let max_weight = weights.iter().cloned().fold(f32::MIN, f32::max);
        if max_weight > 0.0
        {
            weights.iter_mut().for_each(|w| * w /= max_weight);
        }

        let samples = indices.iter()
            .map(|& i| self.entries[i].clone().unwrap_or_else(|| unreachable!("slot {} inside size is empty", i)))
            .collect();

        (indices, samples, weights)
    }

    ///
    /// Replaces the priorities of previously sampled slots, the feedback
    /// path the learner uses after computing fresh value errors.
    ///
    pub fn update_priorities (& mut self, indices: & [usize], priorities: & [f32])
    {
        for (& index, & priority) in indices.iter().zip(priorities)
        {
            if index < self.size
            {
                self.priorities[index] = priority.max(f32::EPSILON);
            }
        }
    }

    pub fn size (& self) -> usize
    {
        self.size
    }

    ///
    /// The total number of insertions over the store's lifetime, which
    /// keeps counting past capacity.
    ///
    pub fn num_added (& self) -> usize
    {
        self.num_added
    }

    pub fn reset (& mut self)
    {
        self.entries = vec![None; self.capacity];
        self.priorities = vec![0.0; self.capacity];
        self.write_index = 0;
        self.size = 0;
        self.num_added = 0;
    }

    ///
    /// Snapshots buffer contents and priority bookkeeping for persistence.
    ///
    pub fn get_state (& self) -> ReplayState
    {
        ReplayState
        {
            entries: self.entries.clone(),
            priorities: self.priorities.clone(),
            write_index: self.write_index,
            size: self.size,
            num_added: self.num_added
        }
    }

    ///
    /// Restores a snapshot, truncating or padding if the snapshot was
    /// taken with a different capacity.
    ///
    pub fn set_state (& mut self, state: ReplayState)
    {
        self.reset();

        let keep = state.entries.len().min(self.capacity);
        self.entries[.. keep].clone_from_slice(& state.entries[.. keep]);
        self.priorities[.. keep].clone_from_slice(& state.priorities[.. keep]);

        self.write_index = state.write_index.min(self.capacity - 1);
        self.size = state.size.min(self.capacity);
        self.num_added = state.num_added;
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn sample (marker: f32) -> UnrollSample
    {
        UnrollSample
        {
            observation: vec![marker],
            actions: vec![0],
            target_values: vec![marker, 0.0],
            target_rewards: vec![0.0],
            target_policies: vec![vec![1.0], vec![1.0]]
        }
    }

    fn store (capacity: usize) -> PrioritizedReplay
    {
        let config = ReplayConfig { capacity, ..ReplayConfig::default() };
        PrioritizedReplay::new(& config, 7)
    }

    #[test]
    fn size_is_capped_and_eviction_is_fifo ()
    {
        let mut replay = store(3);

        for marker in 0 .. 5
        {
            replay.add(sample(marker as f32), 1.0);
        }

        assert_eq!(replay.size(), 3);
        assert_eq!(replay.num_added(), 5);

        // The two oldest entries (0 and 1) were overwritten in order.
        let retained : Vec<f32> = replay.entries.iter()
            .flatten()
            .map(|s| s.observation[0])
            .collect();
        assert!(! retained.contains(& 0.0));
        assert!(! retained.contains(& 1.0));
        for marker in [2.0, 3.0, 4.0]
        {
            assert!(retained.contains(& marker));
        }
    }

    #[test]
    fn sampled_indices_stay_in_bounds_and_weights_are_bounded ()
    {
        let mut replay = store(8);
        for marker in 0 .. 4
        {
            replay.add(sample(marker as f32), (marker + 1) as f32);
        }

        let (indices, samples, weights) = replay.sample(64);

        assert_eq!(samples.len(), 64);
        assert!(indices.iter().all(|& i| i < replay.size()));
        assert!(weights.iter().all(|& w| w <= 1.0 + 1e-6 && w > 0.0));
        assert!(weights.iter().any(|& w| (w - 1.0).abs() < 1e-6));
    }

    #[test]
    fn sampling_frequency_tracks_priority ()
    {
        let mut replay = store(4);
        for (marker, priority) in [(0.0, 1.0), (1.0, 3.0), (2.0, 9.0)]
        {
            replay.add(sample(marker), priority);
        }

        let mut counts = [0usize; 3];
        for _ in 0 .. 100
        {
            let (indices, _, _) = replay.sample(100);
            for index in indices
            {
                counts[index] += 1;
            }
        }

        // 10k draws against priorities 1:3:9 — expect roughly those ratios.
        let total = counts.iter().sum::<usize>() as f64;
        let expected = [1.0 / 13.0, 3.0 / 13.0, 9.0 / 13.0];

        for (count, expected) in counts.iter().zip(expected)
        {
            let observed = * count as f64 / total;
            assert!((observed - expected).abs() < 0.03, "observed {} expected {}", observed, expected);
        }
    }

    #[test]
    fn priority_updates_change_future_sampling ()
    {
        let mut replay = store(4);
        replay.add(sample(0.0), 1.0);
        replay.add(sample(1.0), 1.0);

        replay.update_priorities(& [0], & [1000.0]);

        let (indices, _, _) = replay.sample(200);
        let zeros = indices.iter().filter(|& & i| i == 0).count();
        assert!(zeros > 150);
    }

    #[test]
    fn state_round_trips ()
    {
        let mut replay = store(4);
        for marker in 0 .. 3
        {
            replay.add(sample(marker as f32), 2.0);
        }

        let state = replay.get_state();

        let mut restored = store(4);
        restored.set_state(state);

        assert_eq!(restored.size(), 3);
        assert_eq!(restored.num_added(), 3);

        let (_, samples, _) = restored.sample(8);
        assert!(! samples.is_empty());
    }

    #[test]
    fn reset_empties_the_store ()
    {
        let mut replay = store(4);
        replay.add(sample(1.0), 1.0);
        replay.reset();

        assert_eq!(replay.size(), 0);
        let (indices, samples, weights) = replay.sample(4);
        assert!(indices.is_empty() && samples.is_empty() && weights.is_empty());
    }
}
