
use std::collections::BTreeMap;

///
/// An alias on usize for readability.
///
pub type NodeID = usize;

///
/// A state in the search tree for one decision point. Children are created
/// lazily when their parent is expanded and live in the same arena as the
/// parent, addressed by integer handle; the whole arena is discarded once
/// an action has been selected.
///
pub struct Node
{
    pub parent: Option<NodeID>,
    pub in_action: usize,
    pub children: BTreeMap<usize, NodeID>,

    pub player: usize,
    pub prior: f32,
    pub reward: f32,
    pub latent: Vec<f32>,

    pub visits: usize,
    pub value_sum: f32
}

impl Node
{
    ///
    /// Creates a fresh unexpanded node reached from `parent` by taking
    /// `in_action`, seeded with the prior the model assigned to that edge.
    ///
    pub fn new (parent: Option<NodeID>, in_action: usize, player: usize, prior: f32) -> Node
    {
        Node
        {
            parent,
            in_action,
            children: BTreeMap::new(),

            player,
            prior,
            reward: 0.0,
            latent: Vec::new(),

            visits: 0,
            value_sum: 0.0
        }
    }

    ///
    /// Determines whether this node has been expanded by the model.
    ///
    pub fn is_expanded (& self) -> bool
    {
        ! self.children.is_empty()
    }

    ///
    /// The mean backed-up value of this node, in the perspective of the
    /// player to move here; zero before the first visit.
    ///
    pub fn value (& self) -> f32
    {
        match self.visits
        {
            0 => 0.0,
            n => self.value_sum / n as f32
        }
    }
}

///
/// Running value bounds used to rescale Q values into [0, 1] before the
/// PUCB comparison; seeded from the configured bounds when present,
/// otherwise tracked from the values actually backed up.
///
#[derive(Clone, Copy, Debug)]
pub struct MinMaxStats
{
    min: f32,
    max: f32
}

impl MinMaxStats
{
    pub fn new (min_bound: Option<f32>, max_bound: Option<f32>) -> MinMaxStats
    {
        MinMaxStats
        {
            min: min_bound.unwrap_or(f32::INFINITY),
            max: max_bound.unwrap_or(f32::NEG_INFINITY)
        }
    }

    pub fn update (& mut self, value: f32)
    {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn normalize (& self, value: f32) -> f32
    {
        match self.max > self.min
        {
            true  => (value - self.min) / (self.max - self.min),
            false => value
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn unvisited_nodes_value_to_zero ()
    {
        let mut node = Node::new(None, 0, 0, 0.5);
        assert_eq!(node.value(), 0.0);

        node.visits = 4;
        node.value_sum = 2.0;
        assert_eq!(node.value(), 0.5);
    }

    #[test]
    fn minmax_normalizes_into_the_observed_range ()
    {
        let mut stats = MinMaxStats::new(None, None);

        // Degenerate until two distinct values have been seen.
        assert_eq!(stats.normalize(3.0), 3.0);

        stats.update(0.0);
        stats.update(10.0);
        assert_eq!(stats.normalize(5.0), 0.5);

        let fixed = MinMaxStats::new(Some(0.0), Some(2.0));
        assert_eq!(fixed.normalize(1.0), 0.5);
    }
}
