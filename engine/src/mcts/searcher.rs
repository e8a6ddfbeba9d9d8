
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::distributions::WeightedIndex;

use rand_distr::{Dirichlet, Distribution};

use crate::model::Network;

use super::config::Config as MCTSConfig;
use super::node::*;

///
/// The outcome of one decision-point search: the chosen action, the
/// normalized visit-count distribution over the full action space (the
/// policy training target), and the root's mean value estimate.
///
#[derive(Clone, Debug)]
pub struct SearchResult
{
    pub action: usize,
    pub visit_distribution: Vec<f32>,
    pub root_value: f32
}

///
/// A PUCB tree searcher over the model's latent dynamics.
///
/// One searcher belongs to one actor; the node arena is rebuilt from
/// scratch for every decision point and shares nothing across calls except
/// the seeded random stream.
///
pub struct Searcher
{
    config: MCTSConfig,
    rng: StdRng,
    tree: Vec<Node>
}

const ROOT : NodeID = 0;
const SCORE_EPSILON : f32 = 1e-6;

impl Searcher
{
    pub fn new (config: MCTSConfig, seed: u64) -> Searcher
    {
        Searcher { config, rng: StdRng::seed_from_u64(seed), tree: Vec::new() }
    }

    ///
    /// Runs the configured simulation budget from the given root state and
    /// selects an action.
    ///
    /// `deterministic` (evaluation mode) picks the most-visited action with
    /// prior tie-breaking; otherwise the action is sampled from the visit
    /// distribution sharpened by `1 / temperature`, and Dirichlet noise is
    /// mixed into the root priors to diversify self-play.
    ///
    pub fn search (
        & mut self,
        network: & Network,
        observation: & [f32],
        actions_mask: & [bool],
        current_player: usize,
        opponent_player: usize,
        temperature: f32,
        deterministic: bool
    ) -> SearchResult
    {
        let num_actions = actions_mask.len();
        let legal = legal_actions(actions_mask);
        let two_player = current_player != opponent_player;

        let output = network.initial_inference(observation);

        // A zero-freedom action space needs no simulations at all.

        if legal.len() == 1
        {
            let mut visit_distribution = vec![0.0; num_actions];
            visit_distribution[legal[0]] = 1.0;

            return SearchResult { action: legal[0], visit_distribution, root_value: output.value };
        }

        self.tree.clear();
        self.tree.push(Node::new(None, 0, current_player, 1.0));

        let mut minmax = MinMaxStats::new(self.config.min_bound, self.config.max_bound);

        let child_player = match two_player { true => opponent_player, false => current_player };
        self.expand(ROOT, & output.latent, output.reward, & output.policy, actions_mask, child_player);

        if ! deterministic && self.config.root_noise_alpha > 0.0
        {
            self.add_root_noise();
        }

        self.backup(ROOT, output.value, two_player, & mut minmax);

        for _ in 0 .. self.config.num_simulations
        {
            // Selection: descend to a node the model has not evaluated yet.

            let mut id = ROOT;
            while self.tree[id].is_expanded()
            {
                id = self.select_child(id, & minmax, two_player);
            }

            // Expansion: unroll the model over the edge that reached it.

            let parent = self.tree[id].parent.unwrap_or(ROOT);
            let in_action = self.tree[id].in_action;
            let output = network.recurrent_inference(& self.tree[parent].latent, in_action);

            let node_player = self.tree[id].player;
            let child_player = match two_player && node_player == current_player
            {
                true  => opponent_player,
                false => current_player
            };

            self.expand(id, & output.latent, output.reward, & output.policy, actions_mask, child_player);
            self.backup(id, output.value, two_player, & mut minmax);
        }

        self.conclude(num_actions, & legal, temperature, deterministic)
    }

    ///
    /// Creates one child per legal action under the given node, seeding
    /// each with the model's (renormalized) prior. Degenerate all-zero
    /// priors fall back to a uniform distribution over the legal actions.
    ///
    fn expand (& mut self, id: NodeID, latent: & [f32], reward: f32, policy: & [f32], actions_mask: & [bool], child_player: usize)
    {
        let legal = legal_actions(actions_mask);
        let total : f32 = legal.iter().map(|& a| policy[a]).sum();

        for & action in & legal
        {
            let prior = match total > 0.0
            {
                true  => policy[action] / total,
                false => 1.0 / legal.len() as f32
            };

            let child = Node::new(Some(id), action, child_player, prior);
            let child_id = self.tree.len();
            self.tree.push(child);
            self.tree[id].children.insert(action, child_id);
        }

        self.tree[id].latent = latent.to_vec();
        self.tree[id].reward = reward;
    }

    ///
    /// Mixes Dirichlet exploration noise into the root priors. Noise is
    /// never applied below the root.
    ///
    fn add_root_noise (& mut self)
    {
        let children : Vec<NodeID> = self.tree[ROOT].children.values().copied().collect();
        if children.len() < 2
        {
            return;
        }

        let dirichlet = match Dirichlet::new_with_size(self.config.root_noise_alpha as f64, children.len())
        {
            Ok(dirichlet) => dirichlet,
            Err(_)        => return
        };

        let noise = dirichlet.sample(& mut self.rng);
        let fraction = self.config.root_noise_fraction;

        for (child_id, noise) in children.into_iter().zip(noise)
        {
            let node = & mut self.tree[child_id];
            node.prior = node.prior * (1.0 - fraction) + fraction * noise as f32;
        }
    }

    ///
    /// Picks the child maximizing the PUCB score. Score ties prefer
    /// unvisited children, then higher priors, then a uniform draw.
    ///
    fn select_child (& mut self, id: NodeID, minmax: & MinMaxStats, two_player: bool) -> NodeID
    {
        let parent = & self.tree[id];
        let parent_visits = parent.visits as f32;
        let pb_c = self.config.pb_c_init + ((parent_visits + self.config.pb_c_base + 1.0) / self.config.pb_c_base).ln();

        let mut scored : Vec<(NodeID, f32, usize, f32)> = Vec::with_capacity(parent.children.len());

        for & child_id in parent.children.values()
        {
            let child = & self.tree[child_id];

            let q = match child.visits
            {
                0 => 0.0,
                _ =>
                {
                    let value = match two_player { true => - child.value(), false => child.value() };
                    minmax.normalize(child.reward + self.config.discount * value)
                }
            };
            let u = child.prior * pb_c * parent_visits.sqrt() / (1.0 + child.visits as f32);

            scored.push((child_id, q + u, child.visits, child.prior));
        }

        let best = scored.iter().map(|& (_, s, _, _)| s).fold(f32::NEG_INFINITY, f32::max);
        let mut tied : Vec<(NodeID, f32, usize, f32)> =
            scored.into_iter().filter(|& (_, s, _, _)| s >= best - SCORE_EPSILON).collect();

        if tied.iter().any(|& (_, _, visits, _)| visits == 0)
        {
            tied.retain(|& (_, _, visits, _)| visits == 0);
        }

        let top_prior = tied.iter().map(|& (_, _, _, p)| p).fold(f32::NEG_INFINITY, f32::max);
        tied.retain(|& (_, _, _, p)| p >= top_prior - SCORE_EPSILON);

        match tied.len()
        {
            1 => tied[0].0,
            n => tied[self.rng.gen_range(0 .. n)].0
        }
    }

    ///
    /// Propagates a leaf evaluation up the visited path, discounting by
    /// one step per edge and flipping perspective when players alternate.
    ///
    fn backup (& mut self, leaf: NodeID, value: f32, two_player: bool, minmax: & mut MinMaxStats)
    {
        let mut v = value;
        let mut cur = Some(leaf);

        while let Some(id) = cur
        {
            let node = & mut self.tree[id];

            node.visits += 1;
            node.value_sum += v;

            minmax.update(node.reward + self.config.discount * node.value());

            v = node.reward + self.config.discount * match two_player { true => - v, false => v };
            cur = node.parent;
        }
    }

    ///
    /// Turns the root's visit counts into the final action choice and the
    /// policy training target.
    ///
    fn conclude (& mut self, num_actions: usize, legal: & [usize], temperature: f32, deterministic: bool) -> SearchResult
    {
        let mut visits = vec![0.0_f32; num_actions];
        let mut priors = vec![0.0_f32; num_actions];

        for (& action, & child_id) in & self.tree[ROOT].children
        {
            visits[action] = self.tree[child_id].visits as f32;
            priors[action] = self.tree[child_id].prior;
        }

        let total : f32 = visits.iter().sum();
        let visit_distribution : Vec<f32> = match total > 0.0
        {
            true  => visits.iter().map(|v| v / total).collect(),
            false => legal.iter().fold(vec![0.0; num_actions], |mut dist, & a| { dist[a] = 1.0 / legal.len() as f32; dist })
        };

        let action = match deterministic || temperature <= 0.0
        {
            true  => argmax_visits(legal, & visits, & priors),
            false => self.sample_action(legal, & visits, temperature)
        };

        SearchResult { action, visit_distribution, root_value: self.tree[ROOT].value() }
    }

    ///
    /// Samples an action from the visit distribution raised to the power
    /// `1 / temperature`; an empty distribution degrades to a uniform
    /// choice over the legal actions.
    ///
    fn sample_action (& mut self, legal: & [usize], visits: & [f32], temperature: f32) -> usize
    {
        let weights : Vec<f32> = legal.iter().map(|& a| visits[a].powf(1.0 / temperature)).collect();

        match WeightedIndex::new(& weights)
        {
            Ok(index) => legal[index.sample(& mut self.rng)],
            Err(_)    => legal[self.rng.gen_range(0 .. legal.len())]
        }
    }
}

fn legal_actions (actions_mask: & [bool]) -> Vec<usize>
{
    let legal : Vec<usize> = actions_mask.iter()
        .enumerate()
        .filter(|(_, & m)| m)
        .map(|(a, _)| a)
        .collect();

    // An all-false mask would wedge the actor; treat it as unconstrained.
    match legal.is_empty()
    {
        true  => (0 .. actions_mask.len()).collect(),
        false => legal
    }
}

fn argmax_visits (legal: & [usize], visits: & [f32], priors: & [f32]) -> usize
{
    let mut best = legal[0];
    for & action in & legal[1 ..]
    {
        let better = visits[action] > visits[best]
            || (visits[action] == visits[best] && priors[action] > priors[best]);
        if better
        {
            best = action;
        }
    }

    best
}
