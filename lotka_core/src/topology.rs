//! Base topologies for generated ecosystems.
//!
//! A [`Topology`] is the first, immutable phase of graph construction: which
//! species pairs interact at all. Weights are assigned afterwards by the
//! ecosystem generator.
//!
//! Two families are supported:
//! - **Power-law cluster** (Holme-Kim): preferential attachment with a
//!   triangle-closing step, giving heavy-tailed degree and high clustering
//! - **Navigable small world** (Kleinberg): a `side^dim` lattice with local
//!   links plus one long-range link per node, drawn with probability
//!   proportional to `d^-2`

use crate::error::GenerateError;
use petgraph::graphmap::{DiGraphMap, UnGraphMap};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::BTreeSet;

/// Pair-symmetric set of directed edges over species indices.
///
/// If `(a, b)` is present then so is `(b, a)`. Self-loops are never stored;
/// the self-edge (growth rate) lives on the species node instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    species_count: usize,
    edges: BTreeSet<(usize, usize)>,
}

impl Topology {
    /// Builds a topology from arbitrary pairs, adding every reverse edge.
    ///
    /// Self-loops and pairs outside `0..species_count` are dropped.
    pub fn from_pairs<I>(species_count: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut edges = BTreeSet::new();
        for (a, b) in pairs {
            if a != b && a < species_count && b < species_count {
                edges.insert((a, b));
                edges.insert((b, a));
            }
        }
        Self {
            species_count,
            edges,
        }
    }

    /// Holme-Kim power-law cluster graph.
    ///
    /// Starts from `m` unconnected nodes; every new node attaches `m` edges
    /// to targets drawn in proportion to degree, and after each attachment
    /// closes a triangle with probability `p`. `m` is clamped to
    /// `1..=species_count-1`.
    pub fn power_law_cluster<R: Rng + ?Sized>(
        rng: &mut R,
        species_count: usize,
        m: usize,
        p: f64,
    ) -> Result<Self, GenerateError> {
        if species_count < 2 {
            return Err(GenerateError::SpeciesCount(species_count));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(GenerateError::invalid(
                "connection_p",
                format!("triangle probability {p} outside [0, 1]"),
            ));
        }
        let m = m.clamp(1, species_count - 1);

        let mut graph = UnGraphMap::<usize, ()>::with_capacity(species_count, species_count * m);
        for node in 0..m {
            graph.add_node(node);
        }

        // Each node appears once per incident edge, so uniform picks from
        // this list are degree-proportional.
        let mut repeated: Vec<usize> = (0..m).collect();

        for source in m..species_count {
            graph.add_node(source);
            let mut targets = random_subset(rng, &repeated, m);
            let Some(mut target) = targets.pop() else {
                break;
            };
            graph.add_edge(source, target, ());
            repeated.push(target);

            let mut count = 1;
            while count < m {
                if rng.gen::<f64>() < p {
                    let closing: Vec<usize> = graph
                        .neighbors(target)
                        .filter(|&nbr| nbr != source && !graph.contains_edge(source, nbr))
                        .collect();
                    if !closing.is_empty() {
                        let nbr = closing[rng.gen_range(0..closing.len())];
                        graph.add_edge(source, nbr, ());
                        repeated.push(nbr);
                        count += 1;
                        continue;
                    }
                }
                match targets.pop() {
                    Some(next) => {
                        target = next;
                        graph.add_edge(source, target, ());
                        repeated.push(target);
                        count += 1;
                    }
                    None => break,
                }
            }
            repeated.extend(std::iter::repeat(source).take(m));
        }

        Ok(Self::from_pairs(species_count, graph.all_edges().map(|(a, b, _)| (a, b))))
    }

    /// Kleinberg navigable small-world lattice with `side_length^dim` nodes.
    ///
    /// Nodes are numbered in row-major lattice order. Every node links to all
    /// nodes at Manhattan distance 1 and to one further node drawn with
    /// weight `d^-2` over all other nodes.
    pub fn navigable_small_world<R: Rng + ?Sized>(
        rng: &mut R,
        dim: usize,
        side_length: usize,
    ) -> Result<Self, GenerateError> {
        if dim == 0 {
            return Err(GenerateError::invalid("dim", "lattice needs at least one dimension"));
        }
        let exponent = u32::try_from(dim)
            .map_err(|_| GenerateError::invalid("dim", format!("{dim} is too large")))?;
        let species_count = side_length.checked_pow(exponent).ok_or_else(|| {
            GenerateError::invalid("side_length", format!("{side_length}^{dim} overflows"))
        })?;
        if species_count < 2 {
            return Err(GenerateError::SpeciesCount(species_count));
        }

        let coords: Vec<Vec<usize>> = (0..species_count)
            .map(|index| lattice_coordinates(index, dim, side_length))
            .collect();

        let mut graph = DiGraphMap::<usize, ()>::with_capacity(species_count, species_count * (2 * dim + 1));
        for node in 0..species_count {
            graph.add_node(node);
        }

        for (from, origin) in coords.iter().enumerate() {
            let mut others = Vec::with_capacity(species_count - 1);
            let mut weights = Vec::with_capacity(species_count - 1);
            for (to, point) in coords.iter().enumerate() {
                if to == from {
                    continue;
                }
                let distance = manhattan(origin, point);
                if distance <= 1 {
                    graph.add_edge(from, to, ());
                }
                others.push(to);
                weights.push((distance as f64).powi(-2));
            }

            let long_range = WeightedIndex::new(&weights)
                .map_err(|e| GenerateError::invalid("side_length", e.to_string()))?;
            graph.add_edge(from, others[long_range.sample(rng)], ());
        }

        Ok(Self::from_pairs(species_count, graph.all_edges().map(|(a, b, _)| (a, b))))
    }

    /// Number of species (nodes).
    pub fn species_count(&self) -> usize {
        self.species_count
    }

    /// Number of directed edges (twice the number of interacting pairs).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Directed edges in ascending `(source, target)` order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }

    /// Whether `source -> target` is present.
    pub fn contains(&self, source: usize, target: usize) -> bool {
        self.edges.contains(&(source, target))
    }

    /// Number of species `index` interacts with.
    pub fn degree(&self, index: usize) -> usize {
        self.edges.range((index, 0)..(index + 1, 0)).count()
    }

    /// Whether every edge has its reverse.
    pub fn is_pair_symmetric(&self) -> bool {
        self.edges.iter().all(|&(a, b)| self.edges.contains(&(b, a)))
    }
}

/// Draws `count` distinct values from `pool` (with repetition weighting).
fn random_subset<R: Rng + ?Sized>(rng: &mut R, pool: &[usize], count: usize) -> Vec<usize> {
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let value = pool[rng.gen_range(0..pool.len())];
        if !picked.contains(&value) {
            picked.push(value);
        }
    }
    picked
}

fn lattice_coordinates(mut index: usize, dim: usize, side_length: usize) -> Vec<usize> {
    let mut coords = vec![0; dim];
    for slot in coords.iter_mut().rev() {
        *slot = index % side_length;
        index /= side_length;
    }
    coords
}

fn manhattan(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).map(|(&x, &y)| x.abs_diff(y)).sum()
}
