//! Flattening ecosystem graphs into dense vectors and matrices.

use crate::ecosystem::EcosystemGraph;
use crate::error::MatrixError;
use nalgebra::{DMatrix, DVector};

/// Dense form of an ecosystem, ready for integration.
///
/// `coefficients[(i, j)]` is the effect of species `j`'s population on the
/// growth of species `i`; the diagonal is zero (self effects live in
/// `growth_rates`).
#[derive(Debug, Clone, PartialEq)]
pub struct EcosystemPopulations {
    /// Initial population per species (size N)
    pub initial_populations: DVector<f64>,
    /// Intrinsic growth rate per species (size N)
    pub growth_rates: DVector<f64>,
    /// Interaction coefficients (N x N)
    pub coefficients: DMatrix<f64>,
}

impl EcosystemPopulations {
    /// Builds from row-major vectors, checking that all shapes agree.
    pub fn new(
        initial_populations: Vec<f64>,
        growth_rates: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    ) -> Result<Self, MatrixError> {
        let n = initial_populations.len();
        if n == 0 {
            return Err(MatrixError::Empty);
        }
        if growth_rates.len() != n {
            return Err(MatrixError::shape("growth_rates", n, growth_rates.len()));
        }
        if coefficients.len() != n {
            return Err(MatrixError::shape("coefficients rows", n, coefficients.len()));
        }
        if let Some(row) = coefficients.iter().find(|row| row.len() != n) {
            return Err(MatrixError::shape("coefficients columns", n, row.len()));
        }

        Ok(Self {
            initial_populations: DVector::from_vec(initial_populations),
            growth_rates: DVector::from_vec(growth_rates),
            coefficients: DMatrix::from_fn(n, n, |i, j| coefficients[i][j]),
        })
    }

    /// Flattens a weighted graph.
    ///
    /// The interaction `j -> i` becomes `coefficients[(i, j)]`, and each
    /// node's self-edge becomes its growth rate.
    pub fn from_graph(graph: &EcosystemGraph) -> Result<Self, MatrixError> {
        let n = graph.species_count();
        if n == 0 {
            return Err(MatrixError::Empty);
        }

        let mut initial_populations = DVector::zeros(n);
        let mut growth_rates = DVector::zeros(n);
        for (species, node) in graph.nodes.iter().enumerate() {
            initial_populations[species] = node.population;
            growth_rates[species] = node
                .growth_rate
                .ok_or(MatrixError::MissingSelfEdge { species })?;
        }

        let mut coefficients = DMatrix::zeros(n, n);
        for interaction in &graph.interactions {
            if interaction.source >= n || interaction.target >= n {
                return Err(MatrixError::SpeciesOutOfRange {
                    from: interaction.source,
                    to: interaction.target,
                    species_count: n,
                });
            }
            if interaction.source != interaction.target {
                coefficients[(interaction.target, interaction.source)] = interaction.weight;
            }
        }

        Ok(Self {
            initial_populations,
            growth_rates,
            coefficients,
        })
    }

    /// Number of species.
    pub fn species_count(&self) -> usize {
        self.initial_populations.len()
    }

    /// Coefficient matrix as row-major nested vectors.
    pub fn coefficient_rows(&self) -> Vec<Vec<f64>> {
        self.coefficients
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::{Interaction, SpeciesNode};

    fn node(population: f64, growth_rate: f64) -> SpeciesNode {
        SpeciesNode {
            population,
            growth_rate: Some(growth_rate),
        }
    }

    #[test]
    fn test_from_graph_orientation() {
        let graph = EcosystemGraph {
            nodes: vec![node(50.0, 0.25), node(10.0, -0.3)],
            interactions: vec![
                Interaction { source: 0, target: 1, weight: 0.035 },
                Interaction { source: 1, target: 0, weight: -0.04 },
            ],
        };
        let pops = EcosystemPopulations::from_graph(&graph).unwrap();

        assert_eq!(pops.initial_populations.as_slice(), &[50.0, 10.0]);
        assert_eq!(pops.growth_rates.as_slice(), &[0.25, -0.3]);
        assert_eq!(pops.coefficients[(1, 0)], 0.035);
        assert_eq!(pops.coefficients[(0, 1)], -0.04);
        assert_eq!(pops.coefficients[(0, 0)], 0.0);
    }

    #[test]
    fn test_missing_self_edge() {
        let graph = EcosystemGraph {
            nodes: vec![
                node(1.0, 0.1),
                SpeciesNode {
                    population: 1.0,
                    growth_rate: None,
                },
            ],
            interactions: vec![],
        };
        assert_eq!(
            EcosystemPopulations::from_graph(&graph),
            Err(MatrixError::MissingSelfEdge { species: 1 })
        );
    }

    #[test]
    fn test_out_of_range_interaction() {
        let graph = EcosystemGraph {
            nodes: vec![node(1.0, 0.1)],
            interactions: vec![Interaction { source: 0, target: 4, weight: 1.0 }],
        };
        assert!(matches!(
            EcosystemPopulations::from_graph(&graph),
            Err(MatrixError::SpeciesOutOfRange { to: 4, .. })
        ));
    }

    #[test]
    fn test_new_checks_shapes() {
        assert_eq!(
            EcosystemPopulations::new(vec![1.0, 2.0], vec![0.1], vec![vec![0.0; 2]; 2]),
            Err(MatrixError::shape("growth_rates", 2, 1))
        );
        assert_eq!(
            EcosystemPopulations::new(vec![1.0, 2.0], vec![0.1, 0.2], vec![vec![0.0; 2], vec![0.0]]),
            Err(MatrixError::shape("coefficients columns", 2, 1))
        );
        assert_eq!(EcosystemPopulations::new(vec![], vec![], vec![]), Err(MatrixError::Empty));
    }

    #[test]
    fn test_new_is_row_major() {
        let pops = EcosystemPopulations::new(
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            vec![vec![0.0, 0.5], vec![-0.25, 0.0]],
        )
        .unwrap();
        assert_eq!(pops.coefficients[(0, 1)], 0.5);
        assert_eq!(pops.coefficients[(1, 0)], -0.25);
        assert_eq!(pops.coefficient_rows(), vec![vec![0.0, 0.5], vec![-0.25, 0.0]]);
    }
}
