//! Explicit-Euler integration of generalized Lotka-Volterra dynamics.
//!
//! Each raw step applies
//!
//! ```text
//! x_{t+1} = x_t + dt * x_t ∘ (r + A x_t)
//! ```
//!
//! where `r` holds the growth rates and `A` the interaction coefficients.
//! Raw populations are averaged over windows of `steps_in_coarse` steps and
//! one mean per window is recorded, so the output matrix has one column per
//! coarse step (column 0 being the initial populations).
//!
//! Two policies run after every step:
//! - **Divergence**: any population that is infinite or above
//!   [`DIVERGENCE_LIMIT`] ends the run; every species from the current
//!   coarse column onward is marked [`DIVERGED`]
//! - **Extinction**: a population that is NaN or below `extinct_if_below`
//!   becomes exactly zero, and a zero population stays zero

use crate::accuracy::SimulationAccuracy;
use crate::matrix::EcosystemPopulations;
use crate::trial::Trial;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Population above which a run is treated as diverged.
pub const DIVERGENCE_LIMIT: f64 = 1e30;

/// Sentinel written to every cell from the divergence column onward.
pub const DIVERGED: f64 = -1.0;

/// How an integration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntegrationOutcome {
    /// All raw steps ran
    Completed,
    /// The run stopped at raw step `raw_step`; columns from `coarse_step`
    /// onward hold [`DIVERGED`]
    Diverged { raw_step: usize, coarse_step: usize },
}

/// Species x coarse-step population matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Generations {
    matrix: DMatrix<f64>,
    outcome: IntegrationOutcome,
    coarse_step: f64,
}

impl Generations {
    /// The full matrix (rows are species, columns coarse steps).
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn outcome(&self) -> IntegrationOutcome {
        self.outcome
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self.outcome, IntegrationOutcome::Diverged { .. })
    }

    pub fn species_count(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn coarse_iterations(&self) -> usize {
        self.matrix.ncols()
    }

    /// Simulated time between columns.
    pub fn coarse_step(&self) -> f64 {
        self.coarse_step
    }

    /// Population of `species` at coarse step `step`.
    pub fn get(&self, species: usize, step: usize) -> Option<f64> {
        self.matrix.get((species, step)).copied()
    }

    /// Last recorded column.
    pub fn final_populations(&self) -> DVector<f64> {
        self.matrix.column(self.matrix.ncols() - 1).clone_owned()
    }

    /// Matrix as row-major nested vectors (one row per species).
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

/// Integrates one trial.
pub fn integrate(trial: &Trial) -> Generations {
    integrate_populations(&trial.populations, &trial.accuracy)
}

/// Integrates an ecosystem under the given accuracy settings.
///
/// Never fails: float overflow is caught by the divergence policy.
pub fn integrate_populations(populations: &EcosystemPopulations, accuracy: &SimulationAccuracy) -> Generations {
    let species = populations.species_count();
    let steps_in_coarse = accuracy.steps_in_coarse();
    let coarse_iterations = accuracy.coarse_iterations().max(1);
    let raw_steps = ((coarse_iterations - 1) * steps_in_coarse).min(accuracy.raw_iterations());
    let dt = accuracy.euler_step;
    let threshold = accuracy.extinct_if_below;

    let mut matrix = DMatrix::zeros(species, coarse_iterations);
    let mut population = populations.initial_populations.clone();
    matrix.set_column(0, &populations.initial_populations);

    let mut window_sum = DVector::zeros(species);
    let mut outcome = IntegrationOutcome::Completed;

    for t in 0..raw_steps {
        let rates = &populations.coefficients * &population + &populations.growth_rates;
        let delta = rates.component_mul(&population) * dt;
        population += delta;

        if population.iter().any(|&p| p.is_infinite() || p > DIVERGENCE_LIMIT) {
            let from = (t + 1).div_ceil(steps_in_coarse);
            matrix
                .columns_mut(from, coarse_iterations - from)
                .fill(DIVERGED);
            outcome = IntegrationOutcome::Diverged {
                raw_step: t,
                coarse_step: from,
            };
            break;
        }

        clamp_extinct(&mut population, threshold);
        window_sum += &population;

        if (t + 1) % steps_in_coarse == 0 {
            matrix.set_column((t + 1) / steps_in_coarse, &window_sum.unscale(steps_in_coarse as f64));
            window_sum.fill(0.0);
        }
    }

    Generations {
        matrix,
        outcome,
        coarse_step: accuracy.coarse_step(),
    }
}

fn clamp_extinct(population: &mut DVector<f64>, threshold: f64) {
    for p in population.iter_mut() {
        if p.is_nan() || *p < threshold {
            *p = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single(growth: f64, initial: f64) -> EcosystemPopulations {
        EcosystemPopulations::new(vec![initial], vec![growth], vec![vec![0.0]]).unwrap()
    }

    #[test]
    fn test_two_species_predator_prey_stays_bounded() {
        let pops = EcosystemPopulations::new(
            vec![50.0, 10.0],
            vec![0.25, -0.3],
            vec![vec![0.0, -0.04], vec![0.035, 0.0]],
        )
        .unwrap();
        let accuracy = SimulationAccuracy::new(0.01, 50.0, 1e-10, 0.01).unwrap();
        let generations = integrate_populations(&pops, &accuracy);

        assert_eq!(generations.outcome(), IntegrationOutcome::Completed);
        assert_eq!(generations.species_count(), 2);
        assert_eq!(generations.coarse_iterations(), 5000);
        assert!(generations.matrix().iter().all(|&p| p.is_finite() && p >= 0.0));

        // Step 1: prey 50 + 0.01*50*(0.25 - 0.4), predator 10 + 0.01*10*(-0.3 + 1.75)
        assert_relative_eq!(generations.get(0, 1).unwrap(), 49.925, epsilon = 1e-12);
        assert_relative_eq!(generations.get(1, 1).unwrap(), 10.145, epsilon = 1e-12);
    }

    #[test]
    fn test_isolated_growth_is_geometric() {
        let accuracy = SimulationAccuracy::new(0.01, 1.0, 1e-10, 0.01).unwrap();
        let generations = integrate_populations(&single(0.1, 10.0), &accuracy);

        assert_eq!(generations.coarse_iterations(), 100);
        for step in 0..100 {
            let expected = 10.0 * (1.0 + 0.1 * 0.01f64).powi(step as i32);
            assert_relative_eq!(generations.get(0, step).unwrap(), expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_extinction_clamps_to_zero_and_stays() {
        let accuracy = SimulationAccuracy::new(0.1, 2.0, 0.5, 0.1).unwrap();
        let generations = integrate_populations(&single(-1.0, 1.0), &accuracy);

        // 0.9^6 = 0.531 survives, 0.9^7 = 0.478 falls below 0.5.
        assert_relative_eq!(generations.get(0, 6).unwrap(), 0.9f64.powi(6), max_relative = 1e-9);
        for step in 7..generations.coarse_iterations() {
            assert_eq!(generations.get(0, step), Some(0.0));
        }
    }

    #[test]
    fn test_nan_population_goes_extinct() {
        let accuracy = SimulationAccuracy::new(0.1, 1.0, 1e-10, 0.1).unwrap();
        let generations = integrate_populations(&single(f64::NAN, 1.0), &accuracy);

        assert_eq!(generations.outcome(), IntegrationOutcome::Completed);
        assert!(!generations.is_diverged());
        assert_eq!(generations.get(0, 0), Some(1.0));
        for step in 1..generations.coarse_iterations() {
            assert_eq!(generations.get(0, step), Some(0.0));
        }
    }

    #[test]
    fn test_zero_population_is_absorbing() {
        let pops = EcosystemPopulations::new(
            vec![0.0, 10.0],
            vec![0.5, -0.1],
            vec![vec![0.0, 0.2], vec![0.1, 0.0]],
        )
        .unwrap();
        let accuracy = SimulationAccuracy::new(0.01, 5.0, 1e-10, 0.05).unwrap();
        let generations = integrate_populations(&pops, &accuracy);

        assert!((0..generations.coarse_iterations()).all(|c| generations.get(0, c) == Some(0.0)));
    }

    #[test]
    fn test_divergence_marks_everything_from_coarse_step() {
        // Second species explodes by a factor of 11 per raw step and crosses
        // 1e30 at raw step 28 (11^29 > 1e30).
        let pops = EcosystemPopulations::new(
            vec![5.0, 1.0],
            vec![0.0, 10.0],
            vec![vec![0.0, 0.0], vec![0.0, 0.0]],
        )
        .unwrap();
        let accuracy = SimulationAccuracy::new(1.0, 100.0, 1e-10, 4.0).unwrap();
        assert_eq!(accuracy.steps_in_coarse(), 4);
        let generations = integrate_populations(&pops, &accuracy);

        assert_eq!(
            generations.outcome(),
            IntegrationOutcome::Diverged {
                raw_step: 28,
                coarse_step: 8
            }
        );
        assert!(generations.is_diverged());
        for species in 0..2 {
            for step in 0..8 {
                assert!(generations.get(species, step).unwrap() >= 0.0);
            }
            for step in 8..generations.coarse_iterations() {
                assert_eq!(generations.get(species, step), Some(DIVERGED));
            }
        }
    }

    #[test]
    fn test_coarse_columns_are_window_means() {
        let accuracy = SimulationAccuracy::new(0.01, 1.0, 1e-10, 0.05).unwrap();
        let k = accuracy.steps_in_coarse();
        assert_eq!(k, 5);
        let generations = integrate_populations(&single(0.3, 2.0), &accuracy);

        let factor = 1.0 + 0.3 * 0.01;
        let raw: Vec<f64> = (1..=60).map(|t| 2.0 * f64::powi(factor, t)).collect();
        for column in 1..=10 {
            let window = &raw[(column - 1) * k..column * k];
            let mean = window.iter().sum::<f64>() / k as f64;
            assert_relative_eq!(generations.get(0, column).unwrap(), mean, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_column_zero_is_initial() {
        let accuracy = SimulationAccuracy {
            max_time: 1.0,
            ..SimulationAccuracy::default()
        };
        let generations = integrate_populations(&single(0.0, 7.5), &accuracy);
        assert_eq!(generations.get(0, 0), Some(7.5));
        assert_eq!(generations.final_populations()[0], 7.5);
    }

    #[test]
    fn test_integrate_trial() {
        let accuracy = SimulationAccuracy::new(0.05, 1.0, 1e-10, 0.1).unwrap();
        let trial = Trial::standalone(single(0.2, 3.0), accuracy);
        let generations = integrate(&trial);
        assert_eq!(generations.coarse_iterations(), accuracy.coarse_iterations());
        assert_relative_eq!(generations.coarse_step(), 0.1, epsilon = 1e-12);
        assert_eq!(trial.label(), "0000ep-0000s-0000t");
    }
}
