//! Scenario-specific secondary effects applied after the linear variable
//! composition of each iteration.

use crate::simulation::SimulationType;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution as _, Normal};

/// Share of promotion uplift assumed to cannibalize adjacent own products.
const CANNIBALIZATION_RATE: f64 = 0.12;
/// Upper bound of the stochastic competitive-response reduction on
/// promotion outcomes.
const COMPETITIVE_EROSION_MAX: f64 = 0.10;
/// Net revenue elasticity applied to price moves (demand response already
/// partially offsets the price change).
const NET_PRICE_ELASTICITY: f64 = -0.5;
/// Floor on the price-elasticity volume factor.
const VOLUME_FACTOR_FLOOR: f64 = 0.2;
/// Nominal channel budget shares, allocated sequentially.
const CHANNEL_SHARES: [f64; 4] = [0.40, 0.30, 0.20, 0.10];
/// Nominal per-channel ROI, ordered with the shares.
const CHANNEL_ROIS: [f64; 4] = [1.8, 1.5, 1.2, 0.9];
/// Drift multiplier for market scenarios.
const MARKET_TREND: f64 = 1.03;
/// Volatility of the market-noise term relative to the base value.
const MARKET_VOLATILITY: f64 = 0.05;
/// Probability that a competitor reacts at all.
const REACTION_PROBABILITY: f64 = 0.6;
/// Competitor reaction strength per unit of own action.
const REACTION_COEFFICIENT: f64 = 0.5;
/// Cap on the competitive reduction.
const REACTION_CAP: f64 = 0.3;

/// Apply the simulation type's secondary effects to one iteration outcome.
pub(crate) fn apply_secondary_effects(
    simulation_type: SimulationType,
    outcome: f64,
    base_value: f64,
    rng: &mut StdRng,
) -> f64 {
    match simulation_type {
        SimulationType::PromotionImpact => {
            // Cannibalization haircut, then a stochastic competitive
            // response.
            let after_cannibalization = outcome * (1.0 - CANNIBALIZATION_RATE);
            let erosion = rng.gen_range(0.0..=COMPETITIVE_EROSION_MAX);
            after_cannibalization * (1.0 - erosion)
        }
        SimulationType::PriceOptimization => {
            // Volume responds to the effective price move.
            if base_value.abs() < 1e-9 {
                return outcome;
            }
            let price_shift = outcome / base_value - 1.0;
            let volume_factor =
                (1.0 + NET_PRICE_ELASTICITY * price_shift).max(VOLUME_FACTOR_FLOOR);
            outcome * volume_factor
        }
        SimulationType::BudgetAllocation => {
            // Sequentially split the budget across channels, each with a
            // noisy share and ROI; unallocated remainder returns at face
            // value.
            let mut remaining = outcome.max(0.0);
            let mut total_return = 0.0;
            for (share, roi) in CHANNEL_SHARES.iter().zip(CHANNEL_ROIS.iter()) {
                let share_draw = (share * rng.gen_range(0.75..=1.25)).min(1.0);
                let allocation = remaining * share_draw;
                let roi_draw = roi * rng.gen_range(0.8..=1.2);
                total_return += allocation * roi_draw;
                remaining -= allocation;
            }
            total_return + remaining
        }
        SimulationType::MarketScenario => {
            // Trend multiplier plus a volatility term scaled to the base.
            let drifted = outcome * MARKET_TREND;
            let noise_std = MARKET_VOLATILITY * base_value.abs();
            if noise_std <= 0.0 {
                return drifted;
            }
            let noise = Normal::new(0.0, noise_std)
                .map(|d| d.sample(rng))
                .unwrap_or(0.0);
            drifted + noise
        }
        SimulationType::CompetitiveResponse => {
            // Probabilistic counter-reaction proportional to the size of
            // our own move.
            if base_value.abs() < 1e-9 {
                return outcome;
            }
            let own_action = (outcome / base_value - 1.0).abs();
            if rng.gen_bool(REACTION_PROBABILITY) {
                let reduction = (REACTION_COEFFICIENT * own_action).min(REACTION_CAP);
                outcome * (1.0 - reduction)
            } else {
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn average_effect(simulation_type: SimulationType, outcome: f64, base: f64) -> f64 {
        let mut rng = rng();
        let n = 4000;
        (0..n)
            .map(|_| apply_secondary_effects(simulation_type, outcome, base, &mut rng))
            .sum::<f64>()
            / n as f64
    }

    #[test]
    fn promotion_impact_applies_haircut() {
        let mean = average_effect(SimulationType::PromotionImpact, 1_000_000.0, 1_000_000.0);
        // Cannibalization 12% plus ~5% average erosion.
        let expected = 1_000_000.0 * (1.0 - CANNIBALIZATION_RATE) * 0.95;
        assert!(
            (mean - expected).abs() / expected < 0.02,
            "mean {} vs expected {}",
            mean,
            expected
        );
        assert!(mean < 1_000_000.0);
    }

    #[test]
    fn price_optimization_dampens_price_gains() {
        // A 20% effective price rise loses some volume.
        let raised = apply_secondary_effects(
            SimulationType::PriceOptimization,
            120.0,
            100.0,
            &mut rng(),
        );
        assert!(raised < 120.0);
        assert!(raised > 100.0);

        // A price cut gains volume.
        let cut = apply_secondary_effects(
            SimulationType::PriceOptimization,
            80.0,
            100.0,
            &mut rng(),
        );
        assert!(cut > 80.0);
    }

    #[test]
    fn price_optimization_volume_factor_is_floored() {
        // An absurd price move cannot turn revenue negative.
        let extreme = apply_secondary_effects(
            SimulationType::PriceOptimization,
            1_000.0,
            100.0,
            &mut rng(),
        );
        assert!(extreme >= 1_000.0 * VOLUME_FACTOR_FLOOR);
    }

    #[test]
    fn budget_allocation_returns_blended_roi() {
        let mean = average_effect(SimulationType::BudgetAllocation, 100_000.0, 100_000.0);
        // Nominal blended ROI across shares is around 1.5 on the allocated
        // portion; with the unspent remainder the total sits well above the
        // budget.
        assert!(mean > 100_000.0, "mean {}", mean);
        assert!(mean < 200_000.0, "mean {}", mean);
    }

    #[test]
    fn market_scenario_drifts_and_spreads() {
        let mut rng = rng();
        let outcomes: Vec<f64> = (0..4000)
            .map(|_| {
                apply_secondary_effects(SimulationType::MarketScenario, 1_000.0, 1_000.0, &mut rng)
            })
            .collect();
        let mean = outcomes.iter().sum::<f64>() / outcomes.len() as f64;
        assert!((mean - 1_030.0).abs() < 10.0, "mean {}", mean);
        // Volatility term spreads the outcomes.
        assert!(outcomes.iter().any(|&o| o > 1_080.0));
        assert!(outcomes.iter().any(|&o| o < 980.0));
    }

    #[test]
    fn competitive_response_only_reduces() {
        let mut rng = rng();
        for _ in 0..1000 {
            let outcome = apply_secondary_effects(
                SimulationType::CompetitiveResponse,
                130.0,
                100.0,
                &mut rng,
            );
            assert!(outcome <= 130.0);
            // Reduction is capped.
            assert!(outcome >= 130.0 * (1.0 - REACTION_CAP));
        }
    }

    #[test]
    fn competitive_response_sometimes_passes_through() {
        let mut rng = rng();
        let unchanged = (0..1000)
            .filter(|_| {
                let outcome = apply_secondary_effects(
                    SimulationType::CompetitiveResponse,
                    130.0,
                    100.0,
                    &mut rng,
                );
                (outcome - 130.0).abs() < 1e-9
            })
            .count();
        // Roughly 40% of iterations see no reaction.
        assert!((200..=600).contains(&unchanged), "unchanged: {}", unchanged);
    }

    #[test]
    fn zero_base_value_short_circuits_relative_effects() {
        let mut rng = rng();
        let price = apply_secondary_effects(SimulationType::PriceOptimization, 50.0, 0.0, &mut rng);
        assert_eq!(price, 50.0);
        let competitive =
            apply_secondary_effects(SimulationType::CompetitiveResponse, 50.0, 0.0, &mut rng);
        assert_eq!(competitive, 50.0);
    }
}
