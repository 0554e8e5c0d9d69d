//! Daily egg laying by the queen.
//!
//! Laying follows the seasonal curve of the BEEHAVE family of models. The
//! queen lays little in winter, peaks in early summer and tails off in
//! autumn:
//!
//! ```text
//! season = max(1 - 1 / (1 + 385 e^(-2d/30)), 1 / (1 + 36 e^(-2(d - 155)/30)))
//! eggs   = max_eggs_per_day * (1 - season)
//! ```
//!
//! The day's eggs never exceed the free brood cells. Within the drone
//! season a fixed share of them is laid as drone eggs.

use apis_colony::EggIntake;

use crate::config::LayingConfig;

/// Seasonal suppression of laying on day `day_of_year`, in `[0, 1]`.
pub fn season_factor(day_of_year: u64) -> f64 {
    let day = crate::count_to_f64(day_of_year);
    let spring = 1.0 - 1.0 / 385.0f64.mul_add((-2.0 * day / 30.0).exp(), 1.0);
    let autumn = 1.0 / 36.0f64.mul_add((-2.0 * (day - 155.0) / 30.0).exp(), 1.0);
    spring.max(autumn).clamp(0.0, 1.0)
}

/// Eggs laid on `day_of_year` when the comb already holds `brood`.
pub fn lay_eggs(config: &LayingConfig, day_of_year: u64, brood: u64) -> EggIntake {
    let free_cells = config.max_brood_cells.saturating_sub(brood);
    let seasonal = (config.max_eggs_per_day * (1.0 - season_factor(day_of_year))).round();
    let eggs = whole_eggs(seasonal.min(crate::count_to_f64(free_cells)));

    let in_drone_season =
        (config.drone_season_start..=config.drone_season_end).contains(&day_of_year);
    let drone = if in_drone_season {
        whole_eggs((f64::from(eggs) * config.drone_egg_proportion).round())
    } else {
        0
    };
    EggIntake {
        worker: eggs.saturating_sub(drone),
        drone,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_eggs(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.min(f64::from(u32::MAX)) as u32
}
