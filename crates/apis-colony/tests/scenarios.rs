//! Reference scenarios for cohorts, mortality and exposure accounting.
//!
//! Each test builds a small colony by hand, runs one or more phases of a
//! tick and checks the exact outcome the model prescribes.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]

use apis_colony::{
    AccountingPolicy, Colony, ColonyParams, DailyPlan, DoseResponse, EggIntake, Entitlements,
    ExposureAccountant, GroupBudget, MortalityEngine, MortalityMode, NurseRecipient,
};
use apis_ledger::{DepositBuilder, HoneyStore, PollenStore};
use apis_types::{Caste, PopulationGroup, Stage, ToxicantFate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn without_background_mortality() -> ColonyParams {
    let mut params = ColonyParams::default();
    for rates in [&mut params.mortality.worker, &mut params.mortality.drone] {
        rates.eggs = 0.0;
        rates.larvae = 0.0;
        rates.pupae = 0.0;
        rates.in_hive = 0.0;
    }
    params.mortality.forager = 0.0;
    params
}

fn daily_plan<'a>(
    accountant: &ExposureAccountant,
    colony: &Colony,
    tick: u64,
    entitlements: &'a Entitlements,
) -> DailyPlan<'a> {
    let mut total = GroupBudget::default();
    for group in PopulationGroup::ACCOUNTING_ORDER {
        let individuals = colony.group_counts(group).iter().map(|&c| u64::from(c)).sum();
        total = total.plus(accountant.group_demand(group, individuals, entitlements));
    }
    DailyPlan {
        tick,
        thermoregulation_kj: 0.0,
        honey_ration: 1.0,
        pollen_ration: 1.0,
        entitlements,
        expected_honey_kj: total.honey_kj,
        expected_pollen_g: total.pollen_g,
    }
}

#[test]
fn undosed_larvae_without_background_mortality_all_survive() {
    let params = without_background_mortality();
    let engine = MortalityEngine::new(MortalityMode::SmallCohortStochastic);
    let mut rng = SmallRng::seed_from_u64(42);
    let mut colony = Colony::new(&params.development).unwrap();
    colony
        .cohorts_mut()
        .caste_mut(Caste::Worker)
        .stage_mut(Stage::Larva)
        .add(2, 1_000);

    let aging = colony.age(EggIntake::default());
    colony.apply_mortality(engine, &params, &aging, &mut rng);

    assert_eq!(colony.caste_counts(Caste::Worker).larvae, 1_000);
}

#[test]
fn cohort_at_ld50_loses_half() {
    let mut params = without_background_mortality();
    params.toxicity.adult_oral = DoseResponse {
        ld50: 0.5,
        slope: 1.0,
    };
    let engine = MortalityEngine::new(MortalityMode::Deterministic);
    let mut rng = SmallRng::seed_from_u64(42);
    let mut colony = Colony::new(&params.development).unwrap();
    colony
        .cohorts_mut()
        .caste_mut(Caste::Drone)
        .stage_mut(Stage::InHive)
        .add(10, 100);
    colony
        .add_dose(PopulationGroup::InHive(Caste::Drone), 10, 0.5)
        .unwrap();

    let report = colony.apply_mortality(engine, &params, &Default::default(), &mut rng);

    assert_eq!(colony.caste_counts(Caste::Drone).in_hive, 50);
    assert_eq!(report.drones.toxic, 50);
}

#[test]
fn larvae_receive_filtered_dose_and_nurses_keep_the_rest() {
    let mut params = without_background_mortality();
    params.needs.honey_energy_kj_per_g = 1.0;
    params.needs.honey.worker_larva_total = 6_000.0;
    params.needs.honey.worker_resting = 0.0;
    params.needs.pollen.worker = 0.0;
    let accountant = ExposureAccountant::new(AccountingPolicy::PerCapita, &params);
    let mut colony = Colony::new(&params.development).unwrap();
    colony
        .cohorts_mut()
        .caste_mut(Caste::Worker)
        .stage_mut(Stage::Larva)
        .add(0, 1);
    colony
        .cohorts_mut()
        .caste_mut(Caste::Worker)
        .stage_mut(Stage::InHive)
        .add(8, 2);

    let mut honey = HoneyStore::new(1, 1e6);
    let nectar = DepositBuilder::new(1)
        .amount(5.0)
        .concentration(4.0)
        .nectar()
        .unwrap();
    honey.deposit(&nectar).unwrap();
    let mut pollen = PollenStore::new(1.0);
    let mut fate = ToxicantFate::default();
    let entitlements = Entitlements::new();
    let plan = daily_plan(&accountant, &colony, 1, &entitlements);

    let report = accountant
        .account(&plan, &mut colony, &mut honey, &mut pollen, &mut fate)
        .unwrap();

    assert!((colony.mean_dose(PopulationGroup::Larvae(Caste::Worker)) - 1.0).abs() < 1e-9);
    assert!((report.nurse_pool_ug - 3.0).abs() < 1e-9);
    assert_eq!(report.nurse_recipient, NurseRecipient::Nurses);
    assert!((colony.mean_dose(PopulationGroup::InHive(Caste::Worker)) - 1.5).abs() < 1e-9);
}

#[test]
fn toxicant_drawn_is_fully_credited_to_consumers() {
    let params = ColonyParams::default();
    let accountant = ExposureAccountant::new(AccountingPolicy::PerCapita, &params);
    let mut colony = Colony::new(&params.development).unwrap();
    colony.foragers_mut().seed(3_000, 30);
    for (caste, stage, age, count) in [
        (Caste::Worker, Stage::InHive, 2, 400),
        (Caste::Worker, Stage::InHive, 15, 300),
        (Caste::Drone, Stage::InHive, 5, 40),
        (Caste::Worker, Stage::Larva, 3, 900),
        (Caste::Drone, Stage::Larva, 1, 60),
    ] {
        colony
            .cohorts_mut()
            .caste_mut(caste)
            .stage_mut(stage)
            .add(age, count);
    }

    let mut honey = HoneyStore::with_capped(1, 1e6, 20_000.0);
    let nectar = DepositBuilder::new(1)
        .amount(300.0)
        .concentration(0.02)
        .nectar()
        .unwrap();
    honey.deposit(&nectar).unwrap();
    let mut pollen = PollenStore::new(200.0);
    pollen.deposit(&DepositBuilder::new(1).amount(50.0).concentration(0.5).pollen().unwrap());

    let mut fate = ToxicantFate::default();
    let entitlements = Entitlements::new();
    let plan = daily_plan(&accountant, &colony, 1, &entitlements);
    let report = accountant
        .account(&plan, &mut colony, &mut honey, &mut pollen, &mut fate)
        .unwrap();

    let drawn = report.honey_toxicant_ug + report.pollen_toxicant_ug;
    assert!(drawn > 0.0);
    assert!((fate.total_ingested() - drawn).abs() <= 1e-9 * drawn);
    assert_eq!(fate.undelivered, 0.0);
}

#[test]
fn populations_never_go_negative_over_a_season() {
    let params = ColonyParams::default();
    let engine = MortalityEngine::new(MortalityMode::SmallCohortStochastic);
    let mut rng = SmallRng::seed_from_u64(7);
    let mut colony = Colony::new(&params.development).unwrap();
    colony.foragers_mut().seed(5_000, 50);

    for _ in 0..200 {
        let eggs = EggIntake {
            worker: rng.random_range(0..1_500),
            drone: rng.random_range(0..50),
        };
        let before = colony.total_population();
        let aging = colony.age(eggs);
        for group in PopulationGroup::ACCOUNTING_ORDER {
            let len = colony.group_counts(group).len();
            let age = rng.random_range(0..len);
            colony
                .add_dose(group, age, rng.random_range(0.0..0.01))
                .unwrap();
        }
        let deaths = colony.apply_mortality(engine, &params, &aging, &mut rng);

        let expected = before + u64::from(eggs.worker) + u64::from(eggs.drone)
            - u64::from(aging.retired_foragers)
            - u64::from(aging.drones.graduated)
            - deaths.total();
        assert_eq!(colony.total_population(), expected);
    }
    assert!(colony.total_population() > 0);
}
