use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use team_shuffle::{
    compute_weights, partition, parse_history, total_cost, AffinityParams, AssignmentRecord, Id, Method,
    OptimizerConfig, Planner, PlannerConfig, Table,
};

fn ids(names: &[&str]) -> Vec<Id> {
    names.iter().map(|s| s.to_string()).collect()
}

fn noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap()
}

fn assert_covers(table: &Table, people: &[Id]) {
    let seen: Vec<&Id> = table.members().collect();
    assert_eq!(seen.len(), people.len(), "{table:?}");
    let unique: HashSet<&Id> = seen.iter().copied().collect();
    assert_eq!(unique, people.iter().collect::<HashSet<_>>());
}

#[test]
fn eight_strangers_weighted_random() {
    let people = ids(&["A", "B", "C", "D", "E", "F", "G", "H"]);
    let today = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let weights = compute_weights(&people, &[], today, &AffinityParams::default());
    assert_eq!(weights.len(), 28);
    assert!(weights.iter().all(|(_, _, w)| w == -0.5));

    let config = OptimizerConfig { method: Method::WeightedRandom, ..OptimizerConfig::default() };
    let mut rng = SmallRng::seed_from_u64(8);
    let outcome = partition(&people, &weights, &config, &mut rng);
    assert_eq!(outcome.method_used, Method::WeightedRandom);
    assert_eq!(outcome.table.sizes(), vec![4, 4]);
    assert_covers(&outcome.table, &people);
}

#[test]
fn decayed_weight_after_ten_weeks() {
    let met = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let history = vec![AssignmentRecord::new(noon(met), vec![ids(&["A", "B"])]).unwrap()];
    let weights = compute_weights(&ids(&["A", "B"]), &history, met + Duration::weeks(10), &AffinityParams::default());
    let w = weights.get_pair("A", "B").unwrap();
    assert!((w - 0.300).abs() < 1e-3, "{w}");
}

#[test]
fn every_size_partitions_cleanly() {
    let config = OptimizerConfig { anneal: team_shuffle::AnnealParams { max_iter: 300, ..Default::default() }, ..Default::default() };
    for n in 0..=30 {
        let people: Vec<Id> = (0..n).map(|i| format!("member-{i}")).collect();
        let weights = compute_weights(&people, &[], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &AffinityParams::default());
        let mut rng = SmallRng::seed_from_u64(n as u64);
        let outcome = partition(&people, &weights, &config, &mut rng);
        assert_covers(&outcome.table, &people);
        let mut sizes = outcome.table.sizes();
        let mut expected = team_shuffle::sizes_for(n);
        sizes.sort();
        expected.sort();
        assert_eq!(sizes, expected, "n = {n}");
        let expected_method = if n < 8 { Method::WeightedRandom } else { Method::SimulatedAnnealing };
        assert_eq!(outcome.method_used, expected_method, "n = {n}");
    }
}

#[test]
fn annealing_separates_last_weeks_groups() {
    let people: Vec<Id> = (0..12).map(|i| format!("p{i:02}")).collect();
    let last_week = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let groups: Vec<Vec<Id>> = people.chunks(4).map(|c| c.to_vec()).collect();
    let history = vec![AssignmentRecord::new(noon(last_week), groups.clone()).unwrap()];
    let weights = compute_weights(&people, &history, last_week + Duration::weeks(1), &AffinityParams::default());

    let config = OptimizerConfig {
        anneal: team_shuffle::AnnealParams { initial_temp: 2.0, cooling_rate: 0.999, temp_min: 0.05, max_iter: 5000 },
        ..OptimizerConfig::default()
    };
    let mut rng = SmallRng::seed_from_u64(3);
    let outcome = partition(&people, &weights, &config, &mut rng);
    let summary = outcome.anneal.clone().unwrap();
    assert!(summary.best_cost <= summary.initial_cost);
    assert!((total_cost(&outcome.table, &weights, 3.0) - summary.best_cost).abs() < 1e-9);

    // Four members drawn from three old groups repeat at least one pair, so three is the floor.
    let repeats = outcome
        .table
        .groups
        .iter()
        .map(|g| {
            groups
                .iter()
                .map(|old| {
                    let k = g.members.iter().filter(|m| old.contains(*m)).count();
                    k * k.saturating_sub(1) / 2
                })
                .sum::<usize>()
        })
        .sum::<usize>();
    assert_eq!(repeats, 3, "{:?}", outcome.table);
}

#[test]
fn planner_over_stored_history() {
    let json = r#"[
        {"date": "2024-04-01T19:00:00", "groups": [["A","B","C","D"],["E","F","G","H"]],
         "method_used": "simulated_annealing", "lambda_value": 3.0, "participants_count": 8},
        {"date": "garbage", "groups": [["A","E"]]},
        {"date": "2024-04-08T19:00:00", "groups": [["A","E","C","G"],["B","F","D","H"]]}
    ]"#;
    let history = parse_history(json).unwrap();
    assert_eq!(history.len(), 2);

    let mut config = PlannerConfig::default();
    config.optimizer.seed = Some(17);
    let mut planner = Planner::new(config).unwrap();
    let people = ids(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]);
    let now = noon(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
    let plan = planner.plan(&people, &history, now);

    assert_covers(&plan.groups, &people);
    assert_eq!(plan.groups.sizes(), vec![4, 5]);
    assert_eq!(plan.record.participants_count, Some(9));

    let json = serde_json::to_string(&[plan.record.clone()]).unwrap();
    let reread = parse_history(&json).unwrap();
    assert_eq!(reread, vec![plan.record.clone()]);

    // "I" never appeared before, so each of its pairs has exactly the new meeting or none.
    let row = &plan.cooccurrence["I"];
    assert_eq!(row.len(), 8);
    assert!(row.values().all(|info| info.count <= 1));
}
