use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::affinity::{compute_weights, cooccurrence_info, CooccurrenceInfo};
use crate::anneal::{AnnealObserver, AnnealSummary};
use crate::config::{Method, PlannerConfig};
use crate::error::ConfigError;
use crate::model::condition::PairWeights;
use crate::model::entity::{self, Id};
use crate::model::group::Table;
use crate::model::history::AssignmentRecord;
use crate::partition::partition_with;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub groups: Table,
    pub method_used: Method,
    pub record: AssignmentRecord,
    pub cooccurrence: BTreeMap<Id, BTreeMap<Id, CooccurrenceInfo>>,
    pub anneal: Option<AnnealSummary>,
}

pub struct Planner {
    config: PlannerConfig,
    rng: SmallRng,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Result<Planner, ConfigError> {
        config.validate()?;
        let rng = match config.optimizer.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Planner { config, rng })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn weights(&self, participants: &[Id], history: &[AssignmentRecord], today: NaiveDate) -> PairWeights {
        compute_weights(participants, history, today, &self.config.affinity)
    }

    pub fn cooccurrence(
        &self,
        participants: &[Id],
        history: &[AssignmentRecord],
        today: NaiveDate,
    ) -> BTreeMap<Id, BTreeMap<Id, CooccurrenceInfo>> {
        cooccurrence_info(participants, history, today, &self.config.affinity)
    }

    pub fn plan(&mut self, participants: &[Id], history: &[AssignmentRecord], now: NaiveDateTime) -> Plan {
        self.plan_with(participants, history, now, &mut ())
    }

    #[instrument(skip_all, fields(participants = participants.len(), records = history.len()))]
    pub fn plan_with<O>(
        &mut self,
        participants: &[Id],
        history: &[AssignmentRecord],
        now: NaiveDateTime,
        observer: &mut O,
    ) -> Plan
    where
        O: AnnealObserver + ?Sized,
    {
        let ids = entity::dedup(participants);
        if ids.len() != participants.len() {
            warn!(dropped = participants.len() - ids.len(), "duplicate participants ignored");
        }
        let today = now.date();
        let weights = self.weights(&ids, history, today);
        let optimizer = &self.config.optimizer;
        let outcome = partition_with(&ids, &weights, optimizer, &mut self.rng, observer);

        let record = AssignmentRecord {
            timestamp: now,
            groups: outcome.table.clone().into_groups(),
            method_used: Some(outcome.method_used),
            lambda_value: Some(optimizer.lam),
            participants_count: Some(ids.len()),
        };
        let mut updated = history.to_vec();
        updated.push(record.clone());
        let cooccurrence = self.cooccurrence(&ids, &updated, today);

        info!(
            groups = outcome.table.len(),
            method = %outcome.method_used,
            best_cost = ?outcome.anneal.as_ref().map(|s| s.best_cost),
            "plan ready"
        );
        Plan {
            groups: outcome.table,
            method_used: outcome.method_used,
            record,
            cooccurrence,
            anneal: outcome.anneal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<Id> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn seeded(seed: u64) -> Planner {
        let mut config = PlannerConfig::default();
        config.optimizer.seed = Some(seed);
        Planner::new(config).unwrap()
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = PlannerConfig::default();
        config.affinity.decay_rate = 0.0;
        assert!(Planner::new(config).is_err());
    }

    #[test]
    fn record_carries_metadata() {
        let mut planner = seeded(1);
        let people = ids(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]);
        let now = noon(2024, 6, 3);
        let plan = planner.plan(&people, &[], now);

        assert_eq!(plan.method_used, Method::SimulatedAnnealing);
        assert_eq!(plan.record.timestamp, now);
        assert_eq!(plan.record.groups, plan.groups.clone().into_groups());
        assert_eq!(plan.record.method_used, Some(Method::SimulatedAnnealing));
        assert_eq!(plan.record.lambda_value, Some(3.0));
        assert_eq!(plan.record.participants_count, Some(9));
        assert!(plan.anneal.is_some());
    }

    #[test]
    fn cooccurrence_includes_new_record() {
        let mut planner = seeded(2);
        let people = ids(&["A", "B", "C", "D"]);
        let plan = planner.plan(&people, &[], noon(2024, 6, 3));

        assert_eq!(plan.method_used, Method::WeightedRandom);
        let ab = &plan.cooccurrence["A"]["B"];
        assert_eq!(ab.count, 1);
        assert_eq!(ab.weeks_ago, Some(0));
        assert!(ab.weight > 0.0);
    }

    #[test]
    fn same_seed_same_plan() {
        let people = ids(&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"]);
        let now = noon(2024, 6, 3);
        let first = seeded(99).plan(&people, &[], now);
        let second = seeded(99).plan(&people, &[], now);
        assert_eq!(first.groups, second.groups);
    }
}
