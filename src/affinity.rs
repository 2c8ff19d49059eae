use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::config::AffinityParams;
use crate::model::condition::{PairWeights, Score};
use crate::model::entity::Id;
use crate::model::history::AssignmentRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooccurrenceInfo {
    pub count: usize,
    pub probability: f64,
    pub last_occurrence: Option<NaiveDate>,
    pub last_week: Option<i64>,
    pub weeks_ago: Option<i64>,
    pub weight: Score,
}

#[derive(Debug, Clone, Copy)]
struct Meetings {
    count: usize,
    last: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
struct PairStats {
    meetings: Option<Meetings>,
    last_week: Option<i64>,
    weeks_ago: Option<i64>,
    weight: Score,
}

/// 1-based week number of `date` counted from `base`.
fn week(date: NaiveDate, base: NaiveDate) -> i64 {
    (date - base).num_days().div_euclid(7) + 1
}

fn score_pair(
    meetings: Option<Meetings>,
    base: NaiveDate,
    now: NaiveDate,
    params: &AffinityParams,
) -> PairStats {
    let Some(m) = meetings else {
        return PairStats {
            meetings: None,
            last_week: None,
            weeks_ago: None,
            weight: params.first_meeting_bonus,
        };
    };
    let frequency_score = (-params.k_freq * m.count as f64).exp();
    let last_week = week(m.last, base);
    let weeks_ago = week(now, base) - last_week;
    let recency_score = if weeks_ago <= 0 {
        params.base_penalty
    } else {
        params.base_penalty * params.decay_rate.powi(weeks_ago.min(i32::MAX as i64) as i32)
    };
    PairStats {
        meetings: Some(m),
        last_week: Some(last_week),
        weeks_ago: Some(weeks_ago),
        weight: params.frequency_weight * frequency_score + params.recency_weight * recency_score,
    }
}

fn pair_stats(
    participants: &[&str],
    history: &[AssignmentRecord],
    now: NaiveDate,
    params: &AffinityParams,
) -> Vec<((usize, usize), PairStats)> {
    let index: HashMap<&str, usize> = participants
        .iter()
        .enumerate()
        .map(|(i, p)| (*p, i))
        .collect();
    let base = history
        .iter()
        .map(AssignmentRecord::date)
        .min()
        .unwrap_or(now);

    let mut met: HashMap<(usize, usize), Meetings> = HashMap::new();
    for record in history {
        let date = record.date();
        for group in &record.groups {
            let present = group
                .iter()
                .filter_map(|m| index.get(m.as_str()).copied())
                .sorted()
                .dedup();
            for pair in present.combinations(2) {
                met.entry((pair[0], pair[1]))
                    .and_modify(|m| {
                        m.count += 1;
                        m.last = m.last.max(date);
                    })
                    .or_insert(Meetings { count: 1, last: date });
            }
        }
    }
    debug!(
        participants = participants.len(),
        records = history.len(),
        met_pairs = met.len(),
        %base,
        %now,
        "scoring pair affinities"
    );

    (0..participants.len())
        .tuple_combinations()
        .map(|(i, j)| ((i, j), score_pair(met.get(&(i, j)).copied(), base, now, params)))
        .collect()
}

fn unique(participants: &[Id]) -> Vec<&str> {
    participants.iter().map(String::as_str).unique().collect()
}

pub fn compute_weights(
    participants: &[Id],
    history: &[AssignmentRecord],
    now: NaiveDate,
    params: &AffinityParams,
) -> PairWeights {
    let ids = unique(participants);
    let mut weights = PairWeights::new();
    for ((i, j), stats) in pair_stats(&ids, history, now, params) {
        weights.set_pair(ids[i], ids[j], stats.weight);
    }
    weights
}

/// Display transform of a weight; not used by the optimizer.
pub fn probability(weight: Score) -> f64 {
    if weight >= 0.0 {
        (-weight).exp()
    } else {
        weight.exp()
    }
}

pub fn cooccurrence_info(
    participants: &[Id],
    history: &[AssignmentRecord],
    now: NaiveDate,
    params: &AffinityParams,
) -> BTreeMap<Id, BTreeMap<Id, CooccurrenceInfo>> {
    let ids = unique(participants);
    let mut info: BTreeMap<Id, BTreeMap<Id, CooccurrenceInfo>> = ids
        .iter()
        .map(|p| (p.to_string(), BTreeMap::new()))
        .collect();
    for ((i, j), stats) in pair_stats(&ids, history, now, params) {
        let entry = CooccurrenceInfo {
            count: stats.meetings.map_or(0, |m| m.count),
            probability: probability(stats.weight),
            last_occurrence: stats.meetings.map(|m| m.last),
            last_week: stats.last_week,
            weeks_ago: stats.weeks_ago,
            weight: stats.weight,
        };
        if let Some(row) = info.get_mut(ids[j]) {
            row.insert(ids[i].to_string(), entry.clone());
        }
        if let Some(row) = info.get_mut(ids[i]) {
            row.insert(ids[j].to_string(), entry);
        }
    }
    info
}
