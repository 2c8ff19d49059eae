use itertools::Itertools;

use crate::action::{ActionError, ActionResult, Index, Position, Swap};
use crate::model::condition::{PairWeights, Score};
use crate::model::entity::Id;

/// Annealing cost of one pair: bonuses pass through, penalties saturate below 1.
pub fn pair_cost(weight: Score, lam: f64) -> Score {
    if weight < 0.0 {
        weight
    } else {
        1.0 - (-lam * weight).exp()
    }
}

/// Pairs missing from the weight map count as weight 0.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    n: usize,
    costs: Vec<Score>,
}

impl CostMatrix {
    pub fn build<F>(participants: &[Id], weights: &PairWeights, transform: F) -> CostMatrix
    where
        F: Fn(Score) -> Score,
    {
        let n = participants.len();
        let mut costs = vec![0.0; n * n];
        for (i, j) in (0..n).tuple_combinations() {
            let weight = weights.get_pair(&participants[i], &participants[j]).unwrap_or(0.0);
            let cost = transform(weight);
            costs[i * n + j] = cost;
            costs[j * n + i] = cost;
        }
        CostMatrix { n, costs }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, a: Index, b: Index) -> Score {
        self.costs[a * self.n + b]
    }

    pub fn group_cost(&self, members: &[Index]) -> Score {
        members
            .iter()
            .tuple_combinations()
            .map(|(a, b)| self.get(*a, *b))
            .sum()
    }

    pub fn table_cost(&self, groups: &[Vec<Index>]) -> Score {
        groups.iter().map(|g| self.group_cost(g)).sum()
    }
}

#[derive(Debug, Clone)]
struct CachedMember {
    pub member: Index,
    /// Sum of costs to every other member of the same group.
    pub score: Score,
}

impl CachedMember {
    fn create(members: &[Index], position: usize, costs: &CostMatrix) -> CachedMember {
        let member = members[position];
        CachedMember { member, score: score_against(member, members, position, costs) }
    }
}

fn score_against(member: Index, members: &[Index], skip: usize, costs: &CostMatrix) -> Score {
    members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(_, other)| costs.get(member, *other))
        .sum()
}

#[derive(Debug, Clone)]
struct GroupCache {
    pub members: Vec<CachedMember>,
    pub penalty_score: Score,
}

impl GroupCache {
    fn create(members: &[Index], costs: &CostMatrix) -> GroupCache {
        GroupCache {
            members: (0..members.len())
                .map(|pos| CachedMember::create(members, pos, costs))
                .collect(),
            penalty_score: costs.group_cost(members),
        }
    }

    fn indices(&self) -> Vec<Index> {
        self.members.iter().map(|m| m.member).collect()
    }

    fn simulate_replace(&self, index: usize, incoming: Index, costs: &CostMatrix) -> Result<Score, ActionError> {
        let removed = self.members.get(index).ok_or(ActionError::InvalidPosition)?;
        let added: Score = self.members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, m)| costs.get(incoming, m.member))
            .sum();
        Ok(added - removed.score)
    }

    fn replace(&mut self, index: usize, incoming: Index, costs: &CostMatrix) -> Result<Index, ActionError> {
        let diff = self.simulate_replace(index, incoming, costs)?;
        let outgoing = self.members[index].member;
        let mut incoming_score = 0.0;
        for (i, m) in self.members.iter_mut().enumerate() {
            if i == index {
                continue;
            }
            let gained = costs.get(incoming, m.member);
            m.score += gained - costs.get(outgoing, m.member);
            incoming_score += gained;
        }
        self.members[index] = CachedMember { member: incoming, score: incoming_score };
        self.penalty_score += diff;
        Ok(outgoing)
    }
}

#[derive(Debug, Clone)]
pub struct TableCache {
    groups: Vec<GroupCache>,
    pub penalty_score: Score,
}

impl TableCache {
    pub fn create(groups: &[Vec<Index>], costs: &CostMatrix) -> TableCache {
        let groups: Vec<GroupCache> = groups.iter().map(|g| GroupCache::create(g, costs)).collect();
        let penalty_score = groups.iter().map(|g| g.penalty_score).sum();
        TableCache { groups, penalty_score }
    }

    pub fn group_sizes(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.members.len()).collect()
    }

    pub fn member(&self, position: &Position) -> Option<Index> {
        self.groups
            .get(position.group_index)?
            .members
            .get(position.member_index)
            .map(|m| m.member)
    }

    pub fn to_indices(&self) -> Vec<Vec<Index>> {
        self.groups.iter().map(GroupCache::indices).collect()
    }

    fn check(&self, swap: &Swap) -> Result<(Index, Index), ActionError> {
        let Swap(p1, p2) = swap;
        if p1.group_index == p2.group_index {
            return Err(ActionError::SameGroup(p1.group_index));
        }
        let a = self.member(p1).ok_or(ActionError::InvalidPosition)?;
        let b = self.member(p2).ok_or(ActionError::InvalidPosition)?;
        Ok((a, b))
    }

    pub fn simulate(&self, swap: &Swap, costs: &CostMatrix) -> ActionResult {
        let result = self.check(swap).and_then(|(a, b)| {
            let Swap(p1, p2) = swap;
            let d1 = self.groups[p1.group_index].simulate_replace(p1.member_index, b, costs)?;
            let d2 = self.groups[p2.group_index].simulate_replace(p2.member_index, a, costs)?;
            Ok(d1 + d2)
        });
        result.into()
    }

    pub fn act(&mut self, swap: &Swap, costs: &CostMatrix) -> Result<Score, ActionError> {
        let (a, b) = self.check(swap)?;
        let Swap(p1, p2) = swap;
        let before = self.groups[p1.group_index].penalty_score + self.groups[p2.group_index].penalty_score;
        self.groups[p1.group_index].replace(p1.member_index, b, costs)?;
        self.groups[p2.group_index].replace(p2.member_index, a, costs)?;
        let diff = self.groups[p1.group_index].penalty_score + self.groups[p2.group_index].penalty_score - before;
        self.penalty_score += diff;
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> (Vec<Id>, CostMatrix) {
        let people: Vec<Id> = ["A", "B", "C", "D", "E", "F"].iter().map(|s| s.to_string()).collect();
        let mut weights = PairWeights::new();
        weights.set_pair("A", "B", 0.9);
        weights.set_pair("C", "D", 0.4);
        weights.set_pair("E", "A", -0.5);
        weights.set_pair("F", "B", 2.0);
        let costs = CostMatrix::build(&people, &weights, |w| pair_cost(w, 3.0));
        (people, costs)
    }

    fn pos(group_index: usize, member_index: usize) -> Position {
        Position { group_index, member_index }
    }

    #[test]
    fn pair_cost_shape() {
        assert_eq!(pair_cost(-0.5, 3.0), -0.5);
        assert_eq!(pair_cost(0.0, 3.0), 0.0);
        assert!(pair_cost(2.0, 3.0) < 1.0);
        assert!(pair_cost(100.0, 3.0) <= 1.0);
        assert!(pair_cost(0.5, 3.0) < pair_cost(0.6, 3.0));
    }

    #[test]
    fn missing_pairs_cost_nothing() {
        let (_, costs) = matrix();
        assert_eq!(costs.get(0, 3), 0.0);
        assert_eq!(costs.get(0, 1), costs.get(1, 0));
        assert_eq!(costs.get(0, 4), -0.5);
    }

    #[test]
    fn simulate_matches_recomputed_cost() {
        let (_, costs) = matrix();
        let groups = vec![vec![0, 1, 2], vec![3, 4, 5]];
        let table = TableCache::create(&groups, &costs);
        assert!((table.penalty_score - costs.table_cost(&groups)).abs() < 1e-12);

        for i in 0..3 {
            for j in 0..3 {
                let swap = Swap(pos(0, i), pos(1, j));
                let diff = table.simulate(&swap, &costs).score_diff().unwrap();
                let mut swapped = groups.clone();
                let tmp = swapped[0][i];
                swapped[0][i] = swapped[1][j];
                swapped[1][j] = tmp;
                let expected = costs.table_cost(&swapped) - costs.table_cost(&groups);
                assert!((diff - expected).abs() < 1e-12, "swap {i} {j}");
            }
        }
    }

    #[test]
    fn act_keeps_cache_consistent() {
        let (_, costs) = matrix();
        let mut table = TableCache::create(&[vec![0, 2, 4], vec![1, 3, 5]], &costs);
        for swap in [Swap(pos(0, 0), pos(1, 2)), Swap(pos(1, 1), pos(0, 2)), Swap(pos(0, 1), pos(1, 0))] {
            let predicted = table.simulate(&swap, &costs).score_diff().unwrap();
            let before = table.penalty_score;
            let diff = table.act(&swap, &costs).unwrap();
            assert!((diff - predicted).abs() < 1e-12);
            assert!((table.penalty_score - before - diff).abs() < 1e-12);
            assert!((table.penalty_score - costs.table_cost(&table.to_indices())).abs() < 1e-9);
        }
        assert_eq!(table.group_sizes(), vec![3, 3]);
    }

    #[test]
    fn rejects_bad_swaps() {
        let (_, costs) = matrix();
        let mut table = TableCache::create(&[vec![0, 1, 2], vec![3, 4, 5]], &costs);
        assert_eq!(
            table.simulate(&Swap(pos(0, 0), pos(0, 1)), &costs),
            ActionResult::Failed(ActionError::SameGroup(0))
        );
        assert_eq!(table.act(&Swap(pos(0, 9), pos(1, 0)), &costs), Err(ActionError::InvalidPosition));
        assert_eq!(table.to_indices(), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }
}
