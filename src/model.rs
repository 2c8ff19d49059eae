pub mod entity {
    use itertools::Itertools;

    pub type Id = String;

    pub fn dedup(ids: &[Id]) -> Vec<Id> {
        ids.iter().unique().cloned().collect()
    }
}


pub mod group {
    use serde::{Deserialize, Serialize};
    use super::entity::Id;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Group {
        pub members: Vec<Id>,
    }

    impl Group {
        pub fn len(&self) -> usize {
            self.members.len()
        }

        pub fn is_empty(&self) -> bool {
            self.members.is_empty()
        }
    }

    impl From<Vec<Id>> for Group {
        fn from(members: Vec<Id>) -> Self {
            Group { members }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Table {
        pub groups: Vec<Group>,
    }

    impl Table {
        pub fn len(&self) -> usize {
            self.groups.len()
        }

        pub fn is_empty(&self) -> bool {
            self.groups.is_empty()
        }

        pub fn sizes(&self) -> Vec<usize> {
            self.groups.iter().map(Group::len).collect()
        }

        pub fn members(&self) -> impl Iterator<Item = &Id> {
            self.groups.iter().flat_map(|g| g.members.iter())
        }

        pub fn into_groups(self) -> Vec<Vec<Id>> {
            self.groups.into_iter().map(|g| g.members).collect()
        }
    }

    impl From<Vec<Vec<Id>>> for Table {
        fn from(groups: Vec<Vec<Id>>) -> Self {
            Table { groups: groups.into_iter().map(Group::from).collect() }
        }
    }
}


pub mod history {
    use std::collections::HashSet;

    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Serialize};

    use super::entity::Id;
    use crate::config::Method;
    use crate::error::RecordError;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(try_from = "StoredRecord")]
    pub struct AssignmentRecord {
        #[serde(rename = "date")]
        pub timestamp: NaiveDateTime,
        pub groups: Vec<Vec<Id>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub method_used: Option<Method>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub lambda_value: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub participants_count: Option<usize>,
    }

    impl AssignmentRecord {
        pub fn new(timestamp: NaiveDateTime, groups: Vec<Vec<Id>>) -> Result<Self, RecordError> {
            let mut seen = HashSet::new();
            for member in groups.iter().flatten() {
                if !seen.insert(member.as_str()) {
                    return Err(RecordError::DuplicateMember(member.clone()));
                }
            }
            Ok(AssignmentRecord {
                timestamp,
                groups,
                method_used: None,
                lambda_value: None,
                participants_count: None,
            })
        }

        pub fn date(&self) -> NaiveDate {
            self.timestamp.date()
        }
    }

    #[derive(Deserialize)]
    struct StoredRecord {
        date: NaiveDateTime,
        groups: Vec<Vec<Id>>,
        #[serde(default)]
        method_used: Option<Method>,
        #[serde(default)]
        lambda_value: Option<f64>,
        #[serde(default)]
        participants_count: Option<usize>,
    }

    impl TryFrom<StoredRecord> for AssignmentRecord {
        type Error = RecordError;

        fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
            let mut record = AssignmentRecord::new(stored.date, stored.groups)?;
            record.method_used = stored.method_used;
            record.lambda_value = stored.lambda_value;
            record.participants_count = stored.participants_count;
            Ok(record)
        }
    }

}


pub mod condition {
    use std::collections::HashMap;
    use super::entity::Id;

    pub type Score = f64;

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct PairWeights {
        scores: HashMap<(Id, Id), Score>,
    }

    fn key(a: &str, b: &str) -> (Id, Id) {
        if a <= b {
            (a.to_owned(), b.to_owned())
        } else {
            (b.to_owned(), a.to_owned())
        }
    }

    impl PairWeights {
        pub fn new() -> PairWeights {
            PairWeights { scores: HashMap::new() }
        }

        pub fn set_pair(&mut self, a: &str, b: &str, score: Score) {
            self.scores.insert(key(a, b), score);
        }

        pub fn get_pair(&self, a: &str, b: &str) -> Option<Score> {
            self.scores.get(&key(a, b)).copied()
        }

        pub fn len(&self) -> usize {
            self.scores.len()
        }

        pub fn is_empty(&self) -> bool {
            self.scores.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = (&Id, &Id, Score)> {
            self.scores.iter().map(|((a, b), s)| (a, b, *s))
        }
    }
}
