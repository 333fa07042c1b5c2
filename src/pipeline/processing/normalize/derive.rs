use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use super::coerce;
use super::config::DesignationBands;
use super::record::Designation;
use super::resolver::{Resolved, ResolvedName};

/// How the id column was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "strategy", content = "count")]
pub enum IdStrategy {
    /// Every source id was valid
    Kept,
    /// This many rows got ids above the largest valid source id
    Backfilled(usize),
    /// No usable source ids; dense sequence from 1
    Regenerated,
}

/// Full names for every row from whatever the name rules resolved.
/// Pair parts are joined with one space, skipping empty parts.
pub fn full_names(name: Option<&ResolvedName>, rows: usize) -> Vec<String> {
    match name {
        None => vec![String::new(); rows],
        Some(ResolvedName::Single(resolved)) => resolved
            .values
            .iter()
            .map(|v| coerce::text(v).unwrap_or_default())
            .collect(),
        Some(ResolvedName::Pair { first, last }) => (0..rows)
            .map(|row| {
                let part = |side: &Option<Resolved>| {
                    side.as_ref()
                        .and_then(|r| r.values.get(row))
                        .and_then(coerce::text)
                        .unwrap_or_default()
                };
                join_name_parts(&part(first), &part(last))
            })
            .collect(),
    }
}

pub fn join_name_parts(first: &str, last: &str) -> String {
    match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{} {}", first, last),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (true, true) => String::new(),
    }
}

pub fn designations(years: &[u32], bands: &DesignationBands) -> Vec<Designation> {
    years
        .iter()
        .map(|y| Designation::from_years(*y, bands))
        .collect()
}

/// Final ids for the batch. Non-positive, unparsable and repeated ids count
/// as missing. With at least one valid id the gaps are filled in row order
/// from `max + 1`; otherwise the whole column is regenerated from 1.
pub fn assign_ids(source: Option<&[Value]>, rows: usize) -> (Vec<i64>, IdStrategy) {
    let regenerated = || ((1..=rows as i64).collect::<Vec<_>>(), IdStrategy::Regenerated);

    let Some(values) = source else {
        return regenerated();
    };

    let mut seen = BTreeSet::new();
    let candidates: Vec<Option<i64>> = values
        .iter()
        .map(|v| coerce::integer(v).filter(|id| *id > 0 && seen.insert(*id)))
        .collect();

    let Some(max) = candidates.iter().flatten().copied().max() else {
        return regenerated();
    };

    let missing = candidates.iter().filter(|c| c.is_none()).count();
    if missing == 0 {
        return (candidates.into_iter().flatten().collect(), IdStrategy::Kept);
    }
    if max.checked_add(missing as i64).is_none() {
        return regenerated();
    }

    let mut next = max;
    let ids = candidates
        .into_iter()
        .map(|c| {
            c.unwrap_or_else(|| {
                next += 1;
                next
            })
        })
        .collect();
    (ids, IdStrategy::Backfilled(missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(source: &str, values: Vec<Value>) -> Resolved {
        Resolved {
            source: source.to_string(),
            values,
        }
    }

    #[test]
    fn test_ids_backfill_from_max() {
        let values = vec![json!(1), Value::Null, json!(3)];
        assert_eq!(
            assign_ids(Some(values.as_slice()), 3),
            (vec![1, 4, 3], IdStrategy::Backfilled(1))
        );
    }

    #[test]
    fn test_ids_all_null_or_zero_regenerate() {
        let nulls = vec![Value::Null, Value::Null];
        let zeros = vec![json!(0), json!(0)];
        assert_eq!(assign_ids(Some(nulls.as_slice()), 2), (vec![1, 2], IdStrategy::Regenerated));
        assert_eq!(assign_ids(Some(zeros.as_slice()), 2), (vec![1, 2], IdStrategy::Regenerated));
    }

    #[test]
    fn test_ids_non_numeric_column_regenerates() {
        let values = vec![json!("a1"), json!("b2"), json!("c3")];
        assert_eq!(assign_ids(Some(values.as_slice()), 3).0, vec![1, 2, 3]);
    }

    #[test]
    fn test_ids_absent_column_regenerates() {
        assert_eq!(assign_ids(None, 3), (vec![1, 2, 3], IdStrategy::Regenerated));
        assert_eq!(assign_ids(None, 0), (vec![], IdStrategy::Regenerated));
    }

    #[test]
    fn test_ids_kept_when_all_valid() {
        let values = vec![json!("7"), json!(2.0), json!(9)];
        assert_eq!(assign_ids(Some(values.as_slice()), 3), (vec![7, 2, 9], IdStrategy::Kept));
    }

    #[test]
    fn test_ids_duplicates_and_negatives_are_backfilled() {
        let values = vec![json!(5), json!(5), json!(-1), json!(0), json!(2)];
        let (ids, strategy) = assign_ids(Some(values.as_slice()), 5);
        assert_eq!(ids, vec![5, 6, 7, 8, 2]);
        assert_eq!(strategy, IdStrategy::Backfilled(3));
    }

    #[test]
    fn test_ids_overflow_regenerates() {
        let values = vec![json!(i64::MAX), Value::Null];
        assert_eq!(assign_ids(Some(values.as_slice()), 2).0, vec![1, 2]);
    }

    #[test]
    fn test_join_name_parts() {
        assert_eq!(join_name_parts("John", "Doe"), "John Doe");
        assert_eq!(join_name_parts("Jane", ""), "Jane");
        assert_eq!(join_name_parts("", "Smith"), "Smith");
        assert_eq!(join_name_parts("", ""), "");
    }

    #[test]
    fn test_full_names_pair_and_single() {
        let pair = ResolvedName::Pair {
            first: Some(resolved("first_name", vec![json!("John"), json!("Jane")])),
            last: Some(resolved("last_name", vec![json!("Doe"), Value::Null])),
        };
        assert_eq!(full_names(Some(&pair), 2), vec!["John Doe", "Jane"]);

        let single = ResolvedName::Single(resolved("name", vec![json!("Ada L"), Value::Null]));
        assert_eq!(full_names(Some(&single), 2), vec!["Ada L", ""]);

        assert_eq!(full_names(None, 2), vec!["", ""]);
    }

    #[test]
    fn test_designations_follow_years() {
        let bands = DesignationBands::default();
        assert_eq!(
            designations(&[0, 2, 4, 8, 12], &bands),
            vec![
                Designation::Unknown,
                Designation::SystemEngineer,
                Designation::DataEngineer,
                Designation::SeniorDataEngineer,
                Designation::Lead,
            ]
        );
    }
}
