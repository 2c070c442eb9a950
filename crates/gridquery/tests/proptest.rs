//! Property-based tests for the query pipeline using proptest.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use gridquery::{
    AggregateFunction, FieldDef, FieldKind, FilterNode, GroupDescriptor, Number, Operator, QueryExt,
    QueryRequest, Record, Scalar, Value,
};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Person {
    id: i64,
    age: i64,
    name: String,
    score: Option<i64>,
    born: NaiveDateTime,
}

impl Record for Person {
    fn fields() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            FieldDef::new("id", FieldKind::Number, false),
            FieldDef::new("age", FieldKind::Number, false),
            FieldDef::new("name", FieldKind::String, false),
            FieldDef::new("score", FieldKind::Number, true),
            FieldDef::new("born", FieldKind::DateTime, false),
        ];
        FIELDS
    }

    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::I64(self.id)),
            "age" => Value::Number(Number::I64(self.age)),
            "name" => Value::String(&self.name),
            "score" => self.score.map_or(Value::Null, |s| Value::Number(Number::I64(s))),
            "born" => Value::DateTime(self.born),
            _ => Value::Null,
        }
    }
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 28)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

// Ages cluster so that groups and ties are common.
fn people_strategy() -> impl Strategy<Value = Vec<Person>> {
    prop::collection::vec(
        (
            20i64..30,
            "[a-c]{1,3}",
            prop::option::of(-50i64..50),
            0i64..(4 * 24 * 3600),
        ),
        0..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (age, name, score, offset))| Person {
                id: i as i64,
                age,
                name,
                score,
                born: base_time() + Duration::seconds(offset),
            })
            .collect()
    })
}

fn ids(rows: &[&Person]) -> Vec<i64> {
    rows.iter().map(|p| p.id).collect()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// `total` matches an independent count of matching records.
    #[test]
    fn total_matches_reference_count(people in people_strategy(), threshold in 18i64..32) {
        let request = QueryRequest::new()
            .take(5)
            .filter(FilterNode::leaf("age", Operator::Gte, threshold));

        let result = people.query(&request).unwrap();
        let expected = people.iter().filter(|p| p.age >= threshold).count();

        prop_assert_eq!(result.total, expected);
        prop_assert!(result.rows().len() <= 5);
    }

    /// The same window over the same sort returns the same rows, and those
    /// rows are the window of the fully sorted set.
    #[test]
    fn paging_is_idempotent(people in people_strategy(), skip in 0usize..70, take in 1usize..20) {
        let request = QueryRequest::new().take(take).skip(skip).sort_asc("age").sort_desc("id");

        let first = people.query(&request).unwrap();
        let second = people.query(&request).unwrap();
        prop_assert_eq!(ids(first.rows()), ids(second.rows()));

        let all = people
            .query(&QueryRequest::new().sort_asc("age").sort_desc("id"))
            .unwrap();
        let window: Vec<i64> = ids(all.rows()).into_iter().skip(skip).take(take).collect();
        prop_assert_eq!(ids(first.rows()), window);
    }

    /// `count` on a nullable field counts non-null values; on a
    /// non-nullable field it equals the total.
    #[test]
    fn count_respects_nullability(people in people_strategy()) {
        let request = QueryRequest::new()
            .aggregate("score", AggregateFunction::Count)
            .aggregate("age", AggregateFunction::Count);

        let result = people.query(&request).unwrap();
        let non_null = people.iter().filter(|p| p.score.is_some()).count() as i64;

        prop_assert_eq!(
            result.aggregate("score", AggregateFunction::Count),
            Some(&Scalar::from(non_null))
        );
        prop_assert_eq!(
            result.aggregate("age", AggregateFunction::Count),
            Some(&Scalar::from(result.total as i64))
        );
    }

    /// Aggregates cover the filtered set, not the page.
    #[test]
    fn sum_ignores_paging(people in people_strategy(), threshold in 18i64..32) {
        let request = QueryRequest::new()
            .take(1)
            .filter(FilterNode::leaf("age", Operator::Lt, threshold))
            .aggregate("age", AggregateFunction::Sum);

        let result = people.query(&request).unwrap();
        let expected: i64 = people.iter().filter(|p| p.age < threshold).map(|p| p.age).sum();

        prop_assert_eq!(
            result.aggregate("age", AggregateFunction::Sum),
            Some(&Scalar::from(expected))
        );
    }

    /// Flattening the group tree reproduces the filtered, sorted set.
    #[test]
    fn group_leaves_flatten_to_sorted_set(people in people_strategy(), threshold in 18i64..32) {
        let request = QueryRequest::new()
            .sort_asc("id")
            .filter(FilterNode::leaf("age", Operator::Gte, threshold))
            .group_by(GroupDescriptor::asc("age"))
            .group_by(GroupDescriptor::desc("name"));

        let result = people.query(&request).unwrap();
        prop_assert!(result.data.is_none());

        let flattened: Vec<i64> = result
            .groups()
            .iter()
            .flat_map(|group| group.records())
            .map(|p| p.id)
            .collect();

        // Group keys lead the sort, then the requested keys.
        let mut expected: Vec<&Person> = people.iter().filter(|p| p.age >= threshold).collect();
        expected.sort_by(|a, b| {
            a.age
                .cmp(&b.age)
                .then_with(|| b.name.cmp(&a.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        prop_assert_eq!(flattened, ids(&expected));

        let group_total: usize = result.groups().iter().map(|g| g.count).sum();
        prop_assert_eq!(group_total, result.total);
        for group in result.groups() {
            prop_assert!(group.has_subgroups());
        }
    }

    /// `eq` on a date/time matches exactly the calendar day of the literal.
    #[test]
    fn date_equality_matches_the_day(people in people_strategy()) {
        let request = QueryRequest::new()
            .filter(FilterNode::leaf("born", Operator::Eq, "2024-03-01T15:30:00"));

        let result = people.query(&request).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let expected: Vec<i64> = people.iter().filter(|p| p.born.date() == day).map(|p| p.id).collect();

        prop_assert_eq!(ids(result.rows()), expected);
    }

    /// Repeating a leaf back to back changes nothing.
    #[test]
    fn adjacent_duplicate_leaves_are_idempotent(people in people_strategy(), threshold in 18i64..32) {
        let once = QueryRequest::new().filter(FilterNode::leaf("age", Operator::Eq, threshold));
        let twice = QueryRequest::new().filter(FilterNode::and([
            FilterNode::leaf("age", Operator::Eq, threshold),
            FilterNode::leaf("age", Operator::Eq, threshold),
        ]));

        let a = people.query(&once).unwrap();
        let b = people.query(&twice).unwrap();
        prop_assert_eq!(ids(a.rows()), ids(b.rows()));
    }

    /// An empty filter keeps everything, in input order when unpaged.
    #[test]
    fn empty_filter_matches_all(people in people_strategy()) {
        let request = QueryRequest::new().filter(FilterNode::and([]));
        let result = people.query(&request).unwrap();

        prop_assert_eq!(result.total, people.len());
        let expected: Vec<i64> = people.iter().map(|p| p.id).collect();
        prop_assert_eq!(ids(result.rows()), expected);
    }
}
