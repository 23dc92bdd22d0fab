//! # Ordering Engine
//!
//! In-memory ordering of catalog items by a [`SortField`].
//!
//! Only the primary component of the field's key is applied. Items missing
//! the field always land after items that have it, in either direction, and
//! ties keep their incoming relative order.

use crate::models::CatalogItem;
use crate::query::{SortDirection, SortField, SortOrder};
use std::cmp::Ordering;
use uuid::Uuid;

/// Sort `items` in place by `field`.
///
/// [`SortField::Random`] shuffles instead of comparing.
pub fn sort_items(items: &mut [CatalogItem], field: SortField) {
    let direction = field.primary_direction();

    match field {
        SortField::CommunityRating => items.sort_by(|a, b| {
            compare_present(
                a.community_rating,
                b.community_rating,
                |x, y| x.total_cmp(y),
                direction,
            )
        }),
        SortField::ProductionYear => items.sort_by(|a, b| {
            compare_present(a.production_year, b.production_year, Ord::cmp, direction)
        }),
        SortField::SortName => items.sort_by(|a, b| {
            compare_present(
                a.sort_name.as_deref(),
                b.sort_name.as_deref(),
                Ord::cmp,
                direction,
            )
        }),
        SortField::DateCreated => items.sort_by(|a, b| {
            compare_present(a.date_created, b.date_created, Ord::cmp, direction)
        }),
        SortField::Random => items.sort_by_cached_key(|_| Uuid::new_v4()),
    }
}

/// Apply a grouping's sort order; anything but a field sort leaves the
/// order untouched.
pub fn apply_sort_order(mut items: Vec<CatalogItem>, sort_order: &SortOrder) -> Vec<CatalogItem> {
    if let Some(field) = sort_order.field() {
        sort_items(&mut items, field);
    }
    items
}

/// Present values first, then compare in `direction`.
fn compare_present<T>(
    a: Option<T>,
    b: Option<T>,
    cmp: impl Fn(&T, &T) -> Ordering,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => cmp(&a, &b),
            SortDirection::Descending => cmp(&a, &b).reverse(),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ids(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_rating_descending_missing_last() {
        let mut items = vec![
            CatalogItem::new("five", "A").with_rating(5.0),
            CatalogItem::new("nine", "B").with_rating(9.0),
            CatalogItem::new("none", "C"),
        ];

        sort_items(&mut items, SortField::CommunityRating);
        assert_eq!(ids(&items), vec!["nine", "five", "none"]);
    }

    #[test]
    fn test_missing_last_when_ascending() {
        let named = |id: &str, sort_name: Option<&str>| {
            let mut item = CatalogItem::new(id, id);
            item.sort_name = sort_name.map(String::from);
            item
        };
        let mut items = vec![
            named("none", None),
            named("b", Some("beta")),
            named("a", Some("alpha")),
        ];

        sort_items(&mut items, SortField::SortName);
        assert_eq!(ids(&items), vec!["a", "b", "none"]);
    }

    #[test]
    fn test_ties_keep_incoming_order() {
        let mut items = vec![
            CatalogItem::new("missing-1", "x"),
            CatalogItem::new("first", "x").with_year(1999),
            CatalogItem::new("newer", "x").with_year(2010),
            CatalogItem::new("second", "x").with_year(1999),
            CatalogItem::new("missing-2", "x"),
        ];

        sort_items(&mut items, SortField::ProductionYear);
        assert_eq!(
            ids(&items),
            vec!["newer", "first", "second", "missing-1", "missing-2"]
        );
    }

    #[test]
    fn test_date_created_newest_first() {
        let mut older = CatalogItem::new("older", "x");
        older.date_created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single();
        let mut newer = CatalogItem::new("newer", "x");
        newer.date_created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single();

        let sorted = apply_sort_order(
            vec![older, CatalogItem::new("unknown", "x"), newer],
            &SortOrder::Field(SortField::DateCreated),
        );
        assert_eq!(ids(&sorted), vec!["newer", "older", "unknown"]);
    }

    #[test]
    fn test_random_is_a_permutation() {
        let items: Vec<CatalogItem> = (0..20)
            .map(|n| CatalogItem::new(n.to_string(), "x"))
            .collect();

        let mut shuffled = items.clone();
        sort_items(&mut shuffled, SortField::Random);

        let mut before = ids(&items);
        let mut after = ids(&shuffled);
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_list_order_and_unset_leave_order_alone() {
        let items = vec![
            CatalogItem::new("b", "x").with_rating(1.0),
            CatalogItem::new("a", "x").with_rating(9.0),
        ];

        let kept = apply_sort_order(items.clone(), &SortOrder::ListOrder("imdb_list_order".into()));
        assert_eq!(ids(&kept), vec!["b", "a"]);

        let kept = apply_sort_order(items, &SortOrder::Unset);
        assert_eq!(ids(&kept), vec!["b", "a"]);
    }
}
