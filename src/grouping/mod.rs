use crate::datamodel::{Row, find_column};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sentinel category filter value meaning "no filter".
pub const ALL_CATEGORIES: &str = "__ALL__";

const CATEGORY_CANDIDATES: &[&str] = &["category"];
const ROUTE_CANDIDATES: &[&str] = &["route"];
const GENERIC_NAME_CANDIDATES: &[&str] = &["generic name", "generic"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGroup {
    pub route: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: String,
    pub routes: Vec<RouteGroup>,
}

/// Rows partitioned by category then route, plus the number of rows that
/// survived filtering (independent of grouping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedTable {
    pub category_column: Option<String>,
    pub route_column: Option<String>,
    pub groups: Vec<CategoryGroup>,
    pub filtered_count: usize,
}

// Case-insensitive ordering with a case-sensitive tiebreak, standing in for
// locale-aware collation on the all-ASCII data this table holds in practice.
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn bucket_label(row: &Row, column: Option<&str>, default: &str) -> String {
    match column {
        Some(col) => {
            let value = row.value(col).trim();
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        }
        // No column to group on at all: everything lands in one bucket.
        None => "All".to_string(),
    }
}

/// The display transformation: filter by category and search query, then
/// partition category -> route, sorting rows inside each bucket by the
/// generic-name column when one exists.
pub fn group_rows(
    columns: &[String],
    rows: &[Row],
    category_filter: &str,
    search_query: &str,
) -> GroupedTable {
    let category_col = find_column(columns, CATEGORY_CANDIDATES);
    let route_col = find_column(columns, ROUTE_CANDIDATES);
    let generic_col = find_column(columns, GENERIC_NAME_CANDIDATES);
    let query = search_query.trim().to_lowercase();

    let filtered: Vec<&Row> = rows
        .iter()
        .filter(|row| {
            if !category_filter.is_empty() && category_filter != ALL_CATEGORIES {
                if let Some(col) = category_col {
                    if row.value(col).trim() != category_filter {
                        return false;
                    }
                }
            }
            if !query.is_empty() {
                let haystack = columns
                    .iter()
                    .map(|c| row.value(c))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                if !haystack.contains(&query) {
                    return false;
                }
            }
            true
        })
        .collect();
    let filtered_count = filtered.len();

    let mut by_category: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in &filtered {
        let category = bucket_label(row, category_col, "Uncategorized");
        by_category.entry(category).or_default().push(row);
    }

    let mut categories: Vec<String> = by_category.keys().cloned().collect();
    categories.sort_by(|a, b| locale_cmp(a, b));

    let mut groups = Vec::with_capacity(categories.len());
    for category in categories {
        let rows_in_category = &by_category[&category];

        let mut by_route: HashMap<String, Vec<&Row>> = HashMap::new();
        for row in rows_in_category {
            let route = bucket_label(row, route_col, "Other");
            by_route.entry(route).or_default().push(row);
        }

        let mut route_names: Vec<String> = by_route.keys().cloned().collect();
        route_names.sort_by(|a, b| locale_cmp(a, b));

        let routes = route_names
            .into_iter()
            .map(|route| {
                let mut bucket: Vec<Row> =
                    by_route[&route].iter().map(|r| (*r).clone()).collect();
                if let Some(col) = generic_col {
                    // Vec::sort_by is stable, ties keep their original order.
                    bucket.sort_by(|a, b| locale_cmp(a.value(col), b.value(col)));
                }
                RouteGroup { route, rows: bucket }
            })
            .collect();

        groups.push(CategoryGroup { category, routes });
    }

    GroupedTable {
        category_column: category_col.map(str::to_string),
        route_column: route_col.map(str::to_string),
        groups,
        filtered_count,
    }
}
