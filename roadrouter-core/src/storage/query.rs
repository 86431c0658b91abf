use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{OptimizationCriteria, Route, RouteStatus};

/// Coordinates within this many degrees count as the same place in queries
const COORDINATE_TOLERANCE_DEG: f64 = 0.01;
pub const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters and pagination for listing stored routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteQuery {
    pub source_latitude: Option<f64>,
    pub source_longitude: Option<f64>,
    pub destination_latitude: Option<f64>,
    pub destination_longitude: Option<f64>,
    pub optimization_criteria: Option<OptimizationCriteria>,
    pub status: Option<RouteStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    pub limit: usize,
    pub offset: usize,
    pub sort_order: SortOrder,
}

impl Default for RouteQuery {
    fn default() -> Self {
        Self {
            source_latitude: None,
            source_longitude: None,
            destination_latitude: None,
            destination_longitude: None,
            optimization_criteria: None,
            status: None,
            from_date: None,
            to_date: None,
            min_distance: None,
            max_distance: None,
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
            sort_order: SortOrder::Desc,
        }
    }
}

fn near(expected: Option<f64>, actual: f64) -> bool {
    expected.is_none_or(|value| (actual - value).abs() < COORDINATE_TOLERANCE_DEG)
}

impl RouteQuery {
    pub fn matches(&self, route: &Route) -> bool {
        near(self.source_latitude, route.source.latitude)
            && near(self.source_longitude, route.source.longitude)
            && near(self.destination_latitude, route.destination.latitude)
            && near(self.destination_longitude, route.destination.longitude)
            && self
                .optimization_criteria
                .is_none_or(|criteria| route.optimization_criteria == criteria)
            && self.status.is_none_or(|status| route.status == status)
            && self.from_date.is_none_or(|from| route.calculated_at >= from)
            && self.to_date.is_none_or(|to| route.calculated_at <= to)
            && self.min_distance.is_none_or(|min| route.total_distance >= min)
            && self.max_distance.is_none_or(|max| route.total_distance <= max)
    }

    /// Filters, sorts by `calculated_at` and paginates `routes`
    pub fn apply<'a>(&self, routes: impl IntoIterator<Item = &'a Route>) -> Page<Route> {
        let mut matching: Vec<&Route> = routes.into_iter().filter(|r| self.matches(r)).collect();
        match self.sort_order {
            SortOrder::Asc => matching.sort_by_key(|r| r.calculated_at),
            SortOrder::Desc => matching.sort_by(|a, b| b.calculated_at.cmp(&a.calculated_at)),
        }

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect();

        Page {
            items,
            total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching records before pagination
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
