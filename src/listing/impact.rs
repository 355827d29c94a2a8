use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::db::models::location::{LocationCategory, LocationRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub location_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImpactSummary {
    /// Collection points registered through the network.
    pub collection_points: usize,
    pub waste_categories: usize,
    pub by_type: Vec<TypeCount>,
}

/// Counts store-registered locations by their `type` label, sorted by label.
pub fn summarize(rows: &[LocationRow]) -> ImpactSummary {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.location_type.as_str()).or_default() += 1;
    }

    ImpactSummary {
        collection_points: rows.len(),
        waste_categories: LocationCategory::ALL.len(),
        by_type: counts
            .into_iter()
            .map(|(location_type, count)| TypeCount {
                location_type: location_type.to_string(),
                count,
            })
            .collect(),
    }
}
