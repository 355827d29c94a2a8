use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::location::{BloodBank, Location};

/// Filter value that disables the category match.
pub const ALL_CATEGORIES: &str = "all";
/// Category every blood bank reports.
pub const BLOOD_BANK_CATEGORY: &str = "blood_bank";

/// Anything that can appear in a filtered directory.
pub trait Listing {
    fn name(&self) -> &str;
    fn address(&self) -> &str;
    fn category(&self) -> &str;
    fn materials(&self) -> &[String];
}

impl Listing for Location {
    fn name(&self) -> &str {
        &self.name
    }
    fn address(&self) -> &str {
        &self.address
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn materials(&self) -> &[String] {
        &self.materials
    }
}

impl Listing for BloodBank {
    fn name(&self) -> &str {
        &self.name
    }
    fn address(&self) -> &str {
        &self.address
    }
    fn category(&self) -> &str {
        BLOOD_BANK_CATEGORY
    }
    fn materials(&self) -> &[String] {
        &self.blood_types
    }
}

/// Directory screen state: active category tab, search box, reveal toggle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListingFilter {
    /// Category tag, or `all` (the default).
    pub category: Option<String>,
    /// Case-insensitive substring of name, address or any material.
    pub q: Option<String>,
    /// Return every match instead of the first page.
    pub show_all: Option<bool>,
}

impl ListingFilter {
    pub fn active_category(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(ALL_CATEGORIES)
    }

    pub fn query(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn show_all(&self) -> bool {
        self.show_all.unwrap_or(false)
    }

    pub fn apply<T: Listing + Clone>(&self, items: &[T]) -> Vec<T> {
        filter_listings(items, self.active_category(), self.query())
    }
}

pub fn matches_query<T: Listing>(item: &T, needle_lower: &str) -> bool {
    needle_lower.is_empty()
        || item.name().to_lowercase().contains(needle_lower)
        || item.address().to_lowercase().contains(needle_lower)
        || item
            .materials()
            .iter()
            .any(|m| m.to_lowercase().contains(needle_lower))
}

/// Items in `category` (or any, for `all`) matching `query`, in input order.
pub fn filter_listings<T: Listing + Clone>(items: &[T], category: &str, query: &str) -> Vec<T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| category == ALL_CATEGORIES || item.category() == category)
        .filter(|item| matches_query(*item, &needle))
        .cloned()
        .collect()
}

/// First `page_size` items unless the caller asked for all of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub hidden: usize,
}

impl<T> ListingPage<T> {
    pub fn new(mut items: Vec<T>, page_size: usize, show_all: bool) -> Self {
        let total = items.len();
        if !show_all {
            items.truncate(page_size);
        }
        ListingPage {
            hidden: total - items.len(),
            total,
            items,
        }
    }
}
