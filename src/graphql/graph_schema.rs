use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use crate::app_state::AppState;
use crate::graphql::graph::QueryRoot;

pub type AppSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Read-only schema; resolvers reach the store through `AppState`.
pub fn create_schema(state: AppState) -> AppSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(state)
        .finish()
}
