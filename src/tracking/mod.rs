pub mod timeline;

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::requests::Request;
use timeline::{Timeline, TimelineView};

/// A request together with its rendered status timeline.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackedRequest {
    pub request: Request,
    pub type_label: String,
    pub timeline: Timeline,
}

impl TrackedRequest {
    pub fn new(request: Request, view: TimelineView) -> Self {
        let timeline = view.project(&request.status);
        TrackedRequest {
            type_label: request.request_type.label().to_string(),
            request,
            timeline,
        }
    }
}
