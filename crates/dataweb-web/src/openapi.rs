//! OpenAPI documentation definition.

use dataweb_core::api::snapshot::ApiDashboard;
use dataweb_core::projector::{DisplayRow, GroupRows, RowKind};
use utoipa::OpenApi;

use crate::handlers::HealthStatus;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::handle_health,
        crate::handlers::handle_dashboard,
        crate::handlers::handle_stream
    ),
    components(schemas(ApiDashboard, GroupRows, DisplayRow, RowKind, HealthStatus)),
    info(
        title = "dataweb API",
        version = "1.0",
        description = "Instrument block and run-information dashboard"
    )
)]
pub(crate) struct ApiDoc;
