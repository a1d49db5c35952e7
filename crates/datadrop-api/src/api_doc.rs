//! OpenAPI document for the transfer API.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::upload::upload_file,
        crate::handlers::download::download_file,
    ),
    components(schemas(datadrop_core::ShareResponse, crate::error::ErrorResponse)),
    tags(
        (name = "files", description = "Upload files and retrieve them by share id")
    ),
    info(
        title = "Datadrop API",
        description = "Local connect & share file transfer API"
    )
)]
pub struct ApiDoc;
