use utoipa::OpenApi;

use crate::{models, routes};

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Movie API",
        description = "CRUD service for a single movie catalogue table.",
        license(name = "Apache-2.0", url = "http://www.apache.org/licenses/LICENSE-2.0.html")
    ),
    paths(
        routes::create_movie,
        routes::fetch_movie,
        routes::list_movies,
        routes::update_movie,
        routes::delete_movie,
    ),
    components(schemas(
        models::Movie,
        models::MovieFields,
        models::MovieCreateInput,
        models::MovieUpdateInput,
        models::MovieDeleteInput,
        models::MovieData,
        models::MoviesData,
        models::PageEcho,
        models::Status,
        models::FailEnvelope,
    )),
    tags((name = "movie", description = "Movie catalogue"))
)]
pub struct ApiDoc;
