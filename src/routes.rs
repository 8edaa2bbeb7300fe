use std::{sync::Arc, time::Duration};

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    extract::State,
    http::{Method, Uri},
    response::Redirect,
    routing::{delete, get, patch, post},
};
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    AppState,
    docs::{ApiDoc, OPENAPI_PATH, SWAGGER_UI_PATH},
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam, QueryParams},
    models::{
        Movie, MovieCreateInput, MovieData, MovieDeleteInput, MovieUpdateInput, MoviesData,
        PageEcho, SuccessEnvelope,
    },
    pagination::{PageQuery, PageRequest},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::permanent(&format!("{SWAGGER_UI_PATH}/")) }))
        .route("/api/movie/add", post(create_movie))
        .route("/api/movie/all", get(list_movies))
        .route("/api/movie/edit", patch(update_movie))
        .route("/api/movie/delete", delete(delete_movie))
        .route("/api/movie/{id}", get(fetch_movie))
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .fallback(no_route)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}

/// Bounds every request by `timeout`; an elapsed request answers with a `fail` envelope.
pub fn with_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(timeout_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn timeout_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(anyhow::anyhow!("unhandled middleware error: {err}"))
    }
}

async fn no_route(uri: Uri) -> AppError {
    AppError::NoRoute(uri.path().to_string())
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method.to_string())
}

/// Insert a movie.
#[utoipa::path(
    post,
    path = "/api/movie/add",
    tag = "movie",
    request_body = MovieCreateInput,
    responses(
        (status = 200, description = "Movie created", body = MovieData),
        (status = 400, description = "Malformed or invalid payload", body = crate::models::FailEnvelope),
    )
)]
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<MovieCreateInput>,
) -> AppResult<SuccessEnvelope<MovieData>> {
    input.fields.validate()?;

    let row = state.movies.insert(&input.fields).await?;
    tracing::info!(id = row.id, "movie created");

    let movie = Movie::try_from(row)?;
    Ok(SuccessEnvelope::data(MovieData { movie }).with_message("movie created"))
}

/// Fetch one movie by id.
#[utoipa::path(
    get,
    path = "/api/movie/{id}",
    tag = "movie",
    params(("id" = i32, Path, description = "Movie id")),
    responses(
        (status = 200, description = "The movie", body = MovieData),
        (status = 404, description = "No movie with that id", body = crate::models::FailEnvelope),
    )
)]
pub async fn fetch_movie(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> AppResult<SuccessEnvelope<MovieData>> {
    let row = state.movies.find(id).await?.ok_or(AppError::NotFound(id))?;
    let movie = Movie::try_from(row)?;
    Ok(SuccessEnvelope::data(MovieData { movie }))
}

/// Fetch a page of movies.
#[utoipa::path(
    get,
    path = "/api/movie/all",
    tag = "movie",
    params(PageQuery),
    responses(
        (status = 200, description = "A page of movies plus the effective pagination", body = MoviesData),
        (status = 400, description = "Unsupported sort", body = crate::models::FailEnvelope),
    )
)]
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<SuccessEnvelope<MoviesData>> {
    let page = PageRequest::resolve(&query, state.config.page_limits)?;
    tracing::debug!(page = page.page, limit = page.limit, sort = %page.sort, "listing movies");

    let movies = state
        .movies
        .list(&page)
        .await?
        .into_iter()
        .map(Movie::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SuccessEnvelope::data(MoviesData { movies }).with_pagination(PageEcho::from(&page)))
}

/// Replace the mutable fields of an existing movie.
#[utoipa::path(
    patch,
    path = "/api/movie/edit",
    tag = "movie",
    request_body = MovieUpdateInput,
    responses(
        (status = 200, description = "Movie updated", body = MovieData),
        (status = 400, description = "Malformed or invalid payload", body = crate::models::FailEnvelope),
        (status = 404, description = "No movie with that id", body = crate::models::FailEnvelope),
    )
)]
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<MovieUpdateInput>,
) -> AppResult<SuccessEnvelope<MovieData>> {
    input.fields.validate()?;

    let existing = state.movies.find(input.id).await?.ok_or(AppError::NotFound(input.id))?;
    let row = state.movies.update(existing, &input.fields).await?;
    tracing::info!(id = row.id, "movie updated");

    let movie = Movie::try_from(row)?;
    Ok(SuccessEnvelope::data(MovieData { movie }).with_message("movie updated"))
}

/// Hard-delete a movie.
#[utoipa::path(
    delete,
    path = "/api/movie/delete",
    tag = "movie",
    request_body = MovieDeleteInput,
    responses(
        (status = 200, description = "Movie deleted"),
        (status = 404, description = "No movie with that id", body = crate::models::FailEnvelope),
    )
)]
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<MovieDeleteInput>,
) -> AppResult<SuccessEnvelope<()>> {
    state.movies.find(input.id).await?.ok_or(AppError::NotFound(input.id))?;
    state.movies.delete(input.id).await?;
    tracing::info!(id = input.id, "movie deleted");

    Ok(SuccessEnvelope::message("movie deleted"))
}
