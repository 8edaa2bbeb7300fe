use axum::{
    Json,
    response::{IntoResponse, Response},
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    pagination::PageRequest,
};

const MAX_TEXT_LEN: usize = 255;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub rating: f32,
    pub image: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: Timestamp,
}

impl TryFrom<movie::Model> for Movie {
    type Error = jiff::Error;

    fn try_from(row: movie::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            rating: row.rating,
            image: row.image,
            created_at: Timestamp::from_microsecond(row.created_at)?,
            updated_at: Timestamp::from_microsecond(row.updated_at)?,
        })
    }
}

/// The mutable fields of a movie, shared by create and update payloads.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct MovieFields {
    pub title: String,
    pub description: String,
    pub rating: f32,
    #[serde(default)]
    pub image: String,
}

impl MovieFields {
    pub fn validate(&self) -> AppResult<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        if self.image.chars().count() > MAX_TEXT_LEN {
            return Err(AppError::validation(format!(
                "image must be at most {MAX_TEXT_LEN} characters"
            )));
        }
        if !self.rating.is_finite() {
            return Err(AppError::validation("rating must be a finite number"));
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct MovieCreateInput {
    #[serde(flatten)]
    pub fields: MovieFields,
}

/// Full replacement of the mutable fields of the movie selected by `id`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct MovieUpdateInput {
    pub id: i32,
    #[serde(flatten)]
    pub fields: MovieFields,
}

#[derive(Clone, Copy, Debug, Deserialize, ToSchema)]
pub struct MovieDeleteInput {
    pub id: i32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Effective pagination parameters, echoed back so clients can see which defaults applied.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ToSchema)]
pub struct PageEcho {
    pub page: u64,
    pub limit: u64,
    pub sort: String,
}

impl From<&PageRequest> for PageEcho {
    fn from(req: &PageRequest) -> Self {
        Self { page: req.page, limit: req.limit, sort: req.sort.to_string() }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MovieData {
    pub movie: Movie,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MoviesData {
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<PageEcho>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl SuccessEnvelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self { status: Status::Success, message: Some(message.into()), pagination: None, data: None }
    }
}

impl<T> SuccessEnvelope<T> {
    pub fn data(data: T) -> Self {
        Self { status: Status::Success, message: None, pagination: None, data: Some(data) }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: PageEcho) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl<T: Serialize> IntoResponse for SuccessEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FailEnvelope {
    status: Status,
    message: String,
}

impl FailEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: Status::Fail, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(title: &str, description: &str) -> MovieFields {
        MovieFields {
            title: title.to_string(),
            description: description.to_string(),
            rating: 4.5,
            image: String::new(),
        }
    }

    #[test]
    fn blank_or_oversized_text_is_rejected() {
        assert!(fields("A", "B").validate().is_ok());
        assert!(matches!(fields("  ", "B").validate(), Err(AppError::Validation(_))));
        assert!(matches!(fields("A", "").validate(), Err(AppError::Validation(_))));
        assert!(matches!(fields(&"x".repeat(256), "B").validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn image_is_optional_in_payloads() {
        let input: MovieUpdateInput = serde_json::from_value(json!({
            "id": 3,
            "title": "A",
            "description": "B",
            "rating": 4.5
        }))
        .unwrap();
        assert_eq!(input.id, 3);
        assert_eq!(input.fields.image, "");
    }

    #[test]
    fn envelopes_skip_absent_parts() {
        let message = serde_json::to_value(SuccessEnvelope::message("done")).unwrap();
        assert_eq!(message, json!({ "status": "success", "message": "done" }));

        let fail = serde_json::to_value(FailEnvelope::new("nope")).unwrap();
        assert_eq!(fail, json!({ "status": "fail", "message": "nope" }));
    }

    #[test]
    fn rows_convert_microsecond_timestamps() {
        let row = movie::Model {
            id: 1,
            title: "A".into(),
            description: "B".into(),
            rating: 4.5,
            image: String::new(),
            created_at: 1_700_000_000_000_001,
            updated_at: 1_700_000_000_000_002,
        };
        let movie = Movie::try_from(row).unwrap();
        assert_eq!(movie.created_at.as_microsecond(), 1_700_000_000_000_001);
        assert!(movie.updated_at > movie.created_at);
    }
}
