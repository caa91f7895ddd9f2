use serde::{Deserialize, Serialize};

/// Identifier of a stored film.
///
/// Matches a Postgres `serial` column, so it is a 32-bit signed integer.
pub type FilmId = i32;

/// A film record as held by a `FilmStore` and returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Film {
    /// Assigned by the store on creation, never changed afterwards.
    pub id: FilmId,
    pub title: String,
    pub year: i32,
    /// Free-text genre label ("Drama", "Horror", ...).
    pub filmtype: String,
}

impl Film {
    pub fn from_fields(id: FilmId, fields: FilmFields) -> Self {
        Self {
            id,
            title: fields.title,
            year: fields.year,
            filmtype: fields.filmtype,
        }
    }
}

/// The client-writable part of a film: everything except the id.
///
/// Absent fields decode to their zero value and unknown fields (including
/// `id`) are ignored. Only a wrong primitive type is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilmFields {
    pub title: String,
    pub year: i32,
    pub filmtype: String,
}

impl FilmFields {
    pub fn new(title: impl Into<String>, year: i32, filmtype: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year,
            filmtype: filmtype.into(),
        }
    }

    /// Decodes a request body. The body must be a JSON object.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        serde_json::from_value(value)
    }
}
