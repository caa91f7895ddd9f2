//! Films HTTP Protocol
//!
//! Route paths and the plain-text bodies returned by the films API.
//! Successful reads and writes answer with JSON `Film` values; every other
//! outcome answers with one of the messages below as `text/plain`.

// --- API Endpoints ---

/// Collection endpoint: list (GET) and create (POST).
pub const ENDPOINT_FILMS: &str = "/films";
/// Item endpoint: get (GET), update (PUT) and delete (DELETE).
pub const ENDPOINT_FILM: &str = "/films/:id";

// --- Limits ---

/// Largest create/update body accepted; larger bodies get `413`.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

// --- Response Messages ---

pub const MSG_DELETED: &str = "Film is deleted";
pub const MSG_NOT_FOUND: &str = "Film not found";
pub const MSG_INVALID_ID: &str = "Invalid ID";
pub const MSG_INVALID_BODY: &str = "Invalid film data";
pub const MSG_BODY_TOO_LARGE: &str = "Film data too large";

pub const MSG_LIST_FAILED: &str = "Failed to fetch films";
pub const MSG_GET_FAILED: &str = "Failed to fetch film";
pub const MSG_CREATE_FAILED: &str = "Failed to add film";
pub const MSG_UPDATE_FAILED: &str = "Failed to update film";
pub const MSG_DELETE_FAILED: &str = "Failed to delete film";
