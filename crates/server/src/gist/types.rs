//! Gist API request and response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body for `POST /gists`.
#[derive(Debug, Serialize)]
pub struct CreateGist<'a> {
    pub description: &'a str,
    pub public: bool,
    pub files: BTreeMap<&'a str, FileContent<'a>>,
}

/// Body for `PATCH /gists/{id}`.
#[derive(Debug, Serialize)]
pub struct UpdateGist<'a> {
    pub description: &'a str,
    pub files: BTreeMap<&'a str, FileContent<'a>>,
}

/// New content for one gist file.
#[derive(Debug, Serialize)]
pub struct FileContent<'a> {
    pub content: &'a str,
}

/// Gist resource as returned by create, get, and update.
#[derive(Debug, Clone, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

/// One file inside a gist.
///
/// GitHub truncates `content` for files over roughly one megabyte; the full
/// text is then only available from `raw_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub raw_url: Option<String>,
}

/// Error body GitHub sends with non-success responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
