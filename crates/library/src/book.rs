use serde::{Deserialize, Deserializer, Serialize};

pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Entry of the `/books` listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BookOverview {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_scenes: u32,
    #[serde(default)]
    pub cover: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BookOverviewList {
    #[serde(default)]
    pub books: Option<Vec<BookOverview>>,
}

/// Full book as served by `/books/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Book {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_scenes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Scene {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl BookOverviewList {
    /// Books ordered by id; entries without an id are dropped.
    pub(crate) fn into_sorted(self) -> Vec<BookOverview> {
        let Some(mut books) = self.books else {
            tracing::warn!("no books parsed from response");
            return Vec::new();
        };
        books.retain(|book| {
            let keep = !book.id.trim().is_empty();
            if !keep {
                tracing::warn!(title = %book.title, "skipping book without id");
            }
            keep
        });
        books.sort_by(|a, b| a.id.cmp(&b.id));
        books
    }
}

impl BookOverview {
    pub fn author_label(&self) -> &str {
        non_empty(self.author.as_deref()).unwrap_or(UNKNOWN_AUTHOR)
    }

    pub fn scenes_label(&self) -> String {
        match self.num_scenes {
            1 => "1 scene".to_string(),
            n => format!("{n} scenes"),
        }
    }

    /// Cover image path below `/static/`.
    pub fn cover_path(&self) -> Option<String> {
        non_empty(self.cover.as_deref()).map(|cover| format!("{}/{}", self.id, cover))
    }
}

impl Book {
    pub fn author_label(&self) -> &str {
        non_empty(self.author.as_deref()).unwrap_or(UNKNOWN_AUTHOR)
    }
}

impl Scene {
    /// Panorama path below `/static/` for a scene of `book_id`.
    ///
    /// The server's `image_url` wins when present; otherwise the image file is
    /// looked up inside the book's directory.
    pub fn panorama_path(&self, book_id: &str) -> Option<String> {
        if let Some(url) = non_empty(self.image_url.as_deref()) {
            let trimmed = url.trim_start_matches('/');
            let relative = trimmed.strip_prefix("static/").unwrap_or(trimmed);
            if !relative.is_empty() {
                return Some(relative.to_string());
            }
        }
        non_empty(self.image_file.as_deref()).map(|file| format!("{book_id}/{file}"))
    }
}
