use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::model::{CompletionClient, CompletionRequest, ModelError, UserContent};
use crate::catalog::{CatalogRepository, CategoryId, CategoryTree};
use crate::error::ErrorKind;
use crate::store::RepositoryError;

const CATEGORY_MODEL: &str = "gpt-4o-mini";
const VISION_MODEL: &str = "gpt-4o";
const MAX_KEYWORD_TAGS: usize = 4;
const MAX_DESCRIPTIVE_TAGS: usize = 10;

const CATEGORY_PROMPT: &str = "Jesteś asystentem portalu ogłoszeniowego. Dostaniesz tytuł ogłoszenia \
oraz listę kategorii, w której każda linia to pełna ścieżka od kategorii głównej do kategorii końcowej. \
Wybierz dokładnie jedną kategorię końcową z listy, najlepiej pasującą do przedmiotu z tytułu. \
Nie wymyślaj kategorii. Odpowiedz wyłącznie w formacie JSON, np.: \
{\"path\": [\"Kategoria główna\", \"Podkategoria\", \"Kategoria końcowa\"]}";

const KEYWORD_PROMPT: &str = "Jesteś ekspertem od e-commerce. Przeanalizuj to zdjęcie i zwróć dokładnie \
cztery najważniejsze słowa kluczowe opisujące przedmiot. Zwróć tylko te cztery słowa oddzielone \
przecinkiem, bez dodatkowego tekstu.";

const DESCRIPTIVE_PROMPT: &str = "Przeanalizuj to zdjęcie i zwróć tablicę JSON zawierającą od 5 do 10 \
precyzyjnych tagów opisujących obiekt (w języku polskim). Zwróć tylko czysty JSON, bez znaczników \
markdown. Przykład: [\"tag1\",\"tag2\",\"tag3\"]";

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("Brak konfiguracji OPENAI_API_KEY")]
    Disabled,
    #[error("Podaj tytuł ogłoszenia.")]
    TitleRequired,
    #[error("Podaj URL lub dane base64 obrazu")]
    ImageRequired,
    #[error("Brak odpowiedzi od modelu")]
    EmptyReply,
    #[error("Nie udało się sparsować tagów")]
    UnparsableTags,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AssistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssistError::TitleRequired | AssistError::ImageRequired => ErrorKind::Validation,
            AssistError::Disabled => ErrorKind::Internal,
            AssistError::EmptyReply | AssistError::UnparsableTags | AssistError::Model(_) => {
                ErrorKind::Dependency
            }
            AssistError::Repository(err) => err.kind(),
        }
    }
}

/// Root-first category ids; empty when the model's answer matched no leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorySuggestion {
    pub category_path: Vec<CategoryId>,
}

/// Image reference for keyword tagging. A `url` wins when it is `http(s)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub base64: Option<String>,
}

pub struct AssistService<R> {
    repository: Arc<R>,
    client: Option<Arc<dyn CompletionClient>>,
}

impl<R> AssistService<R>
where
    R: CatalogRepository + 'static,
{
    pub fn new(repository: Arc<R>, client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { repository, client }
    }

    fn client(&self) -> Result<&Arc<dyn CompletionClient>, AssistError> {
        self.client.as_ref().ok_or(AssistError::Disabled)
    }

    /// Asks the model to pick a leaf of the visible category tree for `title`.
    pub async fn suggest_category(&self, title: &str) -> Result<CategorySuggestion, AssistError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AssistError::TitleRequired);
        }
        let client = self.client()?;

        let tree = CategoryTree::visible(self.repository.categories()?);
        let leaf_paths = tree.leaf_paths();
        if leaf_paths.is_empty() {
            return Ok(CategorySuggestion::default());
        }
        let listing = leaf_paths
            .iter()
            .map(|path| {
                path.iter()
                    .map(|category| category.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" > ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        let reply = client
            .complete(CompletionRequest {
                model: CATEGORY_MODEL.to_string(),
                system: CATEGORY_PROMPT.to_string(),
                user: UserContent::Text(format!(
                    "Tytuł ogłoszenia: \"{title}\"\n\nLista dozwolonych kategorii (każda linia to jedna kategoria końcowa):\n{listing}"
                )),
                max_tokens: None,
                json_object: true,
            })
            .await?;

        let names = parse_category_reply(&reply);
        let category_path = tree.resolve_path(&names);
        if category_path.is_empty() {
            warn!(reply_len = reply.len(), "model reply did not match any category path");
        } else {
            info!(depth = category_path.len(), "category suggested");
        }
        Ok(CategorySuggestion { category_path })
    }

    /// Up to four comma-separated keywords describing the pictured item.
    pub async fn keyword_tags(&self, image: ImageInput) -> Result<Vec<String>, AssistError> {
        let client = self.client()?;
        let source = image_source(&image)?;
        let reply = client
            .complete(CompletionRequest {
                model: VISION_MODEL.to_string(),
                system: KEYWORD_PROMPT.to_string(),
                user: UserContent::ImageUrl(source),
                max_tokens: Some(100),
                json_object: false,
            })
            .await?;
        if reply.is_empty() {
            return Err(AssistError::EmptyReply);
        }
        Ok(parse_keyword_tags(&reply))
    }

    /// Up to ten descriptive tags returned by the model as a JSON array.
    pub async fn descriptive_tags(&self, image_url: &str) -> Result<Vec<String>, AssistError> {
        let image_url = image_url.trim();
        if image_url.is_empty() {
            return Err(AssistError::ImageRequired);
        }
        let client = self.client()?;
        let reply = client
            .complete(CompletionRequest {
                model: VISION_MODEL.to_string(),
                system: DESCRIPTIVE_PROMPT.to_string(),
                user: UserContent::ImageUrl(image_url.to_string()),
                max_tokens: Some(500),
                json_object: false,
            })
            .await?;
        if reply.is_empty() {
            return Err(AssistError::EmptyReply);
        }
        parse_descriptive_tags(&reply)
    }
}

/// Picks the URL handed to the model: an `http(s)` URL as is, base64 wrapped into a JPEG data URL.
pub fn image_source(image: &ImageInput) -> Result<String, AssistError> {
    let url = image
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());
    let base64 = image
        .base64
        .as_deref()
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .or_else(|| url.filter(|url| url.starts_with("data:")));

    if let Some(url) = url.filter(|url| url.starts_with("http://") || url.starts_with("https://")) {
        return Ok(url.to_string());
    }
    if let Some(data) = base64 {
        return Ok(if data.starts_with("data:") {
            data.to_string()
        } else {
            format!("data:image/jpeg;base64,{data}")
        });
    }
    url.map(str::to_string).ok_or(AssistError::ImageRequired)
}

/// Reads `{"path": [...]}`. Anything else yields an empty path.
pub fn parse_category_reply(reply: &str) -> Vec<String> {
    serde_json::from_str::<Value>(reply.trim())
        .ok()
        .and_then(|value| value.get("path").and_then(Value::as_array).cloned())
        .map(|path| {
            path.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_keyword_tags(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .take(MAX_KEYWORD_TAGS)
        .map(str::to_string)
        .collect()
}

/// Strips a surrounding markdown code fence and reads a JSON array of strings.
pub fn parse_descriptive_tags(reply: &str) -> Result<Vec<String>, AssistError> {
    let mut cleaned = reply.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
        if cleaned
            .get(..4)
            .is_some_and(|lang| lang.eq_ignore_ascii_case("json"))
        {
            cleaned = &cleaned[4..];
        }
    }
    let cleaned = cleaned.trim().strip_suffix("```").unwrap_or(cleaned).trim();

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .take(MAX_DESCRIPTIVE_TAGS)
            .map(str::to_string)
            .collect()),
        Ok(_) => Ok(Vec::new()),
        Err(_) => Err(AssistError::UnparsableTags),
    }
}
