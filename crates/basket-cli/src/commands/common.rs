use std::path::PathBuf;

use basket_core::{
    build_tree, AccessToken, CategoryId, FolderRemote, ItemId, LibSqlListStore, ListDocument,
    ListId, StaticCredentials, SyncController, SyncSession,
};
use chrono::Utc;
use serde::Serialize;

use crate::config_file::CliConfig;
use crate::error::CliError;

pub type CliSession = SyncSession<LibSqlListStore, FolderRemote, StaticCredentials>;

const SHORT_ID_LEN: usize = 8;

/// Paths and settings resolved from flags, environment, and the config file
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: CliConfig,
    pub db_path: PathBuf,
    pub remote_dir: Option<PathBuf>,
}

impl CliContext {
    pub fn resolve(
        config: CliConfig,
        db_path: Option<PathBuf>,
        remote_dir: Option<PathBuf>,
    ) -> Self {
        let db_path = config.resolve_db_path(db_path);
        let remote_dir = config.resolve_remote_dir(remote_dir);
        Self {
            config,
            db_path,
            remote_dir,
        }
    }

    pub fn require_remote_dir(&self) -> Result<&PathBuf, CliError> {
        self.remote_dir.as_ref().ok_or(CliError::RemoteNotConfigured)
    }

    pub fn credentials(&self) -> StaticCredentials {
        self.config
            .access_token
            .as_ref()
            .map_or_else(StaticCredentials::signed_out, |token| {
                StaticCredentials::signed_in(AccessToken::new(token.clone()))
            })
    }
}

#[derive(Debug, Serialize)]
pub struct ListSummaryItem {
    pub id: String,
    pub title: String,
    pub mode: String,
    pub items: usize,
    pub checked: usize,
    pub updated_at: i64,
    pub relative_time: String,
    pub dirty: bool,
    pub remote_file_id: Option<String>,
}

/// Open the local store and restore the previously active list.
///
/// Without a configured remote the session is signed out, so only local
/// commands succeed.
pub async fn open_session(ctx: &CliContext) -> Result<CliSession, CliError> {
    tracing::debug!("Opening local store at {}", ctx.db_path.display());
    let store = LibSqlListStore::open_path(&ctx.db_path).await?;
    let (remote, credentials) = match &ctx.remote_dir {
        Some(dir) => (FolderRemote::new(dir), ctx.credentials()),
        None => (FolderRemote::new(&ctx.db_path), StaticCredentials::signed_out()),
    };
    let controller = SyncController::new(remote, credentials, ctx.config.sync.clone());

    let mut session = SyncSession::new(store, controller);
    session.restore().await?;
    Ok(session)
}

pub fn require_active(session: &CliSession) -> Result<&ListDocument, CliError> {
    session.active().ok_or(CliError::NoActiveList)
}

pub fn short_id(id: &str) -> &str {
    let start = id
        .char_indices()
        .rev()
        .nth(SHORT_ID_LEN - 1)
        .map_or(0, |(index, _)| index);
    &id[start..]
}

fn id_matches(id: &str, query: &str) -> bool {
    id.starts_with(query) || id.ends_with(query)
}

fn pick_one<T: Clone>(
    query: &str,
    kind: &str,
    matches: &[(T, String)],
    not_found: impl FnOnce() -> CliError,
) -> Result<T, CliError> {
    match matches {
        [] => Err(not_found()),
        [(only, _)] => Ok(only.clone()),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|(_, label)| label.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::Ambiguous(format!(
                "{kind} '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_identifier(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Exact ID, then ID prefix/suffix, then case-insensitive exact title.
pub async fn resolve_list_id(session: &CliSession, query: &str) -> Result<ListId, CliError> {
    let not_found = || CliError::ListNotFound(query.trim().to_string());
    let query = normalize_identifier(query).ok_or_else(not_found)?;
    let lists = session.lists().await?;

    if let Some(doc) = lists.iter().find(|doc| doc.id.as_str() == query) {
        return Ok(doc.id.clone());
    }
    let mut matches = lists
        .iter()
        .filter(|doc| id_matches(doc.id.as_str(), query))
        .map(|doc| (doc.id.clone(), format!("{} ({})", short_id(doc.id.as_str()), doc.title)))
        .collect::<Vec<_>>();
    if matches.is_empty() {
        matches = lists
            .iter()
            .filter(|doc| doc.title.eq_ignore_ascii_case(query))
            .map(|doc| (doc.id.clone(), format!("{} ({})", short_id(doc.id.as_str()), doc.title)))
            .collect();
    }
    pick_one(query, "List", &matches, not_found)
}

/// Case-insensitive live category name, then ID prefix/suffix.
pub fn resolve_category_id(doc: &ListDocument, query: &str) -> Result<CategoryId, CliError> {
    let not_found = || CliError::CategoryNotFound(query.trim().to_string());
    let query = normalize_identifier(query).ok_or_else(not_found)?;

    let mut matches = doc
        .live_categories()
        .filter(|category| category.name.eq_ignore_ascii_case(query))
        .map(|category| {
            (
                category.id.clone(),
                format!("{} ({})", short_id(category.id.as_str()), category.name),
            )
        })
        .collect::<Vec<_>>();
    if matches.is_empty() {
        matches = doc
            .live_categories()
            .filter(|category| id_matches(category.id.as_str(), query))
            .map(|category| (category.id.clone(), category.name.clone()))
            .collect();
    }
    pick_one(query, "Category", &matches, not_found)
}

/// Live item by ID prefix/suffix, then by case-insensitive exact label.
pub fn resolve_item_id(doc: &ListDocument, query: &str) -> Result<ItemId, CliError> {
    let not_found = || CliError::ItemNotFound(query.trim().to_string());
    let query = normalize_identifier(query).ok_or_else(not_found)?;

    let mut matches = doc
        .live_items()
        .filter(|item| id_matches(item.id.as_str(), query))
        .map(|item| (item.id.clone(), item.label.clone()))
        .collect::<Vec<_>>();
    if matches.is_empty() {
        matches = doc
            .live_items()
            .filter(|item| item.label.eq_ignore_ascii_case(query))
            .map(|item| (item.id.clone(), format!("{} ({})", short_id(item.id.as_str()), item.label)))
            .collect();
    }
    pick_one(query, "Item", &matches, not_found)
}

pub fn join_words(parts: &[String]) -> Option<String> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn list_to_summary_item(doc: &ListDocument) -> ListSummaryItem {
    let now_ms = Utc::now().timestamp_millis();
    ListSummaryItem {
        id: doc.id.to_string(),
        title: doc.title.clone(),
        mode: doc.mode.to_string(),
        items: doc.live_items().count(),
        checked: doc.live_items().filter(|item| item.checked).count(),
        updated_at: doc.updated_at,
        relative_time: format_relative_time(doc.updated_at, now_ms),
        dirty: doc.is_dirty(),
        remote_file_id: doc.sync.remote_file_id.clone(),
    }
}

pub fn format_list_lines(lists: &[ListDocument], active: Option<&ListId>) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    lists
        .iter()
        .map(|doc| {
            let marker = if Some(&doc.id) == active { '*' } else { ' ' };
            let total = doc.live_items().count();
            let checked = doc.live_items().filter(|item| item.checked).count();
            let progress = format!("{checked}/{total}");
            let relative_time = format_relative_time(doc.updated_at, now_ms);
            let sync = match (doc.sync.has_remote_file(), doc.is_dirty()) {
                (false, _) => "local",
                (true, true) => "unsynced",
                (true, false) => "synced",
            };
            format!(
                "{marker} {:<8}  {:<30}  {progress:<7}  {relative_time:<10}  {sync}",
                short_id(doc.id.as_str()),
                doc.title
            )
        })
        .collect()
}

/// Indented tree view: categories in display order, each followed by its items.
pub fn render_list_lines(doc: &ListDocument, hide_checked: bool) -> Vec<String> {
    let mut lines = vec![format!("{} [{}]", doc.title, doc.mode)];
    let Some(tree) = build_tree(&doc.categories) else {
        return lines;
    };
    let placed = tree
        .walk()
        .map(|(category, _)| category.id.clone())
        .collect::<Vec<_>>();

    for (category, depth) in tree.walk() {
        let indent = "  ".repeat(depth);
        lines.push(format!("{indent}{}/", category.name));
        for item in doc
            .visible_items(&CategoryId::root(), hide_checked)
            .into_iter()
            .filter(|item| {
                item.category_id == category.id
                    || (depth == 0 && !placed.contains(&item.category_id))
            })
        {
            let mark = if item.checked { 'x' } else { ' ' };
            lines.push(format!(
                "{indent}  [{mark}] {item}  ({})",
                short_id(item.id.as_str())
            ));
        }
    }
    lines
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
