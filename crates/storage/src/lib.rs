use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{build_menu_tree, subtree_ids, ActionRow, MenuId, MenuRecord, MenuTreeNode, Visibility},
    error::ApiException,
    protocol::{HiddenFilter, MenuQuery, MenuSearch, MenuSubmission, PageData, Pagination},
};

const MENU_COLUMNS: &str =
    "record_id, name, sequence, hidden, icon, router, parent_id, created_at";
pub const MAX_MENU_NAME_LEN: usize = 50;

/// Persistence seam the menu store talks to.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn query_menus(&self, query: &MenuQuery) -> Result<PageData<MenuRecord>>;
    async fn menu_tree(&self) -> Result<Vec<MenuTreeNode>>;
    async fn get_menu(&self, id: &MenuId) -> Result<Option<MenuRecord>>;
    async fn create_menu(&self, submission: &MenuSubmission) -> Result<MenuRecord>;
    async fn update_menu(&self, id: &MenuId, submission: &MenuSubmission) -> Result<MenuRecord>;
    async fn delete_menu(&self, id: &MenuId) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = pool_options(database_url)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn query_menus(&self, query: &MenuQuery) -> Result<PageData<MenuRecord>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM menus");
        push_search_filters(&mut count, &query.search);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("failed to count menus")?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {MENU_COLUMNS} FROM menus"));
        push_search_filters(&mut select, &query.search);
        select
            .push(" ORDER BY sequence DESC, name ASC LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .context("failed to query menus")?;

        let mut list = rows
            .iter()
            .map(menu_from_row)
            .collect::<Result<Vec<_>>>()?;
        for record in &mut list {
            record.actions = self.load_actions(&record.record_id).await?;
        }

        Ok(PageData {
            list,
            pagination: Pagination {
                current: query.current,
                page_size: query.page_size,
                total: u64::try_from(total).unwrap_or_default(),
            },
        })
    }

    /// All menus without their action rows, in display order.
    pub async fn list_all_menus(&self) -> Result<Vec<MenuRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {MENU_COLUMNS} FROM menus ORDER BY sequence DESC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list menus")?;
        rows.iter().map(menu_from_row).collect()
    }

    pub async fn menu_tree(&self) -> Result<Vec<MenuTreeNode>> {
        let records = self.list_all_menus().await?;
        Ok(build_menu_tree(&records))
    }

    pub async fn get_menu(&self, id: &MenuId) -> Result<Option<MenuRecord>> {
        let row = sqlx::query(&format!("SELECT {MENU_COLUMNS} FROM menus WHERE record_id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load menu {id}"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut record = menu_from_row(&row)?;
        record.actions = self.load_actions(id).await?;
        Ok(Some(record))
    }

    pub async fn create_menu(&self, submission: &MenuSubmission) -> Result<MenuRecord> {
        validate_submission(submission)?;
        if let Some(parent_id) = &submission.parent_id {
            self.ensure_menu_exists(parent_id).await?;
        }

        let record_id = MenuId::generate();
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO menus (record_id, name, sequence, hidden, icon, router, parent_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record_id.as_str())
        .bind(submission.name.trim())
        .bind(submission.sequence)
        .bind(i64::from(submission.hidden))
        .bind(&submission.icon)
        .bind(&submission.router)
        .bind(submission.parent_id.as_ref().map(MenuId::as_str))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .context("failed to insert menu")?;
        replace_actions(&mut tx, &record_id, &submission.actions).await?;
        tx.commit().await?;

        tracing::info!(record_id = %record_id, name = %submission.name, "menu created");
        self.get_menu(&record_id)
            .await?
            .ok_or_else(|| ApiException::not_found(format!("menu {record_id} vanished after insert")).into())
    }

    pub async fn update_menu(&self, id: &MenuId, submission: &MenuSubmission) -> Result<MenuRecord> {
        validate_submission(submission)?;
        self.ensure_menu_exists(id).await?;
        if let Some(parent_id) = &submission.parent_id {
            self.ensure_menu_exists(parent_id).await?;
            let tree = self.menu_tree().await?;
            if subtree_ids(&tree, id).contains(parent_id) {
                return Err(ApiException::validation(format!(
                    "menu {id} cannot be moved below itself or one of its descendants"
                ))
                .into());
            }
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE menus
             SET name = ?, sequence = ?, hidden = ?, icon = ?, router = ?, parent_id = ?
             WHERE record_id = ?",
        )
        .bind(submission.name.trim())
        .bind(submission.sequence)
        .bind(i64::from(submission.hidden))
        .bind(&submission.icon)
        .bind(&submission.router)
        .bind(submission.parent_id.as_ref().map(MenuId::as_str))
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update menu {id}"))?;
        replace_actions(&mut tx, id, &submission.actions).await?;
        tx.commit().await?;

        tracing::info!(record_id = %id, "menu updated");
        self.get_menu(id)
            .await?
            .ok_or_else(|| ApiException::not_found(format!("menu {id} not found")).into())
    }

    pub async fn delete_menu(&self, id: &MenuId) -> Result<()> {
        self.ensure_menu_exists(id).await?;
        let children: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menus WHERE parent_id = ?")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await?;
        if children > 0 {
            return Err(ApiException::conflict(format!(
                "menu {id} has {children} child menu(s); delete them first"
            ))
            .into());
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM menu_actions WHERE menu_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM menus WHERE record_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to delete menu {id}"))?;
        tx.commit().await?;

        tracing::info!(record_id = %id, "menu deleted");
        Ok(())
    }

    async fn ensure_menu_exists(&self, id: &MenuId) -> Result<()> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT record_id FROM menus WHERE record_id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        if found.is_none() {
            return Err(ApiException::not_found(format!("menu {id} not found")).into());
        }
        Ok(())
    }

    async fn load_actions(&self, menu_id: &MenuId) -> Result<Vec<ActionRow>> {
        let rows = sqlx::query(
            "SELECT action_key, code, name FROM menu_actions WHERE menu_id = ? ORDER BY position",
        )
        .bind(menu_id.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load actions for menu {menu_id}"))?;

        rows.iter()
            .map(|row| {
                Ok(ActionRow::new(
                    row.try_get::<String, _>("action_key")?,
                    row.try_get::<String, _>("code")?,
                    row.try_get::<String, _>("name")?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl MenuRepository for Storage {
    async fn query_menus(&self, query: &MenuQuery) -> Result<PageData<MenuRecord>> {
        Storage::query_menus(self, query).await
    }

    async fn menu_tree(&self) -> Result<Vec<MenuTreeNode>> {
        Storage::menu_tree(self).await
    }

    async fn get_menu(&self, id: &MenuId) -> Result<Option<MenuRecord>> {
        Storage::get_menu(self, id).await
    }

    async fn create_menu(&self, submission: &MenuSubmission) -> Result<MenuRecord> {
        Storage::create_menu(self, submission).await
    }

    async fn update_menu(&self, id: &MenuId, submission: &MenuSubmission) -> Result<MenuRecord> {
        Storage::update_menu(self, id, submission).await
    }

    async fn delete_menu(&self, id: &MenuId) -> Result<()> {
        Storage::delete_menu(self, id).await
    }
}

fn validate_submission(submission: &MenuSubmission) -> Result<()> {
    let name = submission.name.trim();
    if name.is_empty() {
        return Err(ApiException::validation("menu name is required").into());
    }
    if name.chars().count() > MAX_MENU_NAME_LEN {
        return Err(ApiException::validation(format!(
            "menu name must be at most {MAX_MENU_NAME_LEN} characters"
        ))
        .into());
    }
    Ok(())
}

async fn replace_actions(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    menu_id: &MenuId,
    actions: &[ActionRow],
) -> Result<()> {
    sqlx::query("DELETE FROM menu_actions WHERE menu_id = ?")
        .bind(menu_id.as_str())
        .execute(&mut **tx)
        .await?;
    for (position, action) in actions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO menu_actions (menu_id, position, action_key, code, name) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(menu_id.as_str())
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .bind(action.key.as_str())
        .bind(&action.code)
        .bind(&action.name)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("failed to store action '{}' for menu {menu_id}", action.code))?;
    }
    Ok(())
}

fn push_search_filters(builder: &mut QueryBuilder<'_, Sqlite>, search: &MenuSearch) {
    builder.push(" WHERE 1 = 1");
    let name = search.name.trim();
    if !name.is_empty() {
        builder
            .push(" AND name LIKE ")
            .push_bind(format!("%{}%", escape_like(name)))
            .push(" ESCAPE '\\'");
    }
    if let HiddenFilter::Only(visibility) = search.hidden {
        builder.push(" AND hidden = ").push_bind(i64::from(visibility));
    }
    if let Some(parent_id) = &search.parent_id {
        builder.push(" AND parent_id = ").push_bind(parent_id.0.clone());
    }
}

fn pool_options(database_url: &str) -> SqlitePoolOptions {
    // Every connection to an in-memory database sees its own empty database,
    // so the single connection must never be recycled.
    if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

/// Makes `%`, `_` and `\` match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn menu_from_row(row: &SqliteRow) -> Result<MenuRecord> {
    let hidden: i64 = row.try_get("hidden")?;
    Ok(MenuRecord {
        record_id: MenuId(row.try_get("record_id")?),
        name: row.try_get("name")?,
        sequence: row.try_get("sequence")?,
        hidden: Visibility::try_from(hidden)?,
        icon: row.try_get("icon")?,
        router: row.try_get("router")?,
        parent_id: row.try_get::<Option<String>, _>("parent_id")?.map(MenuId),
        actions: Vec::new(),
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
