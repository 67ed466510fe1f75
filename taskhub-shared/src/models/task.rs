/// Task model and ownership-scoped database operations
///
/// Every task belongs to exactly one user. There are no unscoped read or
/// write operations here: each query predicate includes `owner_id`, so
/// cross-owner access is structurally impossible rather than filtered after
/// the fact. A lookup that misses, whether the task never existed or
/// belongs to someone else, yields the same `None`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, description, completed, owner_id, created_at, updated_at";

/// Task record owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task id
    pub id: Uuid,

    /// What needs doing, trimmed by the handler before storage
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// Owning user; set from the authenticated identity, never from the
    /// request body
    pub owner_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Task description (already trimmed, non-empty)
    pub description: String,

    /// Initial completed flag
    pub completed: bool,

    /// Authenticated owner
    pub owner_id: Uuid,
}

/// Input for updating a task
///
/// Only `Some` fields are written. The handler enforces the
/// `{description, completed}` allow-list before building this.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    /// New description
    pub description: Option<String>,

    /// New completed flag
    pub completed: Option<bool>,
}

/// Sortable task columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Description,
    Completed,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Column name for SQL; field names are a closed set, so sort input can
    /// never reach the query text directly.
    fn column(&self) -> &'static str {
        match self {
            SortField::Description => "description",
            SortField::Completed => "completed",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "description" => Some(SortField::Description),
            "completed" => Some(SortField::Completed),
            "createdAt" | "created_at" => Some(SortField::CreatedAt),
            "updatedAt" | "updated_at" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }
}

/// Sort order for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for TaskSort {
    /// Default listing order: creation time, oldest first
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: false,
        }
    }
}

impl TaskSort {
    /// Parses a `field:direction` sort spec from a query string
    ///
    /// `desc` selects descending; any other direction (or none) means
    /// ascending. An unrecognized field name falls back to the default
    /// order; sort specs come straight from the URL and can only ever
    /// select from the closed column set.
    ///
    /// # Example
    ///
    /// ```
    /// use taskhub_shared::models::task::{SortField, TaskSort};
    ///
    /// let sort = TaskSort::parse("createdAt:desc");
    /// assert_eq!(sort.field, SortField::CreatedAt);
    /// assert!(sort.descending);
    /// ```
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.splitn(2, ':');
        let field = parts.next().unwrap_or("");
        let direction = parts.next().unwrap_or("");

        match SortField::parse(field) {
            Some(field) => Self {
                field,
                descending: direction == "desc",
            },
            None => Self::default(),
        }
    }

    fn order_clause(&self) -> String {
        format!(
            "{} {}",
            self.field.column(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// Filter and pagination options for task listings
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Restrict to completed (or not-completed) tasks
    pub completed: Option<bool>,

    /// Sort order; defaults to created_at ascending
    pub sort: Option<TaskSort>,

    /// Maximum rows to return; `None` means no limit
    pub limit: Option<i64>,

    /// Rows to skip; `None` means no offset
    pub skip: Option<i64>,
}

impl Task {
    /// Creates a task for its owner
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (description, completed, owner_id)
            VALUES ($1, $2, $3)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.description)
        .bind(data.completed)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by id, scoped to its owner
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2",
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks with optional filter, sort, and pagination
    ///
    /// The owner predicate is unconditional; filter and pagination refine
    /// the result set but can never widen it. LIMIT/OFFSET are only added
    /// when the caller supplied usable numbers.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
        query: TaskQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1");
        let mut bind_count = 1;

        if query.completed.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND completed = ${}", bind_count));
        }

        sql.push_str(&format!(
            " ORDER BY {}",
            query.sort.unwrap_or_default().order_clause()
        ));

        if query.limit.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" LIMIT ${}", bind_count));
        }
        if query.skip.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" OFFSET ${}", bind_count));
        }

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(owner_id);

        if let Some(completed) = query.completed {
            q = q.bind(completed);
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit);
        }
        if let Some(skip) = query.skip {
            q = q.bind(skip);
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Updates a task's mutable fields, scoped to its owner
    ///
    /// Returns `None` when no task matches the id+owner conjunction.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task, scoped to its owner
    ///
    /// Returns the deleted task, or `None` when nothing matched.
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}",
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }
}
