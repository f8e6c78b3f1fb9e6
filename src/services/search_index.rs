//! Task Search Index
//!
//! Keeps the `task_search` FTS5 table consistent with the `task` table
//! without callers having to remember it. Store-native AFTER triggers run
//! inside whatever transaction writes the task row, so no transaction can
//! commit a task change without the matching index change:
//!
//! - insert of a live task: add an entry from `title` + `description`
//! - update of `title`, `description` or `deleted_at`: drop the old entry and
//!   re-add it only while the task is not soft-deleted
//! - hard delete: drop the entry
//!
//! Because an entry exists only for live tasks, search joins back to `task`
//! without an extra liveness filter.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::models::task::TaskSearchHit;
use crate::services::task::{row_to_task, TASK_COLUMNS};
use crate::utils::error::AppResult;

/// Upper bound on terms taken from one query
const MAX_QUERY_TERMS: usize = 16;

static QUERY_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("static search term regex"));

/// Result of a consistency audit of the index against the task table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Live tasks without an entry
    pub missing: Vec<String>,
    /// Entries whose content differs from the task row
    pub stale: Vec<String>,
    /// Entries for tasks that are gone or soft-deleted
    pub orphaned: Vec<String>,
    /// Tasks with more than one entry
    pub duplicated: Vec<String>,
}

impl IndexReport {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
            && self.stale.is_empty()
            && self.orphaned.is_empty()
            && self.duplicated.is_empty()
    }
}

pub struct SearchIndexSynchronizer;

impl SearchIndexSynchronizer {
    /// Create the index table and its triggers. Idempotent.
    pub fn install(conn: &Connection) -> AppResult<()> {
        // unicode61 with diacritics folded so "cafe" matches "café"
        conn.execute_batch(
            "CREATE VIRTUAL TABLE IF NOT EXISTS task_search USING fts5(
                task_id UNINDEXED,
                title,
                description,
                tokenize = 'unicode61 remove_diacritics 2'
            );

            CREATE TRIGGER IF NOT EXISTS task_search_after_insert
            AFTER INSERT ON task
            WHEN NEW.deleted_at IS NULL
            BEGIN
                INSERT INTO task_search (task_id, title, description)
                VALUES (NEW.id, NEW.title, COALESCE(NEW.description, ''));
            END;

            CREATE TRIGGER IF NOT EXISTS task_search_after_update
            AFTER UPDATE OF title, description, deleted_at ON task
            BEGIN
                DELETE FROM task_search WHERE task_id = OLD.id;
                INSERT INTO task_search (task_id, title, description)
                SELECT NEW.id, NEW.title, COALESCE(NEW.description, '')
                WHERE NEW.deleted_at IS NULL;
            END;

            CREATE TRIGGER IF NOT EXISTS task_search_after_delete
            AFTER DELETE ON task
            BEGIN
                DELETE FROM task_search WHERE task_id = OLD.id;
            END;",
        )?;
        Ok(())
    }

    /// Repopulate the index from live tasks. Run inside a unit of work.
    pub fn rebuild(conn: &Connection) -> AppResult<usize> {
        conn.execute("DELETE FROM task_search", [])?;
        let inserted = conn.execute(
            "INSERT INTO task_search (task_id, title, description)
             SELECT id, title, COALESCE(description, '')
             FROM task
             WHERE deleted_at IS NULL",
            [],
        )?;
        tracing::info!("[SearchIndex] rebuilt with {} entries", inserted);
        Ok(inserted)
    }

    /// Turn free text into an FTS5 expression of quoted prefix terms.
    ///
    /// Only letters, digits and `_` survive, so user input can never carry
    /// FTS operators. Returns `None` when nothing searchable remains.
    pub fn build_match_query(query: &str) -> Option<String> {
        let terms: Vec<String> = QUERY_TERM
            .find_iter(query)
            .take(MAX_QUERY_TERMS)
            .map(|m| format!("\"{}\"*", m.as_str()))
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(terms.join(" "))
        }
    }

    /// Full-text search within one project, best matches first
    pub fn search(
        conn: &Connection,
        project_id: &str,
        query: &str,
        limit: u32,
    ) -> AppResult<Vec<TaskSearchHit>> {
        let Some(expression) = Self::build_match_query(query) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT {columns}, bm25(task_search) AS score
             FROM task_search
             JOIN task t ON t.id = task_search.task_id
             WHERE task_search MATCH ?1 AND t.project_id = ?2
             ORDER BY score
             LIMIT ?3",
            columns = qualified_task_columns("t")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![expression, project_id, limit], |row| {
            Ok(TaskSearchHit {
                task: row_to_task(row)?,
                rank: row.get(8)?,
            })
        })?;
        let hits = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    /// Compare the index with the committed task table
    pub fn verify(conn: &Connection) -> AppResult<IndexReport> {
        Ok(IndexReport {
            missing: ids(
                conn,
                "SELECT id FROM task
                 WHERE deleted_at IS NULL
                   AND id NOT IN (SELECT task_id FROM task_search)
                 ORDER BY id",
            )?,
            stale: ids(
                conn,
                "SELECT s.task_id FROM task_search s
                 JOIN task t ON t.id = s.task_id
                 WHERE s.title <> t.title
                    OR s.description <> COALESCE(t.description, '')
                 ORDER BY s.task_id",
            )?,
            orphaned: ids(
                conn,
                "SELECT task_id FROM task_search
                 WHERE task_id NOT IN (SELECT id FROM task WHERE deleted_at IS NULL)
                 ORDER BY task_id",
            )?,
            duplicated: ids(
                conn,
                "SELECT task_id FROM task_search
                 GROUP BY task_id HAVING COUNT(*) > 1
                 ORDER BY task_id",
            )?,
        })
    }
}

fn qualified_task_columns(alias: &str) -> String {
    TASK_COLUMNS
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ids(conn: &Connection, sql: &str) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let ids = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
