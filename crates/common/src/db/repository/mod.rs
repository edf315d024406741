//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support. Operations are
//! grouped by aggregate in the submodules; they all hang off [`Repository`].

mod bookmarks;
mod datasets;
mod linking;
mod papers;
mod stats;
mod users;
mod venues;

pub use bookmarks::BookmarkKind;
pub use datasets::DatasetFilter;
pub use linking::VenueTarget;
pub use papers::{NewPaper, PaperFilter};
pub use stats::{DatasetLinkRow, PaperStatRow};
pub use users::{NewPublication, ProfileUpdate};
pub use venues::{JournalFilter, NewConference, NewJournal};

use crate::analytics::DateRange;
use crate::db::DbPool;
use crate::errors::Result;
use crate::pagination::PageParams;
use sea_orm::sea_query::{Expr, Func, Iden, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IdenStatic, Paginator,
    QueryFilter, Select, SelectorTrait,
};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

/// Fetch one page; a page whose offset cannot be expressed is empty
async fn fetch_page<'db, C, S>(
    paginator: &Paginator<'db, C, S>,
    page: PageParams,
) -> Result<Vec<S::Item>>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    match page.index() {
        Some(index) => paginator.fetch_page(index).await.map_err(Into::into),
        None => Ok(Vec::new()),
    }
}

/// Escape LIKE wildcards and wrap in `%..%`, lowercased
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// `LOWER(col) LIKE '%needle%'`
fn contains_ci<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col)))).like(like_pattern(needle))
}

/// Case-insensitive substring match against any single element of a JSONB string array
fn json_contains_ci<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    let table = Iden::to_string(&*col.entity_name());
    Expr::cust_with_values(
        json_element_like_sql(&table, col.as_str()),
        [like_pattern(needle)],
    )
}

fn json_element_like_sql(table: &str, column: &str) -> String {
    format!(
        r#"EXISTS (SELECT 1 FROM jsonb_array_elements_text("{}"."{}") AS elem(value) WHERE LOWER(elem.value) LIKE $1)"#,
        table, column
    )
}

/// Apply a whole-day date range to a `created_at` column
fn within<E, C>(select: Select<E>, col: C, range: &DateRange) -> Select<E>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let select = match range.lower() {
        Some(lo) => select.filter(col.gte(lo)),
        None => select,
    };
    match range.upper() {
        Some(hi) => select.filter(col.lt(hi)),
        None => select,
    }
}

/// True when the error is a Postgres unique violation
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("  Deep_Learning "), "%deep\\_learning%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
    }

    #[tokio::test]
    async fn test_far_page_skips_the_query() {
        use crate::db::models::PaperEntity;
        use sea_orm::PaginatorTrait;

        let db = DatabaseConnection::Disconnected;
        let paginator = PaperEntity::find().paginate(&db, 20);
        let page = PageParams::from_parts(Some(i64::MAX), Some(20), 20, 100).unwrap();
        let rows = fetch_page(&paginator, page).await.unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_json_match_is_per_element() {
        use crate::db::models::{PaperColumn, PaperEntity};
        use sea_orm::{DbBackend, QueryTrait};

        let sql = PaperEntity::find()
            .filter(json_contains_ci(PaperColumn::Keywords, "Vision"))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"jsonb_array_elements_text("papers"."keywords")"#));
        assert!(sql.contains("LOWER(elem.value) LIKE '%vision%'"));
        assert!(!sql.contains("AS text"));
    }
}
