use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, Order, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set,
};

use crate::entities::{prelude::*, search_history};
use crate::models::SearchType;

/// Timestamps in `search_history` are second-precision UTC RFC 3339 strings,
/// so lexicographic order equals chronological order.
#[must_use]
pub fn log_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSearchLog {
    pub query: String,
    pub search_type: SearchType,
    pub session_id: Option<String>,
    pub filters: serde_json::Value,
    pub searched_at: DateTime<Utc>,
}

/// Parameters of the popular-search aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularQuery {
    pub page: u64,
    pub limit: u64,
    pub text_filter: Option<String>,
    pub type_filter: Option<SearchType>,
    pub since: DateTime<Utc>,
    pub min_searches: u64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct PopularSearchRow {
    pub query: String,
    pub search_type: String,
    pub total_searches: i64,
    pub unique_users: i64,
    pub last_searched: Option<String>,
    pub filters: Option<String>,
}

pub struct SearchLogRepository {
    conn: DatabaseConnection,
}

impl SearchLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn log_search(&self, entry: &NewSearchLog) -> Result<()> {
        let filters = serde_json::to_string(&entry.filters)?;
        let model = search_history::ActiveModel {
            query: Set(entry.query.clone()),
            search_type: Set(entry.search_type.as_str().to_string()),
            session_id: Set(entry.session_id.clone()),
            filters: Set(Some(filters)),
            searched_at: Set(log_timestamp(entry.searched_at)),
            ..Default::default()
        };
        model.insert(&self.conn).await?;
        Ok(())
    }

    /// Whether the same session logged this `(query, type)` at or after `since`.
    pub async fn is_duplicate(
        &self,
        query: &str,
        search_type: SearchType,
        session_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let session = match session_id {
            Some(id) => search_history::Column::SessionId.eq(id),
            None => search_history::Column::SessionId.is_null(),
        };

        let count = SearchHistory::find()
            .filter(search_history::Column::Query.eq(query))
            .filter(search_history::Column::SearchType.eq(search_type.as_str()))
            .filter(session)
            .filter(search_history::Column::SearchedAt.gte(log_timestamp(since)))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Groups recent log rows by `(query, type)`. Returns the requested page and
    /// the number of qualifying groups.
    pub async fn popular_searches(
        &self,
        params: &PopularQuery,
    ) -> Result<(Vec<PopularSearchRow>, u64)> {
        let backend = self.conn.get_database_backend();
        let grouped = grouped_select(params);

        let mut page = grouped.clone();
        page.order_by(Alias::new("total_searches"), Order::Desc)
            .order_by(Alias::new("unique_users"), Order::Desc)
            .order_by(Alias::new("last_searched"), Order::Desc)
            .limit(params.limit)
            .offset(params.page.saturating_sub(1).saturating_mul(params.limit));

        let rows = PopularSearchRow::find_by_statement(backend.build(&page))
            .all(&self.conn)
            .await
            .context("failed to aggregate popular searches")?;

        let count = Query::select()
            .expr_as(Expr::cust("COUNT(*)"), Alias::new("total"))
            .from_subquery(grouped, Alias::new("groups"))
            .to_owned();
        let total = self
            .conn
            .query_one(backend.build(&count))
            .await?
            .map(|row| row.try_get::<i64>("", "total"))
            .transpose()?
            .unwrap_or_default();

        Ok((rows, u64::try_from(total).unwrap_or_default()))
    }

    /// Deletes rows older than `before`; returns the number removed.
    pub async fn prune(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = SearchHistory::delete_many()
            .filter(search_history::Column::SearchedAt.lt(log_timestamp(before)))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}

fn grouped_select(params: &PopularQuery) -> SelectStatement {
    let id = || Expr::col((search_history::Entity, search_history::Column::Id));

    let mut stmt = Query::select();
    stmt.column(search_history::Column::Query)
        .column(search_history::Column::SearchType)
        .expr_as(Func::count(id()), Alias::new("total_searches"))
        .expr_as(
            Expr::cust(r#"COUNT(DISTINCT COALESCE("session_id", ''))"#),
            Alias::new("unique_users"),
        )
        .expr_as(
            Expr::col(search_history::Column::SearchedAt).max(),
            Alias::new("last_searched"),
        )
        .expr_as(
            Expr::col(search_history::Column::Filters).max(),
            Alias::new("filters"),
        )
        .from(search_history::Entity)
        .and_where(Expr::col(search_history::Column::SearchedAt).gte(log_timestamp(params.since)))
        .group_by_columns([
            search_history::Column::Query,
            search_history::Column::SearchType,
        ])
        .and_having(Expr::expr(Func::count(id())).gte(params.min_searches));

    if let Some(text) = params.text_filter.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        stmt.and_where(
            Expr::col(search_history::Column::Query)
                .like(LikeExpr::new(format!("%{escaped}%")).escape('\\')),
        );
    }
    if let Some(search_type) = params.type_filter {
        stmt.and_where(Expr::col(search_history::Column::SearchType).eq(search_type.as_str()));
    }

    stmt
}
