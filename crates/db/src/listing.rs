//! SQL rendering of resolved list queries.
//!
//! A repository supplies a base `SELECT` producing its model's columns;
//! filters, ordering and paging are applied around it:
//!
//! ```text
//! SELECT * FROM (<base>) AS t WHERE t."price" >= $1 ORDER BY t."date" DESC, t."id" ASC LIMIT $2 OFFSET $3
//! ```
//!
//! Column names come from the resource's `FieldSpec` table and values are
//! always bound, never interpolated.

use eventhub_core::listing::{FilterValue, ResolvedQuery};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

/// Build the paged query for `base_select`.
pub fn build_page_query(base_select: &str, query: &ResolvedQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM (");
    builder.push(base_select);
    builder.push(") AS t");

    for (i, filter) in query.filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(format!("t.\"{}\" {} ", filter.column, filter.op.as_sql()));
        push_value(&mut builder, &filter.value);
    }

    for (i, sort) in query.sort.iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        builder.push(format!("t.\"{}\" {}", sort.column, sort.direction.as_sql()));
    }

    builder.push(" LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);
    builder
}

/// Run the paged query and map each row to `M`.
pub async fn fetch_page<M>(
    pool: &PgPool,
    base_select: &str,
    query: &ResolvedQuery,
) -> Result<Vec<M>, sqlx::Error>
where
    M: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut builder = build_page_query(base_select, query);
    builder.build_query_as::<M>().fetch_all(pool).await
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(v) => builder.push_bind(v.clone()),
        FilterValue::Integer(v) => builder.push_bind(*v),
        FilterValue::Float(v) => builder.push_bind(*v),
        FilterValue::Boolean(v) => builder.push_bind(*v),
        FilterValue::Timestamp(v) => builder.push_bind(*v),
    };
}
