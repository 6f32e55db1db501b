use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderStatus, StatusTransition};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

use crate::directory::{BasketStore, Catalog, Directory, PaymentType, Product, Purchaser};
use crate::store::OrderStore;
use crate::{
    AggregateId, BranchId, HydratedAggregate, HydratedLineItem, Hydration, LineItem, LineItemId,
    NewAggregate, NewLineItem, NewOrder, OperatorId, OrderAggregate, PaymentTypeId,
    PendingFilter, ProductId, Result, StoreError, UserId,
};

const AGGREGATE_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.branch_id, a.payment_type_id, a.address, a.message, a.status,
           a.created_at,
           u.id AS user_row_id, u.first_name, u.last_name, u.email, u.phone_num,
           pt.id AS payment_type_row_id, pt.name AS payment_type_name
    FROM order_aggregates a
    LEFT JOIN users u ON u.id = a.user_id
    LEFT JOIN payment_types pt ON pt.id = a.payment_type_id
"#;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_aggregate(row: &PgRow) -> Result<OrderAggregate> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::CorruptRow {
                table: "order_aggregates",
                reason: e.to_string(),
            })?;

        Ok(OrderAggregate {
            id: AggregateId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            branch_id: BranchId::new(row.try_get("branch_id")?),
            payment_type_id: PaymentTypeId::new(row.try_get("payment_type_id")?),
            address: row.try_get("address")?,
            message: row.try_get("message")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_purchaser(row: &PgRow) -> Result<Option<Purchaser>> {
        let Some(id) = row.try_get::<Option<i64>, _>("user_row_id")? else {
            return Ok(None);
        };
        Ok(Some(Purchaser {
            id: UserId::new(id),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone_num: row.try_get("phone_num")?,
        }))
    }

    fn row_to_payment_type(row: &PgRow) -> Result<Option<PaymentType>> {
        let Some(id) = row.try_get::<Option<i64>, _>("payment_type_row_id")? else {
            return Ok(None);
        };
        Ok(Some(PaymentType {
            id: PaymentTypeId::new(id),
            name: row.try_get("payment_type_name")?,
        }))
    }

    fn row_to_line_item(row: &PgRow) -> Result<HydratedLineItem> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::CorruptRow {
            table: "line_items",
            reason: format!("negative quantity {quantity}"),
        })?;

        let product = match row.try_get::<Option<i64>, _>("product_row_id")? {
            Some(id) => Some(Product {
                id: ProductId::new(id),
                name: row.try_get("product_name")?,
                price: Money::from_cents(row.try_get("product_price_cents")?),
            }),
            None => None,
        };

        Ok(HydratedLineItem {
            line_item: LineItem {
                id: LineItemId::new(row.try_get("id")?),
                product_id: ProductId::new(row.try_get("product_id")?),
                quantity,
                unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                created_at: row.try_get("created_at")?,
            },
            product,
        })
    }

    async fn hydrate_rows(
        &self,
        rows: Vec<PgRow>,
        hydration: Hydration,
    ) -> Result<Vec<HydratedAggregate>> {
        if hydration == Hydration::Bare {
            return rows
                .iter()
                .map(|row| Ok(HydratedAggregate::bare(Self::row_to_aggregate(row)?)))
                .collect();
        }

        let ids: Vec<i64> = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<_, _>>()?;

        let item_rows = sqlx::query(
            r#"
            SELECT r.aggregate_id, li.id, li.product_id, li.quantity, li.unit_price_cents,
                   li.created_at,
                   p.id AS product_row_id, p.name AS product_name,
                   p.price_cents AS product_price_cents
            FROM aggregate_line_items r
            JOIN line_items li ON li.id = r.line_item_id
            LEFT JOIN products p ON p.id = li.product_id
            WHERE r.aggregate_id = ANY($1)
            ORDER BY li.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_aggregate: HashMap<i64, Vec<HydratedLineItem>> = HashMap::new();
        for row in &item_rows {
            let aggregate_id: i64 = row.try_get("aggregate_id")?;
            items_by_aggregate
                .entry(aggregate_id)
                .or_default()
                .push(Self::row_to_line_item(row)?);
        }

        rows.iter()
            .map(|row| {
                let aggregate = Self::row_to_aggregate(row)?;
                Ok(HydratedAggregate {
                    line_items: items_by_aggregate
                        .remove(&aggregate.id.get())
                        .unwrap_or_default(),
                    user: Self::row_to_purchaser(row)?,
                    payment_type: Self::row_to_payment_type(row)?,
                    aggregate,
                })
            })
            .collect()
    }
}

async fn insert_line_items(
    conn: &mut PgConnection,
    items: &[NewLineItem],
) -> Result<Vec<LineItemId>> {
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let quantity = i32::try_from(item.quantity).map_err(|_| StoreError::Validation {
            entity: "line item",
            reason: format!("quantity {} is out of range", item.quantity),
        })?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO line_items (product_id, quantity, unit_price_cents, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(item.product_id.get())
        .bind(quantity)
        .bind(item.unit_price.cents())
        .bind(item.created_at)
        .fetch_one(&mut *conn)
        .await?;

        ids.push(LineItemId::new(id));
    }
    Ok(ids)
}

async fn insert_aggregate(
    conn: &mut PgConnection,
    aggregate: &NewAggregate,
) -> Result<AggregateId> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO order_aggregates
            (user_id, branch_id, payment_type_id, address, message, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(aggregate.user_id.get())
    .bind(aggregate.branch_id.get())
    .bind(aggregate.payment_type_id.get())
    .bind(&aggregate.address)
    .bind(&aggregate.message)
    .bind(aggregate.status.as_str())
    .bind(aggregate.created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(AggregateId::new(id))
}

async fn insert_relations(
    conn: &mut PgConnection,
    aggregate_id: AggregateId,
    line_item_ids: &[LineItemId],
) -> Result<()> {
    let ids: Vec<i64> = line_item_ids.iter().map(LineItemId::get).collect();
    sqlx::query(
        r#"
        INSERT INTO aggregate_line_items (aggregate_id, line_item_id)
        SELECT $1, UNNEST($2::BIGINT[])
        "#,
    )
    .bind(aggregate_id.get())
    .bind(&ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_line_items(&self, items: Vec<NewLineItem>) -> Result<Vec<LineItemId>> {
        for item in &items {
            item.validate()?;
        }
        let mut tx = self.pool.begin().await?;
        let ids = insert_line_items(&mut tx, &items).await?;
        tx.commit().await?;
        Ok(ids)
    }

    async fn create_aggregate(&self, aggregate: NewAggregate) -> Result<AggregateId> {
        aggregate.validate()?;
        let mut conn = self.pool.acquire().await?;
        insert_aggregate(&mut conn, &aggregate).await
    }

    async fn link_line_items(
        &self,
        aggregate_id: AggregateId,
        line_item_ids: &[LineItemId],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_aggregates WHERE id = $1)")
                .bind(aggregate_id.get())
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(StoreError::AggregateNotFound(aggregate_id));
        }

        insert_relations(&mut tx, aggregate_id, line_item_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn place_order(&self, order: NewOrder) -> Result<AggregateId> {
        order.aggregate.validate()?;
        for item in &order.line_items {
            item.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let line_item_ids = insert_line_items(&mut tx, &order.line_items).await?;
        let aggregate_id = insert_aggregate(&mut tx, &order.aggregate).await?;
        insert_relations(&mut tx, aggregate_id, &line_item_ids).await?;
        tx.commit().await?;

        tracing::debug!(%aggregate_id, line_items = line_item_ids.len(), "order placed");
        Ok(aggregate_id)
    }

    async fn find_aggregate(
        &self,
        aggregate_id: AggregateId,
        hydration: Hydration,
    ) -> Result<Option<HydratedAggregate>> {
        let sql = format!("{AGGREGATE_SELECT} WHERE a.id = $1");
        let rows = sqlx::query(&sql)
            .bind(aggregate_id.get())
            .fetch_all(&self.pool)
            .await?;

        Ok(self.hydrate_rows(rows, hydration).await?.into_iter().next())
    }

    async fn list_pending(&self, filter: PendingFilter) -> Result<Vec<HydratedAggregate>> {
        let mut sql = format!("{AGGREGATE_SELECT} WHERE a.status <> $1");
        let mut param_count = 1;

        if filter.branch_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND a.branch_id = ${param_count}"));
        }
        if filter.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND a.user_id = ${param_count}"));
        }
        sql.push_str(" ORDER BY a.created_at DESC, a.id DESC");

        let mut query = sqlx::query(&sql).bind(filter.exclude_status.as_str());
        if let Some(branch_id) = filter.branch_id {
            query = query.bind(branch_id.get());
        }
        if let Some(user_id) = filter.user_id {
            query = query.bind(user_id.get());
        }

        let rows = query.fetch_all(&self.pool).await?;
        self.hydrate_rows(rows, Hydration::Details).await
    }

    async fn set_status(&self, aggregate_id: AggregateId, status: OrderStatus) -> Result<u64> {
        let result = match status.transition() {
            StatusTransition::Archive => {
                sqlx::query("DELETE FROM order_aggregates WHERE id = $1")
                    .bind(aggregate_id.get())
                    .execute(&self.pool)
                    .await?
            }
            StatusTransition::Advance(status) => {
                sqlx::query("UPDATE order_aggregates SET status = $2 WHERE id = $1")
                    .bind(aggregate_id.get())
                    .bind(status.as_str())
                    .execute(&self.pool)
                    .await?
            }
        };

        match result.rows_affected() {
            0 => Err(StoreError::AggregateNotFound(aggregate_id)),
            n => Ok(n),
        }
    }

    async fn quantity_between(
        &self,
        product_id: ProductId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::BIGINT
            FROM line_items
            WHERE product_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(product_id.get())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(total).map_err(|_| StoreError::CorruptRow {
            table: "line_items",
            reason: format!("negative quantity sum {total}"),
        })
    }
}

#[async_trait]
impl Directory for PostgresStore {
    async fn branch_exists(&self, branch_id: BranchId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                .bind(branch_id.get())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn operators_for_branch(&self, branch_id: BranchId) -> Result<Vec<OperatorId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM operators
            WHERE branch_id = $1 OR branch_id IS NULL
            ORDER BY id ASC
            "#,
        )
        .bind(branch_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(OperatorId::new).collect())
    }
}

#[async_trait]
impl Catalog for PostgresStore {
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, price_cents FROM products WHERE id = $1")
                .bind(product_id.get())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(Product {
                id: ProductId::new(row.try_get("id")?),
                name: row.try_get("name")?,
                price: Money::from_cents(row.try_get("price_cents")?),
            })),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BasketStore for PostgresStore {
    async fn clear_basket(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM basket_entries WHERE user_id = $1")
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
