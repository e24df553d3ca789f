//! Postgres-backed store implementation.
//!
//! Entities are persisted as JSONB payloads alongside the columns the
//! engine filters or mutates relationally. Expected schema:
//!
//! ```sql
//! CREATE TABLE resellers (
//!     id          UUID PRIMARY KEY,
//!     user_id     UUID NOT NULL,
//!     slug        TEXT NOT NULL UNIQUE,
//!     payload     JSONB NOT NULL
//! );
//!
//! CREATE TABLE manufacturers (
//!     id          UUID PRIMARY KEY,
//!     user_id     UUID NOT NULL,
//!     payload     JSONB NOT NULL
//! );
//!
//! CREATE TABLE products (
//!     id              UUID PRIMARY KEY,
//!     manufacturer_id UUID NOT NULL,
//!     stock_quantity  BIGINT NOT NULL,
//!     track_inventory BOOLEAN NOT NULL,
//!     payload         JSONB NOT NULL
//! );
//!
//! CREATE TABLE catalog_bindings (
//!     id          UUID PRIMARY KEY,
//!     reseller_id UUID NOT NULL,
//!     product_id  UUID NOT NULL,
//!     payload     JSONB NOT NULL,
//!     UNIQUE (reseller_id, product_id)
//! );
//!
//! CREATE TABLE orders (
//!     id                  UUID PRIMARY KEY,
//!     reseller_id         UUID NOT NULL,
//!     order_number        TEXT NOT NULL UNIQUE,
//!     status              TEXT NOT NULL,
//!     reseller_commission NUMERIC(14,2) NOT NULL,
//!     created_at          TIMESTAMPTZ NOT NULL,
//!     payload             JSONB NOT NULL
//! );
//!
//! CREATE TABLE payouts (
//!     id           UUID PRIMARY KEY,
//!     reseller_id  UUID NOT NULL,
//!     status       TEXT NOT NULL,
//!     amount       NUMERIC(14,2) NOT NULL,
//!     requested_at TIMESTAMPTZ NOT NULL,
//!     payload      JSONB NOT NULL
//! );
//! ```
//!
//! ## Concurrency
//!
//! - `place_order` runs one conditional `UPDATE` per line inside a
//!   transaction; zero affected rows means the stock guard failed and the
//!   whole transaction rolls back. Two racing orders for the last unit
//!   serialize on the row lock and exactly one succeeds.
//! - `create_payout` takes `pg_advisory_xact_lock` on the reseller before
//!   deriving the balance, so concurrent requests for the same reseller
//!   cannot both pass the balance check.
//!
//! ## Error Mapping
//!
//! Unique violations (`23505`) surface as domain conflicts where the
//! constraint has a business meaning (duplicate binding, taken slug); other
//! database errors become `StoreError::Backend`.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use vendora_core::{DomainError, Entity, ManufacturerId, Money, ResellerId, UserId};
use vendora_catalog::{BindingId, CatalogBinding, Product, ProductId};
use vendora_orders::{Order, OrderId};
use vendora_parties::{Manufacturer, Reseller};
use vendora_payouts::{BalanceSummary, Payout, PayoutId, PayoutStatus, ledger};

use super::{Store, StoreError};

/// Postgres-backed `Store`.
///
/// Thread-safe via the SQLx connection pool. The `Store` trait is
/// synchronous; the async internals run on the ambient tokio runtime via
/// `Handle::block_on`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self, order), fields(order_id = %order.id(), lines = order.items().len()), err)]
    pub async fn place_order_tx(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for item in order.items() {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = CASE WHEN track_inventory
                        THEN stock_quantity - $2 ELSE stock_quantity END,
                    payload = CASE WHEN track_inventory
                        THEN jsonb_set(payload, '{stock_quantity}', to_jsonb(stock_quantity - $2))
                        ELSE payload END
                WHERE id = $1
                  AND (NOT track_inventory OR stock_quantity >= $2)
                "#,
            )
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_stock", e))?;

            if result.rows_affected() == 0 {
                let available = sqlx::query(
                    "SELECT stock_quantity FROM products WHERE id = $1",
                )
                .bind(item.product_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("read_stock", e))?;

                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;

                return match available {
                    None => Err(DomainError::not_found("product").into()),
                    Some(row) => Err(DomainError::InsufficientStock {
                        available: row.get::<i64, _>(0),
                        requested: item.quantity,
                    }
                    .into()),
                };
            }
        }

        upsert_order(&mut tx, order).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(reseller_id = %reseller_id), err)]
    pub async fn create_payout_tx(
        &self,
        reseller_id: ResellerId,
        requested: Option<Money>,
        minimum: Money,
    ) -> Result<Payout, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Serialize balance-check-then-insert per reseller for the duration
        // of this transaction.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(reseller_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("advisory_lock", e))?;

        let summary = balance_in_tx(&mut tx, reseller_id).await?;
        let amount = ledger::resolve_request(&summary, requested, minimum)?;

        let payout = Payout::request(reseller_id, amount)?;
        upsert_payout(&mut tx, &payout).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(payout)
    }

    async fn fetch_payload<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        id: Uuid,
        resource: &'static str,
    ) -> Result<T, StoreError> {
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(resource, e))?
            .ok_or_else(|| StoreError::from(DomainError::not_found(resource)))?;
        decode_payload(row.get::<JsonValue, _>(0))
    }

    async fn fetch_payloads<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        id: Uuid,
        operation: &'static str,
    ) -> Result<Vec<T>, StoreError> {
        let rows = sqlx::query(query)
            .bind(id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.into_iter()
            .map(|row| decode_payload(row.get::<JsonValue, _>(0)))
            .collect()
    }
}

fn encode_payload<T: Serialize>(entity: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(entity)
        .map_err(|e| StoreError::backend("encode_payload", e.to_string()))
}

fn decode_payload<T: serde::de::DeserializeOwned>(payload: JsonValue) -> Result<T, StoreError> {
    serde_json::from_value(payload)
        .map_err(|e| StoreError::backend("decode_payload", e.to_string()))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::backend(
            operation,
            format!("database error: {}", db_err.message()),
        ),
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        other => StoreError::backend(operation, other.to_string()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

async fn upsert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), StoreError> {
    let payload = encode_payload(order)?;
    sqlx::query(
        r#"
        INSERT INTO orders (id, reseller_id, order_number, status, reseller_commission, created_at, payload)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            payload = EXCLUDED.payload
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.reseller_id().as_uuid())
    .bind(order.order_number())
    .bind(order.status().as_str())
    .bind(order.reseller_commission().amount())
    .bind(order.created_at())
    .bind(&payload)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("upsert_order", e))?;
    Ok(())
}

async fn upsert_payout(
    tx: &mut Transaction<'_, Postgres>,
    payout: &Payout,
) -> Result<(), StoreError> {
    let payload = encode_payload(payout)?;
    sqlx::query(
        r#"
        INSERT INTO payouts (id, reseller_id, status, amount, requested_at, payload)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            payload = EXCLUDED.payload
        "#,
    )
    .bind(payout.id().as_uuid())
    .bind(payout.reseller_id().as_uuid())
    .bind(payout.status().as_str())
    .bind(payout.amount().amount())
    .bind(payout.requested_at())
    .bind(&payload)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("upsert_payout", e))?;
    Ok(())
}

async fn balance_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    reseller_id: ResellerId,
) -> Result<BalanceSummary, StoreError> {
    let earned: Option<Decimal> = sqlx::query_scalar(
        r#"
        SELECT SUM(reseller_commission)
        FROM orders
        WHERE reseller_id = $1 AND status = 'delivered'
        "#,
    )
    .bind(reseller_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("sum_commissions", e))?;

    let rows = sqlx::query(
        r#"
        SELECT status, SUM(amount)
        FROM payouts
        WHERE reseller_id = $1
        GROUP BY status
        "#,
    )
    .bind(reseller_id.as_uuid())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("sum_payouts", e))?;

    let total_earned = Money::new(earned.unwrap_or_default());
    let mut total_withdrawn = Money::ZERO;
    let mut pending_withdrawals = Money::ZERO;
    for row in rows {
        let status: String = row.get(0);
        let sum: Option<Decimal> = row.get(1);
        let sum = Money::new(sum.unwrap_or_default());
        match status.as_str() {
            s if s == PayoutStatus::Completed.as_str() => total_withdrawn += sum,
            s if s == PayoutStatus::Failed.as_str() => {}
            _ => pending_withdrawals += sum,
        }
    }

    let available = (total_earned - total_withdrawn - pending_withdrawals).max(Money::ZERO);
    Ok(BalanceSummary {
        total_earned,
        total_withdrawn,
        pending_withdrawals,
        available,
    })
}

impl PostgresStore {
    async fn upsert_reseller(&self, reseller: &Reseller) -> Result<(), StoreError> {
        let payload = encode_payload(reseller)?;
        sqlx::query(
            r#"
            INSERT INTO resellers (id, user_id, slug, payload)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                slug = EXCLUDED.slug,
                payload = EXCLUDED.payload
            "#,
        )
        .bind(reseller.id().as_uuid())
        .bind(reseller.user_id().as_uuid())
        .bind(reseller.slug())
        .bind(&payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::validation("store slug is already taken").into()
            } else {
                map_sqlx_error("upsert_reseller", e)
            }
        })?;
        Ok(())
    }

    async fn upsert_manufacturer(&self, manufacturer: &Manufacturer) -> Result<(), StoreError> {
        let payload = encode_payload(manufacturer)?;
        sqlx::query(
            r#"
            INSERT INTO manufacturers (id, user_id, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET payload = EXCLUDED.payload
            "#,
        )
        .bind(manufacturer.id().as_uuid())
        .bind(manufacturer.user_id().as_uuid())
        .bind(&payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_manufacturer", e))?;
        Ok(())
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), StoreError> {
        let payload = encode_payload(product)?;
        sqlx::query(
            r#"
            INSERT INTO products (id, manufacturer_id, stock_quantity, track_inventory, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                stock_quantity = EXCLUDED.stock_quantity,
                track_inventory = EXCLUDED.track_inventory,
                payload = EXCLUDED.payload
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.manufacturer_id().as_uuid())
        .bind(product.stock_quantity())
        .bind(product.track_inventory())
        .bind(&payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_product", e))?;
        Ok(())
    }

    async fn insert_binding_row(&self, binding: &CatalogBinding) -> Result<(), StoreError> {
        let payload = encode_payload(binding)?;
        sqlx::query(
            r#"
            INSERT INTO catalog_bindings (id, reseller_id, product_id, payload)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(binding.id().as_uuid())
        .bind(binding.reseller_id().as_uuid())
        .bind(binding.product_id().as_uuid())
        .bind(&payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateBinding.into()
            } else {
                map_sqlx_error("insert_binding", e)
            }
        })?;
        Ok(())
    }

    async fn update_binding_row(&self, binding: &CatalogBinding) -> Result<(), StoreError> {
        let payload = encode_payload(binding)?;
        let result = sqlx::query("UPDATE catalog_bindings SET payload = $2 WHERE id = $1")
            .bind(binding.id().as_uuid())
            .bind(&payload)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_binding", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("listing").into());
        }
        Ok(())
    }
}

/// Run an async store operation on the ambient tokio runtime.
///
/// The `Store` trait is synchronous; this bridge requires being called from
/// within a tokio runtime context.
fn block_on<F, T>(future: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::backend(
            "runtime",
            "PostgresStore requires an ambient tokio runtime",
        )
    })?;
    handle.block_on(future)
}

impl Store for PostgresStore {
    fn insert_reseller(&self, reseller: Reseller) -> Result<(), StoreError> {
        block_on(self.upsert_reseller(&reseller))
    }

    fn update_reseller(&self, reseller: &Reseller) -> Result<(), StoreError> {
        block_on(self.upsert_reseller(reseller))
    }

    fn reseller(&self, id: ResellerId) -> Result<Reseller, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM resellers WHERE id = $1",
            *id.as_uuid(),
            "reseller",
        ))
    }

    fn reseller_by_user(&self, user_id: UserId) -> Result<Reseller, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM resellers WHERE user_id = $1",
            *user_id.as_uuid(),
            "reseller",
        ))
    }

    fn reseller_by_slug(&self, slug: &str) -> Result<Reseller, StoreError> {
        let slug = slug.to_string();
        block_on(async move {
            let row = sqlx::query("SELECT payload FROM resellers WHERE slug = $1")
                .bind(&slug)
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("reseller_by_slug", e))?
                .ok_or(StoreError::Domain(DomainError::StoreNotFound))?;
            decode_payload(row.get::<JsonValue, _>(0))
        })
    }

    fn insert_manufacturer(&self, manufacturer: Manufacturer) -> Result<(), StoreError> {
        block_on(self.upsert_manufacturer(&manufacturer))
    }

    fn update_manufacturer(&self, manufacturer: &Manufacturer) -> Result<(), StoreError> {
        block_on(self.upsert_manufacturer(manufacturer))
    }

    fn manufacturer(&self, id: ManufacturerId) -> Result<Manufacturer, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM manufacturers WHERE id = $1",
            *id.as_uuid(),
            "manufacturer",
        ))
    }

    fn manufacturer_by_user(&self, user_id: UserId) -> Result<Manufacturer, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM manufacturers WHERE user_id = $1",
            *user_id.as_uuid(),
            "manufacturer",
        ))
    }

    fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        block_on(self.upsert_product(&product))
    }

    fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        block_on(self.upsert_product(product))
    }

    fn product(&self, id: ProductId) -> Result<Product, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM products WHERE id = $1",
            *id.as_uuid(),
            "product",
        ))
    }

    fn products_by_manufacturer(&self, id: ManufacturerId) -> Result<Vec<Product>, StoreError> {
        block_on(self.fetch_payloads(
            "SELECT payload FROM products WHERE manufacturer_id = $1",
            *id.as_uuid(),
            "products_by_manufacturer",
        ))
    }

    fn insert_binding(&self, binding: CatalogBinding) -> Result<(), StoreError> {
        block_on(self.insert_binding_row(&binding))
    }

    fn update_binding(&self, binding: &CatalogBinding) -> Result<(), StoreError> {
        block_on(self.update_binding_row(binding))
    }

    fn delete_binding(&self, id: BindingId) -> Result<(), StoreError> {
        block_on(async move {
            let result = sqlx::query("DELETE FROM catalog_bindings WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("delete_binding", e))?;
            if result.rows_affected() == 0 {
                return Err(DomainError::not_found("listing").into());
            }
            Ok(())
        })
    }

    fn binding(&self, id: BindingId) -> Result<CatalogBinding, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM catalog_bindings WHERE id = $1",
            *id.as_uuid(),
            "listing",
        ))
    }

    fn binding_for(
        &self,
        reseller_id: ResellerId,
        product_id: ProductId,
    ) -> Result<Option<CatalogBinding>, StoreError> {
        block_on(async move {
            let row = sqlx::query(
                "SELECT payload FROM catalog_bindings WHERE reseller_id = $1 AND product_id = $2",
            )
            .bind(reseller_id.as_uuid())
            .bind(product_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("binding_for", e))?;
            row.map(|r| decode_payload(r.get::<JsonValue, _>(0)))
                .transpose()
        })
    }

    fn bindings_by_reseller(&self, id: ResellerId) -> Result<Vec<CatalogBinding>, StoreError> {
        block_on(self.fetch_payloads(
            "SELECT payload FROM catalog_bindings WHERE reseller_id = $1 \
             ORDER BY (payload->>'display_order')::int, id",
            *id.as_uuid(),
            "bindings_by_reseller",
        ))
    }

    fn place_order(&self, order: &Order) -> Result<(), StoreError> {
        block_on(self.place_order_tx(order))
    }

    fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        block_on(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("begin_transaction", e))?;
            upsert_order(&mut tx, order).await?;
            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("commit_transaction", e))
        })
    }

    fn order(&self, id: OrderId) -> Result<Order, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM orders WHERE id = $1",
            *id.as_uuid(),
            "order",
        ))
    }

    fn orders_by_reseller(&self, id: ResellerId) -> Result<Vec<Order>, StoreError> {
        block_on(self.fetch_payloads(
            "SELECT payload FROM orders WHERE reseller_id = $1 ORDER BY created_at",
            *id.as_uuid(),
            "orders_by_reseller",
        ))
    }

    fn create_payout(
        &self,
        reseller_id: ResellerId,
        requested: Option<Money>,
        minimum: Money,
    ) -> Result<Payout, StoreError> {
        block_on(self.create_payout_tx(reseller_id, requested, minimum))
    }

    fn update_payout(&self, payout: &Payout) -> Result<(), StoreError> {
        block_on(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("begin_transaction", e))?;
            upsert_payout(&mut tx, payout).await?;
            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("commit_transaction", e))
        })
    }

    fn payout(&self, id: PayoutId) -> Result<Payout, StoreError> {
        block_on(self.fetch_payload(
            "SELECT payload FROM payouts WHERE id = $1",
            *id.as_uuid(),
            "payout",
        ))
    }

    fn payouts_by_reseller(&self, id: ResellerId) -> Result<Vec<Payout>, StoreError> {
        block_on(self.fetch_payloads(
            "SELECT payload FROM payouts WHERE reseller_id = $1 ORDER BY requested_at",
            *id.as_uuid(),
            "payouts_by_reseller",
        ))
    }

    fn balance(&self, reseller_id: ResellerId) -> Result<BalanceSummary, StoreError> {
        block_on(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("begin_transaction", e))?;
            let summary = balance_in_tx(&mut tx, reseller_id).await?;
            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("commit_transaction", e))?;
            Ok(summary)
        })
    }
}
