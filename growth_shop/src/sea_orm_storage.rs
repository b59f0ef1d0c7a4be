use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Schema, Set, TransactionTrait,
};
use std::str::FromStr;
use storefront::{
    model::*,
    storage::{CartStorage, LoyaltyStorage, OrderStorage},
};
use tracing::{debug, info};

use crate::entities::{cart, loyalty_user, order, order_sequence, points_transaction};

/// SeaORM-backed carts, orders and loyalty ledger.
///
/// Tables are created on connect when missing.
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub db: DatabaseConnection,
}

impl SeaOrmStorage {
    pub async fn connect(database_url: &str) -> Result<Self, GenericError> {
        let mut options = ConnectOptions::new(database_url);
        // every pooled connection to an in-memory sqlite db would see its own empty database
        if database_url.starts_with("sqlite::memory") {
            options.max_connections(1).min_connections(1);
        }
        options.sqlx_logging(false);
        let db = Database::connect(options).await?;
        let storage = Self { db };
        storage.create_schema().await?;
        info!("Connected storefront storage");
        Ok(storage)
    }

    async fn create_schema(&self) -> Result<(), GenericError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut statements = vec![
            schema.create_table_from_entity(cart::Entity),
            schema.create_table_from_entity(order::Entity),
            schema.create_table_from_entity(order_sequence::Entity),
            schema.create_table_from_entity(loyalty_user::Entity),
            schema.create_table_from_entity(points_transaction::Entity),
        ];
        for statement in statements.iter_mut() {
            statement.if_not_exists();
            self.db.execute(backend.build(&*statement)).await?;
        }

        if order_sequence::Entity::find_by_id(order_sequence::ROW_ID)
            .one(&self.db)
            .await?
            .is_none()
        {
            order_sequence::ActiveModel {
                id: Set(order_sequence::ROW_ID),
                value: Set(0),
            }
            .insert(&self.db)
            .await?;
        }
        debug!("Storefront schema ready");
        Ok(())
    }

    async fn insert_user(&self, user: &LoyaltyUser, signup: &PointsTransaction) -> Result<(), GenericError> {
        let txn = self.db.begin().await?;
        loyalty_user::ActiveModel {
            id: Set(user.id.clone()),
            email: Set(user.email.clone()),
            name: Set(user.name.clone()),
            points: Set(user.points),
            tier: Set(user.tier.to_string()),
            referral_code: Set(user.referral_code.clone()),
            referrals: Set(i32::try_from(user.referrals)?),
            join_date: Set(user.join_date.naive_utc()),
        }
        .insert(&txn)
        .await?;
        transaction_active_model(signup).insert(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

fn parse_enum<T: FromStr>(value: &str, what: &str) -> Result<T, GenericError> {
    T::from_str(value).map_err(|_| format!("Unknown {} '{}' in storage", what, value).into())
}

fn order_from_model(model: order::Model) -> Result<Order, GenericError> {
    Ok(Order {
        id: OrderId::from(model.id),
        items: serde_json::from_value(model.items)?,
        total: Money::from_cents(model.total_cents),
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        payment_status: parse_enum(&model.payment_status, "payment status")?,
        created_at: model.created_at.and_utc(),
        session_id: model.session_id,
        completed_at: model.completed_at.map(|at| at.and_utc()),
    })
}

fn user_from_model(model: loyalty_user::Model) -> Result<LoyaltyUser, GenericError> {
    Ok(LoyaltyUser {
        id: model.id,
        email: model.email,
        name: model.name,
        points: model.points,
        tier: parse_enum(&model.tier, "tier")?,
        referral_code: model.referral_code,
        referrals: u32::try_from(model.referrals)?,
        join_date: model.join_date.and_utc(),
    })
}

fn transaction_from_model(model: points_transaction::Model) -> Result<PointsTransaction, GenericError> {
    Ok(PointsTransaction {
        id: model.id,
        user_id: model.user_id,
        amount: model.amount,
        transaction_type: parse_enum(&model.transaction_type, "transaction type")?,
        description: model.description,
        created_at: model.created_at.and_utc(),
    })
}

fn transaction_active_model(transaction: &PointsTransaction) -> points_transaction::ActiveModel {
    points_transaction::ActiveModel {
        id: Set(transaction.id.clone()),
        user_id: Set(transaction.user_id.clone()),
        amount: Set(transaction.amount),
        transaction_type: Set(transaction.transaction_type.to_string()),
        description: Set(transaction.description.clone()),
        created_at: Set(transaction.created_at.naive_utc()),
    }
}

#[async_trait]
impl CartStorage for SeaOrmStorage {
    async fn load_cart(&self, cart_key: &str) -> Result<Vec<CartLineItem>, GenericError> {
        let Some(row) = cart::Entity::find_by_id(cart_key.to_string()).one(&self.db).await? else {
            return Ok(Vec::new());
        };
        if row.schema_version != CART_SCHEMA_VERSION as i32 {
            return Err(format!(
                "Cart {} has schema version {}, expected {}",
                cart_key, row.schema_version, CART_SCHEMA_VERSION
            )
            .into());
        }
        Ok(serde_json::from_value(row.items)?)
    }

    async fn save_cart(&self, cart_key: &str, items: &[CartLineItem]) -> Result<(), GenericError> {
        let row = cart::ActiveModel {
            cart_key: Set(cart_key.to_string()),
            schema_version: Set(CART_SCHEMA_VERSION as i32),
            items: Set(serde_json::to_value(items)?),
            updated_at: Set(Utc::now().naive_utc()),
        };
        cart::Entity::insert(row)
            .on_conflict(
                OnConflict::column(cart::Column::CartKey)
                    .update_columns([cart::Column::SchemaVersion, cart::Column::Items, cart::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn clear_cart(&self, cart_key: &str) -> Result<(), GenericError> {
        cart::Entity::delete_by_id(cart_key.to_string()).exec(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStorage for SeaOrmStorage {
    async fn next_order_number(&self) -> Result<u64, GenericError> {
        let txn = self.db.begin().await?;
        order_sequence::Entity::update_many()
            .col_expr(
                order_sequence::Column::Value,
                Expr::col(order_sequence::Column::Value).add(1),
            )
            .filter(order_sequence::Column::Id.eq(order_sequence::ROW_ID))
            .exec(&txn)
            .await?;
        let row = order_sequence::Entity::find_by_id(order_sequence::ROW_ID)
            .one(&txn)
            .await?
            .ok_or("Order sequence row is missing")?;
        txn.commit().await?;
        Ok(u64::try_from(row.value)?)
    }

    async fn insert_order(&self, order: &Order) -> Result<(), GenericError> {
        order::ActiveModel {
            id: Set(order.id.to_string()),
            items: Set(serde_json::to_value(&order.items)?),
            total_cents: Set(order.total.cents()),
            customer_name: Set(order.customer_name.clone()),
            customer_email: Set(order.customer_email.clone()),
            payment_status: Set(order.payment_status.to_string()),
            session_id: Set(order.session_id.clone()),
            created_at: Set(order.created_at.naive_utc()),
            completed_at: Set(order.completed_at.map(|at| at.naive_utc())),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, GenericError> {
        order::Entity::find_by_id(order_id.to_string())
            .one(&self.db)
            .await?
            .map(order_from_model)
            .transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>, GenericError> {
        order::Entity::find()
            .order_by_asc(order::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn list_orders_by_email(&self, email: &str) -> Result<Vec<Order>, GenericError> {
        order::Entity::find()
            .filter(order::Column::CustomerEmail.eq(email))
            .order_by_asc(order::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn attach_session(&self, order_id: &OrderId, session_id: &str) -> Result<Option<Order>, GenericError> {
        let result = order::Entity::update_many()
            .col_expr(order::Column::SessionId, Expr::value(session_id))
            .filter(order::Column::Id.eq(order_id.as_str()))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_order(order_id).await
    }

    async fn find_order_by_session(&self, session_id: &str) -> Result<Option<Order>, GenericError> {
        order::Entity::find()
            .filter(order::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await?
            .map(order_from_model)
            .transpose()
    }

    async fn transition_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        session_id: Option<&str>,
    ) -> Result<Option<StatusChange>, GenericError> {
        let txn = self.db.begin().await?;
        let Some(row) = order::Entity::find_by_id(order_id.to_string())
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };
        let mut current = order_from_model(row.clone())?;
        if let Some(session_id) = session_id {
            current.session_id = Some(session_id.to_string());
        }
        let change = current.apply_status(status);

        let mut active: order::ActiveModel = row.into();
        active.payment_status = Set(status.to_string());
        active.session_id = Set(change.order.session_id.clone());
        active.completed_at = Set(change.order.completed_at.map(|at| at.naive_utc()));
        active.update(&txn).await?;
        txn.commit().await?;

        Ok(Some(change))
    }
}

#[async_trait]
impl LoyaltyStorage for SeaOrmStorage {
    async fn insert_user_if_absent(
        &self,
        user: &LoyaltyUser,
        signup: &PointsTransaction,
    ) -> Result<(LoyaltyUser, bool), GenericError> {
        if let Some(existing) = self.get_user_by_email(&user.email).await? {
            return Ok((existing, false));
        }

        match self.insert_user(user, signup).await {
            Ok(()) => Ok((user.clone(), true)),
            // lost a race on the unique email
            Err(e) => match self.get_user_by_email(&user.email).await? {
                Some(existing) => Ok((existing, false)),
                None => Err(e),
            },
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        loyalty_user::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .map(user_from_model)
            .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        loyalty_user::Entity::find()
            .filter(loyalty_user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(user_from_model)
            .transpose()
    }

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<LoyaltyUser>, GenericError> {
        loyalty_user::Entity::find()
            .filter(loyalty_user::Column::ReferralCode.eq(code))
            .one(&self.db)
            .await?
            .map(user_from_model)
            .transpose()
    }

    async fn referral_code_exists(&self, code: &str) -> Result<bool, GenericError> {
        Ok(self.get_user_by_referral_code(code).await?.is_some())
    }

    async fn apply_credit(
        &self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<Option<(LoyaltyUser, PointsTransaction)>, GenericError> {
        let txn = self.db.begin().await?;

        let mut increment = loyalty_user::Entity::update_many().col_expr(
            loyalty_user::Column::Points,
            Expr::col(loyalty_user::Column::Points).add(credit.amount),
        );
        if credit.count_referral {
            increment = increment.col_expr(
                loyalty_user::Column::Referrals,
                Expr::col(loyalty_user::Column::Referrals).add(1),
            );
        }
        let result = increment
            .filter(loyalty_user::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        let row = loyalty_user::Entity::find_by_id(user_id.to_string())
            .one(&txn)
            .await?
            .ok_or("Credited user vanished inside transaction")?;
        let tier = calculate_tier(row.points);
        let mut active: loyalty_user::ActiveModel = row.into();
        active.tier = Set(tier.to_string());
        let row = active.update(&txn).await?;

        let transaction = credit.to_transaction(user_id);
        transaction_active_model(&transaction).insert(&txn).await?;
        txn.commit().await?;

        Ok(Some((user_from_model(row)?, transaction)))
    }

    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<PointsTransaction>, GenericError> {
        points_transaction::Entity::find()
            .filter(points_transaction::Column::UserId.eq(user_id))
            .order_by_desc(points_transaction::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }
}
