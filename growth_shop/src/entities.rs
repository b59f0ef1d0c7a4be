use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart contents keyed by the client cart key
pub mod cart {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "carts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub cart_key: String,
        pub schema_version: i32,
        pub items: Json,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod order {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "orders")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub items: Json,
        pub total_cents: i64,
        pub customer_name: String,
        pub customer_email: String,
        pub payment_status: String,
        pub session_id: Option<String>,
        pub created_at: DateTime,
        pub completed_at: Option<DateTime>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Single-row counter behind `ORD-nnnn` ids
pub mod order_sequence {
    use super::*;

    pub const ROW_ID: i32 = 1;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "order_sequence")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub value: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod loyalty_user {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "loyalty_users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(unique)]
        pub email: String,
        pub name: String,
        pub points: i64,
        pub tier: String,
        #[sea_orm(unique)]
        pub referral_code: String,
        pub referrals: i32,
        pub join_date: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::points_transaction::Entity")]
        Transactions,
    }

    impl Related<super::points_transaction::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Transactions.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod points_transaction {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "points_transactions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub amount: i64,
        pub transaction_type: String,
        pub description: String,
        pub created_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::loyalty_user::Entity",
            from = "Column::UserId",
            to = "super::loyalty_user::Column::Id"
        )]
        User,
    }

    impl Related<super::loyalty_user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
