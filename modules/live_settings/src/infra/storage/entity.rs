//! SeaORM entities for database tables

use sea_orm::entity::prelude::*;

/// Bounded settings table entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    /// Scope (part of composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope_id: i64,

    /// Group key (part of composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_key: String,

    /// Storage key (part of composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub value_key: String,

    /// Stored value
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub value: String,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Unbounded settings table module
pub mod long_setting {
    use sea_orm::entity::prelude::*;

    /// Unbounded settings table entity
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "long_settings")]
    pub struct Model {
        /// Scope (part of composite primary key)
        #[sea_orm(primary_key, auto_increment = false)]
        pub scope_id: i64,

        /// Group key (part of composite primary key)
        #[sea_orm(primary_key, auto_increment = false)]
        pub group_key: String,

        /// Storage key (part of composite primary key)
        #[sea_orm(primary_key, auto_increment = false)]
        pub value_key: String,

        /// Stored value
        #[sea_orm(column_type = "Text")]
        pub value: String,

        /// Last update timestamp
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
