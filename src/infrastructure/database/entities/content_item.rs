// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "content_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub scan_job_id: Uuid,
    pub url: String,
    pub captured_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_file::Entity")]
    ContentFiles,
}

impl Related<super::content_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
