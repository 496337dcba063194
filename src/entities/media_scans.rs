use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Anti-virus verdict for a media URL, as stored in the cache.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    /// Never scanned, or the last scan attempt failed.
    #[sea_orm(string_value = "UNKNOWN")]
    Unknown,
    /// A scan request is currently in flight.
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "TRUSTED")]
    Trusted,
    #[sea_orm(string_value = "INFECTED")]
    Infected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media_scans")]
pub struct Model {
    /// mxc:// content URL of the media item.
    #[sea_orm(primary_key, auto_increment = false)]
    pub url: String,
    pub scan_status: ScanStatus,
    pub scan_info: Option<String>,
    pub scan_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
