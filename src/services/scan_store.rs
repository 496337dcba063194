use crate::entities::{media_scans, prelude::*};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::ScanStatus;

/// Durable key-value store of scan verdicts, keyed by mxc URL.
/// Last write wins; the database provides per-statement atomicity and no
/// cross-URL transactionality is offered.
#[derive(Clone)]
pub struct MediaScanStore {
    db: DatabaseConnection,
}

impl MediaScanStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the record for `url`, lazily creating a default UNKNOWN row
    /// on first lookup.
    pub async fn get(&self, url: &str) -> anyhow::Result<media_scans::Model> {
        if let Some(model) = MediaScans::find_by_id(url).one(&self.db).await? {
            return Ok(model);
        }

        let row = media_scans::ActiveModel {
            url: Set(url.to_owned()),
            scan_status: Set(ScanStatus::Unknown),
            scan_info: Set(None),
            scan_date: Set(None),
        };

        // Two first lookups can race; the loser's insert is a no-op and the
        // re-read below returns whatever the winner wrote.
        MediaScans::insert(row)
            .on_conflict(
                OnConflict::column(media_scans::Column::Url)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        MediaScans::find_by_id(url)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("media scan record vanished for {}", url))
    }

    /// Upserts the record for `url`.
    pub async fn set(
        &self,
        url: &str,
        status: ScanStatus,
        info: Option<String>,
        date: DateTime<Utc>,
    ) -> anyhow::Result<media_scans::Model> {
        let row = media_scans::ActiveModel {
            url: Set(url.to_owned()),
            scan_status: Set(status),
            scan_info: Set(info),
            scan_date: Set(Some(date)),
        };

        MediaScans::insert(row)
            .on_conflict(
                OnConflict::column(media_scans::Column::Url)
                    .update_columns([
                        media_scans::Column::ScanStatus,
                        media_scans::Column::ScanInfo,
                        media_scans::Column::ScanDate,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        MediaScans::find_by_id(url)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("media scan record vanished for {}", url))
    }

    /// Resets `url` back to UNKNOWN, but only while it is still IN_PROGRESS.
    /// A late failure from a superseded scan must not clobber a verdict
    /// written by a fresh one.
    pub async fn reset_if_in_progress(&self, url: &str, date: DateTime<Utc>) -> anyhow::Result<()> {
        let Some(model) = MediaScans::find_by_id(url).one(&self.db).await? else {
            return Ok(());
        };

        if model.scan_status != ScanStatus::InProgress {
            return Ok(());
        }

        let mut row: media_scans::ActiveModel = model.into();
        row.scan_status = Set(ScanStatus::Unknown);
        row.scan_info = Set(None);
        row.scan_date = Set(Some(date));
        row.update(&self.db).await?;

        Ok(())
    }

    /// Deletes every record, returning how many were removed.
    pub async fn clear_all(&self) -> anyhow::Result<u64> {
        let res = MediaScans::delete_many().exec(&self.db).await?;
        Ok(res.rows_affected)
    }

    /// Number of records currently cached.
    pub async fn count(&self) -> anyhow::Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(MediaScans::find().count(&self.db).await?)
    }

    /// Resets every IN_PROGRESS record back to UNKNOWN. Run at startup:
    /// a scan that was in flight when the process died will never complete,
    /// and IN_PROGRESS records are otherwise never re-checked.
    pub async fn reset_all_in_progress(&self) -> anyhow::Result<u64> {
        use sea_orm::sea_query::Expr;

        let res = MediaScans::update_many()
            .col_expr(
                media_scans::Column::ScanStatus,
                Expr::value(ScanStatus::Unknown),
            )
            .col_expr(media_scans::Column::ScanInfo, Expr::value(Option::<String>::None))
            .filter(media_scans::Column::ScanStatus.eq(ScanStatus::InProgress))
            .exec(&self.db)
            .await?;

        Ok(res.rows_affected)
    }
}
