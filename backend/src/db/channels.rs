use crate::error::StoreError;
use crate::models::{Channel, DEFAULT_CATEGORY};
use log::info;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ChannelStore {
    pool: SqlitePool,
}

impl ChannelStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, StoreError> {
        let channels = sqlx::query_as::<_, Channel>(
            "SELECT channel_id, channel_name, COALESCE(category, ?) AS category
             FROM channels ORDER BY channel_name",
        )
        .bind(DEFAULT_CATEGORY)
        .fetch_all(&self.pool)
        .await?;
        Ok(channels)
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>, StoreError> {
        let channel = sqlx::query_as::<_, Channel>(
            "SELECT channel_id, channel_name, COALESCE(category, ?) AS category
             FROM channels WHERE channel_id = ?",
        )
        .bind(DEFAULT_CATEGORY)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(channel)
    }

    pub async fn channel_name(&self, channel_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .get_channel(channel_id)
            .await?
            .map(|channel| channel.channel_name))
    }

    /// Fails with `DuplicateChannel` and leaves the table untouched if the id exists.
    pub async fn add_channel(
        &self,
        channel_name: &str,
        channel_id: &str,
        category: &str,
    ) -> Result<Channel, StoreError> {
        sqlx::query("INSERT INTO channels (channel_name, channel_id, category) VALUES (?, ?, ?)")
            .bind(channel_name)
            .bind(channel_id)
            .bind(category)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_insert(e, channel_id))?;

        info!("Added channel '{channel_name}' ({channel_id})");
        Ok(Channel {
            channel_id: channel_id.to_string(),
            channel_name: channel_name.to_string(),
            category: category.to_string(),
        })
    }

    /// Returns `false` when no channel had that id.
    pub async fn delete_channel(&self, channel_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM channels WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted channel {channel_id}");
        }
        Ok(deleted)
    }

    pub async fn count_channels(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channels")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
