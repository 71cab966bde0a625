//! Level catalog over the `levels` table

use async_trait::async_trait;
use levelup_common::models::{Level, LevelSounds};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::LevelCatalog;
use crate::{Error, Result};

/// Reads level definitions from SQLite
#[derive(Clone)]
pub struct SqliteLevelCatalog {
    pool: SqlitePool,
}

impl SqliteLevelCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LevelCatalog for SqliteLevelCatalog {
    async fn all_levels(&self) -> Result<Vec<Level>> {
        let rows = sqlx::query(
            "SELECT id, order_num, name, xp_threshold, sounds_json FROM levels ORDER BY order_num ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(level_from_row).collect()
    }

    async fn level_by_order(&self, order: u32) -> Result<Option<Level>> {
        let row = sqlx::query(
            "SELECT id, order_num, name, xp_threshold, sounds_json FROM levels WHERE order_num = ?",
        )
        .bind(order as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(level_from_row).transpose()
    }
}

fn level_from_row(row: &SqliteRow) -> Result<Level> {
    let id: String = row.get("id");
    let order: i64 = row.get("order_num");
    let xp_threshold: i64 = row.get("xp_threshold");
    let sounds_json: String = row.get("sounds_json");

    let sounds = if sounds_json.trim().is_empty() {
        LevelSounds::default()
    } else {
        serde_json::from_str(&sounds_json).unwrap_or_else(|e| {
            warn!("Level {} has unreadable sounds_json ({}), using defaults", id, e);
            LevelSounds::default()
        })
    };

    Ok(Level {
        order: u32::try_from(order)
            .map_err(|_| Error::Catalog(format!("Level {} has invalid order {}", id, order)))?,
        xp_threshold: u64::try_from(xp_threshold).map_err(|_| {
            Error::Catalog(format!("Level {} has negative threshold {}", id, xp_threshold))
        })?,
        name: row.get("name"),
        sounds,
        id,
    })
}

/// Insert or replace a level definition
pub async fn upsert_level(pool: &SqlitePool, level: &Level) -> Result<()> {
    let sounds_json = serde_json::to_string(&level.sounds)
        .map_err(|e| Error::Internal(format!("Failed to serialize sounds: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO levels (id, order_num, name, xp_threshold, sounds_json)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            order_num = excluded.order_num,
            name = excluded.name,
            xp_threshold = excluded.xp_threshold,
            sounds_json = excluded.sounds_json,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&level.id)
    .bind(level.order as i64)
    .bind(&level.name)
    .bind(level.xp_threshold as i64)
    .bind(&sounds_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the starter progression when the table is empty
///
/// Returns the number of levels inserted (0 when levels already exist).
pub async fn seed_default_levels(pool: &SqlitePool) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM levels")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    let starters = [(1, "Level 1: The Beginning", 0), (2, "Level 2: The Climax", 250)];
    for (order, name, xp_threshold) in starters {
        upsert_level(
            pool,
            &Level {
                id: Uuid::new_v4().to_string(),
                order,
                name: name.to_string(),
                xp_threshold,
                sounds: LevelSounds::default(),
            },
        )
        .await?;
    }

    info!("Seeded {} starter levels", starters.len());
    Ok(starters.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelup_common::db::init_memory_database;
    use levelup_common::events::SoundCueKind;

    fn level(id: &str, order: u32, xp_threshold: u64) -> Level {
        Level {
            id: id.to_string(),
            order,
            name: format!("Level {}", order),
            xp_threshold,
            sounds: LevelSounds::default(),
        }
    }

    #[tokio::test]
    async fn test_all_levels_sorted_by_order() {
        let pool = init_memory_database().await.unwrap();
        upsert_level(&pool, &level("c", 3, 300)).await.unwrap();
        upsert_level(&pool, &level("a", 1, 0)).await.unwrap();
        upsert_level(&pool, &level("b", 2, 100)).await.unwrap();

        let catalog = SqliteLevelCatalog::new(pool);
        let levels = catalog.all_levels().await.unwrap();

        let orders: Vec<u32> = levels.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(levels[1].xp_threshold, 100);
    }

    #[tokio::test]
    async fn test_level_by_order_roundtrips_sounds() {
        let pool = init_memory_database().await.unwrap();
        let mut custom = level("a", 1, 0);
        custom.sounds.level_up = "assets/sounds/custom/up.mp3".to_string();
        upsert_level(&pool, &custom).await.unwrap();

        let catalog = SqliteLevelCatalog::new(pool);
        let found = catalog.level_by_order(1).await.unwrap().unwrap();
        assert_eq!(
            found.sounds.path_for(SoundCueKind::LevelUp),
            Some("assets/sounds/custom/up.mp3")
        );
        assert!(catalog.level_by_order(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_camel_case_sounds_json_is_read() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query(
            "INSERT INTO levels (id, order_num, name, xp_threshold, sounds_json) VALUES ('x', 1, 'One', 0, ?)",
        )
        .bind(r#"{"levelUp": "up.mp3", "transition": ""}"#)
        .execute(&pool)
        .await
        .unwrap();

        let catalog = SqliteLevelCatalog::new(pool);
        let found = catalog.level_by_order(1).await.unwrap().unwrap();
        assert_eq!(found.sounds.path_for(SoundCueKind::LevelUp), Some("up.mp3"));
        assert_eq!(found.sounds.path_for(SoundCueKind::Transition), None);
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let pool = init_memory_database().await.unwrap();

        assert_eq!(seed_default_levels(&pool).await.unwrap(), 2);
        assert_eq!(seed_default_levels(&pool).await.unwrap(), 0);

        let levels = SqliteLevelCatalog::new(pool).all_levels().await.unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].xp_threshold, 0);
        assert_eq!(levels[1].xp_threshold, 250);
    }
}
