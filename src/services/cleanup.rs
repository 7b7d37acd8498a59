use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::services::posters::PosterStorage;
use crate::store::CatalogStore;
use crate::AppState;

/// Сверка каталога постеров с таблицей movies.
///
/// Файл пишется раньше строки фильма, а удаляется позже нее, поэтому
/// между ними возможны файлы без владельца; этот проход их убирает.
pub struct CleanupService<'a> {
    catalog: &'a dyn CatalogStore,
    posters: &'a PosterStorage,
    min_age: Duration,
}

/// Свежие файлы не трогаем: строка фильма для них может еще не записаться
pub const DEFAULT_MIN_AGE: Duration = Duration::from_secs(600);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub removed: usize,
}

impl<'a> CleanupService<'a> {
    pub fn new(catalog: &'a dyn CatalogStore, posters: &'a PosterStorage) -> Self {
        Self { catalog, posters, min_age: DEFAULT_MIN_AGE }
    }

    pub fn with_min_age(mut self, min_age: Duration) -> Self {
        self.min_age = min_age;
        self
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.catalog.as_ref(), &state.posters)
    }

    /// Удаляет файлы, на которые не ссылается ни один фильм
    pub async fn sweep_orphaned_posters(&self) -> SweepReport {
        // Сначала файлы, потом ссылки: файл, появившийся между чтениями,
        // просто не попадет в проверку.
        let files = match self.posters.list().await {
            Ok(files) => files,
            Err(e) => {
                error!("🖼️ Failed to list poster directory: {:?}", e);
                return SweepReport::default();
            }
        };

        if files.is_empty() {
            info!("🖼️ No poster files to check");
            return SweepReport::default();
        }

        let referenced: HashSet<String> = match self.catalog.list_poster_filenames().await {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                // без списка ссылок ничего не удаляем
                error!("🖼️ Failed to load poster references: {:?}", e);
                return SweepReport { checked: files.len(), removed: 0 };
            }
        };

        let mut removed = 0;
        for name in files.iter().filter(|name| !referenced.contains(*name)) {
            match self.posters.age(name).await {
                Some(age) if age >= self.min_age => {}
                _ => continue,
            }
            match self.posters.delete(name).await {
                Ok(true) => {
                    removed += 1;
                    info!("🖼️ Removed orphaned poster {}", name);
                }
                Ok(false) => {}
                Err(e) => warn!("🖼️ Failed to remove orphaned poster {}: {:?}", name, e),
            }
        }

        info!("🖼️ Poster sweep checked {} files, removed {}", files.len(), removed);
        SweepReport { checked: files.len(), removed }
    }
}

/// Периодическая очистка в фоне; интервал 0 отключает ее
pub fn spawn_poster_sweeper(state: Arc<AppState>) {
    let interval = state.config.uploads.sweep_interval_seconds;
    if interval == 0 {
        info!("Poster sweep disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval));
        loop {
            ticker.tick().await;
            CleanupService::from_state(&state).sweep_orphaned_posters().await;
        }
    });
}
