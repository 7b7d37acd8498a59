//! posters.rs
//!
//! Файловое хранилище постеров фильмов в каталоге загрузок.
//!
//! - Проверка расширения по белому списку (png, jpg, jpeg, gif).
//! - Очистка имени файла от путей и небезопасных символов.
//! - Сохранение, удаление (отсутствующий файл - не ошибка) и листинг.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Предел длины имени файла; колонка movies.poster - VARCHAR(255)
pub const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct PosterStorage {
    dir: PathBuf,
}

impl PosterStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Расширение сравнивается без учета регистра
    pub fn is_allowed(filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Безопасное имя файла: без разделителей путей, пробелы -> '_',
    /// только [A-Za-z0-9._-], без ведущих/замыкающих '.' и '_'.
    pub fn sanitize_filename(filename: &str) -> Option<String> {
        let flattened = filename.replace(['/', '\\'], " ");
        let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
        let cleaned: String = joined
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .collect();
        let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
        if trimmed.is_empty() {
            None
        } else {
            Some(truncate_keeping_extension(trimmed))
        }
    }

    /// Имя для хранения: случайный префикс, чтобы одинаковые загрузки
    /// разных фильмов не затирали файлы друг друга
    pub fn stored_name(filename: &str) -> Option<String> {
        let sanitized = Self::sanitize_filename(filename)?;
        Some(truncate_keeping_extension(&format!("{}-{}", Uuid::new_v4().simple(), sanitized)))
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        // в хранилище попадают только уже очищенные имена
        if Self::sanitize_filename(name).as_deref() == Some(name) {
            Some(self.dir.join(name))
        } else {
            None
        }
    }

    pub async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self
            .path_for(name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "unsafe poster file name"))?;
        self.ensure_dir().await?;
        fs::write(path, bytes).await
    }

    /// true - файл был удален, false - его и не было
    pub async fn delete(&self, name: &str) -> io::Result<bool> {
        let Some(path) = self.path_for(name) else {
            warn!("refusing to delete unsafe poster path {:?}", name);
            return Ok(false);
        };
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Some(path) => fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Время с последней записи файла; None - файла нет или время недоступно
    pub async fn age(&self, name: &str) -> Option<std::time::Duration> {
        let path = self.path_for(name)?;
        let modified = fs::metadata(path).await.ok()?.modified().ok()?;
        Some(modified.elapsed().unwrap_or_default())
    }

    /// Имена обычных файлов в каталоге; отсутствующий каталог = пустой список
    pub async fn list(&self) -> io::Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

// Имя уже очищено и состоит из ASCII, поэтому срез по байтам безопасен
fn truncate_keeping_extension(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() + 1 < MAX_NAME_LEN => {
            let keep = MAX_NAME_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => name[..MAX_NAME_LEN].to_string(),
    }
}
