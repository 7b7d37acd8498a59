use tokio::task;

use super::IdentityError;

// bcrypt намеренно медленный - считаем его вне потоков рантайма
pub async fn hash_password(password: &str, cost: u32) -> Result<String, IdentityError> {
    let password = password.to_owned();
    let digest = task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(digest)
}

/// Битый или чужой формат хеша считается несовпадением пароля
pub async fn verify_password(password: &str, digest: &str) -> Result<bool, IdentityError> {
    let password = password.to_owned();
    let digest = digest.to_owned();
    let verified = task::spawn_blocking(move || bcrypt::verify(password, &digest)).await?;
    match verified {
        Ok(ok) => Ok(ok),
        Err(e) => {
            tracing::warn!("stored password hash could not be verified: {}", e);
            Ok(false)
        }
    }
}
