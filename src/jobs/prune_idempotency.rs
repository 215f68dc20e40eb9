use crate::domain::repository::IdempotencyRepository;
use std::sync::Arc;
use tracing::{error, info};

/// Job en segundo plano que poda las respuestas idempotentes expiradas.
///
/// Las filas de `idempotency_keys` dejan de ser relevantes una vez pasada su
/// `expires_at` (el TTL configurado); este job evita que la tabla crezca sin
/// límite. Borrar una fila expirada es seguro: la clave única sobre
/// `transactions.idempotency_key` sigue impidiendo una segunda ejecución.
pub struct PruneIdempotencyJob {
    idempotency_repo: Arc<dyn IdempotencyRepository>,
}

impl PruneIdempotencyJob {
    pub fn new(idempotency_repo: Arc<dyn IdempotencyRepository>) -> Self {
        Self { idempotency_repo }
    }

    /// Ejecuta una pasada de poda.
    pub async fn run(&self) {
        match self.idempotency_repo.delete_expired().await {
            Ok(0) => {}
            Ok(pruned) => {
                info!("Pruned {} expired idempotency records", pruned);
            }
            Err(e) => {
                error!("Failed to prune expired idempotency records: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::LedgerError;
    use crate::domain::repository::MockIdempotencyRepository;

    #[tokio::test]
    async fn test_prune_invokes_delete_expired() {
        let mut mock_repo = MockIdempotencyRepository::new();
        mock_repo
            .expect_delete_expired()
            .times(1)
            .returning(|| Ok(3));

        let job = PruneIdempotencyJob::new(Arc::new(mock_repo));
        job.run().await;
    }

    #[tokio::test]
    async fn test_prune_swallows_repository_errors() {
        let mut mock_repo = MockIdempotencyRepository::new();
        mock_repo
            .expect_delete_expired()
            .times(1)
            .returning(|| Err(LedgerError::Repository("db down".to_string())));

        let job = PruneIdempotencyJob::new(Arc::new(mock_repo));
        // No debe panicar: el job loguea y espera la próxima pasada.
        job.run().await;
    }
}
