use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] reconcile_domain::DomainError),

    #[error(transparent)]
    Store(#[from] reconcile_store::StoreError),

    #[error(transparent)]
    Reconciliation(#[from] reconcile_engine::EngineError),
}
