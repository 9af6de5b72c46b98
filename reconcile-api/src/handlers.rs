use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use reconcile_store::{IngestionJobStore, ReconciliationStore, TransactionStore, WorkflowStore};
use reconcile_workflow::WorkflowCoordinator;
use uuid::Uuid;

use crate::dto::{PingResponse, StartWorkflowRequest, StartWorkflowResponse, WorkflowResponse};
use crate::error::ApiError;

pub struct ApiState<S> {
    pub coordinator: Arc<WorkflowCoordinator<S>>,
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { success: true })
}

#[tracing::instrument(skip(state, request), fields(workflow_id = tracing::field::Empty))]
pub async fn start_workflow<S>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<StartWorkflowRequest>,
) -> Result<Json<StartWorkflowResponse>, ApiError>
where
    S: WorkflowStore + IngestionJobStore + TransactionStore + ReconciliationStore + 'static,
{
    let start = request.start_date.date_naive();
    let end = request.end_date.date_naive();

    let workflow_id = state
        .coordinator
        .start_workflow(
            request.system_transaction_file_path,
            request.bank_statement_file_paths,
            start,
            end,
        )
        .await?;

    tracing::Span::current().record("workflow_id", tracing::field::display(workflow_id));
    Ok(Json(StartWorkflowResponse { workflow_id }))
}

#[tracing::instrument(skip(state), fields(workflow_id = %workflow_id))]
pub async fn get_workflow<S>(
    State(state): State<Arc<ApiState<S>>>,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, ApiError>
where
    S: WorkflowStore + IngestionJobStore + TransactionStore + ReconciliationStore + 'static,
{
    let (workflow, summary) = state.coordinator.get_workflow_summary(workflow_id).await?;
    Ok(Json(WorkflowResponse::new(workflow, summary)))
}
