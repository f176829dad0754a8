use crate::assistant::events::{AssistantEvent, EventRelay};
use crate::models::types::{AppError, ApprovalRequest, ToolCallRequest, ToolDefinition};
use crate::utils::common::{print_colorful, LineSource};

use async_trait::async_trait;
use crossterm::style::Color;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Source of the user's approve/reject decisions.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn decide(&self, request: &ApprovalRequest) -> Result<bool, AppError>;
}

#[derive(Debug)]
pub enum GateOutcome {
    /// Not sensitive, no approval request was created
    Bypassed,
    Approved(ApprovalRequest),
    Rejected(ApprovalRequest),
}

pub struct ApprovalGate {
    approver: Box<dyn Approver>,
    timeout: Duration,
}

impl ApprovalGate {
    pub fn new(approver: Box<dyn Approver>, timeout: Duration) -> Self {
        Self { approver, timeout }
    }

    /// Blocks a sensitive call until the user decides. A decision that does
    /// not arrive within the timeout, or an approver failure, counts as a
    /// rejection.
    pub async fn review(
        &self,
        definition: &ToolDefinition,
        call: &ToolCallRequest,
        relay: &EventRelay,
    ) -> GateOutcome {
        if !definition.sensitive {
            return GateOutcome::Bypassed;
        }

        let mut request = ApprovalRequest::new(call.clone(), definition.description.clone());
        log::info!(
            "Requesting user approval {} for tool call {} ({})",
            request.id,
            call.call_id,
            call.name
        );
        relay.emit(AssistantEvent::ApprovalRequired {
            request: request.clone(),
        });

        let approved = match tokio::time::timeout(self.timeout, self.approver.decide(&request)).await {
            Ok(Ok(approved)) => approved,
            Ok(Err(e)) => {
                log::warn!("Approval {} failed, treating as rejected: {}", request.id, e);
                false
            }
            Err(_) => {
                log::warn!(
                    "Approval {} expired after {:?}, treating as rejected",
                    request.id,
                    self.timeout
                );
                relay.emit(AssistantEvent::Error {
                    message: format!("Approval for `{}` timed out", call.name),
                });
                false
            }
        };

        if let Err(e) = request.resolve(approved) {
            log::error!("{}", e);
        }
        relay.emit(AssistantEvent::ApprovalResolved {
            request_id: request.id,
            approved,
        });

        if approved {
            GateOutcome::Approved(request)
        } else {
            GateOutcome::Rejected(request)
        }
    }
}

/// Asks on the terminal, like `apply_for_loan(...) ? (y/n)`.
pub struct ConsoleApprover {
    lines: LineSource,
}

impl ConsoleApprover {
    pub fn new(lines: LineSource) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl Approver for ConsoleApprover {
    async fn decide(&self, request: &ApprovalRequest) -> Result<bool, AppError> {
        // let the renderer draw the approval banner first
        tokio::task::yield_now().await;

        print_colorful(
            &format!("Approve `{}`? (y/n) > ", request.call.name),
            Color::Blue,
        )?;
        let answer = self
            .lines
            .next_line()
            .await
            .ok_or_else(|| AppError::ApprovalError("input closed".to_string()))?;

        Ok(answer.trim().eq_ignore_ascii_case("y") || answer.trim().eq_ignore_ascii_case("yes"))
    }
}

/// Decision sent through an [`ApprovalHandle`].
#[derive(Debug, Clone, Copy)]
pub struct ApprovalDecision {
    pub request_id: uuid::Uuid,
    pub approved: bool,
}

/// Approver driven from another task, e.g. an embedding UI.
pub struct ChannelApprover {
    rx: Mutex<mpsc::UnboundedReceiver<ApprovalDecision>>,
}

#[derive(Clone)]
pub struct ApprovalHandle {
    tx: mpsc::UnboundedSender<ApprovalDecision>,
}

impl ChannelApprover {
    pub fn channel() -> (ChannelApprover, ApprovalHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelApprover { rx: Mutex::new(rx) }, ApprovalHandle { tx })
    }
}

impl ApprovalHandle {
    pub fn approve(&self, request_id: uuid::Uuid) -> Result<(), AppError> {
        self.send(request_id, true)
    }

    pub fn reject(&self, request_id: uuid::Uuid) -> Result<(), AppError> {
        self.send(request_id, false)
    }

    fn send(&self, request_id: uuid::Uuid, approved: bool) -> Result<(), AppError> {
        self.tx
            .send(ApprovalDecision { request_id, approved })
            .map_err(|_| AppError::ApprovalError("approver is gone".to_string()))
    }
}

#[async_trait]
impl Approver for ChannelApprover {
    async fn decide(&self, request: &ApprovalRequest) -> Result<bool, AppError> {
        let mut rx = self.rx.lock().await;
        while let Some(decision) = rx.recv().await {
            if decision.request_id == request.id {
                return Ok(decision.approved);
            }
            log::warn!(
                "Ignoring decision for {} while waiting on {}",
                decision.request_id,
                request.id
            );
        }
        Err(AppError::ApprovalError("approval channel closed".to_string()))
    }
}
