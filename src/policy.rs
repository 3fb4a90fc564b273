//! Which side-effect failures abort an operation and which are only logged.

use std::fmt::Display;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    UploadCompensation,
    DeleteDocumentStorage,
    RecordInvite,
    SendInviteNotification,
    AcceptInvite,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::UploadCompensation => "upload_compensation",
            Step::DeleteDocumentStorage => "delete_document_storage",
            Step::RecordInvite => "record_invite",
            Step::SendInviteNotification => "send_invite_notification",
            Step::AcceptInvite => "accept_invite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Propagate,
    LogAndContinue,
}

/// Secondary side effects. Primary steps (storage write, metadata insert and
/// delete, provider invite) are not listed: they always fail the operation.
pub const POLICY: &[(Step, OnFailure)] = &[
    (Step::UploadCompensation, OnFailure::LogAndContinue),
    (Step::DeleteDocumentStorage, OnFailure::LogAndContinue),
    (Step::RecordInvite, OnFailure::LogAndContinue),
    (Step::SendInviteNotification, OnFailure::LogAndContinue),
    (Step::AcceptInvite, OnFailure::LogAndContinue),
];

pub fn on_failure(step: Step) -> OnFailure {
    POLICY
        .iter()
        .find(|(candidate, _)| *candidate == step)
        .map(|(_, rule)| *rule)
        .unwrap_or(OnFailure::Propagate)
}

/// Applies the policy to a step's result.
///
/// `Ok(Some(_))` on success, `Ok(None)` when a tolerated failure was logged and
/// swallowed, `Err` when the step must fail the operation.
pub fn tolerate<T, E: Display>(step: Step, result: Result<T, E>) -> Result<Option<T>, E> {
    apply(step, on_failure(step), result)
}

fn apply<T, E: Display>(
    step: Step,
    rule: OnFailure,
    result: Result<T, E>,
) -> Result<Option<T>, E> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match rule {
            OnFailure::LogAndContinue => {
                warn!(step = step.as_str(), error = %err, "best-effort step failed");
                Ok(None)
            }
            OnFailure::Propagate => Err(err),
        },
    }
}
