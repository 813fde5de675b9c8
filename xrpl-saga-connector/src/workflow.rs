//! # Sequential Transaction Workflow
//!
//! Runs an ordered list of dependent transactions against one ledger
//! connection. Each [`Step`] is autofilled, signed with its own wallet,
//! submitted, and waited on until the ledger reports a final result. Only an
//! exact `tesSUCCESS` lets the next step start; anything else aborts the
//! workflow with a [`WorkflowError`] that names the failing step and carries
//! the results of the steps that did complete.
//!
//! Completed steps are permanent ledger changes. Nothing is rolled back,
//! retried or cancelled.
//!
//! Per step: `Pending → Autofilled → Signed → Submitted → {ConfirmedSuccess |
//! ConfirmedFailure}`. Per workflow: `Running → {Completed | Aborted}`.

use crate::{
    client::{LedgerClient, TransactionSigner},
    engine_result::EngineResult,
    error::{ConnectorError, TransactionError},
    transaction::{Transaction, TransactionKind},
    types::TxHash,
    wallet::Wallet,
};
use std::{fmt, sync::Arc};
use thiserror::Error;

/// One unit of work: a transaction and the wallet that signs it.
#[derive(Debug, Clone)]
pub struct Step<'w> {
    transaction: Transaction,
    wallet: &'w Wallet,
}

impl<'w> Step<'w> {
    /// Fails if `wallet` does not own the transaction's sending account.
    pub fn new(
        transaction: impl Into<Transaction>,
        wallet: &'w Wallet,
    ) -> Result<Self, TransactionError> {
        let transaction = transaction.into();
        if transaction.account() != wallet.address() {
            return Err(TransactionError::SignerMismatch {
                account: transaction.account().to_string(),
                signer: wallet.address().to_string(),
            });
        }
        Ok(Self { transaction, wallet })
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn wallet(&self) -> &Wallet {
        self.wallet
    }
}

/// Lifecycle of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    Pending,
    Autofilled,
    Signed,
    Submitted,
    ConfirmedSuccess,
    ConfirmedFailure,
}

impl StepState {
    pub fn can_advance_to(self, next: StepState) -> bool {
        use StepState::{Autofilled, ConfirmedFailure, ConfirmedSuccess, Pending, Signed, Submitted};
        matches!(
            (self, next),
            (Pending, Autofilled)
                | (Autofilled, Signed)
                | (Signed, Submitted)
                | (Submitted, ConfirmedSuccess)
                | (Submitted, ConfirmedFailure)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::ConfirmedSuccess | StepState::ConfirmedFailure)
    }
}

/// Lifecycle of a whole workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Running,
    Completed,
    Aborted { step: usize, reason: String },
}

/// Tracks one step through its states and logs each transition.
struct StepTracker {
    step: usize,
    kind: TransactionKind,
    state: StepState,
}

impl StepTracker {
    fn new(step: usize, kind: TransactionKind) -> Self {
        Self {
            step,
            kind,
            state: StepState::Pending,
        }
    }

    fn advance(&mut self, next: StepState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal step transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(
            step = self.step,
            kind = %self.kind,
            from = ?self.state,
            to = ?next,
            "Step transition"
        );
        self.state = next;
    }
}

/// The confirmed outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    /// 1-based position in the workflow.
    pub step: usize,
    pub kind: TransactionKind,
    pub hash: TxHash,
    pub code: EngineResult,
    pub ledger_index: Option<u32>,
}

/// Results of the steps that completed, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowResult {
    submissions: Vec<SubmissionResult>,
}

impl WorkflowResult {
    pub fn submissions(&self) -> &[SubmissionResult] {
        &self.submissions
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubmissionResult> {
        self.submissions.iter()
    }

    pub fn into_submissions(self) -> Vec<SubmissionResult> {
        self.submissions
    }
}

impl<'a> IntoIterator for &'a WorkflowResult {
    type Item = &'a SubmissionResult;
    type IntoIter = std::slice::Iter<'a, SubmissionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.submissions.iter()
    }
}

/// Why a workflow stopped early.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The connection, signer or node failed before a final result was known.
    #[error("Step {step} failed: {source}")]
    Infrastructure {
        step: usize,
        #[source]
        source: ConnectorError,
        completed: WorkflowResult,
    },

    /// The ledger returned a result other than `tesSUCCESS`.
    #[error("Step {step} ({kind}) was rejected by the ledger with {code} (tx {hash})")]
    Rejected {
        step: usize,
        kind: TransactionKind,
        code: EngineResult,
        hash: TxHash,
        completed: WorkflowResult,
    },
}

impl WorkflowError {
    /// 1-based index of the step that failed.
    pub fn step(&self) -> usize {
        match self {
            WorkflowError::Infrastructure { step, .. }
            | WorkflowError::Rejected { step, .. } => *step,
        }
    }

    /// Steps confirmed before the failure.
    pub fn completed(&self) -> &WorkflowResult {
        match self {
            WorkflowError::Infrastructure { completed, .. }
            | WorkflowError::Rejected { completed, .. } => completed,
        }
    }

    /// The ledger result code, for rejections.
    pub fn code(&self) -> Option<&EngineResult> {
        match self {
            WorkflowError::Rejected { code, .. } => Some(code),
            WorkflowError::Infrastructure { .. } => None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        WorkflowState::Aborted {
            step: self.step(),
            reason: self.to_string(),
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Running => f.write_str("running"),
            WorkflowState::Completed => f.write_str("completed"),
            WorkflowState::Aborted { step, reason } => {
                write!(f, "aborted at step {step}: {reason}")
            }
        }
    }
}

/// Runs `steps` in order, stopping at the first step that does not succeed.
pub async fn run_workflow<C, S>(
    client: &C,
    signer: &S,
    steps: &[Step<'_>],
) -> Result<WorkflowResult, WorkflowError>
where
    C: LedgerClient + ?Sized,
    S: TransactionSigner + ?Sized,
{
    let mut completed = WorkflowResult::default();
    tracing::info!(steps = steps.len(), state = %WorkflowState::Running, "Starting workflow");

    for (offset, step) in steps.iter().enumerate() {
        let number = offset + 1;
        let mut tracker = StepTracker::new(number, step.transaction.kind());

        let outcome = match execute_step(client, signer, step, &mut tracker).await {
            Ok(outcome) => outcome,
            Err(source) => {
                let error = WorkflowError::Infrastructure {
                    step: number,
                    source,
                    completed,
                };
                tracing::warn!(state = %error.state(), "Workflow aborted");
                return Err(error);
            }
        };

        if outcome.result.is_success() {
            tracker.advance(StepState::ConfirmedSuccess);
            tracing::info!(
                step = number,
                kind = %tracker.kind,
                hash = %outcome.hash,
                ledger_index = ?outcome.ledger_index,
                "Step confirmed"
            );
            completed.submissions.push(SubmissionResult {
                step: number,
                kind: tracker.kind,
                hash: outcome.hash,
                code: outcome.result,
                ledger_index: outcome.ledger_index,
            });
        } else {
            tracker.advance(StepState::ConfirmedFailure);
            let error = WorkflowError::Rejected {
                step: number,
                kind: tracker.kind,
                code: outcome.result,
                hash: outcome.hash,
                completed,
            };
            tracing::warn!(state = %error.state(), "Workflow aborted");
            return Err(error);
        }
    }

    tracing::info!(steps = completed.len(), state = %WorkflowState::Completed, "Workflow finished");
    Ok(completed)
}

async fn execute_step<C, S>(
    client: &C,
    signer: &S,
    step: &Step<'_>,
    tracker: &mut StepTracker,
) -> Result<crate::client::SubmitOutcome, ConnectorError>
where
    C: LedgerClient + ?Sized,
    S: TransactionSigner + ?Sized,
{
    let prepared = client.autofill(&step.transaction).await?;
    tracker.advance(StepState::Autofilled);

    let signed = signer.sign(&prepared, step.wallet).await?;
    tracker.advance(StepState::Signed);

    tracker.advance(StepState::Submitted);
    let outcome = client.submit_and_wait(&signed).await?;
    if outcome.hash != signed.hash {
        tracing::warn!(
            signed = %signed.hash,
            reported = %outcome.hash,
            "Node reported a different hash"
        );
    }
    Ok(outcome)
}

/// Owns the collaborators and runs workflows against them.
///
/// A coordinator should drive at most one workflow on a connection at a time;
/// unrelated requests (such as a ledger subscription) may share the client.
#[derive(Debug)]
pub struct WorkflowCoordinator<C: ?Sized, S: ?Sized> {
    client: Arc<C>,
    signer: Arc<S>,
}

impl<C: ?Sized, S: ?Sized> Clone for WorkflowCoordinator<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            signer: self.signer.clone(),
        }
    }
}

impl<C, S> WorkflowCoordinator<C, S>
where
    C: LedgerClient + ?Sized,
    S: TransactionSigner + ?Sized,
{
    pub fn new(client: Arc<C>, signer: Arc<S>) -> Self {
        Self { client, signer }
    }

    pub async fn run(&self, steps: &[Step<'_>]) -> Result<WorkflowResult, WorkflowError> {
        run_workflow(self.client.as_ref(), self.signer.as_ref(), steps).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{transaction::Payment, types::{Address, Amount, Drops}};

    #[test]
    fn step_states_only_move_forward() {
        use StepState::*;
        let path = [Pending, Autofilled, Signed, Submitted, ConfirmedSuccess];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]));
        }
        assert!(Submitted.can_advance_to(ConfirmedFailure));
        assert!(!Pending.can_advance_to(Signed));
        assert!(!Signed.can_advance_to(Autofilled));
        assert!(!ConfirmedFailure.can_advance_to(Submitted));
        assert!(!ConfirmedSuccess.can_advance_to(Pending));
        assert!(ConfirmedFailure.is_terminal());
        assert!(!Submitted.is_terminal());
    }

    #[test]
    fn step_rejects_foreign_wallet() {
        let cold = Address::parse("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY").unwrap();
        let hot = Address::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap();
        let amount = Amount::Xrp(Drops::new(1).unwrap());
        let payment = Payment::builder(cold.clone(), hot.clone(), amount)
            .build()
            .unwrap();

        let hot_wallet = Wallet::new(hot, "shot");
        let cold_wallet = Wallet::new(cold, "scold");

        assert!(matches!(
            Step::new(payment.clone(), &hot_wallet),
            Err(TransactionError::SignerMismatch { .. })
        ));
        assert!(Step::new(payment, &cold_wallet).is_ok());
    }

    #[test]
    fn aborted_state_names_the_step() {
        let error = WorkflowError::Rejected {
            step: 3,
            kind: TransactionKind::TrustSet,
            code: EngineResult::new("tecNO_DST_INSUFF_XRP"),
            hash: TxHash::new("ab"),
            completed: WorkflowResult::default(),
        };
        match error.state() {
            WorkflowState::Aborted { step, reason } => {
                assert_eq!(step, 3);
                assert!(reason.contains("tecNO_DST_INSUFF_XRP"));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }
}
