//! State shared between the steps of one flow run.
//!
//! Steps populate fields as they go; a field once written is never cleared
//! for the rest of the run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::step::StepError;

/// Named fields a step may read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    /// URL hosting the interactive webapp step
    InteractiveUrl,
    /// XDR of the challenge transaction signed by the server only
    ChallengeTransaction,
    /// XDR of the challenge transaction signed by both server and client
    SignedChallengeTx,
    /// JWT from SEP-10 proving control of the wallet address
    Token,
    /// Address the anchor expects payment on for the in-flight transaction
    AnchorsStellarAddress,
    /// Memo type identifying the anchor's transaction
    StellarMemoType,
    /// Memo required on the payment to the anchor
    StellarMemo,
    /// Reference needed to retrieve or confirm the withdrawal
    ExternalTransactionId,
    /// Memo we asked the anchor to send deposited funds with
    DepositMemo,
    /// Memo type we asked the anchor to send deposited funds with
    DepositType,
}

impl StateField {
    pub fn all() -> &'static [StateField] {
        &[
            StateField::InteractiveUrl,
            StateField::ChallengeTransaction,
            StateField::SignedChallengeTx,
            StateField::Token,
            StateField::AnchorsStellarAddress,
            StateField::StellarMemoType,
            StateField::StellarMemo,
            StateField::ExternalTransactionId,
            StateField::DepositMemo,
            StateField::DepositType,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::InteractiveUrl => "interactive_url",
            StateField::ChallengeTransaction => "challenge_transaction",
            StateField::SignedChallengeTx => "signed_challenge_tx",
            StateField::Token => "token",
            StateField::AnchorsStellarAddress => "anchors_stellar_address",
            StateField::StellarMemoType => "stellar_memo_type",
            StateField::StellarMemo => "stellar_memo",
            StateField::ExternalTransactionId => "external_transaction_id",
            StateField::DepositMemo => "deposit_memo",
            StateField::DepositType => "deposit_type",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_challenge_tx: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors_stellar_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stellar_memo_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stellar_memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_type: Option<String>,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: StateField) -> &Option<String> {
        match field {
            StateField::InteractiveUrl => &self.interactive_url,
            StateField::ChallengeTransaction => &self.challenge_transaction,
            StateField::SignedChallengeTx => &self.signed_challenge_tx,
            StateField::Token => &self.token,
            StateField::AnchorsStellarAddress => &self.anchors_stellar_address,
            StateField::StellarMemoType => &self.stellar_memo_type,
            StateField::StellarMemo => &self.stellar_memo,
            StateField::ExternalTransactionId => &self.external_transaction_id,
            StateField::DepositMemo => &self.deposit_memo,
            StateField::DepositType => &self.deposit_type,
        }
    }

    fn slot_mut(&mut self, field: StateField) -> &mut Option<String> {
        match field {
            StateField::InteractiveUrl => &mut self.interactive_url,
            StateField::ChallengeTransaction => &mut self.challenge_transaction,
            StateField::SignedChallengeTx => &mut self.signed_challenge_tx,
            StateField::Token => &mut self.token,
            StateField::AnchorsStellarAddress => &mut self.anchors_stellar_address,
            StateField::StellarMemoType => &mut self.stellar_memo_type,
            StateField::StellarMemo => &mut self.stellar_memo,
            StateField::ExternalTransactionId => &mut self.external_transaction_id,
            StateField::DepositMemo => &mut self.deposit_memo,
            StateField::DepositType => &mut self.deposit_type,
        }
    }

    pub fn get(&self, field: StateField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Read a field a previous step must have written.
    pub fn require(&self, field: StateField) -> Result<&str, StepError> {
        self.get(field).ok_or(StepError::MissingState(field))
    }

    /// Write a field. Blank values are rejected so a field can never be
    /// cleared once populated. Rewriting with a new value is allowed, which
    /// is what a retried step does.
    pub fn record(&mut self, field: StateField, value: impl Into<String>) -> Result<(), StepError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(StepError::InvalidState {
                field,
                reason: "value is empty".to_string(),
            });
        }
        tracing::trace!(field = %field, "state field recorded");
        *self.slot_mut(field) = Some(value);
        Ok(())
    }

    /// Fields populated so far, in declaration order.
    pub fn populated(&self) -> Vec<StateField> {
        StateField::all()
            .iter()
            .copied()
            .filter(|f| self.slot(*f).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_then_get() {
        let mut state = FlowState::new();
        state.record(StateField::Token, "jwt").unwrap();
        assert_eq!(state.get(StateField::Token), Some("jwt"));
        assert_eq!(state.token.as_deref(), Some("jwt"));
    }

    #[test]
    fn test_record_rejects_blank_values() {
        let mut state = FlowState::new();
        state.record(StateField::StellarMemo, "abc").unwrap();

        let err = state.record(StateField::StellarMemo, "   ").unwrap_err();
        assert!(matches!(
            err,
            StepError::InvalidState {
                field: StateField::StellarMemo,
                ..
            }
        ));
        // Previous value survives the rejected write
        assert_eq!(state.get(StateField::StellarMemo), Some("abc"));
    }

    #[test]
    fn test_require_missing_field() {
        let state = FlowState::new();
        let err = state.require(StateField::ChallengeTransaction).unwrap_err();
        assert!(matches!(
            err,
            StepError::MissingState(StateField::ChallengeTransaction)
        ));
        assert!(err.to_string().contains("challenge_transaction"));
    }

    #[test]
    fn test_populated_in_declaration_order() {
        let mut state = FlowState::new();
        state.record(StateField::DepositType, "text").unwrap();
        state.record(StateField::Token, "jwt").unwrap();
        assert_eq!(
            state.populated(),
            vec![StateField::Token, StateField::DepositType]
        );
    }

    #[test]
    fn test_serializes_only_populated_fields() {
        let mut state = FlowState::new();
        state.record(StateField::InteractiveUrl, "https://anchor/webapp").unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "interactive_url": "https://anchor/webapp" })
        );
    }
}
