//! Query handlers for the Case aggregate.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use progression_core::command::HandlerEnv;
use progression_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::load_case;
use crate::domain::aggregates::Defendant;
use crate::domain::events::FeeReference;

/// Read-only view of a case aggregate.
#[derive(Debug, Serialize)]
pub struct CaseView {
    /// The case identifier.
    pub case_id: Uuid,
    /// The prosecution case reference.
    pub urn: String,
    /// Defendants on the case.
    pub defendants: Vec<Defendant>,
    /// The group the case belongs to, if any.
    pub group_id: Option<Uuid>,
    /// Whether the case is a group member.
    pub is_group_member: bool,
    /// Whether the case is its group's master.
    pub is_group_master: bool,
    /// Civil fees the case references.
    pub fees: Vec<FeeReference>,
    /// Whether the case has been ejected.
    pub ejected: bool,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a case by its identifier.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::CorruptEvent` if a stored event does not decode.
pub async fn get_case_by_id(case_id: Uuid, env: &HandlerEnv<'_>) -> Result<CaseView, DomainError> {
    let case = load_case(env, case_id).await?;
    Ok(CaseView {
        case_id,
        urn: case.urn().unwrap_or_default().to_owned(),
        defendants: case.defendants().to_vec(),
        group_id: case.group_id(),
        is_group_member: case.is_group_member(),
        is_group_master: case.is_group_master(),
        fees: case.fees().to_vec(),
        ejected: case.is_ejected(),
        version: case.version,
    })
}
