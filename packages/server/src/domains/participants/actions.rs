//! Participant registry operations.
//!
//! Actions take already-validated input and return final models or an
//! `ApiError` carrying the HTTP outcome.

use futures::future::{self, Either};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::data::{CreateParticipantRequest, NewParticipant, ParticipantChanges, ParticipantDetail};
use super::models::Participant;
use super::search::{classify, escape_like, plan_unified, SearchKey};
use crate::common::error::is_unique_violation;
use crate::common::{ApiError, ParticipantId};
use crate::domains::checkins::models::Checkin;
use crate::domains::tickets::models::Ticket;

const DUPLICATE_CPF: &str = "CPF already registered";

fn conflict_or_internal(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict(DUPLICATE_CPF.to_string())
    } else {
        ApiError::Internal(err)
    }
}

pub async fn create_participant(new: NewParticipant, pool: &PgPool) -> Result<Participant, ApiError> {
    if Participant::find_by_cpf(&new.cpf, pool).await?.is_some() {
        return Err(ApiError::Conflict(DUPLICATE_CPF.to_string()));
    }

    // A concurrent insert can still win between the check and the write;
    // the unique index turns that into the same conflict.
    let participant = Participant::new(new.name, new.cpf, new.ra, new.rf)
        .insert(pool)
        .await
        .map_err(conflict_or_internal)?;

    info!(participant_id = %participant.id, "Participant registered");
    Ok(participant)
}

pub async fn get_participant(id: ParticipantId, pool: &PgPool) -> Result<Participant, ApiError> {
    Participant::find_by_id(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Participant", "ID", id))
}

/// Participant plus tickets and check-in history.
pub async fn get_participant_detail(
    id: ParticipantId,
    pool: &PgPool,
) -> Result<ParticipantDetail, ApiError> {
    let participant = get_participant(id, pool).await?;
    let (tickets, checkins) = futures::try_join!(
        Ticket::find_by_participant(id, pool),
        Checkin::find_by_participant(id, pool),
    )?;

    Ok(ParticipantDetail {
        participant,
        tickets,
        checkins,
    })
}

pub async fn get_by_cpf(cpf: &str, pool: &PgPool) -> Result<Participant, ApiError> {
    let cpf = cpf.trim();
    Participant::find_by_cpf(cpf, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Participant", "CPF", cpf))
}

pub async fn get_by_ra(ra: &str, pool: &PgPool) -> Result<Participant, ApiError> {
    let ra = ra.trim();
    Participant::find_by_ra(ra, pool)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Participant", "RA", ra))
}

pub async fn get_by_rf(rf: &str, pool: &PgPool) -> Result<Participant, ApiError> {
    let rf = rf.trim();
    Participant::find_by_rf(rf, pool)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Participant", "RF", rf))
}

pub async fn list_participants(pool: &PgPool) -> Result<Vec<Participant>, ApiError> {
    Ok(Participant::find_all(pool).await?)
}

pub async fn search_by_name(name: &str, pool: &PgPool) -> Result<Vec<Participant>, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Participant::search_by_name(&escape_like(name), pool).await?)
}

/// Classified search: one lookup picked by the query's shape.
pub async fn search_classified(query: &str, pool: &PgPool) -> Result<Vec<Participant>, ApiError> {
    let key = classify(query);
    debug!(?key, "Classified participant search");

    let found = match key {
        SearchKey::Cpf(cpf) => Participant::find_by_cpf(&cpf, pool)
            .await?
            .into_iter()
            .collect(),
        SearchKey::Ra(ra) => Participant::find_by_ra(&ra, pool).await?,
        SearchKey::Rf(rf) => Participant::find_by_rf(&rf, pool).await?,
        SearchKey::Name(name) => search_by_name(&name, pool).await?,
    };
    Ok(found)
}

fn no_lookup() -> future::Ready<anyhow::Result<Vec<Participant>>> {
    future::ok(Vec::new())
}

/// Unified search: every compatible lookup at once, merged in
/// CPF, RA, RF, name order with duplicates dropped.
pub async fn search_unified(query: &str, pool: &PgPool) -> Result<Vec<Participant>, ApiError> {
    let Some(plan) = plan_unified(query) else {
        return Ok(Vec::new());
    };
    debug!(?plan, "Unified participant search");

    let by_cpf = match plan.cpf.as_deref() {
        Some(cpf) => Either::Left(async move {
            Participant::find_by_cpf(cpf, pool)
                .await
                .map(|found| found.into_iter().collect::<Vec<_>>())
        }),
        None => Either::Right(no_lookup()),
    };
    let by_ra = match plan.ra.as_deref() {
        Some(ra) => Either::Left(Participant::find_by_ra(ra, pool)),
        None => Either::Right(no_lookup()),
    };
    let by_rf = match plan.rf.as_deref() {
        Some(rf) => Either::Left(Participant::find_by_rf(rf, pool)),
        None => Either::Right(no_lookup()),
    };
    let pattern = plan.name.as_deref().map(escape_like);
    let by_name = match pattern.as_deref() {
        Some(pattern) => Either::Left(Participant::search_by_name(pattern, pool)),
        None => Either::Right(no_lookup()),
    };

    let (by_cpf, by_ra, by_rf, by_name) = futures::try_join!(by_cpf, by_ra, by_rf, by_name)?;

    Ok(merge_unique([by_cpf, by_ra, by_rf, by_name]))
}

/// Concatenate result groups, keeping the first occurrence of each id.
fn merge_unique<const N: usize>(groups: [Vec<Participant>; N]) -> Vec<Participant> {
    let mut seen = HashSet::new();
    groups
        .into_iter()
        .flatten()
        .filter(|p| seen.insert(p.id))
        .collect()
}

pub async fn update_participant(
    id: ParticipantId,
    changes: ParticipantChanges,
    pool: &PgPool,
) -> Result<Participant, ApiError> {
    let mut participant = get_participant(id, pool).await?;

    if let Some(cpf) = changes.cpf.as_deref() {
        if cpf != participant.cpf && Participant::cpf_taken(cpf, Some(id), pool).await? {
            return Err(ApiError::Conflict(DUPLICATE_CPF.to_string()));
        }
    }

    changes.apply(&mut participant);
    let participant = participant
        .update(pool)
        .await
        .map_err(conflict_or_internal)?
        .ok_or_else(|| ApiError::not_found("Participant", "ID", id))?;

    info!(participant_id = %participant.id, "Participant updated");
    Ok(participant)
}

pub async fn delete_participant(id: ParticipantId, pool: &PgPool) -> Result<(), ApiError> {
    if !Participant::delete(id, pool).await? {
        return Err(ApiError::not_found("Participant", "ID", id));
    }

    info!(participant_id = %id, "Participant deleted");
    Ok(())
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped_existing: usize,
    pub invalid: Vec<String>,
}

/// Register participants in bulk. Records whose CPF is already present are
/// skipped, invalid records are reported by position and skipped.
pub async fn seed_participants(
    records: Vec<CreateParticipantRequest>,
    pool: &PgPool,
) -> Result<SeedReport, ApiError> {
    let mut report = SeedReport::default();

    for (index, record) in records.into_iter().enumerate() {
        let new = match record.validate() {
            Ok(new) => new,
            Err(errors) => {
                warn!(index, %errors, "Skipping invalid seed record");
                report.invalid.push(format!("#{}: {}", index, errors));
                continue;
            }
        };

        match create_participant(new, pool).await {
            Ok(_) => report.inserted += 1,
            Err(ApiError::Conflict(_)) => report.skipped_existing += 1,
            Err(err) => return Err(err),
        }
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped_existing,
        invalid = report.invalid.len(),
        "Seed finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str, cpf: &str) -> Participant {
        Participant::new(name.into(), cpf.into(), None, None)
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let a = participant("Ana", "11111111111");
        let b = participant("Bia", "22222222222");
        let c = participant("Caio", "33333333333");

        let merged = merge_unique([
            vec![b.clone()],
            vec![a.clone(), b.clone()],
            vec![],
            vec![c.clone(), a.clone()],
        ]);

        let ids: Vec<_> = merged.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }
}
