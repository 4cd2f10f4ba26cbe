//! Collaborator interfaces
//!
//! The reconciliation functions only see records that were already
//! fetched. These traits describe where those records come from, so the
//! remote backend and the local offline store are interchangeable.

use crate::database::{AlarmRecord, FamilyMember, IntakeLogEntry, NewIntake};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Source of confirmed-dose records
#[async_trait]
pub trait IntakeLogStore: Send + Sync {
    /// All entries for a member in one month; `None` targets the default member
    async fn fetch_intake_logs(&self, target: Option<i64>, month: u32)
        -> Result<Vec<IntakeLogEntry>>;

    /// Record a confirmation. Not idempotent.
    async fn record_intake(&self, target: Option<i64>, intake: NewIntake)
        -> Result<IntakeLogEntry>;
}

/// Source of configured alarms
#[async_trait]
pub trait AlarmStore: Send + Sync {
    async fn fetch_alarms(&self, target: Option<i64>) -> Result<Vec<AlarmRecord>>;
}

/// A backend that serves both alarms and intake logs
pub trait MedicationStore: IntakeLogStore + AlarmStore {}

impl<T: IntakeLogStore + AlarmStore> MedicationStore for T {}

/// Family members managed from this account
#[async_trait]
pub trait FamilyRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<FamilyMember>;
    async fn list(&self) -> Result<Vec<FamilyMember>>;
    async fn update(&self, member: FamilyMember) -> Result<FamilyMember>;
}

/// Caller-owned family dataset for demos and tests
#[derive(Debug, Default)]
pub struct InMemoryFamilyRepository {
    members: RwLock<Vec<FamilyMember>>,
}

impl InMemoryFamilyRepository {
    pub fn new(members: Vec<FamilyMember>) -> Self {
        Self {
            members: RwLock::new(members),
        }
    }
}

#[async_trait]
impl FamilyRepository for InMemoryFamilyRepository {
    async fn get(&self, id: i64) -> Result<FamilyMember> {
        self.members
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(AppError::MemberNotFound(id))
    }

    async fn list(&self) -> Result<Vec<FamilyMember>> {
        Ok(self.members.read().await.clone())
    }

    async fn update(&self, member: FamilyMember) -> Result<FamilyMember> {
        let mut members = self.members.write().await;
        let slot = members
            .iter_mut()
            .find(|m| m.id == member.id)
            .ok_or(AppError::MemberNotFound(member.id))?;

        *slot = member.clone();

        // At most one default member
        if member.is_default {
            for other in members.iter_mut().filter(|m| m.id != member.id) {
                other.is_default = false;
            }
        }

        tracing::debug!("Updated family member: {}", member.id);
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, name: &str, is_default: bool) -> FamilyMember {
        FamilyMember {
            id,
            name: name.to_string(),
            relation: "self".to_string(),
            birth_year: None,
            is_default,
        }
    }

    #[tokio::test]
    async fn test_in_memory_get_and_list() {
        let repo = InMemoryFamilyRepository::new(vec![
            member(1, "Min", true),
            member(2, "Ji-woo", false),
        ]);

        assert_eq!(repo.get(2).await.unwrap().name, "Ji-woo");
        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert!(matches!(
            repo.get(3).await,
            Err(AppError::MemberNotFound(3))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_update_moves_default() {
        let repo = InMemoryFamilyRepository::new(vec![
            member(1, "Min", true),
            member(2, "Ji-woo", false),
        ]);

        let mut updated = member(2, "Ji-woo", true);
        updated.birth_year = Some(1958);
        repo.update(updated).await.unwrap();

        let members = repo.list().await.unwrap();
        assert!(!members[0].is_default);
        assert!(members[1].is_default);
        assert_eq!(members[1].birth_year, Some(1958));
    }

    #[tokio::test]
    async fn test_in_memory_update_unknown_member() {
        let repo = InMemoryFamilyRepository::default();
        assert!(repo.update(member(9, "Nobody", false)).await.is_err());
    }
}
