//! Repository layer for the local store
//!
//! CRUD operations for family members, alarms and intake logs, plus the
//! collaborator trait implementations used when running offline.

use super::models::*;
use crate::error::{AppError, Result};
use crate::stores::{AlarmStore, FamilyRepository, IntakeLogStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const MEMBER_COLUMNS: &str = "id, name, relation, birth_year, is_default";
const ALARM_COLUMNS: &str =
    "id, member_id, name, hour, minute, is_enabled, count, item_image, item_seq";
const INTAKE_COLUMNS: &str = "id, year, month, date, alarm_id";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Family members =====

    /// Create a family member; a new default replaces the previous one
    pub async fn create_member(&self, req: CreateMemberRequest) -> Result<FamilyMember> {
        let mut tx = self.pool.begin().await?;

        if req.is_default {
            sqlx::query("UPDATE family_members SET is_default = 0")
                .execute(&mut *tx)
                .await?;
        }

        let member = sqlx::query_as::<_, FamilyMember>(&format!(
            "INSERT INTO family_members (name, relation, birth_year, is_default) \
             VALUES (?, ?, ?, ?) RETURNING {}",
            MEMBER_COLUMNS
        ))
        .bind(&req.name)
        .bind(&req.relation)
        .bind(req.birth_year)
        .bind(req.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Created family member: {}", member.id);
        Ok(member)
    }

    pub async fn get_member(&self, id: i64) -> Result<FamilyMember> {
        sqlx::query_as::<_, FamilyMember>(&format!(
            "SELECT {} FROM family_members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::MemberNotFound(id))
    }

    pub async fn list_members(&self) -> Result<Vec<FamilyMember>> {
        let members = sqlx::query_as::<_, FamilyMember>(&format!(
            "SELECT {} FROM family_members ORDER BY id ASC",
            MEMBER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn update_member(&self, member: FamilyMember) -> Result<FamilyMember> {
        let mut tx = self.pool.begin().await?;

        if member.is_default {
            sqlx::query("UPDATE family_members SET is_default = 0 WHERE id != ?")
                .bind(member.id)
                .execute(&mut *tx)
                .await?;
        }

        let rows = sqlx::query(
            r#"
            UPDATE family_members
            SET name = ?, relation = ?, birth_year = ?, is_default = ?
            WHERE id = ?
            "#,
        )
        .bind(&member.name)
        .bind(&member.relation)
        .bind(member.birth_year)
        .bind(member.is_default)
        .bind(member.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::MemberNotFound(member.id));
        }

        tx.commit().await?;

        tracing::debug!("Updated family member: {}", member.id);
        Ok(member)
    }

    /// Resolve an optional target to a concrete member id
    pub async fn resolve_member(&self, target: Option<i64>) -> Result<i64> {
        match target {
            Some(id) => Ok(self.get_member(id).await?.id),
            None => sqlx::query_scalar::<_, i64>(
                "SELECT id FROM family_members WHERE is_default = 1 LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NoDefaultMember),
        }
    }

    // ===== Alarms =====

    pub async fn create_alarm(&self, req: CreateAlarmRequest) -> Result<AlarmRecord> {
        let alarm = sqlx::query_as::<_, AlarmRecord>(&format!(
            "INSERT INTO alarms (member_id, name, hour, minute, is_enabled, count, item_image, item_seq) \
             VALUES (?, ?, ?, ?, 1, ?, ?, ?) RETURNING {}",
            ALARM_COLUMNS
        ))
        .bind(req.member_id)
        .bind(&req.name)
        .bind(req.hour)
        .bind(req.minute)
        .bind(req.count)
        .bind(&req.item_image)
        .bind(&req.item_seq)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created alarm: {} for member: {}", alarm.id, req.member_id);
        Ok(alarm)
    }

    pub async fn get_alarm(&self, id: i64) -> Result<AlarmRecord> {
        sqlx::query_as::<_, AlarmRecord>(&format!(
            "SELECT {} FROM alarms WHERE id = ?",
            ALARM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AlarmNotFound(id))
    }

    /// Alarms for a member ordered by trigger time
    pub async fn list_alarms(&self, member_id: i64) -> Result<Vec<AlarmRecord>> {
        let alarms = sqlx::query_as::<_, AlarmRecord>(&format!(
            "SELECT {} FROM alarms WHERE member_id = ? ORDER BY hour, minute, id",
            ALARM_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(alarms)
    }

    pub async fn set_alarm_enabled(&self, id: i64, enabled: bool) -> Result<AlarmRecord> {
        let rows = sqlx::query("UPDATE alarms SET is_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::AlarmNotFound(id));
        }

        tracing::debug!("Alarm {} enabled = {}", id, enabled);
        self.get_alarm(id).await
    }

    /// Delete an alarm. Intake logs that reference it are kept.
    pub async fn delete_alarm(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM alarms WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::AlarmNotFound(id));
        }

        tracing::debug!("Deleted alarm: {}", id);
        Ok(())
    }

    // ===== Intake logs =====

    pub async fn list_intake_logs(&self, member_id: i64, month: u32) -> Result<Vec<IntakeLogEntry>> {
        let entries = sqlx::query_as::<_, IntakeLogEntry>(&format!(
            "SELECT {} FROM intake_logs WHERE member_id = ? AND month = ? ORDER BY date, id",
            INTAKE_COLUMNS
        ))
        .bind(member_id)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn create_intake(&self, member_id: i64, intake: NewIntake) -> Result<IntakeLogEntry> {
        let entry = sqlx::query_as::<_, IntakeLogEntry>(&format!(
            "INSERT INTO intake_logs (member_id, year, month, date, alarm_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            INTAKE_COLUMNS
        ))
        .bind(member_id)
        .bind(intake.year)
        .bind(intake.month)
        .bind(intake.date)
        .bind(intake.alarm_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Recorded intake {} for alarm {} on {:02}-{:02}",
            entry.id,
            entry.alarm_id,
            entry.month,
            entry.date
        );
        Ok(entry)
    }
}

#[async_trait]
impl IntakeLogStore for Repository {
    async fn fetch_intake_logs(
        &self,
        target: Option<i64>,
        month: u32,
    ) -> Result<Vec<IntakeLogEntry>> {
        let member_id = self.resolve_member(target).await?;
        self.list_intake_logs(member_id, month).await
    }

    async fn record_intake(&self, target: Option<i64>, intake: NewIntake) -> Result<IntakeLogEntry> {
        let member_id = self.resolve_member(target).await?;
        self.create_intake(member_id, intake).await
    }
}

#[async_trait]
impl AlarmStore for Repository {
    async fn fetch_alarms(&self, target: Option<i64>) -> Result<Vec<AlarmRecord>> {
        let member_id = self.resolve_member(target).await?;
        self.list_alarms(member_id).await
    }
}

#[async_trait]
impl FamilyRepository for Repository {
    async fn get(&self, id: i64) -> Result<FamilyMember> {
        self.get_member(id).await
    }

    async fn list(&self) -> Result<Vec<FamilyMember>> {
        self.list_members().await
    }

    async fn update(&self, member: FamilyMember) -> Result<FamilyMember> {
        self.update_member(member).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    async fn create_member(repo: &Repository, name: &str, is_default: bool) -> FamilyMember {
        repo.create_member(CreateMemberRequest {
            name: name.to_string(),
            relation: "self".to_string(),
            birth_year: None,
            is_default,
        })
        .await
        .unwrap()
    }

    fn alarm_request(member_id: i64, name: &str, hour: u32, minute: u32) -> CreateAlarmRequest {
        CreateAlarmRequest {
            member_id,
            name: name.to_string(),
            hour,
            minute,
            count: 1,
            item_image: None,
            item_seq: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_member() {
        let repo = create_test_repo().await;

        let member = create_member(&repo, "Min", true).await;
        let fetched = repo.get_member(member.id).await.unwrap();

        assert_eq!(fetched, member);
        assert!(matches!(
            repo.get_member(999).await,
            Err(AppError::MemberNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_single_default_member() {
        let repo = create_test_repo().await;

        let first = create_member(&repo, "Min", true).await;
        let second = create_member(&repo, "Ji-woo", true).await;

        assert_eq!(repo.resolve_member(None).await.unwrap(), second.id);
        assert!(!repo.get_member(first.id).await.unwrap().is_default);

        let mut first = repo.get_member(first.id).await.unwrap();
        first.is_default = true;
        repo.update_member(first.clone()).await.unwrap();

        assert_eq!(repo.resolve_member(None).await.unwrap(), first.id);
    }

    #[tokio::test]
    async fn test_resolve_without_default() {
        let repo = create_test_repo().await;
        create_member(&repo, "Min", false).await;

        assert!(matches!(
            repo.resolve_member(None).await,
            Err(AppError::NoDefaultMember)
        ));
    }

    #[tokio::test]
    async fn test_alarms_crud() {
        let repo = create_test_repo().await;
        let member = create_member(&repo, "Min", true).await;

        repo.create_alarm(alarm_request(member.id, "Evening", 21, 0))
            .await
            .unwrap();
        let morning = repo
            .create_alarm(alarm_request(member.id, "Morning", 8, 30))
            .await
            .unwrap();
        assert!(morning.is_enabled);
        assert_eq!(morning.member_id, Some(member.id));

        let alarms = repo.fetch_alarms(None).await.unwrap();
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].name, "Morning");

        let disabled = repo.set_alarm_enabled(morning.id, false).await.unwrap();
        assert!(!disabled.is_enabled);

        repo.delete_alarm(morning.id).await.unwrap();
        assert!(matches!(
            repo.get_alarm(morning.id).await,
            Err(AppError::AlarmNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_intake_logs_by_month() {
        let repo = create_test_repo().await;
        let member = create_member(&repo, "Min", true).await;
        let other = create_member(&repo, "Ji-woo", false).await;
        let alarm = repo
            .create_alarm(alarm_request(member.id, "Morning", 8, 0))
            .await
            .unwrap();

        for (month, date) in [(9, 5), (9, 6), (10, 1)] {
            repo.record_intake(
                None,
                NewIntake {
                    year: Some(2024),
                    month,
                    date,
                    alarm_id: alarm.id,
                },
            )
            .await
            .unwrap();
        }
        repo.record_intake(
            Some(other.id),
            NewIntake {
                year: None,
                month: 9,
                date: 5,
                alarm_id: alarm.id,
            },
        )
        .await
        .unwrap();

        let september = repo.fetch_intake_logs(None, 9).await.unwrap();
        assert_eq!(september.len(), 2);
        assert!(september.iter().all(|e| e.year == Some(2024)));

        let others = repo.fetch_intake_logs(Some(other.id), 9).await.unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].year, None);

        assert!(repo.fetch_intake_logs(None, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_intake_is_not_idempotent() {
        let repo = create_test_repo().await;
        let member = create_member(&repo, "Min", true).await;

        let intake = NewIntake {
            year: Some(2024),
            month: 9,
            date: 5,
            alarm_id: 1,
        };
        let first = repo.record_intake(Some(member.id), intake.clone()).await.unwrap();
        let second = repo.record_intake(Some(member.id), intake).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.fetch_intake_logs(None, 9).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_intake_keeps_dangling_alarm_reference() {
        let repo = create_test_repo().await;
        let member = create_member(&repo, "Min", true).await;
        let alarm = repo
            .create_alarm(alarm_request(member.id, "Morning", 8, 0))
            .await
            .unwrap();

        repo.record_intake(
            None,
            NewIntake {
                year: Some(2024),
                month: 9,
                date: 5,
                alarm_id: alarm.id,
            },
        )
        .await
        .unwrap();
        repo.delete_alarm(alarm.id).await.unwrap();

        let entries = repo.fetch_intake_logs(None, 9).await.unwrap();
        assert_eq!(entries[0].alarm_id, alarm.id);
    }

    #[tokio::test]
    async fn test_unknown_target_member() {
        let repo = create_test_repo().await;
        assert!(matches!(
            repo.fetch_alarms(Some(42)).await,
            Err(AppError::MemberNotFound(42))
        ));
    }
}
