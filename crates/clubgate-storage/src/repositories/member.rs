#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult, is_unique_violation};
use crate::models::{Member, NewMember};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Maximum keys bound into a single `IN (...)` lookup.
const LOOKUP_CHUNK: usize = 500;

/// Outcome of a single-document insert.
///
/// A uniqueness conflict is an expected outcome, not an error: callers
/// branch on the variant instead of inspecting driver error codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The document was stored
    Inserted(Member),
    /// A member with the same DNI already exists
    DuplicateKey,
}

/// Why one document of a bulk insert was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteErrorKind {
    /// A member with the same DNI already exists
    DuplicateKey,
    /// Any other per-document failure, with the store's message
    Other(String),
}

/// Per-document failure reported by [`MemberRepository::insert_many`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    /// Position of the document in the submitted slice
    pub index: usize,
    pub kind: WriteErrorKind,
}

/// Result of an unordered bulk insert.
///
/// `write_errors` may be empty even when `inserted_count` falls short of the
/// submitted length; callers must then re-query to learn what was stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertReport {
    pub inserted_count: usize,
    pub write_errors: Vec<WriteError>,
}

/// Repository trait for Member entity operations
///
/// This trait defines the contract for member data access. The bulk
/// primitives (`find_existing`, `insert_many`) back the import pipeline;
/// stores that cannot offer them report `supports_bulk() == false` and the
/// pipeline falls back to `insert_one`.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait MemberRepository: Send + Sync {
    /// Find a member by ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Member>>;

    /// Find a member by normalized DNI (exact match)
    async fn find_by_dni(&self, dni: &str) -> StorageResult<Option<Member>>;

    /// Get all members ordered by name
    async fn find_all(&self) -> StorageResult<Vec<Member>>;

    /// Find every member whose DNI is in `dnis`
    async fn find_existing(&self, dnis: &[String]) -> StorageResult<Vec<Member>>;

    /// Insert one member
    async fn insert_one(&self, member: &NewMember) -> StorageResult<InsertOutcome>;

    /// Insert many members without stopping at the first conflict
    async fn insert_many(&self, members: &[NewMember]) -> StorageResult<BulkInsertReport>;

    /// Replace name and DNI of an existing member
    async fn update(&self, member: &Member) -> StorageResult<Member>;

    /// Delete a member by ID
    async fn delete(&self, id: i64) -> StorageResult<()>;

    /// Whether `find_existing` and `insert_many` are usable
    fn supports_bulk(&self) -> bool {
        true
    }
}

/// SQLite implementation of MemberRepository
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    /// Create a new SQLite member repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MemberRepository for SqliteMemberRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, full_name, dni, created_at, updated_at
            FROM members
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn find_by_dni(&self, dni: &str) -> StorageResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, full_name, dni, created_at, updated_at
            FROM members
            WHERE dni = ?
            "#,
        )
        .bind(dni)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn find_all(&self) -> StorageResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, full_name, dni, created_at, updated_at
            FROM members
            ORDER BY full_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn find_existing(&self, dnis: &[String]) -> StorageResult<Vec<Member>> {
        let mut found = Vec::new();

        for chunk in dnis.chunks(LOOKUP_CHUNK) {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT id, full_name, dni, created_at, updated_at FROM members WHERE dni IN (",
            );
            let mut separated = query.separated(", ");
            for dni in chunk {
                separated.push_bind(dni);
            }
            separated.push_unseparated(")");

            let members = query
                .build_query_as::<Member>()
                .fetch_all(&self.pool)
                .await?;
            found.extend(members);
        }

        Ok(found)
    }

    async fn insert_one(&self, member: &NewMember) -> StorageResult<InsertOutcome> {
        let now = Utc::now();
        let result = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (full_name, dni, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, full_name, dni, created_at, updated_at
            "#,
        )
        .bind(&member.full_name)
        .bind(&member.dni)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(stored) => Ok(InsertOutcome::Inserted(stored)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::DuplicateKey),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_many(&self, members: &[NewMember]) -> StorageResult<BulkInsertReport> {
        let now = Utc::now();
        let mut report = BulkInsertReport::default();
        let mut tx = self.pool.begin().await?;

        // A failed statement only rolls back itself; the transaction stays usable.
        for (index, member) in members.iter().enumerate() {
            let result = sqlx::query(
                r#"
                INSERT INTO members (full_name, dni, created_at, updated_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&member.full_name)
            .bind(&member.dni)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => report.inserted_count += 1,
                Err(e) if is_unique_violation(&e) => report.write_errors.push(WriteError {
                    index,
                    kind: WriteErrorKind::DuplicateKey,
                }),
                Err(e) => report.write_errors.push(WriteError {
                    index,
                    kind: WriteErrorKind::Other(e.to_string()),
                }),
            }
        }

        tx.commit().await?;
        Ok(report)
    }

    async fn update(&self, member: &Member) -> StorageResult<Member> {
        let result = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET full_name = ?, dni = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, full_name, dni, created_at, updated_at
            "#,
        )
        .bind(&member.full_name)
        .bind(&member.dni)
        .bind(Utc::now())
        .bind(member.id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(updated)) => Ok(updated),
            Ok(None) => Err(StorageError::member_not_found("id", member.id)),
            Err(e) if is_unique_violation(&e) => Err(StorageError::duplicate_dni(&member.dni)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::member_not_found("id", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;

    async fn setup_test_repo() -> SqliteMemberRepository {
        let db = Database::in_memory().await.unwrap();
        SqliteMemberRepository::new(db.pool().clone())
    }

    async fn insert(repo: &SqliteMemberRepository, name: &str, dni: &str) -> Member {
        match repo.insert_one(&NewMember::new(name, dni)).await.unwrap() {
            InsertOutcome::Inserted(member) => member,
            InsertOutcome::DuplicateKey => panic!("unexpected duplicate for {dni}"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup_test_repo().await;

        let member = insert(&repo, "Ana Pérez", "30111222").await;
        assert!(member.id > 0);

        let by_dni = repo.find_by_dni("30111222").await.unwrap().unwrap();
        assert_eq!(by_dni.full_name, "Ana Pérez");

        let by_id = repo.find_by_id(member.id).await.unwrap().unwrap();
        assert_eq!(by_id.dni, "30111222");
    }

    #[tokio::test]
    async fn test_insert_one_duplicate_key() {
        let repo = setup_test_repo().await;
        insert(&repo, "Ana", "111").await;

        let outcome = repo.insert_one(&NewMember::new("Otra", "111")).await.unwrap();
        assert_eq!(outcome, InsertOutcome::DuplicateKey);
    }

    #[tokio::test]
    async fn test_find_existing() {
        let repo = setup_test_repo().await;
        insert(&repo, "Ana", "111").await;
        insert(&repo, "Bruno", "222").await;

        let keys = vec!["111".to_string(), "333".to_string(), "222".to_string()];
        let mut found: Vec<String> = repo
            .find_existing(&keys)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.dni)
            .collect();
        found.sort();

        assert_eq!(found, vec!["111", "222"]);
        assert!(repo.find_existing(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_existing_spans_lookup_chunks() {
        let repo = setup_test_repo().await;
        let docs: Vec<NewMember> = (0..LOOKUP_CHUNK + 10)
            .map(|i| NewMember::new(format!("Socio {i}"), format!("{}", 1_000_000 + i)))
            .collect();
        repo.insert_many(&docs).await.unwrap();

        let keys: Vec<String> = docs.iter().map(|d| d.dni.clone()).collect();
        let found = repo.find_existing(&keys).await.unwrap();
        assert_eq!(found.len(), LOOKUP_CHUNK + 10);
    }

    #[tokio::test]
    async fn test_insert_many_reports_conflicts_and_continues() {
        let repo = setup_test_repo().await;
        insert(&repo, "Existente", "222").await;

        let docs = vec![
            NewMember::new("Ana", "111"),
            NewMember::new("Bruno", "222"),
            NewMember::new("Carla", "333"),
        ];
        let report = repo.insert_many(&docs).await.unwrap();

        assert_eq!(report.inserted_count, 2);
        assert_eq!(
            report.write_errors,
            vec![WriteError {
                index: 1,
                kind: WriteErrorKind::DuplicateKey
            }]
        );
        assert!(repo.find_by_dni("333").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_all_ordered_by_name() {
        let repo = setup_test_repo().await;
        insert(&repo, "Carla", "3").await;
        insert(&repo, "Ana", "1").await;
        insert(&repo, "Bruno", "2").await;

        let names: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.full_name)
            .collect();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);
    }

    #[tokio::test]
    async fn test_update_member() {
        let repo = setup_test_repo().await;
        let mut member = insert(&repo, "Ana", "111").await;

        member.full_name = "Ana María".to_string();
        member.dni = "112".to_string();
        let updated = repo.update(&member).await.unwrap();

        assert_eq!(updated.full_name, "Ana María");
        assert_eq!(updated.dni, "112");
        assert!(repo.find_by_dni("111").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_to_taken_dni() {
        let repo = setup_test_repo().await;
        insert(&repo, "Ana", "111").await;
        let mut bruno = insert(&repo, "Bruno", "222").await;

        bruno.dni = "111".to_string();
        let err = repo.update(&bruno).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_update_missing() {
        let repo = setup_test_repo().await;
        let mut ghost = insert(&repo, "Ana", "111").await;
        ghost.id = 9999;

        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_member() {
        let repo = setup_test_repo().await;
        let member = insert(&repo, "Ana", "111").await;

        repo.delete(member.id).await.unwrap();
        assert!(repo.find_by_id(member.id).await.unwrap().is_none());

        let err = repo.delete(member.id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
