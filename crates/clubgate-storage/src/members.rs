use crate::error::{StorageError, StorageResult};
use crate::models::{Member, NewMember};
use crate::repositories::{InsertOutcome, MemberRepository};
use clubgate_core::Dni;
use tracing::info;

/// Single-member management on top of a [`MemberRepository`]
///
/// Every DNI passing through the service is normalized, so `"30.111.222"`
/// and `"30111222"` address the same member.
pub struct MemberService<R> {
    repo: R,
}

impl<R: MemberRepository> MemberService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Register a member.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name is blank or the DNI normalizes to nothing
    /// - `Duplicate` if the DNI is already registered
    pub async fn create(&self, full_name: &str, dni: &str) -> StorageResult<Member> {
        let doc = validated(full_name, dni)?;

        match self.repo.insert_one(&doc).await? {
            InsertOutcome::Inserted(member) => {
                info!(member_id = member.id, dni = %member.dni, "Member created");
                Ok(member)
            }
            InsertOutcome::DuplicateKey => Err(StorageError::duplicate_dni(&doc.dni)),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> StorageResult<Option<Member>> {
        self.repo.find_by_id(id).await
    }

    /// Exact match on the normalized DNI
    pub async fn find_by_dni(&self, dni: &str) -> StorageResult<Option<Member>> {
        match Dni::new(dni) {
            Ok(key) => self.repo.find_by_dni(key.as_str()).await,
            Err(_) => Ok(None),
        }
    }

    /// All members ordered by name
    pub async fn list(&self) -> StorageResult<Vec<Member>> {
        self.repo.find_all().await
    }

    /// Replace name and DNI of member `id`.
    pub async fn update(&self, id: i64, full_name: &str, dni: &str) -> StorageResult<Member> {
        let doc = validated(full_name, dni)?;
        let mut member = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::member_not_found("id", id))?;

        member.full_name = doc.full_name;
        member.dni = doc.dni;

        let updated = self.repo.update(&member).await?;
        info!(member_id = id, "Member updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> StorageResult<()> {
        self.repo.delete(id).await?;
        info!(member_id = id, "Member deleted");
        Ok(())
    }
}

fn validated(full_name: &str, dni: &str) -> StorageResult<NewMember> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(clubgate_core::Error::MissingField("full_name".to_string()).into());
    }

    let dni = Dni::new(dni)?;
    Ok(NewMember::new(full_name, dni.into_inner()))
}
