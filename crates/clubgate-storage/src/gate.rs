use crate::error::StorageResult;
use crate::messages::DisplayMessages;
use crate::models::Member;
use crate::repositories::{AccessLogRepository, MemberRepository};
use chrono::{DateTime, Duration, Utc};
use clubgate_core::dni;
use serde::Serialize;
use tracing::{debug, info};

/// Result of presenting a DNI at the gate
///
/// Denials are ordinary decisions, not errors: an unknown member and a
/// running cooldown both come back as `granted == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
}

impl AccessDecision {
    fn granted(member: Member) -> Self {
        Self {
            granted: true,
            title: DisplayMessages::ACCESS_GRANTED_TITLE.to_string(),
            subtitle: DisplayMessages::ACCESS_REGISTERED.to_string(),
            member: Some(member),
        }
    }

    fn denied(subtitle: String, member: Option<Member>) -> Self {
        Self {
            granted: false,
            title: DisplayMessages::ACCESS_DENIED_TITLE.to_string(),
            subtitle,
            member,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

/// Access gate with a per-member cooldown
///
/// # Decision Flow
///
/// 1. **Normalize** the presented DNI
/// 2. **Member Lookup**: unknown DNI → denied, nothing logged
/// 3. **Last Access**: no previous entry → granted and logged
/// 4. **Cooldown**: less than the cooldown since the last entry → denied,
///    nothing logged; otherwise granted and logged
///
/// Only granted accesses are written to the log, so the cooldown always
/// counts from the last successful entry.
///
/// # Examples
///
/// ```no_run
/// use clubgate_storage::gate::AccessGate;
/// use clubgate_storage::repositories::{SqliteAccessLogRepository, SqliteMemberRepository};
/// use clubgate_storage::{Database, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::new(DatabaseConfig::new("clubgate.db")).await?;
/// let gate = AccessGate::new(
///     SqliteMemberRepository::new(db.pool().clone()),
///     SqliteAccessLogRepository::new(db.pool().clone()),
///     30,
/// );
///
/// let decision = gate.evaluate("30.111.222").await?;
/// println!("{}: {}", decision.title, decision.subtitle);
/// # Ok(())
/// # }
/// ```
pub struct AccessGate<M, L> {
    members: M,
    logs: L,
    cooldown_minutes: u32,
}

impl<M: MemberRepository, L: AccessLogRepository> AccessGate<M, L> {
    /// Create a gate with the cooldown in minutes
    pub fn new(members: M, logs: L, cooldown_minutes: u32) -> Self {
        Self {
            members,
            logs,
            cooldown_minutes,
        }
    }

    pub fn cooldown_minutes(&self) -> u32 {
        self.cooldown_minutes
    }

    pub fn members(&self) -> &M {
        &self.members
    }

    pub fn logs(&self) -> &L {
        &self.logs
    }

    /// Evaluate an access attempt happening now.
    ///
    /// # Errors
    ///
    /// Only store failures are errors; denials return `Ok`.
    pub async fn evaluate(&self, raw_dni: &str) -> StorageResult<AccessDecision> {
        self.evaluate_at(raw_dni, Utc::now()).await
    }

    /// Evaluate an access attempt happening at `now`.
    pub async fn evaluate_at(
        &self,
        raw_dni: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<AccessDecision> {
        let key = dni::normalize_str(raw_dni);

        let member = if key.is_empty() {
            None
        } else {
            self.members.find_by_dni(&key).await?
        };

        let Some(member) = member else {
            info!(dni = %key, "Access denied: unknown member");
            return Ok(AccessDecision::denied(
                DisplayMessages::member_not_found(&key),
                None,
            ));
        };

        if let Some(last) = self.logs.most_recent(&key).await? {
            let elapsed = now - last.created_at;
            if elapsed < Duration::minutes(i64::from(self.cooldown_minutes)) {
                debug!(
                    dni = %key,
                    elapsed_secs = elapsed.num_seconds(),
                    "Access denied: cooldown running"
                );
                return Ok(AccessDecision::denied(
                    DisplayMessages::cooldown_active(self.cooldown_minutes),
                    Some(member),
                ));
            }
        }

        self.logs.append(&key, now).await?;
        info!(dni = %key, member_id = member.id, "Access granted");

        Ok(AccessDecision::granted(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMember;
    use crate::repositories::{InMemoryAccessLogRepository, InMemoryMemberRepository};
    use rstest::rstest;

    type TestGate = AccessGate<InMemoryMemberRepository, InMemoryAccessLogRepository>;

    async fn gate_with_member(cooldown: u32) -> TestGate {
        let members = InMemoryMemberRepository::new();
        members.seed(NewMember::new("Ana Pérez", "30111222")).await;
        AccessGate::new(members, InMemoryAccessLogRepository::new(), cooldown)
    }

    #[tokio::test]
    async fn test_unknown_member_denied_without_log() {
        let gate = gate_with_member(30).await;

        let decision = gate.evaluate("99999999").await.unwrap();

        assert!(!decision.granted);
        assert_eq!(decision.title, "Acceso Denegado");
        assert_eq!(decision.subtitle, "Socio no encontrado con el DNI: 99999999");
        assert!(decision.member.is_none());
        assert_eq!(gate.logs().append_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_key_denied_without_log() {
        let gate = gate_with_member(30).await;

        let decision = gate.evaluate(" . - ").await.unwrap();

        assert!(!decision.granted);
        assert_eq!(gate.logs().append_count(), 0);
    }

    #[tokio::test]
    async fn test_first_access_granted_and_logged() {
        let gate = gate_with_member(30).await;

        let decision = gate.evaluate("30.111.222").await.unwrap();

        assert!(decision.granted);
        assert_eq!(decision.title, "Acceso Permitido");
        assert_eq!(decision.subtitle, "Acceso registrado con éxito");
        assert_eq!(decision.member.unwrap().full_name, "Ana Pérez");
        assert_eq!(gate.logs().append_count(), 1);
    }

    #[tokio::test]
    async fn test_recent_access_denied_with_threshold() {
        let gate = gate_with_member(30).await;
        let now = Utc::now();
        gate.logs().seed("30111222", now - Duration::minutes(10)).await;

        let decision = gate.evaluate_at("30111222", now).await.unwrap();

        assert!(!decision.granted);
        assert!(decision.subtitle.contains("esperar 30 minutos"));
        assert!(decision.member.is_some());
        assert_eq!(gate.logs().append_count(), 0);
    }

    #[rstest]
    #[case::just_before(-1, false)]
    #[case::exactly_at(0, true)]
    #[case::just_after(1, true)]
    #[tokio::test]
    async fn test_cooldown_boundary(#[case] offset_secs: i64, #[case] granted: bool) {
        let gate = gate_with_member(30).await;
        let t0 = Utc::now();
        gate.logs().seed("30111222", t0).await;

        let at = t0 + Duration::minutes(30) + Duration::seconds(offset_secs);
        let decision = gate.evaluate_at("30111222", at).await.unwrap();

        assert_eq!(decision.granted, granted);
        assert_eq!(gate.logs().append_count(), usize::from(granted));
    }

    #[tokio::test]
    async fn test_denial_does_not_extend_cooldown() {
        let gate = gate_with_member(30).await;
        let t0 = Utc::now();

        assert!(gate.evaluate_at("30111222", t0).await.unwrap().granted);
        assert!(
            !gate
                .evaluate_at("30111222", t0 + Duration::minutes(20))
                .await
                .unwrap()
                .granted
        );
        assert!(
            gate.evaluate_at("30111222", t0 + Duration::minutes(31))
                .await
                .unwrap()
                .granted
        );
        assert_eq!(gate.logs().append_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_cooldown_always_grants() {
        let gate = gate_with_member(0).await;
        let now = Utc::now();

        assert!(gate.evaluate_at("30111222", now).await.unwrap().granted);
        assert!(gate.evaluate_at("30111222", now).await.unwrap().granted);
    }

    #[test]
    fn test_decision_serializes_without_member() {
        let decision = AccessDecision::denied(DisplayMessages::member_not_found("1"), None);
        let value = serde_json::to_value(&decision).unwrap();

        assert_eq!(value["granted"], false);
        assert!(value.get("member").is_none());
    }
}
