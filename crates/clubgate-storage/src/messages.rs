//! User-facing messages for import failures and access decisions
//!
//! All messages are in Spanish (Argentine club front desk). Static texts are
//! constants; texts that embed a value are built by the associated functions.
//!
//! # Usage
//!
//! ```
//! use clubgate_storage::messages::DisplayMessages;
//!
//! assert_eq!(DisplayMessages::ACCESS_GRANTED_TITLE, "Acceso Permitido");
//! assert_eq!(
//!     DisplayMessages::cooldown_active(30),
//!     "Ya registraste un acceso recientemente, debes esperar 30 minutos"
//! );
//! ```

/// Display messages for the import pipeline and the access gate (Spanish)
///
/// # Extending Messages
///
/// Import failure texts are matched by front ends; change them only together
/// with the clients that read them.
pub struct DisplayMessages;

impl DisplayMessages {
    /// Row without a usable name or DNI
    pub const INVALID_ROW: &'static str = "Fila inválida: nombre o DNI faltante";

    /// Second or later occurrence of a DNI within the same import
    pub const DUPLICATE_IN_FILE: &'static str = "DNI duplicado en archivo";

    /// DNI already stored
    pub const DUPLICATE_DNI: &'static str = "DNI duplicado";

    /// Row absent after an ambiguous bulk insert
    pub const INSERT_CONFLICT: &'static str = "Error al insertar fila (posible conflicto)";

    /// Single insert failed for a reason other than a duplicate
    pub const INSERT_FAILED: &'static str = "Error al insertar fila";

    pub const ACCESS_GRANTED_TITLE: &'static str = "Acceso Permitido";

    pub const ACCESS_DENIED_TITLE: &'static str = "Acceso Denegado";

    pub const ACCESS_REGISTERED: &'static str = "Acceso registrado con éxito";

    /// Unknown member at the gate
    pub fn member_not_found(dni: &str) -> String {
        format!("Socio no encontrado con el DNI: {dni}")
    }

    /// Cooldown still running. States the configured threshold, not the remainder.
    pub fn cooldown_active(minutes: u32) -> String {
        format!("Ya registraste un acceso recientemente, debes esperar {minutes} minutos")
    }

    /// Single insert failure carrying the store's reason
    pub fn insert_failed(reason: &str) -> String {
        format!("{}: {reason}", Self::INSERT_FAILED)
    }
}
