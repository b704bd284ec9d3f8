//! Shared primitive types used across the entire desk.

/// An action sequence number. One step = one analyst action
/// processed to completion.
pub type Seq = u64;

/// A stable, unique identifier for a case ("C-001" style).
pub type CaseId = String;

/// The canonical session identifier.
pub type SessionId = String;
