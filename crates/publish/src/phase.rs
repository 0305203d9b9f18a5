//! Publish attempt state machine.

/// The phase a publish attempt has reached.
///
/// Phase transitions:
/// ```text
/// Start ──validate──► Validated ──create──► Created ──image──► Imaged
///   ──aliases──► Realiased ──cleanup──► Done
///
/// (any step fails) ──► RollingBack ──► Failed
/// ```
///
/// Not persisted anywhere: the phase exists only for the duration of one
/// `publish` call, to name how far the saga got in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PublishPhase {
    /// Nothing has happened yet.
    #[default]
    Start,

    /// The layout passed platform validation; nothing created.
    Validated,

    /// The replacement menu resource exists, without an image.
    Created,

    /// The replacement resource is fully populated.
    Imaged,

    /// Every alias points at the replacement resource.
    Realiased,

    /// The attempt finished successfully (terminal).
    Done,

    /// A step failed and recorded compensations are being applied.
    RollingBack,

    /// Rollback finished; the attempt failed (terminal).
    Failed,
}

impl PublishPhase {
    /// Returns true if external state may have been mutated in this phase.
    pub fn has_external_effects(&self) -> bool {
        !matches!(self, PublishPhase::Start | PublishPhase::Validated)
    }

    /// Returns true if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishPhase::Done | PublishPhase::Failed)
    }

    /// Returns the phase name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishPhase::Start => "Start",
            PublishPhase::Validated => "Validated",
            PublishPhase::Created => "Created",
            PublishPhase::Imaged => "Imaged",
            PublishPhase::Realiased => "Realiased",
            PublishPhase::Done => "Done",
            PublishPhase::RollingBack => "RollingBack",
            PublishPhase::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
