use notify::{EventKind, event::ModifyKind};

/// What happened to a file during one debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    /// `None` for events that never trigger a compile: access, metadata
    /// (pdflatex and editors touch mtimes), renames reported without a side.
    pub(super) fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }

    /// Combine the pending change of a path with a new one.
    ///
    /// Returns the kind to keep, or `None` when the two cancel out.
    pub(super) fn merge(pending: Self, incoming: Self) -> Option<Self> {
        use ChangeKind::*;
        match (pending, incoming) {
            (Created, Removed) => None,
            (Removed, restored @ (Created | Modified)) => Some(restored),
            (Modified, Removed) => Some(Removed),
            (pending, _) => Some(pending),
        }
    }

    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}
