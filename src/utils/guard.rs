/// The single confirmation literal recognized by mutating tools.
pub const CONFIRM_MARKER: &str = "YES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl GuardDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Decides whether a mutating call may proceed. Dry-run requests are always
/// allowed (they never reach the network); everything else requires the
/// process-wide enable flag and the exact confirmation marker.
pub fn allow_destructive(
    confirm: Option<&str>,
    dry_run: bool,
    destructive_enabled: bool,
) -> GuardDecision {
    if dry_run {
        return GuardDecision::allowed();
    }
    if !destructive_enabled {
        return GuardDecision::denied(
            "Destructive ops disabled. Set ALLOW_DESTRUCTIVE=true to enable.",
        );
    }
    if confirm != Some(CONFIRM_MARKER) {
        return GuardDecision::denied("Confirmation required: set confirm:\"YES\" to proceed.");
    }
    GuardDecision::allowed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_is_always_allowed() {
        assert!(allow_destructive(None, true, false).allowed);
        assert!(allow_destructive(Some("NO"), true, false).allowed);
        assert!(allow_destructive(Some("YES"), true, true).allowed);
    }

    #[test]
    fn denied_when_flag_is_off() {
        let decision = allow_destructive(Some("YES"), false, false);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("disabled"));
    }

    #[test]
    fn denied_without_exact_marker() {
        let decision = allow_destructive(Some("yes"), false, true);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("Confirmation required"));

        let decision = allow_destructive(None, false, true);
        assert!(!decision.allowed);
    }

    #[test]
    fn allowed_when_enabled_and_confirmed() {
        assert_eq!(
            allow_destructive(Some("YES"), false, true),
            GuardDecision {
                allowed: true,
                reason: None
            }
        );
    }
}
