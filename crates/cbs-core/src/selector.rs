//! Role selection.
use cbs_model::{ComponentRole, ENV_ADDRESS, Env};
use tracing::debug;

/// Decide which role this process plays.
///
/// An explicit role always wins. Otherwise a non-empty `ADDRESS` variable (set on controller
/// deployments) selects [`ComponentRole::Controller`], and everything else is a node.
pub fn select_role(explicit: Option<ComponentRole>, env: &Env) -> ComponentRole {
    if let Some(role) = explicit {
        debug!(%role, "component role set explicitly");
        return role;
    }

    let role = match env.get(ENV_ADDRESS) {
        Some(v) if !v.is_empty() => ComponentRole::Controller,
        _ => ComponentRole::Node,
    };
    debug!(%role, "component role derived from environment");
    role
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_role_wins_over_environment() {
        let env = Env::new().with(ENV_ADDRESS, "10.0.0.1:443");
        assert_eq!(
            select_role(Some(ComponentRole::Node), &env),
            ComponentRole::Node
        );
        assert_eq!(
            select_role(Some(ComponentRole::Controller), &Env::new()),
            ComponentRole::Controller
        );
    }

    #[test]
    fn address_selects_controller() {
        let env = Env::new().with(ENV_ADDRESS, "10.0.0.1:443");
        assert_eq!(select_role(None, &env), ComponentRole::Controller);
    }

    #[test]
    fn missing_or_empty_address_selects_node() {
        assert_eq!(select_role(None, &Env::new()), ComponentRole::Node);
        assert_eq!(
            select_role(None, &Env::new().with(ENV_ADDRESS, "")),
            ComponentRole::Node
        );
    }
}
