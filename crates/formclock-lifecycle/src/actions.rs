//! Before-action hooks for request handling.

use std::collections::BTreeSet;
use std::fmt;

use formclock_session::SessionStore;
use formclock_types::ActionName;
use serde_json::Value;
use tracing::trace;

/// State visible to before-action hooks for one request.
pub struct RequestContext<'a> {
    action: ActionName,
    session: &'a mut dyn SessionStore,
    params: Value,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        action: impl Into<ActionName>,
        session: &'a mut dyn SessionStore,
        params: Value,
    ) -> Self {
        Self {
            action: action.into(),
            session,
            params,
        }
    }

    /// Name of the action being handled.
    pub fn action(&self) -> &ActionName {
        &self.action
    }

    pub fn session(&self) -> &(dyn SessionStore + 'a) {
        &*self.session
    }

    pub fn session_mut(&mut self) -> &mut (dyn SessionStore + 'a) {
        &mut *self.session
    }

    /// Parsed request parameters.
    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Value {
        &mut self.params
    }

    /// Session and params borrowed together.
    pub fn parts_mut(&mut self) -> (&mut (dyn SessionStore + 'a), &mut Value) {
        (&mut *self.session, &mut self.params)
    }

    /// Hand the (possibly modified) params to the action body.
    pub fn into_params(self) -> Value {
        self.params
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("action", &self.action)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

type BeforeAction = Box<dyn Fn(&mut RequestContext<'_>) + Send + Sync>;

struct ActionHook {
    name: String,
    only: BTreeSet<ActionName>,
    hook: BeforeAction,
}

/// Before-action hooks, each restricted to a set of actions.
///
/// Hooks run in registration order.
#[derive(Default)]
pub struct ActionHooks {
    hooks: Vec<ActionHook>,
}

impl ActionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook that runs before the listed actions.
    pub fn before_action<I, A, F>(&mut self, name: impl Into<String>, only: I, hook: F)
    where
        I: IntoIterator<Item = A>,
        A: Into<ActionName>,
        F: Fn(&mut RequestContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.push(ActionHook {
            name: name.into(),
            only: only.into_iter().map(Into::into).collect(),
            hook: Box::new(hook),
        });
    }

    /// Names of the hooks that apply to an action.
    pub fn hooks_for(&self, action: &ActionName) -> Vec<&str> {
        self.hooks
            .iter()
            .filter(|h| h.only.contains(action))
            .map(|h| h.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook that applies to the context's action.
    ///
    /// Returns the number of hooks run.
    pub fn run_before(&self, ctx: &mut RequestContext<'_>) -> usize {
        let mut ran = 0;
        for hook in &self.hooks {
            if !hook.only.contains(ctx.action()) {
                continue;
            }
            trace!(hook = %hook.name, action = %ctx.action(), "Running before-action hook");
            (hook.hook)(ctx);
            ran += 1;
        }
        ran
    }
}

impl fmt::Debug for ActionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| (&h.name, &h.only)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formclock_session::MemorySessionStore;
    use serde_json::json;

    #[test]
    fn test_hooks_restricted_to_actions() {
        let mut hooks = ActionHooks::new();
        hooks.before_action("mark", ["new", "edit"], |ctx: &mut RequestContext<'_>| {
            let action = ctx.action().to_string();
            ctx.session_mut().set("seen", action);
        });

        let mut store = MemorySessionStore::new();

        let mut ctx = RequestContext::new("show", &mut store, json!({}));
        assert_eq!(hooks.run_before(&mut ctx), 0);
        assert!(store.get("seen").is_none());

        let mut ctx = RequestContext::new("edit", &mut store, json!({}));
        assert_eq!(hooks.run_before(&mut ctx), 1);
        assert_eq!(store.get("seen").as_deref(), Some("edit"));
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let mut hooks = ActionHooks::new();
        hooks.before_action("first", ["create"], |ctx: &mut RequestContext<'_>| {
            ctx.params_mut()["order"] = json!(["first"]);
        });
        hooks.before_action("second", ["create"], |ctx: &mut RequestContext<'_>| {
            if let Some(order) = ctx.params_mut()["order"].as_array_mut() {
                order.push(json!("second"));
            }
        });

        assert_eq!(hooks.len(), 2);
        assert_eq!(
            hooks.hooks_for(&ActionName::from("create")),
            vec!["first", "second"]
        );
        assert!(hooks.hooks_for(&ActionName::from("new")).is_empty());

        let mut store = MemorySessionStore::new();
        let mut ctx = RequestContext::new("create", &mut store, json!({}));
        assert_eq!(hooks.run_before(&mut ctx), 2);
        assert_eq!(ctx.into_params()["order"], json!(["first", "second"]));
    }

    #[test]
    fn test_parts_mut_borrows_both() {
        let mut store = MemorySessionStore::new();
        store.set("k", "v".to_string());
        let mut ctx = RequestContext::new("create", &mut store, json!({"g": {}}));

        let (session, params) = ctx.parts_mut();
        params["g"]["k"] = json!(session.get("k"));

        assert_eq!(ctx.params()["g"]["k"], "v");
        assert!(ctx.session().contains("k"));
    }
}
