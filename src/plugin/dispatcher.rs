//! Routes plugin requests to the policy evaluator.

use crate::observability::metrics;
use crate::plugin::policy::{Decision, PolicyEvaluator, ProxyRequest};
use crate::plugin::protocol::{LifecycleEvent, Operation, Request, Response};
use crate::plugin::PluginError;

/// Decodes plugin envelopes and turns policy decisions into responses.
#[derive(Clone)]
pub struct Dispatcher {
    policy: PolicyEvaluator,
}

impl Dispatcher {
    pub fn new(policy: PolicyEvaluator) -> Self {
        Self { policy }
    }

    /// Handle one envelope. Denials are `Ok`; only bad input or internal
    /// failures are `Err`.
    pub fn handle(&self, request: Request) -> Result<Response, PluginError> {
        let op = Operation::from(request.op.as_str());
        let result = LifecycleEvent::decode(&op, request.content).map(|event| {
            let decision = self.evaluate(&event);
            (event, decision)
        });

        match result {
            Ok((event, Decision::Allow)) => {
                tracing::info!(op = %op, user = %event.user(), outcome = "allow", "Plugin request");
                metrics::record_plugin_request(op.metric_label(), "allow");
                Ok(Response::allow())
            }
            Ok((event, Decision::Deny(reason))) => {
                tracing::info!(
                    op = %op,
                    user = %event.user(),
                    outcome = "deny",
                    reason = reason.kind(),
                    detail = %reason,
                    "Plugin request"
                );
                metrics::record_plugin_request(op.metric_label(), "deny");
                Ok(Response::reject(reason.to_string()))
            }
            Err(e) => {
                if e.is_client_error() {
                    tracing::warn!(op = %op, outcome = "error", error = %e, "Plugin request");
                } else {
                    tracing::error!(op = %op, outcome = "error", error = %e, "Plugin request");
                }
                metrics::record_plugin_request(op.metric_label(), "error");
                Err(e)
            }
        }
    }

    fn evaluate(&self, event: &LifecycleEvent) -> Decision {
        match event {
            LifecycleEvent::Login(c) => {
                let token = c.metas.get("token").map(String::as_str).unwrap_or_default();
                self.policy.login(&c.user, token)
            }
            LifecycleEvent::NewProxy(c) => self.policy.new_proxy(&ProxyRequest {
                user: &c.user.user,
                proxy_type: &c.proxy_type,
                remote_port: c.remote_port,
                custom_domains: &c.custom_domains,
                subdomain: &c.subdomain,
            }),
            LifecycleEvent::Ping(c) => self.policy.ping(&c.user.user),
            LifecycleEvent::NewWorkConn(c) => self.policy.new_work_conn(&c.user.user),
            LifecycleEvent::NewUserConn(c) => self.policy.new_user_conn(&c.user.user),
        }
    }
}
