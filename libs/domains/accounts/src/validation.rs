//! Validator Registry.
//!
//! Format checks (email shape, lengths, ranges) come from `validator` derive
//! attributes on the request bodies. Everything else is a named [`Rule`]
//! registered once at startup and looked up by name when a body lists it in
//! [`Validated::rule_checks`].
//!
//! All failures are collected before returning. Remote rules (those that issue
//! an RPC) only run once every local check has passed, so an invalid body never
//! costs a round trip.

use async_trait::async_trait;
use axum_helpers::{AppError, ErrorKind, FieldErrors, RequestContext};
use rpc::accounts as pb;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::models::{
    ChangePasswordRequest, CreateAccountRequest, EmailRequest, LoginRequest, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, Role, UpdateAccountRequest,
};
use crate::rpc::AccountRpc;

pub const PASSWORD_RULE: &str = "password";
pub const ROLE_RULE: &str = "role";
pub const EMAIL_UNIQUE_RULE: &str = "email_unique";

pub const EMAIL_TAKEN_MESSAGE: &str = "email already registered";

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// A named check applied to one string field.
#[async_trait]
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    /// True when the rule talks to another service.
    fn is_remote(&self) -> bool {
        false
    }

    /// Every message describing why `value` fails; empty when it passes.
    async fn check(&self, ctx: &RequestContext, value: &str) -> Vec<String>;
}

/// One rule application requested by a body.
#[derive(Debug, Clone, Copy)]
pub struct RuleCheck<'a> {
    pub field: &'static str,
    pub rule: &'static str,
    pub value: &'a str,
}

impl<'a> RuleCheck<'a> {
    pub fn new(field: &'static str, rule: &'static str, value: &'a str) -> Self {
        Self { field, rule, value }
    }
}

/// Request bodies the registry knows how to validate.
pub trait Validated: Validate + Send + Sync {
    /// Named rules to apply, in report order.
    fn rule_checks(&self) -> Vec<RuleCheck<'_>> {
        Vec::new()
    }

    /// Checks spanning several fields.
    fn cross_field(&self, _errors: &mut FieldErrors) {}
}

pub struct ValidatorRegistry {
    rules: HashMap<&'static str, Arc<dyn Rule>>,
}

impl ValidatorRegistry {
    /// Registry without any rules.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry with the `password`, `role` and `email_unique` rules.
    pub fn new(rpc: Arc<dyn AccountRpc>) -> Self {
        Self::empty()
            .with_rule(PasswordRule)
            .with_rule(RoleRule)
            .with_rule(EmailUniqueRule::new(rpc))
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.insert(rule.name(), Arc::new(rule));
        self
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Apply a single named rule, pushing failures into `errors`.
    pub async fn check(
        &self,
        ctx: &RequestContext,
        check: RuleCheck<'_>,
        errors: &mut FieldErrors,
    ) {
        let Some(rule) = self.rules.get(check.rule) else {
            tracing::error!(rule = check.rule, field = check.field, "Unknown validation rule");
            errors.push(check.field, format!("unknown validation rule '{}'", check.rule));
            return;
        };
        for message in rule.check(ctx, check.value).await {
            errors.push(check.field, message);
        }
    }

    /// Validate `target`, returning every failing field.
    pub async fn validate<T: Validated>(
        &self,
        ctx: &RequestContext,
        target: &T,
    ) -> Result<(), FieldErrors> {
        match self.run(ctx, target).await {
            Outcome::Passed => Ok(()),
            Outcome::Invalid(errors) | Outcome::Collides(errors) => Err(errors),
        }
    }

    /// [`validate`](Self::validate) shaped for a handler.
    ///
    /// Local failures become `UnprocessableEntity` listing the fields. A
    /// failing remote rule means the value collides with existing state and
    /// becomes `Conflict` carrying the rule's message.
    pub async fn validate_request<T: Validated>(
        &self,
        ctx: &RequestContext,
        target: &T,
    ) -> Result<(), AppError> {
        match self.run(ctx, target).await {
            Outcome::Passed => Ok(()),
            Outcome::Invalid(errors) => Err(AppError::Validation(errors)),
            Outcome::Collides(errors) => {
                let message = errors
                    .iter()
                    .next()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| ErrorKind::Conflict.default_message().to_string());
                Err(AppError::Conflict(message))
            }
        }
    }

    async fn run<T: Validated>(&self, ctx: &RequestContext, target: &T) -> Outcome {
        let mut errors = match target.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let (remote, local): (Vec<_>, Vec<_>) = target
            .rule_checks()
            .into_iter()
            .partition(|c| self.rules.get(c.rule).is_some_and(|r| r.is_remote()));

        for check in local {
            self.check(ctx, check, &mut errors).await;
        }
        target.cross_field(&mut errors);
        if !errors.is_empty() {
            return Outcome::Invalid(errors);
        }

        for check in remote {
            self.check(ctx, check, &mut errors).await;
        }
        if errors.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Collides(errors)
        }
    }
}

enum Outcome {
    Passed,
    Invalid(FieldErrors),
    Collides(FieldErrors),
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("ValidatorRegistry").field("rules", &names).finish()
    }
}

// ============================================================================
// Rules
// ============================================================================

/// 8 to 128 characters with at least one letter and one digit.
pub struct PasswordRule;

#[async_trait]
impl Rule for PasswordRule {
    fn name(&self) -> &'static str {
        PASSWORD_RULE
    }

    async fn check(&self, _ctx: &RequestContext, value: &str) -> Vec<String> {
        let mut failures = Vec::new();
        let len = value.chars().count();
        if len < PASSWORD_MIN_LEN {
            failures.push(format!("must be at least {PASSWORD_MIN_LEN} characters"));
        }
        if len > PASSWORD_MAX_LEN {
            failures.push(format!("must be at most {PASSWORD_MAX_LEN} characters"));
        }
        if !value.chars().any(char::is_alphabetic) {
            failures.push("must contain at least one letter".to_string());
        }
        if !value.chars().any(|c| c.is_ascii_digit()) {
            failures.push("must contain at least one digit".to_string());
        }
        failures
    }
}

pub struct RoleRule;

#[async_trait]
impl Rule for RoleRule {
    fn name(&self) -> &'static str {
        ROLE_RULE
    }

    async fn check(&self, _ctx: &RequestContext, value: &str) -> Vec<String> {
        match value.parse::<Role>() {
            Ok(_) => Vec::new(),
            Err(_) => vec![role_message()],
        }
    }
}

pub fn role_message() -> String {
    let names: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
    format!("must be one of {}", names.join(", "))
}

/// Rejects addresses the account service already knows.
///
/// Fails open: the lookup is only a courtesy, Register and CreateAccount
/// enforce uniqueness upstream.
pub struct EmailUniqueRule {
    rpc: Arc<dyn AccountRpc>,
}

impl EmailUniqueRule {
    pub fn new(rpc: Arc<dyn AccountRpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl Rule for EmailUniqueRule {
    fn name(&self) -> &'static str {
        EMAIL_UNIQUE_RULE
    }

    fn is_remote(&self) -> bool {
        true
    }

    async fn check(&self, ctx: &RequestContext, value: &str) -> Vec<String> {
        let request = pb::FindByEmailRequest {
            email: value.to_string(),
            actor_id: 0,
        };
        match self.rpc.find_by_email(ctx, request).await {
            Ok(_) => vec![EMAIL_TAKEN_MESSAGE.to_string()],
            Err(e) if e.is(ErrorKind::NotFound) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Email uniqueness lookup failed, allowing");
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Bodies
// ============================================================================

impl Validated for RegisterRequest {
    fn rule_checks(&self) -> Vec<RuleCheck<'_>> {
        vec![
            RuleCheck::new("password", PASSWORD_RULE, &self.password),
            RuleCheck::new("email", EMAIL_UNIQUE_RULE, &self.email),
        ]
    }
}

impl Validated for CreateAccountRequest {
    fn rule_checks(&self) -> Vec<RuleCheck<'_>> {
        vec![
            RuleCheck::new("password", PASSWORD_RULE, &self.password),
            RuleCheck::new("role", ROLE_RULE, &self.role),
            RuleCheck::new("email", EMAIL_UNIQUE_RULE, &self.email),
        ]
    }
}

impl Validated for UpdateAccountRequest {
    fn rule_checks(&self) -> Vec<RuleCheck<'_>> {
        self.role
            .as_deref()
            .map(|role| RuleCheck::new("role", ROLE_RULE, role))
            .into_iter()
            .collect()
    }
}

impl Validated for ResetPasswordRequest {
    fn rule_checks(&self) -> Vec<RuleCheck<'_>> {
        vec![RuleCheck::new("new_password", PASSWORD_RULE, &self.new_password)]
    }
}

impl Validated for ChangePasswordRequest {
    fn rule_checks(&self) -> Vec<RuleCheck<'_>> {
        vec![RuleCheck::new("new_password", PASSWORD_RULE, &self.new_password)]
    }

    fn cross_field(&self, errors: &mut FieldErrors) {
        if !self.new_password.is_empty() && self.new_password == self.current_password {
            errors.push("new_password", "must differ from the current password");
        }
    }
}

impl Validated for LoginRequest {}
impl Validated for RefreshTokenRequest {}
impl Validated for EmailRequest {}
