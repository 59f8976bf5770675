//! Rules Module
//!
//! Ordered predicate chains deciding whether caching applies to a request
//! (claim rules) and whether a freshly computed response may be stored
//! (valid rules). Both chains are a short-circuit AND.
//!
//! Rules can only be appended through [`RuleSetBuilder`]; a built
//! [`RuleSet`] is immutable and shared by the engine.

mod header;

use std::fmt;

use axum::http::request::Parts;

use crate::engine::RecordedResponse;

pub use header::{
    no_cache, parse_max_age, AuthorizationRule, NoCache, NoCacheRule, RevalidationRule,
    NO_CACHE_HEADER,
};

// == Rule Trait ==
/// A single predicate over a request or a recorded response.
///
/// Returning `false` vetoes caching. Any `Fn(&C) -> bool` closure is a rule.
pub trait Rule<C>: Send + Sync {
    fn evaluate(&self, ctx: &C) -> bool;
}

impl<C, F> Rule<C> for F
where
    F: Fn(&C) -> bool + Send + Sync,
{
    fn evaluate(&self, ctx: &C) -> bool {
        self(ctx)
    }
}

// == Rule Set ==
/// Claim and valid chains used by one engine.
pub struct RuleSet {
    claim_rules: Vec<Box<dyn Rule<Parts>>>,
    valid_rules: Vec<Box<dyn Rule<RecordedResponse>>>,
}

impl RuleSet {
    /// Starts from the default rules.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// A rule set that claims every request and accepts every response.
    pub fn empty() -> Self {
        RuleSetBuilder::empty().build()
    }

    /// Returns whether caching applies to this request at all.
    ///
    /// `false` means the store is neither read nor written.
    pub fn claim(&self, request: &Parts) -> bool {
        self.claim_rules.iter().all(|rule| rule.evaluate(request))
    }

    /// Returns whether a freshly computed response may be stored.
    ///
    /// `false` still delivers the response, it is only not persisted.
    pub fn valid(&self, response: &RecordedResponse) -> bool {
        self.valid_rules.iter().all(|rule| rule.evaluate(response))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("claim_rules", &self.claim_rules.len())
            .field("valid_rules", &self.valid_rules.len())
            .finish()
    }
}

// == Builder ==
/// Collects rules before they are frozen into a [`RuleSet`].
pub struct RuleSetBuilder {
    claim_rules: Vec<Box<dyn Rule<Parts>>>,
    valid_rules: Vec<Box<dyn Rule<RecordedResponse>>>,
}

impl RuleSetBuilder {
    /// A builder without any rule.
    pub fn empty() -> Self {
        Self {
            claim_rules: Vec::new(),
            valid_rules: Vec::new(),
        }
    }

    /// Appends a claim rule, evaluated after the ones already added.
    pub fn claim_when(mut self, rule: impl Rule<Parts> + 'static) -> Self {
        self.claim_rules.push(Box::new(rule));
        self
    }

    /// Appends a valid rule, evaluated after the ones already added.
    pub fn valid_when(mut self, rule: impl Rule<RecordedResponse> + 'static) -> Self {
        self.valid_rules.push(Box::new(rule));
        self
    }

    pub fn build(self) -> RuleSet {
        RuleSet {
            claim_rules: self.claim_rules,
            valid_rules: self.valid_rules,
        }
    }
}

impl Default for RuleSetBuilder {
    /// Shared caches must not answer authorized or revalidating requests, and
    /// the no-cache marker opts a request or a response out.
    fn default() -> Self {
        Self::empty()
            .claim_when(AuthorizationRule)
            .claim_when(RevalidationRule)
            .claim_when(NoCacheRule)
            .valid_when(NoCacheRule)
    }
}
