//! Redirect decisions built from resolved options.

use super::transport::{ProxyRule, Transport};
use crate::error::{ClientError, Result};
use crate::options::{Opt, OptionMap, OptionValue, RedirectFn};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why a redirect was not followed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectRefused {
    /// Redirects are switched off. The engine hands back the 3xx response.
    #[error("redirect not allowed")]
    NotAllowed,
    /// The chain already holds the maximum number of requests.
    #[error("stopped after {0} redirects")]
    TooMany(usize),
    /// Refused by a custom policy.
    #[error("{0}")]
    Custom(String),
}

/// Decides, for every prospective redirect, whether to follow it.
#[derive(Clone)]
pub enum RedirectPolicy {
    /// Follow up to `max` hops when `follow` is set.
    Limited {
        /// `OPT_FOLLOWLOCATION`
        follow: bool,
        /// `OPT_MAXREDIRS`
        max: i64,
    },
    /// Caller-supplied decision function.
    Custom(RedirectFn),
}

impl RedirectPolicy {
    /// Build the policy for a resolved option map.
    ///
    /// A custom `OPT_REDIRECT_POLICY` is used verbatim; otherwise the policy is
    /// synthesized from `OPT_FOLLOWLOCATION` and `OPT_MAXREDIRS`, where missing
    /// values mean "do not follow".
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        match options.get(Opt::RedirectPolicy) {
            Some(OptionValue::RedirectPolicy(check)) => return Ok(RedirectPolicy::Custom(check.clone())),
            Some(_) => return Err(ClientError::InvalidRedirectPolicy),
            None => {}
        }

        let follow = match options.get(Opt::FollowLocation) {
            None => false,
            Some(OptionValue::Bool(b)) => *b,
            Some(_) => {
                return Err(ClientError::InvalidOptionType {
                    option: Opt::FollowLocation,
                    expected: "a bool",
                })
            }
        };

        let max = match options.get(Opt::MaxRedirs) {
            None => 0,
            Some(OptionValue::Int(n)) => *n,
            Some(_) => {
                return Err(ClientError::InvalidOptionType {
                    option: Opt::MaxRedirs,
                    expected: "an int",
                })
            }
        };

        Ok(RedirectPolicy::Limited { follow, max })
    }

    /// Decide whether to follow a redirect to `next`, given the requests
    /// already made in this chain (the original request first).
    pub fn check(&self, next: &Url, previous: &[Url]) -> std::result::Result<(), RedirectRefused> {
        match self {
            RedirectPolicy::Limited { follow, max } => {
                if !follow || *max <= 0 {
                    return Err(RedirectRefused::NotAllowed);
                }
                if previous.len() as u64 >= *max as u64 {
                    return Err(RedirectRefused::TooMany(previous.len()));
                }
                Ok(())
            }
            RedirectPolicy::Custom(check) => check(next, previous),
        }
    }

    /// Identity used to share engine clients between calls with the same policy.
    pub(crate) fn key(&self) -> RedirectKey {
        match self {
            RedirectPolicy::Limited { follow, max } => RedirectKey::Limited(*follow, *max),
            RedirectPolicy::Custom(check) => RedirectKey::Custom(Arc::as_ptr(check) as *const () as usize),
        }
    }

    /// The engine-side policy.
    ///
    /// With a proxy selector, every hop the policy allows is also run through
    /// the selector, so a hop whose proxy is refused fails instead of going
    /// out without it.
    pub(crate) fn to_engine(&self, transport: &Transport) -> reqwest::redirect::Policy {
        let policy = self.clone();
        let selector = matches!(transport.proxy(), ProxyRule::Selector(_)).then(|| transport.clone());
        reqwest::redirect::Policy::custom(move |attempt| {
            match policy.check(attempt.url(), attempt.previous()) {
                Ok(()) => match selector.as_ref().map(|t| t.select_proxy(attempt.url())) {
                    Some(Err(e)) => attempt.error(e),
                    _ => attempt.follow(),
                },
                Err(RedirectRefused::NotAllowed) => attempt.stop(),
                Err(refused) => attempt.error(refused),
            }
        })
    }
}

impl fmt::Debug for RedirectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectPolicy::Limited { follow, max } => f
                .debug_struct("Limited")
                .field("follow", follow)
                .field("max", max)
                .finish(),
            RedirectPolicy::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RedirectKey {
    Limited(bool, i64),
    Custom(usize),
}
