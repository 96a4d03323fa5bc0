//! Time limits on decision requests

use std::future::Future;
use std::time::Duration;

use werewolf_domain::DefaultReason;

use crate::decision::DecisionError;

pub use shared::TimeLimits;

/// Kind of decision being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    NightAction,
    Utterance,
    LastWords,
    Vote,
    Retaliation,
}

impl Request {
    pub fn limit(&self, limits: &TimeLimits) -> Duration {
        match self {
            Request::NightAction => limits.night(),
            Request::Utterance => limits.discussion(),
            Request::Vote => limits.vote(),
            Request::LastWords | Request::Retaliation => limits.death(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::NightAction => "night_action",
            Request::Utterance => "utterance",
            Request::LastWords => "last_words",
            Request::Vote => "vote",
            Request::Retaliation => "retaliation",
        }
    }
}

/// Wait for a decision for at most `limit`
///
/// On expiry the pending future is dropped, so nothing it was doing can
/// reach the game afterwards.
pub async fn bounded<T, F>(limit: Duration, decision: F) -> Result<T, DefaultReason>
where
    F: Future<Output = Result<T, DecisionError>>,
{
    match tokio::time::timeout(limit, decision).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(DefaultReason::Error(err.to_string())),
        Err(_) => Err(DefaultReason::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_decision_in_time() {
        let result = bounded(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, DecisionError>(7)
        })
        .await;

        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decision_times_out() {
        let result = bounded(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, DecisionError>(7)
        })
        .await;

        assert_eq!(result, Err(DefaultReason::Timeout));
    }

    #[tokio::test]
    async fn test_decision_error() {
        let result: Result<u8, _> = bounded(Duration::from_secs(1), async {
            Err(DecisionError::Unavailable("model offline".into()))
        })
        .await;

        assert_eq!(
            result,
            Err(DefaultReason::Error(
                "decision maker unavailable: model offline".into()
            ))
        );
    }

    #[test]
    fn test_request_limits() {
        let limits = TimeLimits {
            night_ms: 1,
            discussion_ms: 2,
            vote_ms: 3,
            death_ms: 4,
        };
        assert_eq!(Request::NightAction.limit(&limits), Duration::from_millis(1));
        assert_eq!(Request::Utterance.limit(&limits), Duration::from_millis(2));
        assert_eq!(Request::Vote.limit(&limits), Duration::from_millis(3));
        assert_eq!(Request::LastWords.limit(&limits), Duration::from_millis(4));
        assert_eq!(Request::Retaliation.limit(&limits), Duration::from_millis(4));
    }
}
