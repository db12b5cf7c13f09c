// ********* Connection settings ***********

use std::fmt::Display;

/// Where and as whom the votes are cast.
///
/// The key must belong to an admin account allowed to impersonate other users.
/// `api_username` is the account that owns the key. It is not sent with vote
/// requests, which carry the impersonated username instead.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ApiSettings {
    /// Base URL of the forum, without a trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub api_username: String,
}

impl ApiSettings {
    pub const DEFAULT_API_USERNAME: &'static str = "system";

    /// The URL of the voting endpoint.
    pub fn vote_url(&self) -> String {
        format!("{}/voting/vote", self.base_url.trim_end_matches('/'))
    }
}

// ********* Outcomes ***********

/// Number of characters of an unexpected response body kept in the outcome.
pub const BODY_SNIPPET_CHARS: usize = 200;

/// The result of one vote attempt.
///
/// The forum answers 422 both when the user already voted and when voting is
/// not enabled on the category. Both cases map to `AlreadyVotedOrDisabled`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Outcome {
    Voted,
    AlreadyVotedOrDisabled,
    PermissionDenied,
    NotFoundOrVotingDisabled,
    OtherHttpError { status: u16, body: String },
    /// No response was received.
    TransportError(String),
    /// The row could not be turned into a request. No call was made.
    InvalidRow(String),
}

/// How an outcome is counted in a tally.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TallyClass {
    Succeeded,
    Skipped,
    Errored,
}

impl Outcome {
    /// Maps the status code of a vote response.
    pub fn from_status(status: u16, body: &str) -> Outcome {
        match status {
            200 => Outcome::Voted,
            422 => Outcome::AlreadyVotedOrDisabled,
            403 => Outcome::PermissionDenied,
            404 => Outcome::NotFoundOrVotingDisabled,
            _ => Outcome::OtherHttpError {
                status,
                body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
            },
        }
    }

    pub fn class(&self) -> TallyClass {
        match self {
            Outcome::Voted => TallyClass::Succeeded,
            Outcome::AlreadyVotedOrDisabled => TallyClass::Skipped,
            Outcome::PermissionDenied
            | Outcome::NotFoundOrVotingDisabled
            | Outcome::OtherHttpError { .. }
            | Outcome::TransportError(_)
            | Outcome::InvalidRow(_) => TallyClass::Errored,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Voted => write!(f, "Vote cast successfully"),
            Outcome::AlreadyVotedOrDisabled => write!(f, "Already voted or voting not enabled"),
            Outcome::PermissionDenied => {
                write!(f, "Permission denied - check API key permissions")
            }
            Outcome::NotFoundOrVotingDisabled => {
                write!(f, "Topic not found or voting not enabled on category")
            }
            Outcome::OtherHttpError { status, body } => write!(f, "HTTP {}: {}", status, body),
            Outcome::TransportError(msg) => write!(f, "Request error: {}", msg),
            Outcome::InvalidRow(msg) => write!(f, "Invalid row: {}", msg),
        }
    }
}

// ********* Tally ***********

/// Running counters for a batch.
///
/// Invariant: `total == succeeded + skipped + errored`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Tally {
    pub total: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub errored: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: &Outcome) -> TallyClass {
        let class = outcome.class();
        self.total += 1;
        match class {
            TallyClass::Succeeded => self.succeeded += 1,
            TallyClass::Skipped => self.skipped += 1,
            TallyClass::Errored => self.errored += 1,
        }
        class
    }

    /// Counts a row previewed in a dry run.
    pub fn record_would_vote(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(Outcome::from_status(200, ""), Outcome::Voted);
        assert_eq!(
            Outcome::from_status(422, "{\"errors\":[]}"),
            Outcome::AlreadyVotedOrDisabled
        );
        assert_eq!(Outcome::from_status(403, ""), Outcome::PermissionDenied);
        assert_eq!(
            Outcome::from_status(404, ""),
            Outcome::NotFoundOrVotingDisabled
        );
        assert_eq!(
            Outcome::from_status(500, "boom"),
            Outcome::OtherHttpError {
                status: 500,
                body: "boom".to_string()
            }
        );
    }

    #[test]
    fn body_snippet_is_truncated_on_chars() {
        let body = "é".repeat(BODY_SNIPPET_CHARS + 50);
        match Outcome::from_status(502, &body) {
            Outcome::OtherHttpError { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.chars().count(), BODY_SNIPPET_CHARS);
            }
            x => panic!("unexpected outcome {:?}", x),
        }
    }

    #[test]
    fn messages() {
        assert_eq!(
            Outcome::PermissionDenied.to_string(),
            "Permission denied - check API key permissions"
        );
        assert_eq!(
            Outcome::OtherHttpError {
                status: 500,
                body: "oops".to_string()
            }
            .to_string(),
            "HTTP 500: oops"
        );
        assert_eq!(
            Outcome::TransportError("connection refused".to_string()).to_string(),
            "Request error: connection refused"
        );
    }

    #[test]
    fn tally_counts_each_row_once() {
        let mut tally = Tally::default();
        let outcomes = vec![
            Outcome::Voted,
            Outcome::AlreadyVotedOrDisabled,
            Outcome::PermissionDenied,
            Outcome::NotFoundOrVotingDisabled,
            Outcome::TransportError("timeout".to_string()),
            Outcome::InvalidRow("bad topic id".to_string()),
        ];
        for o in outcomes.iter() {
            tally.record(o);
        }
        assert_eq!(
            tally,
            Tally {
                total: 6,
                succeeded: 1,
                skipped: 1,
                errored: 4
            }
        );
        tally.record_would_vote();
        assert_eq!(tally.total, tally.succeeded + tally.skipped + tally.errored);
    }

    #[test]
    fn vote_url_drops_trailing_slash() {
        let settings = ApiSettings {
            base_url: "https://forum.example.com/community/".to_string(),
            api_key: "k".to_string(),
            api_username: ApiSettings::DEFAULT_API_USERNAME.to_string(),
        };
        assert_eq!(
            settings.vote_url(),
            "https://forum.example.com/community/voting/vote"
        );
    }
}
