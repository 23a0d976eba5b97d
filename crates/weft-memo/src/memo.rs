use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Outcome classification for one retrieval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Transient marker handed to the caller that won the right to retrieve.
    /// Never stored in the shared index and never persisted.
    CacheLookup,
    /// The attempt has not reached a verdict: either it is in flight, or no
    /// dereferencer was available for the scheme.
    Undetermined,
    Success,
    /// The RDFizer completed but reported a semantic failure.
    Failure,
    /// No RDFizer is registered for the representation's media type.
    BadMediaType,
    DereferencerError,
    /// The document is already covered by a cached graph it redirects to.
    RedirectsToCached,
    ParseError,
}

impl Status {
    /// Terminal statuses get a timestamp and participate in expiration.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::CacheLookup | Status::Undetermined)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::CacheLookup => "CacheLookup",
            Status::Undetermined => "Undetermined",
            Status::Success => "Success",
            Status::Failure => "Failure",
            Status::BadMediaType => "BadMediaType",
            Status::DereferencerError => "DereferencerError",
            Status::RedirectsToCached => "RedirectsToCached",
            Status::ParseError => "ParseError",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = MemoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CacheLookup" => Ok(Status::CacheLookup),
            "Undetermined" => Ok(Status::Undetermined),
            "Success" => Ok(Status::Success),
            "Failure" => Ok(Status::Failure),
            "BadMediaType" => Ok(Status::BadMediaType),
            "DereferencerError" => Ok(Status::DereferencerError),
            "RedirectsToCached" => Ok(Status::RedirectsToCached),
            "ParseError" => Ok(Status::ParseError),
            other => Err(MemoParseError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Memoised record of the last retrieval attempt for a graph IRI.
///
/// Persisted as the object literal of the `…linkeddata#memo` predicate so a cold
/// index can be rebuilt from the store; the literal form is the `key=value;…`
/// encoding produced by [`Display`] and read back by [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    status: Status,
    timestamp: Option<SystemTime>,
    media_type: Option<String>,
    dereferencer: Option<String>,
    rdfizer: Option<String>,
}

impl Memo {
    pub fn new(status: Status) -> Self {
        Memo {
            status,
            timestamp: None,
            media_type: None,
            dereferencer: None,
            rdfizer: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// The moment the memo reached a terminal status. Absent while in flight.
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: SystemTime) {
        self.timestamp = Some(timestamp);
    }

    /// Age relative to `now`; `None` while in flight or if the clock ran backwards.
    pub fn age(&self, now: SystemTime) -> Option<Duration> {
        now.duration_since(self.timestamp?).ok()
    }

    /// The media type actually used for RDFization, post-negotiation.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn set_media_type(&mut self, media_type: impl Into<String>) {
        self.media_type = Some(media_type.into());
    }

    pub fn dereferencer(&self) -> Option<&str> {
        self.dereferencer.as_deref()
    }

    pub fn set_dereferencer(&mut self, name: impl Into<String>) {
        self.dereferencer = Some(name.into());
    }

    pub fn rdfizer(&self) -> Option<&str> {
        self.rdfizer.as_deref()
    }

    pub fn set_rdfizer(&mut self, name: impl Into<String>) {
        self.rdfizer = Some(name.into());
    }
}

impl Display for Memo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "status={}", self.status)?;
        if let Some(timestamp) = self.timestamp {
            let seconds = timestamp
                .duration_since(UNIX_EPOCH)
                .map(|age| age.as_secs())
                .unwrap_or(0);
            write!(f, ";timestamp={seconds}")?;
        }
        if let Some(media_type) = &self.media_type {
            if !media_type.is_empty() {
                write!(f, ";mediaType={media_type}")?;
            }
        }
        if let Some(dereferencer) = &self.dereferencer {
            write!(f, ";dereferencer={dereferencer}")?;
        }
        if let Some(rdfizer) = &self.rdfizer {
            write!(f, ";rdfizer={rdfizer}")?;
        }
        Ok(())
    }
}

impl FromStr for Memo {
    type Err = MemoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut status = None;
        let mut memo = Memo::new(Status::Undetermined);
        for pair in s.split(';').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| MemoParseError::MalformedPair(pair.to_owned()))?;
            match key {
                "status" => status = Some(value.parse::<Status>()?),
                "timestamp" => {
                    let seconds: u64 = value
                        .parse()
                        .map_err(|_| MemoParseError::MalformedPair(pair.to_owned()))?;
                    memo.timestamp = Some(UNIX_EPOCH + Duration::from_secs(seconds));
                }
                "mediaType" => memo.media_type = Some(value.to_owned()),
                "dereferencer" => memo.dereferencer = Some(value.to_owned()),
                "rdfizer" => memo.rdfizer = Some(value.to_owned()),
                // Tolerate fields written by a newer engine.
                _ => {}
            }
        }
        memo.status = status.ok_or(MemoParseError::MissingStatus)?;
        Ok(memo)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MemoParseError {
    #[error("unknown cache status `{0}`")]
    UnknownStatus(String),

    #[error("malformed memo field `{0}`")]
    MalformedPair(String),

    #[error("memo literal carries no status")]
    MissingStatus,
}
