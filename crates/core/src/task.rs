//! Task descriptor strings.
//!
//! A job's task names a translation target and a chapter range:
//!
//! ```text
//! web/{providerId}/{novelId}[?start=N][&end=N]
//! wenku/{novelId}/{volumeId}[?start=N][&end=N]
//! ```
//!
//! `start` is omitted when it is 0 and `end` is omitted when it is
//! [`RANGE_END_SENTINEL`], so the full range encodes as a bare path.
//! The range is half-open: chapter indices `start..end`.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// `end` value meaning "through the last chapter".
pub const RANGE_END_SENTINEL: u32 = 65535;

const KIND_WEB: &str = "web";
const KIND_WENKU: &str = "wenku";

/// Maximum length of a single path segment (provider, novel or volume id).
const MAX_SEGMENT_LEN: usize = 256;

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateRange {
    pub start: u32,
    pub end: u32,
}

impl Default for TranslateRange {
    fn default() -> Self {
        Self {
            start: 0,
            end: RANGE_END_SENTINEL,
        }
    }
}

impl TranslateRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Query string for this range, including the leading `?`, or empty
    /// when both bounds are at their defaults.
    pub fn query_string(&self) -> String {
        let mut params = Vec::with_capacity(2);
        if self.start > 0 {
            params.push(format!("start={}", self.start));
        }
        if self.end < RANGE_END_SENTINEL {
            params.push(format!("end={}", self.end));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }

    /// Whether a zero-based chapter index falls inside the range.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start as usize && index < self.end as usize
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.end > RANGE_END_SENTINEL {
            return Err(CoreError::Validation(format!(
                "Range end must not exceed {RANGE_END_SENTINEL}"
            )));
        }
        if self.start > self.end {
            return Err(CoreError::Validation(format!(
                "Range start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// What a task translates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateTarget {
    Web { provider_id: String, novel_id: String },
    Wenku { novel_id: String, volume_id: String },
}

impl fmt::Display for TranslateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web {
                provider_id,
                novel_id,
            } => write!(f, "{KIND_WEB}/{provider_id}/{novel_id}"),
            Self::Wenku {
                novel_id,
                volume_id,
            } => write!(f, "{KIND_WENKU}/{novel_id}/{volume_id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SakuraTask {
    pub target: TranslateTarget,
    pub range: TranslateRange,
}

impl SakuraTask {
    pub fn web(provider_id: &str, novel_id: &str, range: TranslateRange) -> Self {
        Self {
            target: TranslateTarget::Web {
                provider_id: provider_id.to_string(),
                novel_id: novel_id.to_string(),
            },
            range,
        }
    }

    pub fn wenku(novel_id: &str, volume_id: &str, range: TranslateRange) -> Self {
        Self {
            target: TranslateTarget::Wenku {
                novel_id: novel_id.to_string(),
                volume_id: volume_id.to_string(),
            },
            range,
        }
    }

    /// Human-readable summary shown next to the job.
    pub fn description(&self) -> String {
        let target = match &self.target {
            TranslateTarget::Web {
                provider_id,
                novel_id,
            } => format!("Web novel {provider_id}/{novel_id}"),
            TranslateTarget::Wenku {
                novel_id,
                volume_id,
            } => format!("Wenku novel {novel_id} volume {volume_id}"),
        };
        let TranslateRange { start, end } = self.range;
        match (start > 0, end < RANGE_END_SENTINEL) {
            (false, false) => target,
            (true, false) => format!("{target}, chapters {start}.."),
            (false, true) => format!("{target}, chapters ..{end}"),
            (true, true) => format!("{target}, chapters {start}..{end}"),
        }
    }
}

impl fmt::Display for SakuraTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.target, self.range.query_string())
    }
}

impl FromStr for SakuraTask {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, query) = match s.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (s, None),
        };

        let segments: Vec<&str> = path.split('/').collect();
        let [kind, first, second] = segments.as_slice() else {
            return Err(CoreError::Validation(format!(
                "Task must have the form kind/id/id, got '{path}'"
            )));
        };
        validate_segment(first)?;
        validate_segment(second)?;

        let target = match *kind {
            KIND_WEB => TranslateTarget::Web {
                provider_id: first.to_string(),
                novel_id: second.to_string(),
            },
            KIND_WENKU => TranslateTarget::Wenku {
                novel_id: first.to_string(),
                volume_id: second.to_string(),
            },
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown task kind '{other}'"
                )))
            }
        };

        let range = match query {
            Some(query) => parse_range(query)?,
            None => TranslateRange::default(),
        };
        range.validate()?;

        Ok(Self { target, range })
    }
}

fn validate_segment(segment: &str) -> Result<(), CoreError> {
    if segment.is_empty() {
        return Err(CoreError::Validation(
            "Task path segments must not be empty".to_string(),
        ));
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(CoreError::Validation(format!(
            "Task path segments must not exceed {MAX_SEGMENT_LEN} characters"
        )));
    }
    if segment
        .chars()
        .any(|c| c.is_whitespace() || c == '&' || c == '=' || c == '#')
    {
        return Err(CoreError::Validation(format!(
            "Invalid character in task path segment '{segment}'"
        )));
    }
    Ok(())
}

fn parse_range(query: &str) -> Result<TranslateRange, CoreError> {
    let mut start = None;
    let mut end = None;

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            CoreError::Validation(format!("Malformed task parameter '{pair}'"))
        })?;
        let slot = match key {
            "start" => &mut start,
            "end" => &mut end,
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown task parameter '{other}'"
                )))
            }
        };
        if slot.is_some() {
            return Err(CoreError::Validation(format!(
                "Duplicate task parameter '{key}'"
            )));
        }
        let parsed: u32 = value.parse().map_err(|_| {
            CoreError::Validation(format!("Task parameter '{key}' must be a number"))
        })?;
        *slot = Some(parsed);
    }

    Ok(TranslateRange {
        start: start.unwrap_or(0),
        end: end.unwrap_or(RANGE_END_SENTINEL),
    })
}
