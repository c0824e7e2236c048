//! Delimiter-based section extraction.
//!
//! The assistant's answer embeds literal tags that split it into a
//! reasoning trace, a short explanation, and a final SQL query:
//!
//! ```text
//! <reasoning_start> ... <reasoning_end>
//! Explanation: ...
//! <final_sql_query_start> ... <final_sql_query_end>
//! ```
//!
//! Extraction is a pure function of the accumulated text plus a
//! streaming flag, recomputed from scratch on every call. It is total
//! over any input: missing or out-of-order tags degrade to empty
//! sections, never to an error.

pub const REASONING_START: &str = "<reasoning_start>";
pub const REASONING_END: &str = "<reasoning_end>";
pub const SQL_START: &str = "<final_sql_query_start>";
pub const SQL_END: &str = "<final_sql_query_end>";

/// Shared prefix of the SQL tags; a partially streamed closing tag shows
/// up as this prefix dangling at the end of the buffer.
const SQL_TAG_PREFIX: &str = "<final_sql_query";
const EXPLANATION_PREFIX: &str = "Explanation:";

/// How far from the end of the extracted SQL a dangling tag prefix is
/// still treated as an artifact of streaming rather than query text.
const DANGLING_TAG_WINDOW: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Reasoning,
    Explanation,
    Sql,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Reasoning, Section::Explanation, Section::Sql];
}

/// One boolean per section. Used both for "start tag observed" partial
/// flags and for reveal visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionFlags {
    pub reasoning: bool,
    pub explanation: bool,
    pub sql: bool,
}

impl SectionFlags {
    pub fn get(&self, section: Section) -> bool {
        match section {
            Section::Reasoning => self.reasoning,
            Section::Explanation => self.explanation,
            Section::Sql => self.sql,
        }
    }

    pub fn set(&mut self, section: Section, value: bool) {
        match section {
            Section::Reasoning => self.reasoning = value,
            Section::Explanation => self.explanation = value,
            Section::Sql => self.sql = value,
        }
    }

    /// Monotonic union: flips flags on, never off.
    pub fn merge(&mut self, other: SectionFlags) {
        self.reasoning |= other.reasoning;
        self.explanation |= other.explanation;
        self.sql |= other.sql;
    }

    pub fn any(&self) -> bool {
        self.reasoning || self.explanation || self.sql
    }
}

/// The three sections derived from a message's accumulated content.
/// Never stored; always recomputable from the content alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredContent {
    pub reasoning: String,
    pub explanation: String,
    pub sql: String,
    /// Start-tag-observed flags, independent of whether any content was
    /// extracted. These gate UI sections appearing before content exists.
    pub partial: SectionFlags,
}

impl StructuredContent {
    pub fn has_reasoning(&self) -> bool {
        !self.reasoning.is_empty()
    }

    pub fn has_explanation(&self) -> bool {
        !self.explanation.is_empty()
    }

    pub fn has_sql(&self) -> bool {
        !self.sql.is_empty()
    }

    pub fn has(&self, section: Section) -> bool {
        match section {
            Section::Reasoning => self.has_reasoning(),
            Section::Explanation => self.has_explanation(),
            Section::Sql => self.has_sql(),
        }
    }
}

/// Returns true when the raw text carries any of the section tags, i.e.
/// it should be rendered through the structured panels rather than as a
/// plain paragraph.
pub fn is_structured(content: &str) -> bool {
    content.contains(REASONING_START) || content.contains(SQL_START)
}

/// Derives the three sections from `content`.
///
/// While `is_streaming` is true an unterminated section is shown up to
/// the end of the buffer; once the message is final an unterminated
/// reasoning or explanation section is treated as absent. SQL is the
/// exception: a missing end tag still yields the tail of the buffer,
/// minus any dangling partially-streamed tag near the end.
pub fn extract_sections(content: &str, is_streaming: bool) -> StructuredContent {
    let mut out = StructuredContent {
        partial: SectionFlags {
            reasoning: content.contains(REASONING_START),
            explanation: content.contains(REASONING_END),
            sql: content.contains(SQL_START),
        },
        ..StructuredContent::default()
    };

    if let Some(start) = content.find(REASONING_START) {
        let body = &content[start + REASONING_START.len()..];
        if let Some(end) = body.find(REASONING_END) {
            out.reasoning = body[..end].trim().to_string();
        } else if is_streaming {
            out.reasoning = body.trim().to_string();
        }
    }

    // The explanation is anchored at the reasoning close tag, so it only
    // ever appears once reasoning has closed.
    if let Some(anchor) = content.find(REASONING_END) {
        let body = &content[anchor + REASONING_END.len()..];
        if let Some(end) = body.find(SQL_START) {
            out.explanation = strip_explanation_prefix(&body[..end]).to_string();
        } else if is_streaming {
            let mut text = strip_explanation_prefix(body);
            // Keep a partially-typed SQL tag from leaking into the
            // explanation while it streams in.
            if let Some(idx) = text.find(SQL_TAG_PREFIX) {
                text = text[..idx].trim_end();
            }
            out.explanation = text.to_string();
        }
    }

    if let Some(start) = content.find(SQL_START) {
        let body = &content[start + SQL_START.len()..];
        if let Some(end) = body.find(SQL_END) {
            out.sql = body[..end].trim().to_string();
        } else {
            let mut sql = body.trim();
            if let Some(idx) = sql.rfind(SQL_TAG_PREFIX) {
                if idx + DANGLING_TAG_WINDOW >= sql.len() {
                    sql = sql[..idx].trim_end();
                }
            }
            out.sql = sql.to_string();
        }
    }

    out
}

/// Trims the slice and drops a leading legacy `Explanation:` label,
/// case-insensitively.
fn strip_explanation_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.get(..EXPLANATION_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(EXPLANATION_PREFIX) => {
            trimmed[EXPLANATION_PREFIX.len()..].trim_start()
        }
        _ => trimmed,
    }
}
