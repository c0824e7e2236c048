//! On-disk persistence for the transcript and the active domain profile.
//!
//! Plain JSON files under the platform data directory. System-generated
//! messages (SQL results, metrics, warnings) are transient and never
//! saved, matching how the transcript is rebuilt on startup.

use anyhow::{Context, Result};
use eq_core::{Message, Sender};
use eq_domains::DomainProfile;
use std::fs;
use std::path::PathBuf;

pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn resolve_default() -> Option<PathBuf> {
        dirs::data_dir().map(|base| base.join("edgequery"))
    }

    fn transcript_path(&self) -> PathBuf {
        self.dir.join("transcript.json")
    }

    fn profile_path(&self) -> PathBuf {
        self.dir.join("domain.json")
    }

    /// Loads saved messages; a missing file is an empty transcript.
    pub fn load_transcript(&self) -> Result<Vec<Message>> {
        let path = self.transcript_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let messages: Vec<Message> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(messages)
    }

    pub fn save_transcript(&self, messages: &[Message]) -> Result<()> {
        let durable: Vec<&Message> =
            messages.iter().filter(|m| m.sender != Sender::System).collect();
        let raw = serde_json::to_string_pretty(&durable)?;
        self.write(self.transcript_path(), &raw)
    }

    pub fn clear_transcript(&self) -> Result<()> {
        self.write(self.transcript_path(), "[]")
    }

    pub fn load_profile(&self) -> Result<Option<DomainProfile>> {
        let path = self.profile_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let profile: DomainProfile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(profile))
    }

    pub fn save_profile(&self, profile: &DomainProfile) -> Result<()> {
        let raw = serde_json::to_string_pretty(profile)?;
        self.write(self.profile_path(), &raw)
    }

    fn write(&self, path: PathBuf, raw: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eq_core::{Inbound, ServerFrame, Transcript};

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().join("edgequery"));
        (dir, storage)
    }

    #[test]
    fn missing_files_mean_empty_state() {
        let (_guard, storage) = storage();
        assert!(storage.load_transcript().unwrap().is_empty());
        assert!(storage.load_profile().unwrap().is_none());
    }

    #[test]
    fn transcript_round_trips_without_system_messages() {
        let (_guard, storage) = storage();
        let mut transcript = Transcript::new();
        transcript.push_user("how many rows?");
        transcript.apply(Inbound::Frame(ServerFrame::Chunk { content: "answer".into() }));
        transcript.apply(Inbound::Frame(ServerFrame::Complete { content: None }));
        transcript.apply(Inbound::Frame(ServerFrame::Warning {
            content: "SQL query detected but database connection is not available".into(),
        }));
        assert_eq!(transcript.messages().len(), 3);

        storage.save_transcript(transcript.messages()).unwrap();
        let loaded = storage.load_transcript().unwrap();
        // The system-sent warning is transient.
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|m| m.sender != Sender::System));
    }

    #[test]
    fn clear_truncates_the_saved_transcript() {
        let (_guard, storage) = storage();
        let mut transcript = Transcript::new();
        transcript.push_user("hello");
        storage.save_transcript(transcript.messages()).unwrap();
        storage.clear_transcript().unwrap();
        assert!(storage.load_transcript().unwrap().is_empty());
    }

    #[test]
    fn profile_round_trips() {
        let (_guard, storage) = storage();
        let profile = DomainProfile {
            name: "Energy".into(),
            description: "Energy market data.".into(),
            schema: "{}".into(),
            sample_queries: vec!["Show me all upgrade types".into()],
        };
        storage.save_profile(&profile).unwrap();
        assert_eq!(storage.load_profile().unwrap(), Some(profile));
    }
}
