use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::TutorError;
use crate::types::session::{ConversationSession, SessionMetadata, UserLevel};

/// How many archived sessions `list_history` returns at most.
pub const HISTORY_LIMIT: usize = 20;

const SESSION_SUFFIX: &str = ".session.json";

/// Persistence for conversation sessions.
pub trait SessionStore {
    fn create(&self, user_level: UserLevel) -> Result<ConversationSession, TutorError>;

    /// The most recently updated session that has not been archived.
    fn fetch_active(&self) -> Result<Option<ConversationSession>, TutorError>;

    fn fetch(&self, id: &str) -> Result<ConversationSession, TutorError>;

    /// Writes `session` back, bumping its `updated_at`.
    fn update(&self, session: &mut ConversationSession) -> Result<(), TutorError>;

    fn archive(&self, id: &str) -> Result<(), TutorError>;

    fn delete(&self, id: &str) -> Result<(), TutorError>;

    /// Archived sessions, newest first.
    fn list_history(&self) -> Result<Vec<SessionMetadata>, TutorError>;
}

/// One pretty-printed JSON document per session, named `<id>.session.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSessionStore {
    dir: PathBuf,
}

impl JsonDirSessionStore {
    /// Opens the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TutorError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TutorError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, TutorError> {
        // Ids become file names; reject anything that could leave the directory.
        if id.is_empty() || id.contains(&['/', '\\'][..]) || id.contains("..") {
            return Err(TutorError::not_found("session", id));
        }
        Ok(self.dir.join(format!("{id}{SESSION_SUFFIX}")))
    }

    /// Writes to a sibling temp file, then renames it over the session document.
    fn write_session(&self, session: &ConversationSession) -> Result<(), TutorError> {
        let path = self.path_for(&session.id)?;
        let tmp_path = path.with_extension("json.tmp");
        let file = File::create(&tmp_path).map_err(|e| TutorError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, session).map_err(TutorError::json)?;
        writer.flush().map_err(|e| TutorError::io(&tmp_path, e))?;
        drop(writer);
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(TutorError::io(&path, err));
        }
        Ok(())
    }

    fn read_session(path: &Path) -> Result<ConversationSession, TutorError> {
        let file = File::open(path).map_err(|e| TutorError::io(path, e))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(TutorError::json)
    }

    /// Every readable session in the directory. Unreadable files are skipped with a warning.
    fn load_all(&self) -> Result<Vec<ConversationSession>, TutorError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TutorError::io(&self.dir, e))?;
        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TutorError::io(&self.dir, e))?.path();
            let is_session = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(SESSION_SUFFIX));
            if !is_session {
                continue;
            }
            match Self::read_session(&path) {
                Ok(session) => sessions.push(session),
                Err(err) => tracing::warn!("Skipping unreadable session {}: {}", path.display(), err),
            }
        }
        Ok(sessions)
    }
}

impl SessionStore for JsonDirSessionStore {
    fn create(&self, user_level: UserLevel) -> Result<ConversationSession, TutorError> {
        let session = ConversationSession::new(Uuid::new_v4().to_string(), user_level);
        self.write_session(&session)?;
        tracing::info!(id = %session.id, "created session");
        Ok(session)
    }

    fn fetch_active(&self) -> Result<Option<ConversationSession>, TutorError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|s| s.is_active)
            .max_by_key(|s| s.updated_at))
    }

    fn fetch(&self, id: &str) -> Result<ConversationSession, TutorError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(TutorError::not_found("session", id));
        }
        Self::read_session(&path)
    }

    fn update(&self, session: &mut ConversationSession) -> Result<(), TutorError> {
        if !self.path_for(&session.id)?.exists() {
            return Err(TutorError::not_found("session", session.id.clone()));
        }
        session.updated_at = Utc::now();
        self.write_session(session)?;
        tracing::info!(id = %session.id, messages = session.chat_messages.len(), "updated session");
        Ok(())
    }

    fn archive(&self, id: &str) -> Result<(), TutorError> {
        let mut session = self.fetch(id)?;
        session.is_active = false;
        self.update(&mut session)?;
        tracing::info!(id, "archived session");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), TutorError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(TutorError::not_found("session", id));
        }
        fs::remove_file(&path).map_err(|e| TutorError::io(&path, e))?;
        tracing::info!(id, "deleted session");
        Ok(())
    }

    fn list_history(&self) -> Result<Vec<SessionMetadata>, TutorError> {
        let mut archived: Vec<ConversationSession> =
            self.load_all()?.into_iter().filter(|s| !s.is_active).collect();
        archived.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(archived
            .iter()
            .take(HISTORY_LIMIT)
            .map(ConversationSession::metadata)
            .collect())
    }
}
