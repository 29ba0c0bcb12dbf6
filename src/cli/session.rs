use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionActor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// What `desk` remembers between invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub server_url: String,
    pub token: Option<String>,
    pub actor: Option<SessionActor>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            actor: None,
            logged_in_at: None,
        }
    }
}

impl Session {
    pub fn current_actor(&self) -> Option<&SessionActor> {
        self.token.as_ref().and(self.actor.as_ref())
    }

    pub fn login(&mut self, actor: SessionActor, token: String) {
        self.actor = Some(actor);
        self.token = Some(token);
        self.logged_in_at = Some(Utc::now());
    }

    pub fn logout(&mut self) {
        self.actor = None;
        self.token = None;
        self.logged_in_at = None;
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_dir()?.join(SESSION_FILE))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_dir()?.join(SESSION_FILE))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file {}", path.display()))?;
        Ok(session)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// `$DESK_CONFIG_DIR`, else `~/.config/customer-desk`
pub fn config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(custom_dir) = std::env::var("DESK_CONFIG_DIR") {
        return Ok(PathBuf::from(custom_dir));
    }

    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
    Ok(PathBuf::from(home).join(".config").join("customer-desk"))
}
