use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub password: String,
    #[serde(default)]
    pub admin: bool,
}

/// Nickname-keyed account map backed by a JSON file. Registration rewrites
/// the whole file in place; there is no atomic-rename guarantee.
pub struct AccountStore {
    path: PathBuf,
    accounts: HashMap<String, Account>,
}

impl AccountStore {
    /// A missing file loads as an empty account set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ChatError> {
        let path = path.into();
        let accounts = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(ChatError::Storage(e)),
        };
        Ok(AccountStore { path, accounts })
    }

    pub fn register(&mut self, nickname: &str, password: &str) -> Result<(), ChatError> {
        if self.accounts.contains_key(nickname) {
            return Err(ChatError::DuplicateName);
        }
        self.accounts.insert(
            nickname.to_string(),
            Account {
                password: password.to_string(),
                admin: false,
            },
        );
        self.save()
    }

    pub fn authenticate(&self, nickname: &str, password: &str) -> Result<&Account, ChatError> {
        match self.accounts.get(nickname) {
            Some(account) if account.password == password => Ok(account),
            _ => Err(ChatError::InvalidCredentials),
        }
    }

    fn save(&self) -> Result<(), ChatError> {
        let data = serde_json::to_string_pretty(&self.accounts)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
