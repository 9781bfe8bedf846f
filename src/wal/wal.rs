use crate::models::event::EventPatch;
use crate::models::log::LogAction;
use crate::utils::time::{from_millis, to_millis};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Marker for an absent optional text field
const NONE_FIELD: &str = "-";

/// One committed store mutation.
///
/// Every variant carries the ids and timestamps assigned when it was first
/// applied, so replaying the log rebuilds identical tables.
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    CreateUser {
        id: u32,
        name: String,
        password: String,
        is_admin: bool,
        created_at: DateTime<Utc>,
    },
    DeleteUser {
        id: u32,
    },
    SetBalance {
        user_id: u32,
        balance: i64,
    },
    CreateEvent {
        id: u32,
        title: String,
        description: String,
        date: String,
    },
    UpdateEvent {
        id: u32,
        patch: EventPatch,
    },
    DeleteEvent {
        id: u32,
    },
    Vote {
        user_id: u32,
        event_id: u32,
        additional_players: u32,
        voted_at: DateTime<Utc>,
    },
    Unvote {
        user_id: u32,
        event_id: u32,
    },
    SetPaid {
        user_id: u32,
        event_id: u32,
        paid: bool,
        log_id: u64,
        logged_at: DateTime<Utc>,
    },
    AppendLog {
        id: u64,
        timestamp: DateTime<Utc>,
        user: String,
        action: LogAction,
        details: String,
    },
}

// Free text is hex-encoded so it may contain the field separator or newlines
fn encode_text(text: &str) -> String {
    hex::encode(text.as_bytes())
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex text field")?;
    String::from_utf8(bytes).context("Text field is not UTF-8")
}

fn encode_optional(text: &Option<String>) -> String {
    match text {
        Some(text) => encode_text(text),
        None => NONE_FIELD.to_string(),
    }
}

fn decode_optional(field: &str) -> Result<Option<String>> {
    if field == NONE_FIELD {
        Ok(None)
    } else {
        decode_text(field).map(Some)
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn parse_flag(field: &str) -> Result<bool> {
    match field {
        "1" => Ok(true),
        "0" => Ok(false),
        other => bail!("Invalid flag '{}'", other),
    }
}

fn parse_timestamp(field: &str) -> Result<DateTime<Utc>> {
    let millis = field.parse::<i64>().context("Invalid timestamp")?;
    from_millis(millis)
}

fn expect_fields(parts: &[&str], count: usize, kind: &str) -> Result<()> {
    if parts.len() != count {
        bail!("Invalid {} format: expected {} fields, got {}", kind, count, parts.len());
    }
    Ok(())
}

impl WalOperation {
    fn to_line(&self) -> String {
        match self {
            WalOperation::CreateUser {
                id,
                name,
                password,
                is_admin,
                created_at,
            } => format!(
                "CREATE_USER|{}|{}|{}|{}|{}",
                id,
                encode_text(name),
                encode_text(password),
                flag(*is_admin),
                to_millis(created_at)
            ),
            WalOperation::DeleteUser { id } => format!("DELETE_USER|{}", id),
            WalOperation::SetBalance { user_id, balance } => {
                format!("SET_BALANCE|{}|{}", user_id, balance)
            }
            WalOperation::CreateEvent {
                id,
                title,
                description,
                date,
            } => format!(
                "CREATE_EVENT|{}|{}|{}|{}",
                id,
                encode_text(title),
                encode_text(description),
                encode_text(date)
            ),
            WalOperation::UpdateEvent { id, patch } => format!(
                "UPDATE_EVENT|{}|{}|{}|{}",
                id,
                encode_optional(&patch.title),
                encode_optional(&patch.description),
                encode_optional(&patch.date)
            ),
            WalOperation::DeleteEvent { id } => format!("DELETE_EVENT|{}", id),
            WalOperation::Vote {
                user_id,
                event_id,
                additional_players,
                voted_at,
            } => format!(
                "VOTE|{}|{}|{}|{}",
                user_id,
                event_id,
                additional_players,
                to_millis(voted_at)
            ),
            WalOperation::Unvote { user_id, event_id } => {
                format!("UNVOTE|{}|{}", user_id, event_id)
            }
            WalOperation::SetPaid {
                user_id,
                event_id,
                paid,
                log_id,
                logged_at,
            } => format!(
                "SET_PAID|{}|{}|{}|{}|{}",
                user_id,
                event_id,
                flag(*paid),
                log_id,
                to_millis(logged_at)
            ),
            WalOperation::AppendLog {
                id,
                timestamp,
                user,
                action,
                details,
            } => format!(
                "LOG|{}|{}|{}|{}|{}",
                id,
                to_millis(timestamp),
                encode_text(user),
                encode_text(action.as_str()),
                encode_text(details)
            ),
        }
    }

    fn from_line(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"CREATE_USER") => {
                expect_fields(&parts, 6, "CREATE_USER")?;
                Ok(WalOperation::CreateUser {
                    id: parts[1].parse().context("Invalid user ID")?,
                    name: decode_text(parts[2])?,
                    password: decode_text(parts[3])?,
                    is_admin: parse_flag(parts[4])?,
                    created_at: parse_timestamp(parts[5])?,
                })
            }
            Some(&"DELETE_USER") => {
                expect_fields(&parts, 2, "DELETE_USER")?;
                Ok(WalOperation::DeleteUser {
                    id: parts[1].parse().context("Invalid user ID")?,
                })
            }
            Some(&"SET_BALANCE") => {
                expect_fields(&parts, 3, "SET_BALANCE")?;
                Ok(WalOperation::SetBalance {
                    user_id: parts[1].parse().context("Invalid user ID")?,
                    balance: parts[2].parse().context("Invalid balance")?,
                })
            }
            Some(&"CREATE_EVENT") => {
                expect_fields(&parts, 5, "CREATE_EVENT")?;
                Ok(WalOperation::CreateEvent {
                    id: parts[1].parse().context("Invalid event ID")?,
                    title: decode_text(parts[2])?,
                    description: decode_text(parts[3])?,
                    date: decode_text(parts[4])?,
                })
            }
            Some(&"UPDATE_EVENT") => {
                expect_fields(&parts, 5, "UPDATE_EVENT")?;
                Ok(WalOperation::UpdateEvent {
                    id: parts[1].parse().context("Invalid event ID")?,
                    patch: EventPatch {
                        title: decode_optional(parts[2])?,
                        description: decode_optional(parts[3])?,
                        date: decode_optional(parts[4])?,
                    },
                })
            }
            Some(&"DELETE_EVENT") => {
                expect_fields(&parts, 2, "DELETE_EVENT")?;
                Ok(WalOperation::DeleteEvent {
                    id: parts[1].parse().context("Invalid event ID")?,
                })
            }
            Some(&"VOTE") => {
                expect_fields(&parts, 5, "VOTE")?;
                Ok(WalOperation::Vote {
                    user_id: parts[1].parse().context("Invalid user ID")?,
                    event_id: parts[2].parse().context("Invalid event ID")?,
                    additional_players: parts[3]
                        .parse()
                        .context("Invalid additional players")?,
                    voted_at: parse_timestamp(parts[4])?,
                })
            }
            Some(&"UNVOTE") => {
                expect_fields(&parts, 3, "UNVOTE")?;
                Ok(WalOperation::Unvote {
                    user_id: parts[1].parse().context("Invalid user ID")?,
                    event_id: parts[2].parse().context("Invalid event ID")?,
                })
            }
            Some(&"SET_PAID") => {
                expect_fields(&parts, 6, "SET_PAID")?;
                Ok(WalOperation::SetPaid {
                    user_id: parts[1].parse().context("Invalid user ID")?,
                    event_id: parts[2].parse().context("Invalid event ID")?,
                    paid: parse_flag(parts[3])?,
                    log_id: parts[4].parse().context("Invalid log ID")?,
                    logged_at: parse_timestamp(parts[5])?,
                })
            }
            Some(&"LOG") => {
                expect_fields(&parts, 6, "LOG")?;
                let action = decode_text(parts[4])?
                    .parse::<LogAction>()
                    .map_err(|e| anyhow!(e))?;
                Ok(WalOperation::AppendLog {
                    id: parts[1].parse().context("Invalid log ID")?,
                    timestamp: parse_timestamp(parts[2])?,
                    user: decode_text(parts[3])?,
                    action,
                    details: decode_text(parts[5])?,
                })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one operation and flush it before returning
    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.to_line();
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("WAL file lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            // Skip empty lines
            if line.is_empty() {
                continue;
            }

            match WalOperation::from_line(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }
}
