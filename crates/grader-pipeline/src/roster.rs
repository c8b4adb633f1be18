use std::path::Path;

use anyhow::{bail, Context, Result};

/// One roster row: who to send tasks to and the shared secret proving the
/// task came from us.
#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    pub timestamp: String,
    pub email: String,
    pub endpoint: String,
    pub secret: String,
}

/// Parse a roster CSV of `timestamp,email,endpoint,secret` rows. A leading
/// header row is recognized by its `email` column and skipped. Endpoints and
/// secrets never contain commas, so plain splitting is enough here.
pub fn parse_roster(content: &str) -> Result<Vec<Participant>> {
    let mut participants = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            bail!("roster line {}: expected 4 fields, got {}", lineno + 1, fields.len());
        }
        if lineno == 0 && fields[1].eq_ignore_ascii_case("email") {
            continue;
        }
        participants.push(Participant {
            timestamp: fields[0].to_string(),
            email: fields[1].to_string(),
            endpoint: fields[2].to_string(),
            secret: fields[3].to_string(),
        });
    }
    Ok(participants)
}

pub fn load_roster(path: &Path) -> Result<Vec<Participant>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read roster {}", path.display()))?;
    parse_roster(&content)
}

/// Resolve a roster entry by email, used when a later round needs the
/// participant's endpoint and secret again.
pub fn find_participant<'a>(roster: &'a [Participant], email: &str) -> Option<&'a Participant> {
    roster.iter().find(|p| p.email == email)
}
