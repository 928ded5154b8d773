//! CSV import of teams and rosters.
//!
//! Expected header: `acronym,full_name,flag,seed,username,rank,country_rank`.
//! One row per player; rows sharing an acronym build up a single team.

use crate::models::{Ladder, LadderError, Player, Team};
use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: acronym must not be blank")]
    BlankAcronym { row: usize },
    #[error("Row {row}: team '{acronym}' has conflicting details")]
    ConflictingTeam { row: usize, acronym: String },
    #[error(transparent)]
    Ladder(#[from] LadderError),
}

#[derive(Debug, Deserialize)]
struct TeamRow {
    acronym: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    flag: String,
    #[serde(default)]
    seed: String,
    #[serde(default)]
    username: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    rank: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    country_rank: Option<u32>,
}

/// Parse teams from CSV. Team order follows first appearance.
pub fn read_teams<R: Read>(reader: R) -> Result<Vec<Team>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut teams: Vec<Team> = Vec::new();

    for (line, record) in csv_reader.deserialize::<TeamRow>().enumerate() {
        // Header is line 1.
        let row = line + 2;
        let record = record?;
        if record.acronym.is_empty() {
            return Err(ImportError::BlankAcronym { row });
        }

        let idx = match teams.iter().position(|t| t.is(&record.acronym)) {
            Some(idx) => {
                let team = &teams[idx];
                let conflicts = (!record.full_name.is_empty() && record.full_name != team.full_name)
                    || (!record.flag.is_empty() && record.flag != team.flag)
                    || (!record.seed.is_empty() && record.seed != team.seed);
                if conflicts {
                    return Err(ImportError::ConflictingTeam {
                        row,
                        acronym: record.acronym,
                    });
                }
                idx
            }
            None => {
                let mut team = Team::new(record.acronym.clone(), record.full_name.clone());
                team.flag = record.flag.clone();
                team.seed = record.seed.clone();
                teams.push(team);
                teams.len() - 1
            }
        };

        if !record.username.is_empty() {
            teams[idx].add_player(Player {
                username: record.username,
                rank: record.rank,
                country_rank: record.country_rank,
            });
        }
    }

    Ok(teams)
}

/// Parse teams from CSV and add them to the ladder. Nothing is added if any team clashes.
pub fn import_teams<R: Read>(ladder: &mut Ladder, reader: R) -> Result<usize, ImportError> {
    let teams = read_teams(reader)?;
    for team in &teams {
        if ladder.team(&team.acronym).is_some() {
            return Err(LadderError::DuplicateTeam(team.acronym.clone()).into());
        }
    }
    let count = teams.len();
    for team in teams {
        ladder.add_team(team)?;
    }
    log::info!("Imported {} team(s)", count);
    Ok(count)
}
