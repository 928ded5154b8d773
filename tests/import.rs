//! Integration tests for CSV team import.

use tournament_overlay::{import_teams, read_teams, ImportError, Ladder, Team};

const TEAMS_CSV: &str = "\
acronym,full_name,flag,seed,username,rank,country_rank
USA,United States,US,#1,alice,120,30
USA,,,,bob,,
GER,Germany,DE,#2,carl,45,3
usa,United States,US,#1,dave,200,50
KOR,South Korea,KR,#3,,,
";

#[test]
fn rows_group_into_teams() {
    let teams = read_teams(TEAMS_CSV.as_bytes()).unwrap();
    assert_eq!(teams.len(), 3);

    let usa = &teams[0];
    assert_eq!(usa.acronym, "USA");
    assert_eq!(usa.seed, "#1");
    let names: Vec<_> = usa.players.iter().map(|p| p.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "dave"]);
    assert_eq!(usa.players[1].rank, None);
    assert_eq!(usa.average_rank(), Some(160.0));

    assert_eq!(teams[1].players[0].country_rank, Some(3));
    assert!(teams[2].players.is_empty());
}

#[test]
fn conflicting_details_are_rejected() {
    let csv = "acronym,full_name,flag,seed,username,rank,country_rank\n\
               USA,United States,US,#1,alice,1,1\n\
               USA,Untied States,US,#1,bob,2,2\n";
    match read_teams(csv.as_bytes()) {
        Err(ImportError::ConflictingTeam { row, acronym }) => {
            assert_eq!(row, 3);
            assert_eq!(acronym, "USA");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn blank_acronym_is_rejected() {
    let csv = "acronym,full_name,flag,seed,username,rank,country_rank\n,Nobody,,,x,,\n";
    assert!(matches!(
        read_teams(csv.as_bytes()),
        Err(ImportError::BlankAcronym { row: 2 })
    ));
}

#[test]
fn import_is_all_or_nothing() {
    let mut ladder = Ladder::new();
    ladder.add_team(Team::new("GER", "Germany")).unwrap();
    assert!(import_teams(&mut ladder, TEAMS_CSV.as_bytes()).is_err());
    assert_eq!(ladder.teams.len(), 1);

    let mut ladder = Ladder::new();
    assert_eq!(import_teams(&mut ladder, TEAMS_CSV.as_bytes()).unwrap(), 3);
    assert!(ladder.team("kor").is_some());
}
