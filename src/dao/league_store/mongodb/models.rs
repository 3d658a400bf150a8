use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    ArchivedStandingEntity, MatchEntity, MatchId, MatchStatus, NewMatchEntity, SeasonEntity,
    SeasonId, SeasonTeamEntity, SetEntity, StandingEntity, TeamEntity, TeamId,
};

pub const SEASON_COLLECTION_NAME: &str = "seasons";
pub const TEAM_COLLECTION_NAME: &str = "teams";
pub const SEASON_TEAM_COLLECTION_NAME: &str = "season_teams";
pub const MATCH_COLLECTION_NAME: &str = "matches";
pub const SET_COLLECTION_NAME: &str = "sets";
pub const STANDING_COLLECTION_NAME: &str = "standings";
pub const ARCHIVED_STANDING_COLLECTION_NAME: &str = "archived_standings";
pub const COUNTER_COLLECTION_NAME: &str = "counters";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSeasonDocument {
    #[serde(rename = "_id")]
    id: SeasonId,
    league_id: i64,
    name: String,
    start_date: DateTime,
    end_date: DateTime,
    #[serde(default)]
    archived: bool,
}

impl TryFrom<MongoSeasonDocument> for SeasonEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSeasonDocument) -> MongoResult<Self> {
        Ok(Self {
            id: value.id,
            league_id: value.league_id,
            name: value.name,
            start_date: date_from_bson(SEASON_COLLECTION_NAME, value.start_date)?,
            end_date: date_from_bson(SEASON_COLLECTION_NAME, value.end_date)?,
            archived: value.archived,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: TeamId,
    name: String,
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSeasonTeamDocument {
    season_id: SeasonId,
    team_id: TeamId,
    joined_on: DateTime,
}

impl From<SeasonTeamEntity> for MongoSeasonTeamDocument {
    fn from(value: SeasonTeamEntity) -> Self {
        Self {
            season_id: value.season_id,
            team_id: value.team_id,
            joined_on: date_to_bson(value.joined_on),
        }
    }
}

impl TryFrom<MongoSeasonTeamDocument> for SeasonTeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSeasonTeamDocument) -> MongoResult<Self> {
        Ok(Self {
            season_id: value.season_id,
            team_id: value.team_id,
            joined_on: date_from_bson(SEASON_TEAM_COLLECTION_NAME, value.joined_on)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: MatchId,
    season_id: SeasonId,
    home_team_id: TeamId,
    away_team_id: TeamId,
    scheduled_at: DateTime,
    venue: Option<String>,
    status: MatchStatus,
    winner_team_id: Option<TeamId>,
    #[serde(default)]
    home_sets_won: i64,
    #[serde(default)]
    away_sets_won: i64,
}

impl MongoMatchDocument {
    pub fn new(id: MatchId, value: NewMatchEntity) -> Self {
        Self::from(value.into_entity(id))
    }
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            season_id: value.season_id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            scheduled_at: datetime_to_bson(value.scheduled_at),
            venue: value.venue,
            status: value.status,
            winner_team_id: value.winner_team_id,
            home_sets_won: value.home_sets_won,
            away_sets_won: value.away_sets_won,
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        Ok(Self {
            id: value.id,
            season_id: value.season_id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            scheduled_at: datetime_from_bson(MATCH_COLLECTION_NAME, value.scheduled_at)?,
            venue: value.venue,
            status: value.status,
            winner_team_id: value.winner_team_id,
            home_sets_won: value.home_sets_won,
            away_sets_won: value.away_sets_won,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSetDocument {
    match_id: MatchId,
    set_number: i64,
    home_score: i64,
    away_score: i64,
}

impl From<SetEntity> for MongoSetDocument {
    fn from(value: SetEntity) -> Self {
        Self {
            match_id: value.match_id,
            set_number: i64::from(value.set_number),
            home_score: value.home_score,
            away_score: value.away_score,
        }
    }
}

impl TryFrom<MongoSetDocument> for SetEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSetDocument) -> MongoResult<Self> {
        let set_number = u32::try_from(value.set_number).map_err(|_| {
            MongoDaoError::decode(
                SET_COLLECTION_NAME,
                format!("set number {} out of range", value.set_number),
            )
        })?;
        Ok(Self {
            match_id: value.match_id,
            set_number,
            home_score: value.home_score,
            away_score: value.away_score,
        })
    }
}

/// Standings are stored flat so that `$inc` can target every counter directly.
pub type MongoStandingDocument = StandingEntity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoArchivedStandingDocument {
    archive_id: String,
    season_id: SeasonId,
    team_id: TeamId,
    rank: i64,
    archived_at: DateTime,
    matches_played: i64,
    wins: i64,
    losses: i64,
    sets_won: i64,
    sets_lost: i64,
    points_won: i64,
    points_lost: i64,
    league_points: i64,
}

impl From<ArchivedStandingEntity> for MongoArchivedStandingDocument {
    fn from(value: ArchivedStandingEntity) -> Self {
        let standing = value.standing;
        Self {
            archive_id: value.archive_id.to_string(),
            season_id: standing.season_id,
            team_id: standing.team_id,
            rank: i64::from(value.rank),
            archived_at: datetime_to_bson(value.archived_at),
            matches_played: standing.matches_played,
            wins: standing.wins,
            losses: standing.losses,
            sets_won: standing.sets_won,
            sets_lost: standing.sets_lost,
            points_won: standing.points_won,
            points_lost: standing.points_lost,
            league_points: standing.league_points,
        }
    }
}

impl TryFrom<MongoArchivedStandingDocument> for ArchivedStandingEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoArchivedStandingDocument) -> MongoResult<Self> {
        let collection = ARCHIVED_STANDING_COLLECTION_NAME;
        let archive_id = Uuid::parse_str(&value.archive_id)
            .map_err(|err| MongoDaoError::decode(collection, format!("archive id: {err}")))?;
        let rank = u32::try_from(value.rank)
            .map_err(|_| MongoDaoError::decode(collection, format!("rank {}", value.rank)))?;
        Ok(Self {
            archive_id,
            rank,
            archived_at: datetime_from_bson(collection, value.archived_at)?,
            standing: StandingEntity {
                season_id: value.season_id,
                team_id: value.team_id,
                matches_played: value.matches_played,
                wins: value.wins,
                losses: value.losses,
                sets_won: value.sets_won,
                sets_lost: value.sets_lost,
                points_won: value.points_won,
                points_lost: value.points_lost,
                league_points: value.league_points,
            },
        })
    }
}

pub fn datetime_to_bson(at: OffsetDateTime) -> DateTime {
    DateTime::from_millis((at.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn datetime_from_bson(collection: &'static str, at: DateTime) -> MongoResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(at.timestamp_millis()) * 1_000_000)
        .map_err(|err| MongoDaoError::decode(collection, format!("timestamp: {err}")))
}

/// Calendar dates are stored as midnight UTC.
fn date_to_bson(date: Date) -> DateTime {
    datetime_to_bson(date.midnight().assume_utc())
}

fn date_from_bson(collection: &'static str, at: DateTime) -> MongoResult<Date> {
    datetime_from_bson(collection, at).map(|at| at.date())
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{Document, deserialize_from_document, doc, serialize_to_document};
    use serde::de::DeserializeOwned;
    use time::{
        Duration,
        macros::{date, datetime},
    };

    use super::*;

    fn through_bson<T: Serialize + DeserializeOwned>(value: &T) -> (Document, T) {
        let document = serialize_to_document(value).unwrap();
        let decoded = deserialize_from_document(document.clone()).unwrap();
        (document, decoded)
    }

    fn finished_match() -> MatchEntity {
        MatchEntity {
            id: 42,
            season_id: 7,
            home_team_id: 3,
            away_team_id: 5,
            scheduled_at: datetime!(2025-10-04 18:30 UTC),
            venue: Some("Riverside Hall".into()),
            status: MatchStatus::Finished,
            winner_team_id: Some(5),
            home_sets_won: 1,
            away_sets_won: 3,
        }
    }

    #[test]
    fn match_survives_a_trip_through_bson() {
        let entity = finished_match();
        let (document, decoded) = through_bson(&MongoMatchDocument::from(entity.clone()));

        assert_eq!(document.get_i64("_id").unwrap(), 42);
        assert_eq!(document.get_str("status").unwrap(), "FINISHED");
        assert_eq!(MatchEntity::try_from(decoded).unwrap(), entity);
    }

    #[test]
    fn new_match_starts_without_an_outcome() {
        let document = MongoMatchDocument::new(
            9,
            NewMatchEntity {
                season_id: 7,
                home_team_id: 3,
                away_team_id: 5,
                scheduled_at: datetime!(2025-10-04 0:00 UTC),
                venue: None,
                status: MatchStatus::Scheduled,
            },
        );
        let entity = MatchEntity::try_from(document).unwrap();
        assert_eq!(entity.id, 9);
        assert_eq!(entity.winner_team_id, None);
        assert_eq!((entity.home_sets_won, entity.away_sets_won), (0, 0));
    }

    #[test]
    fn older_match_documents_default_set_counts() {
        let document = doc! {
            "_id": 1_i64,
            "season_id": 7_i64,
            "home_team_id": 3_i64,
            "away_team_id": 5_i64,
            "scheduled_at": DateTime::from_millis(0),
            "venue": null,
            "status": "SCHEDULED",
            "winner_team_id": null,
        };
        let decoded: MongoMatchDocument = deserialize_from_document(document).unwrap();
        let entity = MatchEntity::try_from(decoded).unwrap();
        assert_eq!(entity.scheduled_at, OffsetDateTime::UNIX_EPOCH);
        assert_eq!((entity.home_sets_won, entity.away_sets_won), (0, 0));
    }

    #[test]
    fn stored_status_matches_the_filter_strings() {
        for status in [
            MatchStatus::Scheduled,
            MatchStatus::Finished,
            MatchStatus::Processed,
        ] {
            let document = serialize_to_document(&MongoMatchDocument::from(MatchEntity {
                status,
                ..finished_match()
            }))
            .unwrap();
            assert_eq!(document.get_str("status").unwrap(), status.as_str());
        }
    }

    #[test]
    fn timestamps_keep_millisecond_precision() {
        let at = datetime!(2025-10-04 18:30:15.123456789 UTC);
        let stored = datetime_to_bson(at);
        assert_eq!(stored.timestamp_millis(), 1_759_602_615_123);

        let restored = datetime_from_bson(MATCH_COLLECTION_NAME, stored).unwrap();
        assert_eq!(restored, datetime!(2025-10-04 18:30:15.123 UTC));
        assert!(at - restored < Duration::milliseconds(1));
    }

    #[test]
    fn dates_are_stored_at_midnight_utc() {
        let stored = date_to_bson(date!(2025 - 09 - 01));
        assert_eq!(
            stored.timestamp_millis(),
            datetime!(2025-09-01 0:00 UTC).unix_timestamp() * 1_000
        );
        assert_eq!(
            date_from_bson(SEASON_COLLECTION_NAME, stored).unwrap(),
            date!(2025 - 09 - 01)
        );

        let evening =
            DateTime::from_millis(datetime!(2025-09-01 23:59 UTC).unix_timestamp() * 1_000);
        assert_eq!(
            date_from_bson(SEASON_COLLECTION_NAME, evening).unwrap(),
            date!(2025 - 09 - 01)
        );
    }

    #[test]
    fn negative_set_numbers_fail_to_decode() {
        let (_, decoded) = through_bson(&MongoSetDocument {
            match_id: 1,
            set_number: -1,
            home_score: 25,
            away_score: 20,
        });
        let err = SetEntity::try_from(decoded).unwrap_err();
        assert!(matches!(
            err,
            MongoDaoError::Decode {
                collection: SET_COLLECTION_NAME,
                ..
            }
        ));
    }

    #[test]
    fn archived_standing_survives_a_trip_through_bson() {
        let entity = ArchivedStandingEntity {
            archive_id: Uuid::new_v4(),
            rank: 2,
            archived_at: datetime!(2026-05-31 12:00 UTC),
            standing: StandingEntity {
                matches_played: 10,
                wins: 7,
                losses: 3,
                sets_won: 23,
                sets_lost: 12,
                points_won: 801,
                points_lost: 702,
                league_points: 21,
                ..StandingEntity::zeroed(7, 5)
            },
        };
        let (document, decoded) =
            through_bson(&MongoArchivedStandingDocument::from(entity.clone()));

        assert_eq!(
            document.get_str("archive_id").unwrap(),
            entity.archive_id.to_string()
        );
        assert_eq!(ArchivedStandingEntity::try_from(decoded).unwrap(), entity);
    }

    #[test]
    fn malformed_archive_ids_fail_to_decode() {
        let mut document = serialize_to_document(&MongoArchivedStandingDocument::from(
            ArchivedStandingEntity {
                archive_id: Uuid::nil(),
                rank: 1,
                archived_at: OffsetDateTime::UNIX_EPOCH,
                standing: StandingEntity::zeroed(1, 1),
            },
        ))
        .unwrap();
        document.insert("archive_id", "not-a-uuid");

        let decoded: MongoArchivedStandingDocument = deserialize_from_document(document).unwrap();
        assert!(matches!(
            ArchivedStandingEntity::try_from(decoded),
            Err(MongoDaoError::Decode { .. })
        ));
    }
}
