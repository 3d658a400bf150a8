use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        ARCHIVED_STANDING_COLLECTION_NAME, COUNTER_COLLECTION_NAME, MATCH_COLLECTION_NAME,
        MongoArchivedStandingDocument, MongoMatchDocument, MongoSeasonDocument,
        MongoSeasonTeamDocument, MongoSetDocument, MongoStandingDocument, MongoTeamDocument,
        SEASON_COLLECTION_NAME, SEASON_TEAM_COLLECTION_NAME, SET_COLLECTION_NAME,
        STANDING_COLLECTION_NAME, TEAM_COLLECTION_NAME,
    },
};
use crate::dao::{
    league_store::{LeagueStore, LeagueTransaction},
    models::{
        ArchivedStandingEntity, MatchEntity, MatchId, MatchStatus, NewMatchEntity, SeasonEntity,
        SeasonId, SeasonTeamEntity, SetEntity, StandingDelta, StandingEntity, TeamEntity, TeamId,
    },
    storage::StorageResult,
};

const MATCH_SEQUENCE: &str = "matches";

#[derive(Clone)]
pub struct MongoLeagueStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    client: Client,
    database: Database,
}

impl MongoLeagueStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = establish_connection(&config).await?;

        let store = Self {
            inner: Arc::new(MongoInner { client, database }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ping(&self) -> MongoResult<()> {
        self.inner
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = &self.inner.database;
        let indexes: [(&'static str, &'static str, Document, bool); 5] = [
            (
                SEASON_TEAM_COLLECTION_NAME,
                "season_id,team_id",
                doc! {"season_id": 1, "team_id": 1},
                true,
            ),
            (
                MATCH_COLLECTION_NAME,
                "season_id,scheduled_at",
                doc! {"season_id": 1, "scheduled_at": 1},
                false,
            ),
            (
                SET_COLLECTION_NAME,
                "match_id,set_number",
                doc! {"match_id": 1, "set_number": 1},
                true,
            ),
            (
                STANDING_COLLECTION_NAME,
                "season_id,team_id",
                doc! {"season_id": 1, "team_id": 1},
                true,
            ),
            (
                ARCHIVED_STANDING_COLLECTION_NAME,
                "season_id,rank",
                doc! {"season_id": 1, "rank": 1},
                false,
            ),
        ];

        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(Some(unique)).build())
                .build();
            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }
}

impl LeagueStore for MongoLeagueStore {
    fn begin(&self) -> BoxFuture<'static, StorageResult<Box<dyn LeagueTransaction>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut session = store
                .inner
                .client
                .start_session()
                .await
                .map_err(|source| MongoDaoError::StartTransaction { source })?;
            session
                .start_transaction()
                .await
                .map_err(|source| MongoDaoError::StartTransaction { source })?;
            let database = store.inner.database.clone();
            Ok(Box::new(MongoLeagueTransaction { session, database }) as Box<dyn LeagueTransaction>)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}

/// Multi-document transaction bound to one client session.
///
/// The driver aborts the transaction when the session is dropped uncommitted.
pub struct MongoLeagueTransaction {
    session: ClientSession,
    database: Database,
}

impl MongoLeagueTransaction {
    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection::<T>(name)
    }

    async fn find_one<T>(&mut self, name: &'static str, filter: Document) -> MongoResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(name)
            .find_one(filter)
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::query(name, "find_one", source))
    }

    async fn find_many<T>(
        &mut self,
        name: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send + Sync,
    {
        let mut cursor = self
            .collection::<T>(name)
            .find(filter)
            .sort(sort)
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::query(name, "find", source))?;
        cursor
            .stream(&mut self.session)
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::query(name, "find", source))
    }

    async fn insert_many<T>(&mut self, name: &'static str, documents: Vec<T>) -> MongoResult<()>
    where
        T: serde::Serialize + Send + Sync,
    {
        if documents.is_empty() {
            return Ok(());
        }
        self.collection::<T>(name)
            .insert_many(documents)
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::query(name, "insert_many", source))?;
        Ok(())
    }

    async fn update_one(
        &mut self,
        name: &'static str,
        filter: Document,
        update: Document,
    ) -> MongoResult<()> {
        self.collection::<Document>(name)
            .update_one(filter, update)
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::query(name, "update_one", source))?;
        Ok(())
    }

    /// Reserve `count` consecutive match ids, returning the first one.
    async fn reserve_match_ids(&mut self, count: i64) -> MongoResult<MatchId> {
        let counter = self
            .collection::<Document>(COUNTER_COLLECTION_NAME)
            .find_one_and_update(doc! {"_id": MATCH_SEQUENCE}, doc! {"$inc": {"seq": count}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .session(&mut self.session)
            .await
            .map_err(|source| {
                MongoDaoError::query(COUNTER_COLLECTION_NAME, "find_one_and_update", source)
            })?
            .ok_or_else(|| MongoDaoError::decode(COUNTER_COLLECTION_NAME, "missing counter"))?;
        let last = counter
            .get_i64("seq")
            .map_err(|err| MongoDaoError::decode(COUNTER_COLLECTION_NAME, err.to_string()))?;
        Ok(last - count + 1)
    }

    async fn apply_delta(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
        delta: StandingDelta,
    ) -> MongoResult<StandingEntity> {
        let update = doc! {
            "$inc": {
                "matches_played": 1_i64,
                "wins": delta.wins,
                "losses": delta.losses,
                "sets_won": delta.sets_won,
                "sets_lost": delta.sets_lost,
                "points_won": delta.points_won,
                "points_lost": delta.points_lost,
                "league_points": delta.league_points,
            }
        };
        self.collection::<MongoStandingDocument>(STANDING_COLLECTION_NAME)
            .find_one_and_update(doc! {"season_id": season_id, "team_id": team_id}, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .session(&mut self.session)
            .await
            .map_err(|source| {
                MongoDaoError::query(STANDING_COLLECTION_NAME, "find_one_and_update", source)
            })?
            .ok_or_else(|| MongoDaoError::decode(STANDING_COLLECTION_NAME, "upsert returned nothing"))
    }
}

fn decode_all<D, E>(documents: Vec<D>) -> StorageResult<Vec<E>>
where
    E: TryFrom<D, Error = MongoDaoError>,
{
    documents
        .into_iter()
        .map(|document| E::try_from(document).map_err(Into::into))
        .collect()
}

impl LeagueTransaction for MongoLeagueTransaction {
    fn find_season(&mut self, id: SeasonId) -> BoxFuture<'_, StorageResult<Option<SeasonEntity>>> {
        Box::pin(async move {
            let document: Option<MongoSeasonDocument> =
                self.find_one(SEASON_COLLECTION_NAME, doc! {"_id": id}).await?;
            Ok(document.map(SeasonEntity::try_from).transpose()?)
        })
    }

    fn mark_season_archived(&mut self, id: SeasonId) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            self.update_one(
                SEASON_COLLECTION_NAME,
                doc! {"_id": id},
                doc! {"$set": {"archived": true}},
            )
            .await?;
            Ok(())
        })
    }

    fn find_team(&mut self, id: TeamId) -> BoxFuture<'_, StorageResult<Option<TeamEntity>>> {
        Box::pin(async move {
            let document: Option<MongoTeamDocument> =
                self.find_one(TEAM_COLLECTION_NAME, doc! {"_id": id}).await?;
            Ok(document.map(TeamEntity::from))
        })
    }

    fn season_roster(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<SeasonTeamEntity>>> {
        Box::pin(async move {
            let documents: Vec<MongoSeasonTeamDocument> = self
                .find_many(
                    SEASON_TEAM_COLLECTION_NAME,
                    doc! {"season_id": season_id},
                    doc! {"joined_on": 1, "team_id": 1},
                )
                .await?;
            decode_all(documents)
        })
    }

    fn find_season_team(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
    ) -> BoxFuture<'_, StorageResult<Option<SeasonTeamEntity>>> {
        Box::pin(async move {
            let document: Option<MongoSeasonTeamDocument> = self
                .find_one(
                    SEASON_TEAM_COLLECTION_NAME,
                    doc! {"season_id": season_id, "team_id": team_id},
                )
                .await?;
            Ok(document.map(SeasonTeamEntity::try_from).transpose()?)
        })
    }

    fn insert_season_team(
        &mut self,
        member: SeasonTeamEntity,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let document = MongoSeasonTeamDocument::from(member);
            self.insert_many(SEASON_TEAM_COLLECTION_NAME, vec![document])
                .await?;
            Ok(())
        })
    }

    fn count_season_matches(&mut self, season_id: SeasonId) -> BoxFuture<'_, StorageResult<u64>> {
        Box::pin(async move {
            let count = self
                .collection::<Document>(MATCH_COLLECTION_NAME)
                .count_documents(doc! {"season_id": season_id})
                .session(&mut self.session)
                .await
                .map_err(|source| {
                    MongoDaoError::query(MATCH_COLLECTION_NAME, "count_documents", source)
                })?;
            Ok(count)
        })
    }

    fn insert_matches(
        &mut self,
        matches: Vec<NewMatchEntity>,
    ) -> BoxFuture<'_, StorageResult<Vec<MatchId>>> {
        Box::pin(async move {
            if matches.is_empty() {
                return Ok(Vec::new());
            }
            let first = self.reserve_match_ids(matches.len() as i64).await?;
            let ids: Vec<MatchId> = (first..first + matches.len() as i64).collect();
            let documents = ids
                .iter()
                .zip(matches)
                .map(|(id, new_match)| MongoMatchDocument::new(*id, new_match))
                .collect();
            self.insert_many(MATCH_COLLECTION_NAME, documents).await?;
            Ok(ids)
        })
    }

    fn find_match(&mut self, id: MatchId) -> BoxFuture<'_, StorageResult<Option<MatchEntity>>> {
        Box::pin(async move {
            let document: Option<MongoMatchDocument> =
                self.find_one(MATCH_COLLECTION_NAME, doc! {"_id": id}).await?;
            Ok(document.map(MatchEntity::try_from).transpose()?)
        })
    }

    fn season_matches(
        &mut self,
        season_id: SeasonId,
        statuses: Vec<MatchStatus>,
    ) -> BoxFuture<'_, StorageResult<Vec<MatchEntity>>> {
        Box::pin(async move {
            let statuses: Vec<&str> = statuses.into_iter().map(MatchStatus::as_str).collect();
            let documents: Vec<MongoMatchDocument> = self
                .find_many(
                    MATCH_COLLECTION_NAME,
                    doc! {"season_id": season_id, "status": {"$in": statuses}},
                    doc! {"scheduled_at": 1, "_id": 1},
                )
                .await?;
            decode_all(documents)
        })
    }

    fn set_match_status(
        &mut self,
        id: MatchId,
        status: MatchStatus,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            self.update_one(
                MATCH_COLLECTION_NAME,
                doc! {"_id": id},
                doc! {"$set": {"status": status.as_str()}},
            )
            .await?;
            Ok(())
        })
    }

    fn save_match_outcome(&mut self, outcome: MatchEntity) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            self.update_one(
                MATCH_COLLECTION_NAME,
                doc! {"_id": outcome.id},
                doc! {"$set": {
                    "winner_team_id": outcome.winner_team_id,
                    "home_sets_won": outcome.home_sets_won,
                    "away_sets_won": outcome.away_sets_won,
                    "status": outcome.status.as_str(),
                }},
            )
            .await?;
            Ok(())
        })
    }

    fn match_sets(&mut self, match_id: MatchId) -> BoxFuture<'_, StorageResult<Vec<SetEntity>>> {
        Box::pin(async move {
            let documents: Vec<MongoSetDocument> = self
                .find_many(
                    SET_COLLECTION_NAME,
                    doc! {"match_id": match_id},
                    doc! {"set_number": 1},
                )
                .await?;
            decode_all(documents)
        })
    }

    fn insert_sets(&mut self, sets: Vec<SetEntity>) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let documents: Vec<MongoSetDocument> = sets.into_iter().map(Into::into).collect();
            self.insert_many(SET_COLLECTION_NAME, documents).await?;
            Ok(())
        })
    }

    fn insert_standing(&mut self, standing: StandingEntity) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            self.insert_many::<MongoStandingDocument>(STANDING_COLLECTION_NAME, vec![standing])
                .await?;
            Ok(())
        })
    }

    fn apply_standing_delta(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
        delta: StandingDelta,
    ) -> BoxFuture<'_, StorageResult<StandingEntity>> {
        Box::pin(async move { Ok(self.apply_delta(season_id, team_id, delta).await?) })
    }

    fn season_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<StandingEntity>>> {
        Box::pin(async move {
            let documents: Vec<MongoStandingDocument> = self
                .find_many(
                    STANDING_COLLECTION_NAME,
                    doc! {"season_id": season_id},
                    doc! {"team_id": 1},
                )
                .await?;
            Ok(documents)
        })
    }

    fn delete_season_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<u64>> {
        Box::pin(async move {
            let result = self
                .collection::<Document>(STANDING_COLLECTION_NAME)
                .delete_many(doc! {"season_id": season_id})
                .session(&mut self.session)
                .await
                .map_err(|source| {
                    MongoDaoError::query(STANDING_COLLECTION_NAME, "delete_many", source)
                })?;
            Ok(result.deleted_count)
        })
    }

    fn insert_archived_standings(
        &mut self,
        rows: Vec<ArchivedStandingEntity>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let documents: Vec<MongoArchivedStandingDocument> =
                rows.into_iter().map(Into::into).collect();
            self.insert_many(ARCHIVED_STANDING_COLLECTION_NAME, documents)
                .await?;
            Ok(())
        })
    }

    fn archived_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<ArchivedStandingEntity>>> {
        Box::pin(async move {
            let documents: Vec<MongoArchivedStandingDocument> = self
                .find_many(
                    ARCHIVED_STANDING_COLLECTION_NAME,
                    doc! {"season_id": season_id},
                    doc! {"rank": 1, "team_id": 1},
                )
                .await?;
            decode_all(documents)
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move {
            let mut this = *self;
            this.session
                .commit_transaction()
                .await
                .map_err(|source| MongoDaoError::Commit { source })?;
            Ok(())
        })
    }
}
