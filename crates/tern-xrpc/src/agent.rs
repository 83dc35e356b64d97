//! Authenticated repository operations.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use tern_core::record::{ListRecordsOutput, Record, RecordValue, WriteOutput};
use tern_core::types::{AtUri, Did, Nsid, PdsUrl};
use tern_core::{Error, Result};

use crate::endpoints::{
    CREATE_RECORD, CreateRecordRequest, DELETE_RECORD, DeleteRecordRequest, GET_RECORD,
    GetRecordQuery, LIST_RECORDS, ListRecordsQuery, PUT_RECORD, PutRecordRequest,
};
use crate::session::XrpcSession;

/// XRPC error name returned when a record does not exist.
pub const RECORD_NOT_FOUND: &str = "RecordNotFound";

/// XRPC error name returned when a swap CID no longer matches.
pub const INVALID_SWAP: &str = "InvalidSwap";

/// The live transport of a signed-in user.
///
/// Every call uses a usable access token, refreshing the session first when
/// the current token is expired or about to expire.
#[derive(Debug, Clone)]
pub struct Agent {
    session: XrpcSession,
}

impl From<XrpcSession> for Agent {
    fn from(session: XrpcSession) -> Self {
        Self { session }
    }
}

impl Agent {
    pub fn did(&self) -> &Did {
        self.session.did()
    }

    pub fn pds(&self) -> &PdsUrl {
        self.session.pds()
    }

    pub fn session(&self) -> &XrpcSession {
        &self.session
    }

    /// Fetches one record, or `None` when the repository has no such record.
    #[instrument(skip(self), fields(did = %self.did()))]
    pub async fn get_record(&self, uri: &AtUri) -> Result<Option<Record>> {
        let query = GetRecordQuery {
            repo: uri.repo().as_str(),
            collection: uri.collection().as_str(),
            rkey: uri.rkey(),
        };
        let token = self.session.access_token().await?;

        match self
            .session
            .client()
            .query::<_, Record>(GET_RECORD, &query, Some(&token))
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(Error::Protocol(err)) if err.is_kind(RECORD_NOT_FOUND) => {
                debug!(%uri, "record not found");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Lists one page of records in `collection` of `repo`.
    #[instrument(skip(self), fields(did = %self.did()))]
    pub async fn list_records(
        &self,
        repo: &Did,
        collection: &Nsid,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<ListRecordsOutput> {
        let query = ListRecordsQuery {
            repo: repo.as_str(),
            collection: collection.as_str(),
            limit,
            cursor,
        };
        let token = self.session.access_token().await?;
        self.session
            .client()
            .query(LIST_RECORDS, &query, Some(&token))
            .await
    }

    /// Lists every record in `collection` of `repo`, following the cursor
    /// until the server stops returning one. A cursor seen before also ends
    /// the listing.
    #[instrument(skip(self), fields(did = %self.did()))]
    pub async fn list_all_records(&self, repo: &Did, collection: &Nsid) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .list_records(repo, collection, None, cursor.as_deref())
                .await?;
            records.extend(page.records);

            match page.cursor {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    warn!(cursor = %next, "server repeated a cursor; stopping");
                    break;
                }
                None => break,
            }
        }

        debug!(count = records.len(), "listed all records");
        Ok(records)
    }

    /// Creates a record in the signed-in user's repository.
    #[instrument(skip(self, value), fields(did = %self.did()))]
    pub async fn create_record(
        &self,
        collection: &Nsid,
        value: &RecordValue,
        rkey: Option<&str>,
    ) -> Result<WriteOutput> {
        let request = CreateRecordRequest {
            repo: self.did().as_str(),
            collection: collection.as_str(),
            record: value.as_value(),
            rkey,
        };
        let token = self.session.access_token().await?;
        self.session
            .client()
            .procedure(CREATE_RECORD, &request, Some(&token))
            .await
    }

    /// Creates or replaces the record at `collection`/`rkey`.
    ///
    /// With `swap_record`, the write only succeeds while the current record
    /// has that CID; otherwise the server answers with [`INVALID_SWAP`].
    #[instrument(skip(self, value), fields(did = %self.did()))]
    pub async fn put_record(
        &self,
        collection: &Nsid,
        rkey: &str,
        value: &RecordValue,
        swap_record: Option<&str>,
    ) -> Result<WriteOutput> {
        let request = PutRecordRequest {
            repo: self.did().as_str(),
            collection: collection.as_str(),
            rkey,
            record: value.as_value(),
            swap_record,
        };
        let token = self.session.access_token().await?;
        self.session
            .client()
            .procedure(PUT_RECORD, &request, Some(&token))
            .await
    }

    /// Deletes the record at `uri`.
    #[instrument(skip(self), fields(did = %self.did()))]
    pub async fn delete_record(&self, uri: &AtUri) -> Result<()> {
        let request = DeleteRecordRequest {
            repo: uri.repo().as_str(),
            collection: uri.collection().as_str(),
            rkey: uri.rkey(),
            swap_record: None,
        };
        let token = self.session.access_token().await?;
        self.session
            .client()
            .procedure_unit(DELETE_RECORD, &request, &token)
            .await
    }
}
