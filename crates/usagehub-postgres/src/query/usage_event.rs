//! Usage event repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::UsageEventRow;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for reading back usage events written downstream.
pub trait UsageEventRepository {
    /// Finds the events for an event id within an account.
    ///
    /// Event ids are only unique per account, so both keys are required.
    fn find_events_by_event_and_account(
        &mut self,
        event_id: &str,
        account_id: &str,
        scope: Option<&str>,
    ) -> impl Future<Output = PgResult<Vec<UsageEventRow>>> + Send;
}

impl UsageEventRepository for PgConnection {
    async fn find_events_by_event_and_account(
        &mut self,
        event_id: &str,
        account_id: &str,
        scope: Option<&str>,
    ) -> PgResult<Vec<UsageEventRow>> {
        use schema::usage_events::{self, dsl};

        let mut query = usage_events::table
            .filter(dsl::event_id.eq(event_id.to_owned()))
            .filter(dsl::account_id.eq(account_id.to_owned()))
            .into_boxed();
        if let Some(prefix) = scope {
            query = query.filter(dsl::account_or_prefix.eq(prefix.to_owned()));
        }

        query
            .select(UsageEventRow::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
