//! Session lifecycle and the shell's view of query execution.

use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::IntoRowsResultError;
use scylla::response::PagingState;
use scylla::value::Row;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, Credentials};
use crate::errors::{ConnectError, QueryError};
use crate::value::CellValue;

/// One page of the result of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage<C> {
    /// Column names, or `None` when the statement has no result set
    /// (DDL, most DML, `USE`).
    pub columns: Option<Vec<String>>,
    /// Rows of this page, values in column order.
    pub rows: Vec<Vec<CellValue>>,
    /// Where to continue from, if more pages follow.
    pub next: Option<C>,
}

impl<C> ResultPage<C> {
    /// A page of a statement that has no result set.
    pub fn no_result_set() -> Self {
        Self {
            columns: None,
            rows: Vec::new(),
            next: None,
        }
    }
}

/// Executes statement text on behalf of the shell.
///
/// A statement is executed by requesting its first page with `cursor` set
/// to `None`, then following [ResultPage::next] until it is `None`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Continuation token between pages.
    type Cursor: Send;
    /// Error of a single request. Never fatal to the shell.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches one page of the result of `statement`.
    async fn query_page(
        &self,
        statement: &str,
        cursor: Option<Self::Cursor>,
    ) -> Result<ResultPage<Self::Cursor>, Self::Error>;
}

/// Prepares a [SessionBuilder] for the given configuration.
///
/// The single contact point is `host:port`, the default execution profile
/// carries the fixed consistency, and a password authenticator is attached
/// only if [ConnectionConfig::credentials] yields some.
pub fn session_builder(
    config: &ConnectionConfig,
    tls: Arc<rustls::ClientConfig>,
) -> SessionBuilder {
    let profile = ExecutionProfile::builder()
        .consistency(config.consistency())
        .build();

    let builder = SessionBuilder::new()
        .known_node(config.contact_point())
        .tls_context(Some(tls))
        .default_execution_profile_handle(profile.into_handle());

    match config.credentials() {
        Some(Credentials { username, password }) => {
            debug!("Using password authentication as {username}");
            builder.user(username, password)
        }
        None => builder,
    }
}

/// Opens the one session the shell works with.
pub async fn connect(
    config: &ConnectionConfig,
    tls: Arc<rustls::ClientConfig>,
) -> Result<ShellSession, ConnectError> {
    let contact_point = config.contact_point();
    info!("Connecting to {contact_point}");

    let session = session_builder(config, tls)
        .build()
        .await
        .map_err(|source| ConnectError {
            contact_point: contact_point.clone(),
            source,
        })?;

    info!("Connected to {contact_point}");
    Ok(ShellSession { session })
}

/// The session owned by the shell for the whole run.
///
/// Dropping it closes every connection of the driver session; since the
/// shell owns exactly one, that happens exactly once, on whatever path the
/// program leaves by.
pub struct ShellSession {
    session: Session,
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        info!("Closing session");
    }
}

#[async_trait]
impl QueryExecutor for ShellSession {
    type Cursor = PagingState;
    type Error = QueryError;

    // Goes through the regular single-page path of the driver, so `USE`
    // switches the session keyspace and schema changes wait for agreement.
    async fn query_page(
        &self,
        statement: &str,
        cursor: Option<PagingState>,
    ) -> Result<ResultPage<PagingState>, QueryError> {
        let paging_state = cursor.unwrap_or_else(PagingState::start);
        let (result, paging_state_response) = self
            .session
            .query_single_page(statement, &[], paging_state)
            .await?;

        let rows_result = match result.into_rows_result() {
            Ok(rows_result) => rows_result,
            Err(IntoRowsResultError::ResultNotRows(_)) => return Ok(ResultPage::no_result_set()),
            Err(err) => return Err(err.into()),
        };

        let columns = rows_result
            .column_specs()
            .iter()
            .map(|spec| spec.name().to_owned())
            .collect();

        let rows = rows_result
            .rows::<Row>()?
            .map(|row| {
                row.map(|row| row.columns.into_iter().map(CellValue::from).collect())
            })
            .collect::<Result<Vec<Vec<CellValue>>, _>>()?;

        let next = match paging_state_response.into_paging_control_flow() {
            ControlFlow::Continue(paging_state) => Some(paging_state),
            ControlFlow::Break(()) => None,
        };

        Ok(ResultPage {
            columns: Some(columns),
            rows,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use scylla::cluster::KnownNode;
    use scylla::statement::Consistency;

    use super::session_builder;
    use crate::config::{parse_args, Command, ConnectionConfig, Credentials};
    use crate::tls;

    fn builder_for(config: &ConnectionConfig) -> scylla::client::session_builder::SessionBuilder {
        let tls = tls::assemble(config).unwrap();
        session_builder(config, tls)
    }

    #[test]
    fn single_contact_point_from_host_and_port() {
        let config = ConnectionConfig {
            host: "10.0.0.5".to_owned(),
            port: "9142".to_owned(),
            ..Default::default()
        };
        let builder = builder_for(&config);
        assert_eq!(
            builder.config.known_nodes,
            vec![KnownNode::Hostname("10.0.0.5:9142".to_owned())]
        );
    }

    #[test]
    fn tls_is_always_configured() {
        let builder = builder_for(&ConnectionConfig::default());
        assert!(builder.config.tls_context.is_some());
    }

    #[test]
    fn consistency_is_quorum() {
        let builder = builder_for(&ConnectionConfig::default());
        assert_eq!(
            builder
                .config
                .default_execution_profile_handle
                .to_profile()
                .get_consistency(),
            Consistency::Quorum
        );
    }

    #[test]
    fn authenticator_needs_both_username_and_password() {
        let anonymous = builder_for(&ConnectionConfig::default());
        assert!(anonymous.config.authenticator.is_none());

        let user_only = builder_for(&ConnectionConfig {
            user: "cassandra".to_owned(),
            ..Default::default()
        });
        assert!(user_only.config.authenticator.is_none());

        let password_only = builder_for(&ConnectionConfig {
            password: "cassandra".to_owned(),
            ..Default::default()
        });
        assert!(password_only.config.authenticator.is_none());

        let config = match parse_args(
            "scylla-shell",
            ["--user", "cassandra", "--password", "s3cret"],
        )
        .unwrap()
        {
            Command::Run(config) => config,
            Command::Help(usage) => panic!("unexpected help: {usage}"),
        };
        assert_eq!(
            config.credentials(),
            Some(Credentials {
                username: "cassandra".to_owned(),
                password: "s3cret".to_owned(),
            })
        );
        let both = builder_for(&config);
        assert!(both.config.authenticator.is_some());
    }

    #[test]
    fn lone_client_key_does_not_prevent_building() {
        let config = ConnectionConfig {
            client_key_path: Some(PathBuf::from("/nonexistent/client.key")),
            ..Default::default()
        };
        builder_for(&config);
    }
}
