//! `PostgreSQL` repository implementation for hosting records.

use super::{
    models::{HostRow, NewServerRow, ServerRow, ServerTypeRow},
    schema::{hosts, server_types, servers},
};
use crate::hosting::{
    domain::{
        EnvironmentVar, GameType, Host, HostName, PersistedServerData, PlayerName, PortRange,
        Server, ServerDraft, ServerId, ServerLifecycleState, ServerName, ServerType, ServerTypeId,
        Username, resolve_port,
    },
    ports::{HostingRepository, HostingRepositoryError, HostingRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by hosting adapters.
pub type HostingPgPool = Pool<ConnectionManager<PgConnection>>;

const SERVER_NAME_CONSTRAINT: &str = "idx_servers_name";
const SERVER_HOST_PORT_CONSTRAINT: &str = "idx_servers_host_port";

/// `PostgreSQL`-backed hosting repository.
///
/// Port allocation locks the host row with `SELECT ... FOR UPDATE` so that
/// concurrent creations on one host run one after another, while the
/// `(host_name, port)` unique index backs the invariant up.
#[derive(Debug, Clone)]
pub struct PostgresHostingRepository {
    pool: HostingPgPool,
}

impl PostgresHostingRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: HostingPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> HostingRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> HostingRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(HostingRepositoryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(HostingRepositoryError::persistence)?
    }
}

/// Transaction error carrying either a domain-level failure or a Diesel error
/// raised by the transaction machinery itself.
enum AllocationTxError {
    Repository(HostingRepositoryError),
    Diesel(DieselError),
}

impl From<DieselError> for AllocationTxError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl From<HostingRepositoryError> for AllocationTxError {
    fn from(err: HostingRepositoryError) -> Self {
        Self::Repository(err)
    }
}

#[async_trait]
impl HostingRepository for PostgresHostingRepository {
    async fn store_host(&self, host: &Host) -> HostingRepositoryResult<()> {
        let row = to_host_row(host);
        self.run_blocking(move |connection| {
            diesel::insert_into(hosts::table)
                .values(&row)
                .on_conflict(hosts::name)
                .do_update()
                .set((
                    hosts::enabled.eq(excluded(hosts::enabled)),
                    hosts::min_port.eq(excluded(hosts::min_port)),
                    hosts::max_port.eq(excluded(hosts::max_port)),
                    hosts::server_limit.eq(excluded(hosts::server_limit)),
                ))
                .execute(connection)
                .map_err(HostingRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_host(&self, name: &HostName) -> HostingRepositoryResult<Option<Host>> {
        let lookup = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = hosts::table
                .filter(hosts::name.eq(&lookup))
                .select(HostRow::as_select())
                .first::<HostRow>(connection)
                .optional()
                .map_err(HostingRepositoryError::persistence)?;
            row.map(row_to_host).transpose()
        })
        .await
    }

    async fn list_hosts(&self) -> HostingRepositoryResult<Vec<Host>> {
        self.run_blocking(move |connection| {
            let rows = hosts::table
                .order(hosts::name.asc())
                .select(HostRow::as_select())
                .load::<HostRow>(connection)
                .map_err(HostingRepositoryError::persistence)?;
            rows.into_iter().map(row_to_host).collect()
        })
        .await
    }

    async fn store_server_type(&self, server_type: &ServerType) -> HostingRepositoryResult<()> {
        let name = server_type.name().to_owned();
        let version = server_type.version().to_owned();
        let row = to_server_type_row(server_type)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(server_types::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        HostingRepositoryError::DuplicateServerType {
                            name: name.clone(),
                            version: version.clone(),
                        }
                    }
                    _ => HostingRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_server_type(
        &self,
        id: ServerTypeId,
    ) -> HostingRepositoryResult<Option<ServerType>> {
        self.run_blocking(move |connection| {
            let row = server_types::table
                .filter(server_types::id.eq(id.into_inner()))
                .select(ServerTypeRow::as_select())
                .first::<ServerTypeRow>(connection)
                .optional()
                .map_err(HostingRepositoryError::persistence)?;
            row.map(row_to_server_type).transpose()
        })
        .await
    }

    async fn find_server_type_by_name(
        &self,
        name: &str,
        version: &str,
    ) -> HostingRepositoryResult<Option<ServerType>> {
        let lookup_name = name.to_owned();
        let lookup_version = version.to_owned();
        self.run_blocking(move |connection| {
            let row = server_types::table
                .filter(server_types::name.eq(&lookup_name))
                .filter(server_types::version.eq(&lookup_version))
                .select(ServerTypeRow::as_select())
                .first::<ServerTypeRow>(connection)
                .optional()
                .map_err(HostingRepositoryError::persistence)?;
            row.map(row_to_server_type).transpose()
        })
        .await
    }

    async fn list_server_types(&self) -> HostingRepositoryResult<Vec<ServerType>> {
        self.run_blocking(move |connection| {
            let rows = server_types::table
                .order((server_types::name.asc(), server_types::version.asc()))
                .select(ServerTypeRow::as_select())
                .load::<ServerTypeRow>(connection)
                .map_err(HostingRepositoryError::persistence)?;
            rows.into_iter().map(row_to_server_type).collect()
        })
        .await
    }

    async fn allocate_and_store(&self, draft: ServerDraft) -> HostingRepositoryResult<Server> {
        self.run_blocking(move |connection| {
            connection
                .transaction::<Server, AllocationTxError, _>(|transaction| {
                    allocate_in_transaction(transaction, draft)
                })
                .map_err(|err| match err {
                    AllocationTxError::Repository(inner) => inner,
                    AllocationTxError::Diesel(inner) => HostingRepositoryError::persistence(inner),
                })
        })
        .await
    }

    async fn update_server(&self, server: &Server) -> HostingRepositoryResult<()> {
        let server_id = server.id().into_inner();
        let lifecycle_state = server.lifecycle_state().as_str().to_owned();
        let game_type = server.game_type().code();
        let operators = serde_json::to_value(server.operators())
            .map_err(HostingRepositoryError::persistence)?;
        let updated_at = server.updated_at();

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(servers::table.filter(servers::id.eq(server_id)))
                .set((
                    servers::lifecycle_state.eq(&lifecycle_state),
                    servers::game_type.eq(game_type),
                    servers::operators.eq(&operators),
                    servers::updated_at.eq(updated_at),
                ))
                .execute(connection)
                .map_err(HostingRepositoryError::persistence)?;

            if updated_count == 0 {
                return Err(HostingRepositoryError::ServerNotFound(ServerId::from_uuid(
                    server_id,
                )));
            }
            Ok(())
        })
        .await
    }

    async fn find_server(&self, name: &ServerName) -> HostingRepositoryResult<Option<Server>> {
        let lookup = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = servers::table
                .filter(servers::name.eq(&lookup))
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()
                .map_err(HostingRepositoryError::persistence)?;
            row.map(row_to_server).transpose()
        })
        .await
    }

    async fn list_servers(&self) -> HostingRepositoryResult<Vec<Server>> {
        self.run_blocking(move |connection| {
            let rows = servers::table
                .order((servers::created_at.asc(), servers::name.asc()))
                .select(ServerRow::as_select())
                .load::<ServerRow>(connection)
                .map_err(HostingRepositoryError::persistence)?;
            rows.into_iter().map(row_to_server).collect()
        })
        .await
    }

    async fn list_servers_by_owner(
        &self,
        owner: &Username,
    ) -> HostingRepositoryResult<Vec<Server>> {
        let lookup = owner.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = servers::table
                .filter(servers::owner.eq(&lookup))
                .order((servers::created_at.asc(), servers::name.asc()))
                .select(ServerRow::as_select())
                .load::<ServerRow>(connection)
                .map_err(HostingRepositoryError::persistence)?;
            rows.into_iter().map(row_to_server).collect()
        })
        .await
    }

    async fn count_servers_on_host(&self, host: &HostName) -> HostingRepositoryResult<usize> {
        let lookup = host.as_str().to_owned();
        self.run_blocking(move |connection| {
            let count = servers::table
                .filter(servers::host_name.eq(&lookup))
                .count()
                .get_result::<i64>(connection)
                .map_err(HostingRepositoryError::persistence)?;
            usize::try_from(count).map_err(HostingRepositoryError::invalid_persisted_data)
        })
        .await
    }

    async fn count_servers_by_owner(&self, owner: &Username) -> HostingRepositoryResult<usize> {
        let lookup = owner.as_str().to_owned();
        self.run_blocking(move |connection| {
            let count = servers::table
                .filter(servers::owner.eq(&lookup))
                .count()
                .get_result::<i64>(connection)
                .map_err(HostingRepositoryError::persistence)?;
            usize::try_from(count).map_err(HostingRepositoryError::invalid_persisted_data)
        })
        .await
    }

    async fn delete_server(&self, id: ServerId) -> HostingRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(servers::table.filter(servers::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(HostingRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(HostingRepositoryError::ServerNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn allocate_in_transaction(
    connection: &mut PgConnection,
    draft: ServerDraft,
) -> Result<Server, AllocationTxError> {
    let host_name = draft.host().as_str().to_owned();

    let locked_host = hosts::table
        .filter(hosts::name.eq(&host_name))
        .select(HostRow::as_select())
        .for_update()
        .load::<HostRow>(connection)?
        .into_iter()
        .next()
        .ok_or_else(|| HostingRepositoryError::HostNotFound(draft.host().clone()))?;
    let host = row_to_host(locked_host)?;

    let assigned: BTreeSet<u16> = servers::table
        .filter(servers::host_name.eq(&host_name))
        .select(servers::port)
        .load::<i32>(connection)?
        .into_iter()
        .filter_map(|port| u16::try_from(port).ok())
        .collect();

    let port = resolve_port(&host, draft.pinned_port(), &assigned)
        .map_err(HostingRepositoryError::Allocation)?;
    let server = Server::provision(draft, port);
    let row = to_new_server_row(&server)?;

    diesel::insert_into(servers::table)
        .values(&row)
        .execute(connection)
        .map_err(|err| map_server_insert_error(err, &server))?;

    Ok(server)
}

fn map_server_insert_error(err: DieselError, server: &Server) -> HostingRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if constraint_is(info.as_ref(), SERVER_NAME_CONSTRAINT) =>
        {
            HostingRepositoryError::DuplicateServerName(server.name().clone())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if constraint_is(info.as_ref(), SERVER_HOST_PORT_CONSTRAINT) =>
        {
            HostingRepositoryError::PortConflict {
                host: server.host().clone(),
                port: server.port(),
            }
        }
        _ => HostingRepositoryError::persistence(err),
    }
}

fn constraint_is(info: &dyn DatabaseErrorInformation, expected: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == expected)
}

fn to_host_row(host: &Host) -> HostRow {
    let range = host.port_range();
    HostRow {
        name: host.name().as_str().to_owned(),
        enabled: host.is_enabled(),
        min_port: i32::from(range.min_port()),
        max_port: i32::from(range.max_port()),
        server_limit: i32::try_from(host.server_limit()).unwrap_or(i32::MAX),
    }
}

fn row_to_host(row: HostRow) -> HostingRepositoryResult<Host> {
    let HostRow {
        name,
        enabled,
        min_port,
        max_port,
        server_limit,
    } = row;

    let parsed_name = HostName::new(name).map_err(HostingRepositoryError::invalid_persisted_data)?;
    let parsed_min =
        u16::try_from(min_port).map_err(HostingRepositoryError::invalid_persisted_data)?;
    let parsed_max =
        u16::try_from(max_port).map_err(HostingRepositoryError::invalid_persisted_data)?;
    let range = PortRange::new(parsed_min, parsed_max)
        .map_err(HostingRepositoryError::invalid_persisted_data)?;
    let parsed_limit =
        u32::try_from(server_limit).map_err(HostingRepositoryError::invalid_persisted_data)?;

    Ok(Host::new(parsed_name, range, parsed_limit).with_enabled(enabled))
}

fn to_server_type_row(server_type: &ServerType) -> HostingRepositoryResult<ServerTypeRow> {
    let environment = serde_json::to_value(server_type.environment())
        .map_err(HostingRepositoryError::persistence)?;
    Ok(ServerTypeRow {
        id: server_type.id().into_inner(),
        name: server_type.name().to_owned(),
        version: server_type.version().to_owned(),
        docker_image: server_type.docker_image().to_owned(),
        environment,
        enabled: server_type.is_enabled(),
    })
}

fn row_to_server_type(row: ServerTypeRow) -> HostingRepositoryResult<ServerType> {
    let environment: Vec<EnvironmentVar> = serde_json::from_value(row.environment)
        .map_err(HostingRepositoryError::invalid_persisted_data)?;
    let server_type = ServerType::with_id(
        ServerTypeId::from_uuid(row.id),
        row.name,
        row.version,
        row.docker_image,
    )
    .map_err(HostingRepositoryError::invalid_persisted_data)?;
    Ok(server_type
        .with_environment(environment)
        .with_enabled(row.enabled))
}

fn to_new_server_row(server: &Server) -> HostingRepositoryResult<NewServerRow> {
    let operators =
        serde_json::to_value(server.operators()).map_err(HostingRepositoryError::persistence)?;
    Ok(NewServerRow {
        id: server.id().into_inner(),
        name: server.name().as_str().to_owned(),
        owner: server.owner().as_str().to_owned(),
        host_name: server.host().as_str().to_owned(),
        port: i32::from(server.port()),
        server_type_id: server.server_type().into_inner(),
        game_type: server.game_type().code(),
        operators,
        lifecycle_state: server.lifecycle_state().as_str().to_owned(),
        created_at: server.created_at(),
        updated_at: server.updated_at(),
    })
}

fn row_to_server(row: ServerRow) -> HostingRepositoryResult<Server> {
    let ServerRow {
        id,
        name,
        owner,
        host_name,
        port,
        server_type_id,
        game_type,
        operators,
        lifecycle_state,
        created_at,
        updated_at,
    } = row;

    let data = PersistedServerData {
        id: ServerId::from_uuid(id),
        name: ServerName::new(name).map_err(HostingRepositoryError::invalid_persisted_data)?,
        owner: Username::new(owner).map_err(HostingRepositoryError::invalid_persisted_data)?,
        host: HostName::new(host_name).map_err(HostingRepositoryError::invalid_persisted_data)?,
        port: u16::try_from(port).map_err(HostingRepositoryError::invalid_persisted_data)?,
        server_type: ServerTypeId::from_uuid(server_type_id),
        game_type: GameType::try_from(game_type)
            .map_err(HostingRepositoryError::invalid_persisted_data)?,
        operators: serde_json::from_value::<BTreeSet<PlayerName>>(operators)
            .map_err(HostingRepositoryError::invalid_persisted_data)?,
        lifecycle_state: ServerLifecycleState::try_from(lifecycle_state.as_str())
            .map_err(HostingRepositoryError::invalid_persisted_data)?,
        created_at,
        updated_at,
    };

    Ok(Server::from_persisted(data))
}
