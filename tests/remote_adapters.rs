//! Remote adapter integration tests.
//!
//! The Docker Engine adapter is aimed at a closed local port to model a
//! partitioned host, and at an in-process fake engine for the pull-and-retry
//! path. The Server List Ping adapter talks to an in-process fake game
//! server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eyre::{Result, ensure, eyre};
use mockable::DefaultClock;
use rstest::rstest;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use wrangler::config::WranglerConfig;
use wrangler::container::{
    adapters::DockerEngineRuntime,
    domain::{ContainerSpec, RESTART_FAILED},
    ports::ContainerRuntime,
    services::ContainerLifecycleClient,
};
use wrangler::hosting::{
    adapters::memory::{InMemoryHostingRepository, InMemoryOwnerDirectory},
    domain::{HostName, Server, ServerDraft, ServerName, ServerType, ServerTypeId, Username},
    ports::HostingRepository,
    services::{OrchestratorError, ServerOrchestrator},
};
use wrangler::status::{
    adapters::{InMemoryStatusProbe, ServerListPingProbe},
    domain::ServerAddress,
    ports::GameStatusProbe,
    services::StatusPoller,
};

const STATUS_JSON: &str = r#"{
    "version": {"name": "Paper 1.20.4", "protocol": 765},
    "players": {"max": 20, "online": 4},
    "description": {"text": "Phukish ", "extra": [{"text": "Minecraft"}]}
}"#;

/// Returns a loopback port nothing listens on.
async fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn encode_varint(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let low = u8::try_from(value & 0x7F).unwrap_or_default();
        value >>= 7;
        if value == 0 {
            out.push(low);
            return;
        }
        out.push(low | 0x80);
    }
}

async fn read_varint(stream: &mut TcpStream) -> Result<u32> {
    let mut value = 0_u32;
    for shift in [0_u32, 7, 14, 21, 28] {
        let byte = stream.read_u8().await?;
        value |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    eyre::bail!("varint too long")
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let len = usize::try_from(read_varint(stream).await?)?;
    let mut payload = vec![0_u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Answers one status exchange and reports the handshake it received.
async fn serve_status_once(listener: TcpListener, document: &'static str) -> Result<Vec<u8>> {
    let (mut stream, _) = listener.accept().await?;
    let handshake = read_frame(&mut stream).await?;
    let request = read_frame(&mut stream).await?;
    ensure!(request == [0x00], "expected a status request, got {request:?}");

    let mut body = Vec::new();
    encode_varint(0x00, &mut body);
    encode_varint(u32::try_from(document.len())?, &mut body);
    body.extend_from_slice(document.as_bytes());
    let mut response = Vec::new();
    encode_varint(u32::try_from(body.len())?, &mut response);
    response.extend_from_slice(&body);
    stream.write_all(&response).await?;
    Ok(handshake)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn server_list_ping_reads_fake_server_status() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let server = tokio::spawn(serve_status_once(listener, STATUS_JSON));

    let status = ServerListPingProbe::default()
        .query(&ServerAddress::new("127.0.0.1", port))
        .await?;

    ensure!(status.version == "Paper 1.20.4", "version {}", status.version);
    ensure!(status.online_players == 4, "online {}", status.online_players);
    ensure!(status.max_players == 20, "max {}", status.max_players);
    ensure!(status.motd == "Phukish Minecraft", "motd {}", status.motd);

    let handshake = server.await??;
    ensure!(
        handshake.first() == Some(&0x00),
        "handshake must lead with packet id 0"
    );
    ensure!(
        handshake.last() == Some(&0x01),
        "handshake must request the status state"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn poll_isolates_closed_ports_from_live_servers() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let live_port = listener.local_addr()?.port();
    let server = tokio::spawn(serve_status_once(listener, STATUS_JSON));
    let dead_port = closed_port().await?;

    let poller = StatusPoller::new(
        Arc::new(ServerListPingProbe::default()),
        Duration::from_secs(2),
        4,
    );
    let report = poller
        .poll_status(vec![
            ServerAddress::new("127.0.0.1", dead_port),
            ServerAddress::new("127.0.0.1", live_port),
        ])
        .await;
    server.await??;

    ensure!(report.len() == 2, "both targets reported");
    let first = report.entries.first().map(|entry| &entry.outcome);
    let second = report.entries.get(1).map(|entry| &entry.outcome);
    ensure!(
        first.is_some_and(|outcome| outcome.error().is_some()),
        "closed port must carry an error"
    );
    ensure!(
        second.is_some_and(wrangler::status::domain::StatusOutcome::is_online),
        "live server must be online"
    );
    ensure!(report.total_players == 4, "players {}", report.total_players);
    Ok(())
}

type DockerOrchestrator = ServerOrchestrator<
    InMemoryHostingRepository,
    InMemoryOwnerDirectory,
    DockerEngineRuntime,
    InMemoryStatusProbe,
    DefaultClock,
>;

async fn unreachable_docker_world() -> Result<(Arc<InMemoryHostingRepository>, DockerOrchestrator)> {
    let config = WranglerConfig::default();
    let repository = Arc::new(InMemoryHostingRepository::new());
    let host = HostName::new("127.0.0.1")?;
    repository.store_host(&config.quotas.host(host.clone())?).await?;
    let draft = ServerDraft::new(
        ServerName::new("mc-1")?,
        Username::new("alice")?,
        host,
        ServerTypeId::new(),
        &DefaultClock,
    );
    repository.allocate_and_store(draft).await?;

    let runtime = DockerEngineRuntime::new(closed_port().await?, Duration::from_secs(2));
    let orchestrator = ServerOrchestrator::new(
        Arc::clone(&repository),
        Arc::new(InMemoryOwnerDirectory::new()),
        ContainerLifecycleClient::new(
            Arc::new(runtime),
            config.runtime.launch_settings(),
            config.runtime.log_tail,
        ),
        StatusPoller::new(Arc::new(InMemoryStatusProbe::new()), Duration::from_millis(200), 4),
        Arc::new(DefaultClock),
    );
    Ok((repository, orchestrator))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_against_unreachable_runtime_reports_failure() -> Result<()> {
    let (repository, orchestrator) = unreachable_docker_world().await?;
    let alice = Username::new("alice")?;

    let outcome = orchestrator.restart_server(&alice, "mc-1").await?;

    ensure!(!outcome.ok, "restart must report failure");
    ensure!(outcome.message == RESTART_FAILED, "message {}", outcome.message);
    let stored = repository
        .find_server(&ServerName::new("mc-1")?)
        .await?
        .ok_or_else(|| eyre::eyre!("record missing"))?;
    ensure!(
        stored.lifecycle_state().as_str() == "created",
        "failed restart restores the prior state"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_against_unreachable_runtime_keeps_record() -> Result<()> {
    let (repository, orchestrator) = unreachable_docker_world().await?;
    let alice = Username::new("alice")?;

    let result = orchestrator.delete_server(&alice, "mc-1").await;

    ensure!(
        matches!(result, Err(OrchestratorError::Container(_))),
        "expected a container error, got {result:?}"
    );
    ensure!(
        repository.find_server(&ServerName::new("mc-1")?).await?.is_some(),
        "record must remain after a failed delete"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn logs_against_unreachable_runtime_degrade_to_placeholder() -> Result<()> {
    let (_, orchestrator) = unreachable_docker_world().await?;
    let alice = Username::new("alice")?;

    let detail = orchestrator.server_detail(Some(&alice), "mc-1").await?;

    ensure!(
        detail.logs == [wrangler::container::domain::LOGS_UNAVAILABLE],
        "logs {:?}",
        detail.logs
    );
    Ok(())
}

type EngineCalls = Arc<Mutex<Vec<String>>>;

/// Picks the fake engine's reply. The first container create reports a
/// missing image; later creates succeed and the container is already running.
fn engine_reply(target: &str, creates: &AtomicUsize) -> (&'static str, &'static str) {
    if target.contains("/containers/create") {
        if creates.fetch_add(1, Ordering::SeqCst) == 0 {
            (
                "404 Not Found",
                r#"{"message":"No such image: itzg/minecraft-server:multiarch"}"#,
            )
        } else {
            ("201 Created", r#"{"Id":"4fa6e0f0c678","Warnings":[]}"#)
        }
    } else if target.contains("/images/create") {
        ("200 OK", "{\"status\":\"Downloaded newer image\"}\n")
    } else if target.contains("/start") {
        ("304 Not Modified", "")
    } else {
        ("404 Not Found", r#"{"message":"page not found"}"#)
    }
}

/// Serves keep-alive HTTP/1.1 requests on one connection, recording each
/// `METHOD target` line.
async fn serve_engine_connection(
    stream: TcpStream,
    calls: EngineCalls,
    creates: Arc<AtomicUsize>,
) -> Result<()> {
    let mut reader = BufReader::new(stream);
    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await? == 0 {
            return Ok(());
        }
        let mut content_length = 0_usize;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).await?;
            let trimmed = header.trim_end();
            if trimmed.is_empty() {
                break;
            }
            if let Some((name, value)) = trimmed.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse()?;
                }
            }
        }
        let mut body = vec![0_u8; content_length];
        reader.read_exact(&mut body).await?;

        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        calls
            .lock()
            .map_err(|_| eyre!("call log poisoned"))?
            .push(format!("{method} {target}"));

        let (status, payload) = engine_reply(target, &creates);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{payload}",
            payload.len()
        );
        reader.get_mut().write_all(response.as_bytes()).await?;
    }
}

async fn serve_engine(listener: TcpListener, calls: EngineCalls) -> Result<()> {
    let creates = Arc::new(AtomicUsize::new(0));
    loop {
        let (stream, _) = listener.accept().await?;
        tokio::spawn(serve_engine_connection(
            stream,
            Arc::clone(&calls),
            Arc::clone(&creates),
        ));
    }
}

fn engine_spec() -> Result<ContainerSpec> {
    let config = WranglerConfig::default();
    let server_type = ServerType::new("Vanilla", "1.20.4", "itzg/minecraft-server:multiarch")?;
    let draft = ServerDraft::new(
        ServerName::new("mc-1")?,
        Username::new("alice")?,
        HostName::new("127.0.0.1")?,
        server_type.id(),
        &DefaultClock,
    );
    let server = Server::provision(draft, 25565);
    Ok(ContainerSpec::for_server(
        &server,
        &server_type,
        &config.runtime.launch_settings(),
    )?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_pulls_missing_image_then_retries_create() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let calls = EngineCalls::default();
    let engine = tokio::spawn(serve_engine(listener, Arc::clone(&calls)));

    let runtime = DockerEngineRuntime::new(port, Duration::from_secs(5));
    let outcome = runtime
        .run(&HostName::new("127.0.0.1")?, &engine_spec()?)
        .await;
    engine.abort();
    outcome?;

    let recorded = calls
        .lock()
        .map_err(|_| eyre!("call log poisoned"))?
        .clone();
    let count = |needle: &str| recorded.iter().filter(|call| call.contains(needle)).count();
    ensure!(count("/containers/create") == 2, "creates: {recorded:?}");
    ensure!(count("/images/create") == 1, "pulls: {recorded:?}");
    ensure!(count("/start") == 1, "starts: {recorded:?}");

    let pull = recorded
        .iter()
        .find(|call| call.contains("/images/create"))
        .ok_or_else(|| eyre!("no pull recorded"))?;
    ensure!(
        pull.contains("fromImage=itzg%2Fminecraft-server") || pull.contains("fromImage=itzg/minecraft-server"),
        "pull repository: {pull}"
    );
    ensure!(pull.contains("tag=multiarch"), "pull tag: {pull}");

    let order: Vec<&str> = recorded
        .iter()
        .filter_map(|call| {
            ["/containers/create", "/images/create", "/start"]
                .into_iter()
                .find(|needle| call.contains(needle))
        })
        .collect();
    ensure!(
        order == ["/containers/create", "/images/create", "/containers/create", "/start"],
        "call order: {order:?}"
    );
    Ok(())
}
