//! End-to-end engine tests against loopback listeners.

use portsweep::scanner::{build_request, probe_port, run_scan, DisplayFilter, PortStatus, ScanOptions};
use portsweep::services::ServiceTable;
use portsweep::types::{expand, Port, TargetResolver};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Accept connections forever, sending `greeting` (if any) and holding the
/// socket open briefly.
async fn listener(greeting: Option<&'static [u8]>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if let Some(bytes) = greeting {
                    let _ = socket.write_all(bytes).await;
                }
                tokio::time::sleep(Duration::from_secs(2)).await;
            });
        }
    });

    port
}

/// A port that was just bound and released, so nothing listens on it.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn open_port_with_banner() {
    let port = listener(Some(b"SSH-2.0-OpenSSH_9.6\r\n")).await;

    let result = probe_port(
        LOCALHOST,
        Port::new(port).unwrap(),
        Duration::from_secs(1),
        Some(Duration::from_secs(1)),
    )
    .await;

    assert_eq!(result.status, PortStatus::Open);
    assert_eq!(result.banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
}

#[tokio::test]
async fn silent_open_port_has_no_banner() {
    let port = listener(None).await;

    let started = Instant::now();
    let result = probe_port(
        LOCALHOST,
        Port::new(port).unwrap(),
        Duration::from_secs(1),
        Some(Duration::from_millis(200)),
    )
    .await;

    assert_eq!(result.status, PortStatus::Open);
    assert!(result.banner.is_none());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn closed_port_is_closed() {
    let port = closed_port().await;

    let result = probe_port(
        LOCALHOST,
        Port::new(port).unwrap(),
        Duration::from_secs(1),
        None,
    )
    .await;

    assert_eq!(result.status, PortStatus::Closed);
}

#[tokio::test]
async fn pipeline_reports_every_port_in_order() {
    let ssh = listener(Some(b"SSH-2.0-test\r\n")).await;
    let quiet = listener(None).await;
    let closed = closed_port().await;

    let spec = format!("{},{},{}", quiet, closed, ssh);
    let expected = expand(&spec).unwrap();

    let request = build_request(
        &TargetResolver::new(),
        "127.0.0.1",
        &spec,
        ScanOptions::default()
            .with_banner_timeout(Duration::from_millis(200))
            .with_concurrency(2),
    )
    .await
    .unwrap();

    let report = run_scan(
        &request,
        &ServiceTable::default(),
        CancellationToken::new(),
        None,
    )
    .await;

    assert!(!report.cancelled);
    assert_eq!(report.total_ports_scanned, expected.len());
    assert_eq!(report.results.len(), expected.len());

    let ports: Vec<Port> = report.results.iter().map(|r| r.port).collect();
    assert_eq!(ports, expected);

    assert_eq!(report.counts.open, 2);
    assert_eq!(report.counts.closed, 1);

    let ssh_result = report
        .results
        .iter()
        .find(|r| r.port.as_u16() == ssh)
        .unwrap();
    assert_eq!(ssh_result.service.as_deref(), Some("ssh"));

    let visible: Vec<_> = report.visible(DisplayFilter::HideClosed).collect();
    assert_eq!(visible.len(), 2);
}

#[tokio::test]
async fn bad_port_spec_fails_before_scanning() {
    let err = build_request(
        &TargetResolver::new(),
        "127.0.0.1",
        "80,0-10",
        ScanOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("0-10"));
}

/// On Linux a listener with backlog 0 whose accept queue already holds one
/// connection drops further SYNs, which looks exactly like a firewall.
#[cfg(target_os = "linux")]
#[tokio::test]
async fn full_accept_queue_is_filtered() {
    use tokio::net::{TcpSocket, TcpStream};

    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    // Never accepted, so it occupies the only queue slot
    let _held = TcpStream::connect(addr).await.unwrap();

    let timeout = Duration::from_millis(300);
    let started = Instant::now();
    let result = probe_port(LOCALHOST, Port::new(addr.port()).unwrap(), timeout, None).await;
    let elapsed = started.elapsed();

    assert_eq!(result.status, PortStatus::Filtered);
    assert!(result.error_detail.is_none());
    assert!(elapsed >= timeout, "returned after {:?}", elapsed);
    assert!(elapsed < timeout + Duration::from_secs(1), "returned after {:?}", elapsed);
    drop(listener);
}

#[tokio::test]
#[ignore = "needs a network path that silently drops packets"]
async fn dropped_packets_are_filtered() {
    let timeout = Duration::from_millis(500);
    let started = Instant::now();

    let result = probe_port(
        IpAddr::V4(Ipv4Addr::new(10, 255, 255, 1)),
        Port::new(81).unwrap(),
        timeout,
        None,
    )
    .await;

    let elapsed = started.elapsed();
    assert_eq!(result.status, PortStatus::Filtered);
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_millis(500));
}
