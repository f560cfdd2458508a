use async_trait::async_trait;
use rustpubsearch::query::OutboundRequest;
use rustpubsearch::{
    BatchFile, PubSearchError, Result, SearchBackend, SearchClient, SearchConfig, SearchSession,
    SortField, SubmitOutcome,
};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Backend returning a canned outcome and recording the requests it saw
struct FakeBackend {
    response: std::result::Result<String, (u16, String)>,
    seen: Mutex<Vec<OutboundRequest>>,
}

impl FakeBackend {
    fn ok(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn rejecting(status: u16, body: &str) -> Self {
        Self {
            response: Err((status, body.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn execute(&self, request: &OutboundRequest) -> Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        match &self.response {
            Ok(body) => Ok(body.clone()),
            Err((status, body)) => Err(PubSearchError::Remote {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

fn session() -> SearchSession {
    SearchSession::new(Arc::new(SearchConfig::default()))
}

fn capped_payload(n: usize) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"id":"{}","title":"Paper {}","matchPercent":{}}}"#, i, i, i % 100))
        .collect();
    format!("[{}]", rows.join(","))
}

#[tokio::test]
async fn test_structured_search_then_sort_select_export() -> Result<()> {
    let backend = FakeBackend::ok(
        r#"[
            {"id":"1","names":"Smith, J","title":"Zebrafish","matchPercent":40,"doi":"10.1/a"},
            {"pmid":"2","authors":"Adams, K","title":"Actin","matchPercent":90,"year":2021},
            {"id":"3","title":"Myosin","matchPercent":65,"keywords":"motor, protein"}
        ]"#,
    );
    let mut s = session();
    s.filters.last_names.add("Smith");
    s.filters.last_names.add("Adams");

    assert_eq!(s.submit(&backend).await, SubmitOutcome::Applied(3));
    assert!(!s.is_busy());

    let seen = backend.seen.lock().map(|v| v.clone()).unwrap_or_default();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].is_batch());
    assert!(seen[0]
        .url()
        .as_str()
        .contains("lastNames=Smith%2CAdams"));

    let ids: Vec<String> = s.sorted_papers().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["2", "3", "1"]);

    s.toggle_sort(SortField::Title);
    s.toggle_selection("1", true);
    s.toggle_selection("2", true);

    let csv = s.export_csv()?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], r#""Adams, K","Actin","Unknown Journal","2021","No DOI""#);
    assert_eq!(lines[2], r#""Smith, J","Zebrafish","Unknown Journal","","10.1/a""#);
    Ok(())
}

#[tokio::test]
async fn test_batch_mode_sends_one_batch_request() {
    let backend = FakeBackend::ok("[]");
    let mut s = session();
    s.filters.keywords.add("kinase");
    s.filters.batch_file = Some(BatchFile::new("criteria.csv", b"Smith\n".to_vec()));

    assert_eq!(s.submit(&backend).await, SubmitOutcome::Applied(0));

    let seen = backend.seen.lock().map(|v| v.clone()).unwrap_or_default();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_batch());
    assert_eq!(s.status_line(), None);
}

#[tokio::test]
async fn test_remote_rejection_is_verbatim_and_keeps_results() {
    let mut s = session();
    let ok = FakeBackend::ok(r#"[{"id":"1"}]"#);
    s.submit(&ok).await;

    let rejecting = FakeBackend::rejecting(422, "endDate precedes startDate");
    let outcome = s.submit(&rejecting).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed("endDate precedes startDate".to_string())
    );
    assert_eq!(s.error(), Some("endDate precedes startDate"));
    assert_eq!(s.papers().len(), 1);
    assert!(!s.is_busy());
}

#[tokio::test]
async fn test_cap_advisory_does_not_change_results() {
    let backend = FakeBackend::ok(&capped_payload(500));
    let mut s = session();
    assert_eq!(s.submit(&backend).await, SubmitOutcome::Applied(500));

    assert!(s.is_capped());
    let status = s.status_line().unwrap_or_default();
    assert!(status.contains("Showing 500 results"));
    assert!(status.contains("Please narrow down your search!"));

    let sorted = s.sorted_papers();
    assert_eq!(sorted.len(), 500);
    assert!(sorted.windows(2).all(|w| w[0].match_percent >= w[1].match_percent));
}

/// Serve one canned HTTP response on a local port, returning the base URL
/// and a handle yielding the raw request text.
async fn one_shot_server(
    status_line: &'static str,
    body: &'static str,
) -> std::io::Result<(String, tokio::task::JoinHandle<String>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return String::new();
        };
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        request
    });

    Ok((format!("http://{}", addr), handle))
}

/// Read a whole request: headers plus a `Content-Length` or chunked body
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&data);
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let body_len = data.len() - (header_end + 4);
        match content_length {
            Some(len) if body_len >= len => break,
            Some(_) => continue,
            None if headers.contains("transfer-encoding: chunked") => {
                if text.ends_with("0\r\n\r\n") {
                    break;
                }
            }
            None => break,
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

#[tokio::test]
async fn test_http_client_success() -> anyhow::Result<()> {
    let (base, server) = one_shot_server("200 OK", r#"[{"id":"7","title":"Live"}]"#).await?;
    let config = Arc::new(SearchConfig::default().with_overrides(Some(base), Some(5)));
    let client = SearchClient::new(Arc::clone(&config))?;

    let mut s = SearchSession::new(config);
    s.filters.keywords.add("live");
    assert_eq!(s.submit(&client).await, SubmitOutcome::Applied(1));
    assert_eq!(s.papers()[0].title, "Live");

    let request = server.await?;
    assert!(request.starts_with("GET /api/papers?lastNames=&startDate=&endDate=&keywords=live"));
    Ok(())
}

#[tokio::test]
async fn test_http_client_rejection_body() -> anyhow::Result<()> {
    let (base, server) = one_shot_server("400 Bad Request", "Invalid date range").await?;
    let config = Arc::new(SearchConfig::default().with_overrides(Some(base), Some(5)));
    let client = SearchClient::new(Arc::clone(&config))?;

    let mut s = SearchSession::new(config);
    assert_eq!(
        s.submit(&client).await,
        SubmitOutcome::Failed("Invalid date range".to_string())
    );
    server.await?;
    Ok(())
}

#[tokio::test]
async fn test_http_client_unreachable_is_generic_network_error() -> anyhow::Result<()> {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let config = Arc::new(
        SearchConfig::default().with_overrides(Some(format!("http://{}", addr)), Some(2)),
    );
    let client = SearchClient::new(Arc::clone(&config))?;
    let mut s = SearchSession::new(config);

    match s.submit(&client).await {
        SubmitOutcome::Failed(message) => {
            assert!(message.starts_with("Unable to reach the search service"))
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!s.is_busy());
    Ok(())
}

#[tokio::test]
async fn test_http_client_batch_multipart() -> anyhow::Result<()> {
    let (base, server) = one_shot_server("200 OK", "[]").await?;
    let config = Arc::new(SearchConfig::default().with_overrides(Some(base), Some(5)));
    let client = SearchClient::new(Arc::clone(&config))?;

    let mut s = SearchSession::new(config);
    s.filters.last_names.add("Smith");
    s.filters.keywords.add("kinase");
    s.filters.start_date = "2020-01-01".to_string();
    s.filters.batch_file = Some(BatchFile::new("criteria.csv", b"Smith,J\nJones,K\n".to_vec()));

    assert_eq!(s.submit(&client).await, SubmitOutcome::Applied(0));

    let request = server.await?;
    assert!(request.starts_with("POST /api/search-csv "));
    assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data; boundary="));
    for marker in [
        r#"name="file"; filename="criteria.csv""#,
        r#"name="startDate""#,
        r#"name="endDate""#,
        r#"name="keywords""#,
        r#"name="lastNames""#,
    ] {
        assert!(request.contains(marker), "missing {} in request:\n{}", marker, request);
    }
    assert!(request.contains("Smith,J\nJones,K\n"));
    assert!(request.contains("2020-01-01"));
    assert!(request.contains("kinase"));
    Ok(())
}
