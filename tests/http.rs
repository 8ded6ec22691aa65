use once_cell::sync::Lazy;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const PASSWORD: &str = "correct horse";

#[derive(Debug, Deserialize)]
struct AuthStatusResponse {
    authenticated: bool,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/auth/check")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_progress_tracker"))
        .env("PORT", port.to_string())
        .env("TRACKER_DATA_PATH", data_path)
        .env("EDIT_PASSWORD", PASSWORD)
        .env_remove("TRACKER_CONFIG")
        .env_remove("APP_ENV")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn login(client: &Client, base_url: &str) -> String {
    let response = client
        .post(format!("{base_url}/api/auth"))
        .json(&json!({ "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .expect("login sets a cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    cookie
}

async fn fetch_data(client: &Client, base_url: &str) -> Value {
    client
        .get(format!("{base_url}/api/data"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn save(client: &Client, base_url: &str, cookie: &str, body: &Value) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/data"))
        .header(COOKIE, cookie)
        .json(body)
        .send()
        .await
        .unwrap()
}

fn empty_document() -> Value {
    json!({ "hours": {}, "notes": {}, "highlights": {}, "misc": {} })
}

#[tokio::test]
async fn http_login_sets_cookie_that_checks_true() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let cookie = login(&client, &server.base_url).await;
    assert!(cookie.starts_with("edit_token="));
    assert!(!cookie.contains(PASSWORD));

    let status: AuthStatusResponse = client
        .get(format!("{}/api/auth/check", server.base_url))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(status.authenticated);

    let anonymous: AuthStatusResponse = client
        .get(format!("{}/api/auth/check", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!anonymous.authenticated);
}

#[tokio::test]
async fn http_wrong_password_is_rejected_without_cookie() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/auth", server.base_url))
        .json(&json!({ "password": "guess" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid password");
}

#[tokio::test]
async fn http_logout_clears_cookie() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/auth/logout", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("edit_token=;"));
    assert!(cookie.contains("Max-Age=0"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn http_save_round_trips_and_is_idempotent() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let cookie = login(&client, &server.base_url).await;

    let document = json!({
        "hours": { "apply-7": 1.5, "karpathy-8": 4.0 },
        "notes": { "apply-7": "two emails out" },
        "highlights": { "7": "good focus" },
        "misc": { "7": { "time": "2.5", "comment": "admin" } }
    });

    for _ in 0..2 {
        let response = save(&client, &server.base_url, &cookie, &document).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(fetch_data(&client, &server.base_url).await, document);
    }

    let response = save(&client, &server.base_url, &cookie, &empty_document()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fetch_data(&client, &server.base_url).await, empty_document());
}

#[tokio::test]
async fn http_save_keeps_payload_exactly() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let cookie = login(&client, &server.base_url).await;

    let document = json!({
        "hours": { "apply-7": 1, "apply-8": null, "posts-9": "0.5" },
        "notes": {},
        "highlights": {},
        "misc": { "7": { "time": 2, "comment": "" } },
        "extra": true
    });
    let response = save(&client, &server.base_url, &cookie, &document).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = fetch_data(&client, &server.base_url).await;
    assert_eq!(stored, document);
    assert!(stored["hours"]["apply-7"].is_u64());

    let stats: Value = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totals"]["total_logged"], 1.5);

    let response = save(&client, &server.base_url, &cookie, &empty_document()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn http_rejected_saves_leave_data_untouched() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let before = fetch_data(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/data", server.base_url))
        .json(&empty_document())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{}/api/data", server.base_url))
        .header(COOKIE, "edit_token=correct%20horse")
        .json(&json!({ "hours": { "apply-1": 9 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&client, &server.base_url).await;
    for bad in [json!([1, 2, 3]), json!("hours"), json!(42)] {
        let response = save(&client, &server.base_url, &cookie, &bad).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(fetch_data(&client, &server.base_url).await, before);
}

#[tokio::test]
async fn http_intent_updates_document_and_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/intent", server.base_url))
        .json(&json!({ "kind": "increment_hours", "track_id": "apply", "day": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&client, &server.base_url).await;
    let response = save(&client, &server.base_url, &cookie, &empty_document()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/api/intent", server.base_url))
        .header(COOKIE, &cookie)
        .json(&json!({ "kind": "increment_hours", "track_id": "apply", "day": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["totals"]["total_logged"], 0.5);
    assert_eq!(stats["totals"]["total_target"], 290.0);

    let data = fetch_data(&client, &server.base_url).await;
    assert_eq!(data["hours"]["apply-7"], 0.5);

    let response = client
        .post(format!("{}/api/intent", server.base_url))
        .header(COOKIE, &cookie)
        .json(&json!({ "kind": "increment_hours", "track_id": "ilya", "day": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_stats_and_page_are_public() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let stats: Value = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totals"]["total_target"], 290.0);
    assert_eq!(stats["cumulative"].as_array().unwrap().len(), 26);
    assert_eq!(stats["tracks"].as_array().unwrap().len(), 6);

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Winter <em>Deep</em> Work"));

    let config: Value = client
        .get(format!("{}/api/config", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config["tracks"].as_array().unwrap().len(), 7);
    assert_eq!(config["features"]["increment_amount"], 0.5);
}
