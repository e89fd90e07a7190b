// tests/common/mod.rs
//
// Minimal HTTP/1.1 endpoint standing in for the storage API.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

/// Marks when the endpoint began and finished handling request `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started(usize),
    Finished(usize),
}

#[derive(Default)]
struct State {
    requests: Mutex<Vec<CapturedRequest>>,
    events: Mutex<Vec<Event>>,
}

pub struct MockApi {
    pub url: String,
    state: Arc<State>,
}

impl MockApi {
    /// Answers every request with `status` after waiting `delay`.
    pub async fn start(status: u16, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock api");
        let addr = listener.local_addr().expect("mock api has no address");
        let state = Arc::new(State::default());

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                tokio::spawn(serve(stream, state, status, delay));
            }
        });

        Self {
            url: format!("http://{addr}/weather"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.events.lock().unwrap().clone()
    }
}

async fn serve(stream: TcpStream, state: Arc<State>, status: u16, delay: Duration) {
    let mut reader = BufReader::new(stream);

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let index = {
            let mut requests = state.requests.lock().unwrap();
            requests.push(CapturedRequest {
                method,
                path,
                headers,
                body,
            });
            requests.len() - 1
        };
        state.events.lock().unwrap().push(Event::Started(index));

        tokio::time::sleep(delay).await;

        state.events.lock().unwrap().push(Event::Finished(index));
        let response = format!("HTTP/1.1 {status} Mock\r\ncontent-length: 0\r\n\r\n");
        let stream = reader.get_mut();
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
        let _ = stream.flush().await;
    }
}

pub fn reading(temperature: f64) -> Vec<u8> {
    serde_json::json!({
        "latitude": -23.56,
        "longitude": -46.65,
        "temperature": temperature,
        "humidity": 70.0,
        "wind_speed": 11.2,
        "condition_code": 2,
        "timestamp": "2026-10-16T09:00"
    })
    .to_string()
    .into_bytes()
}
