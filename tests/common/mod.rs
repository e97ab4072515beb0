#![allow(dead_code)]

use api_showcase::{config::AppConfig, create_app, serve, AppState};
use reqwest::redirect::Policy;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_state(AppState::new(AppConfig::default())).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    spawn_app_with_state(AppState::new(config)).await
}

/// Serves the app on an ephemeral port for the rest of the test.
pub async fn spawn_app_with_state(state: AppState) -> TestApp {
    let app = create_app(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        state,
        client,
    }
}
