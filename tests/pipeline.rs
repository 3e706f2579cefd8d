//! End-to-end runs of the publish pipeline against mocked search, download,
//! token and upload endpoints.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pixshorts::{pipeline, Config, Credentials, HistoryRecord, HistoryStore, TokenProvider, YoutubePublisher};

fn search_body(server: &MockServer) -> String {
    format!(
        r#"{{"total":2,"totalHits":2,"hits":[
            {{"id":1,"pageURL":"https://pixabay.com/videos/id-1/","tags":"dog, funny, cute",
              "videos":{{"large":{{"url":"{uri}/media/1.mp4","width":800,"height":1600,"size":1000}}}}}},
            {{"id":2,"pageURL":"https://pixabay.com/videos/id-2/","tags":"landscape",
              "videos":{{"large":{{"url":"{uri}/media/2.mp4","width":1600,"height":800,"size":5000}}}}}}
        ]}}"#,
        uri = server.uri()
    )
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut cfg = Config::new("pix");
    cfg.search.endpoint = format!("{}/api/videos/", server.uri());
    cfg.upload.token_endpoint = format!("{}/token", server.uri());
    cfg.upload.upload_endpoint = format!("{}/upload/youtube/v3/videos", server.uri());
    cfg.history_path = dir.path().join("uploaded-videos.json");
    cfg.temp_video_path = dir.path().join("temp-video.mp4");
    cfg
}

fn publisher_for(cfg: &Config, client: &reqwest::Client) -> YoutubePublisher {
    let credentials = Credentials {
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        refresh_token: "rtoken".into(),
        access_token: None,
        access_token_expires_at: None,
    };
    let tokens = TokenProvider::new(client.clone(), &cfg.upload.token_endpoint, &credentials);
    YoutubePublisher::new(client.clone(), tokens, &cfg.upload.upload_endpoint)
}

async fn mount_search_and_media(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/videos/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_body(server)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"vertical clip".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/2.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"horizontal clip".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"ya29.fresh","expires_in":3599}"#),
        )
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, put_status: u16) {
    let session = format!("{}/upload-session/s1", server.uri());
    Mock::given(method("POST"))
        .and(path("/upload/youtube/v3/videos"))
        .respond_with(ResponseTemplate::new(200).insert_header("Location", session.as_str()))
        .mount(server)
        .await;
    let put = if put_status == 200 {
        ResponseTemplate::new(200).set_body_string(r#"{"id":"newVideo01"}"#)
    } else {
        ResponseTemplate::new(put_status).set_body_string("upload rejected")
    };
    Mock::given(method("PUT"))
        .and(path("/upload-session/s1"))
        .respond_with(put)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_run_publishes_vertical_clip_and_records_it() {
    let server = MockServer::start().await;
    mount_search_and_media(&server).await;
    mount_upload(&server, 200).await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);

    let report = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    assert_eq!(report.video_id, "newVideo01");
    assert_eq!(report.source_url, "https://pixabay.com/videos/id-1/");
    assert_eq!(report.title, "#shorts #dog dog funny cute");
    assert!(report.history_saved);
    assert_eq!(report.watch_url(), "https://youtube.com/watch?v=newVideo01");

    let history = HistoryStore::new(&cfg.history_path).load();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].url, "https://pixabay.com/videos/id-1/");
    assert_eq!(history[0].video_id, "newVideo01");

    assert!(!cfg.temp_video_path.exists());
}

#[tokio::test]
async fn test_run_skips_already_published_clip() {
    let server = MockServer::start().await;
    mount_search_and_media(&server).await;
    mount_upload(&server, 200).await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    let store = HistoryStore::new(&cfg.history_path);
    store
        .append(HistoryRecord {
            url: "https://pixabay.com/videos/id-1/".into(),
            video_id: "old".into(),
            uploaded_at: Some(Utc::now()),
        })
        .unwrap();

    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);
    let report = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    assert_eq!(report.source_url, "https://pixabay.com/videos/id-2/");
    assert_eq!(store.load().len(), 2);
}

#[tokio::test]
async fn test_run_fails_when_everything_is_published() {
    let server = MockServer::start().await;
    mount_search_and_media(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    let store = HistoryStore::new(&cfg.history_path);
    for id in ["1", "2"] {
        store
            .append(HistoryRecord::new(format!("https://pixabay.com/videos/id-{id}/"), id))
            .unwrap();
    }

    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);
    let err = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "selection failed");
    assert!(format!("{err:#}").contains("already been uploaded"));
    assert_eq!(store.load().len(), 2);
}

#[tokio::test]
async fn test_failed_upload_still_removes_temp_file() {
    let server = MockServer::start().await;
    mount_search_and_media(&server).await;
    mount_upload(&server, 500).await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);

    let err = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "upload failed");
    assert!(!cfg.temp_video_path.exists());
    assert!(HistoryStore::new(&cfg.history_path).load().is_empty());
}

#[tokio::test]
async fn test_failed_download_is_labelled() {
    let server = MockServer::start().await;
    let body = search_body(&server).replace("/media/1.mp4", "/media/missing.mp4");
    Mock::given(method("GET"))
        .and(path("/api/videos/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);

    let err = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "download failed");
    assert!(!cfg.temp_video_path.exists());
}

#[tokio::test]
async fn test_preview_does_not_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_body(&server)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/1.mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    let client = reqwest::Client::new();
    let selection = pipeline::preview(&cfg, &client, &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();

    assert_eq!(selection.title, "dog funny cute");
    assert!(selection.is_vertical());
    assert!(!cfg.temp_video_path.exists());
}

#[tokio::test]
async fn test_unwritable_history_does_not_fail_the_run() {
    let server = MockServer::start().await;
    mount_search_and_media(&server).await;
    mount_upload(&server, 200).await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&server, &dir);
    // A directory can be neither read nor written as the history document.
    cfg.history_path = dir.path().to_path_buf();
    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);

    let report = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    assert_eq!(report.video_id, "newVideo01");
    assert!(!report.history_saved);
    assert!(!cfg.temp_video_path.exists());
    assert!(cfg.history_path.is_dir());
}

#[tokio::test]
async fn test_corrupt_history_is_replaced_after_a_run() {
    let server = MockServer::start().await;
    mount_search_and_media(&server).await;
    mount_upload(&server, 200).await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    std::fs::write(&cfg.history_path, "{ not json").unwrap();
    let client = reqwest::Client::new();
    let mut publisher = publisher_for(&cfg, &client);

    let report = pipeline::run(&cfg, &client, &mut publisher, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    assert_eq!(report.video_id, "newVideo01");
    assert!(report.history_saved);
    let history = HistoryStore::new(&cfg.history_path).try_load().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].video_id, "newVideo01");
}

#[tokio::test]
async fn test_preview_tolerates_corrupt_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_body(&server)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &dir);
    std::fs::write(&cfg.history_path, "[[[ garbage").unwrap();
    let client = reqwest::Client::new();

    let selection = pipeline::preview(&cfg, &client, &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();

    assert_eq!(selection.source_url, "https://pixabay.com/videos/id-1/");
    assert_eq!(std::fs::read_to_string(&cfg.history_path).unwrap(), "[[[ garbage");
}
