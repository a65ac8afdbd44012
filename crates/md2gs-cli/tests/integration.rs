//! Integration tests for the md2gs CLI commands

use std::fs;
use std::sync::Mutex;

use async_trait::async_trait;
use md2gs_cli::{compile_command, copy_slide_command, edit_command, markers_command, push_command};
use md2gs_slides::wire::{ObjectReply, Response};
use md2gs_slides::{BatchUpdateResponse, Presentation, PresentationClient, Request, Result};
use tempfile::TempDir;

const DECK: &str = "# Hello {.big}\n\n---\n\n# Agenda\n\n* One\n* Two\n\n<!-- notes -->\n";

/// Records batches against a fixed, empty presentation
#[derive(Default)]
struct RecordingClient {
    batches: Mutex<Vec<Vec<Request>>>,
}

#[async_trait]
impl PresentationClient for RecordingClient {
    async fn get(&self, presentation_id: &str) -> Result<Presentation> {
        Ok(Presentation {
            presentation_id: presentation_id.to_string(),
            ..Default::default()
        })
    }

    async fn batch_update(&self, _presentation_id: &str, requests: Vec<Request>) -> Result<BatchUpdateResponse> {
        let replies = requests
            .iter()
            .map(|r| match r {
                Request::DuplicateObject(_) => Response {
                    duplicate_object: Some(ObjectReply {
                        object_id: Some("copy1".to_string()),
                    }),
                    ..Default::default()
                },
                _ => Response::default(),
            })
            .collect();
        self.batches.lock().unwrap().push(requests);
        Ok(BatchUpdateResponse {
            presentation_id: None,
            replies,
        })
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

#[test]
fn test_compile_writes_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talk.md");
    let output = dir.path().join("talk.json");
    fs::write(&input, DECK).unwrap();

    compile_command(&input, Some(&output), None).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let slides = json["slides"].as_array().unwrap();
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0]["layout"], "MAIN_POINT");
    assert_eq!(slides[1]["layout"], "TITLE_AND_BODY");
    assert_eq!(slides[1]["notes"], "notes");
}

#[test]
fn test_compile_with_config_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talk.md");
    let output = dir.path().join("talk.json");
    let config = dir.path().join("md2gs.toml");
    fs::write(&input, "# Code\n\nRun `make`").unwrap();
    fs::write(&config, "[fonts]\nmonospace = \"Source Code Pro\"\n").unwrap();

    compile_command(&input, Some(&output), Some(&config)).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("Source Code Pro"));
}

#[test]
fn test_compile_missing_input() {
    let dir = TempDir::new().unwrap();
    let err = compile_command(&dir.path().join("missing.md"), None, None).unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

#[test]
fn test_compile_bad_config() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talk.md");
    let config = dir.path().join("md2gs.toml");
    fs::write(&input, DECK).unwrap();
    fs::write(&config, "[autofit]\nmin_pt = 30.0\nmax_pt = 10.0\n").unwrap();

    let err = compile_command(&input, None, Some(&config)).unwrap_err();
    assert!(err.to_string().contains("Failed to read config"));
}

#[test]
fn test_push_renders_deck() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("talk.md");
    fs::write(&input, DECK).unwrap();
    let client = RecordingClient::default();

    let report = runtime()
        .block_on(push_command(&client, &input, "deck1", false, None))
        .unwrap();
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.deleted, 0);

    let batches = client.batches.lock().unwrap();
    let creates = batches[0].iter().filter(|r| r.kind() == "createSlide").count();
    assert_eq!(creates, 2);
}

#[test]
fn test_markers_and_copy() {
    let client = RecordingClient::default();
    let rt = runtime();

    let json = rt.block_on(markers_command(&client, "deck1")).unwrap();
    let meta: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(meta["presentationId"], "deck1");
    assert!(client.batches.lock().unwrap().is_empty());

    let copy = rt.block_on(copy_slide_command(&client, "deck1", "s1")).unwrap();
    assert_eq!(copy, "copy1");
}

#[test]
fn test_edit_reads_updates_file() {
    let dir = TempDir::new().unwrap();
    let updates = dir.path().join("updates.json");
    fs::write(
        &updates,
        r#"[{"elementId": "el1", "text": "ok"}, {"elementId": "img1", "imageUrl": "https://example.com/a.png"}]"#,
    )
    .unwrap();
    let client = RecordingClient::default();

    let sent = runtime()
        .block_on(edit_command(&client, "deck1", &updates))
        .unwrap();
    assert_eq!(sent, 4);
    assert_eq!(client.batches.lock().unwrap().len(), 1);

    fs::write(&updates, "not json").unwrap();
    let err = runtime()
        .block_on(edit_command(&client, "deck1", &updates))
        .unwrap_err();
    assert!(err.to_string().contains("Invalid updates file"));
}
