#![allow(missing_docs, unused_results)]

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::{Value, json};
use tandem_align::AlignmentEngine;
use tandem_core::SpecialTokens;
use tandem_decoding::{DecodingEngine, GenerationConfig};
use tandem_inference::mock::{PositionalEmbeddingProvider, ScriptedSequenceModel, VocabTokenizer};
use tandem_rpc::{ExitReason, InitFailure, ProtocolServer, ServerState};
use tandem_session::{LanguageTable, TranslationSession};

fn session(with_aligner: bool) -> TranslationSession {
    let tok = Arc::new(
        VocabTokenizer::new(["The", "cat", "sat", ".", "Die", "Katze", "saß"])
            .with_languages(["eng_Latn", "deu_Latn"]),
    );
    let script = tok.ids(&["Die", "Katze", "saß", "."]);
    let model = Arc::new(ScriptedSequenceModel::new(script, tok.len()));
    let decoder = DecodingEngine::new(model, SpecialTokens::default());
    let session = TranslationSession::new(
        tok.clone(),
        decoder,
        LanguageTable::default(),
        GenerationConfig::default(),
    );
    if with_aligner {
        session.with_aligner(AlignmentEngine::new(
            Arc::new(PositionalEmbeddingProvider::new(64)),
            tok,
        ))
    } else {
        session
    }
}

async fn run(input: &str, with_aligner: bool) -> (ExitReason, Vec<Value>) {
    let mut server = ProtocolServer::new(Vec::new());
    let exit = server
        .run(input.as_bytes(), move || Ok(session(with_aligner)))
        .await
        .unwrap();
    assert_eq!(server.state(), ServerState::Terminated);
    let output = String::from_utf8(server.into_writer()).unwrap();
    let lines = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    (exit, lines)
}

#[tokio::test]
async fn ready_then_translation_then_shutdown() {
    let input = concat!(
        r#"{"text":"The cat sat .","source_lang":"English","target_lang":"German","request_id":7}"#,
        "\n",
        r#"{"command":"shutdown"}"#,
        "\n",
        r#"{"text":"never read"}"#,
        "\n",
    );
    let (exit, lines) = run(input, true).await;
    assert_eq!(exit, ExitReason::Shutdown);
    assert_eq!(exit.exit_code(), 0);
    assert_eq!(
        lines,
        vec![
            json!({"status": "ready"}),
            json!({
                "translation": "Die Katze saß .",
                "alignments": [{"s":0,"t":0},{"s":1,"t":1},{"s":2,"t":2},{"s":3,"t":3}],
                "request_id": 7
            }),
            json!({"status": "shutdown"}),
        ]
    );
}

#[tokio::test]
async fn one_response_per_request_in_order() {
    let input = concat!(
        r#"{"text":"The cat","request_id":"a"}"#,
        "\n\n   \n",
        "{broken\n",
        r#"{"command":"update_settings","beam_size":1}"#,
        "\n",
        r#"{"command":"reload","request_id":"b"}"#,
        "\n",
        r#"{"text":"www.example.com","request_id":"c"}"#,
        "\n",
        r#"{"text":"The cat"}"#,
        "\n",
    );
    let (exit, lines) = run(input, false).await;
    assert_eq!(exit, ExitReason::EndOfInput);
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], json!({"status": "ready"}));
    assert_eq!(lines[1]["request_id"], json!("a"));
    assert_eq!(lines[1]["alignments"], json!([]));
    assert_eq!(lines[2]["status"], json!("error"));
    assert!(lines[2].get("request_id").is_none());
    assert_eq!(lines[3], json!({"status": "settings_updated"}));
    assert_eq!(
        lines[4],
        json!({"error": "unknown command: reload", "request_id": "b"})
    );
    assert_eq!(
        lines[5],
        json!({"translation": "www.example.com", "alignments": [], "request_id": "c"})
    );
    assert_eq!(lines[6]["request_id"], Value::Null);
    assert_eq!(lines[6]["translation"], json!("Die Katze saß ."));
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let input = concat!(
        r#"{"command":"update_settings","max_length":100000,"request_id":1}"#,
        "\n",
        r#"{"command":"update_settings","beam_size":0}"#,
        "\n",
    );
    let (_, lines) = run(input, false).await;
    assert_matches!(lines[1]["error"].as_str(), Some(msg) if msg.contains("working length"));
    assert_eq!(lines[1]["request_id"], json!(1));
    assert_matches!(lines[2]["error"].as_str(), Some(msg) if msg.contains("beam_size"));
    assert_eq!(lines[2]["request_id"], Value::Null);
}

#[tokio::test]
async fn language_aliases_and_defaults() {
    let input = concat!(
        r#"{"text":"The cat sat .","source":"English","target":"German","request_id":2}"#,
        "\n",
        r#"{"text":"The cat sat ."}"#,
        "\n",
    );
    let (_, lines) = run(input, true).await;
    assert_eq!(lines[1]["translation"], lines[2]["translation"]);
    assert_eq!(lines[1]["alignments"], lines[2]["alignments"]);
}

#[tokio::test]
async fn request_errors_do_not_stop_the_loop() {
    let input = concat!(
        r#"{"text":"The cat","target":"Japanese","request_id":"x"}"#,
        "\n",
        r#"{"text":"The cat","request_id":"y"}"#,
        "\n",
    );
    let (exit, lines) = run(input, false).await;
    assert_eq!(exit, ExitReason::EndOfInput);
    assert_matches!(lines[1]["error"].as_str(), Some(msg) if msg.contains("jpn_Jpan"));
    assert_eq!(lines[1]["request_id"], json!("x"));
    assert_eq!(lines[2]["translation"], json!("Die Katze saß ."));
}

#[tokio::test]
async fn invalid_utf8_is_a_malformed_line() {
    let mut server = ProtocolServer::new(Vec::new());
    let input: &[u8] = b"\xff\xfe\n{\"command\":\"shutdown\"}\n";
    let exit = server.run(input, || Ok(session(false))).await.unwrap();
    assert_eq!(exit, ExitReason::Shutdown);
    let output = String::from_utf8(server.into_writer()).unwrap();
    let lines: Vec<Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines[1]["status"], json!("error"));
    assert_eq!(lines[2], json!({"status": "shutdown"}));
}

#[tokio::test]
async fn init_failure_is_reported_once() {
    let mut server = ProtocolServer::new(Vec::new());
    let exit = server
        .run(&b"{\"text\":\"hi\"}\n"[..], || {
            Err(InitFailure::new("ModelLoad", "encoder not found at /x"))
        })
        .await
        .unwrap();
    assert_eq!(exit, ExitReason::InitFailed);
    assert_eq!(exit.exit_code(), 1);
    let output = String::from_utf8(server.into_writer()).unwrap();
    let lines: Vec<Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(
        lines,
        vec![json!({"error": "encoder not found at /x", "type": "ModelLoad", "status": "init_failed"})]
    );
}

#[tokio::test]
async fn crlf_lines_are_accepted() {
    let (exit, lines) = run("{\"text\":\"The cat\",\"request_id\":5}\r\n", false).await;
    assert_eq!(exit, ExitReason::EndOfInput);
    assert_eq!(lines[1]["request_id"], json!(5));
}
