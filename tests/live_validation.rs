use std::{env, sync::Once};

use newsdigest::{
    config, embedding,
    processing::{SummaryApi, SummaryInput, SummaryRequest, SummaryService},
};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() {
    INIT.call_once(|| {
        set_default_env("OLLAMA_URL", "http://127.0.0.1:11434");
        set_default_env("SUMMARIZATION_MODEL", "llama3.2");
        set_default_env("DOCUMENT_LANGUAGE", "en");
        set_default_env("EMBEDDING_PROVIDER", "ollama");
        set_default_env("EMBEDDING_MODEL", "nomic-embed-text");
        set_default_env("SUMMARY_LOG_PATH", "");
        config::init_config();
    });
}

#[tokio::test]
#[ignore = "Requires live Ollama embeddings"]
async fn live_ollama_embedding_roundtrip() {
    init_config_once();
    let client = embedding::get_embedding_client(config::get_config()).expect("embedding client");
    let vectors = client
        .generate_embeddings(vec!["newsdigest live embedding".to_string()])
        .await
        .expect("failed to request embeddings from provider");
    assert_eq!(vectors.len(), 1, "expected embedding per input");
    assert!(!vectors[0].is_empty(), "embedding should not be empty");
}

#[tokio::test]
#[ignore = "Requires live Ollama with the summarization model pulled"]
async fn live_summary_respects_length_ceiling() {
    init_config_once();
    let service = SummaryService::from_config(config::get_config()).expect("service");
    let article = "The city council voted on Tuesday to approve a new public transport plan. \
                   The plan adds twelve bus lines and extends tram service to the northern \
                   districts. Officials said the first routes will open next spring, while \
                   residents asked for safer crossings near schools and longer library hours.";

    let request = SummaryRequest::from_input(
        SummaryInput {
            text: Some(article.into()),
            max_length: Some(200),
            min_length: Some(50),
            ..SummaryInput::default()
        },
        service.default_budget(),
    )
    .expect("request");
    let summary = service.summarize(request).await.expect("live summary");

    assert!(!summary.text.is_empty());
    assert!(summary.text.chars().count() <= 201, "{}", summary.text);
}
