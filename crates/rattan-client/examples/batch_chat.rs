//! Example: Submitting batch chat completions
//!
//! Batch requests go through a dedicated transport that caps concurrent
//! connections and has no request deadline, so they can queue server-side
//! until capacity frees up. Set RATTAN_API_KEY to run the live calls.

use futures::future::join_all;
use rattan_client::{Client, ClientConfig, API_KEY_ENV};
use rattan_core::{ChatCompletionRequest, ChatMessage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ClientConfig::new()
        .with_api_key(std::env::var(API_KEY_ENV).unwrap_or_else(|_| "your-api-key".to_string()))
        .with_batch_max_parallel(4);

    let client = Client::with_config(config)?;
    println!("Client created for {}", client.config().base_url);

    let request = ChatCompletionRequest::new("rattan-lite")
        .with_message(ChatMessage::system("You are a helpful assistant."))
        .with_message(ChatMessage::user("Summarize the plot of Hamlet in one line."));

    println!(
        "Batch request prepared with {} messages",
        request.messages.len()
    );

    if std::env::var(API_KEY_ENV).is_err() {
        println!("RATTAN_API_KEY not set, skipping live calls");
        return Ok(());
    }

    // Submit a single batch completion
    let response = client
        .create_batch_chat_completion(request, vec![])
        .await?;
    println!("Response: {}", response.text().unwrap_or_default());

    // Submit a burst of requests. At most four run concurrently, the
    // rest wait for a free connection.
    let prompts = [
        "Name three uses for rattan.",
        "What is the tallest grass species?",
        "Which palms climb rather than stand?",
    ];
    let calls = prompts.iter().map(|prompt| {
        let request = ChatCompletionRequest::new("rattan-lite")
            .with_message(ChatMessage::user(*prompt));
        client.create_batch_chat_completion(request, vec![])
    });

    for result in join_all(calls).await {
        match result {
            Ok(response) => println!("-> {}", response.text().unwrap_or_default()),
            Err(e) => println!("-> failed: {}", e),
        }
    }

    Ok(())
}
