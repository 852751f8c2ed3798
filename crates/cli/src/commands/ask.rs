//! `zhiyuan ask` - Ask a question against a running gateway.
//!
//! Streams fragments to the terminal as they arrive; `--single` waits for
//! the whole reply instead.

use std::io::Write;

use zhiyuan_client::{ChatClient, StreamOutcome};
use zhiyuan_core::chat::ChatRequest;

pub async fn run(
    question: String,
    url: String,
    province: Option<String>,
    subject: Option<String>,
    score: Option<u32>,
    single: bool,
) -> anyhow::Result<()> {
    let client = ChatClient::new(url);
    let request = ChatRequest {
        question,
        province,
        subject,
        score,
        ..Default::default()
    };

    if single {
        let reply = client.ask(&request).await?;
        println!("{reply}");
        return Ok(());
    }

    let mut stdout = std::io::stdout();
    let outcome = client
        .ask_stream(&request, |fragment| {
            let _ = write!(stdout, "{fragment}");
            let _ = stdout.flush();
        })
        .await?;
    println!();

    if let StreamOutcome::Failed { message } = outcome {
        eprintln!("[回答中断，内容可能不完整: {message}]");
    }

    Ok(())
}
