//! Interactive chat command

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::meta::MetaDb;
use crate::rag::RagChat;
use crate::store::QdrantStore;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Answer a single question and return the result (one-shot mode)
pub async fn cmd_chat_once(
    config: &Config,
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    llm: &LlmClient,
    question: &str,
) -> Result<crate::rag::ChatAnswer> {
    let mut chat = RagChat::new(config);
    chat.ask(db, store, embedder, llm, question).await
}

/// Print a one-shot chat answer with its sources
pub fn print_chat_answer(answer: &crate::rag::ChatAnswer) {
    println!("\n{}\n", answer.answer);
    if !answer.sources.is_empty() {
        println!("Sources:");
        for source in &answer.sources {
            match &source.url {
                Some(url) => println!("  • {} ({}) [{:.3}]", source.title, url, source.score),
                None => println!("  • {} [{:.3}]", source.title, source.score),
            }
        }
    }
}

/// Run the interactive chat REPL over stdin/stdout.
/// `/clear` resets the conversation, `/quit` (or EOF) exits.
pub async fn cmd_chat(
    config: &Config,
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    llm: &LlmClient,
) -> Result<()> {
    let mut chat = RagChat::new(config);

    println!("💬 Chatting with your library (model: {})", llm.model_name());
    println!("   Type /clear to reset the conversation, /quit to exit.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let question = line?.trim().to_string();

        if question.is_empty() {
            continue;
        }

        match question.as_str() {
            "/quit" | "/exit" => break,
            "/clear" => {
                chat.clear();
                println!("Conversation cleared.\n");
                continue;
            }
            _ => {}
        }

        debug!("Chat question: {}", question);
        match chat.ask(db, store, embedder, llm, &question).await {
            Ok(answer) => {
                println!("\n{}\n", answer.answer);
                if !answer.sources.is_empty() {
                    println!("Sources:");
                    for source in &answer.sources {
                        match &source.url {
                            Some(url) => {
                                println!("  • {} ({}) [{:.3}]", source.title, url, source.score)
                            }
                            None => println!("  • {} [{:.3}]", source.title, source.score),
                        }
                    }
                    println!();
                }
            }
            Err(e) => {
                eprintln!("Error: {}\n", e);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
