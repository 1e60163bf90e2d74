use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use video_scholar::session::{AskOutcome, EnrichmentEntry, SessionController};
use video_scholar::{extract_video_id, Config, HttpScholarApi};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("video_scholar=info,warn")
        .init();

    let matches = Command::new("Video Scholar")
        .version("0.1.0")
        .about("AI research assistant for videos: analyze, enrich, ask, study")
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("Video URL to analyze")
                .required(true),
        )
        .arg(
            Arg::new("base-url")
                .short('b')
                .long("base-url")
                .value_name("URL")
                .help("Endpoint root of the analysis backend"),
        )
        .arg(
            Arg::new("poll-interval")
                .short('p')
                .long("poll-interval")
                .value_name("MS")
                .help("Status-check cadence in milliseconds"),
        )
        .arg(
            Arg::new("enrich")
                .short('e')
                .long("enrich")
                .help("Request deeper analysis for the summary and every chapter")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ask")
                .short('a')
                .long("ask")
                .value_name("QUESTION")
                .help("Ask a question about the video (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("flashcards")
                .short('f')
                .long("flashcards")
                .help("Generate a flashcard deck from the video")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let url = matches.get_one::<String>("url").unwrap();

    // Load configuration, then let CLI flags override it
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.base_url = base_url.clone();
    }
    if let Some(interval) = matches.get_one::<String>("poll-interval") {
        config.poll_interval_ms = interval.parse()?;
    }
    config.validate()?;

    info!("🚀 Video Scholar starting...");
    info!("🌐 Backend: {}", config.base_url);
    match extract_video_id(url) {
        Some(video_id) => info!("🎞️  Video id: {}", video_id),
        None => warn!("Could not extract a video id from {}", url),
    }

    let api = Arc::new(HttpScholarApi::new(&config)?);
    let controller = SessionController::new(api, &config);

    let handle = controller.analyze(url).await?;
    info!("🎯 Task {} accepted, polling for completion...", handle.task_id);

    // Follow the job, echoing stage changes as they come in
    let mut last_stage: Option<String> = None;
    let final_state = loop {
        let state = controller.state();
        if state.is_terminal() {
            break state;
        }
        if let Some(task) = controller.task().await {
            if task.stage != last_stage {
                if let Some(stage) = &task.stage {
                    info!("⏳ Stage: {}", stage);
                }
                last_stage = task.stage;
            }
        }
        tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
    };

    if final_state == video_scholar::LifecycleState::Failed {
        let reason = match controller.task().await.and_then(|t| t.error) {
            Some(reason) => reason,
            None => controller
                .last_error()
                .await
                .unwrap_or_else(|| "unknown error".to_string()),
        };
        error!("❌ Analysis failed: {}", reason);
        controller.shutdown().await;
        return Err(anyhow::anyhow!("analysis failed: {}", reason));
    }

    let (task_id, result) = controller
        .completed()
        .await
        .expect("completed state implies a result");
    info!("✅ Analysis completed for task {}", task_id);

    println!("\n=== Summary ===\n{}\n", result.summary);

    println!("=== Chapters ===");
    for chapter in &result.chapters {
        println!("[{}] {}", chapter.timestamp, chapter.topic);
    }

    if !result.qa.is_empty() {
        println!("\n=== Q&A ===");
        for pair in &result.qa {
            println!("Q: {}", pair.question);
            println!("A: {}\n", pair.answer);
        }
    }

    info!("📝 Transcript: {} segments", result.transcript.len());

    if matches.get_flag("enrich") {
        info!("✨ Requesting deeper analysis...");
        let chapter_enrichments = futures::future::join_all(
            result
                .chapters
                .iter()
                .map(|c| controller.enrich_chapter(&c.timestamp)),
        )
        .await;
        let full = controller.enrich_full_text().await;

        println!("\n=== Deeper Analysis ===");
        print_enrichment("Full video", full.as_ref());
        for (chapter, entry) in result.chapters.iter().zip(chapter_enrichments.iter()) {
            print_enrichment(&format!("[{}] {}", chapter.timestamp, chapter.topic), entry.as_ref());
        }
    }

    if let Some(questions) = matches.get_many::<String>("ask") {
        println!("\n=== Conversation ===");
        for question in questions {
            println!("You: {}", question);
            match controller.ask(question).await {
                AskOutcome::Answered | AskOutcome::Fallback => {
                    if let Some(turn) = controller.chat().history().await.last() {
                        println!("AI: {}\n", turn.text);
                    }
                }
                outcome => warn!("Question not answered: {:?}", outcome),
            }
        }
    }

    if matches.get_flag("flashcards") {
        match controller.generate_flashcards().await {
            Ok(Some(count)) => {
                info!("🃏 Generated {} flashcards", count);
                println!("\n=== Flashcards ===");
                for (i, card) in controller.flashcards().cards().await.iter().enumerate() {
                    println!("{}. {} -> {}", i + 1, card.front, card.back);
                }
            }
            Ok(None) => warn!("Flashcard generation was superseded"),
            Err(e) => error!("❌ {}", e),
        }
    }

    controller.shutdown().await;
    Ok(())
}

fn print_enrichment(label: &str, entry: Option<&EnrichmentEntry>) {
    match entry {
        Some(EnrichmentEntry::Ready(enrichment)) => {
            println!("\n{}", label);
            println!("  Key concepts: {}", enrichment.key_concepts.join(", "));
            println!("  ELI5: {}", enrichment.eli5);
            for question in &enrichment.follow_up_questions {
                println!("  Follow-up: {}", question);
            }
        }
        Some(EnrichmentEntry::Failed(reason)) => {
            println!("\n{}\n  (enrichment failed: {})", label, reason);
        }
        None => println!("\n{}\n  (enrichment unavailable)", label),
    }
}
