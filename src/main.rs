use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use exam_assistant::analytics::StudyAnalytics;
use exam_assistant::assistant::{Answer, Route, StudyAssistant};
use exam_assistant::external::{language_model_from_config, EmbeddingEngine, LanguageModel};
use exam_assistant::quiz::{self, Difficulty};
use exam_assistant::{Config, StudySession};

#[derive(Parser, Debug)]
#[command(author, version, about = "Answer exam questions from your syllabus", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a syllabus PDF, replacing the current index
    Index { path: PathBuf },
    /// Index a plain-text file, replacing the current index
    IndexText { path: PathBuf },
    /// Ask a single question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Interactive chat (:bookmark, :related, :export [file], :clear, :quit)
    Chat,
    /// Practice quiz from the indexed syllabus
    Quiz {
        #[arg(short, long, default_value_t = 5)]
        count: usize,
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,
        /// Short-answer questions instead of multiple choice
        #[arg(long)]
        short_answer: bool,
    },
    /// Suggest important exam questions
    Suggest {
        #[arg(short, long, default_value_t = 5)]
        count: usize,
    },
    /// Show study statistics
    Stats,
    /// Show index and model status
    Status,
}

fn prompt_line(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut buffer = String::new();
    if io::stdin().read_line(&mut buffer)? == 0 {
        return Ok(None);
    }
    Ok(Some(buffer.trim().to_string()))
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text);
    match answer.route {
        Route::Grounded => println!("(answered from {} syllabus passages)", answer.context.len()),
        Route::Direct => println!("(no syllabus indexed, answered without context)"),
        Route::SmallTalk | Route::Failed { .. } => {}
    }
}

fn log_question(analytics: &mut StudyAnalytics, answer: &Answer) {
    if answer.route == Route::SmallTalk {
        return;
    }
    if let Err(e) = analytics.log_question("General") {
        warn!(error = %e, "failed to record analytics");
    }
}

async fn chat(
    assistant: &StudyAssistant,
    session: &mut StudySession,
    analytics: &mut StudyAnalytics,
) -> Result<()> {
    println!("Ask anything about your syllabus. Add \"for 10 marks\" to size the answer.");
    println!("Commands: :bookmark, :related, :export [file], :clear, :quit");

    while let Some(input) = prompt_line("\n> ")? {
        if input.is_empty() {
            continue;
        }
        let mut parts = input.splitn(2, ' ');
        match parts.next() {
            Some(":quit") | Some(":q") => break,
            Some(":clear") => {
                session.clear_history();
                println!("Chat history cleared.");
            }
            Some(":bookmark") => {
                let saved = session
                    .last_exchange()
                    .map(|(q, a)| (q.to_string(), a.to_string()));
                match saved {
                    Some((q, a)) if session.add_bookmark(&q, &a) => println!("Bookmarked."),
                    Some(_) => println!("Already bookmarked."),
                    None => println!("Nothing to bookmark yet."),
                }
            }
            Some(":related") => match session.last_exchange().map(|(q, _)| q.to_string()) {
                Some(question) => match assistant.related_questions(&question, 3).await {
                    Ok(related) => {
                        for (i, q) in related.iter().enumerate() {
                            println!("{}. {}", i + 1, q);
                        }
                    }
                    Err(e) => println!("{}", e),
                },
                None => println!("Ask a question first."),
            },
            Some(":export") => {
                let path = PathBuf::from(parts.next().unwrap_or("study_notes.md").trim());
                std::fs::write(&path, session.export_markdown())
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Notes saved to {}", path.display());
            }
            _ => match assistant.ask(session, &input).await {
                Ok(answer) => {
                    print_answer(&answer);
                    log_question(analytics, &answer);
                }
                Err(e) => println!("{}", e),
            },
        }
    }
    Ok(())
}

async fn run_quiz(
    assistant: &StudyAssistant,
    analytics: &mut StudyAnalytics,
    count: usize,
    difficulty: Difficulty,
) -> Result<()> {
    let questions = assistant.quiz_mcq(count, difficulty).await?;
    if questions.is_empty() {
        println!("Could not generate a quiz. Please try again.");
        return Ok(());
    }

    let mut answers = Vec::with_capacity(questions.len());
    for (i, q) in questions.iter().enumerate() {
        println!("\nQ{}: {}", i + 1, q.question);
        for (letter, option) in &q.options {
            println!("  {}) {}", letter, option);
        }
        let reply = prompt_line("Your answer: ")?.unwrap_or_default();
        let choice = reply.chars().next().unwrap_or(' ');
        if q.correct.eq_ignore_ascii_case(&choice) {
            println!("Correct!");
        } else {
            println!("Incorrect, the answer is {}.", q.correct);
        }
        if let Some(explanation) = &q.explanation {
            println!("{}", explanation);
        }
        answers.push(choice);
    }

    let result = quiz::score(&questions, &answers);
    println!(
        "\nScore: {}/{} ({:.1}%)",
        result.correct, result.total, result.percentage
    );
    if let Err(e) = analytics.log_quiz_score(&result) {
        warn!(error = %e, "failed to record quiz score");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env()?;

    let level = tracing::Level::from_str(&config.processing.log_level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut analytics = StudyAnalytics::open(&config.output.data_dir);

    if let Command::Stats = args.command {
        let stats = analytics.statistics();
        println!("Questions asked: {}", stats.total_questions);
        println!("Topics studied:  {}", stats.topics_count);
        println!("Quizzes taken:   {}", stats.quiz_count);
        println!("Average score:   {:.1}%", stats.average_score);
        for (day, count) in &stats.daily_activity {
            println!("  {}: {}", day, count);
        }
        return Ok(());
    }

    // Clients are built once and shared by every operation.
    let embedder = Arc::new(EmbeddingEngine::new(config.embedding.clone())?);
    let model: Arc<dyn LanguageModel> = Arc::from(language_model_from_config(&config.llm)?);
    let assistant = StudyAssistant::new(&config, embedder, model)?;
    let mut session = StudySession::new(config.processing.max_chat_history);

    match args.command {
        Command::Index { path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let report = assistant.index_document(&mut session, &name, &bytes).await?;
            if report.pages_processed < report.pages {
                println!(
                    "Large PDF: processed the first {} of {} pages.",
                    report.pages_processed, report.pages
                );
            }
            println!(
                "Indexed {} ({} pages, {} chunks).",
                name, report.pages, report.chunks
            );
        }
        Command::IndexText { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let report = assistant.index_text(&text).await?;
            println!("Indexed {} ({} chunks).", path.display(), report.chunks);
        }
        Command::Ask { question } => {
            assistant.load_or_bootstrap().await?;
            let answer = assistant.ask(&mut session, &question.join(" ")).await?;
            print_answer(&answer);
            log_question(&mut analytics, &answer);
        }
        Command::Chat => {
            assistant.load_or_bootstrap().await?;
            chat(&assistant, &mut session, &mut analytics).await?;
        }
        Command::Quiz {
            count,
            difficulty,
            short_answer,
        } => {
            assistant.load_or_bootstrap().await?;
            if short_answer {
                for (i, q) in assistant.quiz_short_answer(count).await?.iter().enumerate() {
                    let marks = q.marks.map(|m| format!(" [{} marks]", m)).unwrap_or_default();
                    println!("\nQ{}: {}{}", i + 1, q.question, marks);
                    println!("Expected answer: {}", q.expected_answer);
                }
            } else {
                run_quiz(&assistant, &mut analytics, count, difficulty).await?;
            }
        }
        Command::Suggest { count } => {
            assistant.load_or_bootstrap().await?;
            for (i, suggestion) in assistant.suggest_topics(count).await?.iter().enumerate() {
                println!("{}. {}", i + 1, suggestion);
            }
        }
        Command::Status => {
            let loaded = assistant.load_or_bootstrap().await?;
            println!("Embedding model: {}", config.embedding.model);
            println!("Language model:  {} ({:?})", config.llm.model, config.llm.provider);
            match assistant.index_size().await {
                Some(chunks) if loaded => {
                    println!("Index: {} chunks in {}", chunks, config.index.dir.display())
                }
                _ => println!("Index: none (answers are generated without syllabus context)"),
            }
        }
        Command::Stats => {}
    }

    Ok(())
}
