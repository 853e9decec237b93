use std::fmt::Write as _;
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use nt_core::{locate_evidence, mark_evidence, ArticleContext, Error, Result};
use nt_inference::models::PROVIDERS;
use nt_inference::{ArticleAnalyzer, Config, RetryPolicy, DEFAULT_SUMMARY_WORDS};
use nt_web::AppState;
use serde_json::{json, Value};
use tracing::info;

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize articles, find entity references and answer questions", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "gemini", help = "Model provider. Available providers: gemini (default), dummy")]
    provider: String,
    #[arg(long)]
    summarize_model: Option<String>,
    #[arg(long)]
    qa_model: Option<String>,
    /// Articles are cut to this many characters before being sent to the model
    #[arg(long)]
    max_chars: Option<usize>,
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    backoff_base: Option<f64>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Overrides GEMINI_BASE_URL
    #[arg(long)]
    base_url: Option<String>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Analyze one article; reads stdin when neither --file nor --text is given
    Analyze {
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        question: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SUMMARY_WORDS)]
        max_words: usize,
        /// Print a single JSON document instead of text
        #[arg(long)]
        json: bool,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

impl Cli {
    fn config(&self) -> Result<Config> {
        if !PROVIDERS.contains(&self.provider.as_str()) {
            return Err(Error::Config(format!(
                "Unknown model provider '{}'. Available providers: {}",
                self.provider,
                PROVIDERS.join(", ")
            )));
        }

        let mut config = Config::from_env();
        config.provider = self.provider.clone();
        if let Some(model) = &self.summarize_model {
            config.summarize_model = model.clone();
        }
        if let Some(model) = &self.qa_model {
            config.qa_model = model.clone();
        }
        if let Some(max_chars) = self.max_chars {
            config.max_chars = max_chars;
        }
        if self.max_attempts.is_some() || self.backoff_base.is_some() {
            config.retry = RetryPolicy::try_new(
                self.max_attempts.unwrap_or(config.retry.max_attempts()),
                self.backoff_base.unwrap_or(config.retry.backoff_base()),
            )?;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        Ok(config)
    }
}

fn read_article(file: Option<&PathBuf>, text: Option<&String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.clone());
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn render_summary(out: &mut String, summary: &Value) {
    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "### {}", summary["headline"].as_str().unwrap_or_default());
    let _ = writeln!(out, "Summary: {}", summary["summary"].as_str().unwrap_or_default());
    let topics: Vec<String> = string_list(&summary["topics"])
        .iter()
        .map(|t| format!("[{}]", t))
        .collect();
    let _ = writeln!(out, "Topics: {}", topics.join(" "));
}

fn render_references(out: &mut String, entity: &str, references: &Value) {
    let _ = writeln!(out, "\n## Facts about [{}]\n", entity);
    let sentences = string_list(&references["sent_lst"]);
    if sentences.is_empty() {
        let _ = writeln!(out, "No references found");
    }
    for sentence in sentences {
        let _ = writeln!(out, "- {}", sentence);
    }
}

fn render_answer(out: &mut String, article: &str, answer: &Value) {
    let _ = writeln!(out, "\n## Q&A\n");
    let Some(text) = answer.get("answer").and_then(Value::as_str) else {
        let _ = writeln!(out, "Model did not return a usable answer.");
        return;
    };
    let _ = writeln!(out, "Answer: {}", text);

    let found = locate_evidence(article, &string_list(&answer["evidence"]));
    let _ = writeln!(out, "Evidence: {}", mark_evidence(article, &found.spans, "**", "**"));
    if !found.unmatched.is_empty() {
        let _ = writeln!(out, "Not found in article: {}", found.unmatched.join(", "));
    }
}

async fn analyze(
    analyzer: &ArticleAnalyzer,
    question: Option<&str>,
    max_words: usize,
    as_json: bool,
) -> Result<String> {
    let article = analyzer.context().article();

    info!("📝 Summarizing...");
    let summary = analyzer.summarize(max_words).await?;

    let references = match analyzer.context().entity() {
        Some(entity) => {
            info!("🔎 Finding references to {}...", entity);
            Some((entity, analyzer.find_entity_references().await?))
        }
        None => None,
    };

    let answer = match question.filter(|q| !q.trim().is_empty()) {
        Some(question) => {
            info!("🤔 Answering question...");
            Some(analyzer.answer_question(question).await?)
        }
        None => None,
    };

    if as_json {
        let evidence = answer
            .as_ref()
            .map(|a| locate_evidence(article, &string_list(&a["evidence"])));
        let doc = json!({
            "summary": summary,
            "references": references.as_ref().map(|(_, r)| r),
            "answer": answer,
            "evidence": evidence,
        });
        return Ok(serde_json::to_string_pretty(&doc)?);
    }

    let mut out = String::new();
    render_summary(&mut out, &summary);
    if let Some((entity, references)) = &references {
        render_references(&mut out, entity, references);
    }
    if let Some(answer) = &answer {
        render_answer(&mut out, article, answer);
    }
    Ok(out)
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;
    let gateway = config.build_gateway()?;
    info!("🧠 Model gateway ready ({})", config.provider);

    match cli.command {
        Commands::Analyze {
            file,
            text,
            entity,
            question,
            max_words,
            json,
        } => {
            let article = read_article(file.as_ref(), text.as_ref())?;
            let context = ArticleContext::new(article, entity)?;
            let analyzer = ArticleAnalyzer::new(context, gateway, config.analysis_settings());
            let output = analyze(&analyzer, question.as_deref(), max_words, json).await?;
            println!("{}", output);
        }
        Commands::Serve { addr } => {
            let state = AppState::new(gateway, config.analysis_settings());
            nt_web::serve(addr, state).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "nt failed");
        eprintln!("Something went wrong, please try again: {}", e);
        std::process::exit(1);
    }
}
