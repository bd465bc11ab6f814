//! `fin-agent`: command-line front end of the financial analysis agent
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! fin-agent ask "分析贵州茅台最近两个月的走势"
//! fin-agent analyze 600519 --days 90
//! fin-agent            # interactive session
//! ```

mod console;
mod session;

use agent_llm::ModelRouter;
use agent_market::DataStore;
use agent_utils::AppConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use console::{ConsoleEvents, print_banner, render_key_status, render_outcome, render_skills};
use session::SessionFactory;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fin-agent", version)]
#[command(about = "A 股 / ETF 技术分析助手", long_about = None)]
struct Cli {
    /// Model name, routed to a provider by prefix
    #[arg(long, global = true)]
    model: Option<String>,

    /// Iteration budget of one run
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Directory scanned for SKILL.md skills
    #[arg(long, global = true)]
    skills_dir: Option<PathBuf>,

    /// Directory charts are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Serve every tool from the static table
    #[arg(long, global = true)]
    no_skills: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Answer one free-form question
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Full technical analysis of one symbol
    Analyze {
        symbol: String,
        /// Look-back window in calendar days
        #[arg(long)]
        days: Option<u32>,
    },
    /// List the skills found under the skills directory
    Skills,
    /// Show which model providers have an API key
    Keys,
    /// Interactive session (default)
    Repl,
}

/// File (or defaults), then environment, then flags
fn resolve_config(cli: &Cli, base: AppConfig) -> agent_utils::config::Result<AppConfig> {
    let mut builder = AppConfig::builder().base(base);
    if let Some(model) = &cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(max) = cli.max_iterations {
        builder = builder.max_iterations(max);
    }
    if let Some(dir) = &cli.skills_dir {
        builder = builder.skills_dir(dir.clone());
    }
    if let Some(dir) = &cli.output_dir {
        builder = builder.output_dir(dir.clone());
    }
    if cli.no_skills {
        builder = builder.use_skills(false);
    }
    builder.build()
}

fn load_base_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn exit_code(success: bool) -> ExitCode {
    if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

async fn run_once(factory: &SessionFactory, query: &str) -> anyhow::Result<ExitCode> {
    let session = factory.open()?;
    let outcome = session.agent.run(query).await;
    print!("{}", render_outcome(&outcome));
    Ok(exit_code(outcome.success))
}

async fn analyze(factory: &SessionFactory, symbol: &str, days: u32) -> anyhow::Result<ExitCode> {
    let session = factory.open()?;
    let outcome = session.agent.analyze_stock(symbol, i64::from(days)).await;
    print!("{}", render_outcome(&outcome));
    Ok(exit_code(outcome.success))
}

async fn repl(factory: &SessionFactory) -> anyhow::Result<ExitCode> {
    print_banner();
    let mut session = factory.open()?;
    let skills = session
        .skills
        .as_ref()
        .map_or_else(|| "未启用".to_string(), |s| s.skill_names().join(", "));
    println!("模型: {}  技能: {skills}\n", factory.config().model);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!("\n再见!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("读取输入失败: {e}");
                continue;
            }
        }

        match input.trim() {
            "" => {}
            "exit" | "quit" => {
                println!("再见!");
                break;
            }
            "/reset" => {
                let dropped = session.store.lock().await.len();
                session = factory.open()?;
                println!("已开始新会话（清除 {dropped} 个数据集）\n");
            }
            query => {
                let outcome = session.agent.run(query).await;
                println!("{}", render_outcome(&outcome));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.json_logs {
        agent_utils::init_tracing_json();
    } else {
        agent_utils::init_tracing();
    }

    let base = load_base_config(cli.config.as_deref()).context("loading configuration")?;
    let config = resolve_config(&cli, base).context("invalid configuration")?;
    info!(model = %config.model, skills = config.use_skills, "Starting fin-agent");

    let router = Arc::new(ModelRouter::new());
    let command = cli.command.unwrap_or(Command::Repl);

    if command == Command::Keys {
        print!("{}", render_key_status(&router.key_status()));
        return Ok(ExitCode::SUCCESS);
    }

    let default_days = config.default_days;
    let factory = SessionFactory::new(config, router, Arc::new(ConsoleEvents));

    match command {
        Command::Ask { query } => run_once(&factory, &query.join(" ")).await,
        Command::Analyze { symbol, days } => {
            analyze(&factory, &symbol, days.unwrap_or(default_days)).await
        }
        Command::Skills => {
            let skills = factory.load_skills(&DataStore::shared());
            print!("{}", render_skills(&skills));
            Ok(ExitCode::SUCCESS)
        }
        Command::Keys => Ok(ExitCode::SUCCESS),
        Command::Repl => repl(&factory).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_repl() {
        let cli = Cli::try_parse_from(["fin-agent"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.no_skills);
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::try_parse_from(["fin-agent", "ask", "分析", "600519"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Ask {
                query: vec!["分析".to_string(), "600519".to_string()]
            })
        );
        assert!(Cli::try_parse_from(["fin-agent", "ask"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fin-agent", "analyze", "510300", "--days", "30", "--no-skills", "--model", "deepseek-chat",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Analyze {
                symbol: "510300".to_string(),
                days: Some(30)
            })
        );
        assert!(cli.no_skills);
        assert_eq!(cli.model.as_deref(), Some("deepseek-chat"));
    }

    #[test]
    fn test_flags_override_base() {
        let cli = Cli::try_parse_from([
            "fin-agent", "--max-iterations", "8", "--output-dir", "charts", "--no-skills", "skills",
        ])
        .unwrap();
        let base = AppConfig::builder().model("qwen-plus").build().unwrap();
        let config = resolve_config(&cli, base).unwrap();

        assert_eq!(config.model, "qwen-plus");
        assert_eq!(config.max_iterations, 8);
        assert_eq!(config.output_dir, PathBuf::from("charts"));
        assert!(!config.use_skills);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let cli = Cli::try_parse_from(["fin-agent", "--max-iterations", "0", "keys"]).unwrap();
        assert!(resolve_config(&cli, AppConfig::default()).is_err());
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fin-agent.json");
        std::fs::write(&path, r#"{"model": "glm-4", "default_days": 30}"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.model, "glm-4");
        assert_eq!(config.default_days, 30);
        assert!(load_base_config(Some(&dir.path().join("absent.json"))).is_err());
    }
}
