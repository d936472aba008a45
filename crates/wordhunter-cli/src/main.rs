use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use wordhunter_core::{
    list_files, load_config, serve_worker, AggregateResult, Aggregator, HuntConfig, ProcessBackend, ScanContext,
    Strategy, ThreadBackend, WorkerCommand,
};

/// 默认配置文件（存在时自动加载）
const DEFAULT_CONFIG: &str = "wordhunter.toml";

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "wordhunter", version, about = "多线程 / 多进程关键字统计")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描目录并打印每个关键字的命中文件与次数
    Scan(ScanArgs),

    /// 子进程模式：扫描 `path`，从 stdin 读取关键字请求，向 stdout 写回计数
    #[command(hide = true)]
    Worker {
        /// 待扫描文件（父进程放在 `--` 之后，任意字节都原样传入）
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// 配置文件（TOML）；缺省时尝试 ./wordhunter.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// 待扫描目录（覆盖配置）
    #[arg(long)]
    folder: Option<PathBuf>,

    /// 文件扩展名，不含点（覆盖配置）
    #[arg(long)]
    extension: Option<String>,

    /// 关键字，可重复（覆盖配置中的整个列表）
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// 忽略大小写
    #[arg(long, conflicts_with = "case_sensitive")]
    ignore_case: bool,

    /// 区分大小写
    #[arg(long)]
    case_sensitive: bool,

    /// worker 池大小（"auto"=CPU 核心数）
    #[arg(long)]
    workers: Option<String>,

    /// 执行策略
    #[arg(long, default_value = "both", value_parser = ["thread", "process", "both"])]
    strategy: String,

    /// 以 JSON 输出报告
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Worker { path } => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            serve_worker(&path, stdin.lock(), stdout.lock()).context("worker request failed")
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志一律写 stderr：stdout 留给报告，以及 worker 子进程的结果
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 合并配置文件与命令行参数（命令行优先）
fn resolve_config(args: &ScanArgs) -> Result<HuntConfig> {
    let mut cfg = match &args.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => load_config(Path::new(DEFAULT_CONFIG))?,
        None => HuntConfig::default(),
    };
    if let Some(folder) = &args.folder {
        cfg.folder = folder.clone();
    }
    if let Some(ext) = &args.extension {
        cfg.extension = ext.trim_start_matches('.').to_string();
    }
    if !args.keywords.is_empty() {
        cfg.keywords = args.keywords.clone();
    }
    if args.ignore_case {
        cfg.case_sensitive = false;
    }
    if args.case_sensitive {
        cfg.case_sensitive = true;
    }
    if let Some(w) = &args.workers {
        cfg.workers = parse_workers(w)?;
    }
    Ok(cfg)
}

/// 解析 worker 参数："auto" 表示自动；其他为正整数
fn parse_workers(s: &str) -> Result<Option<usize>> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => bail!("invalid --workers value {s:?}: expected \"auto\" or a positive integer"),
    }
}

fn strategies(name: &str) -> Vec<Strategy> {
    match name {
        "thread" => vec![Strategy::Thread],
        "process" => vec![Strategy::Process],
        _ => vec![Strategy::Thread, Strategy::Process],
    }
}

struct Run {
    strategy: Strategy,
    elapsed: Duration,
    result: AggregateResult,
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let keywords = cfg.keyword_set().context("invalid keyword list")?;
    let files = list_files(&cfg.folder, &cfg.extension).context("list input files")?;
    info!(folder = %cfg.folder.display(), files = files.len(), keywords = keywords.len(), "input ready");

    let ctx = Arc::new(ScanContext::new(keywords).context("build keyword matcher")?);
    let mut runs = Vec::new();
    for strategy in strategies(&args.strategy) {
        let start = Instant::now();
        let result = match strategy {
            Strategy::Thread => Aggregator::with_context(Arc::clone(&ctx), ThreadBackend::new(cfg.workers)).run(&files),
            Strategy::Process => {
                let command = WorkerCommand::current_exe()?.arg("worker");
                Aggregator::with_context(Arc::clone(&ctx), ProcessBackend::new(command, cfg.workers)).run(&files)
            }
        }
        .with_context(|| format!("{} run failed", strategy.label()))?;
        runs.push(Run { strategy, elapsed: start.elapsed(), result });
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        write_json(&mut out, &runs)?;
    } else {
        for run in &runs {
            write_report(&mut out, run)?;
        }
    }
    out.flush().ok();

    check_agreement(&runs)
}

/// 两种策略都跑过时，结果必须完全一致
fn check_agreement(runs: &[Run]) -> Result<()> {
    if let [first, second] = runs {
        if first.result != second.result {
            warn!("strategies disagree");
            bail!("{} and {} produced different results", first.strategy.label(), second.strategy.label());
        }
        info!("strategies agree");
    }
    Ok(())
}

/// 人类可读报告：耗时（秒，两位小数）、命中文件、计数、失败文件
fn write_report(out: &mut dyn Write, run: &Run) -> Result<()> {
    let label = run.strategy.label();
    writeln!(out, "== {label} ==")?;
    writeln!(out, "{label} time: {:.2} sec", run.elapsed.as_secs_f64())?;
    writeln!(out, "results:")?;
    for total in &run.result.keywords {
        let files: Vec<String> = total.files.iter().map(|p| p.display().to_string()).collect();
        writeln!(out, "  {}: [{}]", total.keyword, files.join(", "))?;
    }
    writeln!(out, "counts:")?;
    for total in &run.result.keywords {
        writeln!(out, "  {}: {}", total.keyword, total.count)?;
    }
    if !run.result.failures.is_empty() {
        writeln!(out, "failures:")?;
        for f in &run.result.failures {
            writeln!(out, "  {}: {}", f.path.display(), f.reason)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn write_json(out: &mut dyn Write, runs: &[Run]) -> Result<()> {
    let items: Vec<serde_json::Value> = runs
        .iter()
        .map(|r| {
            serde_json::json!({
                "strategy": r.strategy.label(),
                "elapsed_secs": r.elapsed.as_secs_f64(),
                "result": r.result,
            })
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &items)?;
    writeln!(out)?;
    Ok(())
}
