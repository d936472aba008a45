//! 进程后端：每个文件一个子进程，结果经各自的管道回传，由聚合器集中合并
//!
//! 没有跨进程共享的聚合结构，因此不存在“读代理列表、本地修改、写回”的竞态。
//! 并发子进程数由监管线程池限制（每个监管线程同一时刻只看管一个子进程）。
//! 文件路径经命令行参数（OsString）传给子进程，不进 JSON，非 UTF-8 路径也能原样到达。

use crossbeam_channel::Sender;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

use crate::aggregate::Backend;
use crate::backend_thread::build_pool;
use crate::error::{HuntError, Result};
use crate::keywords::KeywordSet;
use crate::options::{pool_size, CaseMode, Strategy};
use crate::types::{FileFailure, KeywordCount, ScanResult};
use crate::worker::{run_worker, ScanContext, WorkerReport};

/// 父进程写给子进程 stdin 的请求（JSON）；路径在命令行参数里
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub keywords: Vec<String>,
    pub case_mode: CaseMode,
}

/// 子进程写回 stdout 的响应（JSON）；不含路径，由父进程补回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub counts: Vec<KeywordCount>,
    /// 文件读取失败的原因
    #[serde(default)]
    pub failure: Option<String>,
}

/// 启动 worker 子进程的命令行（文件路径会作为最后一个参数追加在 `--` 之后）
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 以当前可执行文件作为 worker（CLI 通过隐藏子命令进入 worker 模式）
    pub fn current_exe() -> Result<Self> {
        let program = std::env::current_exe().map_err(|source| HuntError::Spawn {
            target: "current executable".to_string(),
            source,
        })?;
        Ok(Self::new(program))
    }
}

/// 多进程后端
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    pub command: WorkerCommand,
    /// 同时运行的子进程上限：None 表示自动（等于 CPU 核数）
    pub workers: Option<usize>,
}

impl ProcessBackend {
    pub fn new(command: WorkerCommand, workers: Option<usize>) -> Self {
        Self { command, workers }
    }

    /// 看管一个子进程：启动、发送请求、读取结果、回收
    /// - 启动失败是运行级错误
    /// - 启动后的崩溃、非零退出、输出无法解析，都只影响该文件
    fn supervise(&self, path: &Path, keywords: &KeywordSet) -> Result<WorkerReport> {
        let child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg("--")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| HuntError::Spawn { target: path.display().to_string(), source })?;
        debug!(path = %path.display(), pid = child.id(), "worker process started");

        let request = WorkerRequest { keywords: keywords.words().to_vec(), case_mode: keywords.case_mode() };
        let reason = match exchange(child, &request) {
            Ok(response) => {
                // 路径以父进程手里的为准，不信任子进程
                let result = ScanResult { path: path.to_path_buf(), counts: response.counts };
                if result.conforms_to(keywords) {
                    let failure = response.failure.map(|reason| FileFailure { path: path.to_path_buf(), reason });
                    return Ok(WorkerReport { result, failure });
                }
                "worker returned counts for a different keyword set".to_string()
            }
            Err(reason) => reason,
        };

        warn!(path = %path.display(), error = %reason, "worker process failed");
        Ok(WorkerReport {
            result: ScanResult::empty(path, keywords),
            failure: Some(FileFailure { path: path.to_path_buf(), reason }),
        })
    }
}

impl Backend for ProcessBackend {
    fn strategy(&self) -> Strategy {
        Strategy::Process
    }

    fn fan_out(&self, files: &[PathBuf], ctx: &ScanContext, tx: &Sender<WorkerReport>) -> Result<()> {
        let supervisors = pool_size(self.workers, files.len());
        let pool = build_pool(supervisors, "supervise")?;
        debug!(supervisors, files = files.len(), program = %self.command.program.display(), "process pool ready");

        pool.install(|| {
            files
                .par_iter()
                .try_for_each(|path| run_worker(path, tx, |p| self.supervise(p, &ctx.keywords)))
        })
    }
}

/// 与子进程交换一次请求/响应；任何 I/O 或协议问题都作为文本原因返回
fn exchange(mut child: Child, request: &WorkerRequest) -> std::result::Result<WorkerResponse, String> {
    // 写完即关闭 stdin，子进程读到 EOF 后才开始扫描，避免双向管道互等
    let sent = match child.stdin.take() {
        Some(mut stdin) => serde_json::to_vec(request)
            .map_err(|e| format!("cannot encode request: {e}"))
            .and_then(|buf| stdin.write_all(&buf).map_err(|e| format!("cannot send request: {e}"))),
        None => Err("worker stdin was not captured".to_string()),
    };

    // 无论发送是否成功都要回收子进程
    let output = child.wait_with_output().map_err(|e| format!("cannot wait for worker: {e}"))?;
    sent?;
    if !output.status.success() {
        return Err(format!("worker exited with {}", output.status));
    }
    serde_json::from_slice(&output.stdout).map_err(|e| format!("cannot decode worker output: {e}"))
}

/// 子进程一侧：读取请求、扫描 `path`、写回计数
/// 文件读取失败照常写回（全零计数 + 失败原因），只有协议错误才返回 Err
pub fn serve_worker<R: Read, W: Write>(path: &Path, input: R, mut output: W) -> Result<()> {
    let request: WorkerRequest =
        serde_json::from_reader(input).map_err(|e| HuntError::Protocol(format!("bad request: {e}")))?;
    let ctx = ScanContext::new(KeywordSet::new(request.keywords, request.case_mode)?)?;
    let outcome = ctx.scan(path);
    let response = WorkerResponse {
        counts: outcome.result.counts,
        failure: outcome.failure.map(|f| f.reason),
    };
    serde_json::to_writer(&mut output, &response)
        .map_err(|e| HuntError::Protocol(format!("cannot write result: {e}")))?;
    output.flush().map_err(|e| HuntError::Protocol(format!("cannot flush result: {e}")))?;
    Ok(())
}
