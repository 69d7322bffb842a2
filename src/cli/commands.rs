//! CLI command implementations
//!
//! Every data command loads the export directory into a [`MemoryStore`],
//! builds a [`FederatedEngine`] over it, and writes one JSON response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::args::{Cli, Command, DataArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response, write_text};
use crate::engine::{EngineConfig, FederatedEngine};
use crate::executor::FederatedItem;
use crate::observability::Logger;
use crate::paper::PaperCode;
use crate::planner::{LogicalFilter, PageRequest};
use crate::store::{load_dir, MemoryStore};
use crate::syllabus::SyllabusTree;

/// Stdin request for `query` and `explain`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub filter: LogicalFilter,
    pub page: PageRequest,
}

#[derive(Serialize)]
struct QueryPage<'a> {
    items: &'a [FederatedItem],
    total: u64,
    page: u64,
    limit: u64,
    total_pages: u64,
}

#[derive(Serialize)]
struct PaperInfo<'a> {
    #[serde(flatten)]
    code: &'a PaperCode,
    season: &'static str,
}

struct Session {
    engine: FederatedEngine<MemoryStore>,
    syllabus: SyllabusTree,
}

/// Parse arguments and run. Errors are reported on stdout before being
/// returned so the caller can exit non-zero.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_command(cli.command);

    if let Err(ref e) = result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Run a single command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Query { source } => cmd_query(&source),
        Command::Explain { source, text } => cmd_explain(&source, text),
        Command::Get { id, source } => cmd_get(&source, &id),
        Command::Partitions { source } => cmd_partitions(&source),
        Command::Syllabus { source, prefix } => cmd_syllabus(&source, prefix.as_deref()),
        Command::Paper { code } => cmd_paper(&code),
    }
}

fn cmd_query(source: &DataArgs) -> CliResult<()> {
    let request = read_query_request()?;
    let session = open(source)?;

    let result = runtime()?.block_on(session.engine.query(&request.filter, &request.page))?;

    let data = serde_json::to_value(QueryPage {
        items: &result.items,
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages(),
    })?;
    write_response(data)
}

fn cmd_explain(source: &DataArgs, text: bool) -> CliResult<()> {
    let request = read_query_request()?;
    let session = open(source)?;

    let explain = runtime()?.block_on(session.engine.explain(&request.filter, &request.page))?;

    if text {
        write_text(&explain.to_string())
    } else {
        write_response(serde_json::to_value(&explain)?)
    }
}

fn cmd_get(source: &DataArgs, id: &str) -> CliResult<()> {
    let session = open(source)?;
    let items = runtime()?.block_on(session.engine.get_by_id(id))?;

    write_response(serde_json::json!({
        "id": id.trim(),
        "count": items.len(),
        "items": serde_json::to_value(&items)?,
    }))
}

fn cmd_partitions(source: &DataArgs) -> CliResult<()> {
    let session = open(source)?;
    let partitions = runtime()?.block_on(session.engine.partitions());

    write_response(serde_json::json!({
        "count": partitions.len(),
        "partitions": serde_json::to_value(partitions.as_slice())?,
    }))
}

fn cmd_syllabus(source: &DataArgs, prefix: Option<&str>) -> CliResult<()> {
    let session = open(source)?;
    let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) else {
        return write_response(serde_json::json!({
            "topic_count": session.syllabus.len(),
            "topics": serde_json::to_value(session.syllabus.roots())?,
        }));
    };

    let question_count = runtime()?.block_on(session.engine.count_topic(prefix))?;
    let ancestors: Vec<&str> = session
        .syllabus
        .ancestors(prefix)
        .iter()
        .map(|t| t.number.as_str())
        .collect();

    write_response(serde_json::json!({
        "prefix": prefix,
        "topic": serde_json::to_value(session.syllabus.get(prefix))?,
        "ancestors": ancestors,
        "question_count": question_count,
        "topic_count": session.syllabus.len(),
        "topics": serde_json::to_value(session.syllabus.subtree(prefix))?,
    }))
}

fn cmd_paper(code: &str) -> CliResult<()> {
    let code = PaperCode::parse(code)?;
    let info = PaperInfo {
        code: &code,
        season: code.season().as_str(),
    };
    write_response(serde_json::to_value(&info)?)
}

fn read_query_request() -> CliResult<QueryRequest> {
    parse_query_request(read_request()?)
}

fn parse_query_request(value: Value) -> CliResult<QueryRequest> {
    serde_json::from_value(value).map_err(|e| CliError::invalid_request(e.to_string()))
}

fn open(source: &DataArgs) -> CliResult<Session> {
    let config = EngineConfig::load_or_default(source.config.as_deref())?;
    Logger::set_min_severity(config.log_severity()?);

    let loaded = load_dir(&source.data)?;
    Ok(Session {
        engine: FederatedEngine::new(Arc::new(loaded.store), config),
        syllabus: loaded.syllabus,
    })
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io_error(format!("Failed to create runtime: {}", e)))
}
