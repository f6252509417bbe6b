//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, FetchArgs, OutputFormat};
use crate::config::{load_config, AppConfig, HttpSettings, PagerConfig};
use crate::entity::NamedEntity;
use crate::error::{Error, Result};
use crate::http::HttpTransport;
use crate::lanes::page_plan;
use crate::pager::LanePager;
use crate::types::{OptionStringExt, Record};
use serde_json::json;
use std::io::{BufWriter, Write};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops a running fetch
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let mut out = BufWriter::new(std::io::stdout());
        let result = match &self.cli.command {
            Commands::Fetch(args) => self.fetch(args, &mut out).await.map(|_| ()),
            Commands::Plan { lanes, rounds } => self.plan(*lanes, *rounds, &mut out),
            Commands::Validate => self.validate(&mut out),
        };
        out.flush()?;
        result
    }

    /// Load the config file if one was given
    fn load_config(&self) -> Result<Option<AppConfig>> {
        self.cli.config.as_ref().map(load_config).transpose()
    }

    /// Merge the config file with command-line overrides
    fn resolve_fetch(&self, args: &FetchArgs) -> Result<(String, AppConfig)> {
        let mut config = self.load_config()?.unwrap_or_else(|| AppConfig {
            base_url: String::new(),
            entity: None,
            http: HttpSettings::default(),
            pager: PagerConfig::default(),
        });

        if let Some(url) = &args.base_url {
            config.base_url.clone_from(url);
        }
        let entity = args
            .entity
            .clone()
            .or_else(|| config.entity.clone())
            .none_if_empty()
            .ok_or_else(|| {
                Error::config("Entity not specified (pass it as an argument or set `entity`)")
            })?;

        let pager = &mut config.pager;
        if let Some(lanes) = args.lanes {
            pager.count_lanes = lanes;
        }
        if args.no_cursor {
            pager.cursor_key = None;
        } else if let Some(key) = &args.cursor_key {
            pager.cursor_key = Some(key.clone());
        }
        if let Some(attempts) = args.max_attempts {
            pager.max_attempts = attempts;
        }
        if let Some(delay) = args.delay {
            pager.delay_seconds = delay;
        }
        pager.query_params.extend(args.params.iter().cloned());

        config.validate()?;
        Ok((entity, config))
    }

    /// Fetch records and write them to `out`, returning how many were written
    async fn fetch<W: Write>(&self, args: &FetchArgs, out: &mut W) -> Result<usize> {
        let (entity, config) = self.resolve_fetch(args)?;
        let transport = HttpTransport::new(config.client_config())?;

        info!(
            entity = %entity,
            base_url = %config.base_url,
            lanes = config.pager.count_lanes,
            "Starting fetch"
        );

        let mut pager = LanePager::new(NamedEntity::new(entity.as_str()), transport, config.pager)?
            .with_cancellation(self.cancel.clone());

        let start = Instant::now();
        let mut count = 0usize;

        while args.limit.map_or(true, |limit| count < limit) {
            let record = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                record = pager.next_record() => record?,
            };
            let Some(record) = record else { break };
            write_record(out, &record, self.cli.format)?;
            count += 1;
        }

        info!(
            entity = %entity,
            records = count,
            rounds = pager.round_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetch complete"
        );
        Ok(count)
    }

    /// Print the pages each lane requests per round
    fn plan<W: Write>(&self, lanes: usize, rounds: usize, out: &mut W) -> Result<()> {
        let plan = page_plan(lanes, rounds)?;

        for (round, pages) in plan.iter().enumerate() {
            match self.cli.format {
                OutputFormat::Json => {
                    let line = json!({ "round": round + 1, "pages": pages });
                    serde_json::to_writer(&mut *out, &line)?;
                    writeln!(out)?;
                }
                OutputFormat::Pretty => {
                    let cells: Vec<String> = pages
                        .iter()
                        .enumerate()
                        .map(|(lane, page)| format!("lane {lane}: p{page}"))
                        .collect();
                    writeln!(out, "round {:>3} | {}", round + 1, cells.join(", "))?;
                }
            }
        }
        Ok(())
    }

    /// Validate the config file
    fn validate<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self
            .load_config()?
            .ok_or_else(|| Error::config("Config file not specified (use -C flag)"))?;

        writeln!(out, "✓ Config is valid")?;
        writeln!(out, "  Base URL: {}", config.base_url)?;
        if let Some(entity) = &config.entity {
            writeln!(out, "  Entity: {entity}")?;
        }
        writeln!(out, "  Lanes: {}", config.pager.count_lanes)?;
        match &config.pager.cursor_key {
            Some(key) => writeln!(out, "  Cursor: {key}")?,
            None => writeln!(out, "  Cursor: disabled")?,
        }
        writeln!(
            out,
            "  Retry: {} attempts, {}s apart",
            config.pager.max_attempts, config.pager.delay_seconds
        )?;
        Ok(())
    }
}

/// Write one record in the requested format
fn write_record<W: Write>(out: &mut W, record: &Record, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut *out, record)?,
        OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *out, record)?,
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner_for(args: &[&str]) -> Runner {
        let mut argv = vec!["lanepager"];
        argv.extend_from_slice(args);
        Runner::new(Cli::parse_from(argv))
    }

    fn fetch_args(runner: &Runner) -> &FetchArgs {
        match &runner.cli.command {
            Commands::Fetch(args) => args,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_from_arguments() {
        let runner = runner_for(&[
            "fetch",
            "item",
            "--base-url",
            "https://api.example.com",
            "--lanes",
            "2",
            "--max-attempts",
            "3",
            "--delay",
            "0",
            "-p",
            "category_id=12",
        ]);

        let (entity, config) = runner.resolve_fetch(fetch_args(&runner)).unwrap();

        assert_eq!(entity, "item");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.pager.count_lanes, 2);
        assert_eq!(config.pager.max_attempts, 3);
        assert_eq!(config.pager.delay_seconds, 0);
        assert_eq!(
            config.pager.query_params.get("category_id"),
            Some(&"12".to_string())
        );
    }

    #[test]
    fn test_resolve_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: https://api.example.com\nentity: category\npager:\n  count_lanes: 4\n  query_params:\n    lang: en\n"
        )
        .unwrap();
        let config_path = file.path().to_string_lossy().to_string();

        let runner = runner_for(&[
            "-C",
            config_path.as_str(),
            "fetch",
            "--no-cursor",
            "-p",
            "lang=de",
        ]);
        let (entity, config) = runner.resolve_fetch(fetch_args(&runner)).unwrap();

        assert_eq!(entity, "category");
        assert_eq!(config.pager.count_lanes, 4);
        assert_eq!(config.pager.cursor_key, None);
        assert_eq!(
            config.pager.query_params.get("lang"),
            Some(&"de".to_string())
        );
    }

    #[test]
    fn test_resolve_requires_entity_and_base_url() {
        let runner = runner_for(&["fetch", "--base-url", "https://api.example.com"]);
        let result = runner.resolve_fetch(fetch_args(&runner));
        assert!(matches!(result, Err(Error::Config { .. })));

        let runner = runner_for(&["fetch", "item"]);
        let result = runner.resolve_fetch(fetch_args(&runner));
        assert!(matches!(result, Err(Error::InvalidConfigValue { .. })));
    }

    #[tokio::test]
    async fn test_fetch_writes_json_lines() {
        let server = MockServer::start().await;
        for (page, body) in [("1", r#"[{"id":1},{"id":2}]"#), ("2", r#"[{"id":3}]"#)] {
            Mock::given(method("GET"))
                .and(path("/item"))
                .and(query_param("p", page))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let uri = server.uri();
        let runner = runner_for(&["fetch", "item", "--base-url", uri.as_str(), "--lanes", "2"]);
        let mut out = Vec::new();
        let count = runner
            .fetch(fetch_args(&runner), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n"
        );
    }

    #[tokio::test]
    async fn test_fetch_respects_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item"))
            .and(query_param("p", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"[1, 2, 3, 4]"#, "application/json"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let uri = server.uri();
        let runner = runner_for(&[
            "fetch",
            "item",
            "--base-url",
            uri.as_str(),
            "--lanes",
            "1",
            "--limit",
            "2",
        ]);
        let mut out = Vec::new();
        let count = runner
            .fetch(fetch_args(&runner), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "1\n2\n");
    }

    #[tokio::test]
    async fn test_fetch_cancelled() {
        let runner = runner_for(&["fetch", "item", "--base-url", "http://127.0.0.1:9"]);
        runner.cancellation_token().cancel();

        let mut out = Vec::new();
        let result = runner.fetch(fetch_args(&runner), &mut out).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_plan_output() {
        let runner = runner_for(&["plan", "--lanes", "2", "--rounds", "2"]);
        let mut out = Vec::new();
        runner.plan(2, 2, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"pages\":[1,2],\"round\":1}\n{\"pages\":[3,4],\"round\":2}\n"
        );
    }

    #[test]
    fn test_plan_pretty_output() {
        let runner = runner_for(&["-f", "pretty", "plan"]);
        let mut out = Vec::new();
        runner.plan(3, 1, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "round   1 | lane 0: p1, lane 1: p2, lane 2: p3\n"
        );
    }

    #[test]
    fn test_validate_requires_config() {
        let runner = runner_for(&["validate"]);
        let mut out = Vec::new();
        assert!(matches!(
            runner.validate(&mut out),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_write_record_formats() {
        let record = json!({"id": 7});

        let mut out = Vec::new();
        write_record(&mut out, &record, OutputFormat::Json).unwrap();
        assert_eq!(out, b"{\"id\":7}\n");

        let mut out = Vec::new();
        write_record(&mut out, &record, OutputFormat::Pretty).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"id\": 7\n}\n");
    }
}
