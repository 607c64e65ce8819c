// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use folio_api::Client;
use folio_app::demo::DemoPortfolio;
use folio_app::{
    ChatRequest, FlowError, PortfolioSnapshot, RequestId, SelectedFile, is_portfolio_file,
};
use folio_tui::{AppRuntime, InternalEvent};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use time::OffsetDateTime;

const DEMO_MAX_ROWS: usize = 24;

/// Talks to the analysis service. Requests run on worker threads so the
/// event loop keeps drawing while the service works.
pub struct ServiceRuntime {
    client: Client,
    search_dir: PathBuf,
    export_dir: PathBuf,
}

impl ServiceRuntime {
    pub fn new(client: Client, search_dir: PathBuf, export_dir: PathBuf) -> Self {
        Self {
            client,
            search_dir,
            export_dir,
        }
    }
}

impl AppRuntime for ServiceRuntime {
    fn list_portfolio_files(&mut self) -> Result<Vec<SelectedFile>> {
        list_portfolio_files(&self.search_dir)
    }

    fn upload_portfolio(&mut self, file: &SelectedFile) -> Result<PortfolioSnapshot, FlowError> {
        self.client.upload_portfolio(&file.path)
    }

    fn ask(&mut self, request: &ChatRequest) -> Result<String, FlowError> {
        self.client.ask(request)
    }

    fn export_charts(&mut self, snapshot: &PortfolioSnapshot) -> Result<Vec<PathBuf>> {
        export_charts(snapshot, &self.export_dir)
    }

    fn spawn_upload(
        &mut self,
        request_id: RequestId,
        file: SelectedFile,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("folio-upload-{request_id}"))
            .spawn(move || {
                let outcome = client.upload_portfolio(&file.path);
                if let Err(error) = &outcome {
                    tracing::warn!(%request_id, kind = error.kind(), %error, "upload failed");
                }
                // The receiver is gone once the UI has exited.
                let _ = tx.send(InternalEvent::UploadSettled {
                    request_id,
                    outcome,
                });
            })
            .context("spawn upload worker")?;
        Ok(())
    }

    fn spawn_chat(
        &mut self,
        request_id: RequestId,
        request: ChatRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("folio-chat-{request_id}"))
            .spawn(move || {
                let outcome = client.ask(&request);
                if let Err(error) = &outcome {
                    tracing::warn!(%request_id, kind = error.kind(), %error, "chat failed");
                }
                let _ = tx.send(InternalEvent::ChatSettled {
                    request_id,
                    outcome,
                });
            })
            .context("spawn chat worker")?;
        Ok(())
    }
}

/// Offline stand-in for the service. Uploads yield a generated portfolio
/// sized to the file's row count; chat replies come from a fixed set.
pub struct DemoRuntime {
    demo: DemoPortfolio,
    search_dir: PathBuf,
    export_dir: PathBuf,
}

impl DemoRuntime {
    pub fn new(seed: u64, search_dir: PathBuf, export_dir: PathBuf) -> Self {
        Self {
            demo: DemoPortfolio::new(seed),
            search_dir,
            export_dir,
        }
    }

    pub fn seeded_from_clock(search_dir: PathBuf, export_dir: PathBuf) -> Self {
        let seed = OffsetDateTime::now_utc().unix_timestamp().unsigned_abs();
        Self::new(seed, search_dir, export_dir)
    }
}

impl AppRuntime for DemoRuntime {
    fn list_portfolio_files(&mut self) -> Result<Vec<SelectedFile>> {
        list_portfolio_files(&self.search_dir)
    }

    fn upload_portfolio(&mut self, file: &SelectedFile) -> Result<PortfolioSnapshot, FlowError> {
        let raw = fs::read_to_string(&file.path).map_err(|error| {
            FlowError::Validation(format!("cannot read {}: {error}", file.path.display()))
        })?;
        let rows = raw
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .count()
            .clamp(1, DEMO_MAX_ROWS);

        let mut snapshot = self.demo.snapshot(rows);
        snapshot.received_at = Some(OffsetDateTime::now_utc());
        Ok(snapshot)
    }

    fn ask(&mut self, _request: &ChatRequest) -> Result<String, FlowError> {
        Ok(self.demo.advisor_reply())
    }

    fn export_charts(&mut self, snapshot: &PortfolioSnapshot) -> Result<Vec<PathBuf>> {
        export_charts(snapshot, &self.export_dir)
    }
}

/// Portfolio files directly inside `dir`, sorted by name.
pub fn list_portfolio_files(dir: &Path) -> Result<Vec<SelectedFile>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("list portfolio files in {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && is_portfolio_file(&path) {
            files.push(SelectedFile::from_path(path));
        }
    }
    files.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(files)
}

/// Writes each chart of `snapshot` to `dir` as `<key>.png`.
pub fn export_charts(snapshot: &PortfolioSnapshot, dir: &Path) -> Result<Vec<PathBuf>> {
    if snapshot.charts.is_empty() {
        return Err(anyhow!("no charts to export; analyze a portfolio first"));
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("create chart export directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(snapshot.charts.len());
    for (kind, image) in &snapshot.charts {
        let bytes = image
            .decode_png()
            .with_context(|| format!("decode {} chart", kind.key()))?;
        let path = dir.join(format!("{}.png", kind.key()));
        fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        written.push(path);
    }

    tracing::info!(count = written.len(), dir = %dir.display(), "exported charts");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{DemoRuntime, ServiceRuntime, export_charts, list_portfolio_files};
    use anyhow::{Result, anyhow};
    use folio_api::Client;
    use folio_app::{
        ChartImage, ChartKind, ChatRequest, ChatTurn, FlowError, PortfolioSnapshot, RequestId,
        SelectedFile,
    };
    use folio_testkit::{PortfolioFaker, temp_holdings_file};
    use folio_tui::{AppRuntime, InternalEvent};
    use std::fs;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    #[test]
    fn listing_keeps_only_csv_files_sorted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("zeta.csv"), "a")?;
        fs::write(dir.path().join("alpha.CSV"), "a")?;
        fs::write(dir.path().join("notes.txt"), "a")?;
        fs::create_dir(dir.path().join("nested.csv"))?;

        let names = list_portfolio_files(dir.path())?
            .into_iter()
            .map(|file| file.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["alpha.CSV", "zeta.csv"]);
        Ok(())
    }

    #[test]
    fn listing_missing_directory_fails_with_path() {
        let error = list_portfolio_files(std::path::Path::new("/nonexistent/folio"))
            .expect_err("missing dir should fail");
        assert!(error.to_string().contains("/nonexistent/folio"));
    }

    #[test]
    fn export_writes_one_png_per_chart() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("charts");
        let snapshot = PortfolioFaker::new(5).snapshot(8);

        let written = export_charts(&snapshot, &out)?;
        assert_eq!(written.len(), snapshot.charts.len());
        for (kind, path) in snapshot.charts.keys().zip(&written) {
            assert_eq!(path, &out.join(format!("{}.png", kind.key())));
            let bytes = fs::read(path)?;
            assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
        }
        Ok(())
    }

    #[test]
    fn export_rejects_empty_and_corrupt_charts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let error = export_charts(&PortfolioSnapshot::default(), dir.path())
            .expect_err("empty snapshot should fail");
        assert!(error.to_string().contains("no charts"));

        let mut snapshot = PortfolioSnapshot::default();
        snapshot
            .charts
            .insert(ChartKind::Equity, ChartImage::new("bm90IGEgcG5n"));
        let error = export_charts(&snapshot, dir.path()).expect_err("non-png should fail");
        assert!(error.to_string().contains("decode equity chart"));
        Ok(())
    }

    #[test]
    fn demo_upload_sizes_portfolio_from_file() -> Result<()> {
        let (_dir, path) = temp_holdings_file(3, 5)?;
        let mut runtime = DemoRuntime::new(
            9,
            std::env::temp_dir(),
            std::env::temp_dir().join("folio-demo-charts"),
        );

        let snapshot = runtime
            .upload_portfolio(&SelectedFile::from_path(path))
            .map_err(|error| anyhow!("demo upload failed: {error}"))?;
        assert_eq!(snapshot.table_rows.len(), 5);
        assert!(snapshot.totals.is_some());
        assert!(snapshot.received_at.is_some());

        let reply = runtime
            .ask(&ChatRequest {
                message: "hi".to_owned(),
                chat_history: vec![ChatTurn::user("hi")],
                portfolio_data: snapshot.context(),
            })
            .map_err(|error| anyhow!("demo chat failed: {error}"))?;
        assert!(!reply.is_empty());
        Ok(())
    }

    #[test]
    fn demo_upload_of_missing_file_is_validation_error() {
        let mut runtime = DemoRuntime::new(9, std::env::temp_dir(), std::env::temp_dir());
        let error = runtime
            .upload_portfolio(&SelectedFile::from_path("/nonexistent/holdings.csv"))
            .expect_err("missing file should fail");
        assert!(matches!(error, FlowError::Validation(_)));
    }

    #[test]
    fn service_upload_settles_on_worker_thread() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let body = PortfolioFaker::new(12).upload_body(3).to_string();

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let response = Response::from_string(body).with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
            request.respond(response).expect("response should succeed");
        });

        let (_dir, path) = temp_holdings_file(2, 3)?;
        let client = Client::new(&addr, Some(Duration::from_secs(5)))?;
        let mut runtime =
            ServiceRuntime::new(client, std::env::temp_dir(), std::env::temp_dir());
        let (tx, rx) = mpsc::channel();
        let request_id = RequestId::new(4);
        runtime.spawn_upload(request_id, SelectedFile::from_path(path), tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::UploadSettled {
                request_id: settled,
                outcome,
            } => {
                assert_eq!(settled, request_id);
                let snapshot = outcome.map_err(|error| anyhow!("upload failed: {error}"))?;
                assert_eq!(snapshot.table_rows.len(), 3);
            }
            other => panic!("unexpected event {other:?}"),
        }

        handle.join().expect("server thread should join");
        Ok(())
    }
}
