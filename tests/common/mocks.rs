use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pfhub::{Collaborators, PfhubError, Probe, RecordReference};

/// A call seen by [`StubCollaborators`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DownloadRecord(RecordReference, PathBuf),
    DownloadMeta(String, PathBuf),
    Convert(PathBuf, PathBuf),
    Probe(String),
}

/// What the stubbed probe answers
#[derive(Clone, Debug)]
pub enum ProbeReply {
    Unreachable(String),
    Directory,
    /// Write these contents as the probed file
    File(String),
}

/// Collaborators that never touch the network
pub struct StubCollaborators {
    calls: Arc<Mutex<Vec<Call>>>,
    written: Vec<String>,
    probe_reply: ProbeReply,
    fail_with: Option<String>,
}

impl StubCollaborators {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            written: Vec::new(),
            probe_reply: ProbeReply::Directory,
            fail_with: None,
        }
    }

    /// File names each collaborator reports as written, joined onto `dest`
    pub fn writing(mut self, names: &[&str]) -> Self {
        self.written = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn probing(mut self, reply: ProbeReply) -> Self {
        self.probe_reply = reply;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<Call>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn result(&self, dest: &Path) -> Result<Vec<PathBuf>, PfhubError> {
        match &self.fail_with {
            Some(message) => Err(PfhubError::Config(message.clone())),
            None => Ok(self.written.iter().map(|name| dest.join(name)).collect()),
        }
    }
}

#[async_trait]
impl Collaborators for StubCollaborators {
    async fn download_record(
        &self,
        record: &RecordReference,
        dest: &Path,
    ) -> Result<Vec<PathBuf>, PfhubError> {
        self.record(Call::DownloadRecord(record.clone(), dest.to_path_buf()));
        self.result(dest)
    }

    async fn download_meta(&self, url: &str, dest: &Path) -> Result<Vec<PathBuf>, PfhubError> {
        self.record(Call::DownloadMeta(url.to_string(), dest.to_path_buf()));
        self.result(dest)
    }

    async fn convert(&self, file_path: &Path, dest: &Path) -> Result<Vec<PathBuf>, PfhubError> {
        self.record(Call::Convert(file_path.to_path_buf(), dest.to_path_buf()));
        self.result(dest)
    }

    async fn probe(&self, url: &str, scratch: &Path) -> Probe {
        self.record(Call::Probe(url.to_string()));
        match &self.probe_reply {
            ProbeReply::Unreachable(reason) => Probe::Unreachable(reason.clone()),
            ProbeReply::Directory => Probe::Directory,
            ProbeReply::File(contents) => {
                let path = scratch.join("meta.yaml");
                std::fs::write(&path, contents).unwrap();
                Probe::File(path)
            }
        }
    }
}
